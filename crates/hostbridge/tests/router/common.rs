use std::{ffi::CString, sync::Arc};

use anyhow::{Context, Result};
use hostbridge::{
    CallRouter, RouterSpec,
    local::{LocalVm, Router},
};
use parking_lot::Mutex;
use serde_json::json;

pub(crate) type Bridge = CallRouter<LocalVm>;

pub(crate) fn cstr(text: &str) -> CString {
    CString::new(text).expect("test strings have no interior NUL")
}

/// Bridge with `router` defined under the default router type and
/// initialization already done on the calling thread.
pub(crate) fn ready_bridge(router: impl Router) -> Result<Bridge> {
    let spec = RouterSpec::default();
    let bridge = Bridge::new();
    bridge
        .register_runtime(LocalVm::new().with_router(&spec, router))
        .context("failed to register runtime")?;
    bridge
        .initialize(&spec)
        .context("failed to initialize bridge")?;
    Ok(bridge)
}

pub(crate) fn vm(bridge: &Bridge) -> &LocalVm {
    bridge
        .environment()
        .runtime()
        .expect("runtime registered by ready_bridge")
}

/// Returns parameters byte for byte.
pub(crate) struct EchoRouter;

impl Router for EchoRouter {
    fn exists(&self, name: &str) -> bool {
        name == "Echo.Identity"
    }

    fn invoke(&self, name: &str, parameters: Option<&str>) -> Option<String> {
        if self.exists(name) {
            parameters.map(str::to_owned)
        } else {
            None
        }
    }
}

/// Records exactly what the host side received.
#[derive(Clone, Default)]
pub(crate) struct RecordingRouter {
    pub(crate) seen: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl RecordingRouter {
    pub(crate) fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().clone()
    }
}

impl Router for RecordingRouter {
    fn exists(&self, name: &str) -> bool {
        name.starts_with("Record.")
    }

    fn invoke(&self, name: &str, parameters: Option<&str>) -> Option<String> {
        self.seen
            .lock()
            .push((name.to_string(), parameters.map(str::to_owned)));
        Some(json!({ "received": parameters }).to_string())
    }
}
