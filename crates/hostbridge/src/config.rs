use serde::{Deserialize, Serialize};

pub const DEFAULT_ROUTER_CLASS: &str = "com/nativephp/mobile/bridge/BridgeRouterKt";
pub const DEFAULT_EXISTS_METHOD: &str = "nativePHPCan";
pub const DEFAULT_INVOKE_METHOD: &str = "nativePHPCall";

pub const ENV_ROUTER_CLASS: &str = "HOSTBRIDGE_ROUTER_CLASS";
pub const ENV_EXISTS_METHOD: &str = "HOSTBRIDGE_EXISTS_METHOD";
pub const ENV_INVOKE_METHOD: &str = "HOSTBRIDGE_INVOKE_METHOD";

/// Where the host router lives and what its entry points are called.
///
/// Signatures are not configurable; see [`crate::EntryKind::signature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSpec {
    /// Binary name of the router type, e.g. `com/example/Router`.
    pub class: String,
    pub exists_method: String,
    pub invoke_method: String,
}

impl Default for RouterSpec {
    fn default() -> Self {
        Self {
            class: DEFAULT_ROUTER_CLASS.to_string(),
            exists_method: DEFAULT_EXISTS_METHOD.to_string(),
            invoke_method: DEFAULT_INVOKE_METHOD.to_string(),
        }
    }
}

impl RouterSpec {
    /// Defaults overridden by `HOSTBRIDGE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut spec = Self::default();
        for (name, slot) in [
            (ENV_ROUTER_CLASS, &mut spec.class),
            (ENV_EXISTS_METHOD, &mut spec.exists_method),
            (ENV_INVOKE_METHOD, &mut spec.invoke_method),
        ] {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
        spec
    }
}
