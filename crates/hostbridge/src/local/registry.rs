use std::{
    any::Any,
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use thiserror::Error;

use super::Router;
use crate::TRACE_TARGET;

pub type Parameters = Map<String, Value>;

/// Failure raised by a capability. Serialized back to the caller as an
/// error document carrying [`FunctionError::code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error("Function '{0}' not found in bridge registry")]
    FunctionNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Function execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Permission required: {0}")]
    PermissionRequired(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FunctionError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FunctionNotFound(_) => "FUNCTION_NOT_FOUND",
            Self::InvalidParameters(_) => "INVALID_PARAMETERS",
            Self::ExecutionFailed(_) => "EXECUTION_FAILED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::PermissionRequired(_) => "PERMISSION_REQUIRED",
            Self::Unknown(_) => "UNKNOWN_ERROR",
        }
    }
}

/// A capability callable through the bridge.
pub trait BridgeFunction: Send + Sync + 'static {
    fn execute(&self, parameters: Parameters) -> Result<Parameters, FunctionError>;
}

impl<F> BridgeFunction for F
where
    F: Fn(Parameters) -> Result<Parameters, FunctionError> + Send + Sync + 'static,
{
    fn execute(&self, parameters: Parameters) -> Result<Parameters, FunctionError> {
        self(parameters)
    }
}

/// Thread-safe table of capabilities keyed by fully qualified name
/// (`"Location.Get"`, `"Camera.TakePhoto"`).
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, Arc<dyn BridgeFunction>>>,
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, function: impl BridgeFunction) {
        self.functions
            .write()
            .insert(name.into(), Arc::new(function));
    }

    pub fn register_fn<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(Parameters) -> Result<Parameters, FunctionError> + Send + Sync + 'static,
    {
        self.register(name, function);
    }

    pub fn exists(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BridgeFunction>> {
        self.functions.read().get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.functions.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

fn parse_parameters(raw: Option<&str>) -> Result<Parameters, serde_json::Error> {
    match raw {
        None => Ok(Parameters::new()),
        // An empty PHP array encodes as `[]`.
        Some(text) if text.is_empty() || text.trim() == "[]" => Ok(Parameters::new()),
        Some(text) => serde_json::from_str(text),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("function panicked")
}

fn error_document(code: &str, message: &str) -> Option<String> {
    let document = json!({
        "status": "error",
        "code": code,
        "message": message,
        "data": {},
    });
    serde_json::to_string(&document)
        .inspect_err(|e| {
            tracing::error!(target: TRACE_TARGET, "failed to serialize bridge response: {e}");
        })
        .ok()
}

impl Router for FunctionRegistry {
    fn exists(&self, name: &str) -> bool {
        Self::exists(self, name)
    }

    fn invoke(&self, name: &str, parameters: Option<&str>) -> Option<String> {
        let Some(function) = self.get(name) else {
            tracing::warn!(target: TRACE_TARGET, name, "function not found");
            return None;
        };

        let parameters = match parse_parameters(parameters) {
            Ok(parameters) => parameters,
            Err(e) => {
                return error_document(
                    "INVALID_JSON",
                    &format!("Failed to parse parameters JSON: {e}"),
                );
            }
        };

        // A panicking capability must not unwind into the host runtime.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| function.execute(parameters)));
        match outcome {
            Ok(Ok(data)) => serde_json::to_string(&data).ok().or_else(|| {
                error_document("SERIALIZATION_ERROR", "Failed to serialize response to JSON")
            }),
            Ok(Err(err)) => {
                tracing::warn!(target: TRACE_TARGET, name, code = err.code(), "function failed: {err}");
                error_document(err.code(), &err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(target: TRACE_TARGET, name, "function panicked: {message}");
                error_document("UNKNOWN_ERROR", &format!("Unexpected error: {message}"))
            }
        }
    }
}
