//! Call bridge between an embedded scripting runtime and a managed host
//! runtime.
//!
//! The bridge resolves the host router's two entry points once
//! ([`dispatch`]), binds every calling thread to the host runtime on demand
//! ([`environment`]) and routes `can`/`call` requests across the boundary
//! ([`router`]). Host runtimes plug in through the traits in [`host`].

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod host;
#[cfg(feature = "jni")]
pub mod jni;
pub mod local;
pub mod router;

pub const TRACE_TARGET: &str = "hostbridge";

pub use buffer::ResultBuffer;
pub use config::RouterSpec;
pub use dispatch::{BridgeInitializer, DispatchHandle};
pub use environment::{EnvironmentAcquirer, ExecutionContext};
pub use error::{BoxError, Error, ErrorKind, Result};
pub use host::{EntryKind, HostEnv, HostVm};
pub use router::CallRouter;
