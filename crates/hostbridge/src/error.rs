use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failure category reported alongside the sentinel return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Initialization,
    EnvironmentUnavailable,
    Marshal,
    NotFoundOrEmpty,
}

#[derive(Error, Debug)]
pub enum Error {
    /// The router type could not be located by its symbolic name.
    #[error("router type `{class}` not found")]
    RouterNotFound {
        class: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A router entry point did not resolve with the expected signature.
    #[error("entry point `{name}` with signature `{signature}` not found")]
    EntryPointNotFound {
        name: String,
        signature: &'static str,
        #[source]
        source: Option<BoxError>,
    },

    #[error("bridge is not initialized")]
    NotInitialized,

    #[error("host runtime is already registered")]
    RuntimeAlreadySet,

    #[error("host runtime reference is not set")]
    RuntimeUnset,

    #[error("failed to attach current thread: {0}")]
    Attach(#[source] BoxError),

    /// The runtime refused to report the current thread's context.
    #[error("failed to query thread environment: {0}")]
    Environment(#[source] BoxError),

    #[error("failed to marshal {what}: {reason}")]
    Marshal { what: &'static str, reason: String },

    /// The host raised while executing an entry point.
    #[error("host call failed: {0}")]
    HostCall(#[source] BoxError),

    #[error("host returned no result")]
    NotFoundOrEmpty,
}

impl Error {
    pub(crate) fn marshal(what: &'static str, reason: impl ToString) -> Self {
        Self::Marshal {
            what,
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RouterNotFound { .. }
            | Self::EntryPointNotFound { .. }
            | Self::NotInitialized
            | Self::RuntimeAlreadySet => ErrorKind::Initialization,
            Self::RuntimeUnset | Self::Attach(_) | Self::Environment(_) => {
                ErrorKind::EnvironmentUnavailable
            }
            Self::Marshal { .. } => ErrorKind::Marshal,
            Self::HostCall(_) | Self::NotFoundOrEmpty => ErrorKind::NotFoundOrEmpty,
        }
    }
}

/// Logs a failed bridge operation at a level matching its category.
pub fn report(operation: &str, err: &Error) {
    match err.kind() {
        ErrorKind::NotFoundOrEmpty if matches!(err, Error::NotFoundOrEmpty) => {
            tracing::debug!(target: crate::TRACE_TARGET, operation, "{err}");
        }
        kind => {
            tracing::error!(target: crate::TRACE_TARGET, operation, ?kind, "{err}");
        }
    }
}
