use std::sync::OnceLock;

use crate::{
    TRACE_TARGET,
    error::{Error, Result},
    host::HostVm,
};

/// Proof that the calling thread may enter the host runtime.
///
/// Only [`EnvironmentAcquirer::acquire`] hands these out, and every call into
/// the host goes through one.
pub struct ExecutionContext<'vm, V: HostVm + 'vm> {
    env: V::Env<'vm>,
    attached: bool,
}

impl<'vm, V: HostVm + 'vm> ExecutionContext<'vm, V> {
    /// Whether this acquisition bound the thread for the first time.
    #[must_use]
    pub const fn newly_attached(&self) -> bool {
        self.attached
    }

    pub(crate) const fn env_mut(&mut self) -> &mut V::Env<'vm> {
        &mut self.env
    }
}

/// Holds the process-wide runtime reference and binds threads to it.
pub struct EnvironmentAcquirer<V> {
    runtime: OnceLock<V>,
}

impl<V> Default for EnvironmentAcquirer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EnvironmentAcquirer<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            runtime: OnceLock::new(),
        }
    }
}

impl<V: HostVm> EnvironmentAcquirer<V> {
    /// Publishes the runtime reference. Only the first registration wins.
    pub fn register(&self, runtime: V) -> Result<()> {
        self.runtime
            .set(runtime)
            .map_err(|_| Error::RuntimeAlreadySet)
    }

    pub fn runtime(&self) -> Option<&V> {
        self.runtime.get()
    }

    /// Returns the calling thread's context, attaching the thread first if
    /// the runtime has never seen it.
    pub fn acquire(&self) -> Result<ExecutionContext<'_, V>> {
        let runtime = self.runtime.get().ok_or(Error::RuntimeUnset)?;

        if let Some(env) = runtime.current_env()? {
            return Ok(ExecutionContext {
                env,
                attached: false,
            });
        }

        let env = runtime.attach_current_thread()?;
        tracing::debug!(
            target: TRACE_TARGET,
            thread = ?std::thread::current().id(),
            "attached thread to host runtime"
        );
        Ok(ExecutionContext {
            env,
            attached: true,
        })
    }
}
