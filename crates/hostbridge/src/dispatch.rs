use std::sync::OnceLock;

use crate::{
    TRACE_TARGET,
    config::RouterSpec,
    environment::ExecutionContext,
    error::{Error, Result},
    host::{EntryKind, HostEnv, HostVm},
};

/// Pinned router type plus its two resolved entry points.
#[derive(Debug)]
pub struct DispatchHandle<C, M> {
    pub(crate) router: C,
    pub(crate) exists: M,
    pub(crate) invoke: M,
}

pub type HandleOf<V> = DispatchHandle<<V as HostVm>::Class, <V as HostVm>::Method>;

impl<C, M> DispatchHandle<C, M> {
    /// Resolves the router named by `spec` through `env`.
    pub fn resolve<E>(env: &mut E, spec: &RouterSpec) -> Result<Self>
    where
        E: HostEnv<Class = C, Method = M>,
    {
        let router = env.find_class(&spec.class)?;
        let exists = env.static_method(&router, &spec.exists_method, EntryKind::Exists)?;
        let invoke = env.static_method(&router, &spec.invoke_method, EntryKind::Invoke)?;
        Ok(Self {
            router,
            exists,
            invoke,
        })
    }
}

/// Process-wide, publish-once cache of the router's dispatch handle.
pub struct BridgeInitializer<V: HostVm> {
    handle: OnceLock<HandleOf<V>>,
}

impl<V: HostVm> Default for BridgeInitializer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: HostVm> BridgeInitializer<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handle: OnceLock::new(),
        }
    }

    /// Resolves and publishes the dispatch handle.
    ///
    /// Once a handle is published it is never replaced: later calls log a
    /// warning and return the existing handle without resolving again.
    pub fn initialize(
        &self,
        ctx: &mut ExecutionContext<'_, V>,
        spec: &RouterSpec,
    ) -> Result<&HandleOf<V>> {
        if let Some(handle) = self.handle.get() {
            tracing::warn!(
                target: TRACE_TARGET,
                class = %spec.class,
                "bridge already initialized; keeping existing dispatch handle"
            );
            return Ok(handle);
        }

        let handle = DispatchHandle::resolve(ctx.env_mut(), spec).inspect_err(|err| {
            tracing::error!(target: TRACE_TARGET, class = %spec.class, "initialization failed: {err}");
        })?;

        if self.handle.set(handle).is_err() {
            tracing::warn!(
                target: TRACE_TARGET,
                class = %spec.class,
                "concurrent initialization lost the race; discarding resolved handle"
            );
        } else {
            tracing::info!(
                target: TRACE_TARGET,
                class = %spec.class,
                exists = %spec.exists_method,
                invoke = %spec.invoke_method,
                "bridge initialized"
            );
        }
        self.handle.get().ok_or(Error::NotInitialized)
    }

    pub fn handle(&self) -> Result<&HandleOf<V>> {
        self.handle.get().ok_or(Error::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }
}
