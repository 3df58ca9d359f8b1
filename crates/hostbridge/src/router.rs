use std::ffi::CStr;

use crate::{
    TRACE_TARGET,
    buffer::ResultBuffer,
    config::RouterSpec,
    dispatch::{BridgeInitializer, DispatchHandle},
    environment::EnvironmentAcquirer,
    error::{self, Error, Result},
    host::{HostEnv, HostVm},
};

/// Routes `can`/`call` requests from the embedded runtime to the host router.
///
/// The router keeps no per-call state. Once [`CallRouter::initialize`] has
/// succeeded, calls from any number of threads run independently and share
/// only the read-only dispatch handle. Each call blocks its thread for as
/// long as the host function runs.
pub struct CallRouter<V: HostVm> {
    environment: EnvironmentAcquirer<V>,
    dispatch: BridgeInitializer<V>,
}

impl<V: HostVm> Default for CallRouter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: HostVm> CallRouter<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            environment: EnvironmentAcquirer::new(),
            dispatch: BridgeInitializer::new(),
        }
    }

    pub const fn environment(&self) -> &EnvironmentAcquirer<V> {
        &self.environment
    }

    pub const fn dispatch(&self) -> &BridgeInitializer<V> {
        &self.dispatch
    }

    pub fn register_runtime(&self, runtime: V) -> Result<()> {
        self.environment.register(runtime)
    }

    /// Resolves the router's entry points on the calling thread.
    pub fn initialize(&self, spec: &RouterSpec) -> Result<()> {
        let mut ctx = self.environment.acquire()?;
        self.dispatch.initialize(&mut ctx, spec)?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.dispatch.is_initialized()
    }

    /// Whether the host router knows `name`. Failures log and yield `false`.
    pub fn can(&self, name: &CStr) -> bool {
        self.try_can(name).unwrap_or_else(|err| {
            error::report("can", &err);
            false
        })
    }

    /// Invokes `name` on the host router. Failures, unknown names and empty
    /// results log and yield `None`.
    pub fn call(&self, name: &CStr, parameters: Option<&CStr>) -> Option<ResultBuffer> {
        self.try_call(name, parameters)
            .inspect_err(|err| error::report("call", err))
            .ok()
    }

    pub fn try_can(&self, name: &CStr) -> Result<bool> {
        let mut ctx = self.environment.acquire()?;
        let handle = self.dispatch.handle()?;
        let exists = existence_check(ctx.env_mut(), handle, name)?;
        tracing::debug!(target: TRACE_TARGET, name = ?name, exists, "can");
        Ok(exists)
    }

    /// Like [`CallRouter::call`], reporting an empty result as
    /// [`Error::NotFoundOrEmpty`].
    pub fn try_call(&self, name: &CStr, parameters: Option<&CStr>) -> Result<ResultBuffer> {
        let mut ctx = self.environment.acquire()?;
        let handle = self.dispatch.handle()?;
        let result = invoke(ctx.env_mut(), handle, name, parameters)?;
        tracing::debug!(target: TRACE_TARGET, name = ?name, len = result.as_bytes().len(), "call");
        Ok(result)
    }
}

fn marshal<E: HostEnv>(env: &mut E, what: &'static str, text: &CStr) -> Result<E::Str> {
    let text = text.to_str().map_err(|e| Error::marshal(what, e))?;
    env.new_string(text)
}

fn existence_check<E: HostEnv>(
    env: &mut E,
    handle: &DispatchHandle<E::Class, E::Method>,
    name: &CStr,
) -> Result<bool> {
    let host_name = marshal(env, "function name", name)?;
    let result = env.call_exists(&handle.router, handle.exists, &host_name);
    env.release(host_name);
    Ok(result? != 0)
}

fn invoke<E: HostEnv>(
    env: &mut E,
    handle: &DispatchHandle<E::Class, E::Method>,
    name: &CStr,
    parameters: Option<&CStr>,
) -> Result<ResultBuffer> {
    let host_name = marshal(env, "function name", name)?;

    // Absent parameters stay a null reference; the router treats that
    // differently from an empty string.
    let host_parameters = match parameters.map(|p| marshal(env, "parameters", p)).transpose() {
        Ok(p) => p,
        Err(err) => {
            env.release(host_name);
            return Err(err);
        }
    };
    tracing::trace!(target: TRACE_TARGET, name = ?name, parameters = ?parameters, "invoking host router");

    let result = env.call_invoke(
        &handle.router,
        handle.invoke,
        &host_name,
        host_parameters.as_ref(),
    );
    env.release(host_name);
    if let Some(p) = host_parameters {
        env.release(p);
    }

    let host_result = result?.ok_or(Error::NotFoundOrEmpty)?;

    // The host string is invalid once released, so copy before releasing.
    let bytes = env.read_string(&host_result);
    env.release(host_result);
    let buffer = ResultBuffer::from_bytes(bytes?)?;
    tracing::trace!(target: TRACE_TARGET, result = ?buffer.as_c_str(), "host router returned");
    Ok(buffer)
}
