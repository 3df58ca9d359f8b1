use std::{
    ffi::{CStr, c_char, c_int},
    ptr,
};

use hostbridge::{CallRouter, HostVm, ResultBuffer, RouterSpec};

use crate::error::Error;

mod error;
mod logging;

pub use error::{ErrorCode, hostbridge_last_error, hostbridge_last_error_code};

macro_rules! c_try {
    ($op:literal, $expr:expr, $sentinel:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => {
                let e = $crate::error::Error::from(e);
                e.report($op);
                $crate::error::set_last_error(e);
                return $sentinel;
            }
        }
    };
}

#[cfg(feature = "jni")]
mod jvm;

#[cfg(feature = "jni")]
pub use jvm::hostbridge_jni_initialize;

#[cfg(feature = "jni")]
pub type Runtime = hostbridge::jni::JniVm;
#[cfg(not(feature = "jni"))]
pub type Runtime = hostbridge::local::LocalVm;

static BRIDGE: CallRouter<Runtime> = CallRouter::new();

/// Registers the host runtime and resolves the router's entry points on the
/// calling thread. Must complete before any `hostbridge_can` or
/// `hostbridge_call`.
pub fn install(runtime: Runtime, spec: &RouterSpec) -> hostbridge::Result<()> {
    logging::init();
    BRIDGE.register_runtime(runtime)?;
    BRIDGE.initialize(spec)
}

unsafe fn c_str<'a>(ptr: *const c_char, what: &'static str) -> error::Result<&'a CStr> {
    if ptr.is_null() {
        return Err(Error::InvalidArgument(what));
    }
    Ok(unsafe { CStr::from_ptr(ptr) })
}

unsafe fn can<V: HostVm>(bridge: &CallRouter<V>, function_name: *const c_char) -> c_int {
    error::clear_last_error();
    let name = c_try!("can", unsafe { c_str(function_name, "function name is null") }, 0);
    let exists = c_try!("can", bridge.try_can(name), 0);
    c_int::from(exists)
}

unsafe fn call<V: HostVm>(
    bridge: &CallRouter<V>,
    function_name: *const c_char,
    parameters_json: *const c_char,
) -> *mut c_char {
    error::clear_last_error();
    let name = c_try!(
        "call",
        unsafe { c_str(function_name, "function name is null") },
        ptr::null_mut()
    );
    let parameters = (!parameters_json.is_null()).then(|| unsafe { CStr::from_ptr(parameters_json) });
    let result = c_try!("call", bridge.try_call(name, parameters), ptr::null_mut());
    result.into_raw()
}

/// Checks whether the host router can run `function_name`.
///
/// Returns 1 if it can and 0 otherwise, including on failure.
///
/// # Safety
///
/// `function_name` must be NULL or a valid, null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostbridge_can(function_name: *const c_char) -> c_int {
    unsafe { can(&BRIDGE, function_name) }
}

/// Calls `function_name` on the host router with optional JSON parameters.
///
/// A NULL `parameters_json` reaches the router as an absent value, not as an
/// empty string. Returns NULL when the function is unknown, produced no
/// output, or the call failed; `hostbridge_last_error_code` tells which.
/// A non-NULL result is owned by the caller and must be released with
/// `hostbridge_free`.
///
/// # Safety
///
/// `function_name` and `parameters_json` must each be NULL or a valid,
/// null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostbridge_call(
    function_name: *const c_char,
    parameters_json: *const c_char,
) -> *mut c_char {
    unsafe { call(&BRIDGE, function_name, parameters_json) }
}

/// Releases a result returned by `hostbridge_call`. NULL is ignored.
///
/// # Safety
///
/// `buffer` must be NULL or a pointer returned by `hostbridge_call` that has
/// not been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostbridge_free(buffer: *mut c_char) {
    if !buffer.is_null() {
        drop(unsafe { ResultBuffer::from_raw(buffer) });
    }
}
