use hostbridge::{RouterSpec, jni::JniVm};
use jni::{
    JNIEnv,
    sys::{JNI_ERR, JNI_OK, jint},
};

/// Registers the calling thread's `JavaVM` and resolves the router.
///
/// Call this from the library's `JNI_OnLoad`: router types are looked up
/// through the class loader of the thread loading the library, which native
/// threads attached later do not have.
///
/// # Safety
///
/// `env` must be the valid `JNIEnv` of the calling thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostbridge_jni_initialize(env: *mut jni::sys::JNIEnv) -> jint {
    let env = c_try!(
        "initialize",
        unsafe { JNIEnv::from_raw(env) }.map_err(|e| hostbridge::Error::Environment(Box::new(e))),
        JNI_ERR
    );
    let runtime = c_try!("initialize", JniVm::from_env(&env), JNI_ERR);
    c_try!(
        "initialize",
        crate::install(runtime, &RouterSpec::from_env()),
        JNI_ERR
    );
    JNI_OK
}

/// Entry point for builds where the JVM loads this library directly.
///
/// # Safety
///
/// Called by the JVM with a valid `JavaVM` pointer.
#[cfg(feature = "jni-onload")]
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "system" fn JNI_OnLoad(
    vm: *mut jni::sys::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jint {
    let runtime = c_try!("initialize", unsafe { JniVm::from_raw(vm) }, JNI_ERR);
    c_try!(
        "initialize",
        crate::install(runtime, &RouterSpec::from_env()),
        JNI_ERR
    );
    jni::sys::JNI_VERSION_1_6
}
