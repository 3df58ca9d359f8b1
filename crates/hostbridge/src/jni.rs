//! JVM host runtime over the `jni` crate.
//!
//! Router types are pinned with global references. Strings are local
//! references, which are deleted explicitly because permanently attached
//! native threads never return to Java to have their frames popped.

use jni::{
    JNIEnv, JavaVM,
    errors::{Error as JniError, JniError as JniCallError},
    objects::{GlobalRef, JClass, JObject, JStaticMethodID, JString, JValue},
    signature::{Primitive, ReturnType},
};

use crate::{
    TRACE_TARGET,
    error::{Error, Result},
    host::{EntryKind, HostEnv, HostVm},
};

pub struct JniVm {
    vm: JavaVM,
}

impl JniVm {
    #[must_use]
    pub const fn new(vm: JavaVM) -> Self {
        Self { vm }
    }

    /// Wraps the runtime pointer handed to `JNI_OnLoad`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live `JavaVM` that outlives the returned value.
    pub unsafe fn from_raw(ptr: *mut jni::sys::JavaVM) -> Result<Self> {
        let vm = unsafe { JavaVM::from_raw(ptr) }.map_err(|e| Error::Environment(Box::new(e)))?;
        Ok(Self::new(vm))
    }

    /// Runtime owning the given thread environment.
    pub fn from_env(env: &JNIEnv<'_>) -> Result<Self> {
        env.get_java_vm()
            .map(Self::new)
            .map_err(|e| Error::Environment(Box::new(e)))
    }
}

impl HostVm for JniVm {
    type Env<'vm> = JniEnv<'vm>;
    type Class = GlobalRef;
    type Method = JStaticMethodID;

    fn current_env(&self) -> Result<Option<JniEnv<'_>>> {
        Ok(bound_env(self.vm.get_env())?.map(|env| JniEnv { env }))
    }

    fn attach_current_thread(&self) -> Result<JniEnv<'_>> {
        self.vm
            .attach_current_thread_permanently()
            .map(|env| JniEnv { env })
            .map_err(|e| Error::Attach(Box::new(e)))
    }
}

/// A detached thread is not an error; it just needs attaching.
fn bound_env<T>(result: Result<T, JniError>) -> Result<Option<T>> {
    match result {
        Ok(env) => Ok(Some(env)),
        Err(JniError::JniCall(JniCallError::ThreadDetached)) => Ok(None),
        Err(e) => Err(Error::Environment(Box::new(e))),
    }
}

pub struct JniEnv<'local> {
    env: JNIEnv<'local>,
}

impl JniEnv<'_> {
    /// Clears any exception the failed call left pending so the thread can
    /// keep using the runtime.
    fn clear_exception(&mut self) {
        if self.env.exception_check().unwrap_or(false) {
            if let Err(e) = self.env.exception_describe() {
                tracing::warn!(target: TRACE_TARGET, "failed to describe pending exception: {e}");
            }
            if let Err(e) = self.env.exception_clear() {
                tracing::warn!(target: TRACE_TARGET, "failed to clear pending exception: {e}");
            }
        }
    }

    fn host_call(&mut self, err: JniError) -> Error {
        self.clear_exception();
        Error::HostCall(Box::new(err))
    }
}

fn class_of(global: &GlobalRef) -> &JClass<'static> {
    global.as_obj().into()
}

impl<'local> HostEnv for JniEnv<'local> {
    type Class = GlobalRef;
    type Method = JStaticMethodID;
    type Str = JString<'local>;

    fn find_class(&mut self, name: &str) -> Result<GlobalRef> {
        let local = match self.env.find_class(name) {
            Ok(class) => class,
            Err(e) => {
                self.clear_exception();
                return Err(Error::RouterNotFound {
                    class: name.to_string(),
                    source: Some(Box::new(e)),
                });
            }
        };
        let global = self.env.new_global_ref(&local);
        let _ = self.env.delete_local_ref(local);
        global.map_err(|e| Error::RouterNotFound {
            class: name.to_string(),
            source: Some(Box::new(e)),
        })
    }

    fn static_method(
        &mut self,
        class: &GlobalRef,
        name: &str,
        kind: EntryKind,
    ) -> Result<JStaticMethodID> {
        self.env
            .get_static_method_id(class_of(class), name, kind.signature())
            .map_err(|e| {
                self.clear_exception();
                Error::EntryPointNotFound {
                    name: name.to_string(),
                    signature: kind.signature(),
                    source: Some(Box::new(e)),
                }
            })
    }

    fn new_string(&mut self, text: &str) -> Result<JString<'local>> {
        self.env.new_string(text).map_err(|e| {
            self.clear_exception();
            Error::marshal("host string", e)
        })
    }

    fn call_exists(
        &mut self,
        class: &GlobalRef,
        method: JStaticMethodID,
        name: &JString<'local>,
    ) -> Result<i32> {
        let name: &JObject = name;
        // SAFETY: `method` was resolved against `class` with the existence
        // signature, which takes one string and returns an int.
        let result = unsafe {
            self.env.call_static_method_unchecked(
                class_of(class),
                method,
                ReturnType::Primitive(Primitive::Int),
                &[JValue::Object(name).as_jni()],
            )
        };
        result.and_then(|v| v.i()).map_err(|e| self.host_call(e))
    }

    fn call_invoke(
        &mut self,
        class: &GlobalRef,
        method: JStaticMethodID,
        name: &JString<'local>,
        parameters: Option<&JString<'local>>,
    ) -> Result<Option<JString<'local>>> {
        let null = JObject::null();
        let name: &JObject = name;
        let parameters: &JObject = match parameters {
            Some(p) => p,
            None => &null,
        };
        // SAFETY: `method` was resolved against `class` with the invoke
        // signature, which takes two strings and returns a string.
        let result = unsafe {
            self.env.call_static_method_unchecked(
                class_of(class),
                method,
                ReturnType::Object,
                &[JValue::Object(name).as_jni(), JValue::Object(parameters).as_jni()],
            )
        };
        let object = result.and_then(|v| v.l()).map_err(|e| self.host_call(e))?;
        if object.is_null() {
            return Ok(None);
        }
        Ok(Some(JString::from(object)))
    }

    fn read_string(&mut self, string: &JString<'local>) -> Result<Vec<u8>> {
        let text: Result<String, JniError> = self.env.get_string(string).map(String::from);
        match text {
            Ok(text) => Ok(text.into_bytes()),
            Err(e) => {
                self.clear_exception();
                Err(Error::marshal("result", e))
            }
        }
    }

    fn release(&mut self, string: JString<'local>) {
        if let Err(e) = self.env.delete_local_ref(string) {
            tracing::warn!(target: TRACE_TARGET, "failed to delete local reference: {e}");
        }
    }
}
