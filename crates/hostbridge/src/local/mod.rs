//! In-process host runtime.
//!
//! `LocalVm` stands in for a managed runtime when the host side is written in
//! Rust: router types are registered by name, threads are bound on first use,
//! and every transient string reference is counted so leaks are observable.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, ThreadId},
};

use parking_lot::{Mutex, RwLock};

use crate::{
    config::RouterSpec,
    error::{Error, Result},
    host::{EntryKind, HostEnv, HostVm},
};

mod registry;

pub use registry::{BridgeFunction, FunctionError, FunctionRegistry, Parameters};

/// Host-side router: the authoritative table of callable capabilities.
pub trait Router: Send + Sync + 'static {
    fn exists(&self, name: &str) -> bool;

    /// Runs `name`. `None` means not found or no output.
    fn invoke(&self, name: &str, parameters: Option<&str>) -> Option<String>;
}

impl<T: Router + ?Sized> Router for Arc<T> {
    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }

    fn invoke(&self, name: &str, parameters: Option<&str>) -> Option<String> {
        (**self).invoke(name, parameters)
    }
}

/// A router type defined on a [`LocalVm`].
pub struct LocalClass {
    name: String,
    exists_method: String,
    invoke_method: String,
    router: Arc<dyn Router>,
}

impl LocalClass {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn entry_name(&self, kind: EntryKind) -> &str {
        match kind {
            EntryKind::Exists => &self.exists_method,
            EntryKind::Invoke => &self.invoke_method,
        }
    }
}

impl std::fmt::Debug for LocalClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalClass")
            .field("name", &self.name)
            .field("exists_method", &self.exists_method)
            .field("invoke_method", &self.invoke_method)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMethod(EntryKind);

/// Transient string reference handed out by a [`LocalEnv`].
#[derive(Debug)]
pub struct LocalString {
    text: String,
}

#[derive(Default)]
pub struct LocalVm {
    classes: RwLock<HashMap<String, Arc<LocalClass>>>,
    bound: Mutex<HashSet<ThreadId>>,
    attaches: AtomicUsize,
    live_strings: AtomicUsize,
    refuse_attach: bool,
}

impl LocalVm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime that refuses to bind new threads.
    #[must_use]
    pub fn refusing_attach() -> Self {
        Self {
            refuse_attach: true,
            ..Self::default()
        }
    }

    /// Defines a router type under `spec.class`, replacing any earlier one.
    pub fn define(&self, spec: &RouterSpec, router: impl Router) {
        let class = LocalClass {
            name: spec.class.clone(),
            exists_method: spec.exists_method.clone(),
            invoke_method: spec.invoke_method.clone(),
            router: Arc::new(router),
        };
        self.classes.write().insert(spec.class.clone(), Arc::new(class));
    }

    #[must_use]
    pub fn with_router(self, spec: &RouterSpec, router: impl Router) -> Self {
        self.define(spec, router);
        self
    }

    /// Number of times a thread was bound.
    pub fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::Acquire)
    }

    pub fn is_current_thread_bound(&self) -> bool {
        self.bound.lock().contains(&thread::current().id())
    }

    /// Transient string references created but not yet released.
    pub fn live_references(&self) -> usize {
        self.live_strings.load(Ordering::Acquire)
    }
}

impl HostVm for LocalVm {
    type Env<'vm> = LocalEnv<'vm>;
    type Class = Arc<LocalClass>;
    type Method = LocalMethod;

    fn current_env(&self) -> Result<Option<LocalEnv<'_>>> {
        Ok(self
            .is_current_thread_bound()
            .then_some(LocalEnv { vm: self }))
    }

    fn attach_current_thread(&self) -> Result<LocalEnv<'_>> {
        if self.refuse_attach {
            return Err(Error::Attach("runtime refuses new threads".into()));
        }
        if self.bound.lock().insert(thread::current().id()) {
            self.attaches.fetch_add(1, Ordering::AcqRel);
        }
        Ok(LocalEnv { vm: self })
    }
}

pub struct LocalEnv<'vm> {
    vm: &'vm LocalVm,
}

impl LocalEnv<'_> {
    fn string(&self, text: String) -> LocalString {
        self.vm.live_strings.fetch_add(1, Ordering::AcqRel);
        LocalString { text }
    }
}

impl HostEnv for LocalEnv<'_> {
    type Class = Arc<LocalClass>;
    type Method = LocalMethod;
    type Str = LocalString;

    fn find_class(&mut self, name: &str) -> Result<Arc<LocalClass>> {
        self.vm
            .classes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::RouterNotFound {
                class: name.to_string(),
                source: None,
            })
    }

    fn static_method(
        &mut self,
        class: &Arc<LocalClass>,
        name: &str,
        kind: EntryKind,
    ) -> Result<LocalMethod> {
        if class.entry_name(kind) == name {
            Ok(LocalMethod(kind))
        } else {
            Err(Error::EntryPointNotFound {
                name: name.to_string(),
                signature: kind.signature(),
                source: None,
            })
        }
    }

    fn new_string(&mut self, text: &str) -> Result<LocalString> {
        Ok(self.string(text.to_string()))
    }

    fn call_exists(
        &mut self,
        class: &Arc<LocalClass>,
        method: LocalMethod,
        name: &LocalString,
    ) -> Result<i32> {
        if method.0 != EntryKind::Exists {
            return Err(Error::HostCall("method does not match existence signature".into()));
        }
        Ok(i32::from(class.router.exists(&name.text)))
    }

    fn call_invoke(
        &mut self,
        class: &Arc<LocalClass>,
        method: LocalMethod,
        name: &LocalString,
        parameters: Option<&LocalString>,
    ) -> Result<Option<LocalString>> {
        if method.0 != EntryKind::Invoke {
            return Err(Error::HostCall("method does not match invoke signature".into()));
        }
        let result = class
            .router
            .invoke(&name.text, parameters.map(|p| p.text.as_str()));
        Ok(result.map(|text| self.string(text)))
    }

    fn read_string(&mut self, string: &LocalString) -> Result<Vec<u8>> {
        Ok(string.text.as_bytes().to_vec())
    }

    fn release(&mut self, string: LocalString) {
        drop(string);
        self.vm.live_strings.fetch_sub(1, Ordering::AcqRel);
    }
}
