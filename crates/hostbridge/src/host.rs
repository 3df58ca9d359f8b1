use crate::error::Result;

/// The two router entry points the bridge resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `(name: string) -> integer`
    Exists,
    /// `(name: string, parametersJSON: string|absent) -> string|absent`
    Invoke,
}

impl EntryKind {
    /// JVM descriptor the entry point must match exactly.
    #[must_use]
    pub const fn signature(self) -> &'static str {
        match self {
            Self::Exists => "(Ljava/lang/String;)I",
            Self::Invoke => "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
        }
    }
}

/// A host runtime the bridge can call into.
///
/// Implementations hold the process-wide runtime reference. A thread gets an
/// [`HostEnv`] either from an existing binding ([`HostVm::current_env`]) or by
/// attaching ([`HostVm::attach_current_thread`]); the bridge never detaches.
pub trait HostVm: Send + Sync + 'static {
    type Env<'vm>: HostEnv<Class = Self::Class, Method = Self::Method>
    where
        Self: 'vm;

    /// Durable reference to a router type, valid on every thread.
    type Class: Send + Sync + 'static;

    /// Resolved static entry point on a router type.
    type Method: Copy + Send + Sync + 'static;

    /// Returns the context bound to the calling thread, or `None` if the
    /// thread is not attached.
    fn current_env(&self) -> Result<Option<Self::Env<'_>>>;

    /// Binds the calling thread to the runtime for the rest of its life.
    fn attach_current_thread(&self) -> Result<Self::Env<'_>>;
}

/// Per-thread execution context in the host runtime.
///
/// Strings created through [`HostEnv::new_string`] or returned by
/// [`HostEnv::call_invoke`] are transient references and must be handed back
/// to [`HostEnv::release`].
pub trait HostEnv {
    type Class;
    type Method: Copy;
    type Str;

    /// Locates a router type and pins it for the life of the process.
    fn find_class(&mut self, name: &str) -> Result<Self::Class>;

    fn static_method(
        &mut self,
        class: &Self::Class,
        name: &str,
        kind: EntryKind,
    ) -> Result<Self::Method>;

    fn new_string(&mut self, text: &str) -> Result<Self::Str>;

    fn call_exists(
        &mut self,
        class: &Self::Class,
        method: Self::Method,
        name: &Self::Str,
    ) -> Result<i32>;

    fn call_invoke(
        &mut self,
        class: &Self::Class,
        method: Self::Method,
        name: &Self::Str,
        parameters: Option<&Self::Str>,
    ) -> Result<Option<Self::Str>>;

    /// Copies the string's UTF-8 content out of the host.
    fn read_string(&mut self, string: &Self::Str) -> Result<Vec<u8>>;

    fn release(&mut self, string: Self::Str);
}
