use std::ffi::{CStr, CString, c_char};

use crate::error::{Error, Result};

/// Result payload copied out of the host runtime.
///
/// The buffer owns its bytes and shares nothing with the host string it was
/// copied from or with any other call. Whoever holds it is responsible for
/// releasing it: dropping it in Rust, or passing the pointer from
/// [`ResultBuffer::into_raw`] back to [`ResultBuffer::from_raw`] once it has
/// crossed a C boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBuffer(CString);

impl ResultBuffer {
    /// Takes ownership of `bytes`. Fails if they contain an interior NUL,
    /// which a C caller could not see past.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        CString::new(bytes)
            .map(Self)
            .map_err(|e| Error::marshal("result", e))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }

    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        self.0.to_str()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }

    /// Transfers ownership to a C caller as a NUL-terminated string.
    #[must_use]
    pub fn into_raw(self) -> *mut c_char {
        self.0.into_raw()
    }

    /// Reclaims a buffer previously released with [`ResultBuffer::into_raw`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`ResultBuffer::into_raw`] and must not have been
    /// reclaimed already.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Self {
        Self(unsafe { CString::from_raw(ptr) })
    }
}

impl AsRef<[u8]> for ResultBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
