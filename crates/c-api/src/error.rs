use std::{
    borrow::Cow,
    cell::RefCell,
    ffi::{CStr, CString, c_char},
};

use hostbridge::ErrorKind;

thread_local! {
    static LAST_ERROR: RefCell<Option<Error>> = const { RefCell::new(None) };
}

/// Message describing the calling thread's last failed bridge call, or NULL
/// if that call succeeded. Valid until the thread's next bridge call.
#[unsafe(no_mangle)]
pub extern "C" fn hostbridge_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow_mut()
            .as_mut()
            .map_or(std::ptr::null(), Error::c_error)
    })
}

/// Category of the calling thread's last failed bridge call.
#[unsafe(no_mangle)]
pub extern "C" fn hostbridge_last_error_code() -> ErrorCode {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ErrorCode::Ok, ErrorCode::from))
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error(transparent)]
    Bridge(#[from] hostbridge::Error),

    #[error("C Error")]
    C(ErrorCode, Cow<'static, CStr>),
}

pub type Result<T> = std::result::Result<T, Error>;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok = 0,
    InvalidArgument = 1,
    Initialization = 2,
    EnvironmentUnavailable = 3,
    Marshal = 4,
    NotFoundOrEmpty = 5,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Initialization => Self::Initialization,
            ErrorKind::EnvironmentUnavailable => Self::EnvironmentUnavailable,
            ErrorKind::Marshal => Self::Marshal,
            ErrorKind::NotFoundOrEmpty => Self::NotFoundOrEmpty,
        }
    }
}

trait IntoCStr {
    fn into_cstr(self) -> Cow<'static, CStr>;
}

impl IntoCStr for String {
    fn into_cstr(self) -> Cow<'static, CStr> {
        CString::new(self).map_or_else(
            |_| c"invalid error string".into(),
            std::convert::Into::into,
        )
    }
}

impl Error {
    fn c_error(&mut self) -> *const c_char {
        match self {
            Self::InvalidArgument(_) => {
                let cstr = self.to_string().into_cstr();
                *self = Self::C(ErrorCode::InvalidArgument, cstr);
                self.c_error()
            }
            Self::Bridge(err) => {
                let code = ErrorCode::from(err.kind());
                let cstr = err.to_string().into_cstr();
                *self = Self::C(code, cstr);
                self.c_error()
            }
            Self::C(_, msg) => msg.as_ptr(),
        }
    }

    pub fn report(&self, operation: &str) {
        match self {
            Self::Bridge(err) => hostbridge::error::report(operation, err),
            _ => tracing::error!(target: hostbridge::TRACE_TARGET, operation, "{self}"),
        }
    }
}

pub fn set_last_error(err: Error) {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(err);
    });
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| {
        slot.borrow_mut().take();
    });
}

impl From<&Error> for ErrorCode {
    fn from(result: &Error) -> Self {
        match result {
            Error::InvalidArgument(_) => Self::InvalidArgument,
            Error::Bridge(err) => err.kind().into(),
            Error::C(code, _) => *code,
        }
    }
}
