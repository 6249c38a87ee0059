//! Error types for the eina wrappers and the native error-number channel.

use std::ffi::{CStr, c_int};

use once_cell::sync::OnceCell;

use crate::sys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("could not alloc binbuf")]
    BinbufAlloc,
    #[error("could not append on binbuf")]
    BinbufAppend,
    #[error("operation on a released native handle")]
    NullHandle,
}

pub type Result<T> = std::result::Result<T, Error>;

/// A registered native error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(sys::Eina_Error);

impl ErrorCode {
    /// Registers a new error kind with the native error table. The message
    /// is kept by reference, hence `'static`.
    pub fn register_static(msg: &'static CStr) -> ErrorCode {
        ErrorCode(unsafe { sys::eina_error_msg_static_register(msg.as_ptr()) })
    }

    pub fn from_raw(raw: c_int) -> ErrorCode {
        ErrorCode(raw)
    }

    pub fn raw(self) -> c_int {
        self.0
    }

    /// Sets this code as the calling thread's last native error.
    pub fn raise(self) {
        unsafe { sys::eina_error_set(self.0) }
    }

    /// The calling thread's last native error, if any.
    pub fn last() -> Option<ErrorCode> {
        let raw = unsafe { sys::eina_error_get() };
        (raw != 0).then_some(ErrorCode(raw))
    }

    pub fn clear() {
        unsafe { sys::eina_error_set(0) }
    }

    pub fn message(self) -> Option<String> {
        let ptr = unsafe { sys::eina_error_msg_get(self.0) };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// An error kind registered on first use and cached for the life of the
/// process.
pub struct LazyErrorCode {
    msg: &'static CStr,
    code: OnceCell<ErrorCode>,
}

impl LazyErrorCode {
    pub const fn new(msg: &'static CStr) -> LazyErrorCode {
        LazyErrorCode {
            msg,
            code: OnceCell::new(),
        }
    }

    pub fn get(&self) -> ErrorCode {
        *self.code.get_or_init(|| {
            let code = ErrorCode::register_static(self.msg);
            tracing::debug!(code = code.raw(), msg = ?self.msg, "registered native error kind");
            code
        })
    }

    pub fn raise(&self) {
        self.get().raise();
    }
}

static NULL_HANDLE: LazyErrorCode = LazyErrorCode::new(c"Eina: null handle");

/// Reports use of a released eina wrapper through the native error channel.
pub fn raise_null_handle() {
    tracing::warn!("eina wrapper used after its native handle was released");
    NULL_HANDLE.raise();
}

pub fn null_handle_error() -> ErrorCode {
    NULL_HANDLE.get()
}
