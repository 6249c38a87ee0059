//! In-flight method calls.

use std::ffi::CStr;

use crate::error::{self, Result};
use crate::sys;

/// An outstanding call. Never owns its handle: eldbus frees the pending
/// after the reply callback runs or after `cancel`.
#[derive(Debug)]
pub struct Pending {
    raw: *mut sys::Eldbus_Pending,
}

impl Pending {
    /// # Safety
    /// `raw` must be null or a pending call that stays valid while this
    /// wrapper is used.
    pub unsafe fn from_raw(raw: *mut sys::Eldbus_Pending) -> Pending {
        Pending { raw }
    }

    pub fn handle(&self) -> *mut sys::Eldbus_Pending {
        self.raw
    }

    /// Name of the method this call invokes.
    pub fn method(&self) -> Result<Option<String>> {
        let raw = error::live(self.raw)?;
        let s = unsafe { sys::eldbus_pending_method_get(raw) };
        if s.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()))
    }

    /// Cancels the call. Native code delivers an error reply to the
    /// callback and frees the pending; this wrapper is empty afterwards.
    pub fn cancel(&mut self) -> Result<()> {
        let raw = error::live(self.raw)?;
        self.raw = std::ptr::null_mut();
        unsafe { sys::eldbus_pending_cancel(raw) };
        Ok(())
    }
}
