//! Ownership token for a native handle.
//!
//! Invariant: an owning, non-null handle is freed exactly once. Every path
//! that frees first clears the stored pointer, so a second dispose, a drop
//! after dispose, or a drop after `release` never reaches the native free.

use std::ffi::c_void;
use std::fmt;
use std::ptr;

use crate::deferred;
use crate::sys;

/// A native type with a destructor.
pub trait NativeFree {
    /// # Safety
    /// `raw` must be a live, non-null handle of this type.
    unsafe fn free(raw: *mut Self);
}

impl NativeFree for sys::Eina_Binbuf {
    unsafe fn free(raw: *mut Self) {
        sys::eina_binbuf_free(raw)
    }
}

impl NativeFree for sys::Eina_Iterator {
    unsafe fn free(raw: *mut Self) {
        sys::eina_iterator_free(raw)
    }
}

unsafe fn free_erased<T: NativeFree>(raw: *mut c_void) {
    T::free(raw.cast())
}

pub struct OwnedHandle<T: NativeFree> {
    raw: *mut T,
    own: bool,
}

impl<T: NativeFree> OwnedHandle<T> {
    /// # Safety
    /// If `own` is true, `raw` must be null or a live handle nobody else
    /// will free.
    pub unsafe fn new(raw: *mut T, own: bool) -> Self {
        OwnedHandle { raw, own }
    }

    pub fn null() -> Self {
        OwnedHandle {
            raw: ptr::null_mut(),
            own: false,
        }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.raw
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    pub fn owns(&self) -> bool {
        self.own
    }

    pub fn set_owns(&mut self, own: bool) {
        self.own = own;
    }

    /// Gives up the handle without freeing it. This token is empty
    /// afterwards.
    pub fn release(&mut self) -> *mut T {
        std::mem::replace(&mut self.raw, ptr::null_mut())
    }

    /// Frees the handle now if owned. Repeated calls are no-ops.
    pub fn dispose(&mut self) {
        let raw = self.release();
        if self.own && !raw.is_null() {
            unsafe { T::free(raw) }
        }
    }
}

impl<T: NativeFree> Drop for OwnedHandle<T> {
    fn drop(&mut self) {
        let raw = self.release();
        if self.own && !raw.is_null() {
            unsafe { deferred::schedule(raw.cast(), free_erased::<T>) }
        }
    }
}

impl<T: NativeFree> fmt::Debug for OwnedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedHandle")
            .field("raw", &self.raw)
            .field("own", &self.own)
            .finish()
    }
}
