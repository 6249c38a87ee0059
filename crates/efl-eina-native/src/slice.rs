use std::ffi::c_void;
use std::marker::PhantomData;

use crate::sys;

/// A borrowed, non-owning view of native memory: pointer plus length.
#[derive(Clone, Copy, Debug)]
pub struct Slice<'a> {
    raw: sys::Eina_Slice,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> Slice<'a> {
    /// # Safety
    /// `raw.mem` must point to `raw.len` readable bytes for `'a`, or `len`
    /// must be 0.
    pub unsafe fn from_raw(raw: sys::Eina_Slice) -> Slice<'a> {
        Slice {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn as_raw(&self) -> sys::Eina_Slice {
        self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        if self.raw.len == 0 || self.raw.mem.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.raw.mem.cast::<u8>(), self.raw.len) }
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    fn from(bytes: &'a [u8]) -> Slice<'a> {
        Slice {
            raw: sys::Eina_Slice {
                len: bytes.len(),
                mem: bytes.as_ptr().cast::<c_void>(),
            },
            _marker: PhantomData,
        }
    }
}
