//! Growable byte buffer whose storage lives in native memory.

use std::marker::PhantomData;

use crate::error::{raise_null_handle, Error, Result};
use crate::handle::OwnedHandle;
use crate::slice::Slice;
use crate::sys;

#[derive(Debug)]
pub struct Binbuf {
    handle: OwnedHandle<sys::Eina_Binbuf>,
}

// The buffer has no thread affinity; only its free does, and that goes
// through the deferred queue when dropped off the main loop. Buffers owned
// by someone else are reached through `BinbufRef`, which is not `Send`.
unsafe impl Send for Binbuf {}

fn ok(res: sys::Eina_Bool) -> bool {
    res != sys::EINA_FALSE
}

impl Binbuf {
    /// Allocates an empty, owned buffer.
    pub fn new() -> Result<Binbuf> {
        let raw = unsafe { sys::eina_binbuf_new() };
        if raw.is_null() {
            tracing::error!("eina_binbuf_new returned null");
            return Err(Error::BinbufAlloc);
        }
        Ok(Binbuf {
            handle: unsafe { OwnedHandle::new(raw, true) },
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Binbuf> {
        Binbuf::from_bytes_len(bytes, bytes.len())
    }

    /// Allocates a buffer holding the first `length` bytes of `bytes`. The
    /// partially built buffer is freed if the append fails.
    pub fn from_bytes_len(bytes: &[u8], length: usize) -> Result<Binbuf> {
        let mut buf = Binbuf::new()?;
        if !buf.append_len(bytes, length) {
            buf.dispose();
            return Err(Error::BinbufAppend);
        }
        Ok(buf)
    }

    /// Allocates a buffer holding a copy of `other`'s contents.
    pub fn from_binbuf(other: &Binbuf) -> Result<Binbuf> {
        let mut buf = Binbuf::new()?;
        if !buf.append_binbuf(other) {
            buf.dispose();
            return Err(Error::BinbufAppend);
        }
        Ok(buf)
    }

    /// Adopts a native buffer. No allocation happens.
    ///
    /// # Safety
    /// `raw` must be null or a live `Eina_Binbuf`. If `own` is true, nothing
    /// else may free it. If `own` is false, the buffer must outlive this
    /// wrapper and stay usable from whichever thread the wrapper is sent to;
    /// use [`BinbufRef`] for buffers borrowed from a container.
    pub unsafe fn from_raw(raw: *mut sys::Eina_Binbuf, own: bool) -> Binbuf {
        Binbuf {
            handle: OwnedHandle::new(raw, own),
        }
    }

    pub fn handle(&self) -> *mut sys::Eina_Binbuf {
        self.handle.as_ptr()
    }

    pub fn owns(&self) -> bool {
        self.handle.owns()
    }

    pub fn set_ownership(&mut self, own: bool) {
        self.handle.set_owns(own);
    }

    fn live(&self) -> Option<*mut sys::Eina_Binbuf> {
        if self.handle.is_null() {
            raise_null_handle();
            return None;
        }
        Some(self.handle.as_ptr())
    }

    /// Hands the native buffer to the caller without freeing it. This
    /// wrapper is empty afterwards.
    pub fn release(&mut self) -> *mut sys::Eina_Binbuf {
        self.handle.release()
    }

    /// Frees the native buffer now if owned. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.handle.dispose();
    }

    pub fn reset(&mut self) {
        if let Some(h) = self.live() {
            unsafe { sys::eina_binbuf_reset(h) }
        }
    }

    pub fn append(&mut self, bytes: &[u8]) -> bool {
        self.append_len(bytes, bytes.len())
    }

    /// Appends exactly `length` bytes from `bytes`. Refuses lengths past the
    /// end of `bytes`.
    pub fn append_len(&mut self, bytes: &[u8], length: usize) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        if length > bytes.len() {
            tracing::debug!(length, available = bytes.len(), "binbuf append past end of input");
            return false;
        }
        ok(unsafe { sys::eina_binbuf_append_length(h, bytes.as_ptr(), length) })
    }

    pub fn append_byte(&mut self, c: u8) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        ok(unsafe { sys::eina_binbuf_append_char(h, c) })
    }

    pub fn append_slice(&mut self, slice: Slice<'_>) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        ok(unsafe { sys::eina_binbuf_append_slice(h, slice.as_raw()) })
    }

    pub fn append_binbuf(&mut self, other: &Binbuf) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        let Some(src) = other.live() else {
            return false;
        };
        ok(unsafe { sys::eina_binbuf_append_buffer(h, src) })
    }

    /// Inserts `bytes` at byte offset `pos`. The offset is not validated
    /// here; the native buffer decides what an out-of-range offset means.
    pub fn insert(&mut self, bytes: &[u8], pos: usize) -> bool {
        self.insert_len(bytes, bytes.len(), pos)
    }

    pub fn insert_len(&mut self, bytes: &[u8], length: usize, pos: usize) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        if length > bytes.len() {
            tracing::debug!(length, available = bytes.len(), "binbuf insert past end of input");
            return false;
        }
        ok(unsafe { sys::eina_binbuf_insert_length(h, bytes.as_ptr(), length, pos) })
    }

    pub fn insert_byte(&mut self, c: u8, pos: usize) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        ok(unsafe { sys::eina_binbuf_insert_char(h, c, pos) })
    }

    pub fn insert_slice(&mut self, slice: Slice<'_>, pos: usize) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        ok(unsafe { sys::eina_binbuf_insert_slice(h, slice.as_raw(), pos) })
    }

    /// Removes bytes in `start..end`. Callers must keep
    /// `start <= end <= self.len()`.
    pub fn remove(&mut self, start: usize, end: usize) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        ok(unsafe { sys::eina_binbuf_remove(h, start, end) })
    }

    /// Copies the contents out. `None` if the handle was released or the
    /// native buffer has no storage.
    pub fn to_vec(&self) -> Option<Vec<u8>> {
        let h = self.live()?;
        let ptr = unsafe { sys::eina_binbuf_string_get(h) };
        if ptr.is_null() {
            return None;
        }
        let len = unsafe { sys::eina_binbuf_length_get(h) };
        Some(unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec())
    }

    /// Frees the contents but keeps the buffer usable.
    pub fn free_string(&mut self) {
        if let Some(h) = self.live() {
            unsafe { sys::eina_binbuf_string_free(h) }
        }
    }

    pub fn len(&self) -> usize {
        match self.live() {
            Some(h) => unsafe { sys::eina_binbuf_length_get(h) },
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrowed view of the current contents. Any mutation needs `&mut
    /// self`, so the view cannot outlive it.
    pub fn slice(&self) -> Slice<'_> {
        let raw = match self.live() {
            Some(h) => unsafe { sys::eina_binbuf_slice_get(h) },
            None => sys::Eina_Slice {
                len: 0,
                mem: std::ptr::null(),
            },
        };
        unsafe { Slice::from_raw(raw) }
    }

    /// Read-only view of this buffer for the duration of the borrow.
    pub fn view(&self) -> BinbufRef<'_> {
        BinbufRef {
            raw: self.handle.as_ptr(),
            _marker: PhantomData,
        }
    }
}

/// A buffer owned by someone else, valid for `'a`.
///
/// Never frees the buffer and offers no mutation. It cannot leave the
/// thread it was produced on; copy it with [`BinbufRef::to_binbuf`] to get
/// a buffer of your own.
#[derive(Debug, Clone, Copy)]
pub struct BinbufRef<'a> {
    raw: *mut sys::Eina_Binbuf,
    _marker: PhantomData<&'a Binbuf>,
}

impl<'a> BinbufRef<'a> {
    /// # Safety
    /// `raw` must be null or a live `Eina_Binbuf` that nothing frees or
    /// mutates for `'a`.
    pub unsafe fn from_raw(raw: *mut sys::Eina_Binbuf) -> BinbufRef<'a> {
        BinbufRef {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> *mut sys::Eina_Binbuf {
        self.raw
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    pub fn len(&self) -> usize {
        if self.raw.is_null() {
            return 0;
        }
        unsafe { sys::eina_binbuf_length_get(self.raw) }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slice(&self) -> Slice<'a> {
        if self.raw.is_null() {
            return Slice::from(&b""[..]);
        }
        unsafe { Slice::from_raw(sys::eina_binbuf_slice_get(self.raw)) }
    }

    pub fn to_vec(&self) -> Option<Vec<u8>> {
        if self.raw.is_null() {
            return None;
        }
        Some(self.slice().as_bytes().to_vec())
    }

    /// Copies the contents into a new buffer this side owns.
    pub fn to_binbuf(&self) -> Result<Binbuf> {
        let mut buf = Binbuf::new()?;
        if !buf.append_slice(self.slice()) {
            buf.dispose();
            return Err(Error::BinbufAppend);
        }
        Ok(buf)
    }
}
