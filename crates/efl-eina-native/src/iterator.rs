//! Typed, single-pass adapter over a native iteration cursor.

use std::ffi::{c_char, c_void, CStr};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr;

use crate::binbuf::BinbufRef;
use crate::error::raise_null_handle;
use crate::handle::OwnedHandle;
use crate::sys;

/// Conversion from the opaque element pointer a native iterator yields.
///
/// The conversion is chosen by the element type, once per `EinaIterator`
/// instantiation: value types are read through the pointer, handle-like
/// types reinterpret it. `'a` is how long the container keeps its
/// elements alive; borrowing types carry it.
pub trait FromNative<'a>: Sized {
    /// # Safety
    /// `data` must be null or point to a live element of the shape this
    /// type expects, valid for `'a`.
    unsafe fn from_native(data: *mut c_void) -> Self;
}

macro_rules! from_native_by_copy {
    ($($t:ty),* $(,)?) => {
        $(
            impl<'a> FromNative<'a> for $t {
                unsafe fn from_native(data: *mut c_void) -> Self {
                    if data.is_null() {
                        return <$t>::default();
                    }
                    ptr::read_unaligned(data.cast::<$t>())
                }
            }
        )*
    };
}

from_native_by_copy!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl<'a> FromNative<'a> for bool {
    unsafe fn from_native(data: *mut c_void) -> Self {
        !data.is_null() && *data.cast::<sys::Eina_Bool>() != sys::EINA_FALSE
    }
}

impl<'a> FromNative<'a> for *mut c_void {
    unsafe fn from_native(data: *mut c_void) -> Self {
        data
    }
}

impl<'a> FromNative<'a> for *const c_char {
    unsafe fn from_native(data: *mut c_void) -> Self {
        data.cast_const().cast()
    }
}

impl<'a> FromNative<'a> for String {
    unsafe fn from_native(data: *mut c_void) -> Self {
        if data.is_null() {
            return String::new();
        }
        CStr::from_ptr(data.cast_const().cast())
            .to_string_lossy()
            .into_owned()
    }
}

/// Elements are buffers owned by the container.
impl<'a> FromNative<'a> for BinbufRef<'a> {
    unsafe fn from_native(data: *mut c_void) -> Self {
        BinbufRef::from_raw(data.cast())
    }
}

pub struct EinaIterator<'a, T: FromNative<'a>> {
    handle: OwnedHandle<sys::Eina_Iterator>,
    exhausted: bool,
    _marker: PhantomData<(&'a (), T)>,
}

impl<'a, T: FromNative<'a>> EinaIterator<'a, T> {
    /// # Safety
    /// `raw` must be null or a live `Eina_Iterator` whose elements match
    /// `T`. If `own` is true, nothing else may free it. The container must
    /// keep every element alive and unchanged for `'a`; tie `'a` to a
    /// borrow of the container when elements are borrowed.
    pub unsafe fn from_raw(raw: *mut sys::Eina_Iterator, own: bool) -> Self {
        EinaIterator {
            handle: OwnedHandle::new(raw, own),
            exhausted: false,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> *mut sys::Eina_Iterator {
        self.handle.as_ptr()
    }

    pub fn owns(&self) -> bool {
        self.handle.owns()
    }

    pub fn set_ownership(&mut self, own: bool) {
        self.handle.set_owns(own);
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn live(&self) -> Option<*mut sys::Eina_Iterator> {
        if self.handle.is_null() {
            raise_null_handle();
            return None;
        }
        Some(self.handle.as_ptr())
    }

    /// Asks the container to reject structural changes while iterating.
    /// Best effort.
    pub fn lock(&mut self) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        unsafe { sys::eina_iterator_lock(h) != sys::EINA_FALSE }
    }

    pub fn unlock(&mut self) -> bool {
        let Some(h) = self.live() else {
            return false;
        };
        unsafe { sys::eina_iterator_unlock(h) != sys::EINA_FALSE }
    }

    /// The container being iterated, or null.
    pub fn container(&self) -> *mut c_void {
        match self.live() {
            Some(h) => unsafe { sys::eina_iterator_container_get(h) },
            None => ptr::null_mut(),
        }
    }

    pub fn release(&mut self) -> *mut sys::Eina_Iterator {
        self.handle.release()
    }

    pub fn dispose(&mut self) {
        self.handle.dispose();
    }
}

impl<'a, T: FromNative<'a>> Iterator for EinaIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.exhausted || self.handle.is_null() {
            return None;
        }
        let mut data: *mut c_void = ptr::null_mut();
        if unsafe { sys::eina_iterator_next(self.handle.as_ptr(), &mut data) } == sys::EINA_FALSE {
            self.exhausted = true;
            return None;
        }
        Some(unsafe { T::from_native(data) })
    }
}

impl<'a, T: FromNative<'a>> FusedIterator for EinaIterator<'a, T> {}

impl<'a, T: FromNative<'a>> std::fmt::Debug for EinaIterator<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EinaIterator")
            .field("handle", &self.handle)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
