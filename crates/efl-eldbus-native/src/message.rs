//! D-Bus messages and positioned iterators over their bodies.

use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use efl_eina::{Binbuf, NativeFree, OwnedHandle, Slice};

use crate::argument::{ArgumentType, BasicArgument, ReadSlot};
use crate::error::{self, Error, Result};
use crate::sys;
use crate::wire;

impl NativeFree for sys::Eldbus_Message {
    unsafe fn free(raw: *mut Self) {
        sys::eldbus_message_unref(raw)
    }
}

/// Name and text of an error reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageError {
    pub name: String,
    pub text: String,
}

unsafe fn owned_text(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

/// A message handle. When owned, this wrapper holds one reference and drops
/// it with `eldbus_message_unref`.
#[derive(Debug)]
pub struct Message {
    handle: OwnedHandle<sys::Eldbus_Message>,
}

impl Message {
    /// # Safety
    /// `raw` must be null or a live message. If `own` is true, the wrapper
    /// takes over one reference.
    pub unsafe fn from_raw(raw: *mut sys::Eldbus_Message, own: bool) -> Message {
        Message {
            handle: OwnedHandle::new(raw, own),
        }
    }

    pub fn method_call_new(dest: &str, path: &str, iface: &str, method: &str) -> Result<Message> {
        let c = |s: &str| CString::new(s).map_err(|_| Error::InteriorNul);
        let (dest, path, iface, method) = (c(dest)?, c(path)?, c(iface)?, c(method)?);
        let raw = unsafe {
            sys::eldbus_message_method_call_new(dest.as_ptr(), path.as_ptr(), iface.as_ptr(), method.as_ptr())
        };
        if raw.is_null() {
            tracing::error!(?method, "eldbus_message_method_call_new returned null");
            return Err(Error::MessageNew);
        }
        Ok(unsafe { Message::from_raw(raw, true) })
    }

    pub fn handle(&self) -> *mut sys::Eldbus_Message {
        self.handle.as_ptr()
    }

    pub fn owns(&self) -> bool {
        self.handle.owns()
    }

    pub fn set_ownership(&mut self, own: bool) {
        self.handle.set_owns(own);
    }

    pub fn release(&mut self) -> *mut sys::Eldbus_Message {
        self.handle.release()
    }

    pub fn dispose(&mut self) {
        self.handle.dispose();
    }

    /// Takes a new reference, returned as an owning wrapper.
    pub fn new_ref(&self) -> Result<Message> {
        let raw = error::live(self.handle())?;
        let raw = unsafe { sys::eldbus_message_ref(raw) };
        Ok(unsafe { Message::from_raw(raw, true) })
    }

    pub fn signature(&self) -> Result<String> {
        let raw = error::live(self.handle())?;
        Ok(unsafe { owned_text(sys::eldbus_message_signature_get(raw)) })
    }

    /// `Some` when this is an error reply.
    pub fn error(&self) -> Result<Option<MessageError>> {
        let raw = error::live(self.handle())?;
        let mut name: *const c_char = ptr::null();
        let mut text: *const c_char = ptr::null();
        if unsafe { sys::eldbus_message_error_get(raw, &mut name, &mut text) } == sys::EINA_FALSE {
            return Ok(None);
        }
        Ok(Some(unsafe {
            MessageError {
                name: owned_text(name),
                text: owned_text(text),
            }
        }))
    }

    /// Iterator positioned at the start of the body.
    pub fn iter(&mut self) -> Result<MessageIterator<'_>> {
        let raw = error::live(self.handle())?;
        let iter = error::live(unsafe { sys::eldbus_message_iter_get(raw) })?;
        Ok(unsafe { MessageIterator::from_raw(iter) })
    }

    pub fn append(&mut self, arg: impl Into<BasicArgument>) -> Result<()> {
        arg.into().append_to(self)
    }

    /// Appends `args` in order, stopping at the first failure.
    pub fn append_all(&mut self, args: &[BasicArgument]) -> Result<()> {
        args.iter().try_for_each(|arg| arg.append_to(self))
    }
}

/// A write or read position inside a message body. Never owns: the handle
/// lives as long as the message it was taken from.
#[derive(Debug)]
pub struct MessageIterator<'a> {
    raw: *mut sys::Eldbus_Message_Iter,
    _msg: PhantomData<&'a mut Message>,
}

impl<'a> MessageIterator<'a> {
    /// # Safety
    /// `raw` must be null or an iterator that stays valid for `'a`.
    pub unsafe fn from_raw(raw: *mut sys::Eldbus_Message_Iter) -> MessageIterator<'a> {
        MessageIterator {
            raw,
            _msg: PhantomData,
        }
    }

    pub fn handle(&self) -> *mut sys::Eldbus_Message_Iter {
        self.raw
    }

    pub fn append_basic(&mut self, arg: impl Into<BasicArgument>) -> Result<()> {
        arg.into().append_to_iter(self)
    }

    /// Opens a container of type `ty` at the write position. Arrays and
    /// variants need the contained signature; structs and dict entries take
    /// `None`.
    pub fn open_container(&mut self, ty: ArgumentType, contained: Option<&str>) -> Result<MessageIterator<'a>> {
        let raw = error::live(self.raw)?;
        if !ty.is_container() {
            return Err(Error::NotAContainer { code: ty.code() });
        }
        let contained = contained
            .map(|s| CString::new(s).map_err(|_| Error::InteriorNul))
            .transpose()?;
        let sig = contained.as_ref().map_or(ptr::null(), |s| s.as_ptr());
        let sub = unsafe { sys::eldbus_message_iter_container_new(raw, ty.c_code(), sig) };
        if sub.is_null() {
            tracing::error!(code = %ty.code(), ?contained, "could not open container");
            return Err(Error::ContainerOpen { code: ty.code() });
        }
        Ok(unsafe { MessageIterator::from_raw(sub) })
    }

    pub fn close_container(&mut self, sub: MessageIterator<'a>) -> Result<()> {
        let raw = error::live(self.raw)?;
        let sub = error::live(sub.raw)?;
        if unsafe { sys::eldbus_message_iter_container_close(raw, sub) } == sys::EINA_FALSE {
            tracing::error!("could not close container");
            return Err(Error::ContainerClose);
        }
        Ok(())
    }

    /// Appends `data` as the elements of the array this iterator writes.
    /// Only byte arrays are supported; `ty` must be `Byte`.
    pub fn append_fixed_array(&mut self, ty: ArgumentType, data: Slice<'_>) -> Result<()> {
        let raw = error::live(self.raw)?;
        let code = ty.code();
        if ty != ArgumentType::Byte {
            return Err(Error::AppendToIterator { code });
        }
        let len = c_uint::try_from(data.len()).map_err(|_| Error::AppendToIterator { code })?;
        let ok = unsafe { sys::eldbus_message_iter_fixed_array_append(raw, ty.c_code(), data.as_raw().mem, len) };
        if ok == sys::EINA_FALSE {
            tracing::error!(%code, len, "could not append fixed array");
            return Err(Error::AppendToIterator { code });
        }
        Ok(())
    }

    /// Writes `buf` as an `ay` value.
    pub fn append_binbuf(&mut self, buf: &Binbuf) -> Result<()> {
        let mut sub = self.open_container(ArgumentType::Array, Some("y"))?;
        let appended = sub.append_fixed_array(ArgumentType::Byte, buf.slice());
        let closed = self.close_container(sub);
        appended.and(closed)
    }

    /// Signature of the remaining values, or `None` at the end.
    pub fn signature(&mut self) -> Option<String> {
        if self.raw.is_null() {
            error::raise_null_handle();
            return None;
        }
        let s = unsafe { sys::eldbus_message_iter_signature_get(self.raw) };
        if s.is_null() {
            return None;
        }
        let out = unsafe { owned_text(s) };
        unsafe { libc::free(s.cast()) };
        (!out.is_empty()).then_some(out)
    }

    pub fn current_type(&mut self) -> Option<ArgumentType> {
        self.signature()
            .and_then(|s| s.chars().next())
            .and_then(ArgumentType::from_code)
    }

    /// Reads the basic value at the cursor and advances.
    pub fn read_basic(&mut self) -> Result<BasicArgument> {
        let raw = error::live(self.raw)?;
        let ty = self.current_type().ok_or(Error::Read { code: '\0' })?;
        if !ty.is_basic() {
            return Err(Error::Read { code: ty.code() });
        }
        let mut slot = ReadSlot::default();
        if !unsafe { wire::iter_get_and_next(raw, ty.code() as c_char, slot.as_mut_ptr()) } {
            return Err(Error::Read { code: ty.code() });
        }
        unsafe { BasicArgument::from_slot(ty, &slot) }.ok_or(Error::Read { code: ty.code() })
    }

    /// Enters the array at the cursor and advances past it.
    pub fn read_array(&mut self) -> Result<MessageIterator<'a>> {
        let raw = error::live(self.raw)?;
        let code = ArgumentType::Array.code();
        let mut sub: *mut sys::Eldbus_Message_Iter = ptr::null_mut();
        let out = (&mut sub as *mut *mut sys::Eldbus_Message_Iter).cast::<c_void>();
        if !unsafe { wire::iter_get_and_next(raw, code as c_char, out) } || sub.is_null() {
            return Err(Error::Read { code });
        }
        Ok(unsafe { MessageIterator::from_raw(sub) })
    }

    /// Copies the byte elements of the array this iterator reads into a new
    /// buffer.
    pub fn read_bytes(&mut self) -> Result<Binbuf> {
        let raw = error::live(self.raw)?;
        let code = ArgumentType::Byte.code();
        let mut data: *const u8 = ptr::null();
        let mut n: c_int = 0;
        let out = (&mut data as *mut *const u8).cast::<c_void>();
        if unsafe { sys::eldbus_message_iter_fixed_array_get(raw, ArgumentType::Byte.c_code(), out, &mut n) }
            == sys::EINA_FALSE
        {
            return Err(Error::Read { code });
        }
        let len = usize::try_from(n).map_err(|_| Error::Read { code })?;
        let bytes = if data.is_null() || len == 0 {
            &[][..]
        } else {
            unsafe { std::slice::from_raw_parts(data, len) }
        };
        Ok(Binbuf::from_bytes(bytes)?)
    }
}
