#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_void};

pub type Eina_Bool = u8;
pub type Eina_Error = c_int;

pub const EINA_FALSE: Eina_Bool = 0;
pub const EINA_TRUE: Eina_Bool = 1;

#[repr(C)]
pub struct Eina_Binbuf {
    _private: [u8; 0],
}

#[repr(C)]
pub struct Eina_Iterator {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct Eina_Slice {
    pub len: usize,
    pub mem: *const c_void,
}

extern "C" {
    pub fn eina_binbuf_new() -> *mut Eina_Binbuf;
    pub fn eina_binbuf_free(buf: *mut Eina_Binbuf);
    pub fn eina_binbuf_reset(buf: *mut Eina_Binbuf);
    pub fn eina_binbuf_append_length(
        buf: *mut Eina_Binbuf,
        str: *const u8,
        length: usize,
    ) -> Eina_Bool;
    pub fn eina_binbuf_append_slice(buf: *mut Eina_Binbuf, slice: Eina_Slice) -> Eina_Bool;
    pub fn eina_binbuf_append_buffer(buf: *mut Eina_Binbuf, data: *const Eina_Binbuf) -> Eina_Bool;
    pub fn eina_binbuf_append_char(buf: *mut Eina_Binbuf, c: u8) -> Eina_Bool;
    pub fn eina_binbuf_insert_length(
        buf: *mut Eina_Binbuf,
        str: *const u8,
        length: usize,
        pos: usize,
    ) -> Eina_Bool;
    pub fn eina_binbuf_insert_slice(
        buf: *mut Eina_Binbuf,
        slice: Eina_Slice,
        pos: usize,
    ) -> Eina_Bool;
    pub fn eina_binbuf_insert_char(buf: *mut Eina_Binbuf, c: u8, pos: usize) -> Eina_Bool;
    pub fn eina_binbuf_remove(buf: *mut Eina_Binbuf, start: usize, end: usize) -> Eina_Bool;
    pub fn eina_binbuf_string_get(buf: *const Eina_Binbuf) -> *const u8;
    pub fn eina_binbuf_string_free(buf: *mut Eina_Binbuf);
    pub fn eina_binbuf_length_get(buf: *const Eina_Binbuf) -> usize;
    pub fn eina_binbuf_slice_get(buf: *const Eina_Binbuf) -> Eina_Slice;

    pub fn eina_iterator_free(iterator: *mut Eina_Iterator);
    pub fn eina_iterator_container_get(iterator: *mut Eina_Iterator) -> *mut c_void;
    pub fn eina_iterator_next(iterator: *mut Eina_Iterator, data: *mut *mut c_void) -> Eina_Bool;
    pub fn eina_iterator_lock(iterator: *mut Eina_Iterator) -> Eina_Bool;
    pub fn eina_iterator_unlock(iterator: *mut Eina_Iterator) -> Eina_Bool;

    pub fn eina_error_msg_static_register(msg: *const c_char) -> Eina_Error;
    pub fn eina_error_msg_get(error: Eina_Error) -> *const c_char;
    pub fn eina_error_set(err: Eina_Error);
    pub fn eina_error_get() -> Eina_Error;

    pub fn eina_main_loop_is() -> Eina_Bool;
}
