#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint, c_void};

pub use efl_eina::sys::{Eina_Bool, EINA_FALSE, EINA_TRUE};

#[repr(C)]
pub struct Eldbus_Message {
    _private: [u8; 0],
}

#[repr(C)]
pub struct Eldbus_Message_Iter {
    _private: [u8; 0],
}

#[repr(C)]
pub struct Eldbus_Pending {
    _private: [u8; 0],
}

#[repr(C)]
pub struct Eldbus_Connection {
    _private: [u8; 0],
}

pub type Eldbus_Message_Cb =
    unsafe extern "C" fn(data: *mut c_void, msg: *const Eldbus_Message, pending: *mut Eldbus_Pending);

pub const ELDBUS_TIMEOUT_INFINITE: c_int = 0x7fffffff;

extern "C" {
    pub fn eldbus_message_ref(msg: *mut Eldbus_Message) -> *mut Eldbus_Message;
    pub fn eldbus_message_unref(msg: *mut Eldbus_Message);
    pub fn eldbus_message_method_call_new(
        dest: *const c_char,
        path: *const c_char,
        iface: *const c_char,
        method: *const c_char,
    ) -> *mut Eldbus_Message;
    pub fn eldbus_message_signature_get(msg: *const Eldbus_Message) -> *const c_char;
    pub fn eldbus_message_error_get(
        msg: *const Eldbus_Message,
        name: *mut *const c_char,
        text: *mut *const c_char,
    ) -> Eina_Bool;
    pub fn eldbus_message_iter_get(msg: *const Eldbus_Message) -> *mut Eldbus_Message_Iter;

    pub fn eldbus_message_arguments_append(
        msg: *mut Eldbus_Message,
        signature: *const c_char,
        ...
    ) -> Eina_Bool;
    pub fn eldbus_message_iter_basic_append(
        iter: *mut Eldbus_Message_Iter,
        type_: c_int,
        ...
    ) -> Eina_Bool;
    pub fn eldbus_message_iter_get_and_next(
        iter: *mut Eldbus_Message_Iter,
        signature: c_char,
        ...
    ) -> Eina_Bool;

    pub fn eldbus_message_iter_container_new(
        iter: *mut Eldbus_Message_Iter,
        type_: c_int,
        contained_signature: *const c_char,
    ) -> *mut Eldbus_Message_Iter;
    pub fn eldbus_message_iter_container_close(
        iter: *mut Eldbus_Message_Iter,
        sub: *mut Eldbus_Message_Iter,
    ) -> Eina_Bool;
    pub fn eldbus_message_iter_fixed_array_append(
        iter: *mut Eldbus_Message_Iter,
        type_: c_int,
        array: *const c_void,
        size: c_uint,
    ) -> Eina_Bool;
    pub fn eldbus_message_iter_fixed_array_get(
        iter: *mut Eldbus_Message_Iter,
        signature: c_int,
        value: *mut c_void,
        n_elements: *mut c_int,
    ) -> Eina_Bool;
    /// Returned string is heap allocated; release with `free`.
    pub fn eldbus_message_iter_signature_get(iter: *mut Eldbus_Message_Iter) -> *mut c_char;

    pub fn eldbus_pending_cancel(pending: *mut Eldbus_Pending);
    pub fn eldbus_pending_method_get(pending: *const Eldbus_Pending) -> *const c_char;

    pub fn eldbus_connection_send(
        conn: *mut Eldbus_Connection,
        msg: *mut Eldbus_Message,
        cb: Option<Eldbus_Message_Cb>,
        cb_data: *const c_void,
        timeout: f64,
    ) -> *mut Eldbus_Pending;
}
