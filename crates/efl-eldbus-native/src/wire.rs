//! Calls into the variadic eldbus entry points.
//!
//! Each basic value crosses as the type C default argument promotion gives
//! it: everything narrower than `int` travels as `int`.

use std::ffi::{c_int, c_uint, CStr};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WireValue<'a> {
    Int(c_int),
    UInt(c_uint),
    Long(i64),
    ULong(u64),
    Double(f64),
    Text(&'a CStr),
}

#[cfg(not(test))]
mod imp {
    use std::ffi::{c_char, c_int, c_void, CStr};

    use super::WireValue;
    use crate::sys;

    pub(crate) unsafe fn arguments_append(
        msg: *mut sys::Eldbus_Message,
        signature: &CStr,
        value: WireValue<'_>,
    ) -> bool {
        let sig = signature.as_ptr();
        let ok = match value {
            WireValue::Int(v) => sys::eldbus_message_arguments_append(msg, sig, v),
            WireValue::UInt(v) => sys::eldbus_message_arguments_append(msg, sig, v),
            WireValue::Long(v) => sys::eldbus_message_arguments_append(msg, sig, v),
            WireValue::ULong(v) => sys::eldbus_message_arguments_append(msg, sig, v),
            WireValue::Double(v) => sys::eldbus_message_arguments_append(msg, sig, v),
            WireValue::Text(s) => sys::eldbus_message_arguments_append(msg, sig, s.as_ptr()),
        };
        ok != sys::EINA_FALSE
    }

    pub(crate) unsafe fn iter_basic_append(
        iter: *mut sys::Eldbus_Message_Iter,
        code: c_int,
        value: WireValue<'_>,
    ) -> bool {
        let ok = match value {
            WireValue::Int(v) => sys::eldbus_message_iter_basic_append(iter, code, v),
            WireValue::UInt(v) => sys::eldbus_message_iter_basic_append(iter, code, v),
            WireValue::Long(v) => sys::eldbus_message_iter_basic_append(iter, code, v),
            WireValue::ULong(v) => sys::eldbus_message_iter_basic_append(iter, code, v),
            WireValue::Double(v) => sys::eldbus_message_iter_basic_append(iter, code, v),
            WireValue::Text(s) => sys::eldbus_message_iter_basic_append(iter, code, s.as_ptr()),
        };
        ok != sys::EINA_FALSE
    }

    /// `out` must point to storage large and aligned enough for the value
    /// `code` names.
    pub(crate) unsafe fn iter_get_and_next(
        iter: *mut sys::Eldbus_Message_Iter,
        code: c_char,
        out: *mut c_void,
    ) -> bool {
        sys::eldbus_message_iter_get_and_next(iter, code, out) != sys::EINA_FALSE
    }
}

#[cfg(test)]
use crate::fake::wire as imp;

pub(crate) use imp::{arguments_append, iter_basic_append, iter_get_and_next};
