//! In-memory stand-ins for the eldbus entry points used by unit tests.
//!
//! Objects are leaked so handles stay unique for the life of the test
//! process. The variadic entry points cannot be defined in Rust; `wire`
//! replaces the shim that calls them.
#![allow(clippy::missing_safety_doc)]

use std::collections::HashSet;
use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::ptr;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::sys::{
    Eina_Bool, Eldbus_Connection, Eldbus_Message, Eldbus_Message_Cb, Eldbus_Message_Iter, Eldbus_Pending,
    EINA_FALSE, EINA_TRUE,
};

/// A value as recorded in a fake message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Container(Vec<(char, Value)>),
}

impl Value {
    fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => Some(v as i64),
            _ => None,
        }
    }
}

fn signature_of(code: char, value: &Value) -> String {
    match (code, value) {
        ('a', Value::Bytes(_)) => "ay".to_string(),
        ('a', Value::Container(items)) => {
            let inner = items.first().map(|(c, v)| signature_of(*c, v)).unwrap_or_default();
            format!("a{inner}")
        }
        ('r', Value::Container(items)) => format!("({})", concat_signature(items)),
        ('e', Value::Container(items)) => format!("{{{}}}", concat_signature(items)),
        (c, _) => c.to_string(),
    }
}

fn concat_signature(items: &[(char, Value)]) -> String {
    items.iter().map(|(c, v)| signature_of(*c, v)).collect()
}

static FAIL_NEXT: Lazy<Mutex<HashSet<usize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn take_failure(raw: usize) -> bool {
    FAIL_NEXT.lock().unwrap_or_else(|e| e.into_inner()).remove(&raw)
}

unsafe fn text(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

// -------------------------
// Messages
// -------------------------

struct FakeMessage {
    refs: usize,
    unrefs: usize,
    body: Vec<(char, Value)>,
    signature: CString,
    error: Option<(CString, CString)>,
    method: CString,
}

unsafe fn fake_message<'a>(msg: *const Eldbus_Message) -> &'a mut FakeMessage {
    &mut *(msg as *mut FakeMessage)
}

fn message_named(method: CString) -> *mut Eldbus_Message {
    Box::into_raw(Box::new(FakeMessage {
        refs: 1,
        unrefs: 0,
        body: Vec::new(),
        signature: CString::default(),
        error: None,
        method,
    }))
    .cast()
}

fn push_to_message(m: &mut FakeMessage, code: char, value: Value, signature: &str) {
    let mut sig = m.signature.to_string_lossy().into_owned();
    sig.push_str(signature);
    m.signature = CString::new(sig).unwrap_or_default();
    m.body.push((code, value));
}

pub fn new_message() -> *mut Eldbus_Message {
    message_named(CString::default())
}

/// Replaces the body a reader sees.
pub fn set_body(msg: *mut Eldbus_Message, body: Vec<(char, Value)>) {
    let m = unsafe { fake_message(msg) };
    m.signature = CString::new(concat_signature(&body)).unwrap_or_default();
    m.body = body;
}

pub fn set_error(msg: *mut Eldbus_Message, name: &str, text: &str) {
    let m = unsafe { fake_message(msg) };
    m.error = Some((
        CString::new(name).unwrap_or_default(),
        CString::new(text).unwrap_or_default(),
    ));
}

pub fn appended(msg: *mut Eldbus_Message) -> Vec<(char, Value)> {
    unsafe { fake_message(msg) }.body.clone()
}

pub fn refs(msg: *mut Eldbus_Message) -> usize {
    unsafe { fake_message(msg) }.refs
}

pub fn unrefs(msg: *mut Eldbus_Message) -> usize {
    unsafe { fake_message(msg) }.unrefs
}

/// The next append through `raw` (a message or an iterator) fails.
pub fn fail_next_append(raw: *mut c_void) {
    FAIL_NEXT.lock().unwrap_or_else(|e| e.into_inner()).insert(raw as usize);
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_ref(msg: *mut Eldbus_Message) -> *mut Eldbus_Message {
    fake_message(msg).refs += 1;
    msg
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_unref(msg: *mut Eldbus_Message) {
    fake_message(msg).unrefs += 1;
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_method_call_new(
    _dest: *const c_char,
    _path: *const c_char,
    _iface: *const c_char,
    method: *const c_char,
) -> *mut Eldbus_Message {
    message_named(CStr::from_ptr(method).to_owned())
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_signature_get(msg: *const Eldbus_Message) -> *const c_char {
    fake_message(msg).signature.as_ptr()
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_error_get(
    msg: *const Eldbus_Message,
    name: *mut *const c_char,
    text: *mut *const c_char,
) -> Eina_Bool {
    let Some((n, t)) = &fake_message(msg).error else {
        return EINA_FALSE;
    };
    *name = n.as_ptr();
    *text = t.as_ptr();
    EINA_TRUE
}

// -------------------------
// Iterators
// -------------------------

struct FakeIter {
    /// Writes land in this message's body when set, otherwise in `items`.
    msg: *mut FakeMessage,
    code: char,
    contained: String,
    items: Vec<(char, Value)>,
    signature: String,
    read: Vec<(char, Value)>,
    pos: usize,
    bytes: Vec<u8>,
}

impl Default for FakeIter {
    fn default() -> Self {
        FakeIter {
            msg: ptr::null_mut(),
            code: '\0',
            contained: String::new(),
            items: Vec::new(),
            signature: String::new(),
            read: Vec::new(),
            pos: 0,
            bytes: Vec::new(),
        }
    }
}

unsafe fn fake_iter<'a>(iter: *mut Eldbus_Message_Iter) -> &'a mut FakeIter {
    &mut *(iter as *mut FakeIter)
}

fn leak_iter(it: FakeIter) -> *mut Eldbus_Message_Iter {
    Box::into_raw(Box::new(it)).cast()
}

unsafe fn push_to_iter(it: &mut FakeIter, code: char, value: Value, signature: &str) {
    if it.msg.is_null() {
        it.signature.push_str(signature);
        it.items.push((code, value));
    } else {
        push_to_message(&mut *it.msg, code, value, signature);
    }
}

fn reader_over(value: Value) -> *mut Eldbus_Message_Iter {
    match value {
        Value::Bytes(bytes) => leak_iter(FakeIter {
            bytes,
            ..FakeIter::default()
        }),
        Value::Container(read) => leak_iter(FakeIter {
            read,
            ..FakeIter::default()
        }),
        other => leak_iter(FakeIter {
            read: vec![('v', other)],
            ..FakeIter::default()
        }),
    }
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_iter_get(msg: *const Eldbus_Message) -> *mut Eldbus_Message_Iter {
    let m = fake_message(msg);
    leak_iter(FakeIter {
        msg: msg as *mut FakeMessage,
        read: m.body.clone(),
        ..FakeIter::default()
    })
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_iter_container_new(
    iter: *mut Eldbus_Message_Iter,
    type_: c_int,
    contained_signature: *const c_char,
) -> *mut Eldbus_Message_Iter {
    if take_failure(iter as usize) {
        return ptr::null_mut();
    }
    leak_iter(FakeIter {
        code: type_ as u8 as char,
        contained: text(contained_signature),
        ..FakeIter::default()
    })
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_iter_container_close(
    iter: *mut Eldbus_Message_Iter,
    sub: *mut Eldbus_Message_Iter,
) -> Eina_Bool {
    if take_failure(iter as usize) {
        return EINA_FALSE;
    }
    let sub = fake_iter(sub);
    let signature = match sub.code {
        'a' => format!("a{}", sub.contained),
        'r' => format!("({})", sub.signature),
        'e' => format!("{{{}}}", sub.signature),
        c => c.to_string(),
    };
    let items = std::mem::take(&mut sub.items);
    push_to_iter(fake_iter(iter), sub.code, Value::Container(items), &signature);
    EINA_TRUE
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_iter_fixed_array_append(
    iter: *mut Eldbus_Message_Iter,
    type_: c_int,
    array: *const c_void,
    size: c_uint,
) -> Eina_Bool {
    if take_failure(iter as usize) || type_ != b'y' as c_int {
        return EINA_FALSE;
    }
    let bytes = if array.is_null() || size == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(array.cast::<u8>(), size as usize).to_vec()
    };
    let it = fake_iter(iter);
    it.items.push(('y', Value::Bytes(bytes)));
    EINA_TRUE
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_iter_fixed_array_get(
    iter: *mut Eldbus_Message_Iter,
    signature: c_int,
    value: *mut c_void,
    n_elements: *mut c_int,
) -> Eina_Bool {
    if signature != b'y' as c_int {
        return EINA_FALSE;
    }
    let it = fake_iter(iter);
    *value.cast::<*const u8>() = it.bytes.as_ptr();
    *n_elements = it.bytes.len() as c_int;
    EINA_TRUE
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_message_iter_signature_get(iter: *mut Eldbus_Message_Iter) -> *mut c_char {
    let it = fake_iter(iter);
    let rest = it.read.get(it.pos..).map(concat_signature).unwrap_or_default();
    let rest = CString::new(rest).unwrap_or_default();
    libc::strdup(rest.as_ptr())
}

// -------------------------
// Pending calls and connections
// -------------------------

struct FakePending {
    cancelled: bool,
    method: CString,
}

pub fn new_pending(method: &str) -> *mut Eldbus_Pending {
    Box::into_raw(Box::new(FakePending {
        cancelled: false,
        method: CString::new(method).unwrap_or_default(),
    }))
    .cast()
}

pub fn pending_cancelled(pending: *mut Eldbus_Pending) -> bool {
    unsafe { &*(pending as *const FakePending) }.cancelled
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_pending_cancel(pending: *mut Eldbus_Pending) {
    (*(pending as *mut FakePending)).cancelled = true;
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_pending_method_get(pending: *const Eldbus_Pending) -> *const c_char {
    (*(pending as *const FakePending)).method.as_ptr()
}

struct Sent {
    cb: Option<Eldbus_Message_Cb>,
    data: *mut c_void,
    pending: *mut Eldbus_Pending,
    timeout: f64,
}

#[derive(Default)]
struct FakeConnection {
    sent: Vec<Sent>,
    fail_next: bool,
    last_data: usize,
}

unsafe fn fake_connection<'a>(conn: *mut Eldbus_Connection) -> &'a mut FakeConnection {
    &mut *(conn as *mut FakeConnection)
}

pub fn new_connection() -> *mut Eldbus_Connection {
    Box::into_raw(Box::<FakeConnection>::default()).cast()
}

pub fn fail_next_send(conn: *mut Eldbus_Connection) {
    unsafe { fake_connection(conn) }.fail_next = true;
}

pub fn sent_count(conn: *mut Eldbus_Connection) -> usize {
    unsafe { fake_connection(conn) }.sent.len()
}

/// Callback data passed to the latest send attempt, failed or not.
pub fn last_send_data(conn: *mut Eldbus_Connection) -> *mut c_void {
    unsafe { fake_connection(conn) }.last_data as *mut c_void
}

/// Timeout passed to the `idx`-th successful send.
pub fn sent_timeout(conn: *mut Eldbus_Connection, idx: usize) -> f64 {
    unsafe { fake_connection(conn) }.sent[idx].timeout
}

/// Runs the callback of the `idx`-th successful send with `reply`.
pub fn deliver(conn: *mut Eldbus_Connection, idx: usize, reply: *mut Eldbus_Message) {
    let (cb, data, pending) = {
        let s = &unsafe { fake_connection(conn) }.sent[idx];
        (s.cb, s.data, s.pending)
    };
    if let Some(cb) = cb {
        unsafe { cb(data, reply, pending) };
    }
}

#[no_mangle]
pub unsafe extern "C" fn eldbus_connection_send(
    conn: *mut Eldbus_Connection,
    msg: *mut Eldbus_Message,
    cb: Option<Eldbus_Message_Cb>,
    cb_data: *const c_void,
    timeout: f64,
) -> *mut Eldbus_Pending {
    let c = fake_connection(conn);
    c.last_data = cb_data as usize;
    if std::mem::take(&mut c.fail_next) {
        return ptr::null_mut();
    }
    let method = fake_message(msg).method.to_string_lossy().into_owned();
    let pending = new_pending(&method);
    c.sent.push(Sent {
        cb,
        data: cb_data.cast_mut(),
        pending,
        timeout,
    });
    pending
}

// -------------------------
// Variadic shim replacement
// -------------------------

pub(crate) mod wire {
    use std::ffi::{c_char, c_int, c_void, CStr, CString};

    use super::{fake_iter, fake_message, push_to_iter, push_to_message, reader_over, take_failure, Value};
    use crate::sys::{Eldbus_Message, Eldbus_Message_Iter};
    use crate::wire::WireValue;

    fn value_of(v: WireValue<'_>) -> Value {
        match v {
            WireValue::Int(v) => Value::Int(i64::from(v)),
            WireValue::UInt(v) => Value::UInt(u64::from(v)),
            WireValue::Long(v) => Value::Int(v),
            WireValue::ULong(v) => Value::UInt(v),
            WireValue::Double(v) => Value::Double(v),
            WireValue::Text(s) => Value::Text(s.to_string_lossy().into_owned()),
        }
    }

    pub(crate) unsafe fn arguments_append(msg: *mut Eldbus_Message, signature: &CStr, value: WireValue<'_>) -> bool {
        if take_failure(msg as usize) {
            return false;
        }
        let sig = signature.to_string_lossy();
        let code = sig.chars().next().unwrap_or('?');
        push_to_message(fake_message(msg), code, value_of(value), &sig);
        true
    }

    pub(crate) unsafe fn iter_basic_append(iter: *mut Eldbus_Message_Iter, code: c_int, value: WireValue<'_>) -> bool {
        if take_failure(iter as usize) {
            return false;
        }
        let code = code as u8 as char;
        push_to_iter(fake_iter(iter), code, value_of(value), &code.to_string());
        true
    }

    pub(crate) unsafe fn iter_get_and_next(iter: *mut Eldbus_Message_Iter, code: c_char, out: *mut c_void) -> bool {
        let it = fake_iter(iter);
        let code = code as u8;
        let Some((item_code, value)) = it.read.get(it.pos).cloned() else {
            return false;
        };
        if item_code != code as char {
            return false;
        }
        it.pos += 1;
        match (code, value) {
            (b'a', value) => *out.cast::<*mut Eldbus_Message_Iter>() = reader_over(value),
            (b'd', Value::Double(v)) => *out.cast::<f64>() = v,
            (b's' | b'o' | b'g', Value::Text(s)) => {
                *out.cast::<*const c_char>() = CString::new(s).unwrap_or_default().into_raw()
            }
            (c, value) => {
                let Some(v) = value.as_i64() else {
                    return false;
                };
                match c {
                    b'y' => *out.cast::<u8>() = v as u8,
                    b'b' => *out.cast::<c_int>() = c_int::from(v != 0),
                    b'n' => *out.cast::<i16>() = v as i16,
                    b'q' => *out.cast::<u16>() = v as u16,
                    b'i' | b'h' => *out.cast::<i32>() = v as i32,
                    b'u' => *out.cast::<u32>() = v as u32,
                    b'x' => *out.cast::<i64>() = v,
                    b't' => *out.cast::<u64>() = v as u64,
                    _ => return false,
                }
            }
        }
        true
    }
}
