//! In-memory stand-ins for the eina entry points this crate links against.
//!
//! Buffers and iterators are leaked on free so their addresses stay unique
//! and per-handle free counts stay meaningful for the life of the test
//! process. Failure switches are thread-local, so parallel tests don't see
//! each other's injected failures.
#![allow(clippy::missing_safety_doc)]

use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::sys::{Eina_Binbuf, Eina_Bool, Eina_Error, Eina_Iterator, Eina_Slice, EINA_FALSE, EINA_TRUE};

thread_local! {
    static FAIL_ALLOC: Cell<bool> = const { Cell::new(false) };
    static FAIL_APPEND: Cell<bool> = const { Cell::new(false) };
    static LAST_BINBUF: Cell<usize> = const { Cell::new(0) };
    static MAIN_LOOP: Cell<bool> = const { Cell::new(true) };
    static LAST_ERROR: Cell<Eina_Error> = const { Cell::new(0) };
}

static BINBUF_FREES: Lazy<Mutex<HashMap<usize, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static ITERATOR_FREES: Lazy<Mutex<HashMap<usize, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static ERRORS: Lazy<Mutex<Vec<CString>>> = Lazy::new(|| Mutex::new(Vec::new()));

fn bump(map: &Mutex<HashMap<usize, usize>>, key: usize) {
    let mut map = map.lock().unwrap_or_else(|e| e.into_inner());
    *map.entry(key).or_insert(0) += 1;
}

fn count(map: &Mutex<HashMap<usize, usize>>, key: usize) -> usize {
    let map = map.lock().unwrap_or_else(|e| e.into_inner());
    map.get(&key).copied().unwrap_or(0)
}

fn flag(b: bool) -> Eina_Bool {
    if b {
        EINA_TRUE
    } else {
        EINA_FALSE
    }
}

// -------------------------
// Controls
// -------------------------

/// The next `eina_binbuf_new` on this thread returns null.
pub fn fail_next_binbuf_alloc() {
    FAIL_ALLOC.with(|c| c.set(true));
}

/// The next binbuf mutation on this thread fails.
pub fn fail_next_binbuf_append() {
    FAIL_APPEND.with(|c| c.set(true));
}

/// The next mutation of `buf` fails.
pub fn binbuf_fail_next(buf: *mut Eina_Binbuf) {
    unsafe { fake_binbuf(buf) }.fail_next = true;
}

/// The buffer most recently allocated on this thread.
pub fn last_binbuf() -> *mut Eina_Binbuf {
    LAST_BINBUF.with(|c| c.get()) as *mut Eina_Binbuf
}

pub fn binbuf_free_count(buf: *const Eina_Binbuf) -> usize {
    count(&BINBUF_FREES, buf as usize)
}

/// Whether `eina_main_loop_is` answers true on this thread.
pub fn set_main_loop(on_loop: bool) {
    MAIN_LOOP.with(|c| c.set(on_loop));
}

pub fn registrations_of(msg: &str) -> usize {
    let errors = ERRORS.lock().unwrap_or_else(|e| e.into_inner());
    errors
        .iter()
        .filter(|m| m.to_bytes() == msg.as_bytes())
        .count()
}

pub fn iterator_over_pointers(items: Vec<*mut c_void>) -> *mut Eina_Iterator {
    Box::into_raw(Box::new(FakeIterator {
        items,
        pos: 0,
        next_calls: 0,
        locked: false,
    }))
    .cast()
}

pub fn iterator_over_values<T: Copy + 'static>(values: Vec<T>) -> *mut Eina_Iterator {
    iterator_over_pointers(
        values
            .into_iter()
            .map(|v| Box::into_raw(Box::new(v)).cast::<c_void>())
            .collect(),
    )
}

pub fn iterator_over_strings(values: &[Option<&str>]) -> *mut Eina_Iterator {
    iterator_over_pointers(
        values
            .iter()
            .map(|v| match v {
                Some(s) => CString::new(*s)
                    .unwrap_or_default()
                    .into_raw()
                    .cast::<c_void>(),
                None => std::ptr::null_mut(),
            })
            .collect(),
    )
}

pub fn iterator_next_calls(it: *mut Eina_Iterator) -> usize {
    unsafe { fake_iterator(it) }.next_calls
}

pub fn iterator_locked(it: *mut Eina_Iterator) -> bool {
    unsafe { fake_iterator(it) }.locked
}

pub fn iterator_free_count(it: *mut Eina_Iterator) -> usize {
    count(&ITERATOR_FREES, it as usize)
}

// -------------------------
// Binbuf
// -------------------------

struct FakeBinbuf {
    data: Vec<u8>,
    fail_next: bool,
}

unsafe fn fake_binbuf<'a>(buf: *const Eina_Binbuf) -> &'a mut FakeBinbuf {
    &mut *(buf as *mut FakeBinbuf)
}

fn should_fail(b: &mut FakeBinbuf) -> bool {
    let injected = FAIL_APPEND.with(|c| c.replace(false));
    std::mem::take(&mut b.fail_next) || injected
}

unsafe fn slice_bytes<'a>(slice: Eina_Slice) -> &'a [u8] {
    if slice.len == 0 || slice.mem.is_null() {
        return &[];
    }
    std::slice::from_raw_parts(slice.mem.cast::<u8>(), slice.len)
}

unsafe fn insert_at(buf: *mut Eina_Binbuf, bytes: &[u8], pos: usize) -> Eina_Bool {
    let b = fake_binbuf(buf);
    if should_fail(b) || pos > b.data.len() {
        return EINA_FALSE;
    }
    b.data.splice(pos..pos, bytes.iter().copied());
    EINA_TRUE
}

#[no_mangle]
pub extern "C" fn eina_binbuf_new() -> *mut Eina_Binbuf {
    if FAIL_ALLOC.with(|c| c.replace(false)) {
        return std::ptr::null_mut();
    }
    let raw = Box::into_raw(Box::new(FakeBinbuf {
        data: Vec::new(),
        fail_next: false,
    }))
    .cast::<Eina_Binbuf>();
    LAST_BINBUF.with(|c| c.set(raw as usize));
    raw
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_free(buf: *mut Eina_Binbuf) {
    bump(&BINBUF_FREES, buf as usize);
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_reset(buf: *mut Eina_Binbuf) {
    fake_binbuf(buf).data.clear();
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_append_length(
    buf: *mut Eina_Binbuf,
    str: *const u8,
    length: usize,
) -> Eina_Bool {
    let bytes = slice_bytes(Eina_Slice {
        len: length,
        mem: str.cast(),
    });
    let end = fake_binbuf(buf).data.len();
    insert_at(buf, bytes, end)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_append_slice(buf: *mut Eina_Binbuf, slice: Eina_Slice) -> Eina_Bool {
    let end = fake_binbuf(buf).data.len();
    insert_at(buf, slice_bytes(slice), end)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_append_buffer(
    buf: *mut Eina_Binbuf,
    data: *const Eina_Binbuf,
) -> Eina_Bool {
    if data.is_null() {
        return EINA_FALSE;
    }
    let src = fake_binbuf(data).data.clone();
    let end = fake_binbuf(buf).data.len();
    insert_at(buf, &src, end)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_append_char(buf: *mut Eina_Binbuf, c: u8) -> Eina_Bool {
    let end = fake_binbuf(buf).data.len();
    insert_at(buf, &[c], end)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_insert_length(
    buf: *mut Eina_Binbuf,
    str: *const u8,
    length: usize,
    pos: usize,
) -> Eina_Bool {
    let bytes = slice_bytes(Eina_Slice {
        len: length,
        mem: str.cast(),
    });
    insert_at(buf, bytes, pos)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_insert_slice(
    buf: *mut Eina_Binbuf,
    slice: Eina_Slice,
    pos: usize,
) -> Eina_Bool {
    insert_at(buf, slice_bytes(slice), pos)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_insert_char(buf: *mut Eina_Binbuf, c: u8, pos: usize) -> Eina_Bool {
    insert_at(buf, &[c], pos)
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_remove(buf: *mut Eina_Binbuf, start: usize, end: usize) -> Eina_Bool {
    let b = fake_binbuf(buf);
    if should_fail(b) || start > end || end > b.data.len() {
        return EINA_FALSE;
    }
    b.data.drain(start..end);
    EINA_TRUE
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_string_get(buf: *const Eina_Binbuf) -> *const u8 {
    fake_binbuf(buf).data.as_ptr()
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_string_free(buf: *mut Eina_Binbuf) {
    fake_binbuf(buf).data = Vec::new();
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_length_get(buf: *const Eina_Binbuf) -> usize {
    fake_binbuf(buf).data.len()
}

#[no_mangle]
pub unsafe extern "C" fn eina_binbuf_slice_get(buf: *const Eina_Binbuf) -> Eina_Slice {
    let b = fake_binbuf(buf);
    Eina_Slice {
        len: b.data.len(),
        mem: b.data.as_ptr().cast(),
    }
}

// -------------------------
// Iterator
// -------------------------

struct FakeIterator {
    items: Vec<*mut c_void>,
    pos: usize,
    next_calls: usize,
    locked: bool,
}

unsafe fn fake_iterator<'a>(it: *mut Eina_Iterator) -> &'a mut FakeIterator {
    &mut *(it as *mut FakeIterator)
}

#[no_mangle]
pub unsafe extern "C" fn eina_iterator_free(iterator: *mut Eina_Iterator) {
    bump(&ITERATOR_FREES, iterator as usize);
}

#[no_mangle]
pub unsafe extern "C" fn eina_iterator_container_get(iterator: *mut Eina_Iterator) -> *mut c_void {
    iterator.cast()
}

#[no_mangle]
pub unsafe extern "C" fn eina_iterator_next(iterator: *mut Eina_Iterator, data: *mut *mut c_void) -> Eina_Bool {
    let it = fake_iterator(iterator);
    it.next_calls += 1;
    let Some(item) = it.items.get(it.pos).copied() else {
        return EINA_FALSE;
    };
    it.pos += 1;
    *data = item;
    EINA_TRUE
}

#[no_mangle]
pub unsafe extern "C" fn eina_iterator_lock(iterator: *mut Eina_Iterator) -> Eina_Bool {
    fake_iterator(iterator).locked = true;
    EINA_TRUE
}

#[no_mangle]
pub unsafe extern "C" fn eina_iterator_unlock(iterator: *mut Eina_Iterator) -> Eina_Bool {
    let it = fake_iterator(iterator);
    let was_locked = std::mem::replace(&mut it.locked, false);
    flag(was_locked)
}

// -------------------------
// Error numbers and main loop
// -------------------------

#[no_mangle]
pub unsafe extern "C" fn eina_error_msg_static_register(msg: *const c_char) -> Eina_Error {
    let mut errors = ERRORS.lock().unwrap_or_else(|e| e.into_inner());
    errors.push(CStr::from_ptr(msg).to_owned());
    errors.len() as c_int
}

#[no_mangle]
pub extern "C" fn eina_error_msg_get(error: Eina_Error) -> *const c_char {
    let errors = ERRORS.lock().unwrap_or_else(|e| e.into_inner());
    let Some(idx) = (error as usize).checked_sub(1) else {
        return std::ptr::null();
    };
    match errors.get(idx) {
        Some(msg) => msg.as_ptr(),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub extern "C" fn eina_error_set(err: Eina_Error) {
    LAST_ERROR.with(|c| c.set(err));
}

#[no_mangle]
pub extern "C" fn eina_error_get() -> Eina_Error {
    LAST_ERROR.with(|c| c.get())
}

#[no_mangle]
pub extern "C" fn eina_main_loop_is() -> Eina_Bool {
    flag(MAIN_LOOP.with(|c| c.get()))
}
