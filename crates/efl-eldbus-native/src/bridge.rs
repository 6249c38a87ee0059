//! Delivery of asynchronous replies from native code to Rust closures.
//!
//! Native code gets one process-wide trampoline plus an opaque token per
//! call. The token names a boxed delegate in a process-wide table; the
//! trampoline looks it up, removes it and runs it. Nothing unwinds back
//! into native code.

use std::collections::HashMap;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::message::Message;
use crate::pending::Pending;
use crate::sys;

pub use crate::error::{null_handle_error, raise_null_handle};

/// Receives the reply (or error reply) to one sent message.
pub type MessageDelegate = Box<dyn FnOnce(Message, Pending) -> anyhow::Result<()> + Send>;

/// What `dispatch` did with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Delivered,
    UnknownDelegate,
    BadHandles,
    DelegateFailed,
    DelegatePanicked,
}

static DELEGATES: OnceCell<Mutex<HashMap<usize, MessageDelegate>>> = OnceCell::new();
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);
static MESSAGE_CB: OnceCell<sys::Eldbus_Message_Cb> = OnceCell::new();

fn delegates() -> MutexGuard<'static, HashMap<usize, MessageDelegate>> {
    DELEGATES
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Stores `delegate` and returns the token to hand to native code as the
/// callback data pointer. Tokens are never zero.
pub fn register(delegate: MessageDelegate) -> *mut c_void {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    delegates().insert(token, delegate);
    token as *mut c_void
}

pub fn unregister(data: *mut c_void) -> bool {
    delegates().remove(&(data as usize)).is_some()
}

pub fn is_registered(data: *mut c_void) -> bool {
    delegates().contains_key(&(data as usize))
}

/// Number of delegates still waiting for a reply.
pub fn registered() -> usize {
    delegates().len()
}

/// The native-callable reply callback. Every call returns the same
/// function pointer.
pub fn message_cb() -> sys::Eldbus_Message_Cb {
    *MESSAGE_CB.get_or_init(|| {
        tracing::debug!("eldbus reply trampoline initialized");
        message_cb_trampoline as sys::Eldbus_Message_Cb
    })
}

unsafe extern "C" fn message_cb_trampoline(
    data: *mut c_void,
    msg: *const sys::Eldbus_Message,
    pending: *mut sys::Eldbus_Pending,
) {
    if panic::catch_unwind(AssertUnwindSafe(|| dispatch(data, msg, pending))).is_err() {
        tracing::error!("panic while dispatching eldbus reply");
    }
}

/// Routes one reply to the delegate `data` names.
///
/// # Safety
/// `msg` and `pending` must be null or handles that stay valid for the
/// duration of the call.
pub unsafe fn dispatch(
    data: *mut c_void,
    msg: *const sys::Eldbus_Message,
    pending: *mut sys::Eldbus_Pending,
) -> Dispatch {
    let token = data as usize;
    let delegate = if token == 0 {
        None
    } else {
        delegates().remove(&token)
    };
    let Some(delegate) = delegate else {
        tracing::error!(token, "eldbus reply for an unknown delegate");
        return Dispatch::UnknownDelegate;
    };

    if msg.is_null() || pending.is_null() {
        tracing::error!(token, ?msg, ?pending, "eldbus reply with a null handle");
        return Dispatch::BadHandles;
    }
    let reply = Message::from_raw(msg.cast_mut(), false);
    let pending = Pending::from_raw(pending);

    match panic::catch_unwind(AssertUnwindSafe(move || delegate(reply, pending))) {
        Ok(Ok(())) => Dispatch::Delivered,
        Ok(Err(err)) => {
            tracing::error!(token, error = %format!("{err:#}"), "eldbus reply delegate failed");
            Dispatch::DelegateFailed
        }
        Err(_) => {
            tracing::error!(token, "eldbus reply delegate panicked");
            Dispatch::DelegatePanicked
        }
    }
}
