//! Finalizer-path frees.
//!
//! A wrapper dropped without an explicit dispose may be dropped on any
//! thread. Native frees must run on the main loop thread, so drops from
//! elsewhere are queued here until the host calls [`flush`] from its loop.
//!
//! Nothing drains the queue on its own. A host either calls [`flush`] once
//! per loop iteration or installs [`flush_task`] as a repeating idler or
//! timer callback. `EFL_NATIVE_DEFER_WARN` sets the queue length at which a
//! warning is logged.

use std::ffi::c_void;
use std::panic;
use std::sync::Mutex;

use once_cell::sync::OnceCell;

use crate::config::config;
use crate::sys;

pub type FreeFn = unsafe fn(*mut c_void);

struct PendingFree {
    raw: usize,
    free: FreeFn,
}

static QUEUE: OnceCell<Mutex<Vec<PendingFree>>> = OnceCell::new();

fn queue() -> &'static Mutex<Vec<PendingFree>> {
    QUEUE.get_or_init(|| Mutex::new(Vec::new()))
}

pub fn on_main_loop() -> bool {
    unsafe { sys::eina_main_loop_is() != sys::EINA_FALSE }
}

/// Frees `raw` now if that is safe from this thread, otherwise queues it.
///
/// # Safety
/// `raw` must be a live handle that `free` accepts, and nothing else may
/// free it.
pub unsafe fn schedule(raw: *mut c_void, free: FreeFn) {
    if raw.is_null() {
        return;
    }
    if !config().defer_all && on_main_loop() {
        free(raw);
        return;
    }
    let mut q = queue().lock().unwrap_or_else(|e| e.into_inner());
    q.push(PendingFree {
        raw: raw as usize,
        free,
    });
    let len = q.len();
    if len == config().defer_warn as usize {
        tracing::warn!(len, "deferred native free queue is growing; is flush() being called?");
    }
}

/// Runs every queued free. Must be called from the main loop thread; from
/// any other thread nothing runs and 0 is returned.
pub fn flush() -> usize {
    if !on_main_loop() {
        tracing::warn!("deferred::flush called off the main loop thread; ignoring");
        return 0;
    }
    let batch = {
        let mut q = queue().lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *q)
    };
    let n = batch.len();
    for p in batch {
        unsafe { (p.free)(p.raw as *mut c_void) }
    }
    if n != 0 {
        tracing::debug!(n, "flushed deferred native frees");
    }
    n
}

/// Number of frees waiting for [`flush`].
pub fn pending() -> usize {
    queue().lock().unwrap_or_else(|e| e.into_inner()).len()
}

/// Loop callback that runs [`flush`]. Matches the `Eina_Bool (*)(void *)`
/// shape of ecore idlers and timers and always asks to be called again.
///
/// # Safety
/// Must only be registered with the main loop. `data` is ignored.
pub unsafe extern "C" fn flush_task(_data: *mut c_void) -> sys::Eina_Bool {
    if panic::catch_unwind(flush).is_err() {
        tracing::error!("panic while flushing deferred native frees");
    }
    sys::EINA_TRUE
}
