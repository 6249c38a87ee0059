//! Ownership-tracking wrappers over eina's native buffer and iterator
//! handles.
//!
//! Every wrapper carries an ownership flag. Owned handles are freed exactly
//! once: immediately on `dispose()`, or through [`deferred`] when the
//! wrapper is dropped.
//!
//! # Host integration
//!
//! A wrapper dropped off the main loop thread, or any drop while
//! `EFL_NATIVE_DEFER_ALL` is set, only queues its free. The host must drain
//! that queue from the main loop, either by calling [`deferred::flush`]
//! each iteration or by registering [`deferred::flush_task`] as a repeating
//! idler or timer. Without one of these, queued handles are never freed.

pub mod binbuf;
pub mod config;
pub mod deferred;
pub mod error;
pub mod handle;
pub mod iterator;
pub mod log;
pub mod slice;
pub mod sys;

#[cfg(any(test, feature = "fake-native"))]
pub mod fake;

pub use binbuf::{Binbuf, BinbufRef};
pub use error::{Error, ErrorCode, LazyErrorCode, Result};
pub use handle::{NativeFree, OwnedHandle};
pub use iterator::{EinaIterator, FromNative};
pub use slice::Slice;
