//! Eldbus message marshaling and asynchronous reply delivery.
//!
//! Basic values are a closed set ([`BasicArgument`]) that append
//! themselves to a [`Message`] or at a [`MessageIterator`] position. Replies
//! come back through one process-wide trampoline ([`bridge`]) that routes
//! them to the closure given to [`Connection::send`].

pub mod argument;
pub mod bridge;
pub mod connection;
pub mod error;
pub mod message;
pub mod pending;
pub mod sys;

mod wire;

#[cfg(test)]
mod fake;

pub use argument::{ArgumentType, BasicArgument, ObjectPath, SignatureString, Timeout, UnixFd};
pub use bridge::{Dispatch, MessageDelegate};
pub use connection::Connection;
pub use error::{Error, Result};
pub use message::{Message, MessageError, MessageIterator};
pub use pending::Pending;
