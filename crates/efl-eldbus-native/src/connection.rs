//! Sending messages over a bus connection.

use crate::bridge::{self, MessageDelegate};
use crate::error::{self, Error, Result};
use crate::message::Message;
use crate::pending::Pending;
use crate::sys;

/// A borrowed connection. The host keeps it alive and closes it.
#[derive(Debug)]
pub struct Connection {
    raw: *mut sys::Eldbus_Connection,
}

impl Connection {
    /// # Safety
    /// `raw` must be null or a connection that outlives this wrapper.
    pub unsafe fn from_raw(raw: *mut sys::Eldbus_Connection) -> Connection {
        Connection { raw }
    }

    pub fn handle(&self) -> *mut sys::Eldbus_Connection {
        self.raw
    }

    /// Sends `msg` and arranges for `delegate` to receive the reply.
    ///
    /// The message reference moves to native code: an owned message is
    /// released, a borrowed one gets a fresh reference first. `timeout` is
    /// in milliseconds; see [`crate::Timeout`].
    pub fn send<F>(&self, mut msg: Message, timeout: f64, delegate: F) -> Result<Pending>
    where
        F: FnOnce(Message, Pending) -> anyhow::Result<()> + Send + 'static,
    {
        let conn = error::live(self.raw)?;
        error::live(msg.handle())?;
        let raw_msg = if msg.owns() {
            msg.release()
        } else {
            msg.new_ref()?.release()
        };
        let boxed: MessageDelegate = Box::new(delegate);
        let token = bridge::register(boxed);
        let pending = unsafe {
            sys::eldbus_connection_send(conn, raw_msg, Some(bridge::message_cb()), token.cast_const(), timeout)
        };
        if pending.is_null() {
            bridge::unregister(token);
            tracing::error!(timeout, "eldbus_connection_send returned null");
            return Err(Error::Send);
        }
        tracing::debug!(token = token as usize, "message sent");
        Ok(unsafe { Pending::from_raw(pending) })
    }
}
