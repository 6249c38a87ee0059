//! Error types for the eldbus wrappers.

use efl_eina::{ErrorCode, LazyErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("operation on a released eldbus handle")]
    NullHandle,
    #[error("could not create eldbus message")]
    MessageNew,
    #[error("could not append basic type '{code}' to eldbus message")]
    AppendToMessage { code: char },
    #[error("could not append basic type '{code}' to eldbus message iterator")]
    AppendToIterator { code: char },
    #[error("text argument contains an interior NUL byte")]
    InteriorNul,
    #[error("'{code}' is not a container type")]
    NotAContainer { code: char },
    #[error("could not open '{code}' container")]
    ContainerOpen { code: char },
    #[error("could not close container")]
    ContainerClose,
    #[error("could not read '{code}' from eldbus message iterator")]
    Read { code: char },
    #[error("could not send eldbus message")]
    Send,
    #[error(transparent)]
    Eina(#[from] efl_eina::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

static NULL_HANDLE: LazyErrorCode = LazyErrorCode::new(c"Eldbus: null handle");

/// Reports use of a released eldbus wrapper through the native error
/// channel.
pub fn raise_null_handle() {
    tracing::warn!("eldbus wrapper used after its native handle was released");
    NULL_HANDLE.raise();
}

pub fn null_handle_error() -> ErrorCode {
    NULL_HANDLE.get()
}

/// Raises the null-handle error when `raw` is null.
pub(crate) fn live<T>(raw: *mut T) -> Result<*mut T> {
    if raw.is_null() {
        raise_null_handle();
        return Err(Error::NullHandle);
    }
    Ok(raw)
}
