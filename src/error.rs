use crate::types::ListenerState;
use std::fmt;

/// Errors produced while decoding datagrams or driving a listener.
#[derive(Debug, thiserror::Error)]
pub enum GazeError {
    #[error("Datagram too short: {len} bytes, need at least {}", crate::protocol::RECORD_SIZE)]
    TooShort { len: usize },

    #[error("Socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot {op} listener in state {state:?}")]
    InvalidState {
        op: &'static str,
        state: ListenerState,
    },

    #[error("Subscriber callback failed: {0}")]
    CallbackFailure(String),

    #[error("Failed to spawn receive thread: {0}")]
    ThreadSpawn(String),
}

/// Process-wide, mutex-guarded last-error message for the C FFI layer.
/// Stored NUL-terminated so it can be handed out as a C string.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &GazeError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
