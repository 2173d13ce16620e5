//! C FFI layer for gazelink.
//!
//! Provides an opaque handle-based API for C/C++/Unity consumers.
//! The generated C header is written to `include/gazelink.h` by cbindgen.
//!
//! The gaze callback is invoked on the listener's receive thread, not on the
//! thread that registered it. Engines with main-thread-only APIs must copy
//! the values out and apply them on their own update tick.

use crate::config::ListenerConfig;
use crate::error::LastError;
use crate::listener::GazeListener;
use crate::protocol;
use crate::types::{GazeSample, ListenerState};
use std::ffi::{c_char, c_int, c_void};

/// Most recent error message, shared by every thread in the process.
static LAST_ERROR: LastError = LastError::new();

/// Opaque listener handle for C consumers.
pub struct GzListener(GazeListener);

/// C gaze callback: `(screen_x, screen_y, timestamp, user_data)`.
pub type GzGazeCallback = Option<
    unsafe extern "C" fn(screen_x: f32, screen_y: f32, timestamp: f64, user_data: *mut c_void),
>;

/// Caller-owned context pointer carried into the receive thread.
struct UserData(*mut c_void);

// The pointer is only handed back to the caller's own callback; keeping it
// valid and thread-safe is the caller's contract.
unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

/// Create a listener on `port` (0 = ephemeral), bound to all interfaces.
/// The listener is not started. Never returns NULL.
#[no_mangle]
pub extern "C" fn gz_listener_new(port: u16) -> *mut GzListener {
    let listener = GazeListener::new(ListenerConfig::with_port(port));
    Box::into_raw(Box::new(GzListener(listener)))
}

/// Register the gaze callback, replacing any previous one. Passing a NULL
/// callback clears the slot. May be called before or after start.
///
/// # Safety
/// `listener` must be a valid listener pointer, or null. `user_data` must stay
/// valid until the callback is replaced or the listener is freed.
#[no_mangle]
pub unsafe extern "C" fn gz_listener_set_callback(
    listener: *mut GzListener,
    callback: GzGazeCallback,
    user_data: *mut c_void,
) {
    if listener.is_null() {
        return;
    }
    let listener = &*listener;

    match callback {
        Some(cb) => {
            let user_data = UserData(user_data);
            listener.0.set_callback(move |sample| {
                let ctx = &user_data;
                unsafe { cb(sample.screen_x, sample.screen_y, sample.timestamp, ctx.0) };
            });
        }
        None => listener.0.clear_callback(),
    }
}

/// Start receiving. Returns 0 on success, -1 on error (check gz_last_error()).
///
/// # Safety
/// `listener` must be a valid listener pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gz_listener_start(listener: *mut GzListener) -> c_int {
    if listener.is_null() {
        return -1;
    }
    let listener = &*listener;

    match listener.0.start() {
        Ok(()) => 0,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Stop receiving. Safe to call repeatedly. No callback runs after this returns,
/// unless it is called from inside the callback itself.
///
/// # Safety
/// `listener` must be a valid listener pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gz_listener_stop(listener: *mut GzListener) {
    if !listener.is_null() {
        (*listener).0.stop();
    }
}

/// Current lifecycle state: 0 = created, 1 = running, 2 = stopped.
/// A NULL listener reports stopped.
///
/// # Safety
/// `listener` must be a valid listener pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gz_listener_state(listener: *const GzListener) -> ListenerState {
    if listener.is_null() {
        return ListenerState::Stopped;
    }
    (*listener).0.state()
}

/// Port the listener is bound to, or 0 if not started.
///
/// # Safety
/// `listener` must be a valid listener pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gz_listener_port(listener: *const GzListener) -> u16 {
    if listener.is_null() {
        return 0;
    }
    (*listener)
        .0
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(0)
}

/// Stop (if needed) and free a listener.
///
/// # Safety
/// `listener` must be a pointer returned by `gz_listener_new`, or null.
#[no_mangle]
pub unsafe extern "C" fn gz_listener_free(listener: *mut GzListener) {
    if !listener.is_null() {
        drop(Box::from_raw(listener));
    }
}

/// Decode one datagram. Returns 0 on success, -1 if the buffer is too short
/// or a pointer is NULL.
///
/// # Safety
/// `data` must point to `len` readable bytes; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn gz_decode(data: *const u8, len: usize, out: *mut GazeSample) -> c_int {
    if data.is_null() || out.is_null() {
        return -1;
    }
    let bytes = std::slice::from_raw_parts(data, len);

    match protocol::decode(bytes) {
        Ok(sample) => {
            out.write(sample);
            0
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Get the last error message. Returns NULL if no error.
/// The message is process-wide, not per thread: an error on any thread
/// replaces it. The pointer is valid until the next gazelink API call.
#[no_mangle]
pub extern "C" fn gz_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}
