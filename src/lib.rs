//! # gazelink - UDP receiver for binary gaze-tracking samples
//!
//! A gaze tracker (or the bridge in front of it) emits one fixed-layout,
//! little-endian datagram per sample. This crate provides:
//! - A pure decoder/encoder for the 24-byte wire record
//! - A single-thread listener that decodes datagrams and hands each sample
//!   to one registered subscriber with minimal latency
//! - A small sender for producing the same stream
//! - C FFI for integration with C/C++/Unity
//!
//! ## Quick Start
//! ```no_run
//! use gazelink::{GazeListener, ListenerConfig};
//!
//! let listener = GazeListener::new(ListenerConfig::default());
//! listener.set_callback(|sample| {
//!     println!("screen=({}, {}) t={}", sample.screen_x, sample.screen_y, sample.timestamp);
//! });
//! listener.start().unwrap();
//! // ...
//! listener.stop();
//! ```
//!
//! The subscriber runs on the listener's receive thread. Consumers that need
//! to touch UI state from a specific thread should marshal the sample there
//! themselves, or use [`GazeListener::subscribe_channel`].

pub mod config;
pub mod error;
pub mod ffi;
pub mod listener;
pub mod protocol;
pub mod sender;
pub mod types;

pub use config::ListenerConfig;
pub use error::GazeError;
pub use listener::{GazeListener, ListenerStats};
pub use protocol::{decode, encode};
pub use sender::GazeSender;
pub use types::*;

/// Result type alias for gazelink operations.
pub type Result<T> = std::result::Result<T, GazeError>;
