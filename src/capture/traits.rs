//! Input device trait
//!
//! Defines the interface the capture loop reads from. Concrete devices
//! (replayed scripts, in-process channels, hardware drivers) implement
//! [`InputDevice`].

use crate::capture::input::types::RawEvent;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by an input device
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for device reads
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors that can occur while running the capture loop
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Already running")]
    AlreadyRunning,

    #[error("No device available (lost after a failed run?)")]
    NoDevice,

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Capture thread panicked")]
    ThreadPanicked,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A blocking source of raw input events.
///
/// `read_event` blocks until an event arrives or `timeout` elapses, in
/// which case it returns `Ok(None)`. The capture loop only checks its
/// stop flag between reads, so a device that ignores `timeout` can delay
/// shutdown until its next event.
pub trait InputDevice: Send + 'static {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Read the next event, waiting at most `timeout`
    fn read_event(&mut self, timeout: Duration) -> DeviceResult<Option<RawEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_spawn_failure_is_not_a_device_error() {
        let io = std::io::Error::new(std::io::ErrorKind::WouldBlock, "thread limit reached");
        let err = CaptureError::Spawn(io);

        assert!(err.to_string().starts_with("Failed to spawn thread"));
        assert!(!matches!(err, CaptureError::Device(_)));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "thread limit reached");
    }
}
