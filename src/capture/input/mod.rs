//! Gamepad input capture
//!
//! Runs a dedicated thread that drains a blocking [`InputDevice`] and
//! publishes the latest normalized axis readings, queueing every other
//! event (buttons, sync reports) for later consumption.
//!
//! [`InputDevice`]: crate::capture::traits::InputDevice

pub mod reader;
pub mod types;

pub use reader::{InputCapture, SharedAxes};
pub use types::{Axis, AxisState, RawEvent};
