//! Input capture
//!
//! This module provides the device abstraction, software devices and the
//! capture loop that turns raw device events into axis readings.

pub mod devices;
pub mod input;
pub mod traits;

pub use devices::{ChannelDevice, EventSender, ReplayDevice, ScriptedEvent};
pub use input::{Axis, AxisState, InputCapture, RawEvent, SharedAxes};
pub use traits::{CaptureError, CaptureResult, DeviceError, DeviceResult, InputDevice};
