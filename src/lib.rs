//! rigrec - gamepad-driven rig control and session telemetry recording.
//!
//! A capture thread drains a blocking input device and publishes the latest
//! axis readings; an integrator thread turns those readings into positions
//! at a fixed rate; a session recorder buffers named sample channels and
//! writes them to a compressed archive with a plain-text description.

pub mod capture;
pub mod config;
pub mod data;
pub mod integrator;
pub mod logging;
pub mod recorder;

pub use capture::{InputCapture, InputDevice, RawEvent};
pub use config::{AxisPolicy, BufferPolicy, RigConfig};
pub use integrator::{InputIntegrator, Position};
pub use recorder::{SessionRecorder, SessionSummary};
