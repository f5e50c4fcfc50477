//! Session recording
//!
//! Collects named, multi-rate sample channels during a session and flushes
//! them to a compressed archive plus a plain-text description when the
//! session stops.

pub mod archive;
pub mod channel;
pub mod description;
pub mod session;

pub use archive::{read_archive, write_archive, SampleTable};
pub use channel::{ChannelBuffer, RecordingError, RecordingResult};
pub use description::{read_description, ChannelShape};
pub use session::{SessionRecorder, SessionSummary};
