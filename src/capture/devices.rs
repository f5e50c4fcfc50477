//! Software input devices
//!
//! [`ChannelDevice`] is fed from another thread through an [`EventSender`];
//! [`ReplayDevice`] plays back a timed event script. Both honour the read
//! timeout, so captures built on them stop promptly.

use crate::capture::input::types::RawEvent;
use crate::capture::traits::{DeviceError, DeviceResult, InputDevice};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Device backed by an in-process channel
pub struct ChannelDevice {
    name: String,
    receiver: mpsc::Receiver<RawEvent>,
}

/// Sending half of a [`ChannelDevice`]. Dropping every sender disconnects
/// the device.
#[derive(Clone)]
pub struct EventSender {
    sender: mpsc::Sender<RawEvent>,
}

impl EventSender {
    /// Push an event to the device. Returns false if the device is gone.
    pub fn send(&self, event: RawEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

impl ChannelDevice {
    pub fn new(name: impl Into<String>) -> (Self, EventSender) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                name: name.into(),
                receiver,
            },
            EventSender { sender },
        )
    }
}

impl InputDevice for ChannelDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_event(&mut self, timeout: Duration) -> DeviceResult<Option<RawEvent>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(DeviceError::Disconnected(self.name.clone()))
            }
        }
    }
}

/// One entry of a replay script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedEvent {
    /// Delay after the previous event (or after the first read)
    #[serde(default)]
    pub delay_ms: u64,
    pub code: String,
    pub state: i32,
}

/// Device that replays a scripted sequence of events in real time
pub struct ReplayDevice {
    name: String,
    events: VecDeque<ScriptedEvent>,
    next_due: Option<Instant>,
    disconnect_at_end: bool,
}

impl ReplayDevice {
    pub fn from_events(name: impl Into<String>, events: Vec<ScriptedEvent>) -> Self {
        Self {
            name: name.into(),
            events: events.into(),
            next_due: None,
            disconnect_at_end: false,
        }
    }

    /// Load a script from a JSON array of `{ delayMs, code, state }`
    pub fn load(path: &Path) -> DeviceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let events: Vec<ScriptedEvent> = serde_json::from_str(&content)
            .map_err(|e| DeviceError::Read(format!("Failed to parse {}: {}", path.display(), e)))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "replay".to_string());

        tracing::info!("Loaded replay script {:?} ({} events)", path, events.len());
        Ok(Self::from_events(name, events))
    }

    /// Report a disconnection once the script is exhausted instead of
    /// idling forever.
    pub fn disconnect_at_end(mut self, disconnect: bool) -> Self {
        self.disconnect_at_end = disconnect;
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputDevice for ReplayDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_event(&mut self, timeout: Duration) -> DeviceResult<Option<RawEvent>> {
        let Some(delay_ms) = self.events.front().map(|e| e.delay_ms) else {
            if self.disconnect_at_end {
                return Err(DeviceError::Disconnected(self.name.clone()));
            }
            std::thread::sleep(timeout);
            return Ok(None);
        };

        let due = *self
            .next_due
            .get_or_insert_with(|| Instant::now() + Duration::from_millis(delay_ms));

        let now = Instant::now();
        if due > now {
            let wait = due - now;
            if wait > timeout {
                std::thread::sleep(timeout);
                return Ok(None);
            }
            std::thread::sleep(wait);
        }

        self.next_due = None;
        Ok(self
            .events
            .pop_front()
            .map(|e| RawEvent::new(e.code, e.state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(delay_ms: u64, code: &str, state: i32) -> ScriptedEvent {
        ScriptedEvent {
            delay_ms,
            code: code.to_string(),
            state,
        }
    }

    #[test]
    fn test_channel_device_delivers_in_order() {
        let (mut device, sender) = ChannelDevice::new("pad");
        assert!(sender.send(RawEvent::new("ABS_X", 1)));
        assert!(sender.send(RawEvent::new("ABS_Y", 2)));

        let timeout = Duration::from_millis(10);
        assert_eq!(device.read_event(timeout).unwrap(), Some(RawEvent::new("ABS_X", 1)));
        assert_eq!(device.read_event(timeout).unwrap(), Some(RawEvent::new("ABS_Y", 2)));
        assert_eq!(device.read_event(timeout).unwrap(), None);
    }

    #[test]
    fn test_channel_device_disconnects_when_senders_dropped() {
        let (mut device, sender) = ChannelDevice::new("pad");
        drop(sender);
        let result = device.read_event(Duration::from_millis(10));
        assert!(matches!(result, Err(DeviceError::Disconnected(name)) if name == "pad"));
    }

    #[test]
    fn test_replay_waits_for_delay() {
        let mut device = ReplayDevice::from_events("script", vec![scripted(50, "ABS_X", 7)]);

        // Timeout shorter than the delay: nothing yet
        assert_eq!(device.read_event(Duration::from_millis(5)).unwrap(), None);
        assert_eq!(device.remaining(), 1);

        let event = device.read_event(Duration::from_millis(200)).unwrap();
        assert_eq!(event, Some(RawEvent::new("ABS_X", 7)));
        assert_eq!(device.remaining(), 0);
    }

    #[test]
    fn test_replay_end_behaviour() {
        let mut idle = ReplayDevice::from_events("idle", vec![]);
        assert_eq!(idle.read_event(Duration::from_millis(1)).unwrap(), None);

        let mut closing = ReplayDevice::from_events("closing", vec![]).disconnect_at_end(true);
        assert!(matches!(
            closing.read_event(Duration::from_millis(1)),
            Err(DeviceError::Disconnected(_))
        ));
    }

    #[test]
    fn test_replay_load_from_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("moves.json");
        std::fs::write(
            &path,
            r#"[{"delayMs": 0, "code": "ABS_HAT0X", "state": 1}, {"code": "BTN_SOUTH", "state": 1}]"#,
        )
        .unwrap();

        let mut device = ReplayDevice::load(&path).unwrap();
        assert_eq!(device.name(), "moves");
        assert_eq!(device.remaining(), 2);
        let first = device.read_event(Duration::from_millis(50)).unwrap();
        assert_eq!(first, Some(RawEvent::new("ABS_HAT0X", 1)));
    }

    #[test]
    fn test_replay_load_rejects_bad_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(ReplayDevice::load(&path), Err(DeviceError::Read(_))));
    }
}
