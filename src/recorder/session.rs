use crate::config::{BufferPolicy, RecorderConfig};
use crate::recorder::archive::{write_archive, SampleTable};
use crate::recorder::channel::{ChannelBuffer, RecordingError, RecordingResult};
use crate::recorder::description::{write_description, ChannelShape};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// Time references of the active session, captured together
#[derive(Debug, Clone, Copy)]
struct ActiveSession {
    started_at: DateTime<Local>,
    reference: Instant,
}

/// Files written by one session flush
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub archive_path: PathBuf,
    pub description_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub channels: Vec<ChannelShape>,
}

/// Buffers named multi-rate channels during a session and writes them out
/// when the session stops.
///
/// States: idle until [`start_recording`], recording until a successful
/// [`stop_recording`]. Not internally synchronized; share it behind a lock
/// if several threads record.
///
/// [`start_recording`]: SessionRecorder::start_recording
/// [`stop_recording`]: SessionRecorder::stop_recording
pub struct SessionRecorder {
    config: RecorderConfig,
    session: Option<ActiveSession>,
    channels: BTreeMap<String, ChannelBuffer>,
}

impl SessionRecorder {
    pub fn new(config: RecorderConfig) -> RecordingResult<Self> {
        config.validate().map_err(RecordingError::InvalidConfig)?;

        Ok(Self {
            config,
            session: None,
            channels: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Begin a session. Under [`BufferPolicy::ResetOnStart`] all buffers
    /// are cleared first.
    pub fn start_recording(&mut self) -> RecordingResult<()> {
        if self.session.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        if self.config.buffer_policy == BufferPolicy::ResetOnStart {
            self.channels.clear();
        }

        let session = ActiveSession {
            started_at: Local::now(),
            reference: Instant::now(),
        };
        self.session = Some(session);

        tracing::info!(
            "Recording started at {} (base_dir={:?}, dt={}, policy={:?})",
            session.started_at.format("%H:%M:%S"),
            self.config.base_dir,
            self.config.dt,
            self.config.buffer_policy
        );
        Ok(())
    }

    /// Append one batch to `channel`.
    ///
    /// `values` holds one sequence per value column, all of the same length
    /// `n`. The batch adds `n` rows stamped `sample_time - start + i * dt`.
    /// Invalid batches are rejected before anything is buffered.
    pub fn record<V: AsRef<[f64]>>(
        &mut self,
        channel: &str,
        sample_index: u64,
        sample_time: Instant,
        values: &[V],
    ) -> RecordingResult<usize> {
        let session = self.session.ok_or(RecordingError::NotRecording)?;

        let existing = self.channels.get(channel);
        let n = ChannelBuffer::validate(channel, existing, values)?;

        let elapsed = seconds_between(session.reference, sample_time);
        let dt = self.config.dt;

        let buffer = self.channels.entry(channel.to_string()).or_insert_with(|| {
            tracing::debug!("New channel {} with {} value columns", channel, values.len());
            ChannelBuffer::new(values.len())
        });
        buffer.append(sample_index, elapsed, dt, values);

        Ok(n)
    }

    /// [`record`](Self::record) stamped with the current instant
    pub fn record_now<V: AsRef<[f64]>>(
        &mut self,
        channel: &str,
        sample_index: u64,
        values: &[V],
    ) -> RecordingResult<usize> {
        self.record(channel, sample_index, Instant::now(), values)
    }

    /// End the session and write its archive and description.
    ///
    /// Files are named after the session's start time, so two sessions
    /// started within the same second in the same directory overwrite each
    /// other. On failure the session stays active with its buffers intact.
    pub fn stop_recording(&mut self) -> RecordingResult<SessionSummary> {
        let session = self.session.ok_or(RecordingError::NotRecording)?;

        let base_dir = &self.config.base_dir;
        std::fs::create_dir_all(base_dir).map_err(RecordingError::storage(base_dir))?;

        let basename = format!("recording_{}", session.started_at.format("%H:%M:%S"));
        let archive_name = format!("{}.npz", basename);
        let archive_path = base_dir.join(&archive_name);
        let description_path = base_dir.join(format!("{}_info.txt", basename));

        let tables: BTreeMap<String, SampleTable> = self
            .channels
            .iter()
            .map(|(name, buffer)| (name.clone(), buffer.to_table()))
            .collect();
        let channels: Vec<ChannelShape> = tables
            .iter()
            .map(|(name, table)| ChannelShape {
                name: name.clone(),
                rows: table.rows(),
                cols: table.cols(),
            })
            .collect();

        write_archive(&archive_path, &tables)?;
        write_description(&description_path, &archive_name, &session.started_at, &channels)?;

        self.session = None;

        tracing::info!(
            "Recording stopped: {} channels written to {:?}",
            channels.len(),
            archive_path
        );

        Ok(SessionSummary {
            archive_path,
            description_path,
            started_at: session.started_at,
            channels,
        })
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Monotonic reference of the active session
    pub fn session_start(&self) -> Option<Instant> {
        self.session.map(|s| s.reference)
    }

    /// Wall-clock start of the active session
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.session.map(|s| s.started_at)
    }

    /// Buffered channel names, sorted
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    /// Number of buffered time points of a channel
    pub fn channel_len(&self, channel: &str) -> Option<usize> {
        self.channels.get(channel).map(ChannelBuffer::len)
    }

    /// One buffered column of a channel: 0 = index, 1 = elapsed seconds,
    /// 2.. = values
    pub fn channel_column(&self, channel: &str, column: usize) -> Option<&[f64]> {
        self.channels.get(channel).and_then(|b| b.column(column))
    }
}

/// Signed seconds from `reference` to `t`
fn seconds_between(reference: Instant, t: Instant) -> f64 {
    match t.checked_duration_since(reference) {
        Some(after) => after.as_secs_f64(),
        None => -(reference - t).as_secs_f64(),
    }
}
