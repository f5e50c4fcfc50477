//! Human-readable companion file of a session archive

use crate::recorder::channel::{RecordingError, RecordingResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATA_SECTION: &str = "Recorded data:";

/// Shape of one recorded channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelShape {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

/// Render the description of a session whose arrays live in `archive_name`.
/// `channels` is listed in the order given.
pub fn render_description(
    archive_name: &str,
    started_at: &DateTime<Local>,
    channels: &[ChannelShape],
) -> String {
    let mut text = format!(
        "Session recording
-----------------

Start of recording: {start}

Each array in \"{archive}\" stores one data point per row.
Column 0 holds the stimulation index. It enumerates every stimulation,
including repetitions before the recording started, so it rarely starts at 0.
Column 1 holds the time in seconds since the start of the recording.
All further columns hold the values recorded for that channel.

{section}
~~~~~~~~~~~~~~

",
        start = started_at.format("%c"),
        archive = archive_name,
        section = DATA_SECTION,
    );

    for channel in channels {
        text.push_str(&format!("{}: {} x {}\n", channel.name, channel.rows, channel.cols));
    }
    text
}

pub fn write_description(
    path: &Path,
    archive_name: &str,
    started_at: &DateTime<Local>,
    channels: &[ChannelShape],
) -> RecordingResult<()> {
    std::fs::write(path, render_description(archive_name, started_at, channels))
        .map_err(RecordingError::storage(path))
}

/// Parse the channel listing of a description
pub fn parse_description(text: &str) -> RecordingResult<Vec<ChannelShape>> {
    let mut lines = text.lines().skip_while(|line| line.trim() != DATA_SECTION);
    if lines.next().is_none() {
        return Err(RecordingError::Format("description has no data section".to_string()));
    }

    lines
        .skip_while(|line| line.starts_with('~'))
        .filter(|line| !line.trim().is_empty())
        .map(parse_shape_line)
        .collect()
}

fn parse_shape_line(line: &str) -> RecordingResult<ChannelShape> {
    let invalid = || RecordingError::Format(format!("invalid channel line {:?}", line));

    let (name, shape) = line.rsplit_once(": ").ok_or_else(invalid)?;
    let (rows, cols) = shape.trim().split_once(" x ").ok_or_else(invalid)?;

    Ok(ChannelShape {
        name: name.to_string(),
        rows: rows.trim().parse().map_err(|_| invalid())?,
        cols: cols.trim().parse().map_err(|_| invalid())?,
    })
}

pub fn read_description(path: &Path) -> RecordingResult<Vec<ChannelShape>> {
    let text = std::fs::read_to_string(path).map_err(RecordingError::storage(path))?;
    parse_description(&text)
}
