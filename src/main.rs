//! Replay a scripted gamepad session through the capture pipeline and
//! record the integrated positions.
//!
//! Usage: `rigrec <config.json|yaml> <events.json> [seconds]`

use anyhow::{Context, Result};
use rigrec::capture::{InputCapture, ReplayDevice};
use rigrec::config::RigConfig;
use rigrec::integrator::{InputIntegrator, Position};
use rigrec::recorder::SessionRecorder;
use std::path::Path;
use std::time::Duration;

const USAGE: &str = "usage: rigrec <config.json|yaml> <events.json> [seconds]";

/// Rate of the consumer loop reading positions and recording them
const CONSUMER_RATE_HZ: f64 = 30.0;

/// Session length from the optional seconds argument, 5 s when absent
fn parse_duration(arg: Option<&str>) -> Result<Duration> {
    let Some(arg) = arg else {
        return Ok(Duration::from_secs(5));
    };

    let seconds: f64 = arg
        .parse()
        .with_context(|| format!("Invalid duration {:?}", arg))?;
    anyhow::ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "Duration must be a non-negative number of seconds, got {}",
        seconds
    );
    Duration::try_from_secs_f64(seconds).with_context(|| format!("Duration {} is too long", seconds))
}

#[tokio::main]
async fn main() -> Result<()> {
    rigrec::logging::init("rigrec=info");

    let mut args = std::env::args().skip(1);
    let config_path = args.next().context(USAGE)?;
    let events_path = args.next().context(USAGE)?;
    let run_for = parse_duration(args.next().as_deref())?;

    let config = RigConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path))?;
    let device = ReplayDevice::load(Path::new(&events_path))
        .with_context(|| format!("Failed to load events {}", events_path))?;

    tracing::info!("Starting rigrec v{}", env!("CARGO_PKG_VERSION"));

    let capture = InputCapture::new(device, &config.capture);
    let integrator = InputIntegrator::new(&capture, config.integrator.clone())?;
    let mut recorder = SessionRecorder::new(config.recorder.clone())?;

    capture.start()?;
    integrator.start()?;
    recorder.start_recording()?;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / CONSUMER_RATE_HZ));
    let deadline = tokio::time::Instant::now() + run_for;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut sample: u64 = 0;
    while tokio::time::Instant::now() < deadline {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, closing session");
                break;
            }
        }

        for position in Position::ALL {
            if integrator.has_changed(position) {
                tracing::debug!("{} -> {:.3}", position, integrator.position(position));
            }
        }

        let positions = integrator.positions();
        recorder.record_now("stage_x_y", sample, &[[positions.x], [positions.y]])?;
        recorder.record_now("focus_z", sample, &[[positions.z]])?;

        let events = capture.drain_overflow();
        if !events.is_empty() {
            tracing::debug!("Overflow events: {}", serde_json::to_string(&events)?);
        }
        for event in events {
            tracing::info!("Device event {} = {}", event.code, event.state);
            recorder.record_now(&format!("event_{}", event.code), sample, &[[event.state as f64]])?;
        }

        sample += 1;
    }

    let summary = recorder
        .stop_recording()
        .context("Failed to write session")?;
    integrator.stop()?;
    if let Err(e) = capture.stop() {
        tracing::warn!("Capture ended with an error: {}", e);
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration(None).unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(Some("1.5")).unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(Some("0")).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_bad_values() {
        for arg in ["-1", "NaN", "inf", "1e30", "soon"] {
            assert!(parse_duration(Some(arg)).is_err(), "{:?} was accepted", arg);
        }
    }
}
