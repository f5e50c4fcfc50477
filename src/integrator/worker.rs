use crate::capture::input::reader::{InputCapture, SharedAxes};
use crate::capture::traits::{CaptureError, CaptureResult};
use crate::config::IntegratorConfig;
use crate::integrator::step::{contributions, Position, Positions};
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// State shared between the integrator thread and its consumers
struct Integration {
    axes: SharedAxes,
    config: IntegratorConfig,
    values: ParkingMutex<[f64; Position::COUNT]>,
    dirty: [AtomicBool; Position::COUNT],
}

impl Integration {
    fn tick(&self) -> usize {
        // One snapshot per tick: every axis is evaluated against the same readings
        let snapshot = self.axes.snapshot();
        let applied = contributions(&snapshot, self.config.dead_zone, self.config.policy);
        if applied.is_empty() {
            return 0;
        }

        {
            let mut values = self.values.lock();
            for c in &applied {
                values[c.position.index()] += c.delta;
            }
        }

        // Values are visible before their flags are raised
        for c in &applied {
            self.dirty[c.position.index()].store(true, Ordering::Release);
        }

        applied.len()
    }
}

/// Integrates captured axis readings into positions at a fixed rate.
///
/// Single writer (the integrator thread, or whoever calls [`tick`]), any
/// number of readers.
///
/// [`tick`]: InputIntegrator::tick
pub struct InputIntegrator {
    shared: Arc<Integration>,
    is_running: Arc<AtomicBool>,
    thread_handle: ParkingMutex<Option<JoinHandle<()>>>,
}

impl InputIntegrator {
    /// Integrate the axes published by `capture`
    pub fn new(capture: &InputCapture, config: IntegratorConfig) -> CaptureResult<Self> {
        Self::with_axes(capture.shared_axes(), config)
    }

    pub fn with_axes(axes: SharedAxes, config: IntegratorConfig) -> CaptureResult<Self> {
        config.validate().map_err(CaptureError::InvalidConfig)?;

        Ok(Self {
            shared: Arc::new(Integration {
                axes,
                config,
                values: ParkingMutex::new([0.0; Position::COUNT]),
                dirty: Default::default(),
            }),
            is_running: Arc::new(AtomicBool::new(false)),
            thread_handle: ParkingMutex::new(None),
        })
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.shared.config
    }

    /// Start the polling thread
    pub fn start(&self) -> CaptureResult<()> {
        if self.is_running.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRunning);
        }

        let is_running = self.is_running.clone();
        is_running.store(true, Ordering::SeqCst);

        let shared = self.shared.clone();
        let period = shared.config.period();

        let handle = std::thread::Builder::new()
            .name("integrator".to_string())
            .spawn(move || {
                tracing::debug!("Integrator thread running (period={:?})", period);
                while is_running.load(Ordering::SeqCst) {
                    shared.tick();
                    std::thread::sleep(period);
                }
                tracing::debug!("Integrator thread exited");
            });

        match handle {
            Ok(handle) => {
                *self.thread_handle.lock() = Some(handle);
                tracing::info!(
                    "Integrator started (rate={}Hz, dead_zone={}, policy={:?})",
                    self.shared.config.rate_hz,
                    self.shared.config.dead_zone,
                    self.shared.config.policy
                );
                Ok(())
            }
            Err(e) => {
                self.is_running.store(false, Ordering::SeqCst);
                Err(CaptureError::Spawn(e))
            }
        }
    }

    /// Stop the polling thread. Returns within about one polling period.
    pub fn stop(&self) -> CaptureResult<()> {
        self.is_running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.lock().take() {
            handle.join().map_err(|_| CaptureError::ThreadPanicked)?;
            tracing::info!("Integrator stopped");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Run one integration step on the calling thread.
    ///
    /// Returns the number of axis contributions applied. Not meant to be
    /// mixed with a running polling thread.
    pub fn tick(&self) -> usize {
        self.shared.tick()
    }

    pub fn position(&self, position: Position) -> f64 {
        self.shared.values.lock()[position.index()]
    }

    pub fn positions(&self) -> Positions {
        Positions::from(*self.shared.values.lock())
    }

    /// Whether `position` changed since the last query of this position.
    /// Clears the flag.
    pub fn has_changed(&self, position: Position) -> bool {
        self.shared.dirty[position.index()].swap(false, Ordering::AcqRel)
    }
}

impl Drop for InputIntegrator {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
