use crate::capture::input::types::{Axis, AxisState, RawEvent};
use crate::capture::traits::{CaptureError, CaptureResult, InputDevice};
use crate::config::CaptureConfig;
use parking_lot::{Mutex as ParkingMutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

type CaptureThread = JoinHandle<(Box<dyn InputDevice>, CaptureResult<()>)>;

/// Latest axis readings shared between the capture thread (sole writer)
/// and any number of readers.
#[derive(Clone, Default)]
pub struct SharedAxes {
    inner: Arc<RwLock<AxisState>>,
}

impl SharedAxes {
    /// Consistent copy of every axis
    pub fn snapshot(&self) -> AxisState {
        *self.inner.read()
    }

    pub(crate) fn apply(&self, event: &RawEvent) -> Option<Axis> {
        self.inner.write().apply(event)
    }

    #[cfg(test)]
    pub(crate) fn set(&self, axis: Axis, value: f64) {
        self.inner.write().set(axis, value);
    }
}

/// Drains a blocking input device on a dedicated thread.
///
/// Known axis events update the shared [`AxisState`]; every other event is
/// queued in the overflow buffer until a consumer drains it.
pub struct InputCapture {
    device_name: String,
    device: ParkingMutex<Option<Box<dyn InputDevice>>>,
    read_timeout: Duration,
    is_running: Arc<AtomicBool>,

    axes: SharedAxes,
    overflow: Arc<ParkingMutex<Vec<RawEvent>>>,

    thread_handle: ParkingMutex<Option<CaptureThread>>,
}

impl InputCapture {
    pub fn new(device: impl InputDevice, config: &CaptureConfig) -> Self {
        Self {
            device_name: device.name().to_string(),
            device: ParkingMutex::new(Some(Box::new(device))),
            read_timeout: config.read_timeout(),
            is_running: Arc::new(AtomicBool::new(false)),
            axes: SharedAxes::default(),
            overflow: Arc::new(ParkingMutex::new(Vec::new())),
            thread_handle: ParkingMutex::new(None),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Start the capture thread
    pub fn start(&self) -> CaptureResult<()> {
        if self.is_running.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRunning);
        }

        // A previous run may have ended on its own (device error); reclaim
        // the device before starting over.
        if let Err(e) = self.reap() {
            tracing::warn!("Previous capture run on {} ended with: {}", self.device_name, e);
        }

        let device = self.device.lock().take().ok_or(CaptureError::NoDevice)?;

        let is_running = self.is_running.clone();
        is_running.store(true, Ordering::SeqCst);

        let axes = self.axes.clone();
        let overflow = self.overflow.clone();
        let read_timeout = self.read_timeout;

        let handle = std::thread::Builder::new()
            .name(format!("capture-{}", self.device_name))
            .spawn(move || run_capture_loop(device, axes, overflow, is_running, read_timeout));

        match handle {
            Ok(handle) => {
                *self.thread_handle.lock() = Some(handle);
                tracing::info!(
                    "Input capture started (device={}, read_timeout={:?})",
                    self.device_name,
                    self.read_timeout
                );
                Ok(())
            }
            Err(e) => {
                self.is_running.store(false, Ordering::SeqCst);
                Err(CaptureError::Spawn(e))
            }
        }
    }

    /// Stop the capture thread and wait for it to exit.
    ///
    /// Returns the device error that ended the loop, if any. Shutdown is
    /// cooperative: the thread notices the request after its current read
    /// returns, which takes at most one read timeout for devices that honour
    /// it.
    pub fn stop(&self) -> CaptureResult<()> {
        self.is_running.store(false, Ordering::SeqCst);
        let result = self.reap();
        tracing::info!(
            "Input capture stopped (device={}, overflow={})",
            self.device_name,
            self.overflow_len()
        );
        result
    }

    fn reap(&self) -> CaptureResult<()> {
        let Some(handle) = self.thread_handle.lock().take() else {
            return Ok(());
        };

        match handle.join() {
            Ok((device, result)) => {
                *self.device.lock() = Some(device);
                result
            }
            Err(_) => Err(CaptureError::ThreadPanicked),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Latest readings of every axis
    pub fn axes(&self) -> AxisState {
        self.axes.snapshot()
    }

    /// Handle to the live axis state, for readers on other threads
    pub fn shared_axes(&self) -> SharedAxes {
        self.axes.clone()
    }

    /// Take every queued non-axis event, oldest first
    pub fn drain_overflow(&self) -> Vec<RawEvent> {
        std::mem::take(&mut *self.overflow.lock())
    }

    pub fn overflow_len(&self) -> usize {
        self.overflow.lock().len()
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        if self.thread_handle.lock().is_some() {
            let _ = self.stop();
        }
    }
}

fn run_capture_loop(
    mut device: Box<dyn InputDevice>,
    axes: SharedAxes,
    overflow: Arc<ParkingMutex<Vec<RawEvent>>>,
    is_running: Arc<AtomicBool>,
    read_timeout: Duration,
) -> (Box<dyn InputDevice>, CaptureResult<()>) {
    tracing::debug!("Capture thread running for {}", device.name());

    let mut result = Ok(());
    while is_running.load(Ordering::SeqCst) {
        match device.read_event(read_timeout) {
            Ok(Some(event)) => {
                if axes.apply(&event).is_none() {
                    overflow.lock().push(event);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Input capture on {} failed: {}", device.name(), e);
                result = Err(CaptureError::Device(e));
                break;
            }
        }
    }

    is_running.store(false, Ordering::SeqCst);
    tracing::debug!("Capture thread for {} exited", device.name());
    (device, result)
}
