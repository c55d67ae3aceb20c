//! Device backed by a transfer worker thread.
//!
//! Each `write_bytes` copies the scanlines into a staging buffer and hands
//! it to the worker, which plays the part of the DMA engine: it spends the
//! configured wire time, then appends the bytes to the frame being
//! assembled. Completed frames are published through [`PresentedFrame`].
//!
//! Only one transfer is ever in flight. Staging buffers come back on a
//! second channel and are reused, so steady-state transfers don't
//! allocate.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use super::Device;
use crate::config::{DisplayConfig, BYTES_PER_PIXEL};
use crate::error::DeviceError;

#[derive(Debug, Default)]
struct Presented {
    pixels: Vec<u8>,
    frames: u64,
}

/// Shared view of the last frame the worker finished.
#[derive(Debug, Clone, Default)]
pub struct PresentedFrame {
    inner: Arc<Mutex<Presented>>,
}

impl PresentedFrame {
    /// Number of frames completed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.lock().frames
    }

    /// Copies out the last completed frame.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.lock().pixels.clone()
    }

    /// Runs `f` on the last completed frame without copying it.
    pub fn with_pixels<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.inner.lock().pixels)
    }
}

/// Asynchronous device driven by a worker thread.
pub struct ThreadedDevice {
    frame_bytes: usize,
    transfer_time: Duration,
    to_worker: Option<Sender<Vec<u8>>>,
    from_worker: Option<Receiver<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
    spare: Option<Vec<u8>>,
    in_flight: bool,
    presented: PresentedFrame,
}

impl ThreadedDevice {
    /// Creates a device for a `width` x `height` screen. The worker starts
    /// in [`Device::init`].
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame_bytes: width * height * BYTES_PER_PIXEL,
            transfer_time: Duration::ZERO,
            to_worker: None,
            from_worker: None,
            worker: None,
            spare: None,
            in_flight: false,
            presented: PresentedFrame::default(),
        }
    }

    /// Creates a device matching a display configuration.
    #[must_use]
    pub fn for_display(config: &DisplayConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Makes every transfer take at least `time` on the worker.
    #[must_use]
    pub fn with_transfer_time(mut self, time: Duration) -> Self {
        self.transfer_time = time;
        self
    }

    /// Returns a handle to the presented frame.
    #[must_use]
    pub fn presented(&self) -> PresentedFrame {
        self.presented.clone()
    }

    fn recycle(&mut self, buffer: Vec<u8>) {
        self.spare = Some(buffer);
        self.in_flight = false;
    }
}

fn run_worker(
    jobs: &Receiver<Vec<u8>>,
    done: &Sender<Vec<u8>>,
    presented: &PresentedFrame,
    frame_bytes: usize,
    transfer_time: Duration,
) {
    let mut assembling = Vec::with_capacity(frame_bytes);
    while let Ok(buffer) = jobs.recv() {
        if !transfer_time.is_zero() {
            std::thread::sleep(transfer_time);
        }
        assembling.extend_from_slice(&buffer);
        if assembling.len() >= frame_bytes {
            let mut shared = presented.inner.lock();
            std::mem::swap(&mut shared.pixels, &mut assembling);
            shared.frames += 1;
            assembling.clear();
        }
        if done.send(buffer).is_err() {
            break;
        }
    }
    tracing::debug!("transfer worker stopped");
}

impl Device for ThreadedDevice {
    fn init(&mut self) -> Result<(), DeviceError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let (job_tx, job_rx) = bounded::<Vec<u8>>(1);
        let (done_tx, done_rx) = bounded::<Vec<u8>>(1);
        let presented = self.presented.clone();
        let frame_bytes = self.frame_bytes;
        let transfer_time = self.transfer_time;

        let worker = std::thread::Builder::new()
            .name("tessera-dma".into())
            .spawn(move || run_worker(&job_rx, &done_tx, &presented, frame_bytes, transfer_time))
            .map_err(|e| DeviceError::Init(e.to_string()))?;

        self.to_worker = Some(job_tx);
        self.from_worker = Some(done_rx);
        self.worker = Some(worker);
        tracing::debug!(frame_bytes, "transfer worker started");
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) {
        self.wait_for_completion();

        let mut buffer = self.spare.take().unwrap_or_default();
        buffer.clear();
        buffer.extend_from_slice(data);

        let sent = self
            .to_worker
            .as_ref()
            .is_some_and(|tx| tx.send(buffer).is_ok());
        if sent {
            self.in_flight = true;
        } else {
            tracing::warn!(bytes = data.len(), "transfer dropped, device not running");
        }
    }

    fn is_busy(&mut self) -> bool {
        if !self.in_flight {
            return false;
        }
        let Some(rx) = &self.from_worker else {
            return false;
        };
        match rx.try_recv() {
            Ok(buffer) => {
                self.recycle(buffer);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                false
            }
        }
    }

    fn wait_for_completion(&mut self) {
        if !self.in_flight {
            return;
        }
        let received = self.from_worker.as_ref().map(Receiver::recv);
        match received {
            Some(Ok(buffer)) => self.recycle(buffer),
            _ => self.in_flight = false,
        }
    }
}

impl Drop for ThreadedDevice {
    fn drop(&mut self) {
        self.wait_for_completion();
        // closing the job channel ends the worker loop
        self.to_worker = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("transfer worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for ThreadedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedDevice")
            .field("frame_bytes", &self.frame_bytes)
            .field("transfer_time", &self.transfer_time)
            .field("running", &self.worker.is_some())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
