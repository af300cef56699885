//! Background sensor sampling.
//!
//! Spawns a thread that owns the `WidthSensor`, pushes the latest raw sample
//! via a bounded channel, and tracks the last-ok timestamp for stall
//! diagnostics. The thread is shut down when the `Sampler` is dropped.

use crossbeam_channel as xch;
use filawidth_traits::WidthSensor;
use filawidth_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct Sampler {
    rx: xch::Receiver<f64>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

/// Sampling period for a report rate in Hz, clamped to at least 1 Hz.
#[inline]
pub fn period_for_hz(hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(hz.max(1)))
}

impl Sampler {
    /// Rate-paced sampling at `hz` (the ADC report cadence).
    pub fn spawn<S: WidthSensor + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut sensor: S,
        hz: u32,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_writer = last_ok.clone();
        let period = period_for_hz(hz);
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                match sensor.read(timeout) {
                    Ok(sample) => {
                        // If send fails, the consumer is gone; exit gracefully.
                        if tx.send(sample).is_err() {
                            tracing::debug!("sampler consumer disconnected, exiting thread");
                            break;
                        }
                        last_ok_writer.store(clock.ms_since(epoch), Ordering::Relaxed);
                    }
                    Err(e) => {
                        // Skip the sample; the host decides what a stall means.
                        tracing::trace!(error = %e, "sensor read failed");
                    }
                }

                if shutdown_flag.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Most recent sample, discarding anything older.
    pub fn latest(&self) -> Option<f64> {
        self.rx.try_iter().last()
    }

    /// Milliseconds since the last successful read, given `now_ms` relative
    /// to this sampler's epoch.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Convenience variant of `stalled_for` using a real monotonic clock.
    pub fn stalled_for_now(&self) -> u64 {
        let now_ms = {
            let dur = Instant::now().saturating_duration_since(self.epoch);
            (dur.as_millis().min(u128::from(u64::MAX))) as u64
        };
        self.stalled_for(now_ms)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread exits between reads or after the in-flight read returns
        // (bounded by the sensor timeout).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sampler thread joined"),
                Err(e) => tracing::warn!(?e, "sampler thread panicked during shutdown"),
            }
        }
    }
}
