//! Update loop: drives sync passes at a bounded rate while the card is
//! attached.
//!
//! A frame-rate timer only measures elapsed time; the sync pass itself runs
//! at most once per [`SYNC_INTERVAL`]. The loop handle is the only
//! cancellable resource: `detach` invalidates it before returning, so no pass
//! can run against a detached surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const SYNC_INTERVAL: Duration = Duration::from_millis(300);
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// One estimate → resolve → diff pass. Must not block.
pub trait SyncPass: Send + 'static {
    fn sync_pass(&mut self);
}

struct LoopHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

pub struct UpdateLoop<T> {
    target: Arc<Mutex<T>>,
    /// Bumped on every attach and detach; a running loop only proceeds while
    /// it still holds the current value.
    generation: Arc<AtomicU64>,
    handle: Option<LoopHandle>,
    sync_interval: Duration,
    frame_interval: Duration,
}

impl<T: SyncPass> UpdateLoop<T> {
    pub fn new(target: T) -> Self {
        Self::with_intervals(target, SYNC_INTERVAL, FRAME_INTERVAL)
    }

    pub fn with_intervals(target: T, sync_interval: Duration, frame_interval: Duration) -> Self {
        Self {
            target: Arc::new(Mutex::new(target)),
            generation: Arc::new(AtomicU64::new(0)),
            handle: None,
            sync_interval,
            frame_interval,
        }
    }

    /// Shared access to the driven value, e.g. for input handling.
    pub fn target(&self) -> Arc<Mutex<T>> {
        Arc::clone(&self.target)
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Start the loop and force an immediate pass. Returns `false` (and
    /// starts nothing) when already attached.
    pub fn attach(&mut self) -> bool {
        if self.handle.is_some() {
            return false;
        }
        let current = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.target),
            Arc::clone(&self.generation),
            current,
            self.sync_interval,
            self.frame_interval,
            shutdown_rx,
        ));
        self.handle = Some(LoopHandle { shutdown_tx, task });
        tracing::debug!(generation = current, "update loop attached");
        true
    }

    /// Stop the loop. Returns `false` when it was not running.
    pub fn detach(&mut self) -> bool {
        let detached = release(&mut self.handle, &self.generation);
        if detached {
            tracing::debug!("update loop detached");
        }
        detached
    }
}

impl<T> Drop for UpdateLoop<T> {
    fn drop(&mut self) {
        release(&mut self.handle, &self.generation);
    }
}

fn release(handle: &mut Option<LoopHandle>, generation: &AtomicU64) -> bool {
    let Some(handle) = handle.take() else {
        return false;
    };
    generation.fetch_add(1, Ordering::SeqCst);
    let _ = handle.shutdown_tx.try_send(());
    handle.task.abort();
    true
}

async fn run_loop<T: SyncPass>(
    target: Arc<Mutex<T>>,
    generation: Arc<AtomicU64>,
    current: u64,
    sync_interval: Duration,
    frame_interval: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_pass: Option<Instant> = None;
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = frames.tick() => {
                if !last_pass.is_none_or(|at| at.elapsed() >= sync_interval) {
                    continue;
                }
                let mut target = target.lock().await;
                if generation.load(Ordering::SeqCst) != current {
                    break;
                }
                target.sync_pass();
                last_pass = Some(Instant::now());
            }
        }
    }
}
