//! External media entity: the state the card reads and the commands it sends.
//!
//! Backends implement [`EntitySource`] and [`CommandSink`]. A poller task
//! publishes each reading through a `watch` channel so every sync pass sees
//! one consistent [`EntityState`].

pub mod hass;

use crate::mpris::MprisError;
use crate::timer::PlaybackSnapshot;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("MPRIS error: {0}")]
    Mpris(#[from] MprisError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Buffering,
    Idle,
    On,
    Off,
    #[default]
    Unknown,
}

impl PlaybackStatus {
    /// Map a Home Assistant state or MPRIS `PlaybackStatus` string.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            "buffering" => Self::Buffering,
            "idle" | "stopped" => Self::Idle,
            "on" => Self::On,
            "off" => Self::Off,
            _ => Self::Unknown,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Position of the current track in the entity's play queue (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePosition {
    pub index: u32,
    pub count: u32,
}

/// One reading of the external entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityState {
    pub status: PlaybackStatus,
    pub cover_url: String,
    /// `None` when the entity reports no title.
    pub title: Option<String>,
    pub artist: String,
    /// Raw timestamp-tagged lyrics text, empty when absent.
    pub lyrics: String,
    pub position: Option<f64>,
    pub position_updated_at: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    /// Music source label reported by the entity (e.g. "netease").
    pub source: Option<String>,
    pub queue: Option<QueuePosition>,
}

impl EntityState {
    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    /// Playback snapshot for clock estimation.
    ///
    /// A playing entity needs both a position and its report time to be
    /// extrapolated; without them the reading is stale and `None` is
    /// returned. A non-playing entity without a position is at 0.
    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        let playing = self.is_playing();
        match (self.position, self.position_updated_at) {
            (Some(pos), Some(at)) => Some(PlaybackSnapshot::new(pos, at, playing)),
            (Some(pos), None) if !playing => Some(PlaybackSnapshot::new(pos, Utc::now(), false)),
            (None, _) if !playing => Some(PlaybackSnapshot::new(0.0, Utc::now(), false)),
            _ => None,
        }
    }

    /// Header badge: source label and queue position, when known.
    pub fn badge(&self) -> String {
        let mut parts = Vec::new();
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            parts.push(source.to_string());
        }
        if let Some(q) = self.queue.filter(|q| q.count > 0) {
            parts.push(format!("{}/{}", q.index, q.count));
        }
        parts.join(" · ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Previous,
    Next,
    Play,
    Pause,
}

/// Reads the external entity. `Ok(None)` means the entity does not exist or
/// is unavailable.
pub trait EntitySource {
    fn fetch(&self) -> impl Future<Output = Result<Option<EntityState>, EntityError>> + Send;
}

/// Sends commands to the external entity.
pub trait CommandSink {
    fn send(&self, command: PlaybackCommand) -> impl Future<Output = Result<(), EntityError>> + Send;
}

/// Poll `source` every `interval`, publishing each reading on `tx` until a
/// shutdown message arrives or every receiver is gone.
///
/// Errors are logged and published as an absent entity, which makes the
/// sync loop keep what it last displayed.
pub async fn poll_entity<S: EntitySource>(
    source: S,
    interval: Duration,
    tx: watch::Sender<Option<EntityState>>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let reading = match source.fetch().await {
                    Ok(state) => state,
                    Err(e) => {
                        tracing::debug!(error = %e, "entity poll failed");
                        None
                    }
                };
                tx.send_if_modified(|current| {
                    if *current != reading {
                        *current = reading;
                        true
                    } else {
                        false
                    }
                });
                if tx.is_closed() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parses_status_strings() {
        assert_eq!(PlaybackStatus::parse("playing"), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::parse("Playing"), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::parse("Paused"), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::parse("Stopped"), PlaybackStatus::Idle);
        assert_eq!(PlaybackStatus::parse("weird"), PlaybackStatus::Unknown);
        assert!(!PlaybackStatus::Buffering.is_playing());
    }

    #[test]
    fn playing_without_report_time_is_stale() {
        let state = EntityState {
            status: PlaybackStatus::Playing,
            position: Some(3.0),
            ..Default::default()
        };
        assert!(state.snapshot().is_none());
    }

    #[test]
    fn paused_without_position_is_at_zero() {
        let state = EntityState {
            status: PlaybackStatus::Paused,
            ..Default::default()
        };
        let snap = state.snapshot().unwrap();
        assert_eq!(snap.position, 0.0);
        assert!(!snap.playing);
    }

    #[test]
    fn playing_snapshot_keeps_report_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let state = EntityState {
            status: PlaybackStatus::Playing,
            position: Some(12.0),
            position_updated_at: Some(at),
            ..Default::default()
        };
        assert_eq!(state.snapshot(), Some(PlaybackSnapshot::new(12.0, at, true)));
    }

    #[test]
    fn badge_combines_source_and_queue() {
        let mut state = EntityState::default();
        assert_eq!(state.badge(), "");
        state.source = Some("netease".into());
        assert_eq!(state.badge(), "netease");
        state.queue = Some(QueuePosition { index: 3, count: 12 });
        assert_eq!(state.badge(), "netease · 3/12");
    }

    #[derive(Clone)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl EntitySource for CountingSource {
        async fn fetch(&self) -> Result<Option<EntityState>, EntityError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Ok(Some(EntityState {
                    title: Some(format!("track {n}")),
                    ..Default::default()
                }))
            } else {
                Err(EntityError::Api("flaky".into()))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poller_publishes_readings_and_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(poll_entity(
            CountingSource { calls: calls.clone() },
            Duration::from_millis(100),
            tx,
            shutdown_rx,
        ));

        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().as_ref().and_then(|s| s.title.clone()),
            Some("track 0".to_string())
        );
        // The failing poll publishes an absent entity.
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());

        shutdown_tx.send(()).await.unwrap();
        task.await.unwrap();
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }
}
