use chrono::{DateTime, Utc};

/// Last authoritative playback reading from the external entity.
///
/// Snapshots are replaced wholesale on every entity update; the estimate is
/// always extrapolated from the latest one, never integrated across several.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    /// Position in seconds at `reported_at`.
    pub position: f64,
    pub reported_at: DateTime<Utc>,
    pub playing: bool,
}

impl PlaybackSnapshot {
    pub fn new(position: f64, reported_at: DateTime<Utc>, playing: bool) -> Self {
        Self {
            position: sanitize_position(position),
            reported_at,
            playing,
        }
    }

    /// Estimated playback position at `now`, in seconds.
    pub fn estimate(&self, now: DateTime<Utc>) -> f64 {
        estimate(self, now)
    }
}

/// Extrapolate the current playback position from `snapshot`.
///
/// A paused or stopped entity keeps its reported position. A playing one
/// advances by the wall-clock time since the report. The result is never
/// negative; track end is not detected here.
pub fn estimate(snapshot: &PlaybackSnapshot, now: DateTime<Utc>) -> f64 {
    let base = sanitize_position(snapshot.position);
    if !snapshot.playing {
        return base;
    }
    // Negative when `now` precedes the report (clock skew); clamped below.
    let elapsed = (now - snapshot.reported_at)
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or(0.0);
    let val = base + elapsed;
    if !val.is_finite() {
        return base;
    }
    val.max(0.0)
}

/// Non-finite or negative readings count as track start.
pub fn sanitize_position(p: f64) -> f64 {
    if p.is_finite() && p > 0.0 { p } else { 0.0 }
}
