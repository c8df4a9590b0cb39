// state.rs: Derived display state and the record of what is on screen

use crate::lyrics::{LyricLine, LyricsDocument};
use std::sync::Arc;

/// Title shown when the entity does not report one.
pub const NOT_PLAYING_TITLE: &str = "Not playing";

/// Index of the line active at `position`: the greatest `i` with
/// `lines[i].time <= position`, or `None` before the first cue.
///
/// `lines` must be sorted by time. Lines sharing a timestamp resolve to the
/// last of them.
pub fn resolve_active_line(lines: &[LyricLine], position: f64) -> Option<usize> {
    if position.is_nan() {
        return None;
    }
    let after = lines.partition_point(|line| line.time <= position);
    after.checked_sub(1)
}

/// Everything the card shows for one tick, computed before anything is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub cover_url: String,
    pub title: String,
    pub artist: String,
    /// Source label and queue position, e.g. "netease · 3/12".
    pub badge: String,
    pub lyrics: Arc<LyricsDocument>,
    pub active_line: Option<usize>,
    pub playing: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            cover_url: String::new(),
            title: NOT_PLAYING_TITLE.to_string(),
            artist: String::new(),
            badge: String::new(),
            lyrics: LyricsDocument::empty(),
            active_line: None,
            playing: false,
        }
    }
}

/// What the render surface currently shows. `None` fields have never been
/// applied, so the first comparison against them always reports a change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastAppliedState {
    pub cover_url: Option<String>,
    pub title: Option<String>,
    pub badge: Option<String>,
    pub lyrics_raw: Option<String>,
    pub highlighted: Option<usize>,
    pub playing: Option<bool>,
}

impl LastAppliedState {
    pub fn cover_changed(&self, url: &str) -> bool {
        self.cover_url.as_deref() != Some(url)
    }

    pub fn title_changed(&self, title: &str) -> bool {
        self.title.as_deref() != Some(title)
    }

    pub fn badge_changed(&self, badge: &str) -> bool {
        self.badge.as_deref() != Some(badge)
    }

    pub fn lyrics_changed(&self, doc: &LyricsDocument) -> bool {
        self.lyrics_raw.as_deref() != Some(doc.raw.as_str())
    }

    pub fn playing_changed(&self, playing: bool) -> bool {
        self.playing != Some(playing)
    }
}
