//! Render differ: applies a [`DisplayState`] to a [`RenderSurface`] touching
//! only what changed since the last applied state.
//!
//! The sync loop runs several times per second, so every comparison here is
//! a contract with the surface: an unchanged cover, lyrics body, highlight or
//! play icon must not cause a surface call.

use crate::lyrics::LyricLine;
use crate::state::{DisplayState, LastAppliedState};

pub const NO_LYRICS_PLACEHOLDER: &str = "No lyrics";

/// The three places the cover image is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverSlot {
    /// Blurred full-card background layer.
    Background,
    /// Small cover next to the controls.
    Compact,
    /// Cover in the card header.
    Header,
}

impl CoverSlot {
    pub const ALL: [CoverSlot; 3] = [CoverSlot::Background, CoverSlot::Compact, CoverSlot::Header];
}

/// Geometry of one rendered lyric line inside the lyrics scroll container,
/// in the surface's own units (pixels, terminal rows, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub offset_top: f32,
    pub height: f32,
}

/// Whatever draws the card.
pub trait RenderSurface {
    fn set_cover(&mut self, slot: CoverSlot, url: &str);
    fn set_title(&mut self, title: &str);
    fn set_artist(&mut self, artist: &str);
    fn set_badge(&mut self, badge: &str);
    /// Drop all line elements and build a fresh list, with leading and
    /// trailing spacers of `spacer_height`.
    fn rebuild_lyrics(&mut self, lines: &[LyricLine], spacer_height: f32);
    fn show_placeholder(&mut self, message: &str);
    fn set_line_emphasis(&mut self, index: usize, emphasized: bool);
    fn line_metrics(&self, index: usize) -> Option<LineMetrics>;
    fn container_height(&self) -> f32;
    /// Scroll the lyrics container (not the page) to `offset`.
    fn scroll_lyrics_to(&mut self, offset: f32);
    fn set_play_icon(&mut self, playing: bool);
    /// Flush pending changes. Surfaces that buffer should repaint only when
    /// something was modified.
    fn present(&mut self) {}
}

/// Scroll offset that vertically centers a line in its container.
pub fn centered_scroll_offset(line: LineMetrics, container_height: f32) -> f32 {
    (line.offset_top - container_height / 2.0 + line.height / 2.0).max(0.0)
}

#[derive(Debug, Default)]
pub struct Differ {
    last: LastAppliedState,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> &LastAppliedState {
        &self.last
    }

    /// Apply `state`, issuing only the surface calls its changes require.
    pub fn apply<S: RenderSurface + ?Sized>(&mut self, state: &DisplayState, surface: &mut S) {
        if self.last.cover_changed(&state.cover_url) {
            for slot in CoverSlot::ALL {
                surface.set_cover(slot, &state.cover_url);
            }
            self.last.cover_url = Some(state.cover_url.clone());
        }

        // Text writes are cheap; surfaces compare on their side.
        surface.set_title(&state.title);
        surface.set_artist(&state.artist);
        if self.last.title_changed(&state.title) {
            self.last.title = Some(state.title.clone());
        }

        if self.last.badge_changed(&state.badge) {
            surface.set_badge(&state.badge);
            self.last.badge = Some(state.badge.clone());
        }

        if self.last.lyrics_changed(&state.lyrics) {
            if state.lyrics.is_empty() {
                surface.show_placeholder(NO_LYRICS_PLACEHOLDER);
            } else {
                let spacer = surface.container_height() / 2.0;
                surface.rebuild_lyrics(&state.lyrics.lines, spacer);
            }
            self.last.lyrics_raw = Some(state.lyrics.raw.clone());
            // Fresh elements carry no emphasis.
            self.last.highlighted = None;
        }

        let active = state
            .active_line
            .filter(|&i| i < state.lyrics.lines.len());
        if active != self.last.highlighted {
            if let Some(prev) = self.last.highlighted {
                surface.set_line_emphasis(prev, false);
            }
            if let Some(idx) = active {
                surface.set_line_emphasis(idx, true);
                if let Some(metrics) = surface.line_metrics(idx) {
                    let offset = centered_scroll_offset(metrics, surface.container_height());
                    surface.scroll_lyrics_to(offset);
                }
            }
            self.last.highlighted = active;
        }

        if self.last.playing_changed(state.playing) {
            surface.set_play_icon(state.playing);
            self.last.playing = Some(state.playing);
        }

        surface.present();
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    /// Every surface call, in order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum SurfaceOp {
        Cover(CoverSlot, String),
        Title(String),
        Artist(String),
        Badge(String),
        Rebuild(usize, f32),
        Placeholder(String),
        Emphasis(usize, bool),
        Scroll(f32),
        PlayIcon(bool),
    }

    /// Surface with fixed 20-unit lines in a 100-unit container.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub ops: Vec<SurfaceOp>,
        pub line_count: usize,
        pub spacer: f32,
    }

    pub const LINE_HEIGHT: f32 = 20.0;
    pub const CONTAINER_HEIGHT: f32 = 100.0;

    impl RecordingSurface {
        pub fn take(&mut self) -> Vec<SurfaceOp> {
            std::mem::take(&mut self.ops)
        }
    }

    impl RenderSurface for RecordingSurface {
        fn set_cover(&mut self, slot: CoverSlot, url: &str) {
            self.ops.push(SurfaceOp::Cover(slot, url.to_string()));
        }
        fn set_title(&mut self, title: &str) {
            self.ops.push(SurfaceOp::Title(title.to_string()));
        }
        fn set_artist(&mut self, artist: &str) {
            self.ops.push(SurfaceOp::Artist(artist.to_string()));
        }
        fn set_badge(&mut self, badge: &str) {
            self.ops.push(SurfaceOp::Badge(badge.to_string()));
        }
        fn rebuild_lyrics(&mut self, lines: &[LyricLine], spacer_height: f32) {
            self.line_count = lines.len();
            self.spacer = spacer_height;
            self.ops.push(SurfaceOp::Rebuild(lines.len(), spacer_height));
        }
        fn show_placeholder(&mut self, message: &str) {
            self.line_count = 0;
            self.ops.push(SurfaceOp::Placeholder(message.to_string()));
        }
        fn set_line_emphasis(&mut self, index: usize, emphasized: bool) {
            self.ops.push(SurfaceOp::Emphasis(index, emphasized));
        }
        fn line_metrics(&self, index: usize) -> Option<LineMetrics> {
            (index < self.line_count).then(|| LineMetrics {
                offset_top: self.spacer + index as f32 * LINE_HEIGHT,
                height: LINE_HEIGHT,
            })
        }
        fn container_height(&self) -> f32 {
            CONTAINER_HEIGHT
        }
        fn scroll_lyrics_to(&mut self, offset: f32) {
            self.ops.push(SurfaceOp::Scroll(offset));
        }
        fn set_play_icon(&mut self, playing: bool) {
            self.ops.push(SurfaceOp::PlayIcon(playing));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{RecordingSurface, SurfaceOp};
    use super::*;
    use crate::lyrics::LyricsDocument;
    use std::sync::Arc;

    fn state_with(raw: &str, active: Option<usize>) -> DisplayState {
        DisplayState {
            cover_url: "http://img/cover.jpg".into(),
            title: "Song".into(),
            artist: "Band".into(),
            badge: String::new(),
            lyrics: Arc::new(LyricsDocument::parse(raw)),
            active_line: active,
            playing: true,
        }
    }

    const RAW: &str = "[00:00.00]a\n[00:02.00]b\n[00:04.00]c\n[00:06.00]d";

    #[test]
    fn first_apply_draws_everything() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        differ.apply(&state_with(RAW, Some(0)), &mut surface);
        let ops = surface.take();
        for slot in CoverSlot::ALL {
            assert!(ops.contains(&SurfaceOp::Cover(slot, "http://img/cover.jpg".into())));
        }
        assert!(ops.contains(&SurfaceOp::Rebuild(4, 50.0)));
        assert!(ops.contains(&SurfaceOp::Emphasis(0, true)));
        assert!(ops.contains(&SurfaceOp::PlayIcon(true)));
        // line 0 sits right below the 50-unit spacer: 50 - 50 + 10
        assert!(ops.contains(&SurfaceOp::Scroll(10.0)));
    }

    #[test]
    fn index_only_change_touches_emphasis_and_scroll() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        differ.apply(&state_with(RAW, Some(0)), &mut surface);
        surface.take();

        differ.apply(&state_with(RAW, Some(2)), &mut surface);
        let ops: Vec<_> = surface
            .take()
            .into_iter()
            .filter(|op| !matches!(op, SurfaceOp::Title(_) | SurfaceOp::Artist(_)))
            .collect();
        assert_eq!(
            ops,
            vec![
                SurfaceOp::Emphasis(0, false),
                SurfaceOp::Emphasis(2, true),
                SurfaceOp::Scroll(50.0),
            ]
        );
    }

    #[test]
    fn unchanged_state_is_a_no_op() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        let state = state_with(RAW, Some(1));
        differ.apply(&state, &mut surface);
        surface.take();
        differ.apply(&state, &mut surface);
        let ops = surface.take();
        assert!(
            ops.iter()
                .all(|op| matches!(op, SurfaceOp::Title(_) | SurfaceOp::Artist(_))),
            "unexpected ops: {ops:?}"
        );
    }

    #[test]
    fn lyrics_rebuild_only_on_new_text() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        differ.apply(&state_with(RAW, Some(1)), &mut surface);
        surface.take();

        // Same text in a new allocation: no rebuild.
        differ.apply(&state_with(RAW, Some(1)), &mut surface);
        assert!(!surface.take().iter().any(|op| matches!(op, SurfaceOp::Rebuild(..))));

        // New text: rebuild, then highlight without clearing the discarded line.
        differ.apply(&state_with("[00:01.00]x\n[00:02.00]y", Some(1)), &mut surface);
        let ops = surface.take();
        assert!(ops.contains(&SurfaceOp::Rebuild(2, 50.0)));
        assert!(ops.contains(&SurfaceOp::Emphasis(1, true)));
        assert!(!ops.contains(&SurfaceOp::Emphasis(1, false)));
    }

    #[test]
    fn empty_lyrics_show_placeholder() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        differ.apply(&state_with("", None), &mut surface);
        let ops = surface.take();
        assert!(ops.contains(&SurfaceOp::Placeholder(NO_LYRICS_PLACEHOLDER.into())));
        assert!(!ops.iter().any(|op| matches!(op, SurfaceOp::Emphasis(..))));
        assert_eq!(differ.last_applied().highlighted, None);
    }

    #[test]
    fn play_icon_swaps_only_on_change() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        let mut state = state_with(RAW, None);
        differ.apply(&state, &mut surface);
        surface.take();

        state.playing = false;
        differ.apply(&state, &mut surface);
        assert!(surface.take().contains(&SurfaceOp::PlayIcon(false)));
        differ.apply(&state, &mut surface);
        assert!(!surface.take().iter().any(|op| matches!(op, SurfaceOp::PlayIcon(_))));
    }

    #[test]
    fn cover_updates_all_slots_on_change() {
        let mut differ = Differ::new();
        let mut surface = RecordingSurface::default();
        let mut state = state_with(RAW, None);
        differ.apply(&state, &mut surface);
        surface.take();

        state.cover_url = "http://img/other.jpg".into();
        differ.apply(&state, &mut surface);
        let covers: Vec<_> = surface
            .take()
            .into_iter()
            .filter(|op| matches!(op, SurfaceOp::Cover(..)))
            .collect();
        assert_eq!(covers.len(), 3);
    }

    #[test]
    fn scroll_offset_never_negative() {
        let m = LineMetrics {
            offset_top: 5.0,
            height: 10.0,
        };
        assert_eq!(centered_scroll_offset(m, 400.0), 0.0);
        let m = LineMetrics {
            offset_top: 300.0,
            height: 20.0,
        };
        assert_eq!(centered_scroll_offset(m, 200.0), 210.0);
    }
}
