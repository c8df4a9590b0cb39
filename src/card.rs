// card.rs: The lyrics card engine, one synchronization pass at a time

use crate::config::{CardConfig, ConfigError};
use crate::entity::EntityState;
use crate::lyrics::{LyricsDocument, format_lrc};
use crate::render::{Differ, RenderSurface};
use crate::scheduler::SyncPass;
use crate::state::{DisplayState, NOT_PLAYING_TITLE, resolve_active_line};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// Nothing usable this tick; the surface keeps what it shows.
    Skipped,
}

/// Clock estimate, active-line resolution and diffing for one entity.
#[derive(Debug)]
pub struct LyricsCard {
    entity_id: String,
    config: CardConfig,
    document: Arc<LyricsDocument>,
    active_line: Option<usize>,
    differ: Differ,
}

impl LyricsCard {
    /// Fails with `MissingEntity` before anything is rendered.
    pub fn new(config: CardConfig) -> Result<Self, ConfigError> {
        let entity_id = config.validate()?.to_string();
        Ok(Self {
            entity_id,
            config,
            document: LyricsDocument::empty(),
            active_line: None,
            differ: Differ::new(),
        })
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn document(&self) -> &LyricsDocument {
        &self.document
    }

    pub fn active_line(&self) -> Option<usize> {
        self.active_line
    }

    /// Run one pass: derive the display state from `entity` at `now` and
    /// apply it to `surface`.
    pub fn sync<S: RenderSurface + ?Sized>(
        &mut self,
        entity: Option<&EntityState>,
        now: DateTime<Utc>,
        surface: &mut S,
    ) -> SyncOutcome {
        let Some(entity) = entity else {
            return SyncOutcome::Skipped;
        };
        let Some(state) = self.display_state(entity, now) else {
            return SyncOutcome::Skipped;
        };
        self.active_line = state.active_line;
        self.differ.apply(&state, surface);
        SyncOutcome::Applied
    }

    /// The complete state for this tick, or `None` when the reading is too
    /// stale to extrapolate. Nothing is drawn here.
    pub fn display_state(&mut self, entity: &EntityState, now: DateTime<Utc>) -> Option<DisplayState> {
        let snapshot = entity.snapshot()?;
        self.load_lyrics(entity);

        let title = entity
            .title
            .clone()
            .unwrap_or_else(|| NOT_PLAYING_TITLE.to_string());
        let position = snapshot.estimate(now);
        let mut active_line = resolve_active_line(&self.document.lines, position);
        // On a song change the first reading for the new track may still be
        // in flight; start from the top instead of a stale mid-song line.
        if self.differ.last_applied().title_changed(&title) && !self.document.is_empty() {
            active_line = Some(0);
        }

        Some(DisplayState {
            cover_url: entity.cover_url.clone(),
            title,
            artist: entity.artist.clone(),
            badge: entity.badge(),
            lyrics: Arc::clone(&self.document),
            active_line,
            playing: snapshot.playing,
        })
    }

    fn load_lyrics(&mut self, entity: &EntityState) {
        if self.document.is_source(&entity.lyrics) {
            return;
        }
        self.document = Arc::new(LyricsDocument::parse(&entity.lyrics));
        self.active_line = None;
        tracing::debug!(
            entity = %self.entity_id,
            lines = self.document.lines.len(),
            duration = ?entity.duration,
            "lyrics replaced"
        );
        tracing::trace!(lrc = %format_lrc(&self.document.lines), "normalized lyrics");
    }
}

/// A card bound to its surface and to the entity channel; what the update
/// loop drives.
pub struct CardRuntime<S> {
    pub card: LyricsCard,
    pub surface: S,
    entity_rx: watch::Receiver<Option<EntityState>>,
}

impl<S: RenderSurface> CardRuntime<S> {
    pub fn new(card: LyricsCard, surface: S, entity_rx: watch::Receiver<Option<EntityState>>) -> Self {
        Self {
            card,
            surface,
            entity_rx,
        }
    }
}

impl<S: RenderSurface + Send + 'static> SyncPass for CardRuntime<S> {
    fn sync_pass(&mut self) {
        // One consistent reading per pass.
        let entity = self.entity_rx.borrow_and_update().clone();
        let outcome = self.card.sync(entity.as_ref(), Utc::now(), &mut self.surface);
        tracing::trace!(
            ?outcome,
            active = ?self.card.active_line(),
            lines = self.card.document().lines.len(),
            "sync pass"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PlaybackStatus;
    use crate::render::NO_LYRICS_PLACEHOLDER;
    use crate::render::recording::{RecordingSurface, SurfaceOp};
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    const LYRICS: &str = "[00:00.00]one\n[00:05.00]two\n[00:10.00]three\n[00:15.00]four";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap()
    }

    fn card() -> LyricsCard {
        LyricsCard::new(CardConfig {
            entity: Some("media_player.tunefree".into()),
            ..Default::default()
        })
        .unwrap()
    }

    fn playing(title: &str, lyrics: &str, position: f64) -> EntityState {
        EntityState {
            status: PlaybackStatus::Playing,
            title: Some(title.into()),
            artist: "Artist".into(),
            cover_url: format!("http://img/{title}.jpg"),
            lyrics: lyrics.into(),
            position: Some(position),
            position_updated_at: Some(t0()),
            ..Default::default()
        }
    }

    #[test]
    fn construction_requires_entity() {
        assert_matches!(
            LyricsCard::new(CardConfig::default()),
            Err(ConfigError::MissingEntity)
        );
    }

    #[test]
    fn song_change_forces_first_line() {
        let mut card = card();
        let mut surface = RecordingSurface::default();

        // First reading counts as a song change.
        let entity = playing("A", LYRICS, 11.0);
        assert_eq!(card.sync(Some(&entity), t0(), &mut surface), SyncOutcome::Applied);
        assert_eq!(card.active_line(), Some(0));

        // Same song: the clock decides.
        card.sync(Some(&entity), t0() + Duration::seconds(1), &mut surface);
        assert_eq!(card.active_line(), Some(2));

        // New title, resolver would say line 3.
        let next = playing("B", LYRICS, 16.0);
        card.sync(Some(&next), t0(), &mut surface);
        assert_eq!(card.active_line(), Some(0));
        card.sync(Some(&next), t0() + Duration::milliseconds(300), &mut surface);
        assert_eq!(card.active_line(), Some(3));
    }

    #[test]
    fn empty_lyrics_keep_placeholder_and_no_line() {
        let mut card = card();
        let mut surface = RecordingSurface::default();
        let entity = playing("A", "", 30.0);
        for ms in [0, 300, 600, 900] {
            card.sync(Some(&entity), t0() + Duration::milliseconds(ms), &mut surface);
            assert_eq!(card.active_line(), None);
        }
        let placeholders = surface
            .take()
            .into_iter()
            .filter(|op| *op == SurfaceOp::Placeholder(NO_LYRICS_PLACEHOLDER.into()))
            .count();
        assert_eq!(placeholders, 1);
    }

    #[test]
    fn absent_or_stale_entity_skips_tick() {
        let mut card = card();
        let mut surface = RecordingSurface::default();
        card.sync(Some(&playing("A", LYRICS, 6.0)), t0(), &mut surface);
        surface.take();

        assert_eq!(card.sync(None, t0(), &mut surface), SyncOutcome::Skipped);
        let mut stale = playing("A", LYRICS, 6.0);
        stale.position_updated_at = None;
        assert_eq!(card.sync(Some(&stale), t0(), &mut surface), SyncOutcome::Skipped);
        assert!(surface.take().is_empty());
        assert_eq!(card.active_line(), Some(0));
    }

    #[test]
    fn new_lyrics_replace_document() {
        let mut card = card();
        let mut surface = RecordingSurface::default();
        card.sync(Some(&playing("A", LYRICS, 0.0)), t0(), &mut surface);
        assert_eq!(card.document().lines.len(), 4);

        card.sync(Some(&playing("A", "[00:01.00]only", 0.0)), t0(), &mut surface);
        assert_eq!(card.document().lines.len(), 1);
        // Before the first cue of the new document.
        assert_eq!(card.active_line(), None);
    }

    #[test]
    fn paused_entity_does_not_advance() {
        let mut card = card();
        let mut surface = RecordingSurface::default();
        let mut entity = playing("A", LYRICS, 6.0);
        card.sync(Some(&entity), t0(), &mut surface);
        entity.status = PlaybackStatus::Paused;
        card.sync(Some(&entity), t0() + Duration::seconds(60), &mut surface);
        assert_eq!(card.active_line(), Some(1));
        assert!(surface.take().contains(&SurfaceOp::PlayIcon(false)));
    }

    #[test]
    fn missing_title_uses_sentinel() {
        let mut card = card();
        let mut entity = playing("A", "", 0.0);
        entity.title = None;
        let state = card.display_state(&entity, t0()).unwrap();
        assert_eq!(state.title, NOT_PLAYING_TITLE);
    }

    #[test]
    fn runtime_reads_watch_channel() {
        let (tx, rx) = watch::channel(None);
        let mut runtime = CardRuntime::new(card(), RecordingSurface::default(), rx);
        runtime.sync_pass();
        assert!(runtime.surface.ops.is_empty());

        let mut entity = playing("A", LYRICS, 0.0);
        entity.position_updated_at = Some(Utc::now());
        tx.send_replace(Some(entity));
        runtime.sync_pass();
        assert!(runtime.surface.ops.contains(&SurfaceOp::Title("A".into())));
    }
}
