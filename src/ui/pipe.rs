use crate::card::{CardRuntime, LyricsCard};
use crate::entity::EntitySource;
use crate::lyrics::LyricLine;
use crate::render::{CoverSlot, LineMetrics, RenderSurface};
use crate::scheduler::UpdateLoop;
use std::io::Write;
use std::time::Duration;

/// Display lyrics in pipe mode until interrupted.
pub async fn display_lyrics_pipe<E>(
    card: LyricsCard,
    entity: E,
    poll_interval: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    E: EntitySource + Send + Sync + 'static,
{
    let (entity_rx, poller_shutdown) = crate::ui::spawn_poller(entity, poll_interval);
    let surface = PipeSurface::new(std::io::stdout());
    let mut update_loop = UpdateLoop::new(CardRuntime::new(card, surface, entity_rx));
    update_loop.attach();

    tokio::signal::ctrl_c().await?;

    update_loop.detach();
    let _ = poller_shutdown.try_send(());
    Ok(())
}

/// Pipe mode (stdout only, for scripting): prints each newly highlighted
/// line. A track without lyrics following one with lyrics prints a blank
/// line so consumers can clear their display.
pub struct PipeSurface<W: Write> {
    out: W,
    lines: Vec<String>,
    last_printed: Option<usize>,
    had_lyric: bool,
}

impl<W: Write> PipeSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines: Vec::new(),
            last_printed: None,
            had_lyric: false,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "pipe write failed");
        }
    }
}

impl<W: Write> RenderSurface for PipeSurface<W> {
    fn set_cover(&mut self, _slot: CoverSlot, _url: &str) {}
    fn set_title(&mut self, _title: &str) {}
    fn set_artist(&mut self, _artist: &str) {}
    fn set_badge(&mut self, _badge: &str) {}

    fn rebuild_lyrics(&mut self, lines: &[LyricLine], _spacer_height: f32) {
        self.lines = lines.iter().map(|l| l.text.clone()).collect();
        self.last_printed = None;
    }

    fn show_placeholder(&mut self, _message: &str) {
        self.lines.clear();
        self.last_printed = None;
        if self.had_lyric {
            self.emit("");
            self.had_lyric = false;
        }
    }

    fn set_line_emphasis(&mut self, index: usize, emphasized: bool) {
        if !emphasized || self.last_printed == Some(index) {
            return;
        }
        if let Some(text) = self.lines.get(index).cloned() {
            self.emit(&text);
            self.last_printed = Some(index);
            self.had_lyric = true;
        }
    }

    fn line_metrics(&self, index: usize) -> Option<LineMetrics> {
        (index < self.lines.len()).then(|| LineMetrics {
            offset_top: index as f32,
            height: 1.0,
        })
    }

    fn container_height(&self) -> f32 {
        1.0
    }

    fn scroll_lyrics_to(&mut self, _offset: f32) {}
    fn set_play_icon(&mut self, _playing: bool) {}
}
