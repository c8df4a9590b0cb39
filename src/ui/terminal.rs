//! Full-screen terminal rendition of the card.
//!
//! The surface keeps its own model of what is shown and repaints only from
//! `present` when a setter actually changed something. Geometry is in
//! terminal rows: the lyrics panel is the scroll container and each lyric
//! line is as tall as its wrapped text.

use crate::config::CardConfig;
use crate::lyrics::LyricLine;
use crate::render::{CoverSlot, LineMetrics, RenderSurface, centered_scroll_offset};
use crate::text_utils::{truncate_to_width, wrap_text};
use crate::ui::styles::LyricStyles;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;

/// Pixel height of one terminal row when mapping `card_height`.
pub const CELL_HEIGHT_PX: u32 = 16;
const HEADER_ROWS: u16 = 3;
const CONTROL_ROWS: u16 = 1;

pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    styles: LyricStyles,
    show_controls: bool,
    max_rows: u16,
    width: u16,
    height: u16,
    /// Terminals have no image layer; covers are shown as text, and the
    /// background slot is only recorded.
    covers: [String; 3],
    title: String,
    artist: String,
    badge: String,
    status: Option<String>,
    placeholder: Option<String>,
    lines: Vec<String>,
    wrapped: Vec<Vec<String>>,
    emphasized: Vec<bool>,
    spacer_rows: u16,
    scroll: u16,
    playing: bool,
    dirty: bool,
}

fn slot_index(slot: CoverSlot) -> usize {
    match slot {
        CoverSlot::Background => 0,
        CoverSlot::Compact => 1,
        CoverSlot::Header => 2,
    }
}

impl<B: Backend> TerminalSurface<B> {
    pub fn new(terminal: Terminal<B>, config: &CardConfig) -> std::io::Result<Self> {
        let size = terminal.size()?;
        let max_rows = (config.card_height / CELL_HEIGHT_PX).clamp(1, u16::MAX as u32) as u16;
        Ok(Self {
            terminal,
            styles: LyricStyles::default(),
            show_controls: config.show_controls,
            max_rows,
            width: size.width,
            height: size.height,
            covers: Default::default(),
            title: String::new(),
            artist: String::new(),
            badge: String::new(),
            status: None,
            placeholder: None,
            lines: Vec::new(),
            wrapped: Vec::new(),
            emphasized: Vec::new(),
            spacer_rows: 0,
            scroll: 0,
            playing: false,
            dirty: true,
        })
    }

    #[cfg(test)]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn card_rows(&self) -> u16 {
        self.height.min(self.max_rows)
    }

    fn control_rows(&self) -> u16 {
        if self.show_controls { CONTROL_ROWS } else { 0 }
    }

    fn panel_rows(&self) -> u16 {
        self.card_rows()
            .saturating_sub(HEADER_ROWS + self.control_rows())
            .max(1)
    }

    fn rewrap(&mut self) {
        let width = self.width as usize;
        self.wrapped = self.lines.iter().map(|l| wrap_text(l, width)).collect();
    }

    fn current_line(&self) -> Option<usize> {
        self.emphasized.iter().position(|e| *e)
    }

    /// One-line message under the controls, e.g. host acknowledgements.
    pub fn set_status(&mut self, status: Option<String>) {
        if self.status != status {
            self.status = status;
            self.dirty = true;
        }
    }

    /// Adopt a new terminal size: rewrap, resize the spacers and re-center
    /// the highlighted line.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.rewrap();
        if !self.lines.is_empty() {
            self.spacer_rows = self.panel_rows() / 2;
        }
        self.scroll = match self.current_line().and_then(|i| self.line_metrics(i)) {
            Some(m) => centered_scroll_offset(m, self.container_height()).round() as u16,
            None => 0,
        };
        self.dirty = true;
    }

    fn lyrics_text(&self) -> Text<'static> {
        if let Some(msg) = &self.placeholder {
            let mut rows = vec![Line::default(); (self.panel_rows() / 2) as usize];
            rows.push(Line::from(Span::styled(msg.clone(), self.styles.placeholder)));
            return Text::from(rows);
        }
        let current = self.current_line();
        let mut rows = vec![Line::default(); self.spacer_rows as usize];
        for (i, block) in self.wrapped.iter().enumerate() {
            let style = match current {
                Some(c) if i == c => self.styles.current,
                Some(c) if i < c => self.styles.before,
                _ => self.styles.after,
            };
            rows.extend(block.iter().map(|r| Line::from(Span::styled(r.clone(), style))));
        }
        rows.extend(std::iter::repeat_n(Line::default(), self.spacer_rows as usize));
        Text::from(rows)
    }

    fn header_text(&self, width: usize) -> Text<'static> {
        let mut second = self.artist.clone();
        if !self.badge.is_empty() {
            if !second.is_empty() {
                second.push_str("  ");
            }
            second.push('[');
            second.push_str(&self.badge);
            second.push(']');
        }
        let cover = &self.covers[slot_index(CoverSlot::Header)];
        let third = if cover.is_empty() { String::new() } else { format!("cover: {}", cover) };
        Text::from(vec![
            Line::from(Span::styled(truncate_to_width(&self.title, width), self.styles.title)),
            Line::from(Span::raw(truncate_to_width(&second, width))),
            Line::from(Span::styled(truncate_to_width(&third, width), self.styles.muted)),
        ])
    }

    fn controls_text(&self, width: usize) -> Line<'static> {
        let icon = if self.playing { "⏸" } else { "▶" };
        let compact = if self.covers[slot_index(CoverSlot::Compact)].is_empty() { " " } else { "♪" };
        let mut s = format!("{}  ⏮ p   {} space   ⏭ n   ☰ b", compact, icon);
        if let Some(status) = &self.status {
            s.push_str("   ");
            s.push_str(status);
        }
        Line::from(Span::raw(truncate_to_width(&s, width)))
    }

    fn draw(&mut self) -> std::io::Result<()> {
        let header = self.header_text(self.width as usize);
        let lyrics = self.lyrics_text();
        let controls = self.show_controls.then(|| self.controls_text(self.width as usize));
        let scroll = self.scroll;
        let card_rows = self.card_rows();
        let control_rows = self.control_rows();
        self.terminal.draw(|f| {
            let area = f.area();
            let card = Rect {
                height: card_rows.min(area.height),
                ..area
            };
            let [head, body, foot] = Layout::vertical([
                Constraint::Length(HEADER_ROWS),
                Constraint::Min(1),
                Constraint::Length(control_rows),
            ])
            .areas(card);
            f.render_widget(Paragraph::new(header), head);
            f.render_widget(
                Paragraph::new(lyrics)
                    .alignment(Alignment::Center)
                    .scroll((scroll, 0)),
                body,
            );
            if let Some(controls) = controls {
                f.render_widget(Paragraph::new(controls).alignment(Alignment::Center), foot);
            }
        })?;
        Ok(())
    }
}

impl<B: Backend> RenderSurface for TerminalSurface<B> {
    fn set_cover(&mut self, slot: CoverSlot, url: &str) {
        let current = &mut self.covers[slot_index(slot)];
        if *current != url {
            *current = url.to_string();
            self.dirty = true;
        }
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.title = title.to_string();
            self.dirty = true;
        }
    }

    fn set_artist(&mut self, artist: &str) {
        if self.artist != artist {
            self.artist = artist.to_string();
            self.dirty = true;
        }
    }

    fn set_badge(&mut self, badge: &str) {
        if self.badge != badge {
            self.badge = badge.to_string();
            self.dirty = true;
        }
    }

    fn rebuild_lyrics(&mut self, lines: &[LyricLine], spacer_height: f32) {
        self.placeholder = None;
        self.lines = lines.iter().map(|l| l.text.clone()).collect();
        self.emphasized = vec![false; self.lines.len()];
        self.spacer_rows = spacer_height.max(0.0) as u16;
        self.scroll = 0;
        self.rewrap();
        self.dirty = true;
    }

    fn show_placeholder(&mut self, message: &str) {
        self.lines.clear();
        self.wrapped.clear();
        self.emphasized.clear();
        self.spacer_rows = 0;
        self.scroll = 0;
        self.placeholder = Some(message.to_string());
        self.dirty = true;
    }

    fn set_line_emphasis(&mut self, index: usize, emphasized: bool) {
        match self.emphasized.get_mut(index) {
            Some(e) if *e != emphasized => {
                *e = emphasized;
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn line_metrics(&self, index: usize) -> Option<LineMetrics> {
        let block = self.wrapped.get(index)?;
        let above: usize = self.wrapped[..index].iter().map(Vec::len).sum();
        Some(LineMetrics {
            offset_top: (self.spacer_rows as usize + above) as f32,
            height: block.len() as f32,
        })
    }

    fn container_height(&self) -> f32 {
        self.panel_rows() as f32
    }

    fn scroll_lyrics_to(&mut self, offset: f32) {
        let rows = offset.max(0.0).round() as u16;
        if rows != self.scroll {
            self.scroll = rows;
            self.dirty = true;
        }
    }

    fn set_play_icon(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.dirty = true;
        }
    }

    fn present(&mut self) {
        if !self.dirty {
            return;
        }
        match self.draw() {
            Ok(()) => self.dirty = false,
            Err(e) => tracing::warn!(error = %e, "terminal draw failed"),
        }
    }
}
