//! Interactive terminal mode: the card full-screen, with keyboard controls.
//!
//! The update loop is attached while the terminal has focus and detached
//! when it loses it (for terminals that report focus changes). Keys:
//! `space` play/pause, `p`/`←` previous, `n`/`→` next, `b` browse media,
//! `q`/`Esc`/`Ctrl-C` quit.

use crate::card::{CardRuntime, LyricsCard};
use crate::commands::{Dispatcher, HostEvent};
use crate::entity::{CommandSink, EntitySource};
use crate::scheduler::UpdateLoop;
use crate::ui::terminal::TerminalSurface;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Previous,
    Next,
    TogglePlayPause,
    OpenBrowser,
}

/// Map a key press to an action. Playback keys are inert when the card is
/// configured without controls.
pub fn action_for_key(key: KeyEvent, show_controls: bool) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char(' ') => Action::TogglePlayPause,
        KeyCode::Char('p') | KeyCode::Left => Action::Previous,
        KeyCode::Char('n') | KeyCode::Right => Action::Next,
        KeyCode::Char('b') => Action::OpenBrowser,
        _ => return None,
    };
    if action != Action::Quit && !show_controls {
        return None;
    }
    Some(action)
}

/// Display lyrics in modern TUI mode (full card, highlighted, real-time)
pub async fn display_lyrics_modern<E>(
    card: LyricsCard,
    entity: E,
    poll_interval: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    E: EntitySource + CommandSink + Clone + Send + Sync + 'static,
{
    let (entity_rx, poller_shutdown) = crate::ui::spawn_poller(entity.clone(), poll_interval);
    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    let show_controls = card.config().show_controls;
    let dispatcher = Dispatcher::new(entity, card.entity_id(), entity_rx.clone(), host_tx);

    enable_raw_mode().map_err(to_boxed_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange).map_err(to_boxed_err)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(to_boxed_err)?;
    let surface = TerminalSurface::new(terminal, card.config()).map_err(to_boxed_err)?;
    let mut update_loop = UpdateLoop::new(CardRuntime::new(card, surface, entity_rx));
    update_loop.attach();

    // Single background thread to poll for crossterm events and forward them
    // to the async runtime via `event_rx`.
    let (event_tx, mut event_rx) = mpsc::channel(32);
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(Duration::from_millis(100)) {
                Ok(true) => match crossterm::event::read() {
                    Ok(ev) => {
                        // If the async receiver is closed, stop the thread.
                        if event_tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => {}
                },
                Ok(false) => {
                    if event_tx.is_closed() {
                        break;
                    }
                }
                Err(_) => thread::sleep(Duration::from_millis(100)),
            }
        }
    });

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    Event::Key(key) => match action_for_key(key, show_controls) {
                        Some(Action::Quit) => break,
                        Some(Action::Previous) => { dispatcher.previous(); }
                        Some(Action::Next) => { dispatcher.next(); }
                        Some(Action::TogglePlayPause) => { dispatcher.toggle_play_pause(); }
                        Some(Action::OpenBrowser) => dispatcher.open_browser(),
                        None => {}
                    },
                    Event::FocusLost if update_loop.is_attached() => {
                        update_loop.detach();
                    }
                    Event::FocusGained => {
                        update_loop.attach();
                    }
                    Event::Resize(w, h) => {
                        let target = update_loop.target();
                        let mut runtime = target.lock().await;
                        runtime.surface.resize(w, h);
                        crate::render::RenderSurface::present(&mut runtime.surface);
                    }
                    _ => {}
                }
            }
            Some(HostEvent::BrowseMedia { entity_id }) = host_rx.recv() => {
                tracing::info!(entity = %entity_id, "media browser requested");
                let target = update_loop.target();
                let mut runtime = target.lock().await;
                runtime.surface.set_status(Some(format!("browse: {}", entity_id)));
                crate::render::RenderSurface::present(&mut runtime.surface);
            }
        }
    }

    update_loop.detach();
    let _ = poller_shutdown.try_send(());
    disable_raw_mode().map_err(to_boxed_err)?;
    execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen).map_err(to_boxed_err)?;
    Ok(())
}

fn to_boxed_err<E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}
