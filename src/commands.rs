//! Playback command dispatch: user gestures to fire-and-forget entity commands.

use crate::entity::{CommandSink, EntityState, PlaybackCommand};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Requests the card raises toward its host instead of the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Present the media browser for `entity_id`.
    BrowseMedia { entity_id: String },
}

/// Translates control gestures into commands.
///
/// Commands are spawned and never awaited by the caller. Local state is not
/// touched: the next entity reading shows whether a command took effect.
pub struct Dispatcher<C> {
    sink: C,
    entity_id: String,
    state_rx: watch::Receiver<Option<EntityState>>,
    host_tx: mpsc::UnboundedSender<HostEvent>,
}

impl<C> Dispatcher<C>
where
    C: CommandSink + Clone + Send + Sync + 'static,
{
    pub fn new(
        sink: C,
        entity_id: &str,
        state_rx: watch::Receiver<Option<EntityState>>,
        host_tx: mpsc::UnboundedSender<HostEvent>,
    ) -> Self {
        Self {
            sink,
            entity_id: entity_id.to_string(),
            state_rx,
            host_tx,
        }
    }

    pub fn previous(&self) -> JoinHandle<()> {
        self.dispatch(PlaybackCommand::Previous)
    }

    pub fn next(&self) -> JoinHandle<()> {
        self.dispatch(PlaybackCommand::Next)
    }

    /// Pause if the entity currently reports playing, play otherwise.
    pub fn toggle_play_pause(&self) -> JoinHandle<()> {
        let playing = self
            .state_rx
            .borrow()
            .as_ref()
            .is_some_and(EntityState::is_playing);
        let command = if playing {
            PlaybackCommand::Pause
        } else {
            PlaybackCommand::Play
        };
        self.dispatch(command)
    }

    pub fn open_browser(&self) {
        let event = HostEvent::BrowseMedia {
            entity_id: self.entity_id.clone(),
        };
        if self.host_tx.send(event).is_err() {
            tracing::debug!("host event channel closed; browse request dropped");
        }
    }

    fn dispatch(&self, command: PlaybackCommand) -> JoinHandle<()> {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.send(command).await {
                tracing::debug!(?command, error = %e, "command failed");
            }
        })
    }
}
