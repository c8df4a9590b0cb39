pub mod modern;
pub mod pipe;
pub mod styles;
pub mod terminal;

use crate::entity::{EntitySource, EntityState, poll_entity};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Start polling `entity` in the background. Keep the returned sender alive
/// for as long as polling should continue; sending on it (or dropping it)
/// stops the poller.
pub fn spawn_poller<E>(
    entity: E,
    poll_interval: Duration,
) -> (watch::Receiver<Option<EntityState>>, mpsc::Sender<()>)
where
    E: EntitySource + Send + Sync + 'static,
{
    let (state_tx, state_rx) = watch::channel(None);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(poll_entity(entity, poll_interval, state_tx, shutdown_rx));
    (state_rx, shutdown_tx)
}
