//! An MPRIS player as entity source and command target.

use crate::entity::{CommandSink, EntityError, EntitySource, EntityState, PlaybackCommand, PlaybackStatus};
use crate::mpris::connection::{MprisError, get_dbus_conn, resolve_service};
use crate::mpris::metadata::extract_metadata;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use zbus::proxy;
use zvariant::OwnedValue;

/// MPRIS MediaPlayer2.Player interface proxy
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2Player {
    fn next(&self) -> zbus::Result<()>;
    fn previous(&self) -> zbus::Result<()>;
    fn play(&self) -> zbus::Result<()>;
    fn pause(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property)]
    fn position(&self) -> zbus::Result<i64>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;
}

/// Player addressed by bus name, or `auto` for the active one.
#[derive(Debug, Clone)]
pub struct MprisPlayer {
    entity_id: Arc<str>,
}

impl MprisPlayer {
    pub fn new(entity_id: &str) -> Self {
        Self {
            entity_id: Arc::from(entity_id),
        }
    }

    async fn proxy(&self) -> Result<Option<MediaPlayer2PlayerProxy<'static>>, MprisError> {
        let Some(service) = resolve_service(&self.entity_id).await? else {
            return Ok(None);
        };
        let conn = get_dbus_conn().await?;
        // Fresh reads every poll; a property cache would only add signal traffic.
        let proxy = MediaPlayer2PlayerProxy::builder(&conn)
            .destination(service)?
            .cache_properties(zbus::proxy::CacheProperties::No)
            .build()
            .await?;
        Ok(Some(proxy))
    }

    async fn read(&self) -> Result<Option<EntityState>, MprisError> {
        let Some(proxy) = self.proxy().await? else {
            return Ok(None);
        };
        // A player that cannot report its status has gone away.
        let Ok(status) = proxy.playback_status().await else {
            return Ok(None);
        };
        let meta = proxy
            .metadata()
            .await
            .map(|m| extract_metadata(&m))
            .unwrap_or_default();
        let position = proxy.position().await.ok().map(|us| us as f64 / 1_000_000.0);
        Ok(Some(EntityState {
            status: PlaybackStatus::parse(&status),
            cover_url: meta.art_url,
            title: meta.title,
            artist: meta.artist,
            lyrics: meta.lyrics,
            position,
            position_updated_at: position.map(|_| Utc::now()),
            duration: meta.length,
            source: None,
            queue: None,
        }))
    }

    async fn call(&self, command: PlaybackCommand) -> Result<(), MprisError> {
        let Some(proxy) = self.proxy().await? else {
            return Ok(());
        };
        match command {
            PlaybackCommand::Previous => proxy.previous().await?,
            PlaybackCommand::Next => proxy.next().await?,
            PlaybackCommand::Play => proxy.play().await?,
            PlaybackCommand::Pause => proxy.pause().await?,
        }
        Ok(())
    }
}

impl EntitySource for MprisPlayer {
    async fn fetch(&self) -> Result<Option<EntityState>, EntityError> {
        Ok(self.read().await?)
    }
}

impl CommandSink for MprisPlayer {
    async fn send(&self, command: PlaybackCommand) -> Result<(), EntityError> {
        self.call(command).await?;
        tracing::debug!(?command, player = %self.entity_id, "command sent");
        Ok(())
    }
}
