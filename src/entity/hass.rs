//! Home Assistant `media_player` entity over the REST API.

use crate::entity::{
    CommandSink, EntityError, EntitySource, EntityState, PlaybackCommand, PlaybackStatus,
    QueuePosition,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

// Shared HTTP client with reasonable defaults for timeouts
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("lyricscard/1.0")
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Debug, Deserialize)]
struct HassStateResp {
    state: String,
    #[serde(default)]
    attributes: HassAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HassAttributes {
    entity_picture: Option<String>,
    media_title: Option<String>,
    media_artist: Option<String>,
    lyrics: Option<String>,
    media_position: Option<f64>,
    media_position_updated_at: Option<DateTime<Utc>>,
    media_duration: Option<f64>,
    source: Option<String>,
    playlist_position: Option<u32>,
    playlist_count: Option<u32>,
}

#[derive(Debug)]
struct Inner {
    base_url: String,
    token: String,
    entity_id: String,
}

/// Client bound to one Home Assistant `media_player` entity.
#[derive(Debug, Clone)]
pub struct HassEntity {
    inner: Arc<Inner>,
}

impl HassEntity {
    pub fn new(base_url: &str, token: &str, entity_id: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                base_url: base_url.trim_end_matches('/').to_string(),
                token: token.to_string(),
                entity_id: entity_id.to_string(),
            }),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.inner.entity_id
    }

    fn state_url(&self) -> String {
        format!(
            "{}/api/states/{}",
            self.inner.base_url,
            urlencoding::encode(&self.inner.entity_id)
        )
    }

    fn service_url(&self, service: &str) -> String {
        format!("{}/api/services/media_player/{}", self.inner.base_url, service)
    }
}

fn service_name(command: PlaybackCommand) -> &'static str {
    match command {
        PlaybackCommand::Previous => "media_previous_track",
        PlaybackCommand::Next => "media_next_track",
        PlaybackCommand::Play => "media_play",
        PlaybackCommand::Pause => "media_pause",
    }
}

/// Map a `/api/states/<entity>` body into an [`EntityState`].
///
/// Returns `None` for entities Home Assistant reports as unavailable.
fn entity_state_from_json(body: &str, base_url: &str) -> Result<Option<EntityState>, EntityError> {
    let resp: HassStateResp = serde_json::from_str(body)?;
    if matches!(resp.state.as_str(), "unavailable" | "unknown") {
        return Ok(None);
    }
    let attrs = resp.attributes;
    // Proxied pictures come back as paths relative to the instance.
    let cover_url = match attrs.entity_picture {
        Some(p) if p.starts_with('/') => format!("{}{}", base_url, p),
        Some(p) => p,
        None => String::new(),
    };
    let queue = match (attrs.playlist_position, attrs.playlist_count) {
        (Some(index), Some(count)) if count > 0 => Some(QueuePosition { index, count }),
        _ => None,
    };
    Ok(Some(EntityState {
        status: PlaybackStatus::parse(&resp.state),
        cover_url,
        title: attrs.media_title.filter(|t| !t.is_empty()),
        artist: attrs.media_artist.unwrap_or_default(),
        lyrics: attrs.lyrics.unwrap_or_default(),
        position: attrs.media_position,
        position_updated_at: attrs.media_position_updated_at,
        duration: attrs.media_duration,
        source: attrs.source,
        queue,
    }))
}

impl EntitySource for HassEntity {
    async fn fetch(&self) -> Result<Option<EntityState>, EntityError> {
        let resp = HTTP_CLIENT
            .get(self.state_url())
            .bearer_auth(&self.inner.token)
            .send()
            .await?;
        if resp.status().as_u16() == 404 {
            // Entity not registered (yet), not an error
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(EntityError::Api(format!(
                "hass states: unexpected status {}",
                resp.status()
            )));
        }
        let body = resp.text().await?;
        entity_state_from_json(&body, &self.inner.base_url)
    }
}

impl CommandSink for HassEntity {
    async fn send(&self, command: PlaybackCommand) -> Result<(), EntityError> {
        let service = service_name(command);
        let resp = HTTP_CLIENT
            .post(self.service_url(service))
            .bearer_auth(&self.inner.token)
            .json(&serde_json::json!({ "entity_id": self.inner.entity_id }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(EntityError::Api(format!(
                "hass {}: unexpected status {}",
                service,
                resp.status()
            )));
        }
        tracing::debug!(service, entity = %self.inner.entity_id, "command sent");
        Ok(())
    }
}
