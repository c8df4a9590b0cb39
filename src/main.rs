mod card;
mod commands;
mod config;
mod entity;
mod lyrics;
mod mpris;
mod render;
mod scheduler;
mod state;
mod text_utils;
mod timer;
mod ui;

use crate::card::LyricsCard;
use crate::config::CardConfig;
use crate::entity::hass::HassEntity;
use crate::mpris::MprisPlayer;
use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Home Assistant media_player entity over the REST API
    Hass,
    /// Local MPRIS player over D-Bus
    Mpris,
}

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Entity to bind to: a Home Assistant entity id (media_player.x) or an
    /// MPRIS bus name ("spotify", "org.mpris.MediaPlayer2.vlc", "auto")
    #[arg(long)]
    entity: Option<String>,
    /// JSON card config ({"entity": ..., "show_controls": ..., "card_height": ...})
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = BackendKind::Hass)]
    backend: BackendKind,
    /// Home Assistant base URL
    #[arg(long, env = "HASS_URL", default_value = "http://localhost:8123")]
    hass_url: String,
    /// Home Assistant long-lived access token
    #[arg(long, env = "HASS_TOKEN", hide_env_values = true, default_value = "")]
    hass_token: String,
    /// Hide playback controls
    #[arg(long)]
    no_controls: bool,
    /// Card height in pixels (16 px per terminal row)
    #[arg(long)]
    card_height: Option<u32>,
    /// Entity poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,
    /// Pipe current lyric line to stdout (default is the full card UI)
    #[arg(long)]
    pipe: bool,
    /// Enable debug logging to stderr
    #[arg(long)]
    debug_log: bool,
}

impl Cli {
    /// Config file values, overridden by explicit flags.
    fn card_config(&self) -> Result<CardConfig, config::ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => CardConfig::load(path)?,
            None => CardConfig::default(),
        };
        if let Some(entity) = &self.entity {
            cfg.entity = Some(entity.clone());
        }
        if self.no_controls {
            cfg.show_controls = false;
        }
        if let Some(h) = self.card_height {
            cfg.card_height = h;
        }
        Ok(cfg)
    }
}

fn init_logging(debug_log: bool) {
    let filter = if debug_log {
        EnvFilter::new("lyricscard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    init_logging(cli.debug_log);

    let card = LyricsCard::new(cli.card_config()?)?;
    let poll_interval = Duration::from_millis(cli.poll_ms.max(100));

    let result = match cli.backend {
        BackendKind::Hass => {
            if cli.hass_token.is_empty() {
                tracing::warn!("no Home Assistant token given; requests will be rejected");
            }
            let entity = HassEntity::new(&cli.hass_url, &cli.hass_token, card.entity_id());
            tracing::debug!(url = %cli.hass_url, entity = %entity.entity_id(), "home assistant backend");
            run(card, entity, poll_interval, cli.pipe).await
        }
        BackendKind::Mpris => {
            let entity = MprisPlayer::new(card.entity_id());
            run(card, entity, poll_interval, cli.pipe).await
        }
    };

    // Print error if any, for better diagnostics
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run<E>(
    card: LyricsCard,
    entity: E,
    poll_interval: Duration,
    pipe: bool,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    E: entity::EntitySource + entity::CommandSink + Clone + Send + Sync + 'static,
{
    if pipe {
        crate::ui::pipe::display_lyrics_pipe(card, entity, poll_interval).await
    } else {
        crate::ui::modern::display_lyrics_modern(card, entity, poll_interval).await
    }
}
