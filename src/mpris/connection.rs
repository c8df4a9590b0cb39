//! D-Bus connection management and player discovery for MPRIS.

use std::sync::Arc;
use tokio::sync::OnceCell;
use zbus::proxy;

/// Service name that selects whichever player playerctld reports as active.
pub const AUTO_SERVICE: &str = "auto";

/// Errors that can occur during MPRIS operations
#[derive(thiserror::Error, Debug)]
pub enum MprisError {
    #[error("D-Bus error: {0}")]
    ZBus(#[from] zbus::Error),
    #[error("Failed to establish D-Bus connection")]
    NoConnection,
}

/// Global D-Bus connection singleton
static DBUS_CONNECTION: OnceCell<Arc<zbus::Connection>> = OnceCell::const_new();

/// Get or create a shared D-Bus session connection
pub async fn get_dbus_conn() -> Result<Arc<zbus::Connection>, MprisError> {
    DBUS_CONNECTION
        .get_or_try_init(|| async {
            let conn = zbus::Connection::session()
                .await
                .map_err(|_| MprisError::NoConnection)?;
            Ok(Arc::new(conn))
        })
        .await
        .cloned()
}

/// Proxy interface for playerctld to get active MPRIS players
#[proxy(
    interface = "com.github.altdesktop.playerctld",
    default_service = "org.mpris.MediaPlayer2.playerctld",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait Playerctld {
    #[zbus(property)]
    fn player_names(&self) -> zbus::Result<Vec<String>>;
}

/// Get list of active MPRIS player service names, most recent first.
///
/// This queries playerctld if available, otherwise returns an empty list.
pub async fn get_active_player_names() -> Result<Vec<String>, MprisError> {
    let conn = get_dbus_conn().await?;

    match PlayerctldProxy::new(&conn).await {
        Ok(proxy) => proxy.player_names().await.or(Ok(Vec::new())),
        Err(_) => Ok(Vec::new()),
    }
}

/// Resolve the configured entity id into a bus name.
///
/// `auto` picks the most recently active player; anything else is taken as
/// a bus name, with the `org.mpris.MediaPlayer2.` prefix added when missing.
pub async fn resolve_service(entity_id: &str) -> Result<Option<String>, MprisError> {
    if entity_id.eq_ignore_ascii_case(AUTO_SERVICE) {
        let names = get_active_player_names().await?;
        return Ok(names.into_iter().next());
    }
    Ok(Some(qualify_service(entity_id)))
}

pub fn qualify_service(entity_id: &str) -> String {
    if entity_id.starts_with("org.mpris.MediaPlayer2.") {
        entity_id.to_string()
    } else {
        format!("org.mpris.MediaPlayer2.{}", entity_id)
    }
}
