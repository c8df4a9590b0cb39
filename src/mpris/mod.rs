//! MPRIS module: a local D-Bus media player as the card's external entity.

pub mod connection;
pub mod metadata;
pub mod player;

pub use connection::MprisError;
pub use player::MprisPlayer;
