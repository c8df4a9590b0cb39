// lyrics/mod.rs - timestamped lyrics model and parser
pub mod parse;
pub mod types;

pub use parse::{format_lrc, parse_synced_lyrics};
pub use types::{LyricLine, LyricsDocument};
