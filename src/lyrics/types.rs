use std::sync::Arc;

/// One timestamped lyric line. `time` is in seconds from track start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricLine {
    pub time: f64,
    pub text: String,
}

/// Raw lyrics text together with its parsed, time-ordered lines.
///
/// Documents are compared by their raw text: two documents with the same
/// source text are the same document, whatever their allocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsDocument {
    pub raw: String,
    pub lines: Vec<LyricLine>,
}

impl LyricsDocument {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            lines: crate::lyrics::parse_synced_lyrics(raw),
        }
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when `raw` is the text this document was parsed from.
    pub fn is_source(&self, raw: &str) -> bool {
        self.raw == raw
    }
}
