// src/text_utils.rs
// Utility functions for text formatting

use textwrap::core::display_width;
use unicode_segmentation::UnicodeSegmentation;

/// Wrap text to a given width, breaking at word boundaries. Always returns
/// at least one row so every lyric line occupies space.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let rows: Vec<String> = textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|cow| cow.into_owned())
        .collect();
    if rows.is_empty() { vec![String::new()] } else { rows }
}

/// Cut `text` to at most `width` terminal columns, marking the cut with `…`.
/// Wide (e.g. CJK) graphemes count as two columns and are never split.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for g in text.graphemes(true) {
        let w = display_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('…');
    out
}
