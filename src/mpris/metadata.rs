//! Track metadata extraction from MPRIS `Metadata` maps.

use std::collections::HashMap;
use zvariant::OwnedValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: String,
    pub art_url: String,
    /// `xesam:asText`, which lyric-aware players fill with LRC text.
    pub lyrics: String,
    pub length: Option<f64>,
}

fn string_of(v: &OwnedValue) -> Option<String> {
    TryInto::<String>::try_into(v.clone()).ok()
}

/// MPRIS defines artist as an array of strings, but some players send a
/// single string.
fn first_string_of(v: &OwnedValue) -> Option<String> {
    if let Ok(list) = TryInto::<Vec<String>>::try_into(v.clone()) {
        return list.into_iter().next();
    }
    string_of(v)
}

fn micros_of(v: &OwnedValue) -> Option<i64> {
    if let Ok(i) = TryInto::<i64>::try_into(v.clone()) {
        return Some(i);
    }
    if let Ok(u) = TryInto::<u64>::try_into(v.clone()) {
        return Some(u as i64);
    }
    None
}

/// Extract metadata fields from a D-Bus property map.
pub fn extract_metadata(map: &HashMap<String, OwnedValue>) -> TrackMetadata {
    let title = map
        .get("xesam:title")
        .and_then(string_of)
        .filter(|t| !t.is_empty());
    let artist = map
        .get("xesam:artist")
        .and_then(first_string_of)
        .unwrap_or_default();
    let art_url = map.get("mpris:artUrl").and_then(string_of).unwrap_or_default();
    let lyrics = map.get("xesam:asText").and_then(string_of).unwrap_or_default();
    let length = map
        .get("mpris:length")
        .and_then(micros_of)
        .map(|us| us as f64 / 1_000_000.0);
    TrackMetadata {
        title,
        artist,
        art_url,
        lyrics,
        length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zvariant::Value;

    fn owned(v: Value<'_>) -> OwnedValue {
        v.try_to_owned().unwrap()
    }

    #[test]
    fn extracts_known_fields() {
        let mut map = HashMap::new();
        map.insert("xesam:title".to_string(), owned(Value::from("Hey Jude")));
        map.insert(
            "xesam:artist".to_string(),
            owned(Value::from(vec!["The Beatles".to_string(), "Other".to_string()])),
        );
        map.insert("mpris:artUrl".to_string(), owned(Value::from("file:///tmp/a.png")));
        map.insert("xesam:asText".to_string(), owned(Value::from("[00:01.00]Hey")));
        map.insert("mpris:length".to_string(), owned(Value::from(431_000_000i64)));

        let md = extract_metadata(&map);
        assert_eq!(md.title.as_deref(), Some("Hey Jude"));
        assert_eq!(md.artist, "The Beatles");
        assert_eq!(md.art_url, "file:///tmp/a.png");
        assert_eq!(md.lyrics, "[00:01.00]Hey");
        assert_eq!(md.length, Some(431.0));
    }

    #[test]
    fn tolerates_single_string_artist_and_missing_fields() {
        let mut map = HashMap::new();
        map.insert("xesam:artist".to_string(), owned(Value::from("Solo")));
        map.insert("xesam:title".to_string(), owned(Value::from("")));
        let md = extract_metadata(&map);
        assert_eq!(md.artist, "Solo");
        assert_eq!(md.title, None);
        assert!(md.lyrics.is_empty());
        assert_eq!(md.length, None);
    }
}
