//! In-page media state extraction.

use serde_json::Value;

use trackcast_core::{Result, Snapshot};

use crate::session::PageSession;

/// Evaluated in the page; yields `{title, artist, album, art, dur, pos, paused}`
/// or `null` when no media session is active. The player time bar is the only
/// reliable source for position/duration, the `<video>` element only carries
/// the paused flag.
pub const EXTRACT_EXPRESSION: &str = r#"(() => {
  const m = navigator.mediaSession;
  const v = document.querySelector('video');
  const timeInfo = document.querySelector('.time-info.style-scope.ytmusic-player-bar');
  if (!m || !m.metadata || !v || !timeInfo) return null;

  const [posStr, durStr] = timeInfo.textContent.split(' / ');
  const pos = posStr ? posStr.split(':').reduce((acc, val) => acc * 60 + parseFloat(val), 0) : 0;
  const dur = durStr ? durStr.split(':').reduce((acc, val) => acc * 60 + parseFloat(val), 0) : 0;

  const artwork = m.metadata.artwork || [];
  const art = artwork.length ? artwork[artwork.length - 1].src : null;

  return {
    title: m.metadata.title || '',
    artist: m.metadata.artist || '',
    album: m.metadata.album || '',
    art: art,
    dur: dur,
    pos: pos,
    paused: v.paused
  };
})()"#;

/// Run the extraction expression through the bound session.
///
/// `Ok(None)` means the page has no active media. A transport or protocol
/// failure surfaces as an error and is treated by the caller as a lost
/// connection.
pub async fn extract(session: &dyn PageSession) -> Result<Option<Snapshot>> {
    let result = session.evaluate(EXTRACT_EXPRESSION).await?;
    Ok(parse_result(&result))
}

/// Parse a `Runtime.evaluate` result into a snapshot. An absent or null
/// result value means no active media; individual fields fall back to
/// defaults rather than failing the whole snapshot.
fn parse_result(result: &Value) -> Option<Snapshot> {
    let value = result.get("result")?.get("value")?;
    if value.is_null() {
        return None;
    }

    let text = |key: &str| -> String {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Some(Snapshot {
        title: text("title"),
        artist: text("artist"),
        album: text("album"),
        artwork_url: value
            .get("art")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        position_seconds: value.get("pos").and_then(|v| v.as_f64()).unwrap_or(0.0),
        duration_seconds: value.get("dur").and_then(|v| v.as_f64()).unwrap_or(0.0),
        paused: value.get("paused").and_then(|v| v.as_bool()).unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_result() {
        let result = json!({
            "result": {
                "type": "object",
                "value": {
                    "title": "Song",
                    "artist": "Artist",
                    "album": "Album",
                    "art": "https://example.com/a.jpg",
                    "dur": 200.0,
                    "pos": 42.5,
                    "paused": false
                }
            }
        });
        let snapshot = parse_result(&result).unwrap();
        assert_eq!(snapshot.title, "Song");
        assert_eq!(snapshot.artwork_url.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(snapshot.position_seconds, 42.5);
        assert!(!snapshot.paused);
    }

    #[test]
    fn test_parse_null_value_is_no_media() {
        let result = json!({ "result": { "type": "object", "subtype": "null", "value": null } });
        assert!(parse_result(&result).is_none());
    }

    #[test]
    fn test_parse_missing_value_is_no_media() {
        // An in-page exception produces a result without a `value` member.
        let result = json!({ "result": { "type": "object", "subtype": "error" } });
        assert!(parse_result(&result).is_none());
    }

    #[test]
    fn test_parse_partial_fields_fall_back() {
        let result = json!({
            "result": { "value": { "title": "Song", "art": null } }
        });
        let snapshot = parse_result(&result).unwrap();
        assert_eq!(snapshot.title, "Song");
        assert_eq!(snapshot.artist, "");
        assert!(snapshot.artwork_url.is_none());
        assert_eq!(snapshot.duration_seconds, 0.0);
        assert!(snapshot.paused);
    }
}
