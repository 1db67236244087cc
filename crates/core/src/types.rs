use serde::{Deserialize, Serialize};
use std::fmt;

/// One extracted media state, produced per poll tick. `None` at the call
/// sites that carry `Option<Snapshot>` means "no active media".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_url: Option<String>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub paused: bool,
}

/// The JSON frame pushed to subscribers. Fields absent when no track is
/// active, so the idle frame serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
}

impl WireSnapshot {
    pub fn from_snapshot(snapshot: Option<&Snapshot>) -> Self {
        match snapshot {
            Some(s) => Self {
                title: Some(s.title.clone()),
                artist: Some(s.artist.clone()),
                album: Some(s.album.clone()),
                album_art: s.artwork_url.clone(),
                position: Some(s.position_seconds),
                duration: Some(s.duration_seconds),
                paused: Some(s.paused),
            },
            None => Self::default(),
        }
    }
}

/// A debuggable target as reported by the endpoint's `/json/list`.
/// Read-only; fetched fresh on every reconciliation, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub ws_url: Option<String>,
}

/// Where the connection state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkState {
    /// Debugging endpoint not reachable.
    Down,
    /// Endpoint reachable, no qualifying tab.
    UpNoTab,
    /// Session open and polling.
    UpBound,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Down => write!(f, "down"),
            LinkState::UpNoTab => write!(f, "up-no-tab"),
            LinkState::UpBound => write!(f, "up-bound"),
        }
    }
}

/// Notification severity; the default sink maps these onto tracing levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Ok,
    Warn,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            artwork_url: Some("https://example.com/art.jpg".to_string()),
            position_seconds: 12.0,
            duration_seconds: 180.0,
            paused: false,
        }
    }

    #[test]
    fn test_wire_frame_camel_case() {
        let wire = WireSnapshot::from_snapshot(Some(&snapshot()));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["albumArt"], "https://example.com/art.jpg");
        assert_eq!(json["position"], 12.0);
        assert_eq!(json["paused"], false);
    }

    #[test]
    fn test_wire_frame_idle_is_empty_object() {
        let wire = WireSnapshot::from_snapshot(None);
        assert_eq!(serde_json::to_string(&wire).unwrap(), "{}");
    }

    #[test]
    fn test_target_parses_endpoint_listing() {
        let raw = r#"{
            "id": "A1B2",
            "type": "page",
            "title": "YouTube Music",
            "url": "https://music.youtube.com/watch?v=x",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/A1B2"
        }"#;
        let target: Target = serde_json::from_str(raw).unwrap();
        assert_eq!(target.id, "A1B2");
        assert!(target.ws_url.as_deref().unwrap().starts_with("ws://"));
    }
}
