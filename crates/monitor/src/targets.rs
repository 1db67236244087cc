//! Target discovery against the remote-debugging endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use trackcast_core::{Error, Result, Target};

/// Lists debuggable targets. The production source queries the endpoint's
/// `/json/list`; tests script their own listings.
#[async_trait]
pub trait TargetSource: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<Target>>;
}

pub struct HttpTargetSource {
    list_url: String,
    client: reqwest::Client,
}

impl HttpTargetSource {
    pub fn new(list_url: String) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { list_url, client }
    }
}

#[async_trait]
impl TargetSource for HttpTargetSource {
    async fn list_targets(&self) -> Result<Vec<Target>> {
        let resp = self
            .client
            .get(&self.list_url)
            .send()
            .await
            .map_err(|e| Error::Unreachable(e.to_string()))?;

        let targets: Vec<Target> = resp
            .json()
            .await
            .map_err(|e| Error::Unreachable(e.to_string()))?;

        debug!(count = targets.len(), "listed debugging targets");
        Ok(targets)
    }
}

/// Pick the qualifying tab: the first target whose URL starts with `origin`,
/// skipping the service-worker script that registers as its own target.
/// Deterministic given the same listing order.
pub fn select_target<'a>(
    targets: &'a [Target],
    origin: &str,
    service_worker_path: &str,
) -> Option<&'a Target> {
    let sw_url = format!("{}{}", origin, service_worker_path);
    targets
        .iter()
        .find(|t| t.url.starts_with(origin) && t.url != sw_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://music.youtube.com/";

    fn target(id: &str, url: &str) -> Target {
        Target {
            id: id.to_string(),
            url: url.to_string(),
            ws_url: None,
        }
    }

    #[test]
    fn test_first_match_in_listing_order() {
        let targets = vec![
            target("t1", "https://example.com/"),
            target("t2", "https://music.youtube.com/watch?v=a"),
            target("t3", "https://music.youtube.com/watch?v=b"),
        ];
        let selected = select_target(&targets, ORIGIN, "sw.js").unwrap();
        assert_eq!(selected.id, "t2");
        // Deterministic across repeated identical inputs.
        assert_eq!(select_target(&targets, ORIGIN, "sw.js").unwrap().id, "t2");
    }

    #[test]
    fn test_service_worker_excluded() {
        let targets = vec![
            target("sw", "https://music.youtube.com/sw.js"),
            target("page", "https://music.youtube.com/library"),
        ];
        assert_eq!(select_target(&targets, ORIGIN, "sw.js").unwrap().id, "page");
    }

    #[test]
    fn test_only_service_worker_is_no_match() {
        let targets = vec![target("sw", "https://music.youtube.com/sw.js")];
        assert!(select_target(&targets, ORIGIN, "sw.js").is_none());
    }

    #[test]
    fn test_other_origins_do_not_qualify() {
        let targets = vec![
            target("t1", "https://www.youtube.com/watch?v=a"),
            target("t2", "chrome-extension://abc/page.html"),
        ];
        assert!(select_target(&targets, ORIGIN, "sw.js").is_none());
    }
}
