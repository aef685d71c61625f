//! Re-fetches the schedule API response the page itself requested.
//!
//! The fetcher only knows how to GET a URL and pull the `workouts` array out
//! of the JSON body. Authentication and the original request are the page's
//! business; we simply replay the URL we were handed.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::model::{WorkoutCollection, WorkoutRecord};
use crate::{Error, OverlayConfig, Result};

#[derive(Deserialize)]
struct SchedulePayload {
    #[serde(default)]
    workouts: Option<Vec<WorkoutRecord>>,
}

/// Parse a schedule payload.
///
/// Returns `Ok(None)` when the body is valid JSON but carries no `workouts`
/// array; callers treat that as "nothing to render".
pub fn parse_payload(body: &str) -> Result<Option<WorkoutCollection>> {
    let payload: SchedulePayload = serde_json::from_str(body)?;
    Ok(payload.workouts.map(WorkoutCollection::new))
}

/// HTTP fetcher for workout payloads
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &OverlayConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::ConfigError(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::ConfigError(format!("Invalid header value for {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET `url` and return the response body as text
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("unsupported scheme in {}", url)));
        }

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NetworkError(format!("{} returned HTTP {}", url, status)));
        }

        resp.text()
            .await
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))
    }

    /// Fetch and parse the workout payload at `url`
    pub async fn fetch(&self, url: &str) -> Result<Option<WorkoutCollection>> {
        let body = self.fetch_text(url).await?;
        parse_payload(&body)
    }
}
