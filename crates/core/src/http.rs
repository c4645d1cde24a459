//! HTTP plumbing shared by sessions and tracker adapters.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::Client;

use crate::config::HttpConfig;

/// Mandatory pause after each login step.
pub const LOGIN_PAUSE: Duration = Duration::from_millis(500);

/// Mandatory pause after each search request.
pub const SEARCH_PAUSE: Duration = Duration::from_millis(500);

/// Client sharing `jar` as its cookie store.
///
/// No client-wide timeout: search and validation requests set their own,
/// uploads use [`HttpConfig::upload_timeout_secs`] when configured.
pub fn build_client(jar: Arc<Jar>, config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .cookie_provider(jar)
        .user_agent(config.user_agent.clone())
        .build()
}

/// Fixed delay between requests.
pub async fn pause(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Human-readable classification of a transport failure.
pub fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

pub fn secs(value: u32) -> Duration {
    Duration::from_secs(u64::from(value))
}
