//! HDBits JSON API and image host.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::description::{DescriptionError, ImageHost};
use crate::http::describe;

/// `{"id": N}` as the API nests external ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: u64,
}

/// The API sends ids as numbers, strings, or null.
fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
        Null,
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => n,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        Some(Raw::Null) | None => 0,
    })
}

/// Body of a `api/torrents` query. Absent fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentQuery {
    pub username: String,
    pub passkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<ExternalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<ExternalRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TorrentList {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub data: Vec<TorrentEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TorrentEntry {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub imdb: Option<ExternalRef>,
    #[serde(default)]
    pub tvdb: Option<ExternalRef>,
}

/// Identifiers of a release already on the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdbTorrentInfo {
    pub id: u64,
    /// `0` when absent.
    pub imdb: u64,
    /// `0` when absent.
    pub tvdb: u64,
    pub name: String,
    /// File name the site serves the torrent under.
    pub filename: String,
    pub hash: String,
}

impl From<TorrentEntry> for HdbTorrentInfo {
    fn from(entry: TorrentEntry) -> Self {
        Self {
            id: entry.id,
            imdb: entry.imdb.map(|r| r.id).unwrap_or(0),
            tvdb: entry.tvdb.map(|r| r.id).unwrap_or(0),
            name: entry.name,
            filename: entry.filename,
            hash: entry.hash,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub passkey: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    #[serde(default = "unknown_status")]
    pub status: i64,
}

fn unknown_status() -> i64 {
    5
}

/// `img.hdbits.org` uploader; returns gallery BBCode.
pub struct HdbImageHost {
    pub(super) upload_url: String,
    pub(super) credentials: Credentials,
    pub(super) client: Client,
}

#[async_trait]
impl ImageHost for HdbImageHost {
    async fn rehost(&self, images: &[PathBuf], gallery_name: &str) -> Result<String, DescriptionError> {
        let mut form = Form::new()
            .text("username", self.credentials.username.clone())
            .text("passkey", self.credentials.passkey.clone())
            .text("galleryoption", "1")
            .text("galleryname", gallery_name.to_string())
            .text("thumbsize", "w300");

        for (i, path) in images.iter().enumerate() {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| DescriptionError::Read {
                    path: path.clone(),
                    source: e,
                })?;
            let part = Part::bytes(bytes)
                .file_name(format!("image_{i}.png"))
                .mime_str("image/png")
                .map_err(|e| DescriptionError::ImageHost(e.to_string()))?;
            form = form.part(format!("images_files[{i}]"), part);
        }

        debug!(url = %self.upload_url, images = images.len(), "Rehosting images");
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DescriptionError::ImageHost(describe(&e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DescriptionError::ImageHost(describe(&e)))?;
        if !status.is_success() {
            return Err(DescriptionError::ImageHost(format!("image host returned {status}")));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_omits_absent_fields() {
        let query = TorrentQuery {
            username: "user".into(),
            passkey: "key".into(),
            category: Some(1),
            imdb: Some(ExternalRef { id: 113277 }),
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "user",
                "passkey": "key",
                "category": 1,
                "imdb": {"id": 113277}
            })
        );
    }

    #[test]
    fn test_parse_torrent_list() {
        let body = r#"{"status":0,"data":[
            {"id":123,"name":"Heat 1995 1080p BluRay Remux","filename":"Heat.torrent",
             "hash":"ABCDEF","imdb":{"id":"113277"},"tvdb":null}
        ]}"#;
        let list: TorrentList = serde_json::from_str(body).unwrap();
        let info = HdbTorrentInfo::from(list.data[0].clone());
        assert_eq!(info.id, 123);
        assert_eq!(info.imdb, 113277);
        assert_eq!(info.tvdb, 0);
        assert_eq!(info.hash, "ABCDEF");
        assert_eq!(info.filename, "Heat.torrent");
    }
}
