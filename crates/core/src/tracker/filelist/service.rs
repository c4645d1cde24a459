//! FileList's description service: renders MediaInfo and hosts screenshots.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::config::{DescriptionServiceConfig, HttpConfig};
use crate::description::{DescriptionError, ImageHost};
use crate::http::{build_client, describe};

pub struct DescriptionService {
    config: DescriptionServiceConfig,
    client: Client,
}

impl DescriptionService {
    pub fn new(config: &DescriptionServiceConfig, http: &HttpConfig) -> Result<Self, DescriptionError> {
        let client = build_client(Arc::new(Jar::default()), http)
            .map_err(|e| DescriptionError::ImageHost(e.to_string()))?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// BBCode for `mediainfo` (when given) followed by the hosted `images`.
    pub async fn render(
        &self,
        mediainfo: Option<&str>,
        imdb: Option<String>,
        images: &[PathBuf],
    ) -> Result<String, DescriptionError> {
        let mut form = Form::new();
        if let Some(mediainfo) = mediainfo {
            form = form.text("mediainfo", mediainfo.to_string());
        }
        if let Some(imdb) = imdb {
            form = form.text("imdbURL", imdb);
        }
        for path in images {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| DescriptionError::Read {
                    path: path.clone(),
                    source: e,
                })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let part = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str("image/png")
                .map_err(|e| DescriptionError::ImageHost(e.to_string()))?;
            form = form.part("images", part);
        }

        debug!(url = %self.config.url, images = images.len(), "Rendering description");
        let response = self
            .client
            .post(&self.config.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DescriptionError::ImageHost(describe(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DescriptionError::ImageHost(describe(&e)))?;
        if !status.is_success() {
            return Err(DescriptionError::ImageHost(format!(
                "description service returned {status}"
            )));
        }
        Ok(text.replace("\r\n", "\n"))
    }
}

#[async_trait]
impl ImageHost for DescriptionService {
    async fn rehost(&self, images: &[PathBuf], _gallery_name: &str) -> Result<String, DescriptionError> {
        self.render(None, None, images).await
    }
}
