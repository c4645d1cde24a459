//! On-disk session artifact.
//!
//! Reads Netscape `cookies.txt` exports (as browsers' extensions produce them)
//! and plain `name=value` lines; always writes `name=value` lines.

use std::io;
use std::path::{Path, PathBuf};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use tracing::debug;

use crate::context::write_atomic;

use super::SessionError;

/// Session cookies of one tracker.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn load(&self) -> Result<Vec<(String, String)>, SessionError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.error(e))?;
        Ok(parse_cookie_lines(&text))
    }

    /// Load the artifact into `jar`, scoped to `url`. Returns the cookie count.
    pub async fn load_into(&self, jar: &Jar, url: &Url) -> Result<usize, SessionError> {
        let cookies = self.load().await?;
        for (name, value) in &cookies {
            jar.add_cookie_str(&format!("{name}={value}; Path=/"), url);
        }
        debug!(path = %self.path.display(), count = cookies.len(), "Loaded session cookies");
        Ok(cookies.len())
    }

    /// Persist the cookies `jar` would send to `url`. Returns the cookie count.
    pub async fn save_from(&self, jar: &Jar, url: &Url) -> Result<usize, SessionError> {
        let header = jar
            .cookies(url)
            .and_then(|h| h.to_str().ok().map(str::to_string))
            .unwrap_or_default();
        let cookies = parse_cookie_header(&header);

        let mut text = String::new();
        for (name, value) in &cookies {
            text.push_str(&format!("{name}={value}\n"));
        }
        write_atomic(&self.path, text.as_bytes())
            .await
            .map_err(|e| self.error(e))?;
        debug!(path = %self.path.display(), count = cookies.len(), "Saved session cookies");
        Ok(cookies.len())
    }

    /// Delete the artifact. A missing file is not an error.
    pub async fn remove(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, source: io::Error) -> SessionError {
        SessionError::CookieFile {
            path: self.path.clone(),
            source,
        }
    }
}

/// Parse Netscape or `name=value` cookie lines.
pub fn parse_cookie_lines(text: &str) -> Vec<(String, String)> {
    let mut cookies = Vec::new();
    for raw in text.lines() {
        let line = raw.strip_prefix("#HttpOnly_").unwrap_or(raw).trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() == 7 {
            cookies.push((fields[5].to_string(), fields[6].to_string()));
        } else if let Some((name, value)) = line.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                cookies.push((name.to_string(), value.trim().to_string()));
            }
        }
    }
    cookies
}

fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
