//! Editable model of a v1 metainfo file.

use serde::{Deserialize, Serialize};
use serde_bencode::value::Value;
use serde_bytes::ByteBuf;

use super::TorrentError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metainfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce: Option<String>,
    #[serde(
        rename = "announce-list",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub announce_list: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "created by", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(
        rename = "creation date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<i64>,
    pub info: Info,
}

// Fields are declared in bencode key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    pub name: String,
    #[serde(rename = "piece length")]
    pub piece_length: u64,
    pub pieces: ByteBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub length: u64,
    pub path: Vec<String>,
}

impl Metainfo {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TorrentError> {
        serde_bencode::from_bytes(bytes).map_err(|e| TorrentError::Parse(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TorrentError> {
        serde_bencode::to_bytes(self).map_err(|e| TorrentError::Encode(e.to_string()))
    }

    pub fn total_size(&self) -> u64 {
        match &self.info.files {
            Some(files) => files.iter().map(|f| f.length).sum(),
            None => self.info.length.unwrap_or(0),
        }
    }
}

/// Tracker-specific labels applied to a copied torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relabel {
    pub announce: String,
    pub source: String,
    pub comment: Option<String>,
    pub private: bool,
}

/// Point an existing torrent at one tracker.
///
/// Works on the raw bencode tree so keys this model does not name (padding
/// attributes, `*.utf-8` paths, v2 file trees) are written back untouched.
/// Only `announce`, `announce-list`, `comment` and `info.source`/`info.private`
/// change.
pub fn relabel_bytes(bytes: &[u8], label: &Relabel) -> Result<Vec<u8>, TorrentError> {
    let mut root: Value =
        serde_bencode::from_bytes(bytes).map_err(|e| TorrentError::Parse(e.to_string()))?;
    let Value::Dict(dict) = &mut root else {
        return Err(TorrentError::Parse("metainfo is not a dictionary".into()));
    };

    dict.insert(
        b"announce".to_vec(),
        Value::Bytes(label.announce.as_bytes().to_vec()),
    );
    dict.remove(b"announce-list".as_slice());
    match &label.comment {
        Some(comment) => {
            dict.insert(b"comment".to_vec(), Value::Bytes(comment.as_bytes().to_vec()));
        }
        None => {
            dict.remove(b"comment".as_slice());
        }
    }

    let Some(Value::Dict(info)) = dict.get_mut(b"info".as_slice()) else {
        return Err(TorrentError::Parse("missing info dictionary".into()));
    };
    info.insert(
        b"source".to_vec(),
        Value::Bytes(label.source.as_bytes().to_vec()),
    );
    if label.private {
        info.insert(b"private".to_vec(), Value::Int(1));
    }

    serde_bencode::to_bytes(&root).map_err(|e| TorrentError::Encode(e.to_string()))
}
