//! Composition of a tracker description from its parts.

use std::path::{Path, PathBuf};

use crate::context::{write_atomic, DiscKind, DiscReport, ImageLink};

use super::{DescriptionError, MarkupNormalizer};

/// Where disc report blocks go relative to the free-text body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscPlacement {
    BeforeBody,
    AfterBody,
}

/// Screenshot section appended after body and discs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gallery {
    None,
    /// Pre-hosted images as `[url=web][img]img[/img][/url]`, first `limit` only.
    Links { images: Vec<ImageLink>, limit: usize },
    /// BBCode returned by an image host.
    Rehosted(String),
}

impl Gallery {
    fn render(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Links { images, limit } => {
                if images.is_empty() || *limit == 0 {
                    return None;
                }
                let links: String = images
                    .iter()
                    .take(*limit)
                    .map(|i| format!("[url={}][img]{}[/img][/url]", i.web_url, i.img_url))
                    .collect();
                Some(format!("[center]{links}[/center]"))
            }
            Self::Rehosted(bbcode) => (!bbcode.trim().is_empty()).then(|| bbcode.clone()),
        }
    }
}

/// Builder for one tracker description.
///
/// Markup normalization runs on the body only; header, disc blocks and
/// gallery are written verbatim.
pub struct DescriptionAssembler<'a> {
    normalizer: &'a dyn MarkupNormalizer,
    placement: DiscPlacement,
    header: Option<String>,
    body: String,
    disc_blocks: Vec<String>,
    mediainfo: Option<String>,
    gallery: Gallery,
    signature: Option<String>,
}

impl<'a> DescriptionAssembler<'a> {
    pub fn new(normalizer: &'a dyn MarkupNormalizer, placement: DiscPlacement) -> Self {
        Self {
            normalizer,
            placement,
            header: None,
            body: String::new(),
            disc_blocks: Vec::new(),
            mediainfo: None,
            gallery: Gallery::None,
            signature: None,
        }
    }

    pub fn header(mut self, header: Option<String>) -> Self {
        self.header = header;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Disc blocks, in disc-index order.
    pub fn discs(mut self, blocks: Vec<String>) -> Self {
        self.disc_blocks = blocks;
        self
    }

    pub fn mediainfo(mut self, mediainfo: Option<String>) -> Self {
        self.mediainfo = mediainfo.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn gallery(mut self, gallery: Gallery) -> Self {
        self.gallery = gallery;
        self
    }

    pub fn signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature.filter(|s| !s.is_empty());
        self
    }

    pub fn assemble(&self) -> String {
        let body = self.normalizer.normalize(&self.body);
        let discs: String = self.disc_blocks.concat();

        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
        }
        match self.placement {
            DiscPlacement::BeforeBody => {
                out.push_str(&discs);
                out.push_str(&body);
            }
            DiscPlacement::AfterBody => {
                out.push_str(&body);
                out.push_str(&discs);
            }
        }
        if let Some(mediainfo) = &self.mediainfo {
            out.push_str(&format!("\n[quote]{}[/quote]\n", mediainfo.trim()));
        }
        if let Some(gallery) = self.gallery.render() {
            out.push_str(&gallery);
        }
        if let Some(signature) = &self.signature {
            out.push_str(signature);
        }
        out
    }

    /// Assemble and write atomically to `path`.
    pub async fn write_to(&self, path: &Path) -> Result<PathBuf, DescriptionError> {
        let text = self.assemble();
        write_atomic(path, text.as_bytes())
            .await
            .map_err(|e| DescriptionError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(path.to_path_buf())
    }
}

/// Quote blocks for every disc: the first disc unlabeled, extra discs
/// labeled by name.
pub fn disc_quote_blocks(discs: &[DiscReport]) -> Vec<String> {
    let mut blocks = Vec::new();
    let Some(first) = discs.first() else {
        return blocks;
    };

    match first.kind {
        DiscKind::Dvd => blocks.push(format!("[quote=VOB MediaInfo]{}[/quote]\n\n", first.vob_mi)),
        DiscKind::Bdmv => blocks.push(format!("[quote]{}[/quote]\n\n", first.summary.trim())),
        DiscKind::HdDvd => {}
    }

    for disc in discs.iter().skip(1) {
        match disc.kind {
            DiscKind::Bdmv => {
                let name = if disc.name.is_empty() { "BDINFO" } else { disc.name.as_str() };
                blocks.push(format!("[quote={name}]{}[/quote]\n\n", disc.summary));
            }
            DiscKind::Dvd => blocks.push(format!(
                "{}:\n[quote=VOB]{}[/quote] [quote=IFO]{}[/quote]\n\n",
                disc.name, disc.vob_mi, disc.ifo_mi
            )),
            DiscKind::HdDvd => {}
        }
    }
    blocks
}
