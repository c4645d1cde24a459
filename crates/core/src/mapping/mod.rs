//! Declarative translation of canonical metadata into tracker ids.
//!
//! Tables are static per tracker. A lookup that finds no rule yields
//! [`Mapped::Unsupported`], which the orchestrator turns into
//! [`UploadError::MappingUnsupported`] before any request is sent.

use std::collections::BTreeSet;
use std::fmt;

use crate::tracker::UploadError;

/// Result of a mapping rule: an id, or the "no valid mapping" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapped<T> {
    Id(T),
    Unsupported,
}

impl<T> Mapped<T> {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }

    pub fn id(self) -> Option<T> {
        match self {
            Self::Id(id) => Some(id),
            Self::Unsupported => None,
        }
    }

    /// Turn the sentinel into a classified error for `slot`.
    pub fn require(self, tracker: &str, slot: &'static str) -> Result<T, UploadError> {
        match self {
            Self::Id(id) => Ok(id),
            Self::Unsupported => Err(UploadError::MappingUnsupported {
                tracker: tracker.to_string(),
                slot,
            }),
        }
    }

    /// Later rules override earlier ones: replace the current value when `cond` holds.
    pub fn override_if(self, cond: bool, id: T) -> Self {
        if cond {
            Self::Id(id)
        } else {
            self
        }
    }
}

impl<T> From<Option<T>> for Mapped<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unsupported, Self::Id)
    }
}

/// Static key/value table. Order is irrelevant; keys are matched exactly.
#[derive(Debug)]
pub struct MappingTable<V: 'static> {
    entries: &'static [(&'static str, V)],
}

impl<V: Copy + 'static> MappingTable<V> {
    pub const fn new(entries: &'static [(&'static str, V)]) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn lookup(&self, key: &str) -> Mapped<V> {
        self.get(key).into()
    }

    pub fn lookup_or(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }
}

/// Ids computed for one submission.
///
/// Only `category` is required by every tracker; the other slots are filled
/// by adapters whose site asks for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedIds {
    pub category: u32,
    pub codec: Option<u32>,
    pub medium: Option<u32>,
    pub resolution: Option<u32>,
    pub tags: BTreeSet<u32>,
}

impl fmt::Display for MappedIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category={}", self.category)?;
        if let Some(codec) = self.codec {
            write!(f, " codec={codec}")?;
        }
        if let Some(medium) = self.medium {
            write!(f, " medium={medium}")?;
        }
        if let Some(resolution) = self.resolution {
            write!(f, " resolution={resolution}")?;
        }
        if !self.tags.is_empty() {
            write!(f, " tags={:?}", self.tags)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CODECS: MappingTable<u32> = MappingTable::new(&[("AVC", 1), ("HEVC", 5)]);

    #[test]
    fn test_table_lookup() {
        assert_eq!(CODECS.lookup("HEVC"), Mapped::Id(5));
        assert_eq!(CODECS.lookup("AV1"), Mapped::Unsupported);
        assert_eq!(CODECS.lookup_or("AV1", 0), 0);
        assert!(CODECS.contains("AVC"));
    }

    #[test]
    fn test_require_classifies_sentinel() {
        let err = CODECS.lookup("AV1").require("HDB", "codec").unwrap_err();
        match err {
            UploadError::MappingUnsupported { tracker, slot } => {
                assert_eq!(tracker, "HDB");
                assert_eq!(slot, "codec");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_override_order() {
        let category = Mapped::Id(4).override_if(true, 20).override_if(false, 26);
        assert_eq!(category, Mapped::Id(20));

        let rescued = Mapped::<u32>::Unsupported.override_if(true, 3);
        assert_eq!(rescued, Mapped::Id(3));
    }

    #[test]
    fn test_display_ids() {
        let ids = MappedIds {
            category: 1,
            codec: Some(5),
            tags: [9, 6].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(ids.to_string(), "category=1 codec=5 tags={6, 9}");
    }
}
