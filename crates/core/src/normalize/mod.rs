//! Attribute normalization shared by every tracker adapter.

mod resolution;

pub use resolution::{
    normalize_resolution, Fallback, ResolutionInput, ANOMALOUS_HEIGHT, CANONICAL_RESOLUTIONS,
    FALLBACKS, MAX_RESOLUTION_HOPS, OTHER,
};
