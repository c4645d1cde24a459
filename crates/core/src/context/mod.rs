//! Release metadata and the artifacts derived from it.

mod artifacts;
mod tracks;
mod types;

pub use artifacts::{cookie_path, write_atomic, ArtifactPaths};
pub use tracks::{regional_tracks, RegionalTracks};
pub use types::*;
