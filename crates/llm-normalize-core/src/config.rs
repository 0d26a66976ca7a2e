//! Configuration for document extraction.

use serde::{Deserialize, Serialize};

/// Options for [`crate::extract_document_with`].
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `scan-prose`, `max-candidates`)
/// so the same shape works from config files and the WASM boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractOptions {
    /// Search free text for balanced `{...}` spans when neither a fenced
    /// block nor the whole input decodes. Default: true.
    pub scan_prose: bool,
    /// Maximum number of brace spans tried during prose scanning.
    /// Bounds the work on long, brace-heavy answers. Default: 8.
    pub max_candidates: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scan_prose: true,
            max_candidates: 8,
        }
    }
}
