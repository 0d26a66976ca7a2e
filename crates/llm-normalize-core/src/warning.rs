//! Warning types emitted when normalization corrects a producer deviation.

use serde::{Deserialize, Serialize};

/// A non-fatal record of one field that had to be corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// JSON Pointer to the corrected field (e.g. "/findings/0/severity");
    /// empty for the record root.
    pub path: String,
    /// Classification of the warning.
    pub kind: WarningKind,
    /// Human-readable description of the correction.
    pub message: String,
}

/// Classification of normalization warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WarningKind {
    /// The key was absent; the default was used.
    Missing,
    /// The key was present with the wrong JSON type; treated as absent.
    WrongType {
        expected: String,
        found: String,
    },
    /// A blank string was given for a field that must not be empty.
    Blank,
    /// A number was pulled to the nearest bound.
    Clamped,
    /// A number fell outside bounds on a field that rejects instead of clamping.
    OutOfRange,
    /// A string was cut to its maximum length.
    Truncated,
    /// A list had too few or too many valid elements and was replaced by its default.
    CardinalityRejected {
        count: usize,
    },
    /// A list element failed validation and was removed.
    ElementDropped,
    /// A declared synonym was mapped onto its canonical value.
    EnumSynonym {
        from: String,
        to: String,
    },
    /// An unrecognized value was mapped to the catch-all member.
    EnumUnrecognized {
        found: String,
    },
}

impl Warning {
    pub(crate) fn new(path: &str, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            kind,
            message: message.into(),
        }
    }
}
