//! Record path construction shared by the normalizer and spec validation.
//!
//! Warning paths are JSON Pointers (RFC 6901) into the normalized record,
//! e.g. `/findings/0/severity`.

use std::borrow::Cow;

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Append one escaped segment to a parent pointer.
///
/// # Example
/// ```
/// use llm_normalize_core::child_path;
/// assert_eq!(child_path("", "findings"), "/findings");
/// assert_eq!(child_path("/findings", "a/b"), "/findings/a~1b");
/// ```
pub fn child_path(parent: &str, segment: &str) -> String {
    let escaped = escape_pointer_segment(segment);
    let mut path = String::with_capacity(parent.len() + escaped.len() + 1);
    path.push_str(parent);
    path.push('/');
    path.push_str(&escaped);
    path
}

/// Append an array index to a parent pointer.
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}/{}", parent, index)
}
