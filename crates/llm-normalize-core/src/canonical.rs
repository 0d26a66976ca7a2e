//! Enum canonicalization: maps producer labels onto a fixed canonical set.
//!
//! A [`SynonymTable`] is plain data: the canonical members, a one-directional
//! synonym map, and the catch-all member that absorbs everything else. Tables
//! are built once (usually in a `static`) and shared by reference, so every
//! enum field in every schema goes through the same mechanism.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SpecError;

/// Declarative canonical set with synonyms and a catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSynonymTable", into = "RawSynonymTable")]
pub struct SynonymTable {
    canonical: Vec<String>,
    synonyms: BTreeMap<String, String>,
    catch_all: String,
}

/// How a producer value was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The value already was a canonical member.
    Exact,
    /// The value was a declared synonym.
    Synonym,
    /// Unknown, non-string or missing; mapped to the catch-all.
    CatchAll,
}

/// Result of [`canonicalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonicalized<'t> {
    pub value: &'t str,
    pub resolution: Resolution,
}

/// Map a raw producer value onto a canonical member of `table`.
///
/// Matching ignores surrounding whitespace and ASCII case. Canonical members
/// map to themselves, so canonicalizing an already-canonical value is a no-op.
/// Anything that is not a string, or is not a member or synonym, resolves to
/// the table's catch-all.
pub fn canonicalize<'t>(raw: &Value, table: &'t SynonymTable) -> Canonicalized<'t> {
    match raw.as_str() {
        Some(s) => table.resolve(s),
        None => Canonicalized {
            value: &table.catch_all,
            resolution: Resolution::CatchAll,
        },
    }
}

impl SynonymTable {
    /// Start a table from its canonical members and catch-all.
    pub fn builder<I, S>(canonical: I, catch_all: &str) -> SynonymTableBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SynonymTableBuilder {
            canonical: canonical.into_iter().map(|s| fold(s.as_ref())).collect(),
            synonyms: BTreeMap::new(),
            catch_all: fold(catch_all),
        }
    }

    /// Canonical members, in declaration order.
    pub fn canonical(&self) -> &[String] {
        &self.canonical
    }

    pub fn catch_all(&self) -> &str {
        &self.catch_all
    }

    pub fn synonyms(&self) -> &BTreeMap<String, String> {
        &self.synonyms
    }

    pub fn is_canonical(&self, value: &str) -> bool {
        self.canonical.iter().any(|c| c == value)
    }

    /// Resolve a producer string.
    pub fn resolve(&self, raw: &str) -> Canonicalized<'_> {
        let key = fold(raw);
        if let Some(member) = self.canonical.iter().find(|c| **c == key) {
            return Canonicalized {
                value: member,
                resolution: Resolution::Exact,
            };
        }
        if let Some(target) = self.synonyms.get(&key) {
            return Canonicalized {
                value: target,
                resolution: Resolution::Synonym,
            };
        }
        Canonicalized {
            value: &self.catch_all,
            resolution: Resolution::CatchAll,
        }
    }
}

/// Builder for [`SynonymTable`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SynonymTableBuilder {
    canonical: Vec<String>,
    synonyms: BTreeMap<String, String>,
    catch_all: String,
}

impl SynonymTableBuilder {
    /// Declare `alias` as a synonym of the canonical member `target`.
    pub fn synonym(mut self, alias: &str, target: &str) -> Self {
        self.synonyms.insert(fold(alias), fold(target));
        self
    }

    /// Declare several aliases for one canonical member.
    pub fn synonyms(mut self, aliases: &[&str], target: &str) -> Self {
        for alias in aliases {
            self.synonyms.insert(fold(alias), fold(target));
        }
        self
    }

    pub fn build(self) -> Result<SynonymTable, SpecError> {
        if self.canonical.is_empty() {
            return Err(SpecError::SynonymTable(
                "canonical set must not be empty".to_string(),
            ));
        }
        for (i, member) in self.canonical.iter().enumerate() {
            if member.is_empty() {
                return Err(SpecError::SynonymTable(
                    "canonical members must not be empty".to_string(),
                ));
            }
            if self.canonical[..i].contains(member) {
                return Err(SpecError::SynonymTable(format!(
                    "canonical member '{}' is declared twice",
                    member
                )));
            }
        }
        if !self.canonical.contains(&self.catch_all) {
            return Err(SpecError::SynonymTable(format!(
                "catch-all '{}' is not a canonical member",
                self.catch_all
            )));
        }
        for (alias, target) in &self.synonyms {
            if !self.canonical.contains(target) {
                return Err(SpecError::SynonymTable(format!(
                    "synonym '{}' targets '{}', which is not a canonical member",
                    alias, target
                )));
            }
            if self.canonical.contains(alias) {
                return Err(SpecError::SynonymTable(format!(
                    "synonym '{}' shadows a canonical member",
                    alias
                )));
            }
        }
        Ok(SynonymTable {
            canonical: self.canonical,
            synonyms: self.synonyms,
            catch_all: self.catch_all,
        })
    }
}

fn fold(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Wire shape of a table, validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSynonymTable {
    canonical: Vec<String>,
    #[serde(default)]
    synonyms: BTreeMap<String, String>,
    catch_all: String,
}

impl TryFrom<RawSynonymTable> for SynonymTable {
    type Error = SpecError;

    fn try_from(raw: RawSynonymTable) -> Result<Self, Self::Error> {
        let mut builder = SynonymTable::builder(&raw.canonical, &raw.catch_all);
        for (alias, target) in &raw.synonyms {
            builder = builder.synonym(alias, target);
        }
        builder.build()
    }
}

impl From<SynonymTable> for RawSynonymTable {
    fn from(table: SynonymTable) -> Self {
        Self {
            canonical: table.canonical,
            synonyms: table.synonyms,
            catch_all: table.catch_all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn severity() -> SynonymTable {
        SynonymTable::builder(["critical", "major", "minor", "info"], "info")
            .synonyms(&["blocker", "severe"], "critical")
            .synonym("high", "major")
            .synonyms(&["medium", "low"], "minor")
            .build()
            .unwrap()
    }

    #[test]
    fn test_synonyms_map_to_canonical() {
        let table = severity();
        assert_eq!(canonicalize(&json!("blocker"), &table).value, "critical");
        assert_eq!(canonicalize(&json!("high"), &table).value, "major");
        assert_eq!(canonicalize(&json!("medium"), &table).value, "minor");
        assert_eq!(canonicalize(&json!("low"), &table).value, "minor");
        assert_eq!(
            canonicalize(&json!("blocker"), &table).resolution,
            Resolution::Synonym
        );
    }

    #[test]
    fn test_unknown_maps_to_catch_all() {
        let table = severity();
        let c = canonicalize(&json!("banana"), &table);
        assert_eq!(c.value, "info");
        assert_eq!(c.resolution, Resolution::CatchAll);
        assert_eq!(canonicalize(&json!(3), &table).value, "info");
        assert_eq!(canonicalize(&Value::Null, &table).value, "info");
        assert_eq!(canonicalize(&json!(["critical"]), &table).value, "info");
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let table = severity();
        for member in table.canonical() {
            let once = canonicalize(&json!(member), &table);
            assert_eq!(once.value, member);
            assert_eq!(once.resolution, Resolution::Exact);
            let twice = canonicalize(&json!(once.value), &table);
            assert_eq!(twice.value, once.value);
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let table = severity();
        assert_eq!(canonicalize(&json!("  Critical "), &table).value, "critical");
        assert_eq!(canonicalize(&json!("BLOCKER"), &table).value, "critical");
    }

    #[test]
    fn test_catch_all_must_be_canonical() {
        let err = SynonymTable::builder(["a", "b"], "c").build().unwrap_err();
        assert!(matches!(err, SpecError::SynonymTable(_)));
    }

    #[test]
    fn test_synonym_target_must_be_canonical() {
        let err = SynonymTable::builder(["a", "b"], "a")
            .synonym("x", "z")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn test_synonym_may_not_shadow_member() {
        assert!(SynonymTable::builder(["a", "b"], "a")
            .synonym("b", "a")
            .build()
            .is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let table: SynonymTable = serde_json::from_value(json!({
            "canonical": ["pass", "fail"],
            "synonyms": { "approved": "pass" },
            "catch-all": "fail"
        }))
        .unwrap();
        assert_eq!(table.resolve("Approved").value, "pass");

        let bad: Result<SynonymTable, _> = serde_json::from_value(json!({
            "canonical": ["pass"],
            "catch-all": "unknown"
        }));
        assert!(bad.is_err());
    }
}
