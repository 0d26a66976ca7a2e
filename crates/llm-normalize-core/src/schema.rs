//! Declarative field and schema specifications.
//!
//! A [`SchemaSpec`] describes one producer-facing contract as an ordered list
//! of [`FieldSpec`]s. Specs are built in code (see [`crate::contracts`]) or
//! loaded from JSON, and are validated once at construction so normalization
//! can rely on them without further checks.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "name": "quality-review",
//!   "primary-field": "summary",
//!   "fields": [
//!     { "name": "summary", "kind": { "type": "text", "max-len": 2000 } },
//!     { "name": "overall_score", "aliases": ["overallScore"],
//!       "kind": { "type": "number", "min": 0, "max": 100, "integer": true } },
//!     { "name": "verdict",
//!       "kind": { "type": "enum", "table": {
//!         "canonical": ["pass", "fail"], "catch-all": "fail" } } }
//!   ]
//! }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::canonical::SynonymTable;
use crate::constraints::{CardinalityPolicy, RangePolicy};
use crate::error::SpecError;
use crate::normalizer::project_default;
use crate::schema_utils::child_path;

/// The expected shape of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum FieldKind {
    /// Free text; truncated to `max_len` characters.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_len: Option<usize>,
        /// Blank strings count as absent.
        #[serde(default)]
        non_empty: bool,
    },
    /// A finite number, optionally bounded and optionally integral.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default)]
        integer: bool,
        #[serde(default)]
        out_of_range: RangePolicy,
    },
    Bool,
    /// One member of a canonical set.
    Enum { table: Arc<SynonymTable> },
    /// A homogeneous list with optional cardinality bounds.
    List {
        item: Box<FieldKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
        #[serde(default)]
        on_violation: CardinalityPolicy,
    },
    /// A nested object; only the declared fields are kept.
    Object { fields: Vec<FieldSpec> },
}

impl FieldKind {
    pub fn text() -> Self {
        Self::Text {
            max_len: None,
            non_empty: false,
        }
    }

    pub fn bounded_text(max_len: usize) -> Self {
        Self::Text {
            max_len: Some(max_len),
            non_empty: false,
        }
    }

    /// A number clamped into `[min, max]`.
    pub fn number(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Number {
            min,
            max,
            integer: false,
            out_of_range: RangePolicy::Clamp,
        }
    }

    /// An integer clamped into `[min, max]`, e.g. a 0–100 score.
    pub fn integer(min: f64, max: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: Some(max),
            integer: true,
            out_of_range: RangePolicy::Clamp,
        }
    }

    pub fn boolean() -> Self {
        Self::Bool
    }

    pub fn enumeration(table: Arc<SynonymTable>) -> Self {
        Self::Enum { table }
    }

    pub fn list(item: FieldKind) -> Self {
        Self::List {
            item: Box::new(item),
            min_items: None,
            max_items: None,
            on_violation: CardinalityPolicy::Reject,
        }
    }

    pub fn object(fields: Vec<FieldSpec>) -> Self {
        Self::Object { fields }
    }

    /// Text only: treat blank strings as absent. No effect on other kinds.
    pub fn non_empty(mut self) -> Self {
        if let Self::Text { non_empty, .. } = &mut self {
            *non_empty = true;
        }
        self
    }

    /// Number only: treat out-of-range values as absent instead of clamping.
    pub fn reject_out_of_range(mut self) -> Self {
        if let Self::Number { out_of_range, .. } = &mut self {
            *out_of_range = RangePolicy::Reject;
        }
        self
    }

    /// List only: set cardinality bounds and the policy applied when they are violated.
    pub fn items(
        mut self,
        min: Option<usize>,
        max: Option<usize>,
        policy: CardinalityPolicy,
    ) -> Self {
        if let Self::List {
            min_items,
            max_items,
            on_violation,
            ..
        } = &mut self
        {
            *min_items = min;
            *max_items = max;
            *on_violation = policy;
        }
        self
    }

    /// Short name used in warnings.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "string",
            Self::Number { integer: true, .. } => "integer",
            Self::Number { .. } => "number",
            Self::Bool => "boolean",
            Self::Enum { .. } => "string",
            Self::List { .. } => "array",
            Self::Object { .. } => "object",
        }
    }
}

/// One expected field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldSpec {
    pub name: String,
    /// Alternate keys the producer may use (e.g. `overallScore` for `overall_score`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub kind: FieldKind,
    /// Explicit default. `null` is allowed for every kind.
    #[serde(
        default,
        deserialize_with = "explicit_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    /// Inside a list element: an element whose required field had to be
    /// defaulted is dropped from the list.
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            kind,
            default: None,
            required: false,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Default to `null` instead of the kind's natural default.
    pub fn nullable(self) -> Self {
        self.with_default(Value::Null)
    }

    /// Every key this field answers to, canonical name first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Keep an explicit `null` as `Some(Value::Null)`; absence stays `None` via `default`.
fn explicit_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// An ordered, validated list of fields describing one producer contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchemaSpec", into = "RawSchemaSpec")]
pub struct SchemaSpec {
    name: String,
    fields: Vec<FieldSpec>,
    primary_field: Option<String>,
}

impl SchemaSpec {
    /// Build and validate a spec.
    ///
    /// `primary_field`, when given, must name a top-level text field. It
    /// receives the raw producer text when extraction falls back, and is the
    /// default live field while streaming.
    pub fn new(
        name: &str,
        fields: Vec<FieldSpec>,
        primary_field: Option<&str>,
    ) -> Result<Self, SpecError> {
        validate_fields(&fields, "")?;

        if let Some(primary) = primary_field {
            let is_text = fields
                .iter()
                .any(|f| f.name == primary && matches!(f.kind, FieldKind::Text { .. }));
            if !is_text {
                return Err(SpecError::InvalidPrimaryField {
                    field: primary.to_string(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            fields,
            primary_field: primary_field.map(str::to_string),
        })
    }

    /// Load a spec from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let raw: RawSchemaSpec = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_field(&self) -> Option<&str> {
        self.primary_field.as_deref()
    }
}

fn validate_fields(fields: &[FieldSpec], parent: &str) -> Result<(), SpecError> {
    let mut seen: Vec<&str> = Vec::new();
    for field in fields {
        let path = child_path(parent, &field.name);
        for key in field.keys() {
            if seen.contains(&key) {
                return Err(SpecError::DuplicateField {
                    path: child_path(parent, key),
                });
            }
            seen.push(key);
        }
        validate_kind(&field.kind, &path)?;

        if let Some(default) = &field.default {
            if !default.is_null() && project_default(default, &field.kind).is_none() {
                return Err(SpecError::InvalidDefault {
                    path,
                    message: format!(
                        "{} does not satisfy the field's {} constraints",
                        default,
                        field.kind.type_name()
                    ),
                });
            }
        }
    }
    Ok(())
}

fn validate_kind(kind: &FieldKind, path: &str) -> Result<(), SpecError> {
    match kind {
        FieldKind::Number {
            min, max, integer, ..
        } => {
            for bound in [min, max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(SpecError::InvalidBounds {
                        path: path.to_string(),
                        message: format!("bound {} is not finite", bound),
                    });
                }
                if *integer && bound.fract() != 0.0 {
                    return Err(SpecError::InvalidBounds {
                        path: path.to_string(),
                        message: format!("integer field has fractional bound {}", bound),
                    });
                }
            }
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    return Err(SpecError::InvalidBounds {
                        path: path.to_string(),
                        message: format!("min {} exceeds max {}", lo, hi),
                    });
                }
            }
            Ok(())
        }
        FieldKind::List {
            item,
            min_items,
            max_items,
            ..
        } => {
            if let (Some(lo), Some(hi)) = (min_items, max_items) {
                if lo > hi {
                    return Err(SpecError::InvalidBounds {
                        path: path.to_string(),
                        message: format!("min-items {} exceeds max-items {}", lo, hi),
                    });
                }
            }
            validate_kind(item, &format!("{}/*", path))
        }
        FieldKind::Object { fields } => validate_fields(fields, path),
        FieldKind::Text { .. } | FieldKind::Bool | FieldKind::Enum { .. } => Ok(()),
    }
}

/// Wire shape of a spec, validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSchemaSpec {
    name: String,
    fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_field: Option<String>,
}

impl TryFrom<RawSchemaSpec> for SchemaSpec {
    type Error = SpecError;

    fn try_from(raw: RawSchemaSpec) -> Result<Self, Self::Error> {
        SchemaSpec::new(&raw.name, raw.fields, raw.primary_field.as_deref())
    }
}

impl From<SchemaSpec> for RawSchemaSpec {
    fn from(spec: SchemaSpec) -> Self {
        Self {
            name: spec.name,
            fields: spec.fields,
            primary_field: spec.primary_field,
        }
    }
}
