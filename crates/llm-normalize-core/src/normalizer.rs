//! Schema normalizer: projects a loosely-typed decoded object onto a
//! `SchemaSpec`, producing a fully-typed, default-complete [`Record`].
//!
//! The producer's claimed types are never trusted. The input is first decoded
//! into an untyped `serde_json::Value`, then each declared field is projected
//! one at a time:
//!
//! | Input | Result |
//! |-------|--------|
//! | key absent | default, `Missing` warning |
//! | wrong JSON type | same as absent, `WrongType` warning |
//! | number out of bounds | clamped (`Clamped`) or rejected to default (`OutOfRange`) |
//! | string over `max_len` | truncated, `Truncated` warning |
//! | enum synonym / unknown | canonical member / catch-all |
//! | list element invalid | element removed, `ElementDropped` warning |
//! | list count out of bounds | whole list to default (`CardinalityRejected`) or truncated |
//! | undeclared key | ignored |
//!
//! Nothing here returns an error. The worst case is a fully defaulted record.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::canonical::{canonicalize, Resolution};
use crate::constraints::{
    check_cardinality, clamp_number, in_range, truncate_text, Cardinality, CardinalityPolicy,
    RangePolicy,
};
use crate::record::{FieldValue, Record};
use crate::schema::{FieldKind, FieldSpec, SchemaSpec};
use crate::schema_utils::{child_path, index_path};
use crate::warning::{Warning, WarningKind};

/// A normalized record and the corrections made while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    pub record: Record,
    pub warnings: Vec<Warning>,
}

/// Why a present value could not be used as-is.
#[derive(Debug)]
struct Rejection {
    kind: WarningKind,
    message: String,
}

impl Rejection {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn wrong_type(kind: &FieldKind, found: &Value) -> Self {
        let found = json_type_name(found);
        Self::new(
            WarningKind::WrongType {
                expected: kind.type_name().to_string(),
                found: found.to_string(),
            },
            format!("expected {}, found {}", kind.type_name(), found),
        )
    }
}

/// Normalize a decoded object against `spec`.
///
/// Never fails: a non-object root is treated as an empty object, and every
/// missing or invalid field takes its default.
pub fn normalize(raw: &Value, spec: &SchemaSpec) -> Normalized {
    let mut warnings = Vec::new();

    let empty = Map::new();
    let obj = match raw {
        Value::Object(map) => map,
        other => {
            push(
                &mut warnings,
                "",
                WarningKind::WrongType {
                    expected: "object".to_string(),
                    found: json_type_name(other).to_string(),
                },
                format!(
                    "document root is {}, not an object; all fields defaulted",
                    json_type_name(other)
                ),
            );
            &empty
        }
    };

    // Top-level `required` has nothing to reject into, so the outcome is ignored.
    let (record, _) = normalize_fields(obj, spec.fields(), "", &mut warnings);

    tracing::debug!(
        spec = %spec.name(),
        warnings = warnings.len(),
        "normalized record"
    );

    Normalized { record, warnings }
}

/// Default value of a field: its explicit default, else the kind's natural default.
pub fn default_for(field: &FieldSpec) -> FieldValue {
    match &field.default {
        Some(Value::Null) => FieldValue::Null,
        Some(value) => {
            project_default(value, &field.kind).unwrap_or_else(|| natural_default(&field.kind))
        }
        None => natural_default(&field.kind),
    }
}

/// Project an explicit default; `None` if it would need any correction.
///
/// A list default is exempt from its own cardinality bound, so `[]` is a
/// valid "no value" state even for a list with `min-items`. Its elements
/// must still be valid.
pub(crate) fn project_default(value: &Value, kind: &FieldKind) -> Option<FieldValue> {
    let unbounded;
    let kind = match kind {
        FieldKind::List {
            item, on_violation, ..
        } => {
            unbounded = FieldKind::List {
                item: item.clone(),
                min_items: None,
                max_items: None,
                on_violation: *on_violation,
            };
            &unbounded
        }
        other => other,
    };

    let mut scratch = Vec::new();
    match project(value, kind, "", &mut scratch) {
        Ok(projected) if scratch.is_empty() => Some(projected),
        _ => None,
    }
}

fn natural_default(kind: &FieldKind) -> FieldValue {
    match kind {
        FieldKind::Text { .. } => FieldValue::Text(String::new()),
        FieldKind::Number {
            min, max, integer, ..
        } => {
            let (zero, _) = clamp_number(0.0, *min, *max);
            number_value(zero, *integer)
        }
        FieldKind::Bool => FieldValue::Bool(false),
        FieldKind::Enum { table } => FieldValue::Enum(table.catch_all().to_string()),
        FieldKind::List { .. } => FieldValue::List(Vec::new()),
        FieldKind::Object { fields } => FieldValue::Object(Record::from_fields(
            fields
                .iter()
                .map(|f| (f.name.clone(), default_for(f)))
                .collect(),
        )),
    }
}

/// Project every declared field of `obj`, in declaration order.
///
/// The second element reports the first `required` field that had to be
/// defaulted, if any.
fn normalize_fields(
    obj: &Map<String, Value>,
    fields: &[FieldSpec],
    parent: &str,
    warnings: &mut Vec<Warning>,
) -> (Record, Option<Rejection>) {
    let mut out = Vec::with_capacity(fields.len());
    let mut failed_required = None;

    for field in fields {
        let path = child_path(parent, &field.name);
        let raw = field.keys().find_map(|key| obj.get(key));

        let value = match raw {
            None => {
                push(warnings, &path, WarningKind::Missing, "field missing; default used");
                note_required(field, &mut failed_required, "is missing");
                default_for(field)
            }
            Some(Value::Null) if field.default == Some(Value::Null) => FieldValue::Null,
            Some(Value::Null) => {
                push(warnings, &path, WarningKind::Missing, "field is null; default used");
                note_required(field, &mut failed_required, "is null");
                default_for(field)
            }
            Some(value) => match project(value, &field.kind, &path, warnings) {
                Ok(projected) => projected,
                Err(rejection) => {
                    let reason = format!("is invalid ({})", rejection.message);
                    note_required(field, &mut failed_required, &reason);
                    push(
                        warnings,
                        &path,
                        rejection.kind,
                        format!("{}; default used", rejection.message),
                    );
                    default_for(field)
                }
            },
        };

        out.push((field.name.clone(), value));
    }

    (Record::from_fields(out), failed_required)
}

fn note_required(field: &FieldSpec, failed: &mut Option<Rejection>, reason: &str) {
    if field.required && failed.is_none() {
        *failed = Some(Rejection::new(
            WarningKind::ElementDropped,
            format!("required field '{}' {}", field.name, reason),
        ));
    }
}

/// Project one present, non-null value onto `kind`.
///
/// Corrections that still yield a value (clamp, truncate, synonym) are
/// pushed to `warnings`; unusable values are returned as a `Rejection`.
fn project(
    value: &Value,
    kind: &FieldKind,
    path: &str,
    warnings: &mut Vec<Warning>,
) -> Result<FieldValue, Rejection> {
    match kind {
        FieldKind::Text { max_len, non_empty } => {
            let Some(s) = value.as_str() else {
                return Err(Rejection::wrong_type(kind, value));
            };
            if *non_empty && s.trim().is_empty() {
                return Err(Rejection::new(WarningKind::Blank, "string is blank"));
            }
            if let Some(max) = max_len {
                if let Some(truncated) = truncate_text(s, *max) {
                    // The kept prefix must satisfy the same rule as the input.
                    if *non_empty && truncated.trim().is_empty() {
                        return Err(Rejection::new(
                            WarningKind::Blank,
                            format!("string is blank within its first {} characters", max),
                        ));
                    }
                    push(
                        warnings,
                        path,
                        WarningKind::Truncated,
                        format!(
                            "string length {} exceeded max-len {}; truncated",
                            s.chars().count(),
                            max
                        ),
                    );
                    return Ok(FieldValue::Text(truncated));
                }
            }
            Ok(FieldValue::Text(s.to_string()))
        }

        FieldKind::Number {
            min,
            max,
            integer,
            out_of_range,
        } => {
            let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
                return Err(Rejection::wrong_type(kind, value));
            };
            let n = if *integer { n.round() } else { n };
            match out_of_range {
                RangePolicy::Reject if !in_range(n, *min, *max) => Err(Rejection::new(
                    WarningKind::OutOfRange,
                    format!("value {} is outside {}", n, describe_range(*min, *max)),
                )),
                _ => {
                    let (clamped, changed) = clamp_number(n, *min, *max);
                    if changed {
                        push(
                            warnings,
                            path,
                            WarningKind::Clamped,
                            format!(
                                "value {} is outside {}; clamped to {}",
                                n,
                                describe_range(*min, *max),
                                clamped
                            ),
                        );
                    }
                    Ok(number_value(clamped, *integer))
                }
            }
        }

        FieldKind::Bool => value
            .as_bool()
            .map(FieldValue::Bool)
            .ok_or_else(|| Rejection::wrong_type(kind, value)),

        FieldKind::Enum { table } => {
            let Some(raw) = value.as_str() else {
                return Err(Rejection::wrong_type(kind, value));
            };
            let resolved = canonicalize(value, table);
            match resolved.resolution {
                Resolution::Exact => {}
                Resolution::Synonym => push(
                    warnings,
                    path,
                    WarningKind::EnumSynonym {
                        from: raw.to_string(),
                        to: resolved.value.to_string(),
                    },
                    format!("'{}' mapped to '{}'", raw, resolved.value),
                ),
                Resolution::CatchAll => push(
                    warnings,
                    path,
                    WarningKind::EnumUnrecognized {
                        found: raw.to_string(),
                    },
                    format!("unrecognized value '{}'; using '{}'", raw, resolved.value),
                ),
            }
            Ok(FieldValue::Enum(resolved.value.to_string()))
        }

        FieldKind::List {
            item,
            min_items,
            max_items,
            on_violation,
        } => {
            let Some(elements) = value.as_array() else {
                return Err(Rejection::wrong_type(kind, value));
            };

            // Element warnings only matter if the list itself survives.
            let mut list_warnings = Vec::new();
            let mut kept = Vec::with_capacity(elements.len());
            for (i, element) in elements.iter().enumerate() {
                let element_path = index_path(path, i);
                let mut element_warnings = Vec::new();
                let projected = if element.is_null() {
                    Err(Rejection::new(WarningKind::Missing, "element is null"))
                } else {
                    project(element, item, &element_path, &mut element_warnings)
                };
                match projected {
                    Ok(v) => {
                        list_warnings.append(&mut element_warnings);
                        kept.push(v);
                    }
                    Err(rejection) => push(
                        &mut list_warnings,
                        &element_path,
                        WarningKind::ElementDropped,
                        format!("element dropped: {}", rejection.message),
                    ),
                }
            }

            match check_cardinality(kept.len(), *min_items, *max_items) {
                Cardinality::Within => {}
                Cardinality::TooMany if *on_violation == CardinalityPolicy::Truncate => {
                    let limit = max_items.unwrap_or(kept.len());
                    push(
                        &mut list_warnings,
                        path,
                        WarningKind::Truncated,
                        format!("{} elements exceeded max-items {}; truncated", kept.len(), limit),
                    );
                    kept.truncate(limit);
                }
                _ => {
                    return Err(Rejection::new(
                        WarningKind::CardinalityRejected { count: kept.len() },
                        format!(
                            "{} valid elements is outside {}",
                            kept.len(),
                            describe_count(*min_items, *max_items)
                        ),
                    ));
                }
            }

            warnings.append(&mut list_warnings);
            Ok(FieldValue::List(kept))
        }

        FieldKind::Object { fields } => {
            let Some(obj) = value.as_object() else {
                return Err(Rejection::wrong_type(kind, value));
            };
            let mut object_warnings = Vec::new();
            let (record, failed_required) = normalize_fields(obj, fields, path, &mut object_warnings);
            if let Some(rejection) = failed_required {
                return Err(rejection);
            }
            warnings.append(&mut object_warnings);
            Ok(FieldValue::Object(record))
        }
    }
}

fn number_value(n: f64, integer: bool) -> FieldValue {
    if integer {
        // `as` saturates, so unbounded huge values stay representable.
        FieldValue::Integer(n.round() as i64)
    } else {
        FieldValue::Number(n)
    }
}

fn push(warnings: &mut Vec<Warning>, path: &str, kind: WarningKind, message: impl Into<String>) {
    let warning = Warning::new(path, kind, message);
    tracing::debug!(path = %warning.path, message = %warning.message, "field corrected");
    warnings.push(warning);
}

fn describe_range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{}, {}]", lo, hi),
        (Some(lo), None) => format!("[{}, ∞)", lo),
        (None, Some(hi)) => format!("(-∞, {}]", hi),
        (None, None) => "(-∞, ∞)".to_string(),
    }
}

fn describe_count(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("{}..={} items", lo, hi),
        (Some(lo), None) => format!("at least {} items", lo),
        (None, Some(hi)) => format!("at most {} items", hi),
        (None, None) => "any number of items".to_string(),
    }
}

/// Return the JSON type name for a value.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
