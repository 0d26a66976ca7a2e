//! WASM bindings for llm-normalize.
//!
//! Exposes the scanner, extractor, normalizer and metrics via `wasm-bindgen`
//! for use from JavaScript / TypeScript. Uses `serde-wasm-bindgen` for JS ↔
//! serde_json::Value marshalling.
//!
//! ## WASM API Contract
//!
//! - Structured results are wrapped in an `apiVersion: "1.0"` envelope.
//! - Errors are structured JS objects `{ code, message, path }`. Only caller
//!   mistakes (bad spec, unknown contract, unmarshallable arguments) throw;
//!   bad producer output never does.
//! - A `spec` argument is either a built-in contract name
//!   (`"quality-review"`) or a spec object in its JSON form.
//! - Options accept **camelCase** (`scanProse`) with kebab-case fallback
//!   (`scan-prose`).

use serde::Serialize;
use wasm_bindgen::prelude::*;

use serde_wasm_bindgen::Serializer;

use llm_normalize_core::{contracts, ExtractOptions, SchemaSpec, SpecError};

const API_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// WASM-local DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WasmExtractResult<'a> {
    api_version: &'static str,
    object: &'a serde_json::Map<String, serde_json::Value>,
    used_fallback: bool,
    source: llm_normalize_core::Source,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WasmNormalizeResult<'a> {
    api_version: &'static str,
    record: &'a llm_normalize_core::Record,
    warnings: &'a [llm_normalize_core::Warning],
    #[serde(skip_serializing_if = "Option::is_none")]
    used_fallback: Option<bool>,
}

/// camelCase view of `ExtractOptions`; unset fields keep the core defaults.
#[derive(Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
struct WasmExtractOptions {
    #[serde(alias = "scan-prose")]
    scan_prose: Option<bool>,
    #[serde(alias = "max-candidates")]
    max_candidates: Option<usize>,
}

impl From<WasmExtractOptions> for ExtractOptions {
    fn from(wasm: WasmExtractOptions) -> Self {
        let mut opts = ExtractOptions::default();
        if let Some(scan_prose) = wasm.scan_prose {
            opts.scan_prose = scan_prose;
        }
        if let Some(max_candidates) = wasm.max_candidates {
            opts.max_candidates = max_candidates;
        }
        opts
    }
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

fn structured_error(code: &str, message: &str, path: Option<&str>) -> JsValue {
    let error_obj = serde_json::json!({
        "code": code,
        "message": message,
        "path": path,
    });
    let serializer = Serializer::json_compatible();
    error_obj
        .serialize(&serializer)
        .unwrap_or_else(|_| JsValue::from_str(message))
}

fn to_spec_js_error(e: &SpecError) -> JsValue {
    let path = match e {
        SpecError::DuplicateField { path }
        | SpecError::InvalidBounds { path, .. }
        | SpecError::InvalidDefault { path, .. } => Some(path.as_str()),
        SpecError::InvalidPrimaryField { field } => Some(field.as_str()),
        SpecError::JsonError(_) | SpecError::SynonymTable(_) => None,
    };
    structured_error("spec_error", &e.to_string(), path)
}

fn to_serde_js_error(e: serde_wasm_bindgen::Error) -> JsValue {
    structured_error("json_parse_error", &e.to_string(), None)
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Resolve a contract name or a spec object.
fn resolve_spec(spec: JsValue) -> Result<SchemaSpec, JsValue> {
    if let Some(name) = spec.as_string() {
        return contracts::by_name(&name).cloned().ok_or_else(|| {
            let message = format!(
                "unknown contract '{}' (expected one of: {})",
                name,
                contracts::NAMES.join(", ")
            );
            structured_error("unknown_contract", &message, None)
        });
    }
    let raw: serde_json::Value = serde_wasm_bindgen::from_value(spec).map_err(to_serde_js_error)?;
    serde_json::from_value::<SchemaSpec>(raw).map_err(|e| to_spec_js_error(&SpecError::from(e)))
}

fn resolve_options(options: JsValue) -> Result<ExtractOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(ExtractOptions::default());
    }
    let wasm_opts: WasmExtractOptions =
        serde_wasm_bindgen::from_value(options).map_err(to_serde_js_error)?;
    Ok(wasm_opts.into())
}

// ---------------------------------------------------------------------------
// Public WASM API
// ---------------------------------------------------------------------------

/// Initialize WASM module: sets up panic hook for better error messages.
///
/// Called automatically when the WASM module loads (`#[wasm_bindgen(start)]`).
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Live text of `fieldName` in a possibly incomplete buffer. Never throws.
#[wasm_bindgen(js_name = scanPartialField)]
pub fn scan_partial_field(buffer: &str, field_name: &str) -> String {
    llm_normalize_core::scan_partial_field(buffer, field_name)
}

/// Isolate the structured object in a completed response.
///
/// Returns `{ apiVersion, object, usedFallback, source }`. With no decodable
/// object, `object` is `{ [primaryField]: text }` (or `{}` without one).
#[wasm_bindgen(js_name = extractDocument, skip_typescript)]
pub fn extract_document(
    text: &str,
    primary_field: Option<String>,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let options = resolve_options(options)?;
    let result =
        llm_normalize_core::extract_document_with(text, primary_field.as_deref(), &options);

    let bridge = WasmExtractResult {
        api_version: API_VERSION,
        object: &result.object,
        used_fallback: result.used_fallback,
        source: result.source,
    };
    let serializer = Serializer::json_compatible();
    bridge.serialize(&serializer).map_err(to_serde_js_error)
}

/// Project an already-decoded object onto a spec.
///
/// Returns `{ apiVersion, record, warnings }`. Throws only for an invalid spec.
#[wasm_bindgen(skip_typescript)]
pub fn normalize(value: JsValue, spec: JsValue) -> Result<JsValue, JsValue> {
    let spec = resolve_spec(spec)?;
    let value: serde_json::Value =
        serde_wasm_bindgen::from_value(value).map_err(to_serde_js_error)?;

    let result = llm_normalize_core::normalize(&value, &spec);

    let bridge = WasmNormalizeResult {
        api_version: API_VERSION,
        record: &result.record,
        warnings: &result.warnings,
        used_fallback: None,
    };
    let serializer = Serializer::json_compatible();
    bridge.serialize(&serializer).map_err(to_serde_js_error)
}

/// Extract and normalize a completed response in one call.
///
/// Returns `{ apiVersion, record, warnings, usedFallback }`.
#[wasm_bindgen(js_name = normalizeText, skip_typescript)]
pub fn normalize_text(text: &str, spec: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    let spec = resolve_spec(spec)?;
    let options = resolve_options(options)?;

    let outcome = llm_normalize_core::normalize_text_with(text, &spec, &options);

    let bridge = WasmNormalizeResult {
        api_version: API_VERSION,
        record: &outcome.record,
        warnings: &outcome.warnings,
        used_fallback: Some(outcome.used_fallback),
    };
    let serializer = Serializer::json_compatible();
    bridge.serialize(&serializer).map_err(to_serde_js_error)
}

/// Count `items` per category; every category is present, zero or not.
#[wasm_bindgen(js_name = countByCategory, skip_typescript)]
pub fn count_by_category(items: JsValue, categories: JsValue) -> Result<JsValue, JsValue> {
    let items: Vec<String> = serde_wasm_bindgen::from_value(items).map_err(to_serde_js_error)?;
    let categories: Vec<String> =
        serde_wasm_bindgen::from_value(categories).map_err(to_serde_js_error)?;

    let counts =
        llm_normalize_core::count_by_category(items.iter().map(String::as_str), &categories);

    let serializer = Serializer::json_compatible();
    counts.serialize(&serializer).map_err(to_serde_js_error)
}

/// `round(100 * actual / max(expected, 1))`, clamped to `0..=100`.
#[wasm_bindgen]
pub fn confidence(actual: u32, expected: u32) -> u8 {
    llm_normalize_core::confidence(actual as usize, expected as usize)
}

/// Names of the built-in contracts.
#[wasm_bindgen(js_name = contractNames, skip_typescript)]
pub fn contract_names() -> Result<JsValue, JsValue> {
    let serializer = Serializer::json_compatible();
    contracts::NAMES
        .serialize(&serializer)
        .map_err(to_serde_js_error)
}

// SYNC WARNING: hand-authored to match the shapes produced by serde +
// Serializer::json_compatible(). Update alongside:
//
//   - WasmExtractOptions (this file)   → ExtractOptions
//   - WasmExtractResult (this file)    → ExtractResult
//   - WasmNormalizeResult (this file)  → NormalizeResult
//   - Source (extract.rs)              → Source
//   - Warning (warning.rs)             → Warning
//   - WarningKind (warning.rs)         → WarningKind
#[wasm_bindgen(typescript_custom_section)]
const TS_TYPES: &str = r#"
export interface ExtractOptions {
  scanProse?: boolean;
  maxCandidates?: number;
}

export type Source = "fenced" | "whole" | "prose" | "fallback";

export interface ExtractResult {
  apiVersion: string;
  object: Record<string, unknown>;
  usedFallback: boolean;
  source: Source;
}

export type WarningKind =
  | { type: "missing" }
  | { type: "wrong_type"; expected: string; found: string }
  | { type: "blank" }
  | { type: "clamped" }
  | { type: "out_of_range" }
  | { type: "truncated" }
  | { type: "cardinality_rejected"; count: number }
  | { type: "element_dropped" }
  | { type: "enum_synonym"; from: string; to: string }
  | { type: "enum_unrecognized"; found: string };

export interface Warning {
  path: string;
  kind: WarningKind;
  message: string;
}

export interface NormalizeResult {
  apiVersion: string;
  record: Record<string, unknown>;
  warnings: Warning[];
  usedFallback?: boolean;
}

export type ErrorCode = "json_parse_error" | "spec_error" | "unknown_contract";

export interface StructuredError {
  code: ErrorCode;
  message: string;
  path: string | null;
}

export type ContractName =
  | "assistant-answer"
  | "quality-review"
  | "video-review"
  | "chart-spec";

export function extractDocument(
  text: string,
  primaryField?: string | null,
  options?: ExtractOptions | null
): ExtractResult;

export function normalize(
  value: unknown,
  spec: ContractName | Record<string, unknown>
): NormalizeResult;

export function normalizeText(
  text: string,
  spec: ContractName | Record<string, unknown>,
  options?: ExtractOptions | null
): NormalizeResult;

export function countByCategory(
  items: string[],
  categories: string[]
): Record<string, number>;

export function contractNames(): ContractName[];
"#;
