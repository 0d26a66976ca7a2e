//! Built-in producer contracts: assistant answers, quality reviews, video
//! reviews and chart specifications.
//!
//! Each contract is a static [`SchemaSpec`] plus a strongly-typed view that
//! implements [`Contract`]. Synonym tables are constructed once and shared by
//! every spec that uses them.

use std::sync::{Arc, LazyLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::canonical::SynonymTable;
use crate::constraints::CardinalityPolicy;
use crate::schema::{FieldKind, FieldSpec, SchemaSpec};
use crate::normalize_text;
use crate::warning::Warning;

// ---------------------------------------------------------------------------
// Synonym tables
// ---------------------------------------------------------------------------

static SEVERITY: LazyLock<Arc<SynonymTable>> = LazyLock::new(|| {
    table(
        SynonymTable::builder(["critical", "major", "minor", "info"], "info")
            .synonyms(&["blocker", "severe", "fatal"], "critical")
            .synonyms(&["high", "important", "error"], "major")
            .synonyms(&["medium", "moderate", "low", "warning"], "minor")
            .synonyms(&["trivial", "note", "suggestion", "nit"], "info"),
    )
});

static FINDING_CATEGORY: LazyLock<Arc<SynonymTable>> = LazyLock::new(|| {
    table(
        SynonymTable::builder(
            ["correctness", "clarity", "completeness", "style", "other"],
            "other",
        )
        .synonyms(&["accuracy", "bug", "error"], "correctness")
        .synonyms(&["readability", "wording"], "clarity")
        .synonyms(&["missing", "coverage"], "completeness")
        .synonyms(&["formatting", "tone"], "style"),
    )
});

static REVIEW_VERDICT: LazyLock<Arc<SynonymTable>> = LazyLock::new(|| {
    table(
        SynonymTable::builder(["pass", "needs_work", "fail"], "needs_work")
            .synonyms(&["approve", "approved", "passed", "ok"], "pass")
            .synonyms(&["needs work", "revise", "changes_requested"], "needs_work")
            .synonyms(&["reject", "rejected", "failed"], "fail"),
    )
});

static VIDEO_VERDICT: LazyLock<Arc<SynonymTable>> = LazyLock::new(|| {
    table(
        SynonymTable::builder(["approve", "revise", "reject", "neutral"], "neutral")
            .synonyms(&["approved", "accept", "pass"], "approve")
            .synonyms(&["needs_changes", "needs_work", "revision"], "revise")
            .synonyms(&["rejected", "fail", "decline"], "reject"),
    )
});

static TONE: LazyLock<Arc<SynonymTable>> = LazyLock::new(|| {
    table(
        SynonymTable::builder(["neutral", "positive", "cautious", "negative"], "neutral")
            .synonyms(&["good", "upbeat", "optimistic"], "positive")
            .synonyms(&["warning", "concerned"], "cautious")
            .synonyms(&["bad", "critical", "pessimistic"], "negative"),
    )
});

static CHART_TYPE: LazyLock<Arc<SynonymTable>> = LazyLock::new(|| {
    table(
        SynonymTable::builder(["bar", "line", "pie", "area"], "bar")
            .synonyms(&["column", "histogram"], "bar")
            .synonyms(&["timeseries", "trend"], "line")
            .synonyms(&["donut", "doughnut"], "pie"),
    )
});

fn table(builder: crate::canonical::SynonymTableBuilder) -> Arc<SynonymTable> {
    Arc::new(
        builder
            .build()
            .expect("invariant: built-in synonym tables are well-formed"),
    )
}

/// Severity labels shared by quality and video reviews.
pub fn severity_table() -> &'static SynonymTable {
    &SEVERITY
}

pub fn finding_category_table() -> &'static SynonymTable {
    &FINDING_CATEGORY
}

// ---------------------------------------------------------------------------
// Schema specs
// ---------------------------------------------------------------------------

fn chart_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("chart_type", FieldKind::enumeration(CHART_TYPE.clone())).alias("type"),
        FieldSpec::new("title", FieldKind::bounded_text(120)),
        FieldSpec::new("unit", FieldKind::bounded_text(16)),
        // Fewer than 2 or more than 12 points is not a chart; never pad or cut.
        FieldSpec::new(
            "data",
            FieldKind::list(FieldKind::object(vec![
                FieldSpec::new("label", FieldKind::bounded_text(40).non_empty()).required(),
                FieldSpec::new(
                    "value",
                    FieldKind::number(Some(0.0), None).reject_out_of_range(),
                )
                .required(),
            ]))
            .items(Some(2), Some(12), CardinalityPolicy::Reject),
        )
        .nullable(),
    ]
}

static ASSISTANT_ANSWER: LazyLock<SchemaSpec> = LazyLock::new(|| {
    spec(
        "assistant-answer",
        vec![
            FieldSpec::new("response", FieldKind::bounded_text(20_000)),
            FieldSpec::new(
                "follow_ups",
                FieldKind::list(FieldKind::bounded_text(200).non_empty()).items(
                    None,
                    Some(5),
                    CardinalityPolicy::Truncate,
                ),
            )
            .alias("followUps"),
            FieldSpec::new("tone", FieldKind::enumeration(TONE.clone())),
            FieldSpec::new("chart", FieldKind::object(chart_fields())).nullable(),
        ],
        "response",
    )
});

static QUALITY_REVIEW: LazyLock<SchemaSpec> = LazyLock::new(|| {
    spec(
        "quality-review",
        vec![
            FieldSpec::new("summary", FieldKind::bounded_text(2_000)),
            FieldSpec::new("overall_score", FieldKind::integer(0.0, 100.0)).alias("overallScore"),
            FieldSpec::new("verdict", FieldKind::enumeration(REVIEW_VERDICT.clone())),
            FieldSpec::new(
                "findings",
                FieldKind::list(FieldKind::object(vec![
                    FieldSpec::new("severity", FieldKind::enumeration(SEVERITY.clone())),
                    FieldSpec::new("category", FieldKind::enumeration(FINDING_CATEGORY.clone())),
                    // Optional: a finding with only a severity still counts.
                    FieldSpec::new("message", FieldKind::bounded_text(500).non_empty())
                        .alias("description"),
                    FieldSpec::new("suggestion", FieldKind::bounded_text(500)),
                ]))
                .items(None, Some(50), CardinalityPolicy::Truncate),
            ),
        ],
        "summary",
    )
});

static VIDEO_REVIEW: LazyLock<SchemaSpec> = LazyLock::new(|| {
    spec(
        "video-review",
        vec![
            FieldSpec::new("summary", FieldKind::bounded_text(2_000)),
            FieldSpec::new("verdict", FieldKind::enumeration(VIDEO_VERDICT.clone())),
            FieldSpec::new("score", FieldKind::integer(0.0, 100.0)),
            FieldSpec::new(
                "issues",
                FieldKind::list(FieldKind::object(vec![
                    FieldSpec::new("timestamp_seconds", FieldKind::number(Some(0.0), None))
                        .alias("timestamp"),
                    FieldSpec::new("severity", FieldKind::enumeration(SEVERITY.clone())),
                    FieldSpec::new("description", FieldKind::bounded_text(500).non_empty())
                        .required(),
                ]))
                .items(None, Some(50), CardinalityPolicy::Truncate),
            ),
        ],
        "summary",
    )
});

static CHART_SPEC: LazyLock<SchemaSpec> =
    LazyLock::new(|| spec("chart-spec", chart_fields(), "title"));

fn spec(name: &str, fields: Vec<FieldSpec>, primary: &str) -> SchemaSpec {
    SchemaSpec::new(name, fields, Some(primary))
        .expect("invariant: built-in contracts are well-formed")
}

pub fn assistant_answer() -> &'static SchemaSpec {
    &ASSISTANT_ANSWER
}

pub fn quality_review() -> &'static SchemaSpec {
    &QUALITY_REVIEW
}

pub fn video_review() -> &'static SchemaSpec {
    &VIDEO_REVIEW
}

pub fn chart_spec() -> &'static SchemaSpec {
    &CHART_SPEC
}

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &["assistant-answer", "quality-review", "video-review", "chart-spec"];

/// Look up a built-in contract by name.
pub fn by_name(name: &str) -> Option<&'static SchemaSpec> {
    match name {
        "assistant-answer" => Some(assistant_answer()),
        "quality-review" => Some(quality_review()),
        "video-review" => Some(video_review()),
        "chart-spec" => Some(chart_spec()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Typed views
// ---------------------------------------------------------------------------

/// A strongly-typed view over a built-in contract.
pub trait Contract: DeserializeOwned + Default {
    fn spec() -> &'static SchemaSpec;
}

/// A typed contract value with the corrections made while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
    pub used_fallback: bool,
}

/// Extract, normalize and decode `text` as contract `T`.
///
/// Never fails. A normalized record always matches its spec, so the decode
/// step only falls back to `T::default()` if `T` and its spec disagree.
pub fn parse<T: Contract>(text: &str) -> Parsed<T> {
    let outcome = normalize_text(text, T::spec());
    let value = match outcome.record.decode::<T>() {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(
                contract = %T::spec().name(),
                error = %err,
                "normalized record does not match its typed view"
            );
            T::default()
        }
    };
    Parsed {
        value,
        warnings: outcome.warnings,
        used_fallback: outcome.used_fallback,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    #[default]
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Correctness,
    Clarity,
    Completeness,
    Style,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Pass,
    #[default]
    NeedsWork,
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoVerdict {
    Approve,
    Revise,
    Reject,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Positive,
    Cautious,
    Negative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Area,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    pub unit: String,
    /// `None` when the producer's series was not a valid 2–12 point chart.
    pub data: Option<Vec<ChartPoint>>,
}

impl Contract for ChartSpec {
    fn spec() -> &'static SchemaSpec {
        chart_spec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub response: String,
    pub follow_ups: Vec<String>,
    pub tone: Tone,
    pub chart: Option<ChartSpec>,
}

impl Contract for AssistantAnswer {
    fn spec() -> &'static SchemaSpec {
        assistant_answer()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: FindingCategory,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReview {
    pub summary: String,
    pub overall_score: u8,
    pub verdict: ReviewVerdict,
    pub findings: Vec<Finding>,
}

impl Contract for QualityReview {
    fn spec() -> &'static SchemaSpec {
        quality_review()
    }
}

impl QualityReview {
    /// Findings per severity, with every severity present.
    pub fn severity_counts(&self) -> std::collections::BTreeMap<String, usize> {
        crate::metrics::count_by_category(
            self.findings.iter().map(|f| f.severity.as_str()),
            severity_table().canonical(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoIssue {
    pub timestamp_seconds: f64,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoReview {
    pub summary: String,
    pub verdict: VideoVerdict,
    pub score: u8,
    pub issues: Vec<VideoIssue>,
}

impl Contract for VideoReview {
    fn spec() -> &'static SchemaSpec {
        video_review()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_built_in_contracts_are_well_formed() {
        for name in NAMES {
            let spec = by_name(name).unwrap();
            assert_eq!(spec.name(), *name);
            assert!(spec.primary_field().is_some());
        }
        assert!(by_name("nope").is_none());
    }

    #[test]
    fn test_typed_views_match_defaults() {
        // A fully defaulted record must decode into every typed view.
        let answer = parse::<AssistantAnswer>("");
        assert_eq!(answer.value, AssistantAnswer::default());
        let review = parse::<QualityReview>("");
        assert_eq!(review.value, QualityReview::default());
        let video = parse::<VideoReview>("");
        assert_eq!(video.value, VideoReview::default());
        let chart = parse::<ChartSpec>("");
        assert_eq!(chart.value, ChartSpec::default());
    }

    #[test]
    fn test_quality_review_scenario() {
        let parsed = parse::<QualityReview>(
            r#"{"findings":[{"severity":"blocker","message":"crash on save"}], "overall_score":150}"#,
        );
        assert!(!parsed.used_fallback);
        assert_eq!(parsed.value.overall_score, 100);
        assert_eq!(parsed.value.findings[0].severity, Severity::Critical);
        assert_eq!(parsed.value.findings[0].category, FindingCategory::Other);

        let counts = parsed.value.severity_counts();
        assert_eq!(counts["critical"], 1);
        assert_eq!(counts["major"], 0);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_assistant_answer_with_chart() {
        let parsed = parse::<AssistantAnswer>(
            "```json\n{\"response\": \"Sales rose.\", \"followUps\": [\"Why?\", \"\"], \"tone\": \"upbeat\",\n \"chart\": {\"type\": \"column\", \"title\": \"Sales\", \"data\": [{\"label\": \"Q1\", \"value\": 10}, {\"label\": \"Q2\", \"value\": 14.5}]}}\n```",
        );
        let answer = parsed.value;
        assert_eq!(answer.response, "Sales rose.");
        assert_eq!(answer.follow_ups, vec!["Why?".to_string()]);
        assert_eq!(answer.tone, Tone::Positive);
        let chart = answer.chart.unwrap();
        assert_eq!(chart.chart_type, ChartType::Bar);
        assert_eq!(chart.data.unwrap().len(), 2);
    }

    #[test]
    fn test_video_review_fallback() {
        let parsed = parse::<VideoReview>("The video looks fine overall.");
        assert!(parsed.used_fallback);
        assert_eq!(parsed.value.summary, "The video looks fine overall.");
        assert_eq!(parsed.value.verdict, VideoVerdict::Neutral);
        assert_eq!(parsed.value.score, 0);
        assert!(parsed.value.issues.is_empty());
    }

    #[test]
    fn test_chart_single_point_is_none() {
        let parsed = parse::<ChartSpec>(r#"{"chart_type": "line", "data": [{"label": "only", "value": 1}]}"#);
        assert_eq!(parsed.value.chart_type, ChartType::Line);
        assert_eq!(parsed.value.data, None);
    }
}
