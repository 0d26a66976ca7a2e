//! Stream session: one in-flight producer response.
//!
//! The host owns delivery (fragments arrive however the transport delivers
//! them) and hands each fragment to [`StreamSession::push`], which returns the
//! live display text. When the transport signals the end, [`StreamSession::finish`]
//! runs extraction and normalization exactly once. Dropping a session midway
//! is a valid end state; nothing needs to be released.

use crate::config::ExtractOptions;
use crate::schema::SchemaSpec;
use crate::scanner::scan_partial_field;
use crate::{normalize_text_with, Outcome};

/// Accumulates one response's fragments against a borrowed spec.
#[derive(Debug, Clone)]
pub struct StreamSession<'s> {
    spec: &'s SchemaSpec,
    live_field: Option<String>,
    options: ExtractOptions,
    buffer: String,
}

impl<'s> StreamSession<'s> {
    /// Start a session whose live field is the spec's primary field.
    pub fn new(spec: &'s SchemaSpec) -> Self {
        Self {
            spec,
            live_field: spec.primary_field().map(str::to_string),
            options: ExtractOptions::default(),
            buffer: String::new(),
        }
    }

    /// Start a session that displays `field` while streaming.
    pub fn with_live_field(spec: &'s SchemaSpec, field: &str) -> Self {
        Self {
            live_field: Some(field.to_string()),
            ..Self::new(spec)
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Append a fragment and return the current live text.
    pub fn push(&mut self, fragment: &str) -> String {
        self.buffer.push_str(fragment);
        self.live_text()
    }

    /// Live text for the current buffer; empty without a live field.
    pub fn live_text(&self) -> String {
        match &self.live_field {
            Some(field) => scan_partial_field(&self.buffer, field),
            None => String::new(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// End of stream: extract and normalize the accumulated buffer.
    pub fn finish(self) -> Outcome {
        normalize_text_with(&self.buffer, self.spec, &self.options)
    }
}
