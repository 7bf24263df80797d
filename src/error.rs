//! Unified error type for the monitoring pipeline.
//!
//! Every failure carries a [`ErrorKind`], a human-readable message and a
//! structured context map (field, offending value, component, endpoint, ...)
//! so that log consumers can filter on stable keys instead of parsing text.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MonitorError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Category of a [`MonitorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad shape or type of input data. Never retried.
    Validation,
    /// External endpoint unreachable or returned a non-success status.
    Connection,
    /// A downstream step failed (sentiment scoring, fan-out).
    Processing,
    /// Indicator or signal logic received a value it cannot use.
    Analysis,
    /// Invalid or missing configuration. Aborts startup.
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Connection => "connection",
            ErrorKind::Processing => "processing",
            ErrorKind::Analysis => "analysis",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error type of the crate.
#[derive(Debug, Error)]
#[error("[{kind}] {message}{}", render_context(.context))]
pub struct MonitorError {
    kind: ErrorKind,
    message: String,
    context: BTreeMap<&'static str, String>,
    #[source]
    source: Option<BoxedSource>,
}

fn render_context(context: &BTreeMap<&'static str, String>) -> String {
    if context.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = context.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!(" ({})", pairs.join(", "))
}

impl MonitorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: BTreeMap::new(),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Processing, message)
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Analysis, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Validation error pointing at a specific field.
    pub fn invalid_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::validation(message).with_context("field", field)
    }

    /// Connection error for a failed HTTP call.
    pub fn endpoint_failure(
        message: impl Into<String>,
        endpoint: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        let err = Self::connection(message).with_context("endpoint", endpoint);
        match status {
            Some(code) => err.with_context("status", code.to_string()),
            None => err,
        }
    }

    /// Attach a structured context entry. Later values overwrite earlier ones.
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.insert(key, value.into());
        self
    }

    /// Attach the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    pub fn context_map(&self) -> &BTreeMap<&'static str, String> {
        &self.context
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_connection(&self) -> bool {
        self.kind == ErrorKind::Connection
    }

    pub fn is_processing(&self) -> bool {
        self.kind == ErrorKind::Processing
    }

    pub fn is_analysis(&self) -> bool {
        self.kind == ErrorKind::Analysis
    }
}
