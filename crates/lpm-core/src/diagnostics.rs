//! Diagnostic output model.
//!
//! A scan produces [`DiagnosticRecord`]s grouped by the file path they were resolved to.
//! Hosts use this for:
//! - problems panels / gutter markers
//! - jumping from a log line to the referenced source location
//! - machine-readable reports (the types serialize with `serde`)

use serde::Serialize;
use std::collections::HashMap;

/// Path key used for diagnostics that did not resolve to any file.
pub const NO_FILE: &str = "None";

/// Column value meaning "until the end of the line".
pub const LINE_END: u32 = u32::MAX;

/// An inclusive line/column range, zero-based after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticRange {
    /// Start line (zero-based).
    pub start_line: u32,
    /// Start column (zero-based).
    pub start_char: u32,
    /// End line (zero-based).
    pub end_line: u32,
    /// End column (zero-based), or [`LINE_END`].
    pub end_char: u32,
}

impl DiagnosticRange {
    /// Create a new diagnostic range.
    pub fn new(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start_line,
            start_char,
            end_line,
            end_char,
        }
    }
}

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

impl DiagnosticSeverity {
    /// Lowercase display label (`"error"`, `"warning"`, `"info"`, `"hint"`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

/// A single finished diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    /// Source label (`"LPM"` or `"LPM-<source>"`).
    pub source: String,
    /// Diagnostic range.
    pub range: DiagnosticRange,
    /// Diagnostic severity.
    pub severity: DiagnosticSeverity,
    /// Diagnostic message.
    pub message: String,
    /// Optional diagnostic code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// All diagnostics reported against one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiagnostics {
    /// Resolved path (or [`NO_FILE`]).
    pub path: String,
    /// Diagnostics in encounter order.
    pub diagnostics: Vec<DiagnosticRecord>,
}

/// Path → diagnostics mapping.
///
/// Paths iterate in the order their first diagnostic was emitted; diagnostics within a path keep
/// encounter order (they are not sorted by position).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticMap {
    files: Vec<FileDiagnostics>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DiagnosticMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under `path`, creating the entry on first use.
    pub fn push(&mut self, path: &str, record: DiagnosticRecord) {
        if let Some(&idx) = self.index.get(path) {
            self.files[idx].diagnostics.push(record);
            return;
        }

        self.index.insert(path.to_string(), self.files.len());
        self.files.push(FileDiagnostics {
            path: path.to_string(),
            diagnostics: vec![record],
        });
    }

    /// Diagnostics recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&[DiagnosticRecord]> {
        self.index
            .get(path)
            .map(|&idx| self.files[idx].diagnostics.as_slice())
    }

    /// Iterate over all paths with their diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &FileDiagnostics> {
        self.files.iter()
    }

    /// Iterate over the resolved paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no diagnostic was recorded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of diagnostics across all paths.
    pub fn total(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }

    /// Consume the map, returning the per-path entries.
    pub fn into_files(self) -> Vec<FileDiagnostics> {
        self.files
    }
}
