#![warn(missing_docs)]
//! `lpm-core` - a headless log problem matcher.
//!
//! # Overview
//!
//! `lpm-core` scans a stream of text lines against a set of *problem matchers* and produces
//! structured diagnostics grouped by the source file they point at. A matcher is an ordered
//! sequence of regex steps plus rules that say which capture group holds the file, the location,
//! the severity, the code and the message.
//!
//! Three shapes of matcher are supported:
//!
//! - single-step matchers, emitting one diagnostic per matching line
//! - fixed-length multi-step matchers, emitting once the whole sequence has matched
//! - "loop" matchers whose last step repeats to collect a multi-line message, emitting once a
//!   non-matching line (or the end of the input) terminates the block
//!
//! # Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ScanSession / Selection / ParserSettings   │  ← Host-facing configuration
//! ├─────────────────────────────────────────────┤
//! │  LogScanner / Scan                          │  ← One-pass scan entry points
//! ├─────────────────────────────────────────────┤
//! │  Matcher engine (per-matcher state machine) │  ← Step cursor + emission rules
//! ├─────────────────────────────────────────────┤
//! │  Severity / Location / Path / Message       │  ← Field resolvers
//! ├─────────────────────────────────────────────┤
//! │  Pattern compiler (regex + oniguruma)       │  ← Definitions → compiled steps
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use lpm_core::{CancellationToken, LogScanner, MatcherDefinition, ScanOptions};
//!
//! let definition: MatcherDefinition = serde_json::from_str(
//!     r#"{
//!         "title": "gcc",
//!         "pattern": {
//!             "regexp": "^(.*):(\\d+):(\\d+): (error|warning): (.*)$",
//!             "file": 1, "line": 2, "column": 3, "severity": 4, "message": 5
//!         }
//!     }"#,
//! )
//! .unwrap();
//!
//! let scanner = LogScanner::new(&[definition], ScanOptions::default());
//! let output = scanner
//!     .scan_lines(["main.c:3:5: error: expected ';'"], &CancellationToken::new())
//!     .unwrap();
//!
//! let diagnostics = output.diagnostics.get("main.c").unwrap();
//! assert_eq!(diagnostics[0].message, "expected ';'");
//! assert_eq!(diagnostics[0].range.start_line, 2);
//! ```
//!
//! # Module Description
//!
//! - [`problem_matcher`] - matcher definitions, the pattern compiler, field resolvers and the
//!   per-matcher state machine
//! - [`diagnostics`] - diagnostic records and the per-file output map
//! - [`settings`] - the parser settings document and matcher selection
//! - [`session`] - the explicit "last used" history object for rescans
//! - [`error`] - error types

pub mod cancel;
pub mod diagnostics;
pub mod error;
pub mod problem_matcher;
mod scanner;
pub mod session;
pub mod settings;

pub use cancel::CancellationToken;
pub use diagnostics::{
    DiagnosticMap, DiagnosticRange, DiagnosticRecord, DiagnosticSeverity, FileDiagnostics,
    LINE_END, NO_FILE,
};
pub use error::{ConfigError, ScanError, SelectionError, SettingsError};
pub use problem_matcher::{
    CompiledMatcher, CompiledStep, FileLocation, IndicatorStrings, MatcherDefinition,
    PatternDefinition, PatternList, Toggle, compile_matcher,
};
pub use scanner::{CompileReport, LogScanner, Scan, ScanOptions, ScanOutput};
pub use session::{ResolvedScan, ScanRequest, ScanSession};
pub use settings::{ParserSettings, Selection};
