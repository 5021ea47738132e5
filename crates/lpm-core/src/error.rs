use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// A matcher definition that cannot be compiled.
///
/// Fatal to the affected matcher only: the scanner excludes it and keeps the others.
pub enum ConfigError {
    #[error("matcher '{matcher}': pattern step {step} has no 'regexp'")]
    /// A pattern step lacks its regex source.
    MissingRegex {
        /// Matcher title.
        matcher: String,
        /// Zero-based step index.
        step: usize,
    },

    #[error("matcher '{matcher}': regex compile error for pattern '{pattern}': {message}")]
    /// Neither regex engine accepted the pattern.
    InvalidRegex {
        /// Matcher title.
        matcher: String,
        /// The regex source string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("matcher '{matcher}': no pattern steps defined")]
    /// The matcher declares no `pattern` (or an empty array).
    EmptyPatternList {
        /// Matcher title.
        matcher: String,
    },

    #[error(
        "matcher '{matcher}': no severity source (neither 'severity' on the matcher nor a severity capture group)"
    )]
    /// Neither a static severity nor a severity capture group is configured.
    MissingSeveritySource {
        /// Matcher title.
        matcher: String,
    },
}

impl ConfigError {
    /// Title of the matcher the error belongs to.
    pub fn matcher(&self) -> &str {
        match self {
            Self::MissingRegex { matcher, .. }
            | Self::InvalidRegex { matcher, .. }
            | Self::EmptyPatternList { matcher }
            | Self::MissingSeveritySource { matcher } => matcher,
        }
    }
}

#[derive(Debug, Error)]
/// Errors produced while loading a settings or session document.
pub enum SettingsError {
    #[error("JSON parse error: {0}")]
    /// JSON parsing failed.
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// The host could not determine what to scan. Aborts before any file I/O.
pub enum SelectionError {
    #[error("no parsers are defined; add at least one parser with a problem matcher to the settings")]
    /// The settings document defines no parser.
    NoParsers,

    #[error("unknown parser '{0}'")]
    /// The requested parser does not exist.
    UnknownParser(String),

    #[error("parser '{0}' defines no problem matchers")]
    /// The chosen parser has an empty matcher list.
    NoMatchers(String),

    #[error("no problem matcher was selected for parser '{0}'")]
    /// The selection names none of the parser's matchers.
    NothingSelected(String),

    #[error("no log file was given and none is remembered from a previous scan")]
    /// Nothing to scan.
    NoLogFile,
}

#[derive(Debug, Error)]
/// Errors that abort a scan in progress.
pub enum ScanError {
    #[error("I/O error: {0}")]
    /// Reading the log failed.
    Io(#[from] std::io::Error),

    #[error("scan cancelled after {lines} lines")]
    /// The cancellation token fired.
    Cancelled {
        /// Lines fully processed before cancellation.
        lines: usize,
    },

    #[error(
        "internal error: matcher '{matcher}' has no pattern step at index {cursor}; please report this bug"
    )]
    /// A compiled matcher's step list does not cover its cursor.
    MissingStep {
        /// Matcher title.
        matcher: String,
        /// Step cursor at the time of the failure.
        cursor: usize,
    },
}
