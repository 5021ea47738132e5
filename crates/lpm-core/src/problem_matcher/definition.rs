use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
/// Custom severity indicator string(s).
pub enum IndicatorStrings {
    /// A single accepted string.
    One(String),
    /// Several accepted strings.
    Many(Vec<String>),
}

impl IndicatorStrings {
    /// The accepted strings as a list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
/// `fileLocation:` field of a matcher.
pub enum FileLocation {
    /// `"absolute"` or `"relative"`.
    Mode(String),
    /// `["relative", "<base>"]` or `["absolute"]`.
    WithBase(Vec<String>),
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(mode) => write!(f, "\"{mode}\""),
            Self::WithBase(parts) => write!(f, "{parts:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
/// A switch that may be written as a boolean or as a (non-empty) string.
pub enum Toggle {
    /// `true` / `false`.
    Bool(bool),
    /// Any non-empty string turns the switch on.
    Text(String),
}

impl Toggle {
    /// Whether the switch is on.
    pub fn is_on(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
/// `pattern:` field of a matcher: a lone step or an ordered array of steps.
pub enum PatternList {
    // Listed first: a struct also deserializes from a sequence, so `[]` must not reach `One`.
    /// An array of pattern objects.
    Many(Vec<PatternDefinition>),
    /// A single pattern object.
    One(PatternDefinition),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Raw problem matcher definition, as written in the settings document.
pub struct MatcherDefinition {
    #[serde(default)]
    /// Optional human-readable title (defaults to `Matcher <index>`).
    pub title: Option<String>,

    #[serde(default)]
    /// How captured file paths are resolved.
    pub file_location: Option<FileLocation>,

    #[serde(default)]
    /// Captured lines *and* columns are already zero-based.
    pub problem_location_zero_based: Option<bool>,

    #[serde(default)]
    /// Captured lines are already zero-based.
    pub problem_line_zero_based: Option<bool>,

    #[serde(default)]
    /// Captured columns are already zero-based.
    pub problem_column_zero_based: Option<bool>,

    #[serde(default)]
    /// Source label suffix (`LPM-<source>`).
    pub source: Option<String>,

    #[serde(default)]
    /// Whether the matcher is part of the default selection (absent means yes).
    pub default_selected: Option<bool>,

    #[serde(default)]
    /// Static severity override (`error`, `warning` or `info`).
    pub severity: Option<String>,

    #[serde(default, rename = "error_string")]
    /// Captured strings meaning "error".
    pub error_string: Option<IndicatorStrings>,

    #[serde(default, rename = "warning_string")]
    /// Captured strings meaning "warning".
    pub warning_string: Option<IndicatorStrings>,

    #[serde(default, rename = "info_string")]
    /// Captured strings meaning "info".
    pub info_string: Option<IndicatorStrings>,

    #[serde(default)]
    /// Anchor diagnostics to the scanned log file itself.
    pub link_to_log_file: Option<Toggle>,

    #[serde(default)]
    /// The pattern step(s).
    pub pattern: Option<PatternList>,
}

impl MatcherDefinition {
    /// The declared steps, with a lone step normalized to a one-element slice.
    pub fn steps(&self) -> &[PatternDefinition] {
        match &self.pattern {
            None => &[],
            Some(PatternList::One(p)) => std::slice::from_ref(p),
            Some(PatternList::Many(v)) => v,
        }
    }

    /// The title, or `Matcher <index>` when none is declared.
    pub fn title_or_default(&self, index: usize) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Matcher {index}"))
    }

    /// Whether the matcher belongs to the default selection.
    pub fn is_default_selected(&self) -> bool {
        self.default_selected.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A raw pattern step: regex source plus capture-group indices.
pub struct PatternDefinition {
    #[serde(default)]
    /// The regex source string.
    pub regexp: Option<String>,

    #[serde(default)]
    /// Capture group holding the severity word.
    pub severity: Option<usize>,

    #[serde(default)]
    /// Capture group holding the diagnostic code.
    pub code: Option<usize>,

    #[serde(default)]
    /// Capture group holding the file path.
    pub file: Option<usize>,

    #[serde(default)]
    /// Capture group holding a combined location (`line`, `line,col`, `l1,c1,l2,c2`).
    pub location: Option<usize>,

    #[serde(default)]
    /// Capture group holding the start line.
    pub line: Option<usize>,

    #[serde(default)]
    /// Capture group holding the end line.
    pub end_line: Option<usize>,

    #[serde(default)]
    /// Capture group holding the start column.
    pub column: Option<usize>,

    #[serde(default)]
    /// Capture group holding the end column.
    pub end_column: Option<usize>,

    #[serde(default)]
    /// Capture group holding (part of) the message.
    pub message: Option<usize>,

    #[serde(default, rename = "error_string")]
    /// Captured strings meaning "error" (only read from the first step).
    pub error_string: Option<IndicatorStrings>,

    #[serde(default, rename = "warning_string")]
    /// Captured strings meaning "warning" (only read from the first step).
    pub warning_string: Option<IndicatorStrings>,

    #[serde(default, rename = "info_string")]
    /// Captured strings meaning "info" (only read from the first step).
    pub info_string: Option<IndicatorStrings>,

    #[serde(default)]
    /// Step kind; `"file"` reports whole-file problems (no location).
    pub kind: Option<String>,

    #[serde(default, rename = "loop")]
    /// Repeat this (last) step to collect a multi-line message.
    pub looping: Option<bool>,
}

impl PatternDefinition {
    /// Create a step from a regex source with no capture groups mapped.
    pub fn new(regexp: impl Into<String>) -> Self {
        Self {
            regexp: Some(regexp.into()),
            ..Self::default()
        }
    }

    /// Whether any extraction field other than `message` is declared.
    pub fn has_extraction_fields(&self) -> bool {
        self.severity.is_some()
            || self.code.is_some()
            || self.file.is_some()
            || self.location.is_some()
            || self.line.is_some()
            || self.end_line.is_some()
            || self.column.is_some()
            || self.end_column.is_some()
    }
}
