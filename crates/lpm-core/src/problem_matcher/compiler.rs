use crate::error::ConfigError;
use crate::problem_matcher::definition::{FileLocation, MatcherDefinition, PatternDefinition};
use crate::problem_matcher::location::{DiscreteCaptures, Indexing, LocationCapture};
use crate::problem_matcher::path::{BaseDir, PathMode};
use crate::problem_matcher::severity::SeverityRule;
use std::sync::Arc;

/// Source label used for every diagnostic.
pub const SOURCE_LABEL: &str = "LPM";

#[derive(Debug, Clone)]
/// A compiled problem matcher: the runtime representation consumed by the scanner.
pub struct CompiledMatcher {
    /// Matcher title (declared, or `Matcher <index>`).
    pub title: String,
    /// Source label attached to every diagnostic (`LPM` or `LPM-<source>`).
    pub source: String,
    /// Ordered, non-empty pattern steps.
    pub steps: Vec<CompiledStep>,
    /// Where severities come from.
    pub severity: SeverityRule,
    /// How diagnostic paths are resolved.
    pub path_mode: PathMode,
    /// Index conventions of captured positions.
    pub indexing: Indexing,
}

impl CompiledMatcher {
    /// Whether the matcher has no way of determining a severity.
    pub fn lacks_severity_source(&self) -> bool {
        matches!(self.severity, SeverityRule::Unspecified)
    }
}

#[derive(Debug, Clone)]
/// One compiled pattern step.
pub struct CompiledStep {
    /// Regex source as written in the settings.
    pub regex_source: String,
    /// Compiled regex.
    pub pattern: Pattern,
    /// What the step extracts when it matches.
    pub role: StepRole,
    /// Whether the step repeats while it keeps matching (only meaningful on the last step).
    pub looping: bool,
}

impl CompiledStep {
    /// Whether the step only collects trailing message lines of an open diagnostic.
    pub fn is_collecting_message(&self) -> bool {
        matches!(self.role, StepRole::Continuation { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The extraction shape of a step.
pub enum StepRole {
    /// A looping step whose only capture is the message: it appends continuation lines and the
    /// diagnostic is emitted once it stops matching.
    Continuation {
        /// Message capture group.
        message: usize,
    },
    /// A step extracting any combination of fields.
    Extract(FieldCaptures),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Capture-group mapping for [`StepRole::Extract`].
pub struct FieldCaptures {
    /// Severity word group.
    pub severity: Option<usize>,
    /// Code group.
    pub code: Option<usize>,
    /// File path group.
    pub file: Option<usize>,
    /// Location extraction mode.
    pub location: LocationCapture,
    /// Message group.
    pub message: Option<usize>,
}

#[derive(Debug, Clone)]
/// A compiled regex, from the `regex` crate when it accepts the source, else Oniguruma.
pub enum Pattern {
    /// `regex` crate.
    Standard(regex::Regex),
    /// Oniguruma, for look-around and back-references.
    Oniguruma(Arc<onig::Regex>),
}

impl Pattern {
    /// Compile `source`, falling back to Oniguruma when the `regex` crate rejects it.
    pub fn new(source: &str) -> Result<Self, String> {
        match regex::Regex::new(source) {
            Ok(re) => Ok(Self::Standard(re)),
            Err(standard) => match onig::Regex::new(source) {
                Ok(re) => {
                    tracing::debug!(
                        pattern = source,
                        reason = %standard,
                        "falling back to oniguruma"
                    );
                    Ok(Self::Oniguruma(Arc::new(re)))
                }
                Err(onig) => Err(format!("{standard}; oniguruma: {onig}")),
            },
        }
    }

    /// Run the pattern against `text`, returning all capture groups of the first match.
    pub fn captures<'t>(&self, text: &'t str) -> Option<StepMatch<'t>> {
        match self {
            Self::Standard(re) => {
                let caps = re.captures(text)?;
                Some(StepMatch::from_groups(
                    caps.iter().map(|m| m.map(|m| m.as_str())).collect(),
                ))
            }
            Self::Oniguruma(re) => {
                let caps = re.captures(text)?;
                Some(StepMatch::from_groups(
                    (0..caps.len()).map(|i| caps.at(i)).collect(),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Capture groups of one successful step match. Group 0 is the whole match.
pub struct StepMatch<'t> {
    groups: Vec<Option<&'t str>>,
}

impl<'t> StepMatch<'t> {
    /// Build from raw groups.
    pub fn from_groups(groups: Vec<Option<&'t str>>) -> Self {
        Self { groups }
    }

    /// Text of group `index`, if it exists and participated in the match.
    pub fn get(&self, index: usize) -> Option<&'t str> {
        self.groups.get(index).copied().flatten()
    }
}

/// Compile a raw definition. `index` is the matcher's position in its parser, used for the
/// default title.
pub fn compile_matcher(
    definition: &MatcherDefinition,
    index: usize,
) -> Result<CompiledMatcher, ConfigError> {
    let title = definition.title_or_default(index);
    let raw_steps = definition.steps();
    if raw_steps.is_empty() {
        return Err(ConfigError::EmptyPatternList { matcher: title });
    }

    // `kind` is read from the first step and governs the whole matcher.
    let whole_file = raw_steps[0].kind.as_deref() == Some("file");
    let single_step = raw_steps.len() == 1;

    let steps = raw_steps
        .iter()
        .enumerate()
        .map(|(idx, raw)| compile_step(&title, idx, raw, whole_file, single_step))
        .collect::<Result<Vec<_>, _>>()?;

    let path_mode = compile_path_mode(definition, &title);

    let source = match definition.source.as_deref() {
        Some(s) if !s.is_empty() => format!("{SOURCE_LABEL}-{s}"),
        _ => SOURCE_LABEL.to_string(),
    };

    let compiled = CompiledMatcher {
        title,
        source,
        steps,
        severity: SeverityRule::for_matcher(definition),
        path_mode,
        indexing: Indexing {
            whole_range_zero_based: definition.problem_location_zero_based.unwrap_or(false),
            line_zero_based: definition.problem_line_zero_based.unwrap_or(false),
            column_zero_based: definition.problem_column_zero_based.unwrap_or(false),
        },
    };

    tracing::debug!(
        matcher = %compiled.title,
        steps = compiled.steps.len(),
        path_mode = ?compiled.path_mode,
        "compiled problem matcher"
    );
    Ok(compiled)
}

fn compile_step(
    matcher: &str,
    idx: usize,
    raw: &PatternDefinition,
    whole_file: bool,
    single_step: bool,
) -> Result<CompiledStep, ConfigError> {
    let Some(source) = raw.regexp.as_deref() else {
        return Err(ConfigError::MissingRegex {
            matcher: matcher.to_string(),
            step: idx,
        });
    };

    let pattern = Pattern::new(source).map_err(|message| ConfigError::InvalidRegex {
        matcher: matcher.to_string(),
        pattern: source.to_string(),
        message,
    })?;

    // A lone step restarts after every match, so it can never hold a message open.
    let looping = raw.looping.unwrap_or(false) && !single_step;

    let role = match raw.message {
        Some(message) if looping && !raw.has_extraction_fields() => {
            StepRole::Continuation { message }
        }
        _ => StepRole::Extract(FieldCaptures {
            severity: raw.severity,
            code: raw.code,
            file: raw.file,
            location: location_capture(raw, whole_file),
            message: raw.message,
        }),
    };

    Ok(CompiledStep {
        regex_source: source.to_string(),
        pattern,
        role,
        looping,
    })
}

fn location_capture(raw: &PatternDefinition, whole_file: bool) -> LocationCapture {
    if whole_file {
        return LocationCapture::WholeFile;
    }
    if let Some(group) = raw.location {
        return LocationCapture::Combined(group);
    }
    LocationCapture::Discrete(DiscreteCaptures {
        line: raw.line,
        end_line: raw.end_line,
        column: raw.column,
        end_column: raw.end_column,
    })
}

fn compile_path_mode(definition: &MatcherDefinition, matcher: &str) -> PathMode {
    if definition
        .link_to_log_file
        .as_ref()
        .is_some_and(|t| t.is_on())
    {
        return PathMode::LogFile;
    }

    let Some(location) = &definition.file_location else {
        return PathMode::Absolute;
    };

    let (mode, base) = match location {
        FileLocation::Mode(mode) => (mode.as_str(), None),
        FileLocation::WithBase(parts) => match parts.as_slice() {
            [] => ("", None),
            [mode] => (mode.as_str(), None),
            [mode, base, ..] => (mode.as_str(), Some(base.as_str())),
        },
    };

    match (mode, base) {
        ("relative", Some(base)) => PathMode::Relative(BaseDir::parse(base)),
        ("relative", None) => PathMode::Relative(BaseDir::Workspace),
        ("absolute", _) => PathMode::Absolute,
        _ => {
            // Captured paths are still usable as written.
            tracing::warn!(
                matcher,
                file_location = %location,
                "unsupported fileLocation; using captured paths as-is"
            );
            PathMode::Absolute
        }
    }
}
