//! Severity resolution: static overrides and captured indicator words.

use crate::diagnostics::DiagnosticSeverity;
use crate::problem_matcher::compiler::StepMatch;
use crate::problem_matcher::definition::{IndicatorStrings, MatcherDefinition};

/// Map a static severity override (`error`/`warning`/`info`, any case).
///
/// Anything else yields `None`, which leaves the accumulated severity untouched.
pub fn parse_static_severity(value: &str) -> Option<DiagnosticSeverity> {
    match value.to_lowercase().as_str() {
        "error" => Some(DiagnosticSeverity::Error),
        "warning" => Some(DiagnosticSeverity::Warning),
        "info" => Some(DiagnosticSeverity::Information),
        _ => None,
    }
}

/// The accepted strings for one severity category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    words: Vec<String>,
    case_insensitive: bool,
}

impl Indicator {
    fn custom(words: Vec<String>) -> Self {
        Self {
            words,
            case_insensitive: false,
        }
    }

    fn fallback(word: &str) -> Self {
        Self {
            words: vec![word.to_string()],
            case_insensitive: true,
        }
    }

    /// Whether `captured` is one of the accepted strings.
    ///
    /// Custom strings compare exactly; the single-word fallback compares case-insensitively.
    pub fn accepts(&self, captured: &str) -> bool {
        if self.case_insensitive {
            let folded = captured.to_lowercase();
            self.words.iter().any(|w| *w == folded)
        } else {
            self.words.iter().any(|w| w == captured)
        }
    }

    /// Whether the indicator is the built-in fallback word.
    pub fn is_fallback(&self) -> bool {
        self.case_insensitive
    }
}

/// Per-category indicator sets, tested in the order error → warning → info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityIndicators {
    /// Strings meaning "error".
    pub error: Indicator,
    /// Strings meaning "warning".
    pub warning: Indicator,
    /// Strings meaning "info".
    pub info: Indicator,
}

impl Default for SeverityIndicators {
    fn default() -> Self {
        Self {
            error: Indicator::fallback("error"),
            warning: Indicator::fallback("warning"),
            info: Indicator::fallback("info"),
        }
    }
}

impl SeverityIndicators {
    /// Build the indicator sets for a matcher.
    ///
    /// Precedence per category: matcher-level strings, then the *first* step's strings, then the
    /// case-insensitive default word. Steps after the first are never consulted.
    pub fn for_matcher(definition: &MatcherDefinition) -> Self {
        let first = definition.steps().first();
        let pick = |matcher: &Option<IndicatorStrings>,
                    step: Option<&Option<IndicatorStrings>>,
                    word: &str| {
            matcher
                .as_ref()
                .or_else(|| step.and_then(|s| s.as_ref()))
                .map(|strings| Indicator::custom(strings.to_vec()))
                .unwrap_or_else(|| Indicator::fallback(word))
        };

        Self {
            error: pick(
                &definition.error_string,
                first.map(|s| &s.error_string),
                "error",
            ),
            warning: pick(
                &definition.warning_string,
                first.map(|s| &s.warning_string),
                "warning",
            ),
            info: pick(
                &definition.info_string,
                first.map(|s| &s.info_string),
                "info",
            ),
        }
    }

    /// Classify a captured severity string; first matching category wins.
    pub fn classify(&self, captured: &str) -> Option<DiagnosticSeverity> {
        if self.error.accepts(captured) {
            Some(DiagnosticSeverity::Error)
        } else if self.warning.accepts(captured) {
            Some(DiagnosticSeverity::Warning)
        } else if self.info.accepts(captured) {
            Some(DiagnosticSeverity::Information)
        } else {
            None
        }
    }
}

/// Where a matcher's severity comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeverityRule {
    /// A static override. `None` when the override word was not recognized.
    Fixed(Option<DiagnosticSeverity>),
    /// Classify the capture of each step that declares a severity group.
    Captured(SeverityIndicators),
    /// Neither an override nor any severity capture group; diagnostics stay at `Hint`.
    Unspecified,
}

impl SeverityRule {
    /// Derive the rule from a raw definition.
    pub fn for_matcher(definition: &MatcherDefinition) -> Self {
        if let Some(word) = definition.severity.as_deref()
            && !word.is_empty()
        {
            return Self::Fixed(parse_static_severity(word));
        }

        if definition.steps().iter().any(|s| s.severity.is_some()) {
            return Self::Captured(SeverityIndicators::for_matcher(definition));
        }

        Self::Unspecified
    }

    /// Apply the rule for one matched step, returning the new accumulated severity.
    pub fn resolve(
        &self,
        severity_group: Option<usize>,
        step_match: &StepMatch<'_>,
        current: DiagnosticSeverity,
    ) -> DiagnosticSeverity {
        match self {
            Self::Fixed(fixed) => fixed.unwrap_or(current),
            Self::Captured(indicators) => severity_group
                .and_then(|group| step_match.get(group))
                .and_then(|captured| indicators.classify(captured))
                .unwrap_or(current),
            Self::Unspecified => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem_matcher::definition::{PatternDefinition, PatternList};

    fn definition_with_steps(steps: Vec<PatternDefinition>) -> MatcherDefinition {
        MatcherDefinition {
            pattern: Some(PatternList::Many(steps)),
            ..MatcherDefinition::default()
        }
    }

    #[test]
    fn test_static_override_is_case_insensitive_and_permissive() {
        assert_eq!(
            parse_static_severity("WaRnInG"),
            Some(DiagnosticSeverity::Warning)
        );
        assert_eq!(
            parse_static_severity("info"),
            Some(DiagnosticSeverity::Information)
        );
        assert_eq!(parse_static_severity("fatal"), None);
    }

    #[test]
    fn test_default_indicators_fold_case() {
        let indicators = SeverityIndicators::default();
        assert_eq!(
            indicators.classify("ERROR"),
            Some(DiagnosticSeverity::Error)
        );
        assert_eq!(
            indicators.classify("Warning"),
            Some(DiagnosticSeverity::Warning)
        );
        assert_eq!(indicators.classify("note"), None);
    }

    #[test]
    fn test_custom_indicators_compare_exactly() {
        let mut definition = definition_with_steps(vec![PatternDefinition {
            severity: Some(1),
            ..PatternDefinition::new("(E|W) .*")
        }]);
        definition.error_string = Some(IndicatorStrings::Many(vec!["E".into(), "F".into()]));

        let indicators = SeverityIndicators::for_matcher(&definition);
        assert_eq!(indicators.classify("E"), Some(DiagnosticSeverity::Error));
        assert_eq!(indicators.classify("F"), Some(DiagnosticSeverity::Error));
        assert_eq!(indicators.classify("e"), None);
        // Other categories still use the folded defaults.
        assert!(indicators.warning.is_fallback());
        assert_eq!(
            indicators.classify("WARNING"),
            Some(DiagnosticSeverity::Warning)
        );
    }

    #[test]
    fn test_only_first_step_strings_are_consulted() {
        let definition = definition_with_steps(vec![
            PatternDefinition {
                warning_string: Some(IndicatorStrings::One("W".into())),
                ..PatternDefinition::new("^start")
            },
            PatternDefinition {
                severity: Some(1),
                error_string: Some(IndicatorStrings::One("E".into())),
                ..PatternDefinition::new("^(\\w)")
            },
        ]);

        let indicators = SeverityIndicators::for_matcher(&definition);
        assert_eq!(indicators.classify("W"), Some(DiagnosticSeverity::Warning));
        assert_eq!(indicators.classify("E"), None);
        assert!(indicators.error.is_fallback());
    }

    #[test]
    fn test_matcher_strings_take_precedence_over_first_step() {
        let mut definition = definition_with_steps(vec![PatternDefinition {
            severity: Some(1),
            info_string: Some(IndicatorStrings::One("I".into())),
            ..PatternDefinition::new("(\\w)")
        }]);
        definition.info_string = Some(IndicatorStrings::One("NOTE".into()));

        let indicators = SeverityIndicators::for_matcher(&definition);
        assert_eq!(
            indicators.classify("NOTE"),
            Some(DiagnosticSeverity::Information)
        );
        assert_eq!(indicators.classify("I"), None);
    }

    #[test]
    fn test_rule_selection() {
        let mut definition = definition_with_steps(vec![PatternDefinition::new("x")]);
        assert_eq!(
            SeverityRule::for_matcher(&definition),
            SeverityRule::Unspecified
        );

        definition.severity = Some("bogus".into());
        assert_eq!(
            SeverityRule::for_matcher(&definition),
            SeverityRule::Fixed(None)
        );

        definition.severity = Some("Error".into());
        assert_eq!(
            SeverityRule::for_matcher(&definition),
            SeverityRule::Fixed(Some(DiagnosticSeverity::Error))
        );
    }
}
