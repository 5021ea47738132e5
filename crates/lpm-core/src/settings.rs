//! The parser settings document and matcher selection.
//!
//! A settings document maps parser names to ordered lists of [`MatcherDefinition`]s. Three
//! document shapes are accepted:
//!
//! ```json
//! { "parsers": { "gcc": [ ... ] } }
//! { "log-problem-matcher.parsers": { "gcc": [ ... ] } }
//! { "log-problem-matcher": { "parsers": { "gcc": [ ... ] } } }
//! ```
//!
//! Other top-level keys are ignored, so an editor `settings.json` can be loaded as-is.

use crate::error::{SelectionError, SettingsError};
use crate::problem_matcher::MatcherDefinition;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

/// Parser name → matcher definitions, in document order.
#[derive(Debug, Clone, Default)]
pub struct ParserSettings {
    parsers: Vec<(String, Vec<MatcherDefinition>)>,
}

impl<'de> Deserialize<'de> for ParserSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParsersVisitor;

        impl<'de> Visitor<'de> for ParsersVisitor {
            type Value = ParserSettings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parser names to lists of problem matchers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut parsers = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, matchers)) =
                    map.next_entry::<String, Vec<MatcherDefinition>>()?
                {
                    parsers.push((name, matchers));
                }
                Ok(ParserSettings { parsers })
            }
        }

        deserializer.deserialize_map(ParsersVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    parsers: Option<ParserSettings>,
    #[serde(default, rename = "log-problem-matcher.parsers")]
    flat: Option<ParserSettings>,
    #[serde(default, rename = "log-problem-matcher")]
    section: Option<SettingsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    #[serde(default)]
    parsers: Option<ParserSettings>,
}

impl SettingsDocument {
    fn into_settings(self) -> ParserSettings {
        self.parsers
            .or(self.flat)
            .or(self.section.and_then(|s| s.parsers))
            .unwrap_or_default()
    }
}

/// A parser plus the titles of the matchers chosen from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Parser name.
    pub parser: String,
    /// Chosen matcher titles.
    pub matchers: Vec<String>,
}

impl Selection {
    /// Create a selection.
    pub fn new(parser: impl Into<String>, matchers: Vec<String>) -> Self {
        Self {
            parser: parser.into(),
            matchers,
        }
    }
}

impl ParserSettings {
    /// Parse a JSON settings document.
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        let document: SettingsDocument = serde_json::from_str(text)?;
        Ok(document.into_settings())
    }

    /// Parse a YAML settings document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        let document: SettingsDocument = serde_yaml::from_str(text)?;
        Ok(document.into_settings())
    }

    /// Load a settings file; `.yaml`/`.yml` files are read as YAML, everything else as JSON.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let settings = if is_yaml {
            Self::from_yaml_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        tracing::debug!(
            path = %path.display(),
            parsers = settings.parsers.len(),
            "loaded parser settings"
        );
        Ok(settings)
    }

    /// Parser names in document order.
    pub fn parser_names(&self) -> Result<Vec<&str>, SelectionError> {
        if self.parsers.is_empty() {
            return Err(SelectionError::NoParsers);
        }
        Ok(self.parsers.iter().map(|(name, _)| name.as_str()).collect())
    }

    /// The first parser of the document.
    pub fn default_parser(&self) -> Result<&str, SelectionError> {
        self.parsers
            .first()
            .map(|(name, _)| name.as_str())
            .ok_or(SelectionError::NoParsers)
    }

    /// Matcher definitions of `parser`.
    pub fn matchers(&self, parser: &str) -> Result<&[MatcherDefinition], SelectionError> {
        if self.parsers.is_empty() {
            return Err(SelectionError::NoParsers);
        }
        let (_, matchers) = self
            .parsers
            .iter()
            .find(|(name, _)| name == parser)
            .ok_or_else(|| SelectionError::UnknownParser(parser.to_string()))?;
        if matchers.is_empty() {
            return Err(SelectionError::NoMatchers(parser.to_string()));
        }
        Ok(matchers)
    }

    /// Titles of `parser`'s matchers, `Matcher <index>` for untitled ones.
    pub fn matcher_titles(&self, parser: &str) -> Result<Vec<String>, SelectionError> {
        Ok(self
            .matchers(parser)?
            .iter()
            .enumerate()
            .map(|(index, m)| m.title_or_default(index))
            .collect())
    }

    /// Every matcher of `parser` that is selected by default.
    pub fn default_selection(&self, parser: &str) -> Result<Selection, SelectionError> {
        let matchers = self
            .matchers(parser)?
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_default_selected())
            .map(|(index, m)| m.title_or_default(index))
            .collect();
        Ok(Selection::new(parser, matchers))
    }

    /// The selected definitions in document order, titled so that compiling them in isolation
    /// keeps their parser-relative names.
    pub fn select(&self, selection: &Selection) -> Result<Vec<MatcherDefinition>, SelectionError> {
        let selected: Vec<MatcherDefinition> = self
            .matchers(&selection.parser)?
            .iter()
            .enumerate()
            .filter_map(|(index, m)| {
                let title = m.title_or_default(index);
                selection.matchers.contains(&title).then(|| MatcherDefinition {
                    title: Some(title),
                    ..m.clone()
                })
            })
            .collect();

        if selected.is_empty() {
            return Err(SelectionError::NothingSelected(selection.parser.clone()));
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "editor.tabSize": 4,
        "log-problem-matcher.parsers": {
            "zeta": [ { "pattern": { "regexp": "z" } } ],
            "alpha": [
                { "title": "first", "pattern": { "regexp": "a" } },
                { "defaultSelected": false, "pattern": { "regexp": "b" } },
                { "pattern": [ { "regexp": "c" }, { "regexp": "d", "loop": true } ] }
            ],
            "empty": []
        }
    }"#;

    #[test]
    fn test_parser_order_is_document_order() {
        let settings = ParserSettings::from_json_str(DOC).unwrap();
        assert_eq!(
            settings.parser_names().unwrap(),
            vec!["zeta", "alpha", "empty"]
        );
        assert_eq!(settings.default_parser().unwrap(), "zeta");
    }

    #[test]
    fn test_titles_and_default_selection() {
        let settings = ParserSettings::from_json_str(DOC).unwrap();
        assert_eq!(
            settings.matcher_titles("alpha").unwrap(),
            vec!["first", "Matcher 1", "Matcher 2"]
        );
        assert_eq!(
            settings.default_selection("alpha").unwrap().matchers,
            vec!["first", "Matcher 2"]
        );
    }

    #[test]
    fn test_selection_errors() {
        let settings = ParserSettings::from_json_str(DOC).unwrap();
        assert_eq!(
            settings.matchers("nope").unwrap_err(),
            SelectionError::UnknownParser("nope".into())
        );
        assert_eq!(
            settings.matchers("empty").unwrap_err(),
            SelectionError::NoMatchers("empty".into())
        );
        assert_eq!(
            settings
                .select(&Selection::new("alpha", vec!["missing".into()]))
                .unwrap_err(),
            SelectionError::NothingSelected("alpha".into())
        );

        let empty = ParserSettings::from_json_str("{}").unwrap();
        assert_eq!(empty.parser_names().unwrap_err(), SelectionError::NoParsers);
        assert_eq!(
            empty.matchers("alpha").unwrap_err(),
            SelectionError::NoParsers
        );
    }

    #[test]
    fn test_select_keeps_parser_relative_titles() {
        let settings = ParserSettings::from_json_str(DOC).unwrap();
        let selected = settings
            .select(&Selection::new("alpha", vec!["Matcher 2".into()]))
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].title.as_deref(), Some("Matcher 2"));
        assert_eq!(selected[0].steps().len(), 2);
    }
}
