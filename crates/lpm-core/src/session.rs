//! Scan history: the last parser, matchers and log file a host used.
//!
//! The session is an explicit value owned by the host. It is never consulted implicitly; a host
//! passes it to [`ScanSession::resolve`] and updates it with [`ScanSession::record`] after a scan
//! succeeds.

use crate::error::{SelectionError, SettingsError};
use crate::problem_matcher::MatcherDefinition;
use crate::settings::{ParserSettings, Selection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Remembered choices from previous scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSession {
    /// Last parser scanned with.
    #[serde(default)]
    pub parser: Option<String>,
    /// Last matcher titles chosen, per parser.
    #[serde(default)]
    pub matchers: BTreeMap<String, Vec<String>>,
    /// Last scanned log file.
    #[serde(default)]
    pub log: Option<PathBuf>,
}

/// What the host wants to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRequest {
    /// Repeat the last scan.
    Rescan,
    /// New parser/matchers, same log file.
    RescanWithSelection(Selection),
    /// New parser/matchers and a new log file.
    ScanFile(Selection, PathBuf),
}

/// A request resolved against the settings and the session.
#[derive(Debug, Clone)]
pub struct ResolvedScan {
    /// Parser and matcher titles.
    pub selection: Selection,
    /// Log file to scan.
    pub log: PathBuf,
    /// The selected definitions, ready for [`crate::LogScanner::new`].
    pub definitions: Vec<MatcherDefinition>,
}

impl ScanSession {
    /// Load a session file. A missing file is an empty session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the session as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Matchers to pre-select for `parser`: the remembered titles that still exist, else the
    /// parser's default selection.
    pub fn preselected(
        &self,
        parser: &str,
        settings: &ParserSettings,
    ) -> Result<Selection, SelectionError> {
        let titles = settings.matcher_titles(parser)?;
        if let Some(remembered) = self.matchers.get(parser) {
            let still_present: Vec<String> = remembered
                .iter()
                .filter(|title| titles.contains(*title))
                .cloned()
                .collect();
            if !still_present.is_empty() {
                return Ok(Selection::new(parser, still_present));
            }
        }
        settings.default_selection(parser)
    }

    /// Resolve `request` into a concrete parser, matcher set and log file.
    ///
    /// Performs no I/O; every failure is a [`SelectionError`].
    pub fn resolve(
        &self,
        request: ScanRequest,
        settings: &ParserSettings,
    ) -> Result<ResolvedScan, SelectionError> {
        let (selection, log) = match request {
            ScanRequest::Rescan => {
                let parser = match self.parser.as_deref() {
                    Some(parser) if settings.matchers(parser).is_ok() => parser,
                    _ => settings.default_parser()?,
                };
                (self.preselected(parser, settings)?, self.remembered_log()?)
            }
            ScanRequest::RescanWithSelection(selection) => (selection, self.remembered_log()?),
            ScanRequest::ScanFile(selection, log) => (selection, log),
        };

        let definitions = settings.select(&selection)?;
        Ok(ResolvedScan {
            selection,
            log,
            definitions,
        })
    }

    /// Remember a successful scan.
    pub fn record(&mut self, selection: &Selection, log: &Path) {
        self.parser = Some(selection.parser.clone());
        self.matchers
            .insert(selection.parser.clone(), selection.matchers.clone());
        self.log = Some(log.to_path_buf());
    }

    fn remembered_log(&self) -> Result<PathBuf, SelectionError> {
        self.log.clone().ok_or(SelectionError::NoLogFile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ParserSettings {
        ParserSettings::from_json_str(
            r#"{ "parsers": {
                "make": [
                    { "title": "gcc", "pattern": { "regexp": "g" } },
                    { "title": "ld", "defaultSelected": false, "pattern": { "regexp": "l" } }
                ],
                "py": [ { "title": "traceback", "pattern": { "regexp": "t" } } ]
            } }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rescan_without_history_needs_a_log() {
        let session = ScanSession::default();
        let err = session.resolve(ScanRequest::Rescan, &settings()).unwrap_err();
        assert_eq!(err, SelectionError::NoLogFile);
    }

    #[test]
    fn test_record_then_rescan_reuses_everything() {
        let settings = settings();
        let mut session = ScanSession::default();
        let selection = Selection::new("make", vec!["ld".into()]);
        session.record(&selection, Path::new("/tmp/build.log"));

        let resolved = session.resolve(ScanRequest::Rescan, &settings).unwrap();
        assert_eq!(resolved.selection, selection);
        assert_eq!(resolved.log, PathBuf::from("/tmp/build.log"));
        assert_eq!(resolved.definitions.len(), 1);
        assert_eq!(resolved.definitions[0].title.as_deref(), Some("ld"));
    }

    #[test]
    fn test_preselection_falls_back_to_defaults() {
        let settings = settings();
        let mut session = ScanSession::default();
        assert_eq!(
            session.preselected("make", &settings).unwrap().matchers,
            vec!["gcc"]
        );

        session
            .matchers
            .insert("make".into(), vec!["renamed".into()]);
        assert_eq!(
            session.preselected("make", &settings).unwrap().matchers,
            vec!["gcc"]
        );
    }

    #[test]
    fn test_rescan_with_selection_keeps_remembered_log() {
        let settings = settings();
        let mut session = ScanSession::default();
        session.record(
            &Selection::new("make", vec!["gcc".into()]),
            Path::new("a.log"),
        );

        let resolved = session
            .resolve(
                ScanRequest::RescanWithSelection(Selection::new("py", vec!["traceback".into()])),
                &settings,
            )
            .unwrap();
        assert_eq!(resolved.selection.parser, "py");
        assert_eq!(resolved.log, PathBuf::from("a.log"));
    }

    #[test]
    fn test_session_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        assert_eq!(ScanSession::load(&path).unwrap(), ScanSession::default());

        let mut session = ScanSession::default();
        session.record(
            &Selection::new("make", vec!["gcc".into()]),
            Path::new("b.log"),
        );
        session.save(&path).unwrap();
        assert_eq!(ScanSession::load(&path).unwrap(), session);
    }
}
