use crate::cancel::CancellationToken;
use crate::diagnostics::DiagnosticMap;
use crate::error::{ConfigError, ScanError};
use crate::problem_matcher::{
    CompiledMatcher, DiagnosticEmitter, MatcherDefinition, MatcherState, PathContext, advance,
    compile_matcher,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Host-provided settings for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// The scanned file, used by link-to-log-file matchers. [`LogScanner::scan_path`] sets it.
    pub log_path: Option<PathBuf>,
    /// Directory substituted for `${workspaceFolder}`.
    pub workspace_root: Option<PathBuf>,
    /// Exclude matchers with no severity source instead of warning about them.
    pub strict_severity: bool,
}

/// Outcome of compiling a set of matcher definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Matchers left out of the active set, with the reason.
    pub excluded: Vec<ConfigError>,
    /// Matchers kept despite a configuration problem.
    pub warnings: Vec<ConfigError>,
}

impl CompileReport {
    /// Whether every matcher compiled without complaint.
    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty() && self.warnings.is_empty()
    }
}

/// Result of a completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Diagnostics grouped by resolved path.
    pub diagnostics: DiagnosticMap,
    /// Number of input lines processed.
    pub lines_scanned: usize,
}

/// A compiled, reusable set of problem matchers.
///
/// Every scan starts all matchers from their initial state; nothing carries over between scans.
#[derive(Debug, Clone)]
pub struct LogScanner {
    matchers: Vec<CompiledMatcher>,
    options: ScanOptions,
    report: CompileReport,
}

impl LogScanner {
    /// Compile `definitions`, excluding the ones that fail.
    ///
    /// Matchers without a `title` are named after their position in `definitions`.
    pub fn new(definitions: &[MatcherDefinition], options: ScanOptions) -> Self {
        let mut matchers = Vec::with_capacity(definitions.len());
        let mut report = CompileReport::default();

        for (index, definition) in definitions.iter().enumerate() {
            let compiled = match compile_matcher(definition, index) {
                Ok(compiled) => compiled,
                Err(err) => {
                    tracing::warn!(matcher = err.matcher(), "excluding matcher: {err}");
                    report.excluded.push(err);
                    continue;
                }
            };

            if compiled.lacks_severity_source() {
                let err = ConfigError::MissingSeveritySource {
                    matcher: compiled.title.clone(),
                };
                if options.strict_severity {
                    tracing::warn!(matcher = %compiled.title, "excluding matcher: {err}");
                    report.excluded.push(err);
                    continue;
                }
                tracing::warn!(
                    matcher = %compiled.title,
                    "{err}; its diagnostics are reported as hints"
                );
                report.warnings.push(err);
            }

            matchers.push(compiled);
        }

        tracing::debug!(
            active = matchers.len(),
            excluded = report.excluded.len(),
            "problem matchers compiled"
        );

        Self {
            matchers,
            options,
            report,
        }
    }

    /// The active (successfully compiled) matchers.
    pub fn matchers(&self) -> &[CompiledMatcher] {
        &self.matchers
    }

    /// Compile problems found by [`LogScanner::new`].
    pub fn report(&self) -> &CompileReport {
        &self.report
    }

    /// Options the scanner was built with.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Start an incremental scan; push lines with [`Scan::feed`].
    pub fn begin(&self) -> Scan<'_> {
        self.begin_with(PathContext {
            log_path: self.options.log_path.clone(),
            workspace_root: self.options.workspace_root.clone(),
        })
    }

    fn begin_with(&self, context: PathContext) -> Scan<'_> {
        Scan {
            matchers: &self.matchers,
            states: vec![MatcherState::default(); self.matchers.len()],
            emitter: DiagnosticEmitter::new(),
            context,
            line_number: 0,
        }
    }

    /// Scan an in-memory sequence of lines.
    pub fn scan_lines<I, S>(
        &self,
        lines: I,
        cancel: &CancellationToken,
    ) -> Result<ScanOutput, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scan = self.begin();
        for line in lines {
            scan.check(cancel)?;
            scan.feed(line.as_ref())?;
        }
        Ok(scan.finish())
    }

    /// Scan a reader one line at a time. Invalid UTF-8 is replaced, not rejected.
    pub fn scan_reader<R: BufRead>(
        &self,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<ScanOutput, ScanError> {
        self.scan_reader_with(reader, cancel, self.begin())
    }

    /// Open and scan the file at `path`, which becomes the log path of this scan.
    pub fn scan_path(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<ScanOutput, ScanError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "scanning log file");

        let scan = self.begin_with(PathContext {
            log_path: Some(path.to_path_buf()),
            workspace_root: self.options.workspace_root.clone(),
        });
        self.scan_reader_with(BufReader::new(file), cancel, scan)
    }

    fn scan_reader_with<R: BufRead>(
        &self,
        mut reader: R,
        cancel: &CancellationToken,
        mut scan: Scan<'_>,
    ) -> Result<ScanOutput, ScanError> {
        let mut buf = Vec::new();
        loop {
            scan.check(cancel)?;
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = strip_line_ending(&buf);
            scan.feed(&String::from_utf8_lossy(line))?;
        }
        Ok(scan.finish())
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// An in-progress scan over a [`LogScanner`]'s matchers.
#[derive(Debug)]
pub struct Scan<'a> {
    matchers: &'a [CompiledMatcher],
    states: Vec<MatcherState>,
    emitter: DiagnosticEmitter,
    context: PathContext,
    line_number: usize,
}

impl Scan<'_> {
    /// Run every matcher against the next line.
    pub fn feed(&mut self, line: &str) -> Result<(), ScanError> {
        for (matcher, state) in self.matchers.iter().zip(self.states.iter_mut()) {
            advance(
                matcher,
                state,
                line,
                self.line_number,
                &self.context,
                &mut self.emitter,
            )?;
        }
        self.line_number += 1;
        Ok(())
    }

    /// Lines fed so far.
    pub fn lines_scanned(&self) -> usize {
        self.line_number
    }

    /// End the input: emit every diagnostic still open and return the result.
    pub fn finish(mut self) -> ScanOutput {
        for (matcher, state) in self.matchers.iter().zip(self.states.iter_mut()) {
            state.flush(matcher, &mut self.emitter);
        }

        let diagnostics = self.emitter.into_map();
        tracing::debug!(
            lines = self.line_number,
            diagnostics = diagnostics.total(),
            files = diagnostics.len(),
            "scan finished"
        );
        ScanOutput {
            diagnostics,
            lines_scanned: self.line_number,
        }
    }

    fn check(&self, cancel: &CancellationToken) -> Result<(), ScanError> {
        if cancel.is_cancelled() {
            tracing::debug!(lines = self.line_number, "scan cancelled");
            return Err(ScanError::Cancelled {
                lines: self.line_number,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem_matcher::PatternDefinition;
    use std::io::Cursor;

    fn gcc() -> MatcherDefinition {
        serde_json::from_str(
            r#"{
                "title": "gcc",
                "pattern": {
                    "regexp": "^(.*):(\\d+):(\\d+): (error|warning): (.*)$",
                    "file": 1, "line": 2, "column": 3, "severity": 4, "message": 5
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_reader_strips_crlf_and_decodes_lossily() {
        let scanner = LogScanner::new(&[gcc()], ScanOptions::default());
        let mut input = b"a.c:1:1: error: bad \xff\r\nb.c:2:2: warning: meh\n".to_vec();
        input.extend_from_slice(b"tail without newline");

        let output = scanner
            .scan_reader(Cursor::new(input), &CancellationToken::new())
            .unwrap();
        assert_eq!(output.lines_scanned, 3);
        assert_eq!(
            output.diagnostics.get("a.c").unwrap()[0].message,
            "bad \u{fffd}"
        );
        assert_eq!(output.diagnostics.get("b.c").unwrap()[0].message, "meh");
    }

    #[test]
    fn test_cancelled_scan_returns_no_partial_result() {
        let scanner = LogScanner::new(&[gcc()], ScanOptions::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = scanner.scan_lines(["a.c:1:1: error: x"], &cancel).unwrap_err();
        assert!(matches!(err, ScanError::Cancelled { lines: 0 }));
    }

    #[test]
    fn test_compile_report_excludes_broken_matchers() {
        let broken = MatcherDefinition {
            title: Some("broken".into()),
            pattern: Some(crate::problem_matcher::PatternList::One(
                PatternDefinition::default(),
            )),
            ..MatcherDefinition::default()
        };
        let no_severity = MatcherDefinition {
            pattern: Some(crate::problem_matcher::PatternList::One(
                PatternDefinition::new("x"),
            )),
            ..MatcherDefinition::default()
        };

        let scanner = LogScanner::new(
            &[broken.clone(), gcc(), no_severity.clone()],
            ScanOptions::default(),
        );
        assert_eq!(scanner.matchers().len(), 2);
        assert_eq!(scanner.report().excluded.len(), 1);
        assert_eq!(scanner.report().excluded[0].matcher(), "broken");
        assert_eq!(
            scanner.report().warnings,
            vec![ConfigError::MissingSeveritySource {
                matcher: "Matcher 2".into()
            }]
        );

        let strict = LogScanner::new(
            &[broken, gcc(), no_severity],
            ScanOptions {
                strict_severity: true,
                ..ScanOptions::default()
            },
        );
        assert_eq!(strict.matchers().len(), 1);
        assert_eq!(strict.report().excluded.len(), 2);
        assert!(strict.report().warnings.is_empty());
    }

    #[test]
    fn test_incremental_scan_matches_batch_scan() {
        let scanner = LogScanner::new(&[gcc()], ScanOptions::default());
        let lines = ["x.c:1:2: error: one", "noise", "y.c:3:4: warning: two"];

        let mut scan = scanner.begin();
        for line in lines {
            scan.feed(line).unwrap();
        }
        assert_eq!(scan.lines_scanned(), 3);
        let incremental = scan.finish();

        let batch = scanner
            .scan_lines(lines, &CancellationToken::new())
            .unwrap();
        assert_eq!(incremental, batch);
    }
}
