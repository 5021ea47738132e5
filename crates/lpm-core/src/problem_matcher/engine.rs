//! Per-matcher state machine.
//!
//! Each active matcher owns one [`MatcherState`]. For every input line the scanner calls
//! [`advance`] once per matcher; the state machine runs the step under the cursor and decides
//! whether to emit, reset, hold the diagnostic open, or move to the next step.

use crate::diagnostics::{DiagnosticRecord, DiagnosticSeverity, NO_FILE};
use crate::error::ScanError;
use crate::problem_matcher::compiler::{CompiledMatcher, CompiledStep, StepMatch, StepRole};
use crate::problem_matcher::emitter::DiagnosticEmitter;
use crate::problem_matcher::location::{WorkingRange, resolve_location};
use crate::problem_matcher::message::MessageBuffer;
use crate::problem_matcher::path::{PathContext, PathMode};

/// Mutable per-matcher, per-scan cursor and accumulated diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherState {
    cursor: usize,
    range: WorkingRange,
    message: MessageBuffer,
    severity: DiagnosticSeverity,
    code: Option<String>,
    path: String,
    pending: bool,
}

impl Default for MatcherState {
    fn default() -> Self {
        Self {
            cursor: 0,
            range: WorkingRange::default(),
            message: MessageBuffer::default(),
            severity: DiagnosticSeverity::Hint,
            code: None,
            path: NO_FILE.to_string(),
            pending: false,
        }
    }
}

impl MatcherState {
    /// Restart the step sequence with a blank diagnostic.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Index of the step the next line is tested against.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the state holds matched data that has not been emitted yet.
    pub fn is_open(&self) -> bool {
        self.pending
    }

    fn finish(&mut self, matcher: &CompiledMatcher, emitter: &mut DiagnosticEmitter) {
        let record = DiagnosticRecord {
            source: matcher.source.clone(),
            range: self.range.to_range(),
            severity: self.severity,
            message: self.message.as_str().to_string(),
            code: self.code.clone(),
        };
        emitter.emit(&self.path, record);
        self.pending = false;
    }

    /// Emit the diagnostic left open at end of input, if any.
    pub fn flush(&mut self, matcher: &CompiledMatcher, emitter: &mut DiagnosticEmitter) {
        if self.is_open() {
            tracing::debug!(
                matcher = %matcher.title,
                cursor = self.cursor,
                "flushing open diagnostic at end of input"
            );
            self.finish(matcher, emitter);
        }
        self.reset();
    }
}

/// Run `matcher`'s current step against `line` (the 0-based `line_number` of the input).
pub fn advance(
    matcher: &CompiledMatcher,
    state: &mut MatcherState,
    line: &str,
    line_number: usize,
    context: &PathContext,
    emitter: &mut DiagnosticEmitter,
) -> Result<(), ScanError> {
    let last = matcher.steps.len().saturating_sub(1);
    let Some(step) = matcher.steps.get(state.cursor) else {
        return Err(ScanError::MissingStep {
            matcher: matcher.title.clone(),
            cursor: state.cursor,
        });
    };

    let Some(step_match) = step.pattern.captures(line) else {
        if step.is_collecting_message() && state.is_open() {
            state.finish(matcher, emitter);
        }
        state.reset();
        return Ok(());
    };

    apply_step(matcher, step, &step_match, state, line_number, context);
    state.pending = true;

    if state.cursor == last {
        if !step.is_collecting_message() {
            state.finish(matcher, emitter);
        }
        if matcher.steps.len() == 1 || !step.looping {
            state.reset();
        }
    } else {
        state.cursor += 1;
    }

    Ok(())
}

fn apply_step(
    matcher: &CompiledMatcher,
    step: &CompiledStep,
    step_match: &StepMatch<'_>,
    state: &mut MatcherState,
    line_number: usize,
    context: &PathContext,
) {
    let fields = match &step.role {
        StepRole::Extract(fields) => Some(fields),
        StepRole::Continuation { .. } => None,
    };

    state.severity = matcher.severity.resolve(
        fields.and_then(|f| f.severity),
        step_match,
        state.severity,
    );

    if let Some(code) = fields
        .and_then(|f| f.code)
        .and_then(|group| step_match.get(group))
    {
        state.code = Some(code.to_string());
    }

    if matcher.path_mode == PathMode::LogFile {
        state.path = context.log_file();
        // Anchor once per diagnostic, at the line that opened it.
        if state.cursor == 0 {
            state.range = WorkingRange::anchored_at(line_number as i64);
        }
    } else if let Some(fields) = fields {
        if let Some(path) = fields
            .file
            .and_then(|group| step_match.get(group))
            .and_then(|captured| context.resolve_captured(&matcher.path_mode, captured))
        {
            state.path = path;
        }
        resolve_location(
            &fields.location,
            step_match,
            matcher.indexing,
            &mut state.range,
        );
    }

    let message_group = match &step.role {
        StepRole::Continuation { message } => Some(*message),
        StepRole::Extract(fields) => fields.message,
    };
    if let Some(text) = message_group.and_then(|group| step_match.get(group)) {
        state.message.push(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticRange, LINE_END};
    use crate::problem_matcher::compiler::compile_matcher;
    use crate::problem_matcher::definition::{MatcherDefinition, PatternDefinition, PatternList};
    use crate::problem_matcher::message::DEFAULT_MESSAGE;

    fn compile(steps: Vec<PatternDefinition>) -> CompiledMatcher {
        let definition = MatcherDefinition {
            severity: Some("error".into()),
            pattern: Some(PatternList::Many(steps)),
            ..MatcherDefinition::default()
        };
        compile_matcher(&definition, 0).unwrap()
    }

    fn run(matcher: &CompiledMatcher, lines: &[&str]) -> (DiagnosticEmitter, MatcherState) {
        let mut state = MatcherState::default();
        let mut emitter = DiagnosticEmitter::new();
        let ctx = PathContext::default();
        for (n, line) in lines.iter().enumerate() {
            advance(matcher, &mut state, line, n, &ctx, &mut emitter).unwrap();
        }
        (emitter, state)
    }

    #[test]
    fn test_single_step_without_message_uses_default() {
        let matcher = compile(vec![PatternDefinition {
            file: Some(1),
            ..PatternDefinition::new(r"^FAIL (\S+)")
        }]);
        let (emitter, state) = run(&matcher, &["FAIL a.c", "ok", "FAIL a.c"]);
        assert!(!state.is_open());

        let map = emitter.into_map();
        let records = map.get("a.c").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, DEFAULT_MESSAGE);
        assert_eq!(records[0].severity, DiagnosticSeverity::Error);
        // Nothing located: the default range is kept as-is.
        assert_eq!(records[0].range, DiagnosticRange::new(1, 1, 1, 1));
    }

    #[test]
    fn test_fixed_sequence_emits_after_last_step() {
        let matcher = compile(vec![
            PatternDefinition {
                file: Some(1),
                line: Some(2),
                ..PatternDefinition::new(r"^In (\S+) line (\d+)$")
            },
            PatternDefinition {
                message: Some(1),
                ..PatternDefinition::new(r"^\s+(.+)$")
            },
        ]);

        let (emitter, state) = run(&matcher, &["In x.c line 4", "   bad thing", "   ignored"]);
        assert_eq!(state.cursor(), 0);
        let map = emitter.into_map();
        let records = map.get("x.c").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "bad thing");
        // No column captured: the start column keeps its default.
        assert_eq!(records[0].range, DiagnosticRange::new(3, 1, 3, LINE_END));
    }

    #[test]
    fn test_broken_sequence_resets_without_emitting() {
        let matcher = compile(vec![
            PatternDefinition::new(r"^BEGIN$"),
            PatternDefinition {
                message: Some(1),
                ..PatternDefinition::new(r"^msg (.*)$")
            },
        ]);
        let (emitter, state) = run(&matcher, &["BEGIN", "other"]);
        assert_eq!(emitter.emitted(), 0);
        assert!(!state.is_open());
        assert_eq!(state, MatcherState::default());
    }

    #[test]
    fn test_loop_collects_until_non_match() {
        let matcher = compile(vec![
            PatternDefinition {
                file: Some(1),
                line: Some(2),
                ..PatternDefinition::new(r"^ERROR at (\S+):(\d+)$")
            },
            PatternDefinition {
                message: Some(1),
                looping: Some(true),
                ..PatternDefinition::new(r"^\s+(.*)$")
            },
        ]);

        let (emitter, state) = run(&matcher, &["ERROR at foo.c:10", "  first", "  second"]);
        assert!(state.is_open());
        assert_eq!(state.cursor(), 1);
        assert_eq!(emitter.emitted(), 0);

        let (emitter, state) = run(
            &matcher,
            &["ERROR at foo.c:10", "  first", "  second", "done"],
        );
        assert!(!state.is_open());
        let map = emitter.into_map();
        let records = map.get("foo.c").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "first second");
        assert_eq!(records[0].range.start_line, 9);
    }

    #[test]
    fn test_flush_emits_open_diagnostic_once() {
        let matcher = compile(vec![
            PatternDefinition {
                file: Some(1),
                ..PatternDefinition::new(r"^ERROR at (\S+)$")
            },
            PatternDefinition {
                message: Some(1),
                looping: Some(true),
                ..PatternDefinition::new(r"^\s+(.*)$")
            },
        ]);
        let (mut emitter, mut state) = run(&matcher, &["ERROR at foo.c", "  tail"]);
        state.flush(&matcher, &mut emitter);
        state.flush(&matcher, &mut emitter);
        assert_eq!(emitter.emitted(), 1);
    }

    #[test]
    fn test_looping_extract_step_does_not_emit_twice_on_flush() {
        let matcher = compile(vec![
            PatternDefinition::new(r"^Errors:$"),
            PatternDefinition {
                file: Some(1),
                message: Some(2),
                looping: Some(true),
                ..PatternDefinition::new(r"^  (\S+): (.*)$")
            },
        ]);
        let (mut emitter, mut state) = run(&matcher, &["Errors:", "  a.c: one", "  b.c: two"]);
        assert_eq!(emitter.emitted(), 2);
        state.flush(&matcher, &mut emitter);
        assert_eq!(emitter.emitted(), 2);
    }

    #[test]
    fn test_log_file_mode_anchors_at_first_step_line() {
        let definition = MatcherDefinition {
            severity: Some("warning".into()),
            link_to_log_file: Some(crate::problem_matcher::definition::Toggle::Bool(true)),
            pattern: Some(PatternList::Many(vec![
                PatternDefinition {
                    file: Some(1),
                    line: Some(2),
                    ..PatternDefinition::new(r"^WARN (\S+):(\d+)$")
                },
                PatternDefinition {
                    message: Some(1),
                    ..PatternDefinition::new(r"^  (.*)$")
                },
            ])),
            ..MatcherDefinition::default()
        };
        let matcher = compile_matcher(&definition, 0).unwrap();

        let mut state = MatcherState::default();
        let mut emitter = DiagnosticEmitter::new();
        let ctx = PathContext {
            log_path: Some("/logs/build.log".into()),
            workspace_root: None,
        };
        for (n, line) in ["noise", "WARN a.c:99", "  careful"].iter().enumerate() {
            advance(&matcher, &mut state, line, n, &ctx, &mut emitter).unwrap();
        }

        let map = emitter.into_map();
        let records = map.get("/logs/build.log").unwrap();
        assert_eq!(records[0].range, DiagnosticRange::new(1, 0, 1, 0));
        assert_eq!(records[0].message, "careful");
        assert!(map.get("a.c").is_none());
    }

    #[test]
    fn test_code_is_copied_verbatim() {
        let matcher = compile(vec![PatternDefinition {
            code: Some(1),
            message: Some(2),
            ..PatternDefinition::new(r"^\[(\w+)\] (.*)$")
        }]);
        let (emitter, _) = run(&matcher, &["[E0425] cannot find value"]);
        let map = emitter.into_map();
        let record = &map.get(NO_FILE).unwrap()[0];
        assert_eq!(record.code.as_deref(), Some("E0425"));
        assert_eq!(record.message, "cannot find value");
    }
}
