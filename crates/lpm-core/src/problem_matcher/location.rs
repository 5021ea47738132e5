//! Location extraction and index normalization.
//!
//! Captured positions are accumulated as signed values so one-based → zero-based adjustment can
//! dip below zero before the final clamp.

use crate::diagnostics::{DiagnosticRange, LINE_END};
use crate::problem_matcher::compiler::StepMatch;

const END: i64 = LINE_END as i64;

/// How a step extracts its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationCapture {
    /// The matcher reports whole-file problems (`kind: "file"`); location is left untouched.
    WholeFile,
    /// One capture encoding 1, 2–3 or 4+ numbers.
    Combined(usize),
    /// Independent line/column captures (any subset, including none).
    Discrete(DiscreteCaptures),
}

/// Capture groups for [`LocationCapture::Discrete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscreteCaptures {
    /// Start line group.
    pub line: Option<usize>,
    /// End line group.
    pub end_line: Option<usize>,
    /// Start column group.
    pub column: Option<usize>,
    /// End column group.
    pub end_column: Option<usize>,
}

/// Which conventions captured positions follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indexing {
    /// Lines and columns are both zero-based; no adjustment at all.
    pub whole_range_zero_based: bool,
    /// Lines are zero-based.
    pub line_zero_based: bool,
    /// Columns are zero-based.
    pub column_zero_based: bool,
}

/// Which endpoints a normalization pass touches.
#[derive(Debug, Clone, Copy, Default)]
struct Endpoints {
    start_line: bool,
    end_line: bool,
    start_char: bool,
    end_char: bool,
}

impl Endpoints {
    const ALL: Self = Self {
        start_line: true,
        end_line: true,
        start_char: true,
        end_char: true,
    };
}

impl Indexing {
    fn adjust_lines(&self) -> bool {
        !self.whole_range_zero_based && !self.line_zero_based
    }

    fn adjust_columns(&self) -> bool {
        !self.whole_range_zero_based && !self.column_zero_based
    }

    fn normalize(&self, range: &mut WorkingRange, endpoints: Endpoints) {
        if self.adjust_lines() {
            if endpoints.start_line {
                range.start_line = one_down(range.start_line);
            }
            if endpoints.end_line {
                range.end_line = one_down(range.end_line);
            }
        }
        if self.adjust_columns() {
            if endpoints.start_char {
                range.start_char = one_down(range.start_char);
            }
            if endpoints.end_char {
                range.end_char = one_down(range.end_char);
            }
        }
    }
}

// LINE_END is a marker, not a position.
fn one_down(value: i64) -> i64 {
    if value == END { value } else { value - 1 }
}

/// Range under construction for an open diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingRange {
    /// Start line.
    pub start_line: i64,
    /// Start column.
    pub start_char: i64,
    /// End line.
    pub end_line: i64,
    /// End column.
    pub end_char: i64,
}

impl Default for WorkingRange {
    fn default() -> Self {
        Self {
            start_line: 1,
            start_char: 1,
            end_line: 1,
            end_char: 1,
        }
    }
}

impl WorkingRange {
    /// A zero-width range anchored at the start of `line`.
    pub fn anchored_at(line: i64) -> Self {
        Self {
            start_line: line,
            start_char: 0,
            end_line: line,
            end_char: 0,
        }
    }

    /// Parse a combined location capture.
    ///
    /// - 1 number: `(line, 1, line, LINE_END)`
    /// - 2 or 3 numbers: `(first, 1, second, LINE_END)`; a third number is ignored
    /// - 4+ numbers: `(startLine, startChar, endLine, endChar)`
    ///
    /// Text without any digit is read as `"1,1,1,1"`.
    pub fn parse_combined(text: &str) -> Self {
        let numbers: Vec<i64> = digit_runs(text).collect();
        match numbers.as_slice() {
            [] => Self::default(),
            [line] => Self {
                start_line: *line,
                start_char: 1,
                end_line: *line,
                end_char: END,
            },
            [start, end] | [start, end, _] => Self {
                start_line: *start,
                start_char: 1,
                end_line: *end,
                end_char: END,
            },
            [start_line, start_char, end_line, end_char, ..] => Self {
                start_line: *start_line,
                start_char: *start_char,
                end_line: *end_line,
                end_char: *end_char,
            },
        }
    }

    /// Clamp every endpoint to `0..=LINE_END`.
    pub fn clamp(&mut self) {
        for value in [
            &mut self.start_line,
            &mut self.start_char,
            &mut self.end_line,
            &mut self.end_char,
        ] {
            *value = (*value).clamp(0, END);
        }
    }

    /// Convert to the public range type, clamping out-of-range values.
    pub fn to_range(self) -> DiagnosticRange {
        let clamp = |v: i64| v.clamp(0, END) as u32;
        DiagnosticRange::new(
            clamp(self.start_line),
            clamp(self.start_char),
            clamp(self.end_line),
            clamp(self.end_char),
        )
    }
}

/// Maximal runs of ASCII digits, parsed. Runs too long for `i64` saturate to [`LINE_END`].
fn digit_runs(text: &str) -> impl Iterator<Item = i64> + '_ {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.parse::<i64>().unwrap_or(END))
}

fn parse_position(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Apply a step's location capture to `range`, then clamp to non-negative values.
///
/// Does nothing for [`LocationCapture::WholeFile`].
pub fn resolve_location(
    capture: &LocationCapture,
    step_match: &StepMatch<'_>,
    indexing: Indexing,
    range: &mut WorkingRange,
) {
    match capture {
        LocationCapture::WholeFile => return,
        LocationCapture::Combined(group) => {
            *range = WorkingRange::parse_combined(step_match.get(*group).unwrap_or("1,1,1,1"));
            indexing.normalize(range, Endpoints::ALL);
        }
        LocationCapture::Discrete(groups) => {
            resolve_discrete(groups, step_match, indexing, range);
        }
    }

    range.clamp();
}

fn resolve_discrete(
    groups: &DiscreteCaptures,
    step_match: &StepMatch<'_>,
    indexing: Indexing,
    range: &mut WorkingRange,
) {
    let captured = |group: Option<usize>| {
        group
            .and_then(|g| step_match.get(g))
            .and_then(parse_position)
    };

    if let Some(line) = captured(groups.line) {
        // Whole-line default; refined below when end line/column are captured too.
        range.start_line = line;
        range.end_line = line;
        range.end_char = END;
        indexing.normalize(
            range,
            Endpoints {
                start_line: true,
                end_line: true,
                end_char: true,
                ..Endpoints::default()
            },
        );
    }
    if let Some(end_line) = captured(groups.end_line) {
        range.end_line = end_line;
        indexing.normalize(
            range,
            Endpoints {
                end_line: true,
                ..Endpoints::default()
            },
        );
    }
    if let Some(column) = captured(groups.column) {
        range.start_char = column;
        indexing.normalize(
            range,
            Endpoints {
                start_char: true,
                ..Endpoints::default()
            },
        );
    }
    if let Some(end_column) = captured(groups.end_column) {
        range.end_char = end_column;
        indexing.normalize(
            range,
            Endpoints {
                end_char: true,
                ..Endpoints::default()
            },
        );
    }
}
