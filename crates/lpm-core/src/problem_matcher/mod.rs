//! Problem matcher definitions and the per-matcher scan machinery.
//!
//! A [`MatcherDefinition`] is compiled once into a [`CompiledMatcher`]; the scanner then drives
//! one [`MatcherState`] per compiled matcher across the input lines.

mod compiler;
mod definition;
mod emitter;
mod engine;
mod location;
mod message;
mod path;
mod severity;

pub use compiler::{
    CompiledMatcher, CompiledStep, FieldCaptures, Pattern, SOURCE_LABEL, StepMatch, StepRole,
    compile_matcher,
};
pub use definition::{
    FileLocation, IndicatorStrings, MatcherDefinition, PatternDefinition, PatternList, Toggle,
};
pub use emitter::DiagnosticEmitter;
pub use engine::{MatcherState, advance};
pub use location::{DiscreteCaptures, Indexing, LocationCapture, WorkingRange, resolve_location};
pub use message::{DEFAULT_MESSAGE, MessageBuffer};
pub use path::{BaseDir, PathContext, PathMode};
pub use severity::{Indicator, SeverityIndicators, SeverityRule, parse_static_severity};
