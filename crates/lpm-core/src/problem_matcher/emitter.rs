use crate::diagnostics::{DiagnosticMap, DiagnosticRecord};

/// Collects finished diagnostics for one scan.
#[derive(Debug, Default)]
pub struct DiagnosticEmitter {
    map: DiagnosticMap,
}

impl DiagnosticEmitter {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished diagnostic under `path`.
    pub fn emit(&mut self, path: &str, record: DiagnosticRecord) {
        tracing::trace!(
            path,
            line = record.range.start_line,
            severity = record.severity.label(),
            source = %record.source,
            "emit diagnostic"
        );
        self.map.push(path, record);
    }

    /// Number of diagnostics emitted so far.
    pub fn emitted(&self) -> usize {
        self.map.total()
    }

    /// Finish, returning the grouped diagnostics.
    pub fn into_map(self) -> DiagnosticMap {
        self.map
    }
}
