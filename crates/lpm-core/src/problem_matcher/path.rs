//! Path resolution for diagnostics.

use crate::diagnostics::NO_FILE;
use std::path::{Path, PathBuf};

const WORKSPACE_FOLDER: &str = "${workspaceFolder}";

/// How a matcher resolves the path a diagnostic is reported against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMode {
    /// Every diagnostic points at the scanned log file.
    LogFile,
    /// Captured paths are used verbatim.
    Absolute,
    /// Captured paths are joined to a base directory.
    Relative(BaseDir),
}

/// Base directory of [`PathMode::Relative`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseDir {
    /// The host workspace root (`${workspaceFolder}`).
    Workspace,
    /// A literal directory.
    Literal(PathBuf),
}

/// Host-provided paths a scan resolves against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathContext {
    /// The file being scanned, if any.
    pub log_path: Option<PathBuf>,
    /// Workspace root substituted for `${workspaceFolder}`.
    pub workspace_root: Option<PathBuf>,
}

impl BaseDir {
    /// `${workspaceFolder}` (any case) selects the workspace root; anything else is literal.
    pub fn parse(base: &str) -> Self {
        if base.eq_ignore_ascii_case(WORKSPACE_FOLDER) {
            Self::Workspace
        } else {
            Self::Literal(PathBuf::from(base))
        }
    }
}

impl PathContext {
    /// The scanned log file, or [`NO_FILE`] when scanning an anonymous stream.
    pub fn log_file(&self) -> String {
        self.log_path
            .as_deref()
            .map(display)
            .unwrap_or_else(|| NO_FILE.to_string())
    }

    /// Resolve a captured path under `mode`.
    ///
    /// Returns `None` when the mode ignores captures ([`PathMode::LogFile`]) or the capture is
    /// empty.
    pub fn resolve_captured(&self, mode: &PathMode, captured: &str) -> Option<String> {
        if captured.is_empty() {
            return None;
        }
        match mode {
            PathMode::LogFile => None,
            PathMode::Absolute => Some(captured.to_string()),
            PathMode::Relative(base) => {
                let base = match base {
                    BaseDir::Workspace => match &self.workspace_root {
                        Some(root) => root.clone(),
                        None => PathBuf::from(WORKSPACE_FOLDER),
                    },
                    BaseDir::Literal(dir) => dir.clone(),
                };
                Some(display(&base.join(captured)))
            }
        }
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
