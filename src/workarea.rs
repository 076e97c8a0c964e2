//! Work area resolution.
//!
//! A [`WorkArea`] is the directory the tools are pointed at. Snippet work
//! areas own a temporary directory that is removed when the `WorkArea` is
//! dropped, on every exit path including panics and cancellation. Project
//! and file work areas borrow caller-owned directories and never delete
//! anything.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{AnalysisError, Result};
use crate::models::InputMode;

/// File name a snippet is written to.
pub const SNIPPET_FILE_NAME: &str = "main.go";

const TEMP_PREFIX: &str = "go-standards-";

/// Directory names never counted as analyzed sources.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata", "node_modules"];

/// The filesystem root a single analysis runs against.
#[derive(Debug)]
pub struct WorkArea {
    root: PathBuf,
    /// Held only for its Drop, which deletes the snippet directory.
    _owned: Option<TempDir>,
}

impl WorkArea {
    /// Resolve an input mode into a work area.
    ///
    /// Snippet directories are created under `temp_dir`.
    pub fn resolve(input: InputMode<'_>, temp_dir: &Path) -> Result<Self> {
        match input {
            InputMode::Project(dir) => Ok(Self::borrowed(absolute(dir)?)),
            InputMode::File(file) => {
                let file = absolute(file)?;
                let root = file
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| {
                        AnalysisError::Input(format!("{} has no parent directory", file.display()))
                    })?;
                Ok(Self::borrowed(root))
            }
            InputMode::Snippet(code) => Self::snippet(code, temp_dir),
        }
    }

    fn borrowed(root: PathBuf) -> Self {
        Self { root, _owned: None }
    }

    fn snippet(code: &str, temp_dir: &Path) -> Result<Self> {
        fs::create_dir_all(temp_dir).map_err(|e| AnalysisError::WorkArea {
            message: format!("failed to create {}", temp_dir.display()),
            source: e,
        })?;

        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(temp_dir)
            .map_err(|e| AnalysisError::WorkArea {
                message: "failed to create temp dir".to_string(),
                source: e,
            })?;

        // On failure `dir` is dropped here, removing the partial directory.
        fs::write(dir.path().join(SNIPPET_FILE_NAME), code).map_err(|e| {
            AnalysisError::WorkArea {
                message: "failed to write temp file".to_string(),
                source: e,
            }
        })?;

        debug!(root = %dir.path().display(), "created snippet work area");
        Ok(Self {
            root: dir.path().to_path_buf(),
            _owned: Some(dir),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Count Go source files and their total lines under the root.
    pub fn count_sources(&self) -> SourceStats {
        count_go_sources(&self.root)
    }
}

/// Go sources found in a work area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub files: usize,
    pub lines: usize,
}

/// Walk `root` counting `*.go` files, skipping hidden and vendored dirs.
pub fn count_go_sources(root: &Path) -> SourceStats {
    let mut stats = SourceStats::default();

    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
    });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        stats.files += 1;
        if let Ok(content) = fs::read_to_string(entry.path()) {
            stats.lines += content.lines().count();
        }
    }

    stats
}

fn absolute(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| {
        AnalysisError::Input(format!("cannot access path {}: {}", path.display(), e))
    })
}
