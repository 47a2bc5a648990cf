//! Operation option models and top-level error types.

use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Input options for `copy_tree`.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Match patterns applied to the full absolute path. Empty means
    /// "match everything" (`*`).
    pub patterns_match: Vec<String>,
    /// Unmatch patterns applied to the full absolute path; an unmatch hit
    /// excludes the path regardless of match status. Empty means
    /// "exclude nothing".
    pub patterns_unmatch: Vec<String>,
    /// Create matched directories in the target even when they end up empty.
    pub if_preserve_empty_dirs: bool,
    /// Dispatch copy tasks to a bounded thread pool.
    pub if_parallel: bool,
    /// Worker threads for the copy stage. `None` picks a small default;
    /// the bottleneck is filesystem I/O, not CPU.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_match: Vec::new(),
            patterns_unmatch: Vec::new(),
            if_preserve_empty_dirs: true,
            if_parallel: true,
            num_workers_max: None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// One per-item failure with path + error text.
///
/// Collected in run reports so that one bad file does not mask the rest of
/// a completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecItemError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// "Top-level call failed" errors (input validation / setup stage).
///
/// Every variant is raised before any filesystem mutation; per-item I/O
/// failures during the bulk phase go into the run report instead.
#[derive(Debug, Error)]
pub enum TreeOpError {
    /// Base/source path does not exist or is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Target directory is nested inside the source directory; copying
    /// would recurse into its own output.
    #[error("Target directory {} is inside source directory {}", .path_target.display(), .path_source.display())]
    TargetInsideSource {
        /// Normalized source directory.
        path_source: PathBuf,
        /// Normalized target directory.
        path_target: PathBuf,
    },
    /// Deletion root is too close to the filesystem root.
    #[error("Refusing to delete below {}: minimal depth setting {minimal_depth} prevents that", .path.display())]
    BelowMinimalDepth {
        /// Normalized deletion root.
        path: PathBuf,
        /// Effective minimal depth policy value.
        minimal_depth: usize,
    },
    /// Invalid match/unmatch glob pattern.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    /// Reading the root directory failed after the directory check passed.
    #[error("Failed to read directory {}", .path.display())]
    ReadDir {
        /// Directory that failed to enumerate.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
