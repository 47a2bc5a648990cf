//! Bottom-up filesystem tree enumeration and listing operations.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::spec::TreeOpError;
use crate::util::{SpecTreeMatchers, normalize_path};

////////////////////////////////////////////////////////////////////////////////
// #region TreeWalk

/// Which entries a [`TreeWalk`] yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTreeView {
    /// Directories only, base directory included.
    Dirs,
    /// Files only.
    Files,
    /// Directories and files intermixed, each exactly once.
    Paths,
}

struct SpecWalkFrame {
    path_dir: PathBuf,
    iter_entries: fs::ReadDir,
}

/// Lazy post-order iterator over a directory tree.
///
/// Every directory and file under the base directory is yielded exactly
/// once, hidden entries included. A directory is yielded only after all of
/// its descendants (bottom-up), so the base directory comes last; deletion
/// consumers rely on that order. One `read_dir` handle is held per open
/// ancestor, so memory stays bounded by tree depth, not tree size.
///
/// Symlink entries are classified by what the filesystem resolves them to
/// but are never descended into, which keeps the walk from re-entering the
/// same physical directory twice. Unreadable subdirectories are logged and
/// skipped.
pub struct TreeWalk {
    view: EnumTreeView,
    l_frames: Vec<SpecWalkFrame>,
}

impl TreeWalk {
    /// Start a walk over `path_base_dir` with the given view.
    ///
    /// Fails with [`TreeOpError::NotADirectory`] when the base does not
    /// exist or is not a directory.
    pub fn new<P: AsRef<Path>>(path_base_dir: P, view: EnumTreeView) -> Result<Self, TreeOpError> {
        let path_base_dir = normalize_path(path_base_dir.as_ref());
        if !path_base_dir.is_dir() {
            return Err(TreeOpError::NotADirectory(path_base_dir));
        }

        let iter_entries = fs::read_dir(&path_base_dir).map_err(|e| TreeOpError::ReadDir {
            path: path_base_dir.clone(),
            source: e,
        })?;
        Ok(Self {
            view,
            l_frames: vec![SpecWalkFrame {
                path_dir: path_base_dir,
                iter_entries,
            }],
        })
    }

    /// Directories-only view, base directory included.
    pub fn dirs<P: AsRef<Path>>(path_base_dir: P) -> Result<Self, TreeOpError> {
        Self::new(path_base_dir, EnumTreeView::Dirs)
    }

    /// Files-only view.
    pub fn files<P: AsRef<Path>>(path_base_dir: P) -> Result<Self, TreeOpError> {
        Self::new(path_base_dir, EnumTreeView::Files)
    }

    /// Combined view: directories and files, each exactly once.
    pub fn paths<P: AsRef<Path>>(path_base_dir: P) -> Result<Self, TreeOpError> {
        Self::new(path_base_dir, EnumTreeView::Paths)
    }

    fn _yields_dirs(&self) -> bool {
        self.view != EnumTreeView::Files
    }

    fn _yields_files(&self) -> bool {
        self.view != EnumTreeView::Dirs
    }
}

impl Iterator for TreeWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let frame = self.l_frames.last_mut()?;

            let entry = match frame.iter_entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    log::warn!(
                        "Failed to read entry under {} ({e})",
                        frame.path_dir.display()
                    );
                    continue;
                }
                None => {
                    // Directory exhausted: all descendants were yielded,
                    // now the directory itself.
                    if let Some(frame) = self.l_frames.pop()
                        && self._yields_dirs()
                    {
                        return Some(frame.path_dir);
                    }
                    continue;
                }
            };

            let path_entry = entry.path();
            let file_type = match entry.file_type() {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Failed to inspect {} ({e})", path_entry.display());
                    continue;
                }
            };

            let if_is_symlink = file_type.is_symlink();
            let if_is_dir = file_type.is_dir() || (if_is_symlink && path_entry.is_dir());

            if !if_is_dir {
                if self._yields_files() {
                    return Some(path_entry);
                }
                continue;
            }

            if if_is_symlink {
                // Listed as a directory, never entered.
                if self._yields_dirs() {
                    return Some(path_entry);
                }
                continue;
            }

            match fs::read_dir(&path_entry) {
                Ok(iter_entries) => {
                    self.l_frames.push(SpecWalkFrame {
                        path_dir: path_entry,
                        iter_entries,
                    });
                }
                Err(e) => {
                    log::warn!("Failed to read directory {} ({e})", path_entry.display());
                    if self._yields_dirs() {
                        return Some(path_entry);
                    }
                }
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ListOperations

/// All directories under the base directory (the base itself included)
/// which pass the match/unmatch patterns, bottom-up.
pub fn list_directories<P: AsRef<Path>>(
    path_base_dir: P,
    patterns_match: &[String],
    patterns_unmatch: &[String],
) -> Result<Vec<PathBuf>, TreeOpError> {
    let spec_matchers = SpecTreeMatchers::from_raw(patterns_match, patterns_unmatch)?;
    let walk = TreeWalk::dirs(path_base_dir)?;
    Ok(walk.filter(|p| spec_matchers.is_selected(p)).collect())
}

/// All files (not directories) under the base directory, recursive,
/// dotted files in dotted directories included.
pub fn list_files<P: AsRef<Path>>(path_base_dir: P) -> Result<Vec<PathBuf>, TreeOpError> {
    Ok(TreeWalk::files(path_base_dir)?.collect())
}

/// All directories and files under the base directory (the base itself
/// included) which pass the match/unmatch patterns, bottom-up.
pub fn list_paths<P: AsRef<Path>>(
    path_base_dir: P,
    patterns_match: &[String],
    patterns_unmatch: &[String],
) -> Result<Vec<PathBuf>, TreeOpError> {
    let spec_matchers = SpecTreeMatchers::from_raw(patterns_match, patterns_unmatch)?;
    let walk = TreeWalk::paths(path_base_dir)?;
    Ok(walk.filter(|p| spec_matchers.is_selected(p)).collect())
}

/// Expand a mixed list of files and directories into the deduplicated set
/// of contained files.
///
/// Directories are expanded recursively when `if_expand_subdirs` is set and
/// dropped otherwise; entries that are neither file nor directory are
/// skipped. The result is an ordered set, so output order is reproducible
/// regardless of input order.
pub fn expand_to_files(
    paths: &[PathBuf],
    if_expand_subdirs: bool,
) -> Result<BTreeSet<PathBuf>, TreeOpError> {
    let mut set_files = BTreeSet::new();

    for path in paths {
        let path = normalize_path(path);
        if path.is_file() {
            set_files.insert(path);
        } else if path.is_dir() && if_expand_subdirs {
            set_files.extend(TreeWalk::files(&path)?);
        }
    }
    Ok(set_files)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
