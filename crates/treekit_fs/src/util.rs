use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};

use crate::spec::TreeOpError;

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// Compiled match/unmatch pattern pair.
///
/// Matching is applied to the full absolute path string, so patterns like
/// `*/.hidden*/*` anchor on path segments. `globset` keeps fnmatch
/// semantics here: `*` and `?` cross path separators, `[seq]` is supported,
/// case sensitivity follows the pattern as written.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecTreeMatchers {
    patterns_match: Option<Vec<GlobMatcher>>,
    patterns_unmatch: Option<Vec<GlobMatcher>>,
}

impl SpecTreeMatchers {
    /// Compile raw pattern lists. An empty match list defaults to
    /// "match everything"; an empty unmatch list defaults to
    /// "exclude nothing".
    pub(crate) fn from_raw(
        patterns_match: &[String],
        patterns_unmatch: &[String],
    ) -> Result<Self, TreeOpError> {
        Ok(Self {
            patterns_match: _compile(patterns_match)?,
            patterns_unmatch: _compile(patterns_unmatch)?,
        })
    }

    /// Pure selection predicate: selected iff the path matches at least one
    /// match pattern AND matches no unmatch pattern. Unmatch wins.
    ///
    /// Never touches the filesystem.
    pub(crate) fn is_selected(&self, path: &Path) -> bool {
        _should_include(path, self.patterns_match.as_deref())
            && !_should_exclude(path, self.patterns_unmatch.as_deref())
    }
}

fn _compile(patterns: &[String]) -> Result<Option<Vec<GlobMatcher>>, TreeOpError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut l_matchers = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let matcher = Glob::new(pattern)
            .map_err(|e| {
                TreeOpError::InvalidPattern(format!("Invalid pattern in match/unmatch: {e}"))
            })?
            .compile_matcher();
        l_matchers.push(matcher);
    }
    Ok(Some(l_matchers))
}

fn _matches_any(path: &Path, l_matchers: &[GlobMatcher]) -> bool {
    l_matchers.iter().any(|m| m.is_match(path))
}

fn _should_include(path: &Path, patterns: Option<&[GlobMatcher]>) -> bool {
    match patterns {
        None => true,
        Some(l_matchers) => _matches_any(path, l_matchers),
    }
}

fn _should_exclude(path: &Path, patterns: Option<&[GlobMatcher]>) -> bool {
    match patterns {
        None => false,
        Some(l_matchers) => _matches_any(path, l_matchers),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Canonicalize when the path exists; otherwise absolutize and resolve
/// `.`/`..` components lexically, so a not-yet-existing path like
/// `<dir>/../sibling` still normalizes to its real location.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return _resolve_dot_components(path);
    }
    let path_abs = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path);
    _resolve_dot_components(&path_abs)
}

/// Drop `.` components and fold `..` into the preceding normal component.
/// Purely lexical; symlinks along the path are not consulted.
fn _resolve_dot_components(path: &Path) -> PathBuf {
    let mut path_out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(
                    path_out.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    path_out.pop();
                } else if !path_out.has_root() {
                    // Leading `..` on a relative path is kept; `..` at a
                    // filesystem root stays at the root.
                    path_out.push(component.as_os_str());
                }
            }
            _ => path_out.push(component.as_os_str()),
        }
    }
    path_out
}

/// True when the target root is nested inside the source root. Copying
/// into such a target would recurse into its own output unboundedly.
pub(crate) fn is_target_within_source(path_dir_src: &Path, path_dir_dst: &Path) -> bool {
    normalize_path(path_dir_dst).starts_with(normalize_path(path_dir_src))
}

/// Map a source path onto the target root by replacing the leading
/// source-root prefix (first occurrence only, so a root string recurring
/// deeper in the path stays untouched).
///
/// Precondition: `path_src` lies under `path_dir_src`; this performs no
/// validation and falls back to the unmapped path when the prefix does
/// not strip.
pub(crate) fn rewrite_base_prefix(
    path_src: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> PathBuf {
    match path_src.strip_prefix(path_dir_src) {
        Ok(path_rel) => path_dir_dst.join(path_rel),
        Err(_) => path_src.to_path_buf(),
    }
}

/// True when the directory currently contains zero entries.
pub(crate) fn is_directory_empty(path_dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path_dir)?.next().is_none())
}

/// True when the directory currently contains at least one subdirectory.
pub(crate) fn has_subdirectories(path_dir: &Path) -> io::Result<bool> {
    for entry_res in fs::read_dir(path_dir)? {
        let entry = entry_res?;
        if entry.file_type()?.is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Metadata

/// Copy file bytes, then apply metadata best-effort.
///
/// A metadata failure never fails the copy; metadata semantics vary across
/// filesystems (network shares in particular), so the failure is logged
/// and swallowed here after the content write succeeded.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    if let Err(e) = copy_path_metadata(path_file_src, path_file_dst) {
        log::debug!(
            "Metadata copy failed for {} ({e})",
            path_file_dst.display()
        );
    }
    Ok(())
}

/// Copy permissions and access/modification times, plus extended
/// attributes on Linux. Returns the failure as a value; callers decide
/// whether metadata is fatal.
pub(crate) fn copy_path_metadata(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_src)?;
    fs::set_permissions(path_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    _copy_xattrs_linux(path_src, path_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn _copy_xattrs_linux(path_src: &Path, path_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
