//! Guarded recursive directory removal.

use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{ReportPrune, ReportPruneBuilder};
use crate::spec::TreeOpError;
use crate::util::{
    SpecTreeMatchers, has_subdirectories, is_directory_empty, normalize_path,
};
use crate::walk::TreeWalk;

/// Remove all empty directories under the base directory, recursive, the
/// base itself included when it ends up empty.
///
/// Directories are visited bottom-up, so removing children can make a
/// parent empty within the same pass. A directory is removed only when it
/// contains zero entries at removal time; running the operation again on a
/// surviving base is a no-op. Per-directory removal failures are collected
/// in the returned [`ReportPrune`].
pub fn remove_empty_directories_recursive<P: AsRef<Path>>(
    path_base_dir: P,
) -> Result<ReportPrune, TreeOpError> {
    let path_base_dir = normalize_path(path_base_dir.as_ref());
    log::info!("prune empty directories under {}", path_base_dir.display());

    let mut builder_prune_report = ReportPruneBuilder::default();
    for path_dir in TreeWalk::dirs(&path_base_dir)? {
        builder_prune_report.add_scanned();
        match is_directory_empty(&path_dir) {
            Ok(true) => match fs::remove_dir(&path_dir) {
                Ok(_) => builder_prune_report.add_removed(),
                Err(e) => builder_prune_report.add_error(path_dir, e.to_string()),
            },
            Ok(false) => builder_prune_report.add_kept(),
            Err(e) => builder_prune_report.add_error(path_dir, e.to_string()),
        }
    }
    Ok(builder_prune_report.build())
}

/// Remove matched directories under the base directory wholesale, even
/// when they are not empty.
///
/// The match/unmatch patterns apply to directory paths (unmatch wins).
/// Candidates are processed deepest-first; a candidate subtree is deleted
/// only when the directory has no subdirectory left at removal time.
/// Matched children were already removed earlier in the pass, so any
/// surviving subdirectory is (or shelters) a directory that failed the
/// filter and must survive, and its parent then survives with it.
///
/// `minimal_depth` is a blast-radius guard, not a correctness rule: when
/// the base directory has fewer than `minimal_depth + 1` path components
/// the call fails with [`TreeOpError::BelowMinimalDepth`] before anything
/// is enumerated or deleted. With `minimal_depth == 1` subfolders of the
/// filesystem root cannot be targeted.
pub fn remove_directories_recursive<P: AsRef<Path>>(
    path_base_dir: P,
    patterns_match: &[String],
    patterns_unmatch: &[String],
    minimal_depth: usize,
) -> Result<ReportPrune, TreeOpError> {
    let path_base_dir = normalize_path(path_base_dir.as_ref());
    if !path_base_dir.is_dir() {
        return Err(TreeOpError::NotADirectory(path_base_dir));
    }
    if path_base_dir.components().count() < minimal_depth + 1 {
        return Err(TreeOpError::BelowMinimalDepth {
            path: path_base_dir,
            minimal_depth,
        });
    }
    let spec_matchers = SpecTreeMatchers::from_raw(patterns_match, patterns_unmatch)?;
    log::info!(
        "prune matched directories under {}",
        path_base_dir.display()
    );

    let mut l_dirs: Vec<PathBuf> = TreeWalk::dirs(&path_base_dir)?
        .filter(|p| spec_matchers.is_selected(p))
        .collect();
    // Deepest first: a directory always sorts after its ancestors.
    l_dirs.sort_unstable();
    l_dirs.reverse();

    let mut builder_prune_report = ReportPruneBuilder::default();
    for path_dir in l_dirs {
        if !path_dir.exists() {
            builder_prune_report
                .add_warning(format!("Already removed: {}", path_dir.display()));
            continue;
        }
        builder_prune_report.add_scanned();
        match has_subdirectories(&path_dir) {
            Ok(true) => builder_prune_report.add_kept(),
            Ok(false) => match fs::remove_dir_all(&path_dir) {
                Ok(_) => builder_prune_report.add_removed(),
                Err(e) => builder_prune_report.add_error(path_dir, e.to_string()),
            },
            Err(e) => builder_prune_report.add_error(path_dir, e.to_string()),
        }
    }
    Ok(builder_prune_report.build())
}
