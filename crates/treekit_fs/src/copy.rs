//! Tree copy orchestration.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{SpecCopyOptions, TreeOpError};
use crate::util::{
    SpecTreeMatchers, copy_file_with_metadata, copy_path_metadata, is_target_within_source,
    normalize_path, rewrite_base_prefix,
};
use crate::walk::TreeWalk;

/// Filesystem I/O is the bottleneck, not CPU.
const NUM_WORKERS_DEFAULT: usize = 2;

#[derive(Debug, Clone)]
struct SpecCopyTask {
    path_src: PathBuf,
    path_dst: PathBuf,
    if_is_dir: bool,
}

enum EnumTaskOutcome {
    Copied,
    Skipped,
}

/// Copy a directory tree from `dir_source` to `dir_target`.
///
/// The source tree is enumerated, narrowed by the match/unmatch patterns in
/// [`SpecCopyOptions`] (unmatch wins), and each selected path is realized
/// under the target root with its source-root prefix rewritten:
/// - a selected directory is created (with metadata, best-effort) when
///   `if_preserve_empty_dirs` is set, and skipped otherwise (ancestors of
///   copied files are always created implicitly);
/// - a selected file is copied byte-for-byte with best-effort metadata
///   (permissions, timestamps, xattrs on Linux).
///
/// Tasks are independent and may run on a bounded thread pool
/// (`if_parallel`); ancestor-directory creation is idempotent, so no task
/// ordering is needed. Per-task failures are collected into the returned
/// [`ReportCopy`] rather than aborting the batch; `Err` is reserved for
/// precondition failures raised before any filesystem mutation:
/// [`TreeOpError::NotADirectory`], [`TreeOpError::TargetInsideSource`],
/// [`TreeOpError::InvalidPattern`].
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_target: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, TreeOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = normalize_path(dir_source.as_ref());
    let path_dir_dst = normalize_path(dir_target.as_ref());

    if !path_dir_src.is_dir() {
        return Err(TreeOpError::NotADirectory(path_dir_src));
    }
    if is_target_within_source(&path_dir_src, &path_dir_dst) {
        return Err(TreeOpError::TargetInsideSource {
            path_source: path_dir_src,
            path_target: path_dir_dst,
        });
    }
    let spec_matchers = SpecTreeMatchers::from_raw(
        &spec_cp_options.patterns_match,
        &spec_cp_options.patterns_unmatch,
    )?;

    log::info!(
        "copy tree {} -> {}",
        path_dir_src.display(),
        path_dir_dst.display()
    );

    let mut builder_cp_report = ReportCopyBuilder::default();
    let mut l_tasks: Vec<SpecCopyTask> = Vec::new();
    for path_src in TreeWalk::paths(&path_dir_src)? {
        builder_cp_report.add_scanned();
        if !spec_matchers.is_selected(&path_src) {
            continue;
        }
        builder_cp_report.add_matched();

        let path_dst = rewrite_base_prefix(&path_src, &path_dir_src, &path_dir_dst);
        let if_is_dir = path_src.is_dir();
        l_tasks.push(SpecCopyTask {
            path_src,
            path_dst,
            if_is_dir,
        });
    }

    _execute_tasks(l_tasks, &spec_cp_options, &mut builder_cp_report);
    Ok(builder_cp_report.build())
}

fn _execute_tasks(
    l_tasks: Vec<SpecCopyTask>,
    spec_cp_options: &SpecCopyOptions,
    builder_cp_report: &mut ReportCopyBuilder,
) {
    if l_tasks.is_empty() {
        return;
    }

    let if_preserve_empty_dirs = spec_cp_options.if_preserve_empty_dirs;
    let n_workers_max = spec_cp_options
        .num_workers_max
        .unwrap_or(NUM_WORKERS_DEFAULT)
        .max(1);

    let apply_results = |l_results: Vec<(PathBuf, Result<EnumTaskOutcome, String>)>,
                         builder_cp_report: &mut ReportCopyBuilder| {
        for (path_dst, res_task) in l_results {
            match res_task {
                Ok(EnumTaskOutcome::Copied) => builder_cp_report.add_copied(),
                Ok(EnumTaskOutcome::Skipped) => builder_cp_report.add_skipped(),
                Err(msg) => builder_cp_report.add_error(path_dst, msg),
            }
        }
    };

    if !spec_cp_options.if_parallel || n_workers_max <= 1 {
        let l_results = l_tasks
            .into_iter()
            .map(|spec_task| {
                let res_task = _execute_task(&spec_task, if_preserve_empty_dirs);
                (spec_task.path_dst, res_task)
            })
            .collect::<Vec<_>>();
        apply_results(l_results, builder_cp_report);
        return;
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(n_workers_max).build();
    let Ok(thread_pool) = thread_pool else {
        builder_cp_report.add_warning(format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial copy."
        ));
        let l_results = l_tasks
            .into_iter()
            .map(|spec_task| {
                let res_task = _execute_task(&spec_task, if_preserve_empty_dirs);
                (spec_task.path_dst, res_task)
            })
            .collect::<Vec<_>>();
        apply_results(l_results, builder_cp_report);
        return;
    };

    let l_results = thread_pool.install(|| {
        l_tasks
            .into_par_iter()
            .map(|spec_task| {
                let res_task = _execute_task(&spec_task, if_preserve_empty_dirs);
                (spec_task.path_dst, res_task)
            })
            .collect::<Vec<_>>()
    });
    apply_results(l_results, builder_cp_report);
}

/// Realize one copy task. Self-sufficient: missing target ancestors are
/// created on demand, and `create_dir_all` is idempotent under concurrent
/// creation by sibling tasks.
fn _execute_task(
    spec_task: &SpecCopyTask,
    if_preserve_empty_dirs: bool,
) -> Result<EnumTaskOutcome, String> {
    if spec_task.if_is_dir {
        if !if_preserve_empty_dirs {
            return Ok(EnumTaskOutcome::Skipped);
        }
        fs::create_dir_all(&spec_task.path_dst).map_err(|e| e.to_string())?;
        if let Err(e) = copy_path_metadata(&spec_task.path_src, &spec_task.path_dst) {
            log::debug!(
                "Metadata copy failed for {} ({e})",
                spec_task.path_dst.display()
            );
        }
        return Ok(EnumTaskOutcome::Copied);
    }

    if let Some(path_parent_dst) = spec_task.path_dst.parent() {
        fs::create_dir_all(path_parent_dst).map_err(|e| e.to_string())?;
    }
    copy_file_with_metadata(&spec_task.path_src, &spec_task.path_dst)
        .map_err(|e| e.to_string())?;
    Ok(EnumTaskOutcome::Copied)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use filetime::FileTime;

    use super::copy_tree;
    use crate::spec::{SpecCopyOptions, TreeOpError};
    use crate::walk::list_paths;

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    fn strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn copy_all_round_trips_structure_content_and_mtime() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("root.txt"), "root");
        write_text(&src.join("a/file1.txt"), "one");
        write_text(&src.join("a/b/file2.txt"), "two");
        fs::create_dir_all(src.join("empty")).expect("mkdir empty");

        let file_time_src = FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(src.join("a/file1.txt"), file_time_src).expect("set mtime");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(report.error_count(), 0);
        // root, root.txt, a, a/file1.txt, a/b, a/b/file2.txt, empty
        assert_eq!(report.cnt_scanned, 7);
        assert_eq!(report.cnt_matched, 7);

        assert_eq!(
            fs::read_to_string(dst.join("root.txt")).expect("read"),
            "root"
        );
        assert_eq!(
            fs::read_to_string(dst.join("a/b/file2.txt")).expect("read"),
            "two"
        );
        assert!(dst.join("empty").is_dir());

        let stat_dst = fs::metadata(dst.join("a/file1.txt")).expect("dst metadata");
        assert_eq!(
            FileTime::from_last_modification_time(&stat_dst),
            file_time_src
        );

        // Relative structure of the target is isomorphic to the source.
        let src = fs::canonicalize(&src).expect("canonicalize");
        let dst = fs::canonicalize(&dst).expect("canonicalize");
        let mut l_src: Vec<_> = list_paths(&src, &[], &[])
            .expect("list src")
            .into_iter()
            .map(|p| p.strip_prefix(&src).expect("prefix").to_path_buf())
            .collect();
        let mut l_dst: Vec<_> = list_paths(&dst, &[], &[])
            .expect("list dst")
            .into_iter()
            .map(|p| p.strip_prefix(&dst).expect("prefix").to_path_buf())
            .collect();
        l_src.sort();
        l_dst.sort();
        assert_eq!(l_src, l_dst);
    }

    #[test]
    fn copy_excludes_hidden_subtree_and_keeps_empty_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("a/x.txt"), "x");
        write_text(&src.join("a/.hidden/y.txt"), "y");
        fs::create_dir_all(src.join("b")).expect("mkdir b");

        let spec_cp_options = SpecCopyOptions {
            patterns_unmatch: strings(&["*/.hidden*"]),
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&src, &dst, spec_cp_options).expect("copy tree");
        assert_eq!(report.error_count(), 0);

        assert!(dst.join("a/x.txt").is_file());
        assert!(dst.join("b").is_dir());
        assert!(!dst.join("a/.hidden").exists());
        assert!(
            fs::read_dir(dst.join("b")).expect("read b").next().is_none(),
            "b stays empty"
        );
    }

    #[test]
    fn copy_without_empty_dir_preservation_skips_childless_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("a/x.txt"), "x");
        fs::create_dir_all(src.join("b")).expect("mkdir b");

        let spec_cp_options = SpecCopyOptions {
            if_preserve_empty_dirs: false,
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&src, &dst, spec_cp_options).expect("copy tree");
        assert_eq!(report.error_count(), 0);
        assert!(report.cnt_skipped >= 1);

        // `a` exists because copying x.txt created it implicitly.
        assert!(dst.join("a/x.txt").is_file());
        assert!(!dst.join("b").exists());
    }

    #[test]
    fn copy_missing_source_is_not_a_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let res = copy_tree(
            tmp.path().join("does/not/exist"),
            tmp.path().join("dst"),
            SpecCopyOptions::default(),
        );
        assert!(matches!(res, Err(TreeOpError::NotADirectory(_))));
    }

    #[test]
    fn copy_target_inside_source_rejected_before_any_write() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");

        let nested = src.join("nested_target");
        let err = copy_tree(&src, &nested, SpecCopyOptions::default()).expect_err("must fail");
        assert!(matches!(err, TreeOpError::TargetInsideSource { .. }));
        let txt = err.to_string();
        assert!(txt.contains("nested_target"), "message names the target");
        assert!(txt.contains("inside source directory"), "message names the source");
        assert!(!nested.exists());
    }

    #[test]
    fn copy_target_sibling_via_parent_dots_is_accepted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");

        let report = copy_tree(&src, src.join("../dst_sibling"), SpecCopyOptions::default())
            .expect("sibling target via dots");
        assert_eq!(report.error_count(), 0);
        assert!(tmp.path().join("dst_sibling/a.txt").is_file());
    }

    #[test]
    fn copy_invalid_pattern_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");

        let spec_cp_options = SpecCopyOptions {
            patterns_match: strings(&["["]),
            ..SpecCopyOptions::default()
        };
        let err = copy_tree(&src, tmp.path().join("dst"), spec_cp_options)
            .expect_err("invalid glob must fail");
        assert!(matches!(err, TreeOpError::InvalidPattern(_)));
    }

    #[test]
    fn copy_parallel_dispatch_copies_everything() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        for n_idx in 0..16 {
            write_text(&src.join(format!("d{}/f{n_idx}.txt", n_idx % 4)), "x");
        }

        let spec_cp_options = SpecCopyOptions {
            if_parallel: true,
            num_workers_max: Some(4),
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&src, &dst, spec_cp_options).expect("copy tree");
        assert_eq!(report.error_count(), 0);
        for n_idx in 0..16 {
            assert!(dst.join(format!("d{}/f{n_idx}.txt", n_idx % 4)).is_file());
        }
    }

    #[test]
    fn copy_collects_per_item_failures_without_aborting_batch() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("good.txt"), "good");
        write_text(&src.join("bad.txt"), "bad");
        // A directory squatting on the target file path makes this one
        // item fail while the rest of the batch completes.
        fs::create_dir_all(dst.join("bad.txt")).expect("mkdir squatter");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("copy tree");

        assert_eq!(report.error_count(), 1);
        assert!(report.errors[0].path.ends_with("bad.txt"));
        assert!(dst.join("good.txt").is_file());
    }
}
