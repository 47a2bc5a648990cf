//! Run report models and mutable report builders.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SpecItemError;

////////////////////////////////////////////////////////////////////////////////
// #region ReportCopy

/// Aggregate counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Total enumerated directory/file entries.
    pub cnt_scanned: u64,
    /// Number of enumerated entries that passed the match/unmatch filter.
    pub cnt_matched: u64,
    /// Number of entries realized in the target.
    pub cnt_copied: u64,
    /// Number of entries skipped (empty directories with preservation off).
    pub cnt_skipped: u64,
    /// Non-fatal warnings collected during traversal/copy.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecItemError>,
}

impl ReportCopy {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} matched={} copied={} skipped={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_matched,
            self.cnt_copied,
            self.cnt_skipped,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub(crate) struct ReportCopyBuilder {
    cnt_scanned: u64,
    cnt_matched: u64,
    cnt_copied: u64,
    cnt_skipped: u64,
    warnings: Vec<String>,
    errors: Vec<SpecItemError>,
}

impl ReportCopyBuilder {
    pub(crate) fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    pub(crate) fn add_matched(&mut self) {
        self.cnt_matched += 1;
    }

    pub(crate) fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    pub(crate) fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    pub(crate) fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub(crate) fn add_error(&mut self, path: std::path::PathBuf, exception: String) {
        self.errors.push(SpecItemError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub(crate) fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_scanned: self.cnt_scanned,
            cnt_matched: self.cnt_matched,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportPrune

/// Aggregate counters and diagnostics for one pruning run.
#[derive(Debug, Default, Clone)]
pub struct ReportPrune {
    /// Number of directory candidates evaluated.
    pub cnt_scanned: u64,
    /// Number of directories removed.
    pub cnt_removed: u64,
    /// Number of candidates kept (non-empty, or sheltering a kept
    /// subdirectory).
    pub cnt_kept: u64,
    /// Non-fatal warnings collected during the pass.
    pub warnings: Vec<String>,
    /// Per-directory removal failures.
    pub errors: Vec<SpecItemError>,
}

impl ReportPrune {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_removed".to_string(), self.cnt_removed);
        dict_counts.insert("cnt_kept".to_string(), self.cnt_kept);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} removed={} kept={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_removed,
            self.cnt_kept,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportPrune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PRUNE]"))
    }
}

/// Mutable accumulator for prune statistics.
#[derive(Debug, Default, Clone)]
pub(crate) struct ReportPruneBuilder {
    cnt_scanned: u64,
    cnt_removed: u64,
    cnt_kept: u64,
    warnings: Vec<String>,
    errors: Vec<SpecItemError>,
}

impl ReportPruneBuilder {
    pub(crate) fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    pub(crate) fn add_removed(&mut self) {
        self.cnt_removed += 1;
    }

    pub(crate) fn add_kept(&mut self) {
        self.cnt_kept += 1;
    }

    pub(crate) fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub(crate) fn add_error(&mut self, path: std::path::PathBuf, exception: String) {
        self.errors.push(SpecItemError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub(crate) fn build(self) -> ReportPrune {
        ReportPrune {
            cnt_scanned: self.cnt_scanned,
            cnt_removed: self.cnt_removed,
            cnt_kept: self.cnt_kept,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
