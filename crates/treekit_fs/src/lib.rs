//! `treekit_fs`:
//! filesystem tree synchronization core.
//!
//! Enumerates files and directories under a root, filters them by ordered
//! match/unmatch glob patterns (an unmatch hit always wins), and performs
//! metadata-preserving copy or guarded recursive deletion of the filtered
//! set. Nothing is cached between calls; re-walking the filesystem is the
//! source of truth for every operation.
//!
//! - `walk`   : bottom-up enumeration, listing, file-set expansion
//! - `copy`   : tree copy orchestration
//! - `prune`  : empty-directory and matched-directory removal
//! - `spec`   : options and error types
//! - `report` : run report models
//! - `util`   : pattern filter, path rewriting, metadata helpers
//!
//! Informational messages go through the `log` facade; the crate installs
//! no subscriber.

pub mod copy;
pub mod prune;
pub mod report;
pub mod spec;
mod util;
pub mod walk;

pub use copy::copy_tree;
pub use prune::{remove_directories_recursive, remove_empty_directories_recursive};
pub use report::{ReportCopy, ReportPrune};
pub use spec::{SpecCopyOptions, SpecItemError, TreeOpError};
pub use walk::{EnumTreeView, TreeWalk, expand_to_files, list_directories, list_files, list_paths};
