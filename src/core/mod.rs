pub mod comparator;
pub mod composer;
pub mod engine;
pub mod git_log;
pub mod policy;
pub mod reconciler;
pub mod scanner;
pub mod watcher;

pub use comparator::{diff_file_sets, ChangeReason, ChangedFile, DiffSummary};
pub use composer::{parse_features, VersionDraft};
pub use engine::{SyncDriver, SyncMode, SyncReport, UploadFailure, UploadProgress};
pub use git_log::{parse_log, CommitSource, GitLog};
pub use reconciler::{reconcile, CommitVerdict, Reconciliation};
pub use scanner::{FileScanner, FileSet, ScanConfig};
pub use watcher::{Debouncer, DocumentWatcher, DEFAULT_DEBOUNCE_MS};
