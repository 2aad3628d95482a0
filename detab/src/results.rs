use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::errors::{DetabError, DetabResult};

/// Outcome of one successful read-transform-write cycle
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    /// The file that was processed
    pub path: PathBuf,
    /// Size of the original content
    pub bytes_read: u64,
    /// Size of the rewritten content (0 on a dry run)
    pub bytes_written: u64,
    /// Number of tab characters removed by the transform
    pub tabs_replaced: usize,
    /// Whether the transform changed the content
    pub changed: bool,
}

/// Why a single file could not be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Io,
    Encoding,
}

/// A file that failed without stopping the rest of the run
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn from_error(path: &Path, error: &DetabError) -> Self {
        let kind = match error {
            DetabError::Encoding { .. } => FailureKind::Encoding,
            _ => FailureKind::Io,
        };
        Self {
            path: path.to_path_buf(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Aggregated result of a run, or of one worker's share of it
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Files read and transformed successfully
    pub files_processed: usize,
    /// Files whose content was changed by the transform
    pub files_changed: usize,
    /// Total number of tab characters removed
    pub tabs_replaced: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// Paths of the changed files, in completion order
    pub changed_files: Vec<PathBuf>,
    /// Files that could not be processed
    pub failures: Vec<FileFailure>,
    /// Whether files were left untouched
    pub dry_run: bool,
    /// Wall-clock duration of the run
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a successful file result
    pub fn add_file_result(&mut self, file_result: FileResult) {
        self.files_processed += 1;
        self.tabs_replaced += file_result.tabs_replaced;
        self.bytes_read += file_result.bytes_read;
        self.bytes_written += file_result.bytes_written;
        if file_result.changed {
            self.files_changed += 1;
            self.changed_files.push(file_result.path);
        }
    }

    /// Records a per-file failure
    pub fn add_failure(&mut self, path: &Path, error: &DetabError) {
        self.failures.push(FileFailure::from_error(path, error));
    }

    /// Folds another (partial) summary into this one
    pub fn merge(&mut self, other: RunSummary) {
        self.files_processed += other.files_processed;
        self.files_changed += other.files_changed;
        self.tabs_replaced += other.tabs_replaced;
        self.bytes_read += other.bytes_read;
        self.bytes_written += other.bytes_written;
        self.changed_files.extend(other.changed_files);
        self.failures.extend(other.failures);
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }

    /// Every file handed to a worker, successful or not
    pub fn files_seen(&self) -> usize {
        self.files_processed + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything a run produced, including the summary of a run that a scan error
/// cut short
#[derive(Debug)]
pub struct RunOutcome {
    /// Files handled before the run ended
    pub summary: RunSummary,
    /// The listing error that stopped the scan, if any
    pub scan_error: Option<DetabError>,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.scan_error.is_none()
    }

    /// Drops the partial summary of an aborted run in favour of its error
    pub fn into_result(self) -> DetabResult<RunSummary> {
        match self.scan_error {
            None => Ok(self.summary),
            Some(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn file_result(path: &str, tabs: usize) -> FileResult {
        FileResult {
            path: PathBuf::from(path),
            bytes_read: 10,
            bytes_written: 10 + tabs as u64 * 3,
            tabs_replaced: tabs,
            changed: tabs > 0,
        }
    }

    #[test]
    fn test_add_file_result() {
        let mut summary = RunSummary::new();
        summary.add_file_result(file_result("a.rs", 2));
        summary.add_file_result(file_result("b.rs", 0));

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_changed, 1);
        assert_eq!(summary.tabs_replaced, 2);
        assert_eq!(summary.bytes_read, 20);
        assert_eq!(summary.bytes_written, 26);
        assert_eq!(summary.changed_files, vec![PathBuf::from("a.rs")]);
        assert!(summary.is_success());
    }

    #[test]
    fn test_failures_are_classified() {
        let mut summary = RunSummary::new();
        let io_err = DetabError::file_io("a.rs", io::Error::from(io::ErrorKind::PermissionDenied));
        let enc_err = DetabError::encoding("b.rs", String::from_utf8(vec![0xc3]).unwrap_err());
        summary.add_failure(Path::new("a.rs"), &io_err);
        summary.add_failure(Path::new("b.rs"), &enc_err);

        assert!(!summary.is_success());
        assert_eq!(summary.files_failed(), 2);
        assert_eq!(summary.failures[0].kind, FailureKind::Io);
        assert_eq!(summary.failures[1].kind, FailureKind::Encoding);
        assert!(summary.failures[1].message.contains("b.rs"));
    }

    #[test]
    fn test_merge() {
        let mut left = RunSummary::new();
        left.add_file_result(file_result("a.rs", 1));

        let mut right = RunSummary::new();
        right.add_file_result(file_result("b.rs", 4));
        right.add_failure(
            Path::new("c.rs"),
            &DetabError::file_io("c.rs", io::Error::from(io::ErrorKind::NotFound)),
        );

        left.merge(right);
        assert_eq!(left.files_processed, 2);
        assert_eq!(left.files_changed, 2);
        assert_eq!(left.tabs_replaced, 5);
        assert_eq!(left.files_seen(), 3);
        assert_eq!(left.changed_files.len(), 2);
    }

    #[test]
    fn test_outcome_into_result() {
        let mut summary = RunSummary::new();
        summary.add_file_result(file_result("a.rs", 1));

        let outcome = RunOutcome {
            summary: summary.clone(),
            scan_error: None,
        };
        assert!(outcome.is_complete());
        assert_eq!(outcome.into_result().unwrap().files_processed, 1);

        let outcome = RunOutcome {
            summary,
            scan_error: Some(DetabError::scan("C", io::Error::from(io::ErrorKind::NotFound))),
        };
        assert!(!outcome.is_complete());
        assert_eq!(outcome.summary.files_processed, 1);
        assert!(matches!(
            outcome.into_result(),
            Err(DetabError::Scan { .. })
        ));
    }
}
