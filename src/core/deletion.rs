use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeletionError {
    #[error("Failed to delete {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        /// What was already deleted before the failing path.
        partial: DeletionReport,
    },
}

impl DeletionError {
    pub fn partial(&self) -> &DeletionReport {
        match self {
            DeletionError::Remove { partial, .. } => partial,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionReport {
    pub deleted: Vec<PathBuf>,
    /// Paths that were already gone (or were not regular files) when their turn came.
    pub skipped: Vec<PathBuf>,
    pub bytes_freed: u64,
}

impl DeletionReport {
    pub fn megabytes_freed(&self) -> f64 {
        bytes_to_megabytes(self.bytes_freed)
    }

    pub fn merge(&mut self, other: DeletionReport) {
        self.deleted.extend(other.deleted);
        self.skipped.extend(other.skipped);
        self.bytes_freed += other.bytes_freed;
    }
}

/// Removes files and accounts for the space freed.
#[derive(Debug, Clone, Default)]
pub struct DeletionExecutor {
    dry_run: bool,
}

impl DeletionExecutor {
    pub fn new() -> Self {
        Self { dry_run: false }
    }

    /// Measure and report, but leave every file in place.
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Delete each path once. Sizes are read right before removal; paths that no
    /// longer exist are skipped. The first failing removal aborts the rest, and
    /// the error carries the report of the files removed until then.
    pub fn delete_all(&self, paths: &[PathBuf]) -> Result<DeletionReport, DeletionError> {
        let mut report = DeletionReport::default();
        let mut seen = HashSet::new();

        for path in paths {
            if !seen.insert(path) {
                continue;
            }

            let size = match fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => metadata.len(),
                _ => {
                    debug!("Skipping {}: no longer a file on disk", path.display());
                    report.skipped.push(path.clone());
                    continue;
                }
            };

            if self.dry_run {
                info!("[dry-run] Would delete {} ({} bytes)", path.display(), size);
            } else {
                if let Err(source) = fs::remove_file(path) {
                    return Err(DeletionError::Remove {
                        path: path.clone(),
                        source,
                        partial: report,
                    });
                }
                info!("Deleted {} ({} bytes)", path.display(), size);
            }

            report.bytes_freed += size;
            report.deleted.push(path.clone());
        }

        Ok(report)
    }
}

/// Bytes to decimal megabytes, rounded to 2 decimals.
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / 1_000_000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{make_deletable, make_undeletable};
    use tempfile::TempDir;

    #[test]
    fn test_bytes_to_megabytes() {
        assert_eq!(bytes_to_megabytes(2_000_000), 2.0);
        assert_eq!(bytes_to_megabytes(1_234_567), 1.23);
        assert_eq!(bytes_to_megabytes(0), 0.0);
    }

    #[test]
    fn test_deletes_and_counts_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("b.jpg");
        fs::write(&a, vec![0u8; 1500]).unwrap();
        fs::write(&b, vec![0u8; 500]).unwrap();

        let report = DeletionExecutor::new()
            .delete_all(&[a.clone(), b.clone()])
            .unwrap();

        assert_eq!(report.bytes_freed, 2000);
        assert_eq!(report.deleted, vec![a.clone(), b.clone()]);
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_duplicate_paths_are_counted_once() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        fs::write(&a, vec![0u8; 700]).unwrap();

        let report = DeletionExecutor::new()
            .delete_all(&[a.clone(), a.clone(), a.clone()])
            .unwrap();

        assert_eq!(report.bytes_freed, 700);
        assert_eq!(report.deleted.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.jpg");
        let missing = temp_dir.path().join("missing.jpg");
        fs::write(&present, vec![0u8; 300]).unwrap();

        let report = DeletionExecutor::new()
            .delete_all(&[missing.clone(), present.clone()])
            .unwrap();

        assert_eq!(report.bytes_freed, 300);
        assert_eq!(report.deleted, vec![present]);
        assert_eq!(report.skipped, vec![missing]);
    }

    #[test]
    fn test_dry_run_keeps_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        fs::write(&a, vec![0u8; 42]).unwrap();

        let report = DeletionExecutor::dry_run()
            .delete_all(&[a.clone()])
            .unwrap();

        assert_eq!(report.bytes_freed, 42);
        assert!(a.exists());
    }

    #[test]
    fn test_merge_reports() {
        let mut total = DeletionReport {
            deleted: vec![PathBuf::from("/a")],
            skipped: vec![],
            bytes_freed: 10,
        };
        total.merge(DeletionReport {
            deleted: vec![PathBuf::from("/b")],
            skipped: vec![PathBuf::from("/c")],
            bytes_freed: 5,
        });

        assert_eq!(total.deleted.len(), 2);
        assert_eq!(total.skipped.len(), 1);
        assert_eq!(total.bytes_freed, 15);
    }

    #[test]
    fn test_failed_removal_keeps_partial_report() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        fs::write(&a, vec![0u8; 1500]).unwrap();
        fs::create_dir(temp_dir.path().join("locked")).unwrap();
        let b = temp_dir.path().join("locked/b.jpg");
        fs::write(&b, vec![0u8; 500]).unwrap();
        let c = temp_dir.path().join("c.jpg");
        fs::write(&c, vec![0u8; 250]).unwrap();

        if !make_undeletable(&b) {
            return;
        }
        let result = DeletionExecutor::new().delete_all(&[a.clone(), b.clone(), c.clone()]);
        make_deletable(&b);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("b.jpg"));
        let DeletionError::Remove { path, partial, .. } = &err;
        assert_eq!(path, &b);
        assert_eq!(partial.deleted, vec![a.clone()]);
        assert_eq!(partial.bytes_freed, 1500);
        assert!(!a.exists());
        assert!(b.exists());
        assert!(c.exists());
    }
}
