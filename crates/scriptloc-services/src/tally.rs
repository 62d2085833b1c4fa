use std::path::Path;

use scriptloc_core::FileError;
use scriptloc_domain::{BatchSummary, FileFailure, SCHEMA_VERSION};

/// Accumulates per-file outcomes into a [`BatchSummary`].
pub(crate) struct Tally {
    summary: BatchSummary,
}

fn show(path: &Path) -> String {
    path.display().to_string()
}

impl Tally {
    pub fn new(operation: &str, root: &Path) -> Self {
        Self {
            summary: BatchSummary {
                schema_version: SCHEMA_VERSION,
                operation: operation.to_string(),
                root: show(root),
                processed: 0,
                skipped: 0,
                failed: 0,
                planned: 0,
                written: Vec::new(),
                skipped_paths: Vec::new(),
                planned_paths: Vec::new(),
                failures: Vec::new(),
                substitutions: 0,
            },
        }
    }

    pub fn processed(&mut self, written: Option<&Path>) {
        self.summary.processed += 1;
        if let Some(p) = written {
            self.summary.written.push(show(p));
        }
    }

    pub fn skipped(&mut self, path: &Path) {
        self.summary.skipped += 1;
        self.summary.skipped_paths.push(show(path));
    }

    pub fn planned(&mut self, path: &Path) {
        self.summary.planned += 1;
        self.summary.planned_paths.push(show(path));
    }

    pub fn failed(&mut self, path: &Path, err: &FileError) {
        self.summary.failed += 1;
        self.summary.failures.push(FileFailure {
            path: show(path),
            kind: err.kind().to_string(),
            error: err.to_string(),
        });
    }

    pub fn substitutions(&mut self, n: usize) {
        self.summary.substitutions += n;
    }

    pub fn finish(self) -> BatchSummary {
        self.summary
    }
}
