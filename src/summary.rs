use std::fmt;
use std::path::{Path, PathBuf};

/// Why a single file could not be tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The file could not be read or is not an image.
    Read,
    /// The inference service was unreachable or answered with something unusable.
    Inference,
    /// The metadata tool rejected the file.
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Inference => write!(f, "inference"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Succeeded,
    Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: FileResult,
}

/// Append-only tally of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed_read: usize,
    pub failed_inference: usize,
    pub failed_write: usize,
    pub failures: Vec<FileOutcome>,
}

impl RunSummary {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, path: &Path, kind: FailureKind, message: String) {
        self.attempted += 1;
        match kind {
            FailureKind::Read => self.failed_read += 1,
            FailureKind::Inference => self.failed_inference += 1,
            FailureKind::Write => self.failed_write += 1,
        }
        self.failures.push(FileOutcome {
            path: path.to_path_buf(),
            result: FileResult::Failed { kind, message },
        });
    }

    pub const fn failed(&self) -> usize {
        self.failed_read + self.failed_inference + self.failed_write
    }

    pub const fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} attempted, {} succeeded, {} failed (read: {}, inference: {}, write: {})",
            self.attempted,
            self.succeeded,
            self.failed(),
            self.failed_read,
            self.failed_inference,
            self.failed_write
        )?;
        for outcome in &self.failures {
            if let FileResult::Failed { kind, message } = &outcome.result {
                writeln!(f, "  [{}] {}: {}", kind, outcome.path.display(), message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut summary = RunSummary::default();
        summary.record_success();
        summary.record_failure(Path::new("a.jpg"), FailureKind::Inference, "down".into());
        summary.record_failure(Path::new("b.jpg"), FailureKind::Write, "exit 1".into());

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.failed_inference, 1);
        assert_eq!(summary.failed_write, 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_display_lists_failures() {
        let mut summary = RunSummary::default();
        summary.record_failure(Path::new("b.jpg"), FailureKind::Write, "exit 1".into());

        let text = summary.to_string();
        assert!(text.starts_with("1 attempted, 0 succeeded, 1 failed"));
        assert!(text.contains("[write] b.jpg: exit 1"));
    }
}
