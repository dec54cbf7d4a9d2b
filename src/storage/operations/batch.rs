use crate::error::{ErrorKind, Result};
use crate::storage::models::UploadReceipt;
use crate::storage::operations::policy::{SizePolicy, Verdict};
use crate::storage::utils::size::format_size;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const FILE_NOT_FOUND: &str = "File not found";

/// Terminal classification of one upload candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TransferOutcome {
    Succeeded {
        path: PathBuf,
        remote_id: String,
        message: String,
    },
    Failed {
        path: PathBuf,
        kind: ErrorKind,
        reason: String,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
}

/// Outcome of a single-file upload.
pub type UploadOutcome = TransferOutcome;

impl TransferOutcome {
    pub fn path(&self) -> &Path {
        match self {
            TransferOutcome::Succeeded { path, .. }
            | TransferOutcome::Failed { path, .. }
            | TransferOutcome::Skipped { path, .. } => path,
        }
    }

    /// Classification of the problem, `None` for a success.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            TransferOutcome::Succeeded { .. } => None,
            TransferOutcome::Failed { kind, .. } => Some(*kind),
            TransferOutcome::Skipped { .. } => Some(ErrorKind::PolicyViolation),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Succeeded { .. })
    }

    /// Human-readable message attached to the outcome.
    pub fn message(&self) -> &str {
        match self {
            TransferOutcome::Succeeded { message, .. } => message,
            TransferOutcome::Failed { reason, .. } | TransferOutcome::Skipped { reason, .. } => {
                reason
            }
        }
    }
}

/// Aggregated result of a batch upload.
///
/// Counters always agree with the outcome list: `total` equals the number of
/// outcomes and the sum of the three per-status counters. Outcomes are kept in
/// candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    total: usize,
    successful: usize,
    failed: usize,
    skipped: usize,
    outcomes: Vec<TransferOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl BatchSummary {
    /// Summary of a batch that had nothing to attempt.
    pub fn empty_with_note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn successful(&self) -> usize {
        self.successful
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn outcomes(&self) -> &[TransferOutcome] {
        &self.outcomes
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    fn record(&mut self, outcome: TransferOutcome) {
        match &outcome {
            TransferOutcome::Succeeded { .. } => self.successful += 1,
            TransferOutcome::Failed { .. } => self.failed += 1,
            TransferOutcome::Skipped { .. } => self.skipped += 1,
        }
        self.total += 1;
        self.outcomes.push(outcome);
    }
}

/// Drives candidates one at a time through existence check, size check and
/// upload, recording exactly one outcome per candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchUploader {
    policy: SizePolicy,
}

impl BatchUploader {
    pub fn new(policy: SizePolicy) -> Self {
        Self { policy }
    }

    /// Process every candidate in order. A failure or skip never stops the loop.
    ///
    /// `upload` performs the remote transfer of one file. Its error text is
    /// relayed into the outcome unchanged.
    pub async fn run<F, Fut>(&self, candidates: &[PathBuf], mut upload: F) -> BatchSummary
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = Result<UploadReceipt>>,
    {
        let mut summary = BatchSummary::default();
        for (index, path) in candidates.iter().enumerate() {
            let outcome = self.transfer_one(path, &mut upload).await;
            log::info!(
                "batch item {}/{} {}: {}",
                index + 1,
                candidates.len(),
                path.display(),
                outcome.message()
            );
            summary.record(outcome);
        }
        summary
    }

    /// Resolve a single candidate.
    pub async fn transfer_one<F, Fut>(&self, path: &Path, upload: F) -> TransferOutcome
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<UploadReceipt>>,
    {
        let size = match fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return TransferOutcome::Failed {
                    path: path.to_path_buf(),
                    kind: ErrorKind::NotFound,
                    reason: FILE_NOT_FOUND.to_string(),
                };
            }
        };

        if let Verdict::Reject { reason } = self.policy.evaluate(size) {
            log::warn!("Skipping {}: {reason}", path.display());
            return TransferOutcome::Skipped {
                path: path.to_path_buf(),
                reason,
            };
        }

        match upload(path.to_path_buf()).await {
            Ok(receipt) => TransferOutcome::Succeeded {
                path: path.to_path_buf(),
                remote_id: receipt.id,
                message: format!("Uploaded {}", format_size(size)),
            },
            Err(e) => {
                log::warn!("Upload of {} failed: {e}", path.display());
                TransferOutcome::Failed {
                    path: path.to_path_buf(),
                    kind: e.kind(),
                    reason: e.to_string(),
                }
            }
        }
    }
}
