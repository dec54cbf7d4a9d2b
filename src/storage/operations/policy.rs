use crate::storage::constants::MAX_UPLOAD_SIZE;
use crate::storage::utils::size::format_size;

/// Result of checking a candidate against the size limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject { reason: String },
}

/// Pre-flight size check, evaluated before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    limit: u64,
}

impl SizePolicy {
    pub const fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Accept sizes up to and including the limit.
    pub fn evaluate(&self, size: u64) -> Verdict {
        if size <= self.limit {
            return Verdict::Accept;
        }
        Verdict::Reject {
            reason: format!(
                "File is {} which exceeds the {} upload limit; compress or split it before uploading",
                format_size(size),
                format_size(self.limit)
            ),
        }
    }
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_SIZE)
    }
}
