// Core upload and listing operations, independent of the gateway transport
pub mod batch;
pub mod enumerate;
pub mod paginate;
pub mod policy;

pub use batch::{BatchSummary, BatchUploader, TransferOutcome, UploadOutcome};
pub use enumerate::{FileEnumerator, enumerate_files};
pub use paginate::{Page, paginate, validate_window};
pub use policy::{SizePolicy, Verdict};
