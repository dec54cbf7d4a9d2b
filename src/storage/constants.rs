// Upload size limit, compared in exact bytes
pub const MAX_UPLOAD_SIZE: u64 = 40 * 1024 * 1024;
pub const MAX_UPLOAD_SIZE_LABEL: &str = "40MB";

// Pagination bounds
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MIN_PAGE_LIMIT: u32 = 1;
pub const MAX_PAGE_LIMIT: u32 = 100;

pub const MAX_BULK_PATHS: usize = 100;

// Endpoint defaults
pub const DEFAULT_API_URL: &str = "https://api.stowage.dev/v1";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://data.stowage.dev/v1";

// Request timeouts, transfers get the longer one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 300;

pub const USER_AGENT: &str = concat!("stowage/", env!("CARGO_PKG_VERSION"));
