use serde::Serialize;
use snafu::Snafu;
use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable classification of a failure.
///
/// Callers and tests match on the kind instead of the prose carried by the
/// error, which is meant for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad local input, rejected before any remote call.
    Input,
    /// Missing or malformed process configuration.
    Config,
    /// Local pre-flight rejection, e.g. a file over the size limit.
    PolicyViolation,
    NotFound,
    InvalidCredential,
    PermissionDenied,
    /// The remote service refused the body as too large (HTTP 413).
    PayloadTooLarge,
    RateLimited,
    Timeout,
    Connectivity,
    /// Any other remote failure. `server_error` is set for 5xx responses.
    Remote { server_error: bool },
    Io,
}

impl ErrorKind {
    /// Whether resubmitting the same request later may succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::Connectivity
                | ErrorKind::Remote { server_error: true }
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Input => "input",
            ErrorKind::Config => "config",
            ErrorKind::PolicyViolation => "policy_violation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::Remote { .. } => "remote",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Environment variable '{key}' is required but not found"))]
    MissingEnvVar { key: String },

    #[snafu(display("Environment variable '{key}' has an invalid value: {value}"))]
    InvalidEnvVar { key: String, value: String },

    #[snafu(display("Invalid endpoint URL '{url}': {reason}"))]
    InvalidEndpoint { url: String, reason: String },

    #[snafu(display("Path does not exist: {}", path.display()))]
    PathNotFound { path: PathBuf },

    #[snafu(display("Directory not found: {}", path.display()))]
    DirectoryNotFound { path: PathBuf },

    #[snafu(display("Not a directory: {}", path.display()))]
    NotADirectory { path: PathBuf },

    #[snafu(display("Invalid file pattern '{pattern}': {source}"))]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    #[snafu(display("Page limit must be between {min} and {max}, got {limit}"))]
    InvalidPageLimit { limit: u32, min: u32, max: u32 },

    #[snafu(display("Search query must not be empty"))]
    EmptyQuery,

    #[snafu(display("At least one path is required for a bulk upload"))]
    EmptyBatch,

    #[snafu(display("Bulk upload accepts at most {max} paths, got {count}"))]
    BatchTooLarge { count: usize, max: usize },

    #[snafu(display("File '{file_id}' not found"))]
    RemoteFileNotFound { file_id: String },

    #[snafu(display("{message}"))]
    Remote {
        kind: ErrorKind,
        status: Option<u16>,
        message: String,
    },

    #[snafu(display("Unexpected response from {endpoint}: {reason}"))]
    InvalidResponse { endpoint: String, reason: String },

    #[snafu(display("Failed to build HTTP client: {source}"))]
    HttpClient { source: reqwest::Error },

    #[snafu(display("Failed to download '{file_id}' to '{local_path}': {source}"))]
    DownloadFailed {
        file_id: String,
        local_path: String,
        source: Box<Error>,
    },

    #[snafu(display("Failed to list files in '{folder}': {source}"))]
    ListFilesFailed { folder: String, source: Box<Error> },

    #[snafu(display("Failed to search files for '{query}': {source}"))]
    SearchFailed { query: String, source: Box<Error> },

    #[snafu(display("Failed to delete '{target}': {source}"))]
    DeleteFailed { target: String, source: Box<Error> },

    #[snafu(display("Failed to create folder '{name}': {source}"))]
    FolderCreationFailed { name: String, source: Box<Error> },

    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },
}

impl Error {
    /// Classify this error, looking through contextual wrappers to the root cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingEnvVar { .. }
            | Error::InvalidEnvVar { .. }
            | Error::InvalidEndpoint { .. }
            | Error::HttpClient { .. } => ErrorKind::Config,
            Error::PathNotFound { .. }
            | Error::DirectoryNotFound { .. }
            | Error::NotADirectory { .. }
            | Error::InvalidPattern { .. }
            | Error::InvalidPageLimit { .. }
            | Error::EmptyQuery
            | Error::EmptyBatch
            | Error::BatchTooLarge { .. } => ErrorKind::Input,
            Error::RemoteFileNotFound { .. } => ErrorKind::NotFound,
            Error::Remote { kind, .. } => *kind,
            Error::InvalidResponse { .. } | Error::Json { .. } => {
                ErrorKind::Remote { server_error: false }
            }
            Error::DownloadFailed { source, .. }
            | Error::ListFilesFailed { source, .. }
            | Error::SearchFailed { source, .. }
            | Error::DeleteFailed { source, .. }
            | Error::FolderCreationFailed { source, .. } => source.kind(),
            Error::Io { .. } => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io { source: error }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json { source: error }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        crate::storage::http::classify_transport(&error)
    }
}
