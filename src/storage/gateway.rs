use crate::error::Result;
use crate::storage::models::{Quota, RawPage, RemoteFile, RemoteFolder, UploadReceipt};
use std::path::Path;

/// Boundary to the remote storage service.
///
/// One implementation talks HTTP ([`HttpGateway`](crate::storage::http::HttpGateway));
/// tests substitute an in-memory double. Every method performs exactly one
/// logical remote operation and returns failures already classified, see
/// [`ErrorKind`](crate::error::ErrorKind).
///
/// Instances are safe for sequential reuse. Concurrent batches should either
/// be serialized or use one gateway each, so the returned futures carry no
/// `Send` bound.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Upload a whole local file in one request.
    ///
    /// # Arguments
    /// * `local_path` - File on the local filesystem
    /// * `remote_name` - Name to store the file under, defaults to the local file name
    async fn upload(&self, local_path: &Path, remote_name: Option<&str>) -> Result<UploadReceipt>;

    /// Stream a remote file into `dest`.
    ///
    /// Returns the number of bytes written, or `None` when the file does not exist.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<Option<u64>>;

    /// Fetch metadata for one file, `None` when it does not exist.
    async fn file_info(&self, file_id: &str) -> Result<Option<RemoteFile>>;

    /// Permanently delete a file.
    async fn delete_file(&self, file_id: &str) -> Result<()>;

    async fn list_files(
        &self,
        folder_id: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> Result<RawPage<RemoteFile>>;

    async fn search_files(&self, query: &str, limit: u32, offset: u64)
    -> Result<RawPage<RemoteFile>>;

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<RemoteFolder>;

    async fn list_folders(&self, parent_id: Option<&str>) -> Result<Vec<RemoteFolder>>;

    /// Permanently delete a folder.
    async fn delete_folder(&self, folder_id: &str) -> Result<()>;

    async fn quota(&self) -> Result<Quota>;
}
