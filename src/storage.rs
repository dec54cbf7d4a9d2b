use crate::config::GatewayConfig;
use crate::error::{
    BatchTooLargeSnafu, DirectoryNotFoundSnafu, EmptyBatchSnafu, EmptyQuerySnafu,
    NotADirectorySnafu, RemoteFileNotFoundSnafu, Result,
};
use crate::wrap_err;
use snafu::{OptionExt, ensure};
use std::path::{Path, PathBuf};
use tokio::fs;

pub mod constants;
pub mod gateway;
pub mod http;
pub mod models;
pub mod operations;
pub mod utils;

pub use self::gateway::Gateway;
pub use self::http::HttpGateway;
pub use self::models::{Quota, RawPage, RemoteFile, RemoteFolder, UploadReceipt};
pub use self::operations::batch::{BatchSummary, BatchUploader, TransferOutcome, UploadOutcome};
pub use self::operations::paginate::Page;
pub use self::operations::policy::{SizePolicy, Verdict};

use self::constants::MAX_BULK_PATHS;
use self::operations::enumerate::FileEnumerator;
use self::operations::paginate::paginate;

/// Caller-facing storage operations over one gateway handle.
///
/// The gateway is constructed once and passed in, so tests can substitute a
/// double for the HTTP implementation.
#[derive(Debug, Clone)]
pub struct StorageClient<G = HttpGateway> {
    gateway: G,
    uploader: BatchUploader,
}

impl StorageClient<HttpGateway> {
    /// Connect to the remote service described by `config`.
    pub fn connect(config: &GatewayConfig) -> Result<Self> {
        Ok(Self::new(HttpGateway::new(config)?))
    }
}

impl<G: Gateway> StorageClient<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            uploader: BatchUploader::new(SizePolicy::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Upload one file, applying the same checks as a batch item.
    pub async fn upload_file(&self, local_path: &Path, remote_name: Option<&str>) -> UploadOutcome {
        log::debug!(
            "upload_file local_path={} remote_name={:?}",
            local_path.display(),
            remote_name
        );
        let gateway = &self.gateway;
        self.uploader
            .transfer_one(local_path, |path| async move {
                gateway.upload(&path, remote_name).await
            })
            .await
    }

    /// Upload every file under `root`, optionally recursing and filtering by a glob.
    pub async fn upload_directory(
        &self,
        root: &Path,
        recursive: bool,
        pattern: Option<&str>,
    ) -> Result<BatchSummary> {
        log::debug!(
            "upload_directory root={} recursive={} pattern={:?}",
            root.display(),
            recursive,
            pattern
        );
        let enumerator = FileEnumerator::new(recursive, pattern)?;
        let meta = fs::metadata(root)
            .await
            .ok()
            .context(DirectoryNotFoundSnafu { path: root })?;
        ensure!(meta.is_dir(), NotADirectorySnafu { path: root });

        let candidates = enumerator.enumerate(root).await?;
        if candidates.is_empty() {
            let note = match pattern {
                Some(pattern) => format!(
                    "No files matching '{pattern}' found in {}",
                    root.display()
                ),
                None => format!("No files found in {}", root.display()),
            };
            return Ok(BatchSummary::empty_with_note(note));
        }
        Ok(self.run_batch(&candidates).await)
    }

    /// Upload an explicit list of 1 to 100 paths.
    pub async fn bulk_upload(&self, paths: &[PathBuf]) -> Result<BatchSummary> {
        log::debug!("bulk_upload paths_count={}", paths.len());
        ensure!(!paths.is_empty(), EmptyBatchSnafu);
        ensure!(
            paths.len() <= MAX_BULK_PATHS,
            BatchTooLargeSnafu {
                count: paths.len(),
                max: MAX_BULK_PATHS,
            }
        );
        Ok(self.run_batch(paths).await)
    }

    async fn run_batch(&self, candidates: &[PathBuf]) -> BatchSummary {
        let gateway = &self.gateway;
        let summary = self
            .uploader
            .run(candidates, |path| async move {
                gateway.upload(&path, None).await
            })
            .await;
        log::info!(
            "batch finished total={} successful={} failed={} skipped={}",
            summary.total(),
            summary.successful(),
            summary.failed(),
            summary.skipped()
        );
        summary
    }

    pub async fn list_files(
        &self,
        folder_id: Option<&str>,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> Result<Page<RemoteFile>> {
        log::debug!(
            "list_files folder_id={:?} limit={:?} offset={:?}",
            folder_id,
            limit,
            offset
        );
        let gateway = &self.gateway;
        paginate(limit, offset, |limit, offset| async move {
            wrap_err!(
                gateway.list_files(folder_id, limit, offset).await,
                ListFilesFailed {
                    folder: folder_id.unwrap_or("root").to_string()
                }
            )
        })
        .await
    }

    pub async fn search_files(
        &self,
        query: &str,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> Result<Page<RemoteFile>> {
        log::debug!(
            "search_files query={} limit={:?} offset={:?}",
            query,
            limit,
            offset
        );
        let query = query.trim();
        ensure!(!query.is_empty(), EmptyQuerySnafu);
        let gateway = &self.gateway;
        paginate(limit, offset, |limit, offset| async move {
            wrap_err!(
                gateway.search_files(query, limit, offset).await,
                SearchFailed {
                    query: query.to_string()
                }
            )
        })
        .await
    }

    /// Download a file to `dest`, returning the number of bytes written.
    pub async fn download_file(&self, file_id: &str, dest: &Path) -> Result<u64> {
        log::debug!("download_file file_id={} dest={}", file_id, dest.display());
        let written = wrap_err!(
            self.gateway.download(file_id, dest).await,
            DownloadFailed {
                file_id: file_id.to_string(),
                local_path: dest.display().to_string()
            }
        )?;
        written.context(RemoteFileNotFoundSnafu { file_id })
    }

    /// Metadata for one file, `None` when it does not exist.
    pub async fn file_info(&self, file_id: &str) -> Result<Option<RemoteFile>> {
        log::debug!("file_info file_id={file_id}");
        self.gateway.file_info(file_id).await
    }

    /// Permanently delete a file. There is no undo.
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        log::debug!("delete_file file_id={file_id}");
        wrap_err!(
            self.gateway.delete_file(file_id).await,
            DeleteFailed {
                target: format!("file {file_id}")
            }
        )
    }

    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<RemoteFolder> {
        log::debug!("create_folder name={name} parent_id={parent_id:?}");
        wrap_err!(
            self.gateway.create_folder(name, parent_id).await,
            FolderCreationFailed {
                name: name.to_string()
            }
        )
    }

    pub async fn list_folders(&self, parent_id: Option<&str>) -> Result<Vec<RemoteFolder>> {
        log::debug!("list_folders parent_id={parent_id:?}");
        self.gateway.list_folders(parent_id).await
    }

    /// Permanently delete a folder. There is no undo.
    pub async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        log::debug!("delete_folder folder_id={folder_id}");
        wrap_err!(
            self.gateway.delete_folder(folder_id).await,
            DeleteFailed {
                target: format!("folder {folder_id}")
            }
        )
    }

    pub async fn quota(&self) -> Result<Quota> {
        log::debug!("quota");
        self.gateway.quota().await
    }
}
