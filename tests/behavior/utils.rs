use assert_cmd::prelude::*;
use libtest_mimic::{Failed, Trial};
use rand::prelude::*;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, LazyLock, Mutex};
use stowage::error::Result;
use stowage::storage::gateway::Gateway;
use stowage::storage::http::classify_status;
use stowage::storage::{Quota, RawPage, RemoteFile, RemoteFolder, StorageClient, UploadReceipt};
use tokio::fs;
use uuid::Uuid;

const TEST_TOKEN: &str = "behavior-test-token";
// Nothing listens here; commands that reach the network fail with a connect error.
const TEST_UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9";
const TEST_QUOTA_TOTAL: u64 = 10 * 1024 * 1024 * 1024;

pub type TestClient = StorageClient<MemoryGateway>;

pub static TEST_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
});

#[derive(Default)]
struct MemoryState {
    files: Vec<(RemoteFile, Vec<u8>)>,
    folders: Vec<RemoteFolder>,
    next_id: u64,
    upload_calls: usize,
    // File name -> HTTP status the next uploads of that name fail with
    upload_failures: HashMap<String, u16>,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }
}

/// In-memory stand-in for the remote service that records every upload call.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    /// Make uploads of files called `file_name` fail with `status`.
    pub fn fail_uploads_named(&self, file_name: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .upload_failures
            .insert(file_name.to_string(), status);
    }

    /// Insert `count` files directly, bypassing the upload path.
    pub fn seed_files(&self, count: usize, folder_id: Option<&str>) -> Vec<String> {
        let mut state = self.state.lock().unwrap();
        (0..count)
            .map(|i| {
                let id = state.next_id("seed");
                let file = RemoteFile {
                    id: id.clone(),
                    name: format!("seeded-{i:03}.txt"),
                    size: i as u64,
                    folder_id: folder_id.map(str::to_string),
                    node_id: Some("node-a".to_string()),
                    created_at: None,
                    updated_at: None,
                };
                state.files.push((file, Vec::new()));
                id
            })
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }
}

impl Gateway for MemoryGateway {
    async fn upload(&self, local_path: &Path, remote_name: Option<&str>) -> Result<UploadReceipt> {
        let name = remote_name.map(str::to_string).unwrap_or_else(|| {
            local_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string()
        });
        {
            let mut state = self.state.lock().unwrap();
            state.upload_calls += 1;
            if let Some(status) = state.upload_failures.get(&name) {
                return Err(classify_status(*status, ""));
            }
        }

        let content = fs::read(local_path).await?;
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("file");
        let file = RemoteFile {
            id: id.clone(),
            name: name.clone(),
            size: content.len() as u64,
            folder_id: None,
            node_id: Some("node-a".to_string()),
            created_at: Some("2026-10-18T00:00:00Z".to_string()),
            updated_at: None,
        };
        state.files.push((file, content));
        Ok(UploadReceipt {
            id,
            name: Some(name),
        })
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<Option<u64>> {
        let content = {
            let state = self.state.lock().unwrap();
            state
                .files
                .iter()
                .find(|(file, _)| file.id == file_id)
                .map(|(_, content)| content.clone())
        };
        let Some(content) = content else {
            return Ok(None);
        };
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(dest, &content).await?;
        Ok(Some(content.len() as u64))
    }

    async fn file_info(&self, file_id: &str) -> Result<Option<RemoteFile>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .iter()
            .find(|(file, _)| file.id == file_id)
            .map(|(file, _)| file.clone()))
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.files.len();
        state.files.retain(|(file, _)| file.id != file_id);
        if state.files.len() == before {
            return Err(classify_status(404, r#"{"error": "file does not exist"}"#));
        }
        Ok(())
    }

    async fn list_files(
        &self,
        folder_id: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> Result<RawPage<RemoteFile>> {
        let state = self.state.lock().unwrap();
        let matching: Vec<&RemoteFile> = state
            .files
            .iter()
            .map(|(file, _)| file)
            .filter(|file| folder_id.is_none() || file.folder_id.as_deref() == folder_id)
            .collect();
        Ok(window(&matching, limit, offset))
    }

    async fn search_files(
        &self,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<RawPage<RemoteFile>> {
        let needle = query.to_lowercase();
        let state = self.state.lock().unwrap();
        let matching: Vec<&RemoteFile> = state
            .files
            .iter()
            .map(|(file, _)| file)
            .filter(|file| file.name.to_lowercase().contains(&needle))
            .collect();
        Ok(window(&matching, limit, offset))
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<RemoteFolder> {
        let mut state = self.state.lock().unwrap();
        let folder = RemoteFolder {
            id: state.next_id("folder"),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
            created_at: None,
            updated_at: None,
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn list_folders(&self, parent_id: Option<&str>) -> Result<Vec<RemoteFolder>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .folders
            .iter()
            .filter(|folder| folder.parent_id.as_deref() == parent_id)
            .cloned()
            .collect())
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.folders.len();
        state.folders.retain(|folder| folder.id != folder_id);
        if state.folders.len() == before {
            return Err(classify_status(404, ""));
        }
        Ok(())
    }

    async fn quota(&self) -> Result<Quota> {
        let state = self.state.lock().unwrap();
        let used: u64 = state.files.iter().map(|(file, _)| file.size).sum();
        Ok(Quota {
            used,
            total: TEST_QUOTA_TOTAL,
            available: TEST_QUOTA_TOTAL - used,
            file_count: state.files.len() as u64,
            folder_count: state.folders.len() as u64,
        })
    }
}

fn window(matching: &[&RemoteFile], limit: u32, offset: u64) -> RawPage<RemoteFile> {
    RawPage {
        items: matching
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|file| (*file).clone())
            .collect(),
        total: matching.len() as u64,
    }
}

pub async fn init_test_service() -> Result<TestClient> {
    Ok(StorageClient::new(MemoryGateway::default()))
}

/// A client over its own empty gateway, for tests that count calls.
pub fn fresh_client() -> TestClient {
    StorageClient::new(MemoryGateway::default())
}

/// Local scratch files and directories created by the tests.
pub struct Fixture {
    pub paths: Mutex<Vec<PathBuf>>,
}

impl Fixture {
    pub const fn new() -> Self {
        Self {
            paths: Mutex::new(vec![]),
        }
    }

    /// Create an empty scratch directory that is removed on cleanup.
    pub fn new_dir(&self) -> PathBuf {
        let path = env::temp_dir().join(format!("stowage-behavior-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        self.paths.lock().unwrap().push(path.clone());
        path
    }

    /// A path inside `dir` that does not exist.
    pub fn missing_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("missing-{}", Uuid::new_v4()))
    }

    /// Write a file with random content whose size is drawn from `range`.
    pub fn new_file_with_range(
        &self,
        dir: &Path,
        name: &str,
        range: std::ops::Range<usize>,
    ) -> (PathBuf, Vec<u8>) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }

        let mut rng = rand::rng();
        let size = rng.random_range(range);
        let mut content = vec![0; size];
        rng.fill_bytes(&mut content);
        std::fs::write(&path, &content).unwrap();

        (path, content)
    }

    /// Create a sparse file of exactly `size` bytes without writing its content.
    pub fn new_sized_file(&self, dir: &Path, name: &str, size: u64) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(size).unwrap();
        path
    }

    pub fn cleanup(&self) {
        let paths: Vec<_> = std::mem::take(&mut *self.paths.lock().unwrap());
        for path in paths {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_async_trial<F, Fut>(name: &str, client: &TestClient, f: F) -> Trial
where
    F: FnOnce(TestClient) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>>,
{
    let handle = TEST_RUNTIME.handle().clone();
    let client = client.clone();

    Trial::test(format!("behavior::{name}"), move || {
        handle
            .block_on(f(client))
            .map_err(|err| Failed::from(err.to_string()))
    })
}

#[macro_export]
macro_rules! async_trials {
    ($client:ident, $($test:ident),*) => {
        vec![$(build_async_trial(stringify!($test), $client, $test),)*]
    };
}

pub static TEST_FIXTURE: Fixture = Fixture::new();

/// A stowage command with a clean environment, a dummy token and an
/// endpoint nothing listens on.
pub fn stowage_cmd() -> Command {
    let mut cmd = Command::cargo_bin("stowage").unwrap();
    cmd.env_clear()
        .env("RUST_LOG", "info")
        .env("STOWAGE_API_TOKEN", TEST_TOKEN)
        .env("STOWAGE_API_URL", TEST_UNREACHABLE_ENDPOINT)
        .env("STOWAGE_DOWNLOAD_URL", TEST_UNREACHABLE_ENDPOINT)
        .env("STOWAGE_TIMEOUT_SECS", "2");
    cmd
}

/// A stowage command with no credential configured.
pub fn stowage_cmd_without_token() -> Command {
    let mut cmd = Command::cargo_bin("stowage").unwrap();
    cmd.env_clear().env("RUST_LOG", "info");
    cmd
}
