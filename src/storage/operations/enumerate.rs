use crate::error::{InvalidPatternSnafu, Result};
use async_recursion::async_recursion;
use globset::{GlobBuilder, GlobMatcher};
use snafu::ResultExt;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Produces the ordered list of local files a directory upload should attempt.
///
/// Entries are visited depth-first in byte order of their names so repeated
/// runs over an unchanged tree yield the same sequence. The optional pattern
/// is a case-insensitive shell glob matched against file base names only.
pub struct FileEnumerator {
    recursive: bool,
    matcher: Option<GlobMatcher>,
}

impl FileEnumerator {
    /// Build an enumerator, compiling `pattern` up front so a malformed glob
    /// is reported before anything is read.
    pub fn new(recursive: bool, pattern: Option<&str>) -> Result<Self> {
        let matcher = pattern
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(compile_pattern)
            .transpose()?;
        Ok(Self { recursive, matcher })
    }

    /// List candidate files under `root` as absolute paths.
    ///
    /// A root that does not exist, or is not a directory, yields an empty list.
    pub async fn enumerate(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = std::path::absolute(root)?;
        let mut found = Vec::new();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => self.walk(&root, &mut found).await,
            _ => log::debug!("enumerate root={} missing, nothing to do", root.display()),
        }
        Ok(found)
    }

    fn matches(&self, path: &Path) -> bool {
        match (&self.matcher, path.file_name()) {
            (None, _) => true,
            (Some(matcher), Some(name)) => matcher.is_match(Path::new(name)),
            (Some(_), None) => false,
        }
    }

    #[async_recursion]
    async fn walk(&self, dir: &Path, found: &mut Vec<PathBuf>) {
        let entries = match read_sorted(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping unreadable directory {}: {e}", dir.display());
                return;
            }
        };

        for (path, file_type) in entries {
            if file_type.is_dir() {
                if self.recursive {
                    self.walk(&path, found).await;
                }
            } else if file_type.is_file() {
                if self.matches(&path) {
                    found.push(path);
                }
            } else if file_type.is_symlink() {
                // Follow links to files, never links to directories.
                let is_file = fs::metadata(&path)
                    .await
                    .map(|meta| meta.is_file())
                    .unwrap_or(false);
                if is_file && self.matches(&path) {
                    found.push(path);
                }
            }
        }
    }
}

/// Convenience wrapper around [`FileEnumerator`].
pub async fn enumerate_files(
    root: &Path,
    recursive: bool,
    pattern: Option<&str>,
) -> Result<Vec<PathBuf>> {
    FileEnumerator::new(recursive, pattern)?
        .enumerate(root)
        .await
}

fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .context(InvalidPatternSnafu { pattern })?;
    Ok(glob.compile_matcher())
}

async fn read_sorted(dir: &Path) -> std::io::Result<Vec<(PathBuf, FileType)>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut listed = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(file_type) => listed.push((entry.path(), file_type)),
            Err(e) => log::warn!("Skipping {}: {e}", entry.path().display()),
        }
    }
    listed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(listed)
}
