use crate::error::Result;
use crate::storage::utils::{OutputFormat, Render, render};
use crate::storage::{Gateway, StorageClient};
use crate::utils::confirm_deletion;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line access to remote object storage.
#[derive(Parser, Debug)]
#[command(name = "stowage", version, about, long_about = None)]
pub struct Args {
    /// Output shape for results
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a single file (at most 40MB)
    Put {
        path: PathBuf,
        /// Name to store the file under
        #[arg(long)]
        name: Option<String>,
    },
    /// Upload the files of a local directory
    PutDir {
        root: PathBuf,
        /// Descend into subdirectories
        #[arg(short = 'R', long)]
        recursive: bool,
        /// Case-insensitive glob applied to file names, e.g. "*.mp4"
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Upload up to 100 files in one batch
    BulkPut {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },
    /// List files, optionally inside a folder
    Ls {
        #[arg(long)]
        folder: Option<String>,
        /// Page size, 1 to 100
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Search files by name
    Search {
        query: String,
        /// Page size, 1 to 100
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Download a file to a local path
    Get { file_id: String, dest: PathBuf },
    /// Show metadata for a file
    Info { file_id: String },
    /// Permanently delete a file
    Rm {
        file_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Create a folder
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// List folders
    Folders {
        #[arg(long)]
        parent: Option<String>,
    },
    /// Permanently delete a folder
    Rmdir {
        folder_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show storage usage
    Quota,
}

/// Plain status line for operations without a richer result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
}

impl Report {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            bytes: None,
        }
    }

    fn absent(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            bytes: None,
        }
    }
}

impl Render for Report {
    fn render_human(&self) -> String {
        let marker = if self.success { "✅" } else { "❌" };
        format!("{marker} {}", self.message)
    }
}

fn emit<T: Render + Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

pub async fn run<G: Gateway>(args: Args, client: StorageClient<G>) -> Result<()> {
    let format = args.format;
    match args.command {
        Command::Put { path, name } => {
            let outcome = client.upload_file(&path, name.as_deref()).await;
            emit(&outcome, format)?;
        }
        Command::PutDir {
            root,
            recursive,
            pattern,
        } => {
            let summary = client
                .upload_directory(&root, recursive, pattern.as_deref())
                .await?;
            emit(&summary, format)?;
        }
        Command::BulkPut { paths } => {
            let summary = client.bulk_upload(&paths).await?;
            emit(&summary, format)?;
        }
        Command::Ls {
            folder,
            limit,
            offset,
        } => {
            let page = client.list_files(folder.as_deref(), limit, offset).await?;
            emit(&page, format)?;
        }
        Command::Search {
            query,
            limit,
            offset,
        } => {
            let page = client.search_files(&query, limit, offset).await?;
            emit(&page, format)?;
        }
        Command::Get { file_id, dest } => {
            let bytes = client.download_file(&file_id, &dest).await?;
            let mut report = Report::ok(format!(
                "Downloaded {file_id} → {} ({bytes} bytes)",
                dest.display()
            ));
            report.bytes = Some(bytes);
            emit(&report, format)?;
        }
        Command::Info { file_id } => match client.file_info(&file_id).await? {
            Some(file) => emit(&file, format)?,
            None => emit(&Report::absent(format!("File '{file_id}' not found")), format)?,
        },
        Command::Rm { file_id, force } => {
            if !confirm_deletion("file", std::slice::from_ref(&file_id), force)? {
                println!("Aborted");
                return Ok(());
            }
            client.delete_file(&file_id).await?;
            emit(&Report::ok(format!("Deleted file {file_id}")), format)?;
        }
        Command::Mkdir { name, parent } => {
            let folder = client.create_folder(&name, parent.as_deref()).await?;
            emit(&folder, format)?;
        }
        Command::Folders { parent } => {
            let folders = client.list_folders(parent.as_deref()).await?;
            emit(&folders, format)?;
        }
        Command::Rmdir { folder_id, force } => {
            if !confirm_deletion("folder", std::slice::from_ref(&folder_id), force)? {
                println!("Aborted");
                return Ok(());
            }
            client.delete_folder(&folder_id).await?;
            emit(&Report::ok(format!("Deleted folder {folder_id}")), format)?;
        }
        Command::Quota => {
            let quota = client.quota().await?;
            emit(&quota, format)?;
        }
    }
    Ok(())
}
