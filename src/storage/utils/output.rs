// Presentation of operation results, kept outside the core
use crate::error::Result;
use crate::storage::models::{Quota, RemoteFile, RemoteFolder};
use crate::storage::operations::batch::{BatchSummary, TransferOutcome};
use crate::storage::operations::paginate::Page;
use crate::storage::utils::size::format_size;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write;

/// Output format for CLI commands that can render machine-readable results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human friendly multi-line output
    #[default]
    Human,
    /// Pretty-printed JSON output
    Json,
}

/// Human-readable rendering of a result.
pub trait Render {
    fn render_human(&self) -> String;
}

/// Render `value` in the requested shape.
pub fn render<T: Render + Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(value.render_human()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

impl Render for TransferOutcome {
    fn render_human(&self) -> String {
        let path = self.path().display();
        match self {
            TransferOutcome::Succeeded {
                remote_id, message, ..
            } => format!("✅ {path}: {message} (id: {remote_id})"),
            TransferOutcome::Failed { reason, .. } => format!("❌ {path}: {reason}"),
            TransferOutcome::Skipped { reason, .. } => format!("⏭  {path}: {reason}"),
        }
    }
}

impl Render for BatchSummary {
    fn render_human(&self) -> String {
        let mut out = format!(
            "Batch upload: {} total, {} succeeded, {} failed, {} skipped",
            self.total(),
            self.successful(),
            self.failed(),
            self.skipped()
        );
        for outcome in self.outcomes() {
            let _ = write!(out, "\n  {}", outcome.render_human());
        }
        if let Some(note) = self.note() {
            let _ = write!(out, "\nNote: {note}");
        }
        out
    }
}

impl Render for RemoteFile {
    fn render_human(&self) -> String {
        let modified = self
            .updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .unwrap_or("Unknown");
        format!(
            "FILE   {:>10} {modified} {} {}",
            format_size(self.size),
            self.id,
            self.name
        )
    }
}

impl Render for RemoteFolder {
    fn render_human(&self) -> String {
        let created = self.created_at.as_deref().unwrap_or("Unknown");
        format!("DIR    {:>10} {created} {} {}", "-", self.id, self.name)
    }
}

impl Render for Vec<RemoteFolder> {
    fn render_human(&self) -> String {
        if self.is_empty() {
            return "No folders".to_string();
        }
        self.iter()
            .map(Render::render_human)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<T: Render> Render for Page<T> {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            let _ = writeln!(out, "{}", item.render_human());
        }
        if self.count == 0 {
            let _ = write!(out, "No items at offset {} of {}", self.offset, self.total);
        } else {
            let _ = write!(
                out,
                "Showing {}-{} of {}",
                self.offset.saturating_add(1),
                self.offset.saturating_add(self.count as u64),
                self.total
            );
        }
        if let Some(next) = self.next_offset {
            let _ = write!(out, " (next offset: {next})");
        }
        out
    }
}

impl Render for Quota {
    fn render_human(&self) -> String {
        format!(
            "Used:      {}\nTotal:     {}\nAvailable: {}\nFiles:     {}\nFolders:   {}",
            format_size(self.used),
            format_size(self.total),
            format_size(self.available),
            self.file_count,
            self.folder_count
        )
    }
}
