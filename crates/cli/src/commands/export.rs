//! Export command handler.

use clap::Args;
use dossier_core::{config::AppConfig, AppError, AppResult};
use dossier_research::export_markdown;
use std::path::PathBuf;

/// Export a markdown report to PDF
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Markdown file to export
    pub markdown: PathBuf,

    /// PDF to create (default: the markdown path with a .pdf extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing export command");

        let markdown = tokio::fs::read_to_string(&self.markdown).await.map_err(|e| {
            AppError::Export(format!("Failed to read {:?}: {}", self.markdown, e))
        })?;

        let output = self.target();
        let outcome = export_markdown(&markdown, &output, &config.export).await;

        if !outcome.success {
            return Err(AppError::Export(outcome.detail));
        }

        println!("{}", outcome.detail);
        Ok(())
    }

    fn target(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.markdown.with_extension("pdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_swaps_extension() {
        let cmd = ExportCommand {
            markdown: PathBuf::from("reports/solar.md"),
            output: None,
        };
        assert_eq!(cmd.target(), PathBuf::from("reports/solar.pdf"));
    }

    #[test]
    fn test_explicit_target_wins() {
        let cmd = ExportCommand {
            markdown: PathBuf::from("solar.md"),
            output: Some(PathBuf::from("out.pdf")),
        };
        assert_eq!(cmd.target(), PathBuf::from("out.pdf"));
    }
}
