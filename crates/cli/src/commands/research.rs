//! Research command handler.
//!
//! Drives one full report cycle: clarifying questions, answers, generation.

use super::build_agent;
use clap::Args;
use dossier_core::{config::AppConfig, AppError, AppResult};
use dossier_research::{export_markdown, report_file_stem, ReportAgent, ReportEvent};
use futures::StreamExt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Research a topic and write a cited report
#[derive(Args, Debug)]
pub struct ResearchCommand {
    /// Topic to research
    pub topic: String,

    /// Answers to the clarifying questions (read from stdin when omitted)
    #[arg(short, long)]
    pub answers: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also export the report to PDF
    #[arg(long)]
    pub pdf: bool,
}

impl ResearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing research command");
        tracing::debug!("Research command options: {:?}", self);

        let agent = build_agent(config).await?;

        let questions = self.clarify(&agent).await?;
        eprintln!("{}\n", questions);

        let answers = match self.answers {
            Some(ref answers) => answers.clone(),
            None => read_answers().await?,
        };

        let report = generate(&agent, &answers).await?;
        write_report(&report, self.output.as_deref())?;

        if self.pdf {
            let target = pdf_path(&self.topic, self.output.as_deref(), &config.workspace);
            let outcome = export_markdown(&report, &target, &config.export).await;
            // Export problems never discard the report itself.
            if outcome.success {
                eprintln!("{}", outcome.detail);
            } else {
                eprintln!("PDF export failed: {}", outcome.detail);
            }
        }

        Ok(())
    }

    async fn clarify(&self, agent: &ReportAgent) -> AppResult<String> {
        let mut stream = agent
            .submit(self.topic.as_str())
            .ok_or_else(|| AppError::Report("A report is already being generated".to_string()))?;

        match stream.next().await {
            Some(event @ ReportEvent::Clarification { .. }) => Ok(event.render()),
            Some(ReportEvent::Failed { message }) => Err(AppError::Report(message)),
            other => Err(AppError::Report(format!(
                "Unexpected reply to topic: {:?}",
                other
            ))),
        }
    }
}

/// Run generation, echoing progress to stderr. Returns the final report.
async fn generate(agent: &ReportAgent, answers: &str) -> AppResult<String> {
    let mut stream = agent
        .submit(answers)
        .ok_or_else(|| AppError::Report("A report is already being generated".to_string()))?;

    let mut shown = 0;
    while let Some(event) = stream.next().await {
        match event {
            ReportEvent::Completed { report } => return Ok(report),
            ReportEvent::Failed { message } => return Err(AppError::Report(message)),
            ReportEvent::Progress { ref report } => {
                // Snapshots are cumulative; only the new section is echoed.
                eprint!("{}", report.get(shown..).unwrap_or(report.as_str()));
                shown = report.len();
            }
            other => eprintln!("{}", other.render()),
        }
    }

    Err(AppError::Report(
        "Report stream ended without a result".to_string(),
    ))
}

async fn read_answers() -> AppResult<String> {
    if std::io::stdin().is_terminal() {
        eprintln!("Your answers (finish with Ctrl-D):");
    }

    let mut answers = String::new();
    tokio::io::stdin().read_to_string(&mut answers).await?;
    Ok(answers.trim().to_string())
}

fn write_report(report: &str, output: Option<&Path>) -> AppResult<()> {
    match output {
        Some(path) => {
            std::fs::write(path, report)?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", report),
    }
    Ok(())
}

/// PDF target: beside `--output` when given, otherwise in the workspace.
fn pdf_path(topic: &str, output: Option<&Path>, workspace: &Path) -> PathBuf {
    let dir = output
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(workspace);
    dir.join(format!("{}.pdf", report_file_stem(topic)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pdf_path_defaults_to_workspace() {
        let path = pdf_path("Solar desalination?", None, Path::new("/work"));
        assert_eq!(path, PathBuf::from("/work/Solar_desalination_Report.pdf"));
    }

    #[test]
    fn test_pdf_path_follows_output_dir() {
        let path = pdf_path("tidal power", Some(Path::new("/out/report.md")), Path::new("/work"));
        assert_eq!(path, PathBuf::from("/out/tidal_power_Report.pdf"));

        let bare = pdf_path("tidal power", Some(Path::new("report.md")), Path::new("/work"));
        assert_eq!(bare, PathBuf::from("/work/tidal_power_Report.pdf"));
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("report.md");

        write_report("# Report\n", Some(&target)).unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "# Report\n");
    }
}
