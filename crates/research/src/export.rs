//! Markdown to PDF export through pandoc.

use dossier_core::config::ExportSettings;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Result of an export attempt. Export never fails the report itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub success: bool,
    pub output: PathBuf,
    /// What went wrong, or a confirmation on success.
    pub detail: String,
}

impl ExportOutcome {
    fn ok(output: &Path) -> Self {
        Self {
            success: true,
            output: output.to_path_buf(),
            detail: format!("Created {}", output.display()),
        }
    }

    fn failed(output: &Path, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::warn!(output = %output.display(), detail = %detail, "PDF export failed");
        Self {
            success: false,
            output: output.to_path_buf(),
            detail,
        }
    }
}

/// File stem for a report on `topic`, e.g. `Solar_desalination_Report`.
pub fn report_file_stem(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut stem = String::with_capacity(kept.len() + 7);
    let mut in_gap = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_whitespace() {
            if !in_gap {
                stem.push('_');
                in_gap = true;
            }
        } else {
            stem.push(c);
            in_gap = false;
        }
    }

    stem.push_str("_Report");
    stem
}

/// Render `markdown` to a PDF at `output`.
///
/// The intermediate markdown file is removed on every path.
pub async fn export_markdown(markdown: &str, output: &Path, settings: &ExportSettings) -> ExportOutcome {
    export_in(markdown, output, settings, &std::env::temp_dir()).await
}

async fn export_in(markdown: &str, output: &Path, settings: &ExportSettings, scratch: &Path) -> ExportOutcome {
    if markdown.trim().is_empty() {
        return ExportOutcome::failed(output, "Cannot export an empty report");
    }

    if !is_invocable(&settings.pandoc).await {
        return ExportOutcome::failed(
            output,
            format!(
                "{} is not installed or not on PATH. See https://pandoc.org/installing.html",
                settings.pandoc
            ),
        );
    }

    if !is_invocable(&settings.pdf_engine).await {
        return ExportOutcome::failed(
            output,
            format!(
                "PDF engine {} is not installed or not on PATH. Install a LaTeX distribution such as TeX Live",
                settings.pdf_engine
            ),
        );
    }

    let mut source = match tempfile::Builder::new()
        .prefix("dossier-report-")
        .suffix(".md")
        .tempfile_in(scratch)
    {
        Ok(file) => file,
        Err(e) => return ExportOutcome::failed(output, format!("Failed to create temporary file: {}", e)),
    };

    if let Err(e) = source.write_all(markdown.as_bytes()).and_then(|_| source.flush()) {
        return ExportOutcome::failed(output, format!("Failed to write temporary file: {}", e));
    }

    tracing::info!(output = %output.display(), "Exporting report to PDF");

    let result = Command::new(&settings.pandoc)
        .args(pandoc_args(source.path(), output, settings))
        .stdin(Stdio::null())
        .output()
        .await;

    // `source` is deleted when it drops at the end of this scope.
    match result {
        Ok(out) if out.status.success() => ExportOutcome::ok(output),
        Ok(out) => ExportOutcome::failed(
            output,
            format!(
                "pandoc exited with {}\nSTDOUT: {}\nSTDERR: {}",
                out.status,
                String::from_utf8_lossy(&out.stdout).trim(),
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        ),
        Err(e) => ExportOutcome::failed(output, format!("Failed to run {}: {}", settings.pandoc, e)),
    }
}

fn pandoc_args(input: &Path, output: &Path, settings: &ExportSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        input.into(),
        "-o".into(),
        output.into(),
        "--from".into(),
        "markdown".into(),
        "--to".into(),
        "pdf".into(),
        "--pdf-engine".into(),
        settings.pdf_engine.clone().into(),
    ];

    for var in [
        format!("geometry:margin={}", settings.margin),
        format!("mainfont:{}", settings.main_font),
        format!("sansfont:{}", settings.sans_font),
        format!("monofont:{}", settings.mono_font),
        format!("fontsize={}", settings.font_size),
    ] {
        args.push("-V".into());
        args.push(var.into());
    }

    if settings.toc {
        args.push("--toc".into());
    }

    args
}

async fn is_invocable(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok()
}
