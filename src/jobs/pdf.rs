use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{bail, Context, Result};

use crate::config::JobConfig;

const LOG_FILENAME: &str = "pdf_summary.log";

#[derive(Debug, Clone)]
pub struct PdfSummaryJob {
    pub pdf_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct JobHandle {
    pub pid: u32,
    pub log_path: PathBuf,
}

/// Starts PDF summarization in a detached process; the caller never waits for it.
pub struct PdfSummaryLauncher {
    command: Option<String>,
    log_path: PathBuf,
}

impl PdfSummaryLauncher {
    pub fn new(config: &JobConfig, logs_dir: &Path) -> Self {
        Self {
            command: config.pdf_summary_command.clone(),
            log_path: logs_dir.join(LOG_FILENAME),
        }
    }

    pub fn submit(&self, job: PdfSummaryJob) -> Result<JobHandle> {
        let Some(command) = self.command.as_deref() else {
            bail!("PDF_SUMMARY_COMMAND is not configured");
        };
        if !job.pdf_path.is_file() {
            bail!("PDF not found: {}", job.pdf_path.display());
        }

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("failed to open job log {}", self.log_path.display()))?;
        let stderr = log.try_clone()?;

        let child = Command::new(command)
            .arg(&job.pdf_path)
            .stdin(Stdio::null())
            .stdout(log)
            .stderr(stderr)
            .spawn()
            .with_context(|| format!("failed to launch {command}"))?;

        tracing::info!(
            target: "jobs",
            pid = child.id(),
            pdf = %job.pdf_path.display(),
            log = %self.log_path.display(),
            "PDF summary job started"
        );

        Ok(JobHandle {
            pid: child.id(),
            log_path: self.log_path.clone(),
        })
    }
}
