//! Per-process log file.
//!
//! One file per launch, `<YYYY-MM-DD-HH-MM>-<program>.log`, shared by the
//! two output pumps and the exit watcher.

use super::error::{Result, SupervisorError};
use super::termination::TerminationSignal;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const RULE_WIDTH: usize = 80;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLabel {
    Stdout,
    Stderr,
}

impl StreamLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamLabel::Stdout => "STDOUT",
            StreamLabel::Stderr => "STDERR",
        }
    }
}

/// Footer data written once the process has exited.
#[derive(Debug, Clone)]
pub struct ExitSummary {
    pub ended: DateTime<Local>,
    pub runtime_secs: f64,
    pub exit_code: Option<i32>,
    pub hostname: String,
}

/// Line-oriented, thread-safe writer for one process log.
///
/// Every write is flushed so the file can be tailed while the process runs.
/// Write errors are dropped: there is nowhere left to report them.
pub struct ProcessLog {
    writer: Mutex<Option<BufWriter<File>>>,
    path: PathBuf,
}

impl ProcessLog {
    /// File name for `program` started at `started`.
    pub fn file_name(program: &str, started: &DateTime<Local>) -> String {
        format!("{}-{}.log", started.format("%Y-%m-%d-%H-%M"), program)
    }

    /// Create `dir` if needed and open the log file for appending.
    pub fn open(dir: &Path, program: &str, started: &DateTime<Local>) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| SupervisorError::CreateLogDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(Self::file_name(program, started));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SupervisorError::OpenLogFile {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            writer: Mutex::new(Some(BufWriter::new(file))),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_header(&self, command_line: &str, started: &DateTime<Local>) {
        let rule = "-".repeat(RULE_WIDTH);
        self.write_raw(&format!(
            "{rule}\n# Command\n{command_line}\n# Start time\n{}\n{rule}\n",
            started.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    /// One line of process output, prefixed with its stream label.
    pub fn line(&self, label: StreamLabel, text: &str) {
        self.write_raw(&format!("[{}] {}\n", label.as_str(), text));
    }

    /// A problem the supervisor itself ran into.
    pub fn note(&self, text: &str) {
        self.write_raw(&format!("[LOGGER] {text}\n"));
    }

    pub fn write_footer(&self, summary: &ExitSummary) {
        let rule = "-".repeat(RULE_WIDTH);
        let code = summary
            .exit_code
            .map_or_else(|| "None".to_string(), |c| c.to_string());
        self.write_raw(&format!(
            "\n{rule}\n# End time\n{}\n# Runtime (seconds)\n{:.3}\n# Exit code\n{}\n# Termination signal\n{}\n# Hostname\n{}\n{rule}\n",
            summary.ended.format("%Y-%m-%d %H:%M:%S"),
            summary.runtime_secs,
            code,
            TerminationSignal::from_exit_code(summary.exit_code),
            summary.hostname,
        ));
    }

    /// Flush and release the file. Later writes are ignored.
    pub fn close(&self) {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut writer) = guard.take() {
            let _ = writer.flush();
        }
    }

    fn write_raw(&self, text: &str) {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(writer) = guard.as_mut() {
            let _ = writer.write_all(text.as_bytes());
            let _ = writer.flush();
        }
    }
}

impl Drop for ProcessLog {
    fn drop(&mut self) {
        self.close();
    }
}
