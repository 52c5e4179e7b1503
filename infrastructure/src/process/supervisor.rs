//! Subprocess supervisor.
//!
//! [`launch`] starts an external program with both output pipes captured and
//! returns immediately. Three background tasks then own the process:
//!
//! - two pumps copying stdout and stderr line by line into the log file,
//!   prefixed `[STDOUT]` / `[STDERR]`;
//! - a watcher that owns the child, delivers terminate and kill requests,
//!   reaps it, lets the pumps drain for a bounded grace period, writes the
//!   footer and publishes the [`ExitRecord`].
//!
//! Signals only ever go out from the watcher while the child is unreaped, so
//! a recycled pid can never be hit.
//!
//! The log file is created before the process is spawned, so it exists even
//! if the program dies instantly.

use super::error::{Result, SupervisorError};
use super::log_file::{ExitSummary, ProcessLog, StreamLabel};
use super::termination::{exit_code, hostname};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long the watcher waits for the pumps after the process exited.
const PUMP_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Executable plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Base name of the executable, used in the log file name.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Space-joined command line as written to the log header.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRecord {
    /// `None` when the exit status could not be read; `-N` when killed by
    /// signal `N`.
    pub exit_code: Option<i32>,
    pub runtime: Duration,
}

/// Request handled by the watcher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Terminate,
    Kill,
}

/// Handle to a running (or finished) supervised process.
///
/// Dropping the handle kills a process that is still running.
pub struct SupervisedProcess {
    program: String,
    pid: Option<u32>,
    log_path: PathBuf,
    exit: watch::Receiver<Option<ExitRecord>>,
    reaped: Arc<AtomicBool>,
    control: mpsc::UnboundedSender<Control>,
    _watcher: JoinHandle<()>,
}

/// Start `command`, teeing its output into a fresh log file under `log_dir`.
///
/// Fails only if the log directory or file cannot be created, or the
/// program cannot be spawned.
pub async fn launch(command: &LaunchCommand, log_dir: &Path) -> Result<SupervisedProcess> {
    if command.program().as_os_str().is_empty() {
        return Err(SupervisorError::EmptyCommand);
    }
    let program = command.program_name();
    let started_at = Local::now();
    let started = Instant::now();

    let log = Arc::new(ProcessLog::open(log_dir, &program, &started_at)?);
    log.write_header(&command.command_line(), &started_at);

    let mut cmd = Command::new(command.program());
    cmd.args(command.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Linux: request kernel to send SIGTERM to child when parent dies.
    // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
    #[cfg(target_os = "linux")]
    unsafe {
        cmd.pre_exec(|| {
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
            Ok(())
        });
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            log.note(&format!("Failed to spawn {program}: {source}"));
            log.close();
            return Err(SupervisorError::Spawn { program, source });
        }
    };
    let pid = child.id();
    debug!("Spawned {} (pid {:?}), logging to {}", program, pid, log.path().display());

    let stdout_pump = child
        .stdout
        .take()
        .map(|out| spawn_pump(out, StreamLabel::Stdout, log.clone()));
    let stderr_pump = child
        .stderr
        .take()
        .map(|err| spawn_pump(err, StreamLabel::Stderr, log.clone()));

    let (exit_tx, exit_rx) = watch::channel(None);
    let (control, mut requests) = mpsc::unbounded_channel();
    let reaped = Arc::new(AtomicBool::new(false));
    let reaped_flag = reaped.clone();
    let log_path = log.path().to_path_buf();
    let watched_program = program.clone();

    let watcher = tokio::spawn(async move {
        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                request = requests.recv() => match request {
                    Some(Control::Terminate) => request_termination(&mut child, &watched_program),
                    // A dropped handle means nobody will ever stop the process.
                    Some(Control::Kill) | None => {
                        let _ = child.start_kill();
                        break child.wait().await;
                    }
                },
            }
        };
        reaped_flag.store(true, Ordering::Release);

        for (label, pump) in [
            (StreamLabel::Stdout, stdout_pump),
            (StreamLabel::Stderr, stderr_pump),
        ] {
            let Some(mut pump) = pump else { continue };
            if tokio::time::timeout(PUMP_DRAIN_GRACE, &mut pump).await.is_err() {
                pump.abort();
                log.note(&format!("{} did not drain within {:?}", label.as_str(), PUMP_DRAIN_GRACE));
            }
        }

        let code = match &status {
            Ok(status) => exit_code(status),
            Err(e) => {
                log.note(&format!("Error waiting for process: {e}"));
                None
            }
        };
        let runtime = started.elapsed();
        log.write_footer(&ExitSummary {
            ended: Local::now(),
            runtime_secs: runtime.as_secs_f64(),
            exit_code: code,
            hostname: hostname(),
        });
        log.close();

        match code {
            Some(code) => info!("{} exited with code {}", watched_program, code),
            None => info!("{} exited with unknown code", watched_program),
        }
        let _ = exit_tx.send(Some(ExitRecord {
            exit_code: code,
            runtime,
        }));
    });

    Ok(SupervisedProcess {
        program,
        pid,
        log_path,
        exit: exit_rx,
        reaped,
        control,
        _watcher: watcher,
    })
}

/// SIGTERM on unix, a hard kill elsewhere. Only called before the child is
/// reaped, while its pid still belongs to it.
#[cfg(unix)]
fn request_termination(child: &mut Child, program: &str) {
    if let Some(pid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) {
        debug!("Sending SIGTERM to {} (pid {})", program, pid);
        // SAFETY: plain syscall on our own unreaped child.
        if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
            return;
        }
        warn!(
            "SIGTERM to {} failed: {}",
            program,
            std::io::Error::last_os_error()
        );
    }
    let _ = child.start_kill();
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child, _program: &str) {
    let _ = child.start_kill();
}

fn spawn_pump<R>(reader: R, label: StreamLabel, log: Arc<ProcessLog>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    log.line(label, line.trim_end_matches(['\n', '\r']));
                }
                Err(e) => {
                    log.note(&format!("Error reading {}: {}", label.as_str(), e));
                    break;
                }
            }
        }
    })
}

impl SupervisedProcess {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// True as soon as the process is reaped, which can be before its output
    /// is drained and [`wait`](Self::wait) returns.
    pub fn has_exited(&self) -> bool {
        self.reaped.load(Ordering::Acquire)
    }

    /// Ask the process to stop. SIGTERM on unix, a hard kill elsewhere.
    /// Does nothing once the process has exited.
    pub fn terminate(&self) {
        if !self.has_exited() {
            let _ = self.control.send(Control::Terminate);
        }
    }

    /// Kill the process without waiting for it to clean up.
    pub fn kill(&self) {
        if !self.has_exited() {
            let _ = self.control.send(Control::Kill);
        }
    }

    /// Wait until the process exited and the log footer is written.
    ///
    /// Returns `None` if the watcher was torn down before it could report.
    pub async fn wait(&self) -> Option<ExitRecord> {
        let mut exit = self.exit.clone();
        let record = exit.wait_for(Option::is_some).await.ok()?.clone();
        record
    }

    /// Terminate, wait up to `grace`, then kill and wait again.
    pub async fn terminate_and_wait(&self, grace: Duration) -> Option<ExitRecord> {
        self.terminate();
        match tokio::time::timeout(grace, self.wait()).await {
            Ok(record) => record,
            Err(_) => {
                warn!(
                    "{} still running {:?} after terminate, killing",
                    self.program, grace
                );
                self.kill();
                self.wait().await
            }
        }
    }
}
