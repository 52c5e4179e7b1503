//! Exit-code bookkeeping for the log footer.

use std::fmt;
use std::process::ExitStatus;

/// Label derived from an exit code: `NONE` for a normal exit, `SIG<N>` for a
/// negative code `-N`, `UNKNOWN` when no code is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    None,
    Signal(i32),
    Unknown,
}

impl TerminationSignal {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            None => TerminationSignal::Unknown,
            Some(code) if code >= 0 => TerminationSignal::None,
            Some(code) => TerminationSignal::Signal(-code),
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::None => f.write_str("NONE"),
            TerminationSignal::Signal(n) => write!(f, "SIG{n}"),
            TerminationSignal::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Exit code of a finished process. A process killed by signal `N` on unix
/// reports `-N`.
pub fn exit_code(status: &ExitStatus) -> Option<i32> {
    if let Some(code) = status.code() {
        return Some(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(-signal);
        }
    }
    None
}

/// Local host name, as reported in the log footer.
pub fn hostname() -> String {
    #[cfg(unix)]
    {
        let mut buf = [0u8; 256];
        // SAFETY: buf is valid for buf.len() bytes and gethostname writes at
        // most that many.
        let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
        if rc == 0 {
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            let name = String::from_utf8_lossy(&buf[..end]).into_owned();
            if !name.is_empty() {
                return name;
            }
        }
    }
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
