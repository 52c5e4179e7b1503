//! Console rendering of streamed replies

use colored::Colorize;
use orca_application::ReplyNotifier;
use orca_domain::EventKind;
use std::io::{Stdout, Write};
use std::sync::Mutex;

/// Prints assistant replies to a terminal as they stream in.
pub struct ConsoleReplyNotifier<W: Write + Send = Stdout> {
    assistant: String,
    out: Mutex<W>,
}

impl ConsoleReplyNotifier<Stdout> {
    pub fn stdout(assistant: impl Into<String>) -> Self {
        Self::new(assistant, std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReplyNotifier<W> {
    pub fn new(assistant: impl Into<String>, out: W) -> Self {
        Self {
            assistant: assistant.into(),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl<W: Write + Send> ReplyNotifier for ConsoleReplyNotifier<W> {
    fn on_reply_start(&self, trigger: EventKind) {
        let prefix = format!("{}:", self.assistant).cyan().bold();
        match trigger {
            EventKind::SpontaneousGeneration => {
                self.write(&format!("\n{} {} ", prefix, "(unprompted)".dimmed()))
            }
            _ => self.write(&format!("{} ", prefix)),
        }
    }

    fn on_fragment(&self, fragment: &str) {
        self.write(fragment);
    }

    fn on_reply_complete(&self, _text: &str) {
        self.write("\n");
    }

    fn on_reply_failed(&self, error: &str) {
        self.write(&format!("\n{} {}\n", "Reply failed:".red().bold(), error));
    }
}

/// Static console text
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn welcome(assistant: &str) -> String {
        let line = "=".repeat(60);
        format!(
            "{}\n{:^60}\n{}\n\n{}",
            line.cyan(),
            format!("{} - Console", assistant).bold(),
            line.cyan(),
            Self::help()
        )
    }

    pub fn help() -> String {
        [
            "Commands:",
            "  /inject <role> <text>     - Add a message without asking for a reply",
            "  /function <name> <output> - Report a function result",
            "  /rebuild                  - Refresh the system prompt and compact",
            "  /help, /h, /?             - Show this help",
            "  /quit, /exit, /q          - Stop orca",
            "",
        ]
        .join("\n")
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
