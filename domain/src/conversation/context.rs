//! The conversation transcript.
//!
//! [`Context`] owns the ordered message list sent with every generation
//! request. When a system prompt is configured it lives at index 0 for the
//! whole lifetime of the context: reset keeps it, rebuild rewrites it in
//! place, slicing always puts it first. A `system` message appended later is
//! just another message at the end.
//!
//! Messages are immutable once appended, with two exceptions: the system
//! prompt (rebuilt from the template) and the assistant reply that is being
//! streamed right now (see [`begin_reply`](Context::begin_reply)).

use super::entities::{Message, Role};
use super::template::{PromptReplacements, SystemPromptTemplate};
use crate::core::error::DomainError;

/// Ordered conversation transcript plus its system-prompt template.
#[derive(Debug, Clone)]
pub struct Context {
    template: SystemPromptTemplate,
    messages: Vec<Message>,
    /// Index of the assistant message currently being streamed into.
    open_reply: Option<usize>,
}

impl Context {
    /// Create a context, rendering the system prompt when the template is
    /// non-empty.
    pub fn new(template: impl Into<SystemPromptTemplate>, replacements: &PromptReplacements) -> Self {
        let template = template.into();
        let mut messages = Vec::new();
        if !template.is_empty() {
            messages.push(Message::system(template.render(replacements)));
        }
        Self {
            template,
            messages,
            open_reply: None,
        }
    }

    /// A context without a system prompt.
    pub fn empty() -> Self {
        Self::new(SystemPromptTemplate::default(), &PromptReplacements::new())
    }

    pub fn template(&self) -> &SystemPromptTemplate {
        &self.template
    }

    pub fn has_system_prompt(&self) -> bool {
        !self.template.is_empty() && self.messages.first().is_some_and(Message::is_system)
    }

    pub fn system_message(&self) -> Option<&Message> {
        if self.has_system_prompt() {
            self.messages.first()
        } else {
            None
        }
    }

    // ==================== Mutation ====================

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.close_reply();
        self.messages.push(Message::new(role, content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.append(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.append(Role::Assistant, content);
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.append(Role::System, content);
    }

    /// Open an empty assistant message that streamed fragments are folded
    /// into.
    pub fn begin_reply(&mut self) {
        self.close_reply();
        self.messages.push(Message::assistant(String::new()));
        self.open_reply = Some(self.messages.len() - 1);
    }

    /// Append a fragment to the open reply. Returns `false` when no reply is
    /// open, in which case nothing changes.
    pub fn extend_reply(&mut self, fragment: &str) -> bool {
        match self.open_reply.and_then(|idx| self.messages.get_mut(idx)) {
            Some(message) => {
                message.content.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Close the open reply and return its final text. A reply that never
    /// received any text is removed from the transcript.
    pub fn finish_reply(&mut self) -> Option<String> {
        let idx = self.open_reply.take()?;
        if self.messages.get(idx).is_some_and(|m| m.content.is_empty()) {
            self.messages.remove(idx);
            return None;
        }
        self.messages.get(idx).map(|m| m.content.clone())
    }

    pub fn is_replying(&self) -> bool {
        self.open_reply.is_some()
    }

    fn close_reply(&mut self) {
        let _ = self.finish_reply();
    }

    /// Drop every message except the system prompt.
    pub fn reset_to_system_prompt(&mut self) {
        self.open_reply = None;
        let keep = usize::from(self.has_system_prompt());
        self.messages.truncate(keep);
    }

    /// Re-render the template and overwrite message 0 in place.
    ///
    /// Returns `false` (and changes nothing) unless message 0 exists and is
    /// the configured system prompt.
    pub fn rebuild_system_prompt(&mut self, replacements: &PromptReplacements) -> bool {
        if !self.has_system_prompt() {
            return false;
        }
        let rendered = self.template.render(replacements);
        if let Some(system) = self.messages.first_mut() {
            system.content = rendered;
        }
        true
    }

    /// Replace the transcript with `slice(start, end)`.
    pub fn retain_range(&mut self, start: usize, end: usize) {
        self.open_reply = None;
        self.messages = self.slice(start, end);
    }

    // ==================== Queries ====================

    /// Flat copy of the system prompt (if any) followed by `[start, end)`.
    ///
    /// With a system prompt, `start` is clamped to 1 so the range can never
    /// include it twice. Bounds past the end clamp to the length; an empty
    /// range yields only the system prompt.
    pub fn slice(&self, start: usize, end: usize) -> Vec<Message> {
        let has_system = self.has_system_prompt();
        let start = if has_system { start.max(1) } else { start };
        let end = end.min(self.messages.len());

        let mut out = Vec::with_capacity(end.saturating_sub(start) + 1);
        if has_system {
            out.push(self.messages[0].clone());
        }
        if start < end {
            out.extend_from_slice(&self.messages[start..end]);
        }
        out
    }

    /// Messages in conversational order, as sent to the generation backend.
    pub fn prompt(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages, system prompt included.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages that are not the system prompt.
    pub fn conversation_len(&self) -> usize {
        self.messages.len() - usize::from(self.has_system_prompt())
    }
}

/// Message-count based compaction.
///
/// When the transcript grows past `max_messages`, only the system prompt and
/// the `keep_recent` most recent messages survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    max_messages: usize,
    keep_recent: usize,
}

impl CompactionPolicy {
    pub fn new(max_messages: usize, keep_recent: usize) -> Result<Self, DomainError> {
        if keep_recent >= max_messages {
            return Err(DomainError::InvalidCompaction {
                max_messages,
                keep_recent,
            });
        }
        Ok(Self {
            max_messages,
            keep_recent,
        })
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn keep_recent(&self) -> usize {
        self.keep_recent
    }

    /// Compact `context` if needed, returning how many messages were dropped.
    pub fn apply(&self, context: &mut Context) -> usize {
        let len = context.len();
        if len <= self.max_messages {
            return 0;
        }
        context.retain_range(len - self.keep_recent, len);
        len - context.len()
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_messages: 64,
            keep_recent: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::template::{DATE_TOKEN, TIME_TOKEN};

    fn replacements(date: &str) -> PromptReplacements {
        PromptReplacements::new()
            .with(DATE_TOKEN, date)
            .with(TIME_TOKEN, "10:00 AM")
    }

    fn context_with_prompt() -> Context {
        Context::new("It is <date>, <time>.", &replacements("2026-01-01"))
    }

    #[test]
    fn test_new_renders_system_prompt() {
        let ctx = context_with_prompt();
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get(0), Some(&Message::system("It is 2026-01-01, 10:00 AM.")));
        assert!(ctx.has_system_prompt());
    }

    #[test]
    fn test_empty_template_has_no_system_message() {
        let ctx = Context::new("", &replacements("2026-01-01"));
        assert!(ctx.is_empty());
        assert!(ctx.system_message().is_none());
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut ctx = context_with_prompt();
        ctx.push_user("one");
        ctx.push_assistant("two");
        ctx.push_system("three");
        let roles: Vec<Role> = ctx.prompt().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::System]);
        assert_eq!(ctx.last().unwrap().content, "three");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut ctx = context_with_prompt();
        let original = ctx.get(0).cloned();
        ctx.reset_to_system_prompt();
        for i in 0..5 {
            ctx.push_user(format!("message {i}"));
        }
        ctx.reset_to_system_prompt();
        ctx.reset_to_system_prompt();
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get(0).cloned(), original);
    }

    #[test]
    fn test_reset_without_system_prompt_empties() {
        let mut ctx = Context::empty();
        ctx.push_system("appended, not the prompt");
        ctx.push_user("hi");
        ctx.reset_to_system_prompt();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_rebuild_overwrites_in_place() {
        let mut ctx = context_with_prompt();
        ctx.push_user("hello");
        assert!(ctx.rebuild_system_prompt(&replacements("2026-10-18")));
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get(0).unwrap().content, "It is 2026-10-18, 10:00 AM.");
        assert_eq!(ctx.get(1).unwrap().content, "hello");
    }

    #[test]
    fn test_rebuild_without_system_prompt_is_noop() {
        let mut ctx = Context::empty();
        ctx.push_system("not the template");
        assert!(!ctx.rebuild_system_prompt(&replacements("2026-10-18")));
        assert_eq!(ctx.get(0).unwrap().content, "not the template");
    }

    #[test]
    fn test_slice_always_starts_with_system_prompt() {
        let mut ctx = context_with_prompt();
        for i in 1..=5 {
            ctx.push_user(format!("m{i}"));
        }
        let sliced = ctx.slice(0, 3);
        let contents: Vec<&str> = sliced.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["It is 2026-01-01, 10:00 AM.", "m1", "m2"]);

        let tail = ctx.slice(4, 100);
        assert_eq!(tail.len(), 3);
        assert!(tail[0].is_system());
        assert_eq!(tail[2].content, "m5");
    }

    #[test]
    fn test_slice_empty_range_yields_system_only() {
        let mut ctx = context_with_prompt();
        ctx.push_user("m1");
        assert_eq!(ctx.slice(3, 2).len(), 1);
        assert_eq!(ctx.slice(10, 20).len(), 1);
    }

    #[test]
    fn test_slice_without_system_prompt_is_plain_range() {
        let mut ctx = Context::empty();
        ctx.push_user("a");
        ctx.push_user("b");
        ctx.push_user("c");
        let sliced = ctx.slice(0, 2);
        assert_eq!(sliced, vec![Message::user("a"), Message::user("b")]);
    }

    #[test]
    fn test_streamed_reply_accumulates_fragments() {
        let mut ctx = context_with_prompt();
        ctx.push_user("hi");
        ctx.begin_reply();
        assert!(ctx.extend_reply("Hi"));
        assert!(ctx.extend_reply(" there"));
        assert_eq!(ctx.finish_reply().as_deref(), Some("Hi there"));
        assert!(!ctx.extend_reply("late"));
        assert_eq!(ctx.last(), Some(&Message::assistant("Hi there")));
    }

    #[test]
    fn test_empty_reply_is_removed() {
        let mut ctx = context_with_prompt();
        ctx.begin_reply();
        assert_eq!(ctx.finish_reply(), None);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_append_closes_open_reply() {
        let mut ctx = Context::empty();
        ctx.begin_reply();
        ctx.extend_reply("partial");
        ctx.push_user("interrupt");
        assert!(!ctx.is_replying());
        assert!(!ctx.extend_reply("more"));
        assert_eq!(ctx.get(0).unwrap().content, "partial");
    }

    #[test]
    fn test_system_prompt_invariant_after_mixed_operations() {
        let mut ctx = context_with_prompt();
        ctx.push_user("a");
        ctx.reset_to_system_prompt();
        ctx.push_system("late system");
        ctx.rebuild_system_prompt(&replacements("2027-01-01"));
        ctx.push_assistant("b");
        ctx.retain_range(1, 2);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.get(0).unwrap().is_system());
        assert_eq!(ctx.get(0).unwrap().content, "It is 2027-01-01, 10:00 AM.");
        assert_eq!(ctx.get(1).unwrap().content, "late system");
    }

    #[test]
    fn test_compaction_keeps_system_and_recent() {
        let policy = CompactionPolicy::new(4, 2).unwrap();
        let mut ctx = context_with_prompt();
        for i in 1..=5 {
            ctx.push_user(format!("m{i}"));
        }
        let dropped = policy.apply(&mut ctx);
        assert_eq!(dropped, 3);
        let contents: Vec<&str> = ctx.prompt().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["It is 2026-01-01, 10:00 AM.", "m4", "m5"]);
    }

    #[test]
    fn test_compaction_under_budget_is_noop() {
        let policy = CompactionPolicy::new(4, 2).unwrap();
        let mut ctx = context_with_prompt();
        ctx.push_user("m1");
        assert_eq!(policy.apply(&mut ctx), 0);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_compaction_policy_validation() {
        assert!(CompactionPolicy::new(4, 4).is_err());
        assert!(CompactionPolicy::new(4, 3).is_ok());
    }
}
