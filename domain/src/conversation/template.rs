//! System prompt templating.
//!
//! Templates are plain strings with placeholder tokens such as `<date>` or
//! `<time>`. Rendering is a literal find-and-replace of every token, in the
//! order the replacements were inserted, against the raw template. Nothing is
//! cached: each render starts again from the raw text.

use serde::{Deserialize, Serialize};

/// Placeholder for the current date (`%Y-%m-%d`).
pub const DATE_TOKEN: &str = "<date>";

/// Placeholder for the current wall-clock time (`%I:%M %p`).
pub const TIME_TOKEN: &str = "<time>";

/// Ordered placeholder → value map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptReplacements {
    entries: Vec<(String, String)>,
}

impl PromptReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `token` to `value`, keeping the original position when the token
    /// is already present.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PromptReplacements {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut replacements = Self::new();
        for (k, v) in iter {
            replacements.insert(k, v);
        }
        replacements
    }
}

/// Raw system prompt text with placeholder tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemPromptTemplate(String);

impl SystemPromptTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    /// An empty template means no system prompt was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn render(&self, replacements: &PromptReplacements) -> String {
        let mut prompt = self.0.clone();
        for (token, value) in replacements.iter() {
            if !token.is_empty() {
                prompt = prompt.replace(token, value);
            }
        }
        prompt
    }
}

impl From<&str> for SystemPromptTemplate {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SystemPromptTemplate {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        let template = SystemPromptTemplate::new("Today is <date>. Again: <date> at <time>.");
        let replacements = PromptReplacements::new()
            .with(DATE_TOKEN, "2026-10-18")
            .with(TIME_TOKEN, "09:15 AM");
        assert_eq!(
            template.render(&replacements),
            "Today is 2026-10-18. Again: 2026-10-18 at 09:15 AM."
        );
    }

    #[test]
    fn test_render_leaves_unknown_tokens() {
        let template = SystemPromptTemplate::new("You are <name>.");
        assert_eq!(template.render(&PromptReplacements::new()), "You are <name>.");
    }

    #[test]
    fn test_render_is_not_cached() {
        let template = SystemPromptTemplate::new("<time>");
        let first = template.render(&PromptReplacements::new().with(TIME_TOKEN, "01:00 PM"));
        let second = template.render(&PromptReplacements::new().with(TIME_TOKEN, "02:00 PM"));
        assert_eq!(first, "01:00 PM");
        assert_eq!(second, "02:00 PM");
    }

    #[test]
    fn test_replacements_apply_in_insertion_order() {
        // The second replacement sees the output of the first.
        let template = SystemPromptTemplate::new("<a>");
        let replacements = PromptReplacements::new().with("<a>", "<b>").with("<b>", "done");
        assert_eq!(template.render(&replacements), "done");
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut replacements: PromptReplacements =
            [("<a>", "1"), ("<b>", "2")].into_iter().collect();
        replacements.insert("<a>", "3");
        let pairs: Vec<_> = replacements.iter().collect();
        assert_eq!(pairs, vec![("<a>", "3"), ("<b>", "2")]);
        assert_eq!(replacements.get("<b>"), Some("2"));
    }
}
