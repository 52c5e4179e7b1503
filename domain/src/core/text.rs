//! Text helpers for log-friendly previews.

/// Collapse a message into a single line of at most `max_bytes` bytes.
///
/// Newlines become spaces and the cut never splits a UTF-8 character.
/// An ellipsis is appended when anything was dropped.
pub fn preview(s: &str, max_bytes: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.len() <= max_bytes {
        return flat;
    }
    let mut end = max_bytes;
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &flat[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_text_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn preview_flattens_newlines() {
        assert_eq!(preview("a\nb\r\nc", 20), "a b  c");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        // 'の' is 3 bytes; cutting at 4 must back up to 3
        assert_eq!(preview("あのね", 4), "あ...");
        assert_eq!(preview("hello world", 5), "hello...");
    }
}
