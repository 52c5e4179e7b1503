//! Streaming chat-completion decoder.
//!
//! llama-server answers a streaming request with newline-separated frames:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hi"}}]}
//! data: {"choices":[{"delta":{"content":" there"}}]}
//! data: [DONE]
//! ```
//!
//! Blank lines and lines that are not JSON (keep-alives, partial frames) are
//! skipped without ending the stream. `[DONE]`, with or without the `data:`
//! prefix, ends it.

use futures::{Stream, StreamExt};
use orca_application::ports::backend::{BackendError, FragmentStream};
use serde_json::Value;
use std::fmt::Display;

/// Meaning of one response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    /// Text from `choices[0].delta.content` (empty when absent).
    Fragment(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Blank or undecodable; ignored.
    Skip,
}

/// Classify a single line (without its trailing newline).
pub fn decode_line(line: &[u8]) -> StreamLine {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return StreamLine::Skip;
    }

    let payload = trimmed
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    if payload == "[DONE]" {
        return StreamLine::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(chunk) => StreamLine::Fragment(
            chunk
                .pointer("/choices/0/delta/content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        Err(_) => StreamLine::Skip,
    }
}

struct LineState<S> {
    bytes: S,
    buffer: Vec<u8>,
    eof: bool,
    finished: bool,
}

/// Turn a chunked byte stream into a lazy stream of text fragments.
///
/// Chunk boundaries may fall anywhere, including inside a line. A read error
/// is yielded once as [`BackendError::Transport`] and ends the stream.
pub fn fragment_stream<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = LineState {
        bytes,
        buffer: Vec::with_capacity(8192),
        eof: false,
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            if let Some(newline) = state.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=newline).collect();
                match decode_line(&line) {
                    StreamLine::Fragment(text) => return Some((Ok(text), state)),
                    StreamLine::Done => return None,
                    StreamLine::Skip => continue,
                }
            }

            if state.eof {
                // Trailing line without a newline.
                state.finished = true;
                let rest = std::mem::take(&mut state.buffer);
                return match decode_line(&rest) {
                    StreamLine::Fragment(text) => Some((Ok(text), state)),
                    StreamLine::Done | StreamLine::Skip => None,
                };
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(BackendError::Transport(e.to_string())), state));
                }
                None => state.eof = true,
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, String>> + Send + Unpin + 'static {
        let owned: Vec<Result<Vec<u8>, String>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    async fn collect(parts: &[&str]) -> Vec<Result<String, BackendError>> {
        fragment_stream(chunks(parts)).collect().await
    }

    fn texts(items: Vec<Result<String, BackendError>>) -> Vec<String> {
        items.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_decode_line_variants() {
        assert_eq!(
            decode_line(br#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#),
            StreamLine::Fragment("Hi".to_string())
        );
        assert_eq!(
            decode_line(br#"{"choices":[{"delta":{"content":"bare"}}]}"#),
            StreamLine::Fragment("bare".to_string())
        );
        assert_eq!(decode_line(b"data: [DONE]"), StreamLine::Done);
        assert_eq!(decode_line(b"[DONE]"), StreamLine::Done);
        assert_eq!(decode_line(b""), StreamLine::Skip);
        assert_eq!(decode_line(b"   \r"), StreamLine::Skip);
        assert_eq!(decode_line(b"data: not-json"), StreamLine::Skip);
    }

    #[test]
    fn test_missing_content_defaults_to_empty() {
        assert_eq!(
            decode_line(br#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            StreamLine::Fragment(String::new())
        );
        assert_eq!(decode_line(br#"data: {}"#), StreamLine::Fragment(String::new()));
    }

    #[tokio::test]
    async fn test_fragments_until_done() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n",
            "[DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
        ])
        .await;
        assert_eq!(texts(items), vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: not-json\n",
            "\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
            "data: [DONE]\n",
        ])
        .await;
        assert_eq!(texts(items), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let items = collect(&[
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"split\"}}]}\r\nda",
            "ta: [DONE]\n",
        ])
        .await;
        assert_eq!(texts(items), vec!["split"]);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let items = collect(&["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]).await;
        assert_eq!(texts(items), vec!["tail"]);
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let parts: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"y\"}}]}\n".to_vec()),
        ];
        let items: Vec<_> = fragment_stream(stream::iter(parts)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "x");
        assert!(items[1].as_ref().unwrap_err().is_transport());
    }
}
