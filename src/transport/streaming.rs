//! Streaming response handling and event-stream decoding.
//!
//! OpenRouter streams completions as newline-delimited `data:` lines. The
//! transport delivers bytes in arbitrary chunks, so decoding happens in
//! three stages: [`LineBuffer`] reassembles complete lines across chunk
//! boundaries, [`StreamEvent`] classifies each line, and
//! [`CompletionStream`] exposes the resulting text fragments as a pull-based
//! stream.

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll};

use super::TransportError;
use crate::errors::OpenRouterError;
use crate::types::chat::ChatChunk;

/// Prefix of a data-carrying line.
const DATA_PREFIX: &str = "data:";

/// Literal line marking end-of-stream.
const DONE_SENTINEL: &str = "data: [DONE]";

/// Streaming HTTP response.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Byte stream.
    pub stream: Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>,
}

/// Accumulates raw bytes and splits them into complete lines.
///
/// The trailing incomplete segment is retained between calls, which makes
/// line framing independent of how the transport happens to chunk the byte
/// stream. Operating on bytes rather than text also keeps a UTF-8 code
/// point split across two reads intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns all complete lines.
    ///
    /// Line terminators are stripped. The last segment (everything after
    /// the final newline, possibly empty) stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // trailing '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }

        lines
    }

    /// Takes the buffered trailing segment, if any.
    ///
    /// Called once at end of transport data so a final unterminated line is
    /// not lost.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let remainder = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&remainder).into_owned())
    }

    /// Returns true if no partial line is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Semantic event extracted from one complete line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental piece of generated text.
    Content(String),
    /// The end-of-stream sentinel; no further lines are processed.
    Done,
    /// A line carrying no fragment: blank, keep-alive, comment, a payload
    /// without content, or a payload that failed to decode.
    Skip,
}

impl StreamEvent {
    /// Classifies a complete line.
    pub fn from_line(line: &str) -> Self {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return StreamEvent::Skip;
        }

        if trimmed == DONE_SENTINEL {
            return StreamEvent::Done;
        }

        if let Some(rest) = trimmed.strip_prefix(DATA_PREFIX) {
            let payload = rest.trim();
            if payload.is_empty() {
                return StreamEvent::Skip;
            }
            return decode_delta(payload);
        }

        // Comments, keep-alives, and other SSE fields are not errors.
        StreamEvent::Skip
    }
}

/// Decodes a data line's payload into a content fragment.
///
/// A payload without content (role-only or empty delta) is a normal
/// occurrence and is skipped silently. A payload that is not valid JSON is
/// logged and skipped; it never terminates the stream.
fn decode_delta(payload: &str) -> StreamEvent {
    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => match chunk.delta_content() {
            Some(content) if !content.is_empty() => StreamEvent::Content(content.to_string()),
            _ => StreamEvent::Skip,
        },
        Err(e) => {
            tracing::debug!(error = %e, payload = %payload, "Failed to decode stream payload");
            StreamEvent::Skip
        }
    }
}

pin_project! {
    /// Completion text stream.
    ///
    /// Wraps a transport byte stream and yields decoded text fragments in
    /// arrival order. The stream ends after the `[DONE]` sentinel, at end
    /// of transport data, or with a terminal error if the transport read
    /// fails. Dropping the stream releases the underlying connection.
    pub struct CompletionStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>,
        lines: LineBuffer,
        pending: VecDeque<String>,
        done: bool,
    }
}

impl CompletionStream {
    /// Creates a completion stream from a streaming response.
    pub fn new(response: StreamingResponse) -> Self {
        Self::from_byte_stream(response.stream)
    }

    /// Creates a completion stream directly from a byte stream.
    pub fn from_byte_stream(
        stream: Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>,
    ) -> Self {
        Self {
            inner: stream,
            lines: LineBuffer::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Collects all fragments into a single string.
    pub async fn collect_text(self) -> Result<String, OpenRouterError> {
        use futures::TryStreamExt;

        let fragments: Vec<String> = self.try_collect().await?;
        Ok(fragments.concat())
    }

    fn process_lines(
        lines: &mut LineBuffer,
        pending: &mut VecDeque<String>,
        done: &mut bool,
        chunk: &[u8],
    ) {
        for line in lines.push(chunk) {
            match StreamEvent::from_line(&line) {
                StreamEvent::Content(text) => pending.push_back(text),
                StreamEvent::Done => {
                    // Fragments decoded before the sentinel still drain;
                    // lines after it are never processed.
                    *done = true;
                    return;
                }
                StreamEvent::Skip => {}
            }
        }
    }
}

impl Stream for CompletionStream {
    type Item = Result<String, OpenRouterError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Deliver queued fragments before touching the transport again.
            if let Some(fragment) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(fragment)));
            }

            if *this.done {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    Self::process_lines(this.lines, this.pending, this.done, &chunk);
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(OpenRouterError::stream(e.to_string()))));
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    if let Some(line) = this.lines.take_remainder() {
                        if let StreamEvent::Content(text) = StreamEvent::from_line(&line) {
                            this.pending.push_back(text);
                        }
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl std::fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStream")
            .field("pending", &self.pending.len())
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    fn byte_stream(
        chunks: Vec<Result<&'static [u8], TransportError>>,
    ) -> Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>> {
        Box::pin(futures::stream::iter(
            chunks
                .into_iter()
                .map(|r| r.map(Bytes::from_static))
                .collect::<Vec<_>>(),
        ))
    }

    async fn fragments_from(chunks: Vec<&'static [u8]>) -> Vec<String> {
        let stream = CompletionStream::from_byte_stream(byte_stream(
            chunks.into_iter().map(Ok).collect(),
        ));
        stream.map(|r| r.unwrap()).collect().await
    }

    const SCENARIO: &str = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
        "data: [DONE]\n",
    );

    #[test]
    fn test_line_buffer_splits_complete_lines() {
        let mut buffer = LineBuffer::new();

        let lines = buffer.push(b"first\nsecond\npartial");

        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
        assert!(!buffer.is_empty());

        let lines = buffer.push(b" line\n");
        assert_eq!(lines, vec!["partial line".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_line_buffer_strips_crlf() {
        let mut buffer = LineBuffer::new();

        let lines = buffer.push(b"data: one\r\ndata: two\n");

        assert_eq!(lines, vec!["data: one".to_string(), "data: two".to_string()]);
    }

    #[test]
    fn test_line_buffer_chunk_boundary_independence() {
        let input = b"data: {\"a\":1}\ndata: {\"b\":2}\n\ndata: [DONE]\n";

        let mut whole = LineBuffer::new();
        let expected = whole.push(input);

        // One byte at a time.
        let mut byte_wise = LineBuffer::new();
        let mut lines = Vec::new();
        for byte in input {
            lines.extend(byte_wise.push(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, expected);

        // Split in the middle of a payload.
        let mut split = LineBuffer::new();
        let mut lines = split.push(&input[..20]);
        lines.extend(split.push(&input[20..]));
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_line_buffer_preserves_split_utf8() {
        let input = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n".as_bytes();
        // Split inside the two-byte 'é'.
        let split_at = input.iter().position(|&b| b == 0xc3).unwrap() + 1;

        let mut buffer = LineBuffer::new();
        let mut lines = buffer.push(&input[..split_at]);
        lines.extend(buffer.push(&input[split_at..]));

        assert_eq!(lines.len(), 1);
        assert_eq!(StreamEvent::from_line(&lines[0]), StreamEvent::Content("héllo".to_string()));
    }

    #[test]
    fn test_line_buffer_take_remainder() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"no newline yet");

        assert_eq!(buffer.take_remainder(), Some("no newline yet".to_string()));
        assert_eq!(buffer.take_remainder(), None);
    }

    #[test]
    fn test_classify_empty_line() {
        assert_eq!(StreamEvent::from_line(""), StreamEvent::Skip);
        assert_eq!(StreamEvent::from_line("   "), StreamEvent::Skip);
    }

    #[test]
    fn test_classify_done_sentinel() {
        assert_eq!(StreamEvent::from_line("data: [DONE]"), StreamEvent::Done);
        assert_eq!(StreamEvent::from_line("  data: [DONE]  "), StreamEvent::Done);
    }

    #[test]
    fn test_classify_content_line() {
        let event =
            StreamEvent::from_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#);
        assert_eq!(event, StreamEvent::Content("Hi".to_string()));
    }

    #[test]
    fn test_classify_skips_unrecognized_lines() {
        // Keep-alive comments and other SSE fields must not be errors.
        assert_eq!(StreamEvent::from_line(": keep-alive"), StreamEvent::Skip);
        assert_eq!(StreamEvent::from_line("event: message"), StreamEvent::Skip);
        assert_eq!(StreamEvent::from_line("id: 42"), StreamEvent::Skip);
    }

    #[test]
    fn test_classify_skips_empty_payload() {
        assert_eq!(StreamEvent::from_line("data:"), StreamEvent::Skip);
        assert_eq!(StreamEvent::from_line("data:   "), StreamEvent::Skip);
    }

    #[test]
    fn test_decode_skips_role_only_delta() {
        let event =
            StreamEvent::from_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert_eq!(event, StreamEvent::Skip);
    }

    #[test]
    fn test_decode_skips_empty_choices() {
        assert_eq!(
            StreamEvent::from_line(r#"data: {"choices":[]}"#),
            StreamEvent::Skip
        );
    }

    #[test]
    fn test_decode_skips_malformed_payload() {
        assert_eq!(
            StreamEvent::from_line("data: {not json"),
            StreamEvent::Skip
        );
    }

    #[tokio::test]
    async fn test_stream_basic_scenario() {
        let fragments = fragments_from(vec![SCENARIO.as_bytes()]).await;
        assert_eq!(fragments, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_chunk_boundary_independence() {
        let single = fragments_from(vec![SCENARIO.as_bytes()]).await;

        let mut stream = CompletionStream::from_byte_stream(Box::pin(futures::stream::iter(
            SCENARIO
                .as_bytes()
                .iter()
                .map(|&b| Ok(Bytes::copy_from_slice(&[b])))
                .collect::<Vec<Result<Bytes, TransportError>>>(),
        )));

        let mut byte_wise = Vec::new();
        while let Some(fragment) = stream.next().await {
            byte_wise.push(fragment.unwrap());
        }

        assert_eq!(byte_wise, single);
        assert_eq!(byte_wise, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_sentinel_stops_processing() {
        let fragments = fragments_from(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"before\"}}]}\n",
            b"data: [DONE]\ndata: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}\n",
        ])
        .await;

        assert_eq!(fragments, vec!["before".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_sentinel_mid_chunk_delivers_earlier_fragments() {
        // All three lines arrive in a single read; both fragments must
        // still come out before the stream closes.
        let fragments = fragments_from(vec![SCENARIO.as_bytes()]).await;
        assert_eq!(fragments.len(), 2);
    }

    #[tokio::test]
    async fn test_stream_malformed_line_does_not_terminate() {
        let fragments = fragments_from(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
            b"data: {broken\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"still ok\"}}]}\ndata: [DONE]\n",
        ])
        .await;

        assert_eq!(fragments, vec!["ok".to_string(), "still ok".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_transport_error_is_terminal() {
        let mut stream = CompletionStream::from_byte_stream(byte_stream(vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n"),
            Err(TransportError::Connection {
                message: "connection reset".to_string(),
            }),
        ]));

        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");

        let error = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(error, OpenRouterError::Stream { .. }));

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_ends_without_sentinel() {
        // Transport end-of-data closes the stream; a final unterminated
        // line is still decoded.
        let fragments = fragments_from(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}" as &[u8],
        ])
        .await;

        assert_eq!(fragments, vec!["tail".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_order_preserved() {
        let body = (0..10)
            .map(|i| format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\n", i))
            .collect::<String>();
        let body: &'static str = Box::leak(body.into_boxed_str());

        let fragments = fragments_from(vec![body.as_bytes()]).await;
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(fragments, expected);
    }

    #[tokio::test]
    async fn test_collect_text() {
        let stream = CompletionStream::from_byte_stream(byte_stream(vec![Ok(
            SCENARIO.as_bytes(),
        )]));

        assert_eq!(stream.collect_text().await.unwrap(), "Hello");
    }
}
