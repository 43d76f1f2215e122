//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! The streaming endpoint (`streamGenerateContent?alt=sse`) sends one
//! `data: {json}` event per response piece. Events are separated by a blank
//! line, with either `\n` or `\r\n` line endings.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::GenerateContentResponse;
use crate::{Error, Result};

/// The error envelope the API uses both for HTTP errors and in-stream errors.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) code: Option<u16>,
    pub(crate) message: Option<String>,
    pub(crate) status: Option<String>,
}

impl ErrorEnvelope {
    pub(crate) fn into_error(self, fallback_status: u16) -> Error {
        Error::api(
            self.error.code.unwrap_or(fallback_status),
            self.error.status,
            self.error
                .message
                .unwrap_or_else(|| "unknown error".to_string()),
        )
    }
}

/// Process a stream of bytes into a stream of response pieces.
///
/// Bytes are buffered until a complete event is available, so multi-byte
/// characters split across network reads decode correctly.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, Vec::<u8>::new(), false),
        move |(mut stream, mut buffer, mut done)| async move {
            loop {
                if let Some(raw) = extract_event(&mut buffer) {
                    if let Some(event) = parse_event(&raw) {
                        return Some((event, (stream, buffer, done)));
                    }
                    continue;
                }
                if done {
                    if buffer.is_empty() {
                        return None;
                    }
                    let raw = std::mem::take(&mut buffer);
                    if let Some(event) = parse_event(&raw) {
                        return Some((event, (stream, buffer, done)));
                    }
                    return None;
                }
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, done)));
                    }
                    None => done = true,
                }
            }
        },
    )
}

/// Removes the first complete event from the buffer, without its delimiter.
fn extract_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let (end, delimiter) = find_boundary(buffer)?;
    let mut event: Vec<u8> = buffer.drain(..end + delimiter).collect();
    event.truncate(end);
    Some(event)
}

fn find_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n");
    let crlf = find(buffer, b"\r\n\r\n");
    match (lf, crlf) {
        (Some(lf), Some(crlf)) if crlf < lf => Some((crlf, 4)),
        (Some(lf), _) => Some((lf, 2)),
        (None, Some(crlf)) => Some((crlf, 4)),
        (None, None) => None,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parses one event. Returns `None` for events carrying no data, such as
/// keep-alive comments.
fn parse_event(raw: &[u8]) -> Option<Result<GenerateContentResponse>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            STREAM_ERRORS.click();
            return Some(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    STREAM_EVENTS.click();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
        STREAM_ERRORS.click();
        return Some(Err(envelope.into_error(500)));
    }
    Some(
        serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
            STREAM_ERRORS.click();
            Error::serialization(
                format!("Malformed SSE event: {e} in '{data}'"),
                Some(Box::new(e)),
            )
        }),
    )
}
