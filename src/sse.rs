//! SSE line decoding for the DeepInfra token stream.
//!
//! The inference API streams newline-delimited SSE frames. Only `data:`
//! payload lines matter here; everything else (blank lines, comments,
//! other fields) is discarded. The `data: [DONE]` sentinel marks the end of
//! the data without being an error: it is consumed and skipped so the
//! connection drains normally and closes with the transport. Breaking out
//! of the read loop on the sentinel can reset the connection on some
//! transport stacks.

use std::io::BufRead;

use serde::Deserialize;

use crate::error::LlmError;
use crate::types::TokenChunk;

/// Outcome of decoding one raw transport line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataLine {
    /// A genuine data payload, prefix stripped.
    Payload(String),
    /// The `[DONE]` sentinel: end of data, not an error.
    Done,
    /// Empty line, comment, or any non-data frame.
    Skip,
}

/// Decode one raw line. Both `data: ` and `data:` prefixes are accepted;
/// emitters disagree on the space.
pub(crate) fn decode_line(line: &str) -> DataLine {
    let Some(rest) = line.strip_prefix("data:") else {
        return DataLine::Skip;
    };
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    if rest.trim() == "[DONE]" {
        DataLine::Done
    } else {
        DataLine::Payload(rest.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    token: Option<TokenEvent>,
}

#[derive(Debug, Deserialize)]
struct TokenEvent {
    #[serde(default)]
    text: Option<String>,
}

/// Interpret one decoded data line as a token chunk.
///
/// Tolerant of a missing `token` object or `text` field (the chunk simply
/// has no text). Malformed JSON yields `None`: one bad line must not abort
/// the stream.
pub(crate) fn interpret_data_line(data: &str) -> Option<TokenChunk> {
    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(TokenChunk {
            text: event.token.and_then(|t| t.text),
        }),
        Err(e) => {
            tracing::trace!(error = %e, "skipping undecodable stream line");
            None
        }
    }
}

/// Lazily decodes data payload lines from a blocking SSE byte source.
///
/// Forward-only, single pass; iteration ends when the transport closes the
/// stream. The `[DONE]` sentinel is skipped, not treated as a terminator.
pub(crate) struct SseLineReader<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> SseLineReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for SseLineReader<R> {
    type Item = Result<String, LlmError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => match decode_line(self.line.trim_end_matches(['\r', '\n'])) {
                    DataLine::Payload(payload) => return Some(Ok(payload)),
                    DataLine::Done | DataLine::Skip => continue,
                },
                Err(e) => {
                    return Some(Err(LlmError::HttpError(format!(
                        "failed to read SSE line: {e}"
                    ))));
                }
            }
        }
    }
}
