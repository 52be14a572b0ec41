//! Ordered per-stream line ingestion.
//!
//! This module provides:
//! - [`LossyLinesCodec`] — Newline framing with best-effort UTF-8 decoding
//! - [`LineReader`] — Wraps any [`AsyncRead`] source and stamps each line
//!   into a [`RawLine`] with a strictly increasing sequence number
//!
//! A single bad line never aborts a stream: undecodable byte sequences are
//! replaced with U+FFFD, and a line longer than the configured bound is
//! truncated at the bound (the overflow up to the next newline is dropped).

use bytes::{Buf, BytesMut};
use chrono::Utc;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};

use crate::error::Result;
use crate::types::{RawLine, StreamId};

/// Default maximum length of a single physical line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 256 * 1024;

/// Newline-delimited framing with best-effort UTF-8 decoding.
///
/// Splits on `\n` and strips one trailing `\r`. Invalid UTF-8 is replaced
/// with the substitution character instead of erroring, so a corrupt chunk
/// costs at most its own line.
#[derive(Debug)]
pub struct LossyLinesCodec {
    max_line_length: usize,
    /// Scan resume point within the buffer, so repeated decodes stay linear.
    next_index: usize,
    /// Set after truncating an oversized line; input is dropped until the
    /// next newline.
    discarding: bool,
}

impl LossyLinesCodec {
    /// Creates a codec with the given maximum line length in bytes.
    #[must_use]
    pub const fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Returns the configured maximum line length.
    #[must_use]
    pub const fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn decode_slice(bytes: &[u8]) -> String {
        let without_cr = match bytes.last() {
            Some(b'\r') => &bytes[..bytes.len() - 1],
            _ => bytes,
        };
        String::from_utf8_lossy(without_cr).into_owned()
    }
}

impl Default for LossyLinesCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for LossyLinesCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> std::io::Result<Option<String>> {
        loop {
            if self.discarding {
                // Drop the tail of a line that was already truncated.
                match buf.iter().position(|b| *b == b'\n') {
                    Some(offset) => {
                        buf.advance(offset + 1);
                        self.discarding = false;
                        self.next_index = 0;
                    }
                    None => {
                        buf.clear();
                        return Ok(None);
                    }
                }
                continue;
            }

            let newline = buf[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match newline {
                Some(pos) => {
                    let line = buf.split_to(pos + 1);
                    self.next_index = 0;
                    return Ok(Some(Self::decode_slice(&line[..line.len() - 1])));
                }
                None if buf.len() > self.max_line_length => {
                    let head = buf.split_to(self.max_line_length);
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(Some(Self::decode_slice(&head)));
                }
                None => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> std::io::Result<Option<String>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if buf.is_empty() || self.discarding {
            buf.clear();
            return Ok(None);
        }
        // Final line without a trailing newline.
        let rest = buf.split_to(buf.len());
        self.next_index = 0;
        Ok(Some(Self::decode_slice(&rest)))
    }
}

/// Reads one source stream as an ordered sequence of [`RawLine`]s.
///
/// Lines are numbered from 1 and never reordered. Several readers (one per
/// source) may interleave arbitrarily with each other; each preserves its
/// own stream's order.
#[derive(Debug)]
pub struct LineReader<R> {
    stream: StreamId,
    frames: FramedRead<R, LossyLinesCodec>,
    next_sequence: u64,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Creates a reader with the default codec.
    #[must_use]
    pub fn new(stream: StreamId, source: R) -> Self {
        Self::with_max_line_length(stream, source, DEFAULT_MAX_LINE_LENGTH)
    }

    /// Creates a reader with a custom maximum line length.
    #[must_use]
    pub fn with_max_line_length(stream: StreamId, source: R, max_line_length: usize) -> Self {
        Self {
            stream,
            frames: FramedRead::new(source, LossyLinesCodec::new(max_line_length)),
            next_sequence: 1,
        }
    }

    /// Returns the stream this reader serves.
    #[must_use]
    pub const fn stream(&self) -> &StreamId {
        &self.stream
    }

    /// Reads the next line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport-level I/O failures; decode
    /// problems are absorbed by the codec.
    pub async fn next_line(&mut self) -> Result<Option<RawLine>> {
        match self.frames.next().await {
            Some(Ok(text)) => {
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                Ok(Some(RawLine {
                    stream: self.stream.clone(),
                    sequence,
                    received_at: Utc::now(),
                    text,
                }))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}
