//! Line decoding with a persistent partial-line buffer.
//!
//! TCP hands us byte chunks, not lines. A command can arrive split across
//! two reads (`"PRIVMSG #osu :he"` + `"llo\r\n"`), or several commands can
//! arrive in one read. [`LineDecoder`] owns a buffer that survives between
//! reads: each chunk is appended, complete lines are extracted, and any
//! trailing fragment waits for the next chunk.
//!
//! Both `\n` and `\r\n` terminate a line; the terminator is stripped. Blank
//! lines are skipped silently.

use bytes::BytesMut;
use memchr::memchr;

use crate::DecodeError;

/// Default upper bound for a single line, terminator excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 8 * 1024;

/// Reassembles lines from arbitrary byte chunks.
///
/// ```rust
/// use chatgate_protocol::LineDecoder;
///
/// let mut decoder = LineDecoder::new();
/// decoder.extend(b"JOIN #o");
/// assert!(decoder.next_line().is_none());
///
/// decoder.extend(b"su\r\nPING x\r\n");
/// assert_eq!(decoder.next_line(), Some(Ok("JOIN #osu".to_string())));
/// assert_eq!(decoder.next_line(), Some(Ok("PING x".to_string())));
/// assert!(decoder.next_line().is_none());
/// ```
#[derive(Debug)]
pub struct LineDecoder {
    buf: BytesMut,
    max_line_len: usize,
    /// Set after an oversized fragment was dropped: everything up to the
    /// next terminator belongs to that same line and is dropped too.
    discarding: bool,
}

impl LineDecoder {
    /// Creates a decoder with the default line limit.
    pub fn new() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Creates a decoder that rejects lines longer than `max` bytes.
    pub fn with_max_line_len(max: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            max_line_len: max.max(1),
            discarding: false,
        }
    }

    /// Appends one read's worth of bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extracts the next complete, non-blank line.
    ///
    /// Returns:
    /// - `Some(Ok(line))` for a decoded line,
    /// - `Some(Err(_))` for a line that must be skipped (bad UTF-8, too long),
    /// - `None` when only an incomplete fragment (or nothing) is buffered.
    pub fn next_line(&mut self) -> Option<Result<String, DecodeError>> {
        loop {
            let Some(i) = memchr(b'\n', &self.buf) else {
                if !self.discarding && self.buf.len() > self.max_line_len {
                    self.buf.clear();
                    self.discarding = true;
                    return Some(Err(DecodeError::LineTooLong {
                        max: self.max_line_len,
                    }));
                }
                if self.discarding {
                    self.buf.clear();
                }
                return None;
            };

            let raw = self.buf.split_to(i + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }

            let line = trim_crlf(&raw);
            if line.len() > self.max_line_len {
                return Some(Err(DecodeError::LineTooLong {
                    max: self.max_line_len,
                }));
            }

            match std::str::from_utf8(line) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => return Some(Ok(text.to_string())),
                Err(_) => {
                    return Some(Err(DecodeError::InvalidUtf8 {
                        len: line.len(),
                    }));
                }
            }
        }
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_crlf(raw: &[u8]) -> &[u8] {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    &raw[..end]
}
