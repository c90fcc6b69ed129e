//! Server-sent event line framing.
//!
//! Network chunks do not respect line boundaries, and a multi-byte UTF-8
//! character may straddle two chunks, so bytes are buffered until a full
//! line is available and only then decoded.

use crate::constants::{KEEP_ALIVE_PAYLOAD, SSE_DATA_PREFIX, SSE_DONE};

/// Splits a byte stream into complete lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every line it completed, without terminators.
    ///
    /// Only the new bytes are scanned, and consumed lines leave the buffer
    /// in a single drain.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let scan_from = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for (offset, _) in chunk.iter().enumerate().filter(|(_, &b)| b == b'\n') {
            let end = scan_from + offset;
            let mut line = &self.buf[start..end];
            if let [rest @ .., b'\r'] = line {
                line = rest;
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        if start > 0 {
            self.buf.drain(..start);
        }
        lines
    }

    /// Returns the unterminated remainder once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&line).trim_end_matches('\r').to_string())
    }
}

/// Classification of one event-stream line.
#[derive(Debug, PartialEq, Eq)]
pub enum SseRecord<'a> {
    /// Empty line (event separator).
    Blank,
    /// Provider heartbeat, sent as a comment or as a data record.
    KeepAlive,
    /// End of the current response.
    Done,
    /// A data payload, with the field prefix and one leading space removed.
    Data(&'a str),
    /// Comments and fields other than `data` (`event:`, `id:`, `retry:`).
    Ignored,
}

impl<'a> SseRecord<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return SseRecord::Blank;
        }
        if let Some(comment) = line.strip_prefix(':') {
            return if comment.trim() == KEEP_ALIVE_PAYLOAD {
                SseRecord::KeepAlive
            } else {
                SseRecord::Ignored
            };
        }
        let Some(payload) = line.strip_prefix(SSE_DATA_PREFIX) else {
            return SseRecord::Ignored;
        };
        let payload = payload.strip_prefix(' ').unwrap_or(payload);
        match payload.trim() {
            SSE_DONE => SseRecord::Done,
            KEEP_ALIVE_PAYLOAD => SseRecord::KeepAlive,
            _ => SseRecord::Data(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_reassembled_across_chunks() {
        let mut dec = LineDecoder::new();
        assert!(dec.push(b"data: {\"a\"").is_empty());
        assert_eq!(dec.push(b":1}\r\n\ndata: x"), vec!["data: {\"a\":1}", ""]);
        assert_eq!(dec.finish().as_deref(), Some("data: x"));
        assert_eq!(dec.finish(), None);
    }

    #[test]
    fn test_many_lines_in_one_chunk_and_long_line_across_chunks() {
        let mut dec = LineDecoder::new();
        let body: String = (0..1000).map(|i| format!("data: {}\n", i)).collect();
        let lines = dec.push(body.as_bytes());
        assert_eq!(lines.len(), 1000);
        assert_eq!(lines[999], "data: 999");
        assert_eq!(dec.finish(), None);

        let long = "x".repeat(64 * 1024);
        for piece in long.as_bytes().chunks(1000) {
            assert!(dec.push(piece).is_empty());
        }
        assert_eq!(dec.push(b"\r\n"), vec![long]);
    }

    #[test]
    fn test_split_utf8_character_survives() {
        let bytes = "data: caf\u{e9}\n".as_bytes();
        let mut dec = LineDecoder::new();
        let (head, tail) = bytes.split_at(bytes.len() - 2);
        assert!(dec.push(head).is_empty());
        assert_eq!(dec.push(tail), vec!["data: caf\u{e9}"]);
    }

    #[test]
    fn test_record_classification() {
        assert_eq!(SseRecord::parse(""), SseRecord::Blank);
        assert_eq!(SseRecord::parse("   "), SseRecord::Blank);
        assert_eq!(SseRecord::parse("data: [DONE]"), SseRecord::Done);
        assert_eq!(SseRecord::parse(": OPENROUTER PROCESSING"), SseRecord::KeepAlive);
        assert_eq!(SseRecord::parse("data: OPENROUTER PROCESSING"), SseRecord::KeepAlive);
        assert_eq!(SseRecord::parse(": some comment"), SseRecord::Ignored);
        assert_eq!(SseRecord::parse("event: message"), SseRecord::Ignored);
        assert_eq!(SseRecord::parse("data: {\"x\":1}"), SseRecord::Data("{\"x\":1}"));
        assert_eq!(SseRecord::parse("data:{}"), SseRecord::Data("{}"));
    }
}
