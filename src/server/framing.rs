//! Cutting received bytes into messages

use crate::config::MessageBoundary;
use bytes::BytesMut;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};
use tracing::warn;

/// Longest line kept by default in `Lines` mode
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Accumulates received bytes and yields messages per the boundary policy
#[derive(Debug)]
pub struct MessageFramer {
    boundary: MessageBoundary,
    buffer: BytesMut,
    codec: AnyDelimiterCodec,
    max_line_length: usize,
}

fn strip_terminator(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn line_codec(max_line_length: usize) -> AnyDelimiterCodec {
    AnyDelimiterCodec::new_with_max_length(vec![b'\n'], vec![b'\n'], max_line_length)
}

impl MessageFramer {
    /// Create a framer with an initial buffer capacity
    pub fn new(boundary: MessageBoundary, capacity: usize) -> Self {
        Self {
            boundary,
            buffer: BytesMut::with_capacity(capacity),
            codec: line_codec(DEFAULT_MAX_LINE_LENGTH),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Discard lines longer than `max` bytes instead of buffering them
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.codec = line_codec(max);
        self.max_line_length = max;
        self
    }

    /// Append bytes from one receive call
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Bytes held back, waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Messages completed by the end of a drain cycle
    pub fn end_of_cycle(&mut self) -> Vec<String> {
        match self.boundary {
            MessageBoundary::DrainCycle => self.take_all(),
            MessageBoundary::Lines => self.take_lines(false),
        }
    }

    /// Whatever is left once the peer is gone
    pub fn finish(&mut self) -> Vec<String> {
        match self.boundary {
            MessageBoundary::DrainCycle => self.take_all(),
            MessageBoundary::Lines => self.take_lines(true),
        }
    }

    fn take_all(&mut self) -> Vec<String> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let chunk = self.buffer.split();
        vec![decode(strip_terminator(&chunk))]
    }

    fn take_lines(&mut self, eof: bool) -> Vec<String> {
        let mut messages = Vec::new();
        loop {
            let frame = if eof {
                self.codec.decode_eof(&mut self.buffer)
            } else {
                self.codec.decode(&mut self.buffer)
            };

            match frame {
                Ok(Some(line)) => {
                    let body = strip_terminator(&line);
                    if !body.is_empty() {
                        messages.push(decode(body));
                    }
                }
                Ok(None) => break,
                // The codec skips to the next terminator on the following call.
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    warn!(max = self.max_line_length, "Discarding overlong line");
                }
                Err(e) => {
                    warn!(error = %e, "Line framing failed");
                    break;
                }
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_lines_splits_coalesced_records() {
        let mut framer = MessageFramer::new(MessageBoundary::Lines, 64);
        framer.extend(b"[a] [INFO] one\n[b] [ERROR] two\r\n");

        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] one", "[b] [ERROR] two"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_lines_keeps_partial_line_across_cycles() {
        let mut framer = MessageFramer::new(MessageBoundary::Lines, 64);
        framer.extend(b"[a] [INFO] fir");
        assert!(framer.end_of_cycle().is_empty());
        assert_eq!(framer.pending(), 14);

        framer.extend(b"st\n[b] [DEBUG] sec");
        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] first"]);

        assert_eq!(framer.finish(), vec!["[b] [DEBUG] sec"]);
        assert!(framer.finish().is_empty());
    }

    #[test]
    fn test_lines_skips_empty_lines() {
        let mut framer = MessageFramer::new(MessageBoundary::Lines, 64);
        framer.extend(b"\n\r\n[a] [INFO] x\n\n");
        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] x"]);
    }

    #[test]
    fn test_drain_cycle_yields_one_message_per_cycle() {
        let mut framer = MessageFramer::new(MessageBoundary::DrainCycle, 64);
        framer.extend(b"[a] [INFO] one\n");
        framer.extend(b"[b] [ERROR] two\n");

        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] one\n[b] [ERROR] two"]);
        assert!(framer.end_of_cycle().is_empty());
    }

    #[test]
    #[traced_test]
    fn test_overlong_line_is_discarded() {
        let mut framer = MessageFramer::new(MessageBoundary::Lines, 64).with_max_line_length(16);
        framer.extend(&[b'x'; 40]);

        assert!(framer.end_of_cycle().is_empty());
        assert_eq!(framer.pending(), 0);
        assert!(logs_contain("Discarding overlong line"));

        framer.extend(b"tail\n[a] [INFO] ok\n");
        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] ok"]);
    }

    #[test]
    fn test_overlong_line_in_one_chunk_keeps_neighbours() {
        let mut framer = MessageFramer::new(MessageBoundary::Lines, 64).with_max_line_length(16);
        framer.extend(b"[a] [INFO] one\n");
        framer.extend(&[b'y'; 20]);
        framer.extend(b"\n[b] [INFO] two\n");

        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] one", "[b] [INFO] two"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut framer = MessageFramer::new(MessageBoundary::Lines, 64);
        framer.extend(b"[a] [INFO] \xff\n");
        assert_eq!(framer.end_of_cycle(), vec!["[a] [INFO] \u{fffd}"]);
    }
}
