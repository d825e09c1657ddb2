//! Token framing
//!
//! Splits the raw byte stream into `\n`-terminated tokens. A trailing `\r`
//! is stripped, bytes that are not UTF-8 are replaced rather than rejected
//! (the slot decoder reports them as malformed), and a line longer than the
//! limit is discarded up to its terminator.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::{Command, ProtocolError, MAX_TOKEN_LEN};

/// Newline-delimited token codec
#[derive(Debug, Clone)]
pub struct TokenCodec {
    max_length: usize,
    /// Index already scanned for a terminator
    next_index: usize,
    /// Skipping the remainder of an over-long line
    discarding: bool,
}

impl TokenCodec {
    /// Codec with the protocol's token limit
    pub fn new() -> Self {
        Self::with_max_length(MAX_TOKEN_LEN)
    }

    /// Codec with a custom token limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for TokenCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let newline = buf[self.next_index..].iter().position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                (true, None) => {
                    buf.advance(buf.len());
                    self.next_index = 0;
                    return Ok(None);
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    let line = &line[..end];
                    let line = line.strip_suffix(b"\r").unwrap_or(line);
                    if line.len() > self.max_length {
                        return Err(ProtocolError::TokenTooLong {
                            max: self.max_length,
                        });
                    }
                    return Ok(Some(String::from_utf8_lossy(line).into_owned()));
                }
                // one byte of slack for a trailing `\r`
                (false, None) if buf.len() > self.max_length + 1 => {
                    self.next_index = buf.len();
                    self.discarding = true;
                    return Err(ProtocolError::TokenTooLong {
                        max: self.max_length,
                    });
                }
                (false, None) => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }
}

impl Encoder<Command> for TokenCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = item.to_wire();
        dst.reserve(line.len());
        dst.put_slice(line.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(codec: &mut TokenCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(Some(token)) = codec.decode(buf) {
            out.push(token);
        }
        out
    }

    #[test]
    fn test_splits_and_strips_carriage_return() {
        let mut codec = TokenCodec::new();
        let mut buf = BytesMut::from(&b"begd\r\n0123\n\nendd\n"[..]);
        assert_eq!(drain(&mut codec, &mut buf), vec!["begd", "0123", "", "endd"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_token_waits_for_terminator() {
        let mut codec = TokenCodec::new();
        let mut buf = BytesMut::from(&b"01"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"23\nb1");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("0123"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"c\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("b1c"));
    }

    #[test]
    fn test_complete_overlong_line_is_rejected() {
        let mut codec = TokenCodec::with_max_length(8);
        let mut buf = BytesMut::from(&b"0123456789abcdef\nendd\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::TokenTooLong { max: 8 })
        ));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("endd"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut codec = TokenCodec::with_max_length(4);
        let mut buf = BytesMut::from(&b"0123\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("0123"));
    }

    #[test]
    fn test_overlong_line_is_discarded() {
        let mut codec = TokenCodec::with_max_length(8);
        let mut buf = BytesMut::from(&b"0123456789ab"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::TokenTooLong { max: 8 })
        ));
        buf.extend_from_slice(b"cdef\nendd\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("endd"));
    }

    #[test]
    fn test_encode_command() {
        let mut codec = TokenCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(Command::DataRequest, &mut dst).unwrap();
        codec.encode(Command::Ping1, &mut dst).unwrap();
        assert_eq!(&dst[..], b"dreq\nb1\n");
    }
}
