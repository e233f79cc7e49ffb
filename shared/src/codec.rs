//! Newline-delimited framing for [`Frame`]s over a byte stream
//!
//! TCP gives no message boundaries, so each frame is terminated with `\n`.
//! The decoder keeps partial input buffered until the terminator arrives and
//! yields one line per call, which covers both a frame split across reads and
//! several frames coalesced into one read. A trailing `\r` is tolerated.

use crate::protocol::Frame;
use bytes::{BufMut, BytesMut};
use std::io;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

pub const MAX_FRAME_LEN: usize = 1024;

const DELIMITER: u8 = b'\n';

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("frame exceeds {max} bytes")]
    FrameTooLong { max: usize },
    #[error("frame is not valid utf-8")]
    InvalidUtf8,
    #[error("frame contains an embedded line break")]
    EmbeddedDelimiter,
}

/// Splits the stream into text lines on decode and writes [`Frame`]s on encode
///
/// Decoding stops at the line level; turning a line into a [`Frame`] is left to
/// the caller so one malformed frame does not tear down the stream.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_len: usize,
    // bytes already scanned for a delimiter
    next_index: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_len(MAX_FRAME_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len,
            next_index: 0,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, CodecError> {
        let newline = buf[self.next_index..]
            .iter()
            .position(|b| *b == DELIMITER)
            .map(|offset| self.next_index + offset);

        match newline {
            Some(index) => {
                self.next_index = 0;
                if index > self.max_len {
                    return Err(CodecError::FrameTooLong { max: self.max_len });
                }

                let chunk = buf.split_to(index + 1);
                let mut line = &chunk[..index];
                if let Some(stripped) = line.strip_suffix(b"\r") {
                    line = stripped;
                }

                std::str::from_utf8(line)
                    .map(|text| Some(text.to_string()))
                    .map_err(|_| CodecError::InvalidUtf8)
            }
            None => {
                if buf.len() > self.max_len {
                    return Err(CodecError::FrameTooLong { max: self.max_len });
                }
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, CodecError> {
        match self.decode(buf)? {
            Some(line) => Ok(Some(line)),
            // an unterminated tail at EOF is dropped
            None => {
                buf.clear();
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: Frame, buf: &mut BytesMut) -> Result<(), CodecError> {
        let text = frame.to_string();
        if text.bytes().any(|b| b == DELIMITER || b == b'\r') {
            return Err(CodecError::EmbeddedDelimiter);
        }
        if text.len() > self.max_len {
            return Err(CodecError::FrameTooLong { max: self.max_len });
        }

        buf.reserve(text.len() + 1);
        buf.put_slice(text.as_bytes());
        buf.put_u8(DELIMITER);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Move, Symbol};
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn test_decode_reassembles_split_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"MOVE:0,"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"1,X\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("MOVE:0,1,X".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_splits_coalesced_frames() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"X\nSTATE:         \nDRAW\r\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("X".to_string()));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("STATE:         ".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("DRAW".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let mut codec = FrameCodec::with_max_len(8);
        let mut buf = BytesMut::from(&b"CHAT:too long"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::FrameTooLong { max: 8 })
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0xff, 0xfe, b'\n'][..]);
        assert!(matches!(codec.decode(&mut buf), Err(CodecError::InvalidUtf8)));
    }

    #[test]
    fn test_decode_eof_drops_partial_tail() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"RESET\nMOV"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("RESET".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_appends_delimiter() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Frame::Move(Move::new(2, 1, Symbol::O)), &mut buf)
            .unwrap();
        codec.encode(Frame::State(Board::new()), &mut buf).unwrap();

        assert_eq!(&buf[..], b"MOVE:2,1,O\nSTATE:         \n");
    }

    #[test]
    fn test_encode_rejects_embedded_newline() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        let result = codec.encode(Frame::Chat("two\nlines".to_string()), &mut buf);
        assert!(matches!(result, Err(CodecError::EmbeddedDelimiter)));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_framed_read_over_chunked_stream() {
        let stream = tokio_test::io::Builder::new()
            .read(b"O\nSTA")
            .read(b"TE:X  ")
            .read(b"      \nCHAT:hi\n")
            .build();
        let mut frames = FramedRead::new(stream, FrameCodec::new());

        assert_eq!(frames.next().await.unwrap().unwrap(), "O");
        assert_eq!(frames.next().await.unwrap().unwrap(), "STATE:X        ");
        assert_eq!(frames.next().await.unwrap().unwrap(), "CHAT:hi");
        assert!(frames.next().await.is_none());
    }
}
