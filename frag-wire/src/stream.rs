//! Length-prefixed framing for byte-stream channels.
//!
//! Datagram transports hand the receiver one fragment per unit. A byte
//! stream (TCP, a serial line, a tunnel device) preserves no boundaries, and
//! the fragment header carries no total length, so every encoded fragment
//! travels behind a big-endian `u32` length prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use frag_common::constants::MiB;

use crate::fragment::HEADER_LEN;

/// Default upper bound for one frame (header plus payload).
pub const DEFAULT_MAX_FRAME_SIZE: usize = MiB;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("frame of {got} bytes exceeds the {max} byte limit")]
    FrameTooLarge { got: usize, max: usize },
    #[error("frame of {0} bytes is shorter than the fragment header")]
    FrameTooShort(usize),
}

#[derive(Debug, Default, Clone, Copy)]
enum State {
    #[default]
    Length,
    Body(usize),
}

/// Frames encoded fragments over a byte stream.
#[derive(Debug)]
pub struct FrameCodec {
    /// The current state of the decoder.
    state: State,
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Creates a codec that rejects frames larger than `max_frame_size`.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { state: State::Length, max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::Length => {
                    if src.len() < 4 {
                        return Ok(None);
                    }

                    let len = src.get_u32() as usize;
                    if len < HEADER_LEN {
                        return Err(Error::FrameTooShort(len));
                    }
                    if len > self.max_frame_size {
                        return Err(Error::FrameTooLarge { got: len, max: self.max_frame_size });
                    }

                    self.state = State::Body(len);
                }
                State::Body(len) => {
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }

                    let frame = src.split_to(len).freeze();
                    tracing::trace!(len, "decoded frame");

                    self.state = State::Length;
                    return Ok(Some(frame));
                }
            }
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() < HEADER_LEN {
            return Err(Error::FrameTooShort(item.len()));
        }
        if item.len() > self.max_frame_size {
            return Err(Error::FrameTooLarge { got: item.len(), max: self.max_frame_size });
        }

        dst.reserve(4 + item.len());
        dst.put_u32(item.len() as u32);
        dst.put(item);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Crc32;
    use crate::fragment::Fragment;

    fn encoded_fragment(payload: &'static [u8]) -> Bytes {
        Fragment::new(1, 0, 1, Bytes::from_static(payload), &Crc32)
            .encode()
            .unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let mut codec = FrameCodec::new();
        let frame = encoded_fragment(b"hello");

        let mut buf = BytesMut::new();
        codec.encode(frame.clone(), &mut buf).unwrap();
        assert_eq!(buf.len(), 4 + frame.len());

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_full_frame() {
        let mut codec = FrameCodec::new();
        let frame = encoded_fragment(b"partial delivery");

        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).unwrap();

        // Feed one byte at a time; the codec must not yield early.
        let mut buf = BytesMut::new();
        let mut out = None;
        for byte in wire {
            buf.put_u8(byte);
            if let Some(frame) = codec.decode(&mut buf).unwrap() {
                out = Some(frame);
            }
        }
        assert_eq!(out.unwrap(), frame);
    }

    #[test]
    fn decode_yields_back_to_back_frames() {
        let mut codec = FrameCodec::new();
        let first = encoded_fragment(b"first");
        let second = encoded_fragment(b"second!");

        let mut buf = BytesMut::new();
        codec.encode(first.clone(), &mut buf).unwrap();
        codec.encode(second.clone(), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), first);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), second);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decode_rejects_oversized_frame() {
        let mut codec = FrameCodec::with_max_frame_size(16);
        let mut buf = BytesMut::new();
        buf.put_u32(17);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { got: 17, max: 16 }));
    }

    #[test]
    fn decode_rejects_undersized_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32((HEADER_LEN - 1) as u32);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::FrameTooShort(9)));
    }

    #[test]
    fn encode_rejects_short_input() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        let err = codec.encode(Bytes::from_static(b"tiny"), &mut buf).unwrap_err();
        assert!(matches!(err, Error::FrameTooShort(4)));
    }
}
