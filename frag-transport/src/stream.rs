use std::io;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use frag_wire::stream::{Error, FrameCodec};

use crate::Transport;

/// Adapter for byte-stream channels (TCP connections, serial lines, tunnel
/// devices).
///
/// A byte stream preserves no unit boundaries, so every fragment travels
/// behind the length prefix of [`FrameCodec`]; the receiver recovers whole
/// fragments before they reach the reassembler.
#[derive(Debug)]
pub struct FramedStream<S> {
    inner: Framed<S, FrameCodec>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FramedStream<S> {
    pub fn new(io: S) -> Self {
        Self::with_codec(io, FrameCodec::new())
    }

    /// Wraps `io` with a specific codec configuration.
    pub fn with_codec(io: S, codec: FrameCodec) -> Self {
        Self { inner: Framed::new(io, codec) }
    }

    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

#[async_trait::async_trait]
impl<S> Transport for FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    type Error = Error;

    async fn send(&mut self, unit: Bytes) -> Result<(), Error> {
        self.inner.send(unit).await
    }

    async fn recv(&mut self) -> Result<Bytes, Error> {
        match self.inner.next().await {
            Some(frame) => frame,
            None => Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frag_assembly::split::{split, SplitOptions};

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(256);
        let mut left = FramedStream::new(client);
        let mut right = FramedStream::new(server);

        let options = SplitOptions::default().max_fragment_payload(32);
        let fragments = split(&[5u8; 100], 1, &options).unwrap();
        let sent = fragments.len();
        for fragment in fragments.clone() {
            left.send(fragment).await.unwrap();
        }

        for expected in fragments.iter().take(sent) {
            let unit = right.recv().await.unwrap();
            assert_eq!(&unit, expected);
        }
    }

    #[tokio::test]
    async fn recv_reports_eof() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);

        let mut right = FramedStream::new(server);
        let err = right.recv().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
