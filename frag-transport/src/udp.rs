use std::{io, net::SocketAddr};

use bytes::{Bytes, BytesMut};
use tokio::net::{ToSocketAddrs, UdpSocket};

use frag_common::constants::MAX_DATAGRAM_SIZE;

use crate::Transport;

/// Connected UDP transport. Datagram sockets preserve unit boundaries, so
/// one datagram carries one fragment with no extra framing.
#[derive(Debug)]
pub struct Udp {
    socket: UdpSocket,
    recv_buf: BytesMut,
    max_datagram_size: usize,
}

impl Udp {
    /// Binds a socket to `addr`. Connect it before sending.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            recv_buf: BytesMut::new(),
            max_datagram_size: MAX_DATAGRAM_SIZE,
        })
    }

    /// Connects to the remote peer; `send` and `recv` then use the connected
    /// address only.
    pub async fn connect(&self, addr: impl ToSocketAddrs) -> io::Result<()> {
        self.socket.connect(addr).await
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Caps the receive buffer. Datagrams larger than this are truncated by
    /// the OS; keep it above `max_fragment_payload` plus header.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size;
        self
    }
}

#[async_trait::async_trait]
impl Transport for Udp {
    type Error = io::Error;

    async fn send(&mut self, unit: Bytes) -> io::Result<()> {
        self.socket.send(&unit).await.map(drop)
    }

    async fn recv(&mut self) -> io::Result<Bytes> {
        self.recv_buf.resize(self.max_datagram_size, 0);
        let n = self.socket.recv(&mut self.recv_buf).await?;
        Ok(self.recv_buf.split_to(n).freeze())
    }
}
