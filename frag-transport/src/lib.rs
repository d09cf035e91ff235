//! Channels that move encoded fragments as discrete units.

use bytes::Bytes;

mod stream;
mod udp;
pub use stream::*;
pub use udp::*;

/// A channel carrying discrete, loss-tolerant units of bytes.
///
/// One unit holds exactly one encoded fragment. Implementations own all
/// blocking I/O; the protocol core never suspends. Delivery may drop or
/// reorder units freely — the reassembler copes — but a delivered unit must
/// arrive whole.
#[async_trait::async_trait]
pub trait Transport: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one unit.
    async fn send(&mut self, unit: Bytes) -> Result<(), Self::Error>;

    /// Receives the next unit.
    async fn recv(&mut self) -> Result<Bytes, Self::Error>;
}
