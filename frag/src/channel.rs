//! Glue between the splitter, a reassembler and a transport.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use frag_assembly::reassemble::Reassembler;
use frag_assembly::split::{self, split};
use frag_assembly::stats::AssemblyStats;
use frag_assembly::{ReassemblerOptions, SplitOptions};
use frag_transport::Transport;
use frag_wire::checksum::Checksum32;
use frag_wire::compression::{compressor_for, decompressor_for, CompressionType};
use frag_wire::fragment::HEADER_LEN;

#[derive(Debug, Error)]
pub enum ChannelError<E: std::error::Error> {
    #[error("split failed: {0}")]
    Split(#[from] split::Error),
    #[error("transport error: {0}")]
    Transport(#[source] E),
}

/// Configuration surface of a [`Channel`]: fragment size, compression,
/// checksum function and reassembly capacity bounds.
#[derive(Clone, Default)]
pub struct ChannelOptions {
    split: SplitOptions,
    reassembler: ReassemblerOptions,
}

impl ChannelOptions {
    /// Sets the maximum payload carried by one fragment. Bound this by the
    /// channel MTU minus the fragment header overhead.
    pub fn max_fragment_payload(mut self, size: usize) -> Self {
        self.split = self.split.max_fragment_payload(size);
        self
    }

    /// Enables whole-message compression on both directions. Both ends of a
    /// channel must agree on the algorithm: the wire carries no compression
    /// tag.
    pub fn with_compression(mut self, kind: CompressionType) -> Self {
        if let Some(compressor) = compressor_for(kind) {
            self.split = self.split.with_shared_compressor(compressor);
        }
        if let Some(decompressor) = decompressor_for(kind) {
            self.reassembler = self.reassembler.with_shared_decompressor(decompressor);
        }
        self
    }

    /// Replaces the default CRC-32 digest on both directions.
    pub fn with_checksum<H: Checksum32 + 'static>(mut self, checksum: H) -> Self {
        let checksum: Arc<dyn Checksum32> = Arc::new(checksum);
        self.split = self.split.with_shared_checksum(Arc::clone(&checksum));
        self.reassembler = self.reassembler.with_shared_checksum(checksum);
        self
    }

    /// Caps the number of simultaneously in-progress inbound messages.
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.reassembler = self.reassembler.max_pending(max_pending);
        self
    }

    /// Evicts in-progress inbound entries older than `ttl`.
    pub fn pending_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.reassembler = self.reassembler.pending_ttl(ttl);
        self
    }
}

/// A bidirectional message channel over a fragment transport.
///
/// Outbound messages are split under an internally incremented sequence
/// number; inbound units feed a reassembler until a message completes. The
/// sequence counter wraps at `u16::MAX` with no protection against overlap
/// with messages still in flight — keep fewer than 65536 in the air.
pub struct Channel<T: Transport> {
    transport: T,
    split_options: SplitOptions,
    reassembler: Mutex<Reassembler>,
    next_seq: u16,
}

impl<T: Transport> Channel<T> {
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, ChannelOptions::default())
    }

    pub fn with_options(transport: T, options: ChannelOptions) -> Self {
        Self {
            transport,
            split_options: options.split,
            reassembler: Mutex::new(Reassembler::new(options.reassembler)),
            next_seq: 0,
        }
    }

    /// Splits `data` and sends every fragment in order. Returns the sequence
    /// number assigned to the message.
    pub async fn send(&mut self, data: &[u8]) -> Result<u16, ChannelError<T::Error>> {
        let seq_no = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let fragments = split(data, seq_no, &self.split_options)?;
        debug!(seq_no, fragments = fragments.len(), "sending message");
        for fragment in fragments {
            self.transport.send(fragment).await.map_err(ChannelError::Transport)?;
        }

        Ok(seq_no)
    }

    /// Receives units until a message completes, returning it with its
    /// sequence number. Completed messages are delivered FIFO by completion
    /// time. Fragment-level errors are logged and skipped; only transport
    /// failures abort.
    pub async fn recv(&mut self) -> Result<(u16, Bytes), ChannelError<T::Error>> {
        loop {
            let unit = self.transport.recv().await.map_err(ChannelError::Transport)?;
            if unit.len() < HEADER_LEN {
                warn!(len = unit.len(), "dropping short unit");
                continue;
            }

            let payload_len = unit.len() - HEADER_LEN;
            let mut reassembler = self.reassembler.lock();
            match reassembler.add(unit, payload_len) {
                Ok(Some(_)) => {
                    if let Some(completed) = reassembler.next_completed() {
                        return Ok(completed);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(%err, "dropping fragment"),
            }
        }
    }

    /// Number of inbound messages still missing fragments.
    pub fn pending_count(&self) -> usize {
        self.reassembler.lock().pending_count()
    }

    /// Handle to the reassembler counters.
    pub fn stats(&self) -> Arc<AssemblyStats> {
        self.reassembler.lock().stats()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}
