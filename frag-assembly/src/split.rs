//! Turning one logical message into an ordered sequence of encoded
//! fragments.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use frag_wire::checksum::{Checksum32, Crc32};
use frag_wire::compression::Compressor;
use frag_wire::fragment::{self, Fragment};

/// Default fragment payload size: the IPv6 minimum MTU (1280) minus IP and
/// UDP overhead and the fragment header.
pub const DEFAULT_FRAGMENT_PAYLOAD: usize = 1280 - 40 - 8 - fragment::HEADER_LEN;

#[derive(Debug, Error)]
pub enum Error {
    #[error("max_fragment_payload must be positive")]
    ZeroPayloadSize,
    #[error("message of {len} bytes needs more than {max} fragments", max = i16::MAX)]
    TooManyFragments { len: usize },
    #[error("compression failed: {0}")]
    Compress(#[source] std::io::Error),
    #[error("fragment encoding failed: {0}")]
    Encode(#[from] fragment::Error),
}

/// Configuration for [`split`].
#[derive(Clone)]
pub struct SplitOptions {
    max_fragment_payload: usize,
    compressor: Option<Arc<dyn Compressor>>,
    checksum: Arc<dyn Checksum32>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_fragment_payload: DEFAULT_FRAGMENT_PAYLOAD,
            compressor: None,
            checksum: Arc::new(Crc32),
        }
    }
}

impl SplitOptions {
    /// Sets the maximum payload carried by one fragment. Must stay within the
    /// channel MTU minus the fragment header overhead.
    pub fn max_fragment_payload(mut self, size: usize) -> Self {
        self.max_fragment_payload = size;
        self
    }

    /// Compresses every message before splitting it.
    pub fn with_compressor<C: Compressor>(self, compressor: C) -> Self {
        self.with_shared_compressor(Arc::new(compressor))
    }

    /// [`Self::with_compressor`] for an already-shared compressor.
    pub fn with_shared_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Replaces the default CRC-32 payload digest.
    pub fn with_checksum<H: Checksum32 + 'static>(self, checksum: H) -> Self {
        self.with_shared_checksum(Arc::new(checksum))
    }

    /// [`Self::with_checksum`] for an already-shared digest.
    pub fn with_shared_checksum(mut self, checksum: Arc<dyn Checksum32>) -> Self {
        self.checksum = checksum;
        self
    }
}

/// Splits `data` into encoded fragments ready for transmission.
///
/// The message is compressed first when a compressor is configured, so the
/// ratio is computed over the whole message rather than per fragment. An
/// empty message still yields exactly one empty-payload fragment: existence
/// is always signaled.
///
/// `seq_no` is caller-assigned and must be unique among messages in flight
/// toward the same receiver; there is no wraparound protection. The function
/// keeps no state across calls.
pub fn split(data: &[u8], seq_no: u16, options: &SplitOptions) -> Result<Vec<Bytes>, Error> {
    if options.max_fragment_payload == 0 {
        return Err(Error::ZeroPayloadSize);
    }

    let data = match &options.compressor {
        Some(compressor) => compressor.compress(data).map_err(Error::Compress)?,
        None => Bytes::copy_from_slice(data),
    };

    let parts_total = data.len().div_ceil(options.max_fragment_payload).max(1);
    if parts_total > i16::MAX as usize {
        return Err(Error::TooManyFragments { len: data.len() });
    }

    let mut fragments = Vec::with_capacity(parts_total);
    for ord_no in 0..parts_total {
        let start = ord_no * options.max_fragment_payload;
        let end = usize::min(start + options.max_fragment_payload, data.len());
        let fragment = Fragment::new(
            seq_no,
            ord_no as u16,
            parts_total as i16,
            data.slice(start..end),
            options.checksum.as_ref(),
        );
        fragments.push(fragment.encode()?);
    }

    trace!(seq_no, parts_total, bytes = data.len(), "split message");
    Ok(fragments)
}
