//! Whole-message compression.
//!
//! Compression runs once over the entire message before it is split, never
//! per fragment. The compressed stream only becomes restorable once every
//! fragment has arrived, so the sender and receiver must agree on the
//! algorithm out of band; the fragment header carries no compression tag.

use std::io;
use std::sync::Arc;

use bytes::Bytes;

mod gzip;
mod lz4;
pub use gzip::*;
pub use lz4::*;

/// The compression algorithm applied to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    None = 0,
    Gzip = 1,
    Lz4 = 2,
}

impl TryFrom<u8> for CompressionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Lz4),
            _ => Err(value),
        }
    }
}

/// Shrinks a whole message before it is handed to the splitter.
pub trait Compressor: Send + Sync + 'static {
    /// Returns the compression type implemented by this compressor.
    fn compression_type(&self) -> CompressionType;

    fn compress(&self, data: &[u8]) -> Result<Bytes, io::Error>;
}

/// Restores a reassembled message to its original bytes.
pub trait Decompressor: Send + Sync + 'static {
    fn decompress(&self, data: &[u8]) -> Result<Bytes, io::Error>;
}

/// Returns the compressor for `kind`, or `None` for
/// [`CompressionType::None`].
pub fn compressor_for(kind: CompressionType) -> Option<Arc<dyn Compressor>> {
    match kind {
        CompressionType::None => None,
        CompressionType::Gzip => Some(Arc::new(GzipCompressor::default())),
        CompressionType::Lz4 => Some(Arc::new(Lz4Compressor)),
    }
}

/// Returns the decompressor matching `kind`, or `None` for
/// [`CompressionType::None`].
pub fn decompressor_for(kind: CompressionType) -> Option<Arc<dyn Decompressor>> {
    match kind {
        CompressionType::None => None,
        CompressionType::Gzip => Some(Arc::new(GzipDecompressor)),
        CompressionType::Lz4 => Some(Arc::new(Lz4Decompressor)),
    }
}
