use std::io::{self, Read, Write};

use bytes::Bytes;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use super::{CompressionType, Compressor, Decompressor};

/// Default gzip compression level.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// A compressor that uses the gzip algorithm.
pub struct GzipCompressor {
    level: u32,
}

impl GzipCompressor {
    /// Creates a gzip compressor with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self { level }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_GZIP_LEVEL)
    }
}

impl Compressor for GzipCompressor {
    fn compression_type(&self) -> CompressionType {
        CompressionType::Gzip
    }

    fn compress(&self, data: &[u8]) -> Result<Bytes, io::Error> {
        let mut encoder =
            GzEncoder::new(Vec::with_capacity(data.len() / 4), Compression::new(self.level));
        encoder.write_all(data)?;

        Ok(Bytes::from(encoder.finish()?))
    }
}

#[derive(Debug, Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn decompress(&self, data: &[u8]) -> Result<Bytes, io::Error> {
        let mut decoder = GzDecoder::new(data);

        let mut bytes = Vec::with_capacity(data.len() * 4);
        decoder.read_to_end(&mut bytes)?;

        Ok(Bytes::from(bytes))
    }
}
