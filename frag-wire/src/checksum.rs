//! Per-fragment integrity digests.

/// A 32-bit digest over a fragment payload.
///
/// The digest covers only the fragment's own payload slice, never the header
/// or sibling fragments, so a corrupted fragment can be dropped without
/// touching the rest of its message.
pub trait Checksum32: Send + Sync {
    fn digest(&self, data: &[u8]) -> u32;
}

/// CRC-32 (IEEE), the default digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32;

impl Checksum32 for Crc32 {
    fn digest(&self, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}
