use std::time::SystemTime;

/// Returns the current UNIX timestamp in microseconds.
#[inline]
pub fn unix_micros() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

#[allow(non_upper_case_globals)]
pub mod constants {
    pub const KiB: usize = 1024;
    pub const MiB: usize = 1024 * KiB;

    /// Largest payload a single UDP datagram can carry in practice.
    pub const MAX_DATAGRAM_SIZE: usize = 64 * KiB;
}
