use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one reassembler.
/// Shared between the reassembler and anyone holding a stats handle.
#[derive(Debug, Default)]
pub struct AssemblyStats {
    /// Fragments that decoded successfully.
    fragments_rx: AtomicUsize,
    /// Duplicate fragments ignored.
    duplicate_fragments: AtomicUsize,
    /// Messages fully reassembled.
    messages_completed: AtomicUsize,
    /// Fragments dropped on checksum mismatch.
    integrity_drops: AtomicUsize,
    /// Fragments dropped on protocol violations.
    protocol_drops: AtomicUsize,
    /// Fragments rejected because the table was full.
    capacity_rejections: AtomicUsize,
    /// In-progress entries evicted past their TTL.
    ttl_evictions: AtomicUsize,
    /// Completed messages evicted before retrieval.
    completed_evictions: AtomicUsize,
}

impl AssemblyStats {
    #[inline]
    pub(crate) fn increment_fragments_rx(&self) {
        self.fragments_rx.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_duplicate_fragments(&self) {
        self.duplicate_fragments.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_messages_completed(&self) {
        self.messages_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_integrity_drops(&self) {
        self.integrity_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_protocol_drops(&self) {
        self.protocol_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_capacity_rejections(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_ttl_evictions(&self) {
        self.ttl_evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_completed_evictions(&self) {
        self.completed_evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn fragments_rx(&self) -> usize {
        self.fragments_rx.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn duplicate_fragments(&self) -> usize {
        self.duplicate_fragments.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn messages_completed(&self) -> usize {
        self.messages_completed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn integrity_drops(&self) -> usize {
        self.integrity_drops.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn protocol_drops(&self) -> usize {
        self.protocol_drops.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity_rejections(&self) -> usize {
        self.capacity_rejections.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn ttl_evictions(&self) -> usize {
        self.ttl_evictions.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn completed_evictions(&self) -> usize {
        self.completed_evictions.load(Ordering::Relaxed)
    }
}
