//! Accumulating fragments per message and emitting completed messages.

use std::collections::hash_map::Entry;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, trace, warn};

use frag_wire::checksum::{Checksum32, Crc32};
use frag_wire::compression::Decompressor;
use frag_wire::fragment::{self, Fragment};

use crate::stats::AssemblyStats;

/// Default cap on simultaneously in-progress messages.
pub const DEFAULT_MAX_PENDING: usize = 1024;

/// Default lifetime of an in-progress entry.
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or wrong-length fragment record. A framing bug on the
    /// sending side, surfaced to the caller.
    #[error(transparent)]
    Format(#[from] fragment::Error),
    /// Declared checksum disagrees with the payload. The fragment is dropped;
    /// its message simply stays incomplete.
    #[error("checksum mismatch on fragment {ord_no} of message {seq_no}: declared {declared:#010x}, computed {computed:#010x}")]
    Integrity { seq_no: u16, ord_no: u16, declared: u32, computed: u32 },
    /// `parts_total` disagrees with the value that opened the entry.
    #[error("fragment {ord_no} of message {seq_no} declares {declared} parts, entry holds {expected}")]
    PartsMismatch { seq_no: u16, ord_no: u16, declared: i16, expected: i16 },
    /// Declared part count is not positive.
    #[error("message {seq_no} declares a non-positive part count {parts_total}")]
    InvalidPartsTotal { seq_no: u16, parts_total: i16 },
    /// Fragment index falls outside the declared range.
    #[error("fragment index {ord_no} out of range for message {seq_no} with {parts_total} parts")]
    OrdOutOfRange { seq_no: u16, ord_no: u16, parts_total: i16 },
    /// The table is full of live entries; the new arrival was rejected.
    #[error("reassembly table full: {pending} messages in progress")]
    Capacity { pending: usize },
    /// Every fragment checksum passed but the reassembled message failed to
    /// decompress: the two ends disagree on compression configuration.
    #[error("decompression of message {seq_no} failed: {source}")]
    Decompress {
        seq_no: u16,
        #[source]
        source: io::Error,
    },
}

/// Configuration for a [`Reassembler`].
#[derive(Clone)]
pub struct ReassemblerOptions {
    max_pending: usize,
    max_completed: usize,
    pending_ttl: Option<Duration>,
    checksum: Arc<dyn Checksum32>,
    decompressor: Option<Arc<dyn Decompressor>>,
}

impl Default for ReassemblerOptions {
    fn default() -> Self {
        Self {
            max_pending: DEFAULT_MAX_PENDING,
            max_completed: DEFAULT_MAX_PENDING,
            pending_ttl: Some(DEFAULT_PENDING_TTL),
            checksum: Arc::new(Crc32),
            decompressor: None,
        }
    }
}

impl ReassemblerOptions {
    /// Caps the number of simultaneously in-progress messages.
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Caps the number of completed messages held for retrieval.
    pub fn max_completed(mut self, max_completed: usize) -> Self {
        self.max_completed = max_completed;
        self
    }

    /// Evicts in-progress entries older than `ttl`. `None` disables the
    /// timer; the [`Self::max_pending`] cap still bounds memory.
    pub fn pending_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Replaces the default CRC-32 payload digest. Must match the splitter's.
    pub fn with_checksum<H: Checksum32 + 'static>(self, checksum: H) -> Self {
        self.with_shared_checksum(Arc::new(checksum))
    }

    /// [`Self::with_checksum`] for an already-shared digest.
    pub fn with_shared_checksum(mut self, checksum: Arc<dyn Checksum32>) -> Self {
        self.checksum = checksum;
        self
    }

    /// Decompresses every completed message. Must match the splitter's
    /// compressor.
    pub fn with_decompressor<D: Decompressor>(self, decompressor: D) -> Self {
        self.with_shared_decompressor(Arc::new(decompressor))
    }

    /// [`Self::with_decompressor`] for an already-shared decompressor.
    pub fn with_shared_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = Some(decompressor);
        self
    }
}

/// One in-progress message: a slot per declared fragment.
struct Assembly {
    parts_total: i16,
    slots: Vec<Option<Bytes>>,
    filled: usize,
    opened_at: Instant,
}

impl Assembly {
    fn new(parts_total: i16) -> Self {
        Self {
            parts_total,
            slots: vec![None; parts_total as usize],
            filled: 0,
            opened_at: Instant::now(),
        }
    }

    fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Concatenates the slots in `ord_no` order. Call only when complete.
    fn into_payload(self) -> Bytes {
        let total = self.slots.iter().map(|s| s.as_ref().map_or(0, Bytes::len)).sum();
        let mut buf = BytesMut::with_capacity(total);
        for slot in self.slots {
            if let Some(chunk) = slot {
                buf.extend_from_slice(&chunk);
            }
        }
        buf.freeze()
    }
}

/// Rebuilds messages from fragments arriving in arbitrary order.
///
/// The reassembler owns its table exclusively: entries are created on the
/// first fragment of an unseen `seq_no`, mutated in place, and moved (never
/// copied) into the completed store the instant the last slot fills.
/// Fragment-level errors drop that fragment only; assembly of unrelated
/// messages is never affected.
pub struct Reassembler {
    options: ReassemblerOptions,
    pending: FxHashMap<u16, Assembly>,
    completed: FxHashMap<u16, Bytes>,
    /// Completion order, oldest first. Drives FIFO retrieval.
    completed_order: VecDeque<u16>,
    stats: Arc<AssemblyStats>,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(ReassemblerOptions::default())
    }
}

impl Reassembler {
    pub fn new(options: ReassemblerOptions) -> Self {
        Self {
            options,
            pending: FxHashMap::default(),
            completed: FxHashMap::default(),
            completed_order: VecDeque::new(),
            stats: Arc::new(AssemblyStats::default()),
        }
    }

    /// Feeds one received wire unit into the table.
    ///
    /// `payload_len` comes from the framing layer (datagram size, or the
    /// length prefix on stream channels) minus the fixed header.
    ///
    /// Returns `Ok(Some(message))` when this fragment completes its message;
    /// the message is also held in the completed store until retrieved. All
    /// errors are non-fatal to the reassembler: the offending fragment is
    /// dropped and later fragments proceed normally.
    pub fn add(&mut self, src: Bytes, payload_len: usize) -> Result<Option<Bytes>, Error> {
        self.purge_expired();

        let fragment = Fragment::decode(src, payload_len)?;
        self.stats.increment_fragments_rx();

        let seq_no = fragment.seq_no();
        let ord_no = fragment.ord_no();
        let parts_total = fragment.parts_total();

        if !fragment.verify(self.options.checksum.as_ref()) {
            let computed = self.options.checksum.digest(fragment.payload());
            self.stats.increment_integrity_drops();
            warn!(seq_no, ord_no, "dropping fragment with bad checksum");
            return Err(Error::Integrity {
                seq_no,
                ord_no,
                declared: fragment.checksum(),
                computed,
            });
        }

        if parts_total < 1 {
            self.stats.increment_protocol_drops();
            warn!(seq_no, parts_total, "dropping fragment with invalid part count");
            return Err(Error::InvalidPartsTotal { seq_no, parts_total });
        }

        if ord_no as usize >= parts_total as usize {
            self.stats.increment_protocol_drops();
            warn!(seq_no, ord_no, parts_total, "dropping out-of-range fragment");
            return Err(Error::OrdOutOfRange { seq_no, ord_no, parts_total });
        }

        let pending_len = self.pending.len();
        let assembly = match self.pending.entry(seq_no) {
            Entry::Occupied(entry) => {
                let assembly = entry.into_mut();
                if assembly.parts_total != parts_total {
                    self.stats.increment_protocol_drops();
                    warn!(
                        seq_no,
                        declared = parts_total,
                        expected = assembly.parts_total,
                        "dropping fragment with inconsistent part count"
                    );
                    return Err(Error::PartsMismatch {
                        seq_no,
                        ord_no,
                        declared: parts_total,
                        expected: assembly.parts_total,
                    });
                }
                assembly
            }
            Entry::Vacant(entry) => {
                if pending_len >= self.options.max_pending {
                    self.stats.increment_capacity_rejections();
                    warn!(seq_no, pending = pending_len, "reassembly table full, rejecting fragment");
                    return Err(Error::Capacity { pending: pending_len });
                }
                trace!(seq_no, parts_total, "opening reassembly entry");
                entry.insert(Assembly::new(parts_total))
            }
        };

        let slot = &mut assembly.slots[ord_no as usize];
        if slot.is_some() {
            // Idempotent duplicate: the first checksummed payload stays.
            self.stats.increment_duplicate_fragments();
            trace!(seq_no, ord_no, "ignoring duplicate fragment");
            return Ok(None);
        }

        *slot = Some(fragment.into_payload());
        assembly.filled += 1;

        if !assembly.is_complete() {
            return Ok(None);
        }

        let Some(assembly) = self.pending.remove(&seq_no) else {
            return Ok(None);
        };
        let raw = assembly.into_payload();
        let message = match &self.options.decompressor {
            Some(decompressor) => decompressor.decompress(&raw).map_err(|source| {
                warn!(seq_no, "dropping completed message that failed to decompress");
                Error::Decompress { seq_no, source }
            })?,
            None => raw,
        };

        self.store_completed(seq_no, message.clone());
        self.stats.increment_messages_completed();
        debug!(seq_no, bytes = message.len(), "message completed");
        Ok(Some(message))
    }

    /// Removes and returns a specific completed message.
    pub fn take_completed(&mut self, seq_no: u16) -> Option<Bytes> {
        let message = self.completed.remove(&seq_no)?;
        self.completed_order.retain(|id| *id != seq_no);
        Some(message)
    }

    /// Removes and returns the oldest completed message, FIFO by completion
    /// time.
    pub fn next_completed(&mut self) -> Option<(u16, Bytes)> {
        while let Some(seq_no) = self.completed_order.pop_front() {
            if let Some(message) = self.completed.remove(&seq_no) {
                return Some((seq_no, message));
            }
        }
        None
    }

    /// Number of in-progress messages.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of completed messages awaiting retrieval.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Handle to the shared counters.
    pub fn stats(&self) -> Arc<AssemblyStats> {
        Arc::clone(&self.stats)
    }

    fn purge_expired(&mut self) {
        let Some(ttl) = self.options.pending_ttl else {
            return;
        };
        if self.pending.is_empty() {
            return;
        }

        let expired: Vec<u16> = self
            .pending
            .iter()
            .filter(|(_, assembly)| assembly.opened_at.elapsed() > ttl)
            .map(|(seq_no, _)| *seq_no)
            .collect();
        for seq_no in expired {
            self.pending.remove(&seq_no);
            self.stats.increment_ttl_evictions();
            warn!(seq_no, "evicting expired reassembly entry");
        }
    }

    fn store_completed(&mut self, seq_no: u16, message: Bytes) {
        if self.completed.len() >= self.options.max_completed
            && !self.completed.contains_key(&seq_no)
        {
            // Oldest completed message gives way.
            while let Some(oldest) = self.completed_order.pop_front() {
                if self.completed.remove(&oldest).is_some() {
                    self.stats.increment_completed_evictions();
                    warn!(seq_no = oldest, "completed store full, evicting oldest message");
                    break;
                }
            }
        }

        if self.completed.insert(seq_no, message).is_none() {
            self.completed_order.push_back(seq_no);
        }
    }
}
