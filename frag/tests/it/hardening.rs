use std::time::Duration;

use bytes::Bytes;

use frag::checksum::Checksum32;
use frag::fragment::HEADER_LEN;
use frag::reassemble::{self, Reassembler};
use frag::split::{split, SplitOptions};
use frag::ReassemblerOptions;

fn options_100() -> SplitOptions {
    SplitOptions::default().max_fragment_payload(100)
}

fn add(reassembler: &mut Reassembler, raw: Bytes) -> Result<Option<Bytes>, reassemble::Error> {
    let payload_len = raw.len() - HEADER_LEN;
    reassembler.add(raw, payload_len)
}

#[test]
fn duplicate_fragments_do_not_block_completion() {
    let message = vec![3u8; 250];
    let fragments = split(&message, 1, &options_100()).unwrap();

    let mut reassembler = Reassembler::default();
    // Every fragment arrives twice, in a burst, before the last one shows up.
    for raw in &fragments[..2] {
        assert!(add(&mut reassembler, raw.clone()).unwrap().is_none());
        assert!(add(&mut reassembler, raw.clone()).unwrap().is_none());
    }
    let completed = add(&mut reassembler, fragments[2].clone()).unwrap().unwrap();
    assert_eq!(&completed[..], &message[..]);
}

#[test]
fn any_flipped_payload_bit_is_detected() {
    let message = b"integrity matters".to_vec();
    let fragments = split(&message, 2, &options_100()).unwrap();
    let clean = fragments[0].clone();

    // Flip each payload bit in turn; every mutation must be caught.
    for bit in 0..(message.len() * 8) {
        let mut tampered = clean.to_vec();
        tampered[HEADER_LEN + bit / 8] ^= 1 << (bit % 8);

        let mut reassembler = Reassembler::default();
        let err = add(&mut reassembler, Bytes::from(tampered)).unwrap_err();
        assert!(matches!(err, reassemble::Error::Integrity { .. }), "bit {bit}");
        // The tampered set alone never completes.
        assert_eq!(reassembler.pending_count(), 0);
    }
}

#[test]
fn capacity_bound_rejects_overflow() {
    let mut reassembler = Reassembler::new(
        ReassemblerOptions::default().max_pending(3).pending_ttl(None),
    );

    for seq_no in 0..3 {
        let fragments = split(&[1u8; 200], seq_no, &options_100()).unwrap();
        assert!(add(&mut reassembler, fragments[0].clone()).unwrap().is_none());
    }

    let overflow = split(&[1u8; 200], 99, &options_100()).unwrap();
    let err = add(&mut reassembler, overflow[0].clone()).unwrap_err();
    assert!(matches!(err, reassemble::Error::Capacity { pending: 3 }));
    assert_eq!(reassembler.stats().capacity_rejections(), 1);
    // Memory stays bounded: the table never grew past its cap.
    assert_eq!(reassembler.pending_count(), 3);
}

#[test]
fn stale_entries_expire_and_free_capacity() {
    let mut reassembler = Reassembler::new(
        ReassemblerOptions::default()
            .max_pending(1)
            .pending_ttl(Some(Duration::from_millis(20))),
    );

    let stale = split(&[0u8; 300], 7, &options_100()).unwrap();
    assert!(add(&mut reassembler, stale[0].clone()).unwrap().is_none());

    std::thread::sleep(Duration::from_millis(40));

    let fresh = split(b"fresh start", 8, &options_100()).unwrap();
    let completed = add(&mut reassembler, fresh[0].clone()).unwrap().unwrap();
    assert_eq!(&completed[..], b"fresh start");
    assert_eq!(reassembler.stats().ttl_evictions(), 1);
}

#[test]
fn completed_messages_drain_in_completion_order() {
    let mut reassembler = Reassembler::default();
    for seq_no in [5u16, 3, 9] {
        let fragments = split(&seq_no.to_be_bytes(), seq_no, &options_100()).unwrap();
        assert!(add(&mut reassembler, fragments[0].clone()).unwrap().is_some());
    }

    let drained: Vec<u16> = std::iter::from_fn(|| reassembler.next_completed())
        .map(|(seq_no, _)| seq_no)
        .collect();
    assert_eq!(drained, vec![5, 3, 9]);
}

#[test]
fn checksum_function_is_pluggable() {
    /// Trivial sum digest, same on both ends.
    struct ByteSum;

    impl Checksum32 for ByteSum {
        fn digest(&self, data: &[u8]) -> u32 {
            data.iter().map(|b| u32::from(*b)).sum()
        }
    }

    let message = vec![0xAAu8; 300];
    let fragments = split(
        &message,
        4,
        &options_100().with_checksum(ByteSum),
    )
    .unwrap();

    // A CRC-32 reassembler rejects the foreign digest...
    let mut crc = Reassembler::default();
    assert!(matches!(
        add(&mut crc, fragments[0].clone()),
        Err(reassemble::Error::Integrity { .. })
    ));

    // ...while a matching one completes the message.
    let mut matching =
        Reassembler::new(ReassemblerOptions::default().with_checksum(ByteSum));
    let mut completed = None;
    for raw in &fragments {
        if let Some(message) = add(&mut matching, raw.clone()).unwrap() {
            completed = Some(message);
        }
    }
    assert_eq!(&completed.unwrap()[..], &message[..]);
}
