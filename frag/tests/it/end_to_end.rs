use bytes::Bytes;
use rand::seq::SliceRandom;
use rand::Rng;

use frag::compression::CompressionType;
use frag::fragment::HEADER_LEN;
use frag::reassemble::Reassembler;
use frag::split::{split, SplitOptions};
use frag::{Channel, ChannelOptions, FramedStream, Udp};

fn feed(reassembler: &mut Reassembler, fragments: &[Bytes]) -> Option<Bytes> {
    let mut out = None;
    for raw in fragments {
        if let Some(message) = reassembler.add(raw.clone(), raw.len() - HEADER_LEN).unwrap() {
            out = Some(message);
        }
    }
    out
}

async fn udp_pair() -> (Udp, Udp) {
    let left = Udp::bind("127.0.0.1:0").await.unwrap();
    let right = Udp::bind("127.0.0.1:0").await.unwrap();
    left.connect(right.local_addr().unwrap()).await.unwrap();
    right.connect(left.local_addr().unwrap()).await.unwrap();
    (left, right)
}

#[tokio::test]
async fn udp_roundtrip() {
    let _ = tracing_subscriber::fmt::try_init();
    let (left, right) = udp_pair().await;

    let options = ChannelOptions::default().max_fragment_payload(512);
    let mut sender = Channel::with_options(left, options.clone());
    let mut receiver = Channel::with_options(right, options);

    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let mut message = vec![0u8; rng.gen_range(0..4096)];
        rng.fill(&mut message[..]);

        let sent_seq = sender.send(&message).await.unwrap();
        let (seq_no, received) = receiver.recv().await.unwrap();
        assert_eq!(seq_no, sent_seq);
        assert_eq!(&received[..], &message[..]);
    }
}

#[tokio::test]
async fn udp_roundtrip_compressed() {
    let _ = tracing_subscriber::fmt::try_init();
    let (left, right) = udp_pair().await;

    let options = ChannelOptions::default()
        .max_fragment_payload(100)
        .with_compression(CompressionType::Lz4);
    let mut sender = Channel::with_options(left, options.clone());
    let mut receiver = Channel::with_options(right, options);

    let message = b"ciao".repeat(1000);
    sender.send(&message).await.unwrap();
    let (_, received) = receiver.recv().await.unwrap();
    assert_eq!(&received[..], &message[..]);
}

#[tokio::test]
async fn framed_tcp_roundtrip() {
    let _ = tracing_subscriber::fmt::try_init();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut channel = Channel::new(FramedStream::new(stream));
        channel.recv().await.unwrap()
    });

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut channel = Channel::new(FramedStream::new(stream));
    let payload = vec![7u8; 100_000];
    let sent_seq = channel.send(&payload).await.unwrap();

    let (seq_no, received) = server.await.unwrap();
    assert_eq!(seq_no, sent_seq);
    assert_eq!(received, payload);
}

#[test]
fn shuffled_fragments_reassemble() {
    let _ = tracing_subscriber::fmt::try_init();

    // 4000 bytes at 100 bytes per fragment: exactly 40 on the wire.
    let message = "ciao".repeat(1000);
    let options = SplitOptions::default().max_fragment_payload(100);
    let mut fragments = split(message.as_bytes(), 1, &options).unwrap();
    assert_eq!(fragments.len(), 40);

    fragments.shuffle(&mut rand::thread_rng());

    let mut reassembler = Reassembler::default();
    let received = feed(&mut reassembler, &fragments).unwrap();
    assert_eq!(&received[..], message.as_bytes());
    assert_eq!(reassembler.stats().messages_completed(), 1);
    assert_eq!(reassembler.pending_count(), 0);
}

#[test]
fn compression_reduces_fragment_count() {
    use frag::compression::GzipCompressor;

    let message = "ciao".repeat(1000);
    let options = SplitOptions::default().max_fragment_payload(100);
    let plain = split(message.as_bytes(), 1, &options).unwrap();
    let compressed = split(
        message.as_bytes(),
        1,
        &options.with_compressor(GzipCompressor::default()),
    )
    .unwrap();

    assert_eq!(plain.len(), 40);
    assert!(compressed.len() < plain.len());
}

#[test]
fn interleaved_sequences_complete_independently() {
    let mut rng = rand::thread_rng();
    let options = SplitOptions::default().max_fragment_payload(64);

    let first: Vec<u8> = (0..1000).map(|_| rng.gen()).collect();
    let second: Vec<u8> = (0..700).map(|_| rng.gen()).collect();

    let mut wire = split(&first, 100, &options).unwrap();
    wire.extend(split(&second, 200, &options).unwrap());
    wire.shuffle(&mut rng);

    let mut reassembler = Reassembler::default();
    let _ = feed(&mut reassembler, &wire);

    assert_eq!(reassembler.take_completed(100).unwrap(), Bytes::from(first));
    assert_eq!(reassembler.take_completed(200).unwrap(), Bytes::from(second));
}
