use frag::compression::CompressionType;
use frag::split::{split, SplitOptions};
use frag::{Channel, ChannelOptions, Udp};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let message = "ciao".repeat(1000);

    // Compression runs over the whole message before splitting, so highly
    // repetitive input collapses into far fewer fragments.
    let plain = split(message.as_bytes(), 0, &SplitOptions::default().max_fragment_payload(100))
        .unwrap();
    let compressed = split(
        message.as_bytes(),
        0,
        &SplitOptions::default()
            .max_fragment_payload(100)
            .with_compressor(frag::compression::GzipCompressor::default()),
    )
    .unwrap();
    println!("plain: {} fragments, gzip: {} fragments", plain.len(), compressed.len());

    let left = Udp::bind("127.0.0.1:0").await.unwrap();
    let right = Udp::bind("127.0.0.1:0").await.unwrap();
    left.connect(right.local_addr().unwrap()).await.unwrap();
    right.connect(left.local_addr().unwrap()).await.unwrap();

    // Both ends must agree on the algorithm: the wire carries no tag.
    let options = ChannelOptions::default()
        .max_fragment_payload(100)
        .with_compression(CompressionType::Gzip);
    let mut sender = Channel::with_options(left, options.clone());
    let mut receiver = Channel::with_options(right, options);

    sender.send(message.as_bytes()).await.unwrap();
    let (seq_no, received) = receiver.recv().await.unwrap();
    println!("message {} restored to {} bytes", seq_no, received.len());
    assert_eq!(received, message.as_bytes());
}
