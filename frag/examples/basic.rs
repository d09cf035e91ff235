use frag::{Channel, ChannelOptions, Udp};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Two UDP endpoints on loopback, connected to each other
    let left = Udp::bind("127.0.0.1:0").await.unwrap();
    let right = Udp::bind("127.0.0.1:0").await.unwrap();
    left.connect(right.local_addr().unwrap()).await.unwrap();
    right.connect(left.local_addr().unwrap()).await.unwrap();

    let options = ChannelOptions::default().max_fragment_payload(100);
    let mut sender = Channel::with_options(left, options.clone());
    let mut receiver = Channel::with_options(right, options);

    // 4000 bytes split into 40 fragments of 100 bytes each
    let message = "ciao".repeat(1000);
    let start = frag_common::unix_micros();
    let seq_no = sender.send(message.as_bytes()).await.unwrap();
    println!("sent message {} ({} bytes)", seq_no, message.len());

    let (seq_no, received) = receiver.recv().await.unwrap();
    let elapsed = frag_common::unix_micros() - start;
    println!("received message {} ({} bytes) in {elapsed}us", seq_no, received.len());
    assert_eq!(received, message.as_bytes());
}
