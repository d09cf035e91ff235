use frag::{Channel, ChannelOptions, FramedStream};
use tokio::net::{TcpListener, TcpStream};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // TCP is a byte stream: fragments travel behind a length prefix.
        let mut channel = Channel::with_options(
            FramedStream::new(stream),
            ChannelOptions::default().max_fragment_payload(1024),
        );
        let (seq_no, message) = channel.recv().await.unwrap();
        println!("server received message {} ({} bytes)", seq_no, message.len());
        message
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let mut channel = Channel::with_options(
        FramedStream::new(stream),
        ChannelOptions::default().max_fragment_payload(1024),
    );

    let payload = vec![0x42u8; 64 * 1024];
    channel.send(&payload).await.unwrap();

    let received = server.await.unwrap();
    assert_eq!(received, payload);
    println!("64 KiB crossed the stream intact");
}
