//! End-to-end tests over real sockets

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use punchbag::config::Config;
use punchbag::http::response::ResponseSet;
use punchbag::server::listener::Server;

const BODY: &str = "<html></html>";
const KEEP_ALIVE_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\nConnection: Keep-Alive\r\n\r\n";
const PLAIN_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";

/// Binds an ephemeral port, spawns the accept loop, and returns the address
/// plus a copy of the buffers the server is expected to send.
async fn start_server(body: &str) -> (SocketAddr, ResponseSet) {
    let config = Config {
        port: 0,
        body: body.to_string(),
        verbose: false,
    };
    let responses = ResponseSet::build(config.body.as_bytes()).unwrap();
    let expected = responses.clone();

    let server = Server::bind(&config, responses).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    (addr, expected)
}

async fn read_exactly(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .expect("read timed out")
        .expect("read failed");
    buf
}

async fn expect_eof(stream: &mut TcpStream) {
    let mut buf = [0u8; 1];
    let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("read timed out")
        .expect("read failed");
    assert_eq!(n, 0, "expected EOF, got a byte: {:?}", buf[0]);
}

#[tokio::test]
async fn test_keep_alive_request_gets_keep_alive_response() {
    let (addr, expected) = start_server(BODY).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(KEEP_ALIVE_REQUEST).await.unwrap();

    let response = read_exactly(&mut stream, expected.keep_alive.len()).await;
    assert_eq!(response, expected.keep_alive.as_bytes());

    let text = String::from_utf8(response).unwrap();
    assert!(text.contains("Connection: keep-alive\n"));
    assert!(text.contains(&format!("Content-Length: {}\n", BODY.len())));
    assert!(text.ends_with(BODY));
}

#[tokio::test]
async fn test_connection_stays_open_after_keep_alive_response() {
    let (addr, expected) = start_server(BODY).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Two requests over the same socket, each answered in full.
    stream.write_all(KEEP_ALIVE_REQUEST).await.unwrap();
    let first = read_exactly(&mut stream, expected.keep_alive.len()).await;
    assert_eq!(first, expected.keep_alive.as_bytes());

    stream.write_all(KEEP_ALIVE_REQUEST).await.unwrap();
    let second = read_exactly(&mut stream, expected.keep_alive.len()).await;
    assert_eq!(second, expected.keep_alive.as_bytes());
}

#[tokio::test]
async fn test_plain_request_gets_close_response_then_eof() {
    let (addr, expected) = start_server(BODY).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(PLAIN_REQUEST).await.unwrap();

    let response = read_exactly(&mut stream, expected.close.len()).await;
    assert_eq!(response, expected.close.as_bytes());
    assert!(
        String::from_utf8(response)
            .unwrap()
            .contains("Connection: close\n")
    );

    expect_eof(&mut stream).await;
}

#[tokio::test]
async fn test_immediate_peer_close_sends_nothing() {
    let (addr, _expected) = start_server(BODY).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.shutdown().await.unwrap();

    // The server tears the connection down without responding.
    expect_eof(&mut stream).await;
}

#[tokio::test]
async fn test_garbage_bytes_get_close_response() {
    let (addr, expected) = start_server(BODY).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"not http at all \x00\x01\x02").await.unwrap();

    let response = read_exactly(&mut stream, expected.close.len()).await;
    assert_eq!(response, expected.close.as_bytes());
    expect_eof(&mut stream).await;
}

#[tokio::test]
async fn test_keep_alive_then_plain_closes() {
    let (addr, expected) = start_server(BODY).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(KEEP_ALIVE_REQUEST).await.unwrap();
    let first = read_exactly(&mut stream, expected.keep_alive.len()).await;
    assert_eq!(first, expected.keep_alive.as_bytes());

    stream.write_all(PLAIN_REQUEST).await.unwrap();
    let second = read_exactly(&mut stream, expected.close.len()).await;
    assert_eq!(second, expected.close.as_bytes());
    expect_eof(&mut stream).await;
}

#[tokio::test]
async fn test_empty_body_server() {
    let (addr, expected) = start_server("").await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(PLAIN_REQUEST).await.unwrap();

    let response = read_exactly(&mut stream, expected.close.len()).await;
    let text = String::from_utf8(response).unwrap();
    assert!(text.contains("Content-Length: 0\n"));
    assert!(text.ends_with("Accept-Ranges: bytes\n\n"));
    expect_eof(&mut stream).await;
}

#[tokio::test]
async fn test_concurrent_connections_share_buffers() {
    let (addr, expected) = start_server(BODY).await;

    let mut clients = Vec::new();
    for i in 0..8 {
        let expected = expected.clone();
        clients.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            if i % 2 == 0 {
                stream.write_all(KEEP_ALIVE_REQUEST).await.unwrap();
                let mut buf = vec![0u8; expected.keep_alive.len()];
                stream.read_exact(&mut buf).await.unwrap();
                assert_eq!(buf, expected.keep_alive.as_bytes());
            } else {
                stream.write_all(PLAIN_REQUEST).await.unwrap();
                let mut buf = vec![0u8; expected.close.len()];
                stream.read_exact(&mut buf).await.unwrap();
                assert_eq!(buf, expected.close.as_bytes());
            }
        }));
    }

    for client in clients {
        timeout(Duration::from_secs(10), client)
            .await
            .expect("client timed out")
            .unwrap();
    }
}
