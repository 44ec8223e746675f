//! Integration tests for the TCP transport.

use chatgate_transport::{Connection, TcpTransport, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn bind_local() -> (TcpTransport, String) {
    let transport = TcpTransport::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = transport.local_addr().expect("local addr").to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_accept_and_recv_bytes() {
    let (mut transport, addr) = bind_local().await;

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(&addr).await.unwrap();
        stream.write_all(b"PASS secret\r\n").await.unwrap();
        stream
    });

    let conn = transport.accept().await.expect("accept");
    let data = conn.recv().await.expect("recv").expect("some data");
    assert_eq!(data, b"PASS secret\r\n");

    drop(client.await.unwrap());
}

#[tokio::test]
async fn test_send_reaches_peer() {
    let (mut transport, addr) = bind_local().await;

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(&addr).await.unwrap();
        let mut buf = vec![0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        buf.truncate(n);
        buf
    });

    let conn = transport.accept().await.expect("accept");
    conn.send(b":gate PONG :gate\r\n").await.expect("send");

    let received = client.await.unwrap();
    assert_eq!(received, b":gate PONG :gate\r\n");
}

#[tokio::test]
async fn test_recv_returns_none_after_peer_closes() {
    let (mut transport, addr) = bind_local().await;

    let client = tokio::spawn(async move {
        let stream = TcpStream::connect(&addr).await.unwrap();
        drop(stream);
    });

    let conn = transport.accept().await.expect("accept");
    client.await.unwrap();

    let result = conn.recv().await.expect("recv should not error");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_close_signals_eof_to_peer() {
    let (mut transport, addr) = bind_local().await;

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(&addr).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        buf
    });

    let conn = transport.accept().await.expect("accept");
    conn.send(b"bye\r\n").await.expect("send");
    conn.close().await.expect("close");

    let received = client.await.unwrap();
    assert_eq!(received, b"bye\r\n");
}

#[tokio::test]
async fn test_connection_ids_are_unique() {
    let (mut transport, addr) = bind_local().await;

    let a = addr.clone();
    let c1 = tokio::spawn(async move { TcpStream::connect(&a).await.unwrap() });
    let conn1 = transport.accept().await.expect("accept 1");
    let c2 = tokio::spawn(async move { TcpStream::connect(&addr).await.unwrap() });
    let conn2 = transport.accept().await.expect("accept 2");

    assert_ne!(conn1.id(), conn2.id());
    drop((c1.await.unwrap(), c2.await.unwrap()));
}

#[tokio::test]
async fn test_bind_failure_reports_address() {
    let (_transport, addr) = bind_local().await;
    let err = TcpTransport::bind(&addr)
        .await
        .err()
        .expect("second bind on the same port should fail");
    assert!(err.to_string().contains(&addr));
}
