//! Bare HTTP/1.1 peer on a loopback socket, for transport and API tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Listener on an ephemeral port and its `http://` base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// Request line and headers, up to the blank line.
pub async fn read_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if socket.read(&mut byte).await.unwrap() == 0 {
            break;
        }
        head.push(byte[0]);
    }
    String::from_utf8(head).unwrap()
}

/// Response head without a length: the body runs until the socket closes.
pub async fn write_head(socket: &mut TcpStream, status: &str, content_type: &str) {
    let head = format!("HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n");
    socket.write_all(head.as_bytes()).await.unwrap();
}

pub async fn respond(socket: &mut TcpStream, status: &str, content_type: &str, body: &str) {
    write_head(socket, status, content_type).await;
    socket.write_all(body.as_bytes()).await.unwrap();
    socket.shutdown().await.ok();
}
