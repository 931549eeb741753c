//! Bare HTTP/1.1 server for tests that need control over chunk timing.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the server does after writing the last chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hold {
    /// Send the terminating chunk and close.
    Close,
    /// Keep the connection open without sending anything else.
    Open,
    /// Close the socket without the terminating chunk.
    Truncate,
}

/// Serve one streaming response, writing each element of `chunks` as its own
/// HTTP chunk with `gap` between them. Returns the endpoint URL.
pub async fn serve(chunks: Vec<Vec<u8>>, gap: Duration, hold: Hold) -> String {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let Ok((mut sock, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut sock).await;

        let head = b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n";
        if sock.write_all(head).await.is_err() {
            return;
        }
        for chunk in chunks {
            if !gap.is_zero() {
                tokio::time::sleep(gap).await;
            }
            let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
            frame.extend_from_slice(&chunk);
            frame.extend_from_slice(b"\r\n");
            if sock.write_all(&frame).await.is_err() || sock.flush().await.is_err() {
                return;
            }
        }

        match hold {
            Hold::Close => {
                let _ = sock.write_all(b"0\r\n\r\n").await;
                let _ = sock.flush().await;
            }
            Hold::Open => std::future::pending::<()>().await,
            Hold::Truncate => drop(sock),
        }
    });
    url
}

/// Accept one request and never answer it.
pub async fn silent() -> String {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let Ok((mut sock, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut sock).await;
        std::future::pending::<()>().await;
    });
    url
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (listener, format!("http://{addr}/v1/chat/completions"))
}

async fn read_request(sock: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
        match sock.read(&mut tmp).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
        }
    }
}
