//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use instrumented_http::AppConfig;

/// One request received by the mock collector.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ReceivedExport {
    pub path: String,
    pub content_type: Option<String>,
    pub body_len: usize,
}

/// A mock OTLP/HTTP collector that answers every request with `200 OK`
/// and records what it received.
#[allow(dead_code)]
pub async fn start_mock_collector() -> (SocketAddr, Arc<Mutex<Vec<ReceivedExport>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let sink = sink.clone();
                    tokio::spawn(async move {
                        if let Some(export) = handle_export(socket).await {
                            sink.lock().unwrap().push(export);
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, received)
}

async fn handle_export(mut socket: TcpStream) -> Option<ReceivedExport> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();

    let mut content_length = 0usize;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() - header_end < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;

    Some(ReceivedExport {
        path,
        content_type,
        body_len: buf.len() - header_end,
    })
}

/// Config bound to an ephemeral local port with a short simulated delay.
#[allow(dead_code)]
pub fn test_config(sleep_ms: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.handler.sleep_ms = sleep_ms;
    config
}

/// A client that never pools or proxies connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
