//! Shared utilities for integration tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use front_door::http::HttpServer;
use front_door::load_balancer::AffinityState;
use front_door::net::Listener;
use front_door::{ServerConfig, Shutdown};

/// A backend that answers every request with `port=<its port>` and records
/// the raw request it received.
#[allow(dead_code)]
pub struct MockBackend {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> String {
        self.requests().last().cloned().unwrap_or_default()
    }
}

/// Start a mock backend on an ephemeral port.
#[allow(dead_code)]
pub async fn start_mock_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let recorded = Arc::clone(&recorded);
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                let mut raw = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    raw.push_str(&line);
                    let lower = line.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                    if line == "\r\n" {
                        break;
                    }
                }
                let mut body = vec![0u8; content_length];
                if reader.read_exact(&mut body).await.is_err() {
                    return;
                }
                raw.push_str(&String::from_utf8_lossy(&body));
                recorded.lock().unwrap().push(raw);

                let reply = format!("port={}", port);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nSet-Cookie: app=1\r\nContent-Length: {}\r\n\r\n{}",
                    reply.len(),
                    reply
                );
                let mut socket = reader.into_inner();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockBackend { port, requests }
}

/// A backend that answers without `Content-Length` and keeps the socket open
/// until the other side hangs up.
#[allow(dead_code)]
pub async fn start_unframed_backend(body: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    if line == "\r\n" {
                        break;
                    }
                }
                let response = format!("HTTP/1.1 200 OK\r\nX: 1\r\n\r\n{}", body);
                if reader.get_mut().write_all(response.as_bytes()).await.is_err() {
                    return;
                }
                let mut rest = Vec::new();
                let _ = reader.read_to_end(&mut rest).await;
            });
        }
    });

    port
}

/// A port with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// A running front door.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub affinity: Arc<AffinityState>,
    pub shutdown: Shutdown,
}

/// Config with the given root and proxy contexts, everything else default.
#[allow(dead_code)]
pub fn config(root: PathBuf, contexts: &[(&str, Vec<u16>)]) -> ServerConfig {
    let proxy_contexts: BTreeMap<String, Vec<u16>> = contexts
        .iter()
        .map(|(name, ports)| (name.to_string(), ports.clone()))
        .collect();
    ServerConfig {
        root,
        proxy_contexts,
        ..ServerConfig::default()
    }
}

/// Serve `config` on an ephemeral local port.
pub async fn spawn_server(config: ServerConfig) -> TestServer {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(tcp, 64);
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config);
    let affinity = Arc::clone(server.affinity());
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestServer {
        addr,
        affinity,
        shutdown,
    }
}

/// Send raw bytes on a fresh connection, half-close, and read until the
/// server hangs up.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => response.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&response).into_owned()
}

/// Value of the first `LDBLNCNGCK` cookie set with a non-zero lifetime.
#[allow(dead_code)]
pub fn issued_token(response: &str) -> Option<String> {
    response
        .lines()
        .filter_map(|line| line.strip_prefix("set-cookie: LDBLNCNGCK="))
        .find(|value| !value.ends_with("Max-Age=0"))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}
