//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;

use subscription_gateway::{GatewayConfig, HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Client and link tables in a temporary directory, removed on drop.
pub struct Tables {
    _dir: TempDir,
    pub clients: PathBuf,
    pub links: PathBuf,
}

impl Tables {
    pub fn new(clients: &str, links: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let tables = Self {
            clients: dir.path().join("clients.json"),
            links: dir.path().join("links.json"),
            _dir: dir,
        };
        tables.write_clients(clients);
        std::fs::write(&tables.links, links).unwrap();
        tables
    }

    pub fn write_clients(&self, clients: &str) {
        std::fs::write(&self.clients, clients).unwrap();
    }

    /// Default config pointed at these tables.
    pub fn config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.tables.clients_path = self.clients.display().to_string();
        config.tables.links_path = self.links.display().to_string();
        config
    }
}

/// Start the gateway on an ephemeral loopback port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a mock subscription upstream that echoes the request path in its
/// body and sets its own `profile-title`.
pub async fn start_mock_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("?")
                    .to_string();

                let body = format!("config for {path}");
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nprofile-title: upstream\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
