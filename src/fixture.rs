//! Loopback HTTP fixture for tests.
//!
//! Serves fixed-size bodies of `b'x'` per path, with an optional delay
//! before the response and an optional early close mid-body.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    len: usize,
    status: u16,
    delay: Duration,
    truncate_at: Option<usize>,
}

impl Route {
    pub fn new(path: &str, len: usize) -> Self {
        Route {
            path: path.to_string(),
            len,
            status: 200,
            delay: Duration::ZERO,
            truncate_at: None,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Announce the full length but close after `n` body bytes.
    pub fn truncate_at(mut self, n: usize) -> Self {
        self.truncate_at = Some(n);
        self
    }
}

pub struct FixtureServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Arc::new(routes);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let _ = serve(stream, &routes).await;
                });
            }
        });

        FixtureServer { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(stream: TcpStream, routes: &[Route]) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    // Skip headers
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let route = routes
        .iter()
        .find(|r| r.path == path)
        .cloned()
        .unwrap_or_else(|| Route::new(&path, 0).status(404));
    trace!(path = %path, len = route.len, "Fixture request");

    tokio::time::sleep(route.delay).await;

    let header = format!(
        "HTTP/1.1 {} Fixture\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status, route.len
    );
    writer.write_all(header.as_bytes()).await?;

    let sent = route.truncate_at.unwrap_or(route.len).min(route.len);
    writer.write_all(&vec![b'x'; sent]).await?;
    writer.shutdown().await?;
    Ok(())
}

/// URL of a loopback port with no listener behind it.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}
