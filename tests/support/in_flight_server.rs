//! Minimal HTTP server that counts how many requests it holds open at once.
//!
//! Every connection is served on its own task and parked for `hold` before
//! the response goes out, so concurrent client transfers overlap here.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const BODY: &[u8] = b"content";

#[derive(Debug, Default)]
struct Counters {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// Handle to a running server. The accept loop stops when it is dropped.
#[derive(Debug)]
pub struct InFlightServer {
    addr: SocketAddr,
    counters: Arc<Counters>,
    accept_loop: JoinHandle<()>,
}

impl InFlightServer {
    /// Serves `200 OK` with a 7-byte body on every path, after holding each
    /// request for `hold`.
    pub fn start(listener: TcpListener, hold: Duration) -> std::io::Result<Self> {
        let addr = listener.local_addr()?;
        let counters = Arc::new(Counters::default());
        let shared = Arc::clone(&counters);
        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, hold, Arc::clone(&shared)));
            }
        });
        Ok(Self {
            addr,
            counters,
            accept_loop,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Largest number of requests held open at the same time.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    pub fn body_len() -> usize {
        BODY.len()
    }
}

impl Drop for InFlightServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve(mut stream: TcpStream, hold: Duration, counters: Arc<Counters>) {
    let mut head = Vec::new();
    let mut buf = [0_u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }

    let now = counters.current.fetch_add(1, Ordering::SeqCst) + 1;
    counters.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(hold).await;
    counters.current.fetch_sub(1, Ordering::SeqCst);

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        BODY.len()
    );
    if stream.write_all(header.as_bytes()).await.is_ok() {
        let _ = stream.write_all(BODY).await;
    }
    let _ = stream.shutdown().await;
}
