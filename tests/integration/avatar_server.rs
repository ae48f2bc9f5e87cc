// Minimal HTTP servers standing in for the avatar CDN

use image::{Rgba, RgbaImage};
use imgwelcome::banner::encode_png;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// How the stub answers every request
#[derive(Clone)]
pub enum Behavior {
    /// 200 with the given body
    Body(Vec<u8>),
    /// Empty response with this status
    Status(u16),
    /// Wait before answering 200
    Slow(Duration, Vec<u8>),
}

pub struct AvatarServer {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
    handle: tokio::task::JoinHandle<()>,
}

impl AvatarServer {
    pub fn url(&self) -> String {
        format!("http://{}/avatars/77.png", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for AvatarServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Solid-color PNG for use as an avatar body
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
}

pub async fn spawn(behavior: Behavior) -> AvatarServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                continue;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let behavior = behavior.clone();

            tokio::spawn(async move {
                // Read the request (don't care about content)
                let mut buffer = vec![0u8; 4096];
                let _ = socket.read(&mut buffer).await;

                let (status, body) = match behavior {
                    Behavior::Body(body) => (200, body),
                    Behavior::Status(status) => (status, Vec::new()),
                    Behavior::Slow(delay, body) => {
                        tokio::time::sleep(delay).await;
                        (200, body)
                    }
                };

                let head = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    reason_phrase(status),
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    AvatarServer { addr, hits, handle }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
