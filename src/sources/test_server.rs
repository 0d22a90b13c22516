//! Minimal HTTP/1.1 stub for client tests
//!
//! Answers every request from a closure of `(path, nth hit on that path)` and
//! records each hit with its arrival time. One request per connection.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Responder = dyn Fn(&str, usize) -> (u16, String) + Send + Sync;

pub(crate) struct TestServer {
    pub base: String,
    hits: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl TestServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, usize) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits: Arc<Mutex<Vec<(String, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let log = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let log = log.clone();
                let respond = respond.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 2048];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&request);
                    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                    let nth = {
                        let mut log = log.lock().unwrap();
                        let nth = log.iter().filter(|(p, _)| *p == path).count();
                        log.push((path.clone(), Instant::now()));
                        nth
                    };
                    let (status, body) = respond(&path, nth);
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.lock().unwrap().len()
    }

    /// Hits whose path contains `fragment`
    pub fn hits_for(&self, fragment: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p.contains(fragment))
            .count()
    }

    pub fn hit_times(&self) -> Vec<Instant> {
        self.hits.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}
