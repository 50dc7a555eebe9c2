#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use esb_mediation_rust::config::MediationConfig;
use esb_mediation_rust::mediators::Mediator;
use esb_mediation_rust::{MediationEnvironment, MediationError, MessageContext};

/// Install a test subscriber once; honors RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn environment() -> Arc<MediationEnvironment> {
    init_tracing();
    Arc::new(MediationEnvironment::from_config(MediationConfig::default()))
}

/// Records the function stack depth each time it runs
#[derive(Default)]
pub struct DepthProbe {
    depths: Mutex<Vec<usize>>,
}

impl DepthProbe {
    pub fn depths(&self) -> Vec<usize> {
        self.depths.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mediator for DepthProbe {
    fn name(&self) -> &str {
        "depth-probe"
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        if let Ok(mut depths) = self.depths.lock() {
            depths.push(ctx.function_stack_depth());
        }
        Ok(true)
    }
}

pub struct Failing;

#[async_trait]
impl Mediator for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn mediate(&self, _ctx: &mut MessageContext) -> Result<bool, MediationError> {
        Err(MediationError::mediator_failure("failing", "boom"))
    }
}

/// Minimal HTTP/1.1 server answering every request with one canned response
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
}

impl StubServer {
    pub async fn spawn(status: u16, body: &'static str) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.context("failed to bind stub server")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));

        let seen = requests.clone();
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let raw = read_request(&mut socket).await;
                if let Ok(mut seen) = seen.lock() {
                    seen.push(raw);
                }

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Ok(Self { base_url, requests, hits })
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw request text (head and body) of every request received
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}
