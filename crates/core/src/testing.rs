//! In-memory collaborators for exercising the orchestration without HTTP, plus a
//! one-shot local server for the HTTP clients.

use crate::alert::{AlertRequest, AlertResponse, AlertSink, DispatchError};
use crate::domain::trend::TrendsResponse;
use crate::ingest::{FetchError, TrendsSource};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Reply = (Duration, Result<TrendsResponse, FetchError>);

pub(crate) fn trends_body(trends: serde_json::Value) -> TrendsResponse {
    serde_json::from_value(serde_json::json!({ "trends": trends })).unwrap()
}

/// Replays scripted replies in order; the last one repeats once the script runs out.
pub(crate) struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn ok(resp: TrendsResponse) -> Arc<Self> {
        Self::sequence(vec![(Duration::ZERO, Ok(resp))])
    }

    pub(crate) fn sequence(replies: Vec<Reply>) -> Arc<Self> {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        }
    }
}

#[async_trait::async_trait]
impl TrendsSource for ScriptedSource {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_trends(&self) -> Result<TrendsResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, reply) = self.next_reply();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

/// Records every alert request and answers with a fixed response.
pub(crate) struct RecordingSink {
    reply: AlertResponse,
    requests: Mutex<Vec<AlertRequest>>,
}

impl RecordingSink {
    pub(crate) fn sent() -> Arc<Self> {
        Self::with_reply(AlertResponse {
            sent: Some(true),
            ..Default::default()
        })
    }

    pub(crate) fn rejected(reason: &str) -> Arc<Self> {
        Self::with_reply(AlertResponse {
            sent: Some(false),
            reason: Some(reason.to_string()),
            ..Default::default()
        })
    }

    fn with_reply(reply: AlertResponse) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<AlertRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AlertSink for RecordingSink {
    fn sink_name(&self) -> &'static str {
        "recording"
    }

    async fn send_alert(&self, req: &AlertRequest) -> Result<AlertResponse, DispatchError> {
        self.requests.lock().unwrap().push(req.clone());
        Ok(self.reply.clone())
    }
}

/// Answers exactly one request on a loopback port with `status` and a JSON `body`.
/// Returns the base url and a handle yielding the raw request that was received.
pub(crate) async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        request
    });
    (base_url, handle)
}

// Reads the head and, when announced, the body so the client never sees a reset.
async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let content_length = text[..head_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if raw.len() >= head_end + 4 + content_length {
            break;
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}
