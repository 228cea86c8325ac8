//! Shared test helpers: a stub completion upstream and a recording
//! synthesizer double.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::json;
use tokio::net::TcpListener;

use vox_gateway::Result;
use vox_gateway::feedback::{SpeechSynthesizer, Utterance};

/// Spawn a stub chat-completion server returning `content` as the model
/// reply text; returns the endpoint URL
pub async fn spawn_completion_stub(content: &str) -> String {
    let content = content.to_string();
    let app = Router::new().route(
        "/",
        post(move || {
            let content = content.clone();
            async move {
                Json(json!({
                    "choices": [{ "message": { "content": content } }]
                }))
            }
        }),
    );

    serve(app).await
}

/// Spawn a stub upstream that always fails with `status`
pub async fn spawn_error_stub(status: u16) -> String {
    let app = Router::new().route(
        "/",
        post(move || async move {
            (
                StatusCode::from_u16(status).expect("status"),
                "upstream unavailable",
            )
        }),
    );

    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/")
}

/// An endpoint no server listens on; any request errors immediately
pub const UNROUTABLE_URL: &str = "http://127.0.0.1:9/";

/// Synthesizer double that records utterances instead of playing audio
#[derive(Default)]
pub struct RecordingSynthesizer {
    spoken: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
}

impl RecordingSynthesizer {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    async fn speak(&self, utterance: Utterance) -> Result<()> {
        self.spoken.lock().unwrap().push(utterance);
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::Relaxed);
    }
}

/// Wait for background tasks (speech feedback) to settle
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
}
