//! Local stand-in for the RAG service.
//!
//! Run with `cargo run --example mock_upstream`, then point the relay at it:
//! `upstream.base_url = "http://127.0.0.1:8081"` and `RAG_API_KEY=dev-key`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;

const API_KEY: &str = "dev-key";

#[derive(Deserialize)]
struct Ask {
    question: String,
    k: i64,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn ask(headers: HeaderMap, Json(ask): Json<Ask>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad api key" }))).into_response();
    }
    Json(json!({
        "answer": format!("You asked: {}", ask.question),
        "sources": (1..=ask.k).map(|i| format!("doc-{}", i)).collect::<Vec<_>>(),
    }))
    .into_response()
}

async fn ask_stream(headers: HeaderMap, Json(ask): Json<Ask>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad api key").into_response();
    }

    let words: Vec<String> = format!("You asked: {} (k={})", ask.question, ask.k)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let events = futures_util::stream::iter(words)
        .then(|word| async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok::<_, Infallible>(Bytes::from(format!("data: {}\n\n", word)))
        })
        .chain(futures_util::stream::once(async {
            Ok(Bytes::from_static(b"event: done\ndata: [DONE]\n\n"))
        }));

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(events),
    )
        .into_response()
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/ask", post(ask))
        .route("/ask/stream", post(ask_stream));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Mock RAG service listening on http://{} (api key: {})", addr, API_KEY);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
