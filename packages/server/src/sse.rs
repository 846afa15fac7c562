//! Lightweight SSE endpoint for streaming analysis progress to clients.
//!
//! Opening the stream subscribes to the session's progress channel; the
//! stream ends naturally after the terminal `complete` event because the
//! channel drops the sender on close.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use analysis::ProgressEventKind;

use crate::routes::AppState;

/// SSE handler — subscribes to a session's progress and streams events.
pub async fn stream_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let rx = state.progress.open(&session_id).await;

    let stream = ReceiverStream::new(rx).map(|event| {
        let event_type = match event.kind {
            ProgressEventKind::Connected => "connected",
            ProgressEventKind::Progress => "progress",
            ProgressEventKind::Complete => "complete",
        };
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());

        Ok::<_, Infallible>(Event::default().event(event_type).data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
