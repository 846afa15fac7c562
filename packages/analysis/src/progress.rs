//! Session-keyed progress channel.
//!
//! An in-process mapping from session id to a single live subscriber.
//! Delivery is best-effort and fire-and-forget: no buffering beyond the
//! channel itself, no replay, no back-pressure to the producer. A write to
//! a gone subscriber tears the entry down; a full buffer drops the event —
//! every event is a full snapshot, so the next one supersedes it.
//!
//! The channel owns the per-session [`AnalysisSession`] record and uses it
//! to enforce the stream invariants at the single mutation point: progress
//! is non-decreasing and the completed-stage set only grows.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

use crate::types::{ProgressEvent, Stage};

/// Bounded buffer per subscriber. Progress events are small and snapshots,
/// so a slow consumer only ever misses intermediate frames.
const CHANNEL_CAPACITY: usize = 64;

/// Per-session state, owned exclusively by the channel.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub session_id: String,
    pub stage: Option<Stage>,
    pub progress_percent: u8,
    pub completed_stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisSession {
    fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            stage: None,
            progress_percent: 0,
            completed_stages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Fold an outgoing event into the session, clamping the event so the
    /// stream stays monotone even if the producer misbehaves.
    fn absorb(&mut self, event: &mut ProgressEvent) {
        event.progress = event.progress.max(self.progress_percent);
        self.progress_percent = event.progress;

        if let Some(stage) = event.stage {
            self.stage = Some(stage);
        }

        for stage in event.completed_stages.drain(..) {
            if !self.completed_stages.contains(&stage) {
                self.completed_stages.push(stage);
            }
        }
        event.completed_stages = self.completed_stages.clone();
    }
}

struct SessionEntry {
    tx: mpsc::Sender<ProgressEvent>,
    session: AnalysisSession,
}

/// In-process, single-node progress broadcast.
///
/// Thread-safe and cloneable. At most one subscriber per session id;
/// opening a second subscription for the same id silently replaces the
/// first. Sessions are independent — concurrent open/publish/close for
/// different ids never interfere.
#[derive(Clone)]
pub struct ProgressChannel {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a subscriber for a session and immediately deliver a
    /// `connected` event. Replaces any previous subscriber for the id.
    pub async fn open(&self, session_id: &str) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        // Fresh channel, cannot be full.
        let _ = tx.try_send(ProgressEvent::connected());

        let entry = SessionEntry {
            tx,
            session: AnalysisSession::new(session_id),
        };
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), entry);
        rx
    }

    /// Deliver an event to the session's subscriber, if any.
    ///
    /// No-op for unknown sessions. A closed receiver removes the mapping
    /// entry; a full buffer drops the event.
    pub async fn publish(&self, session_id: &str, mut event: ProgressEvent) {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(session_id) else {
            return;
        };

        entry.session.absorb(&mut event);

        match entry.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(session_id, "progress buffer full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(session_id, "subscriber gone, removing session");
                sessions.remove(session_id);
            }
        }
    }

    /// Deliver a terminal event and remove the session.
    pub async fn close(&self, session_id: &str, mut event: ProgressEvent) {
        let mut sessions = self.sessions.write().await;
        if let Some(mut entry) = sessions.remove(session_id) {
            entry.session.absorb(&mut event);
            let _ = entry.tx.try_send(event);
        }
    }

    /// Number of live sessions (housekeeping/metrics).
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressEventKind;

    #[tokio::test]
    async fn open_delivers_connected_event() {
        let channel = ProgressChannel::new();
        let mut rx = channel.open("s1").await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ProgressEventKind::Connected);
        assert_eq!(event.progress, 0);
    }

    #[tokio::test]
    async fn publish_without_subscriber_is_noop() {
        let channel = ProgressChannel::new();
        // Should not panic or register anything.
        channel
            .publish("nobody", ProgressEvent::progress(Stage::Discovery, "x", 5, vec![]))
            .await;
        assert_eq!(channel.session_count().await, 0);
    }

    #[tokio::test]
    async fn progress_is_clamped_monotone() {
        let channel = ProgressChannel::new();
        let mut rx = channel.open("s1").await;
        rx.recv().await.unwrap(); // connected

        channel
            .publish("s1", ProgressEvent::progress(Stage::Verification, "a", 40, vec![]))
            .await;
        // A regressing producer value must not move the stream backwards.
        channel
            .publish("s1", ProgressEvent::progress(Stage::Extraction, "b", 25, vec![]))
            .await;

        assert_eq!(rx.recv().await.unwrap().progress, 40);
        assert_eq!(rx.recv().await.unwrap().progress, 40);
    }

    #[tokio::test]
    async fn completed_stages_only_grow() {
        let channel = ProgressChannel::new();
        let mut rx = channel.open("s1").await;
        rx.recv().await.unwrap();

        channel
            .publish(
                "s1",
                ProgressEvent::progress(Stage::Verification, "a", 15, vec![Stage::Discovery]),
            )
            .await;
        channel
            .publish(
                "s1",
                ProgressEvent::progress(Stage::Extraction, "b", 25, vec![Stage::Verification]),
            )
            .await;

        assert_eq!(rx.recv().await.unwrap().completed_stages, vec![Stage::Discovery]);
        assert_eq!(
            rx.recv().await.unwrap().completed_stages,
            vec![Stage::Discovery, Stage::Verification]
        );
    }

    #[tokio::test]
    async fn dropped_subscriber_is_cleaned_up_on_publish() {
        let channel = ProgressChannel::new();
        let rx = channel.open("s1").await;
        drop(rx);

        channel
            .publish("s1", ProgressEvent::progress(Stage::Discovery, "x", 5, vec![]))
            .await;
        assert_eq!(channel.session_count().await, 0);
    }

    #[tokio::test]
    async fn reopen_replaces_previous_subscriber() {
        let channel = ProgressChannel::new();
        let mut first = channel.open("s1").await;
        first.recv().await.unwrap();

        let mut second = channel.open("s1").await;
        second.recv().await.unwrap();

        channel
            .publish("s1", ProgressEvent::progress(Stage::Discovery, "x", 5, vec![]))
            .await;

        assert_eq!(second.recv().await.unwrap().progress, 5);
        // The first receiver's sender is gone; nothing further arrives.
        assert!(first.recv().await.is_none());
        assert_eq!(channel.session_count().await, 1);
    }

    #[tokio::test]
    async fn close_delivers_terminal_event_and_removes_session() {
        let channel = ProgressChannel::new();
        let mut rx = channel.open("s1").await;
        rx.recv().await.unwrap();

        channel
            .close(
                "s1",
                ProgressEvent::progress(Stage::Complete, "done", 100, vec![]),
            )
            .await;

        assert_eq!(rx.recv().await.unwrap().progress, 100);
        // Sender dropped with the entry: the stream ends naturally.
        assert!(rx.recv().await.is_none());
        assert_eq!(channel.session_count().await, 0);
    }

    #[tokio::test]
    async fn sessions_do_not_interfere() {
        let channel = ProgressChannel::new();
        let mut rx1 = channel.open("s1").await;
        let mut rx2 = channel.open("s2").await;
        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();

        channel
            .publish("s1", ProgressEvent::progress(Stage::Discovery, "x", 5, vec![]))
            .await;

        assert_eq!(rx1.recv().await.unwrap().progress, 5);
        assert!(rx2.try_recv().is_err());
    }
}
