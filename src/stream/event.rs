//! Inbound status events and their mapping onto session state.
//!
//! The server-side pipeline runs asynchronously and pushes fine-grained
//! progress over the status stream. These events are authoritative for
//! terminal states; they land on the same `{stage, progress, processing}`
//! triple the pipeline driver writes optimistically, last write wins.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::session::{COMPLETION_LINGER, Session, Stage};

/// Top-level status discriminant of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Transcribing,
    Processing,
    Completed,
    Error,
    /// Statuses this client doesn't know; ignored.
    #[serde(other)]
    Unknown,
}

/// One JSON-encoded status event from the push channel.
///
/// Newer servers carry an explicit `stage` field; older ones only hint the
/// stage through human-readable `message` text, which we fall back to
/// matching against known phrases.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEvent {
    pub status: StatusKind,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
}

impl StatusEvent {
    /// The stage a `processing` event maps to: the structured field when
    /// present, else inferred from legacy message text, else `None`
    /// (stage unchanged).
    fn processing_stage(&self) -> Option<Stage> {
        if self.stage.is_some() {
            return self.stage;
        }
        let message = self.message.as_deref()?;
        if message.contains("Planning") {
            Some(Stage::Planning)
        } else if message.contains("design") {
            Some(Stage::Fetching)
        } else if message.contains("AI model") {
            Some(Stage::Editing)
        } else {
            None
        }
    }
}

/// Apply one inbound event to the shared session state.
///
/// Terminal `completed` events linger at 100% for [`COMPLETION_LINGER`]
/// before the session returns to idle; the reset runs on a spawned task so
/// event handling never blocks the receive loop.
pub fn apply_event(session: &Arc<Session>, event: &StatusEvent) {
    match event.status {
        StatusKind::Transcribing => {
            session.update_status(|s| {
                s.stage = Some(Stage::Analyzing);
                s.progress = event.progress.unwrap_or(0);
            });
        }
        StatusKind::Processing => {
            let stage = event.processing_stage();
            session.update_status(|s| {
                if let Some(stage) = stage {
                    s.stage = Some(stage);
                }
                s.progress = event.progress.unwrap_or(0);
            });
        }
        StatusKind::Completed => {
            session.update_status(|s| {
                s.stage = None;
                s.progress = 100;
            });
            let session = Arc::clone(session);
            tokio::spawn(async move {
                tokio::time::sleep(COMPLETION_LINGER).await;
                session.update_status(|s| {
                    s.progress = 0;
                    s.processing = false;
                });
            });
        }
        StatusKind::Error => {
            session.update_status(|s| {
                s.stage = None;
                s.processing = false;
            });
        }
        StatusKind::Unknown => {
            debug!(message = ?event.message, "ignoring unknown status event");
        }
    }
}
