//! Shared session state for one editing session.
//!
//! The `{stage, progress, processing}` triple is written by two independent
//! subsystems: the pipeline driver (optimistic per-step updates) and the
//! status-stream reconciler (authoritative server-pushed updates). Writes are
//! serialized through the watch channel and the last write wins; there is no
//! sequencing token. The version history and the bound image/project ids are
//! the only other shared mutable state.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::api::models::{EditPlan, Version};

/// How long the completed state lingers before the session returns to idle.
/// Purely so observers can show 100% briefly; not a correctness requirement.
pub const COMPLETION_LINGER: Duration = Duration::from_millis(1000);

/// The pipeline phase currently shown to the user. `None` in
/// [`PipelineStatus::stage`] means no edit is in flight or it has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Uploading,
    Analyzing,
    Planning,
    Fetching,
    Editing,
}

impl Stage {
    /// Human-readable label for progress display.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Uploading => "Uploading image",
            Stage::Analyzing => "Analyzing scene",
            Stage::Planning => "Planning edits",
            Stage::Fetching => "Fetching design knowledge",
            Stage::Editing => "Applying edits",
        }
    }
}

/// The shared status triple both subsystems write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStatus {
    /// `Some` while an edit step or the pre-edit upload runs. The upload is
    /// the one phase shown without claiming `processing`: no edit is in
    /// flight yet, and the busy gate must stay open for the submission that
    /// follows.
    pub stage: Option<Stage>,
    /// Percentage in `[0, 100]`.
    pub progress: u8,
    /// True while an edit is in flight or a completion linger is pending.
    /// Gates new submissions.
    pub processing: bool,
}

impl PipelineStatus {
    /// True when the session is ready to accept a new edit.
    pub fn is_idle(&self) -> bool {
        !self.processing
    }
}

/// Centrally owned state for one editing session. Shared as `Arc<Session>`
/// between the pipeline driver, the status-stream reconciler, and any UI
/// observer.
pub struct Session {
    client_id: String,
    status_tx: watch::Sender<PipelineStatus>,
    image_id: Mutex<Option<String>>,
    project_id: Mutex<Option<String>>,
    versions: Mutex<Vec<Version>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            client_id: format!("client-{}", Uuid::new_v4()),
            status_tx: watch::channel(PipelineStatus::default()).0,
            image_id: Mutex::new(None),
            project_id: Mutex::new(None),
            versions: Mutex::new(Vec::new()),
        }
    }

    /// Opaque identity correlating the push channel with this session's
    /// server-side work. Stable for the session's lifetime.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Current value of the shared status triple.
    pub fn status(&self) -> PipelineStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to status changes. Used by progress UIs.
    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.status_tx.subscribe()
    }

    /// Apply a mutation to the status triple. Each call is one atomic write;
    /// interleaved callers observe last-write-wins.
    pub fn update_status(&self, f: impl FnOnce(&mut PipelineStatus)) {
        self.status_tx.send_modify(f);
    }

    /// Atomically claim the processing flag for a new edit, entering `stage`
    /// at `progress`. Returns `false` without touching the triple when an
    /// edit is already in flight, so concurrent submitters cannot both pass
    /// the busy gate.
    pub fn begin_processing(&self, stage: Stage, progress: u8) -> bool {
        let mut claimed = false;
        self.status_tx.send_if_modified(|s| {
            if s.processing {
                return false;
            }
            s.processing = true;
            s.stage = Some(stage);
            s.progress = progress;
            claimed = true;
            true
        });
        claimed
    }

    /// Bind the uploaded image this session edits.
    pub fn set_image_id(&self, id: impl Into<String>) {
        *self.image_id.lock().expect("session lock poisoned") = Some(id.into());
    }

    pub fn image_id(&self) -> Option<String> {
        self.image_id.lock().expect("session lock poisoned").clone()
    }

    pub fn set_project_id(&self, id: impl Into<String>) {
        *self.project_id.lock().expect("session lock poisoned") = Some(id.into());
    }

    pub fn project_id(&self) -> Option<String> {
        self.project_id.lock().expect("session lock poisoned").clone()
    }

    /// Prepend a produced version. History is most-recent-first and entries
    /// are never mutated after insertion.
    pub fn push_version(&self, version: Version) {
        self.versions
            .lock()
            .expect("session lock poisoned")
            .insert(0, version);
    }

    pub fn versions(&self) -> Vec<Version> {
        self.versions.lock().expect("session lock poisoned").clone()
    }

    /// Merge an inference result with its originating prompt into a history
    /// entry, stamping a creation time when the server didn't provide one.
    /// Returns the entry as recorded.
    pub fn record_result(&self, mut version: Version, prompt: &str, plan: Option<EditPlan>) -> Version {
        version.user_prompt = Some(prompt.to_string());
        if version.edit_plan.is_none() {
            version.edit_plan = plan;
        }
        if version.created_at.is_none() {
            version.created_at = Some(Utc::now());
        }
        self.push_version(version.clone());
        version
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(url: &str) -> Version {
        Version {
            version_id: None,
            image_url: url.to_string(),
            edit_plan: None,
            user_prompt: None,
            created_at: None,
            processing_time: None,
        }
    }

    #[test]
    fn client_id_is_stable_and_prefixed() {
        let session = Session::new();
        let id = session.client_id().to_string();
        assert!(id.starts_with("client-"));
        assert_eq!(session.client_id(), id);
    }

    #[test]
    fn fresh_session_is_idle() {
        let session = Session::new();
        let status = session.status();
        assert_eq!(status.stage, None);
        assert_eq!(status.progress, 0);
        assert!(status.is_idle());
    }

    #[test]
    fn update_status_is_visible_to_subscribers() {
        let session = Session::new();
        let rx = session.subscribe();
        session.update_status(|s| {
            s.stage = Some(Stage::Planning);
            s.progress = 10;
            s.processing = true;
        });
        let seen = *rx.borrow();
        assert_eq!(seen.stage, Some(Stage::Planning));
        assert_eq!(seen.progress, 10);
        assert!(!seen.is_idle());
    }

    #[test]
    fn last_write_wins_between_writers() {
        let session = Session::new();
        // Driver's optimistic write...
        session.update_status(|s| {
            s.stage = Some(Stage::Fetching);
            s.progress = 60;
            s.processing = true;
        });
        // ...overridden by an authoritative stream write.
        session.update_status(|s| {
            s.stage = None;
            s.progress = 100;
        });
        let status = session.status();
        assert_eq!(status.stage, None);
        assert_eq!(status.progress, 100);
        assert!(status.processing);
    }

    #[test]
    fn begin_processing_claims_at_most_once() {
        let session = Session::new();
        assert!(session.begin_processing(Stage::Planning, 10));
        // A second claim loses without disturbing the first writer's state.
        assert!(!session.begin_processing(Stage::Uploading, 0));
        let status = session.status();
        assert_eq!(status.stage, Some(Stage::Planning));
        assert_eq!(status.progress, 10);
        assert!(status.processing);

        session.update_status(|s| *s = PipelineStatus::default());
        assert!(session.begin_processing(Stage::Planning, 10));
    }

    #[test]
    fn versions_are_most_recent_first() {
        let session = Session::new();
        session.push_version(version("https://x/first.png"));
        session.push_version(version("https://x/second.png"));
        let versions = session.versions();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].image_url, "https://x/second.png");
        assert_eq!(versions[1].image_url, "https://x/first.png");
    }

    #[test]
    fn record_result_merges_prompt_and_stamps_time() {
        let session = Session::new();
        session.record_result(version("https://x/edited.png"), "paint the wall teal", None);
        let versions = session.versions();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].user_prompt.as_deref(), Some("paint the wall teal"));
        assert!(versions[0].created_at.is_some());
    }

    #[test]
    fn image_and_project_ids_round_trip() {
        let session = Session::new();
        assert!(session.image_id().is_none());
        session.set_image_id("img1");
        session.set_project_id("proj1");
        assert_eq!(session.image_id().as_deref(), Some("img1"));
        assert_eq!(session.project_id().as_deref(), Some("proj1"));
    }

    #[test]
    fn stage_serializes_lowercase() {
        let json = serde_json::to_string(&Stage::Fetching).unwrap();
        assert_eq!(json, "\"fetching\"");
        let parsed: Stage = serde_json::from_str("\"editing\"").unwrap();
        assert_eq!(parsed, Stage::Editing);
    }
}
