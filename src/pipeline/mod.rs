//! Pipeline driver.
//!
//! Executes the four-step remote sequence that turns a user instruction into
//! a new image version: analyze → plan → fetch knowledge → inpaint. Steps are
//! strictly sequential; each boundary writes an optimistic stage/progress
//! update so the UI reacts even when the status stream is disconnected. The
//! stream remains authoritative for terminal states and may override any of
//! these writes (last write wins).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::DesignApi;
use crate::api::models::Version;
use crate::errors::PipelineError;
use crate::session::{COMPLETION_LINGER, Session, Stage};

/// Outcome of a submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The full pipeline ran; the produced version is already recorded in
    /// the session history.
    Completed(Version),
    /// No image has been uploaded yet; nothing was submitted.
    NoImage,
    /// Another edit is still in flight; nothing was submitted.
    Busy,
}

/// Drives one edit request end to end against a [`DesignApi`].
pub struct PipelineDriver<A: DesignApi> {
    api: Arc<A>,
    session: Arc<Session>,
}

impl<A: DesignApi> PipelineDriver<A> {
    pub fn new(api: Arc<A>, session: Arc<Session>) -> Self {
        Self { api, session }
    }

    /// Submit a natural-language edit instruction.
    ///
    /// No-op unless an image is bound and no other edit is processing. On
    /// any aborting failure the remaining steps are never issued and the
    /// session resets to idle immediately; on success the completed state
    /// lingers for [`COMPLETION_LINGER`] before the reset.
    pub async fn submit_edit(&self, prompt: &str) -> Result<SubmitOutcome, PipelineError> {
        let Some(image_id) = self.session.image_id() else {
            debug!("edit submitted without an uploaded image, ignoring");
            return Ok(SubmitOutcome::NoImage);
        };
        if !self.session.begin_processing(Stage::Planning, 10) {
            debug!("edit already in flight, ignoring submission");
            return Ok(SubmitOutcome::Busy);
        }

        match self.run_steps(prompt, &image_id).await {
            Ok(version) => {
                self.session.update_status(|s| {
                    s.progress = 100;
                    s.stage = None;
                });
                tokio::time::sleep(COMPLETION_LINGER).await;
                self.session.update_status(|s| {
                    s.processing = false;
                    s.progress = 0;
                });
                Ok(SubmitOutcome::Completed(version))
            }
            Err(err) => {
                self.session.update_status(|s| {
                    s.stage = None;
                    s.processing = false;
                    s.progress = 0;
                });
                Err(err)
            }
        }
    }

    async fn run_steps(&self, prompt: &str, image_id: &str) -> Result<Version, PipelineError> {
        let project_id = self.session.project_id();
        let project = project_id.as_deref();

        // Step 1: scene analysis. The payload is only forwarded server-side;
        // the call still gates the rest of the pipeline.
        self.set_step(Stage::Analyzing, 20);
        self.api
            .analyze_scene(image_id)
            .await
            .map_err(PipelineError::Analyze)?;

        // Step 2: edit plan, consumed by step 4.
        self.set_step(Stage::Planning, 40);
        let plan = self
            .api
            .plan_edits(prompt, image_id, project)
            .await
            .map_err(PipelineError::Plan)?;

        // Step 3: design knowledge. Best-effort enrichment; awaited so step
        // ordering stays strict, but failure never aborts the run.
        self.set_step(Stage::Fetching, 60);
        if let Err(err) = self
            .api
            .fetch_design_knowledge(prompt, image_id, project)
            .await
        {
            warn!(%err, "design knowledge fetch failed, continuing");
        }

        // Step 4: render.
        self.set_step(Stage::Editing, 80);
        let version = self
            .api
            .run_inpainting(image_id, &plan, project, self.session.client_id())
            .await
            .map_err(PipelineError::Inpaint)?;

        Ok(self.session.record_result(version, prompt, Some(plan)))
    }

    fn set_step(&self, stage: Stage, progress: u8) {
        self.session.update_status(|s| {
            s.stage = Some(stage);
            s.progress = progress;
        });
    }
}
