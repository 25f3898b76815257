use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session::PipelineStatus;

/// Terminal UI for an in-flight edit, rendered via an `indicatif` bar.
///
/// The bar is fed from the session's status watch channel, so it reflects
/// whichever writer updated state last — the pipeline driver's optimistic
/// step updates or the status stream's server-pushed progress.
pub struct EditProgress {
    bar: ProgressBar,
}

impl EditProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}% {msg}")
                .expect("progress bar template is a valid static string")
                .progress_chars("█▓▒░"),
        );
        bar.set_prefix("Edit");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Render one status snapshot.
    pub fn render(&self, status: &PipelineStatus) {
        self.bar.set_position(u64::from(status.progress));
        match status.stage {
            Some(stage) => self.bar.set_message(style(stage.label()).yellow().to_string()),
            None if status.processing => {
                self.bar.set_message(style("Finishing up").dim().to_string())
            }
            None => self.bar.set_message(String::new()),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Follow a status channel until the session returns to idle after
    /// having been busy. Returns a handle the caller awaits once the edit
    /// resolves.
    pub fn watch(self, mut rx: watch::Receiver<PipelineStatus>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut was_processing = false;
            loop {
                let status = *rx.borrow_and_update();
                self.render(&status);
                if was_processing && !status.processing {
                    break;
                }
                was_processing = was_processing || status.processing;
                if rx.changed().await.is_err() {
                    break;
                }
            }
            self.finish();
        })
    }
}

impl Default for EditProgress {
    fn default() -> Self {
        Self::new()
    }
}
