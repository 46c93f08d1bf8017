//! Session - the single state container behind one view
//!
//! Created when the view mounts and dropped when it unmounts. Dropping
//! the session drops its runner, which invalidates any pending timer.

use serde::Serialize;

use crate::config::Config;
use crate::export::{DownloadHost, ExportError, Exporter, SaveReceipt};
use crate::input::InputCollector;
use crate::job::{JobInfo, JobRunner, JobState, StartOutcome};
use crate::profiles::ProfileRegistry;

/// Serializable view of everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub input: InputCollector,
    pub can_submit: bool,
    pub state: JobState,
    pub job: Option<JobInfo>,
    pub artifact_file_name: Option<String>,
    pub download_error: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    registry: ProfileRegistry,
    input: InputCollector,
    runner: JobRunner,
    exporter: Exporter,
    download_error: Option<String>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: ProfileRegistry::builtin(),
            input: InputCollector::new(),
            runner: JobRunner::new(config.generation_latency),
            exporter: Exporter::new(config.export_latency),
            download_error: None,
        }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn input(&self) -> &InputCollector {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputCollector {
        &mut self.input
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub fn state(&self) -> JobState {
        self.runner.state()
    }

    /// Submit the active input. Refusals are silent no-ops.
    pub fn generate(&mut self) -> StartOutcome {
        let outcome = self.runner.start(self.input.request());
        if outcome.is_started() {
            self.download_error = None;
        }
        outcome
    }

    pub async fn wait_until_settled(&self) -> JobState {
        self.runner.wait_until_settled().await
    }

    pub fn dismiss(&mut self) -> bool {
        self.download_error = None;
        self.runner.dismiss()
    }

    /// Export the completed artifact.
    ///
    /// On success the artifact is consumed and the runner returns to Idle.
    /// On failure the artifact is kept so the download can be retried.
    pub async fn download<H: DownloadHost + ?Sized>(
        &mut self,
        host: &H,
    ) -> Result<SaveReceipt, ExportError> {
        let artifact = self.runner.artifact().ok_or(ExportError::NoArtifact)?;

        match self.exporter.export(host, &artifact).await {
            Ok(receipt) => {
                self.download_error = None;
                self.runner.dismiss();
                Ok(receipt)
            }
            Err(e) => {
                self.download_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            input: self.input.clone(),
            can_submit: self.input.can_submit(),
            state: self.runner.state(),
            job: self.runner.active_job(),
            artifact_file_name: self.runner.artifact().map(|a| a.suggested_file_name),
            download_error: self.download_error.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
