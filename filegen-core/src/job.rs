//! Mock Job Runner - One Pending Job, Ticketed Completion
//!
//! State machine: Idle -> Pending -> Complete -> Idle.
//!
//! Every start or dismissal bumps the slot's epoch. The timer task carries
//! the epoch it was started with as its ticket and only completes the job
//! if the ticket still matches, checked under the same lock as the state.
//! A timer that outlives its job is therefore inert even if the abort
//! arrives too late.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DEFAULT_GENERATION_LATENCY_MS;
use crate::hashing::compute_request_hash;
use crate::input::{can_submit, GenerationRequest};
use crate::synth::{self, SynthesizedArtifact};
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Pending,
    Complete,
}

/// Why a start was refused. Not an error: the caller's UI should not
/// have offered the action in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    InvalidRequest,
    ConcurrentJob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(Uuid),
    Rejected(Rejection),
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, StartOutcome::Started(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: Uuid,
    pub request: GenerationRequest,
    pub request_hash: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket(u64);

#[derive(Debug)]
struct Slot {
    state: JobState,
    epoch: u64,
    job: Option<JobInfo>,
    artifact: Option<SynthesizedArtifact>,
    timer: Option<JoinHandle<()>>,
}

impl Slot {
    /// Invalidate any outstanding ticket and stop its timer.
    fn invalidate(&mut self) {
        self.epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Debug)]
struct Shared {
    slot: Mutex<Slot>,
    state_tx: watch::Sender<JobState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, slot: &mut Slot, state: JobState) {
        slot.state = state;
        self.state_tx.send_replace(state);
    }

    /// Timer callback. Returns whether the ticket was still current.
    fn complete(&self, ticket: Ticket) -> bool {
        let mut slot = self.lock();
        if slot.epoch != ticket.0 || slot.state != JobState::Pending {
            debug!(ticket = ticket.0, epoch = slot.epoch, "stale timer ignored");
            return false;
        }

        let Some(job) = slot.job.as_mut() else {
            return false;
        };
        job.completed_at = Some(Utc::now());
        let job_id = job.id;
        let artifact = synth::render(job.request.profile, &job.request.label_text());

        info!(
            job = %job_id,
            file = %artifact.suggested_file_name,
            hash = %artifact.content_hash,
            "generation complete"
        );

        slot.artifact = Some(artifact);
        slot.timer = None;
        self.set_state(&mut slot, JobState::Complete);
        true
    }
}

/// Runs at most one simulated generation job at a time.
#[derive(Debug)]
pub struct JobRunner {
    shared: Arc<Shared>,
    latency: Duration,
}

impl JobRunner {
    pub fn new(latency: Duration) -> Self {
        let (state_tx, _) = watch::channel(JobState::Idle);
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    state: JobState::Idle,
                    epoch: 0,
                    job: None,
                    artifact: None,
                    timer: None,
                }),
                state_tx,
            }),
            latency,
        }
    }

    pub fn state(&self) -> JobState {
        self.shared.lock().state
    }

    /// Receiver of state changes, starting at the current state.
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.shared.state_tx.subscribe()
    }

    pub fn active_job(&self) -> Option<JobInfo> {
        self.shared.lock().job.clone()
    }

    /// The artifact of the completed job, if the runner is Complete.
    pub fn artifact(&self) -> Option<SynthesizedArtifact> {
        self.shared.lock().artifact.clone()
    }

    /// Start a job for `request`.
    ///
    /// Empty requests and starts while Pending are refused without side
    /// effects. Starting from Complete discards the previous result.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, request: GenerationRequest) -> StartOutcome {
        if !can_submit(&request) {
            debug!(mode = ?request.mode, "start refused: empty request");
            return StartOutcome::Rejected(Rejection::InvalidRequest);
        }

        let mut slot = self.shared.lock();
        if slot.state == JobState::Pending {
            debug!("start refused: a job is already pending");
            return StartOutcome::Rejected(Rejection::ConcurrentJob);
        }

        slot.invalidate();
        slot.artifact = None;
        let ticket = Ticket(slot.epoch);

        let job = JobInfo {
            id: Uuid::new_v4(),
            request_hash: compute_request_hash(&request, ENGINE_VERSION)
                .map_err(|e| warn!("request fingerprint unavailable: {}", e))
                .ok(),
            request,
            started_at: Utc::now(),
            completed_at: None,
        };
        let job_id = job.id;

        info!(
            job = %job_id,
            profile = %job.request.profile,
            mode = ?job.request.mode,
            request_hash = job.request_hash.as_deref().unwrap_or("-"),
            latency_ms = u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX),
            "generation started"
        );

        slot.job = Some(job);
        self.shared.set_state(&mut slot, JobState::Pending);

        let shared = Arc::clone(&self.shared);
        let latency = self.latency;
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            shared.complete(ticket);
        }));

        StartOutcome::Started(job_id)
    }

    /// Abandon a Pending job. Returns false if nothing was pending.
    pub fn cancel(&self) -> bool {
        let mut slot = self.shared.lock();
        if slot.state != JobState::Pending {
            return false;
        }
        self.reset(&mut slot);
        info!("generation cancelled");
        true
    }

    /// Return to Idle from Pending or Complete, dropping any result.
    pub fn dismiss(&self) -> bool {
        let mut slot = self.shared.lock();
        if slot.state == JobState::Idle {
            return false;
        }
        self.reset(&mut slot);
        debug!("job dismissed");
        true
    }

    fn reset(&self, slot: &mut Slot) {
        slot.invalidate();
        slot.job = None;
        slot.artifact = None;
        self.shared.set_state(slot, JobState::Idle);
    }

    /// Wait until the runner is not Pending and return the state it settled in.
    pub async fn wait_until_settled(&self) -> JobState {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|state| *state != JobState::Pending).await.map(|state| *state);
        settled.unwrap_or_else(|_| self.state())
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_GENERATION_LATENCY_MS))
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        self.shared.lock().invalidate();
    }
}
