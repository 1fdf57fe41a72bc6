//! Job runner: asynchronous execution of events through the action registry.
//!
//! Each submitted event becomes a job keyed by its correlation id. Jobs run
//! on spawned tasks, bounded by a semaphore, and report their lifecycle on
//! the event bus. Only the most recent finished jobs are retained; older
//! ones are forgotten and report `JobNotFound`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use inspect_domain::{ActionResult, CorrelationId, Event};
use inspect_exec::ActionRegistry;

use crate::error::{DaemonError, DaemonResult};
use crate::event_bus::{DaemonEvent, EventBus, JobCompletion};

// =============================================================================
// Job Status
// =============================================================================

/// Tracked state of a submitted job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker slot
    Queued,
    /// Action is running
    InProgress,
    /// Action returned an envelope
    Completed { result: ActionResult },
    /// Action failed; no retry is attempted
    Failed {
        error_type: String,
        error_message: String,
    },
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}

/// Default number of finished jobs kept for status queries.
pub const DEFAULT_RETAINED_JOBS: usize = 10_000;

#[derive(Default)]
struct JobTable {
    statuses: HashMap<CorrelationId, JobStatus>,
    /// Terminal jobs, oldest first
    finished: VecDeque<CorrelationId>,
}

type SharedJobs = Arc<RwLock<JobTable>>;

// =============================================================================
// Job Runner
// =============================================================================

/// Runs events in the background and tracks their status.
pub struct JobRunner {
    registry: Arc<ActionRegistry>,
    event_bus: Arc<EventBus>,
    permits: Arc<Semaphore>,
    jobs: SharedJobs,
    retained_jobs: usize,
    cancel_token: CancellationToken,
}

impl JobRunner {
    /// Create a runner allowing at most `max_concurrent_jobs` actions at once.
    pub fn new(
        registry: Arc<ActionRegistry>,
        event_bus: Arc<EventBus>,
        max_concurrent_jobs: usize,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            event_bus,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.min(Semaphore::MAX_PERMITS))),
            jobs: Arc::new(RwLock::new(JobTable::default())),
            retained_jobs: DEFAULT_RETAINED_JOBS,
            cancel_token,
        }
    }

    /// Keep at most `limit` finished jobs, forgetting the oldest first.
    pub fn with_retention(mut self, limit: usize) -> Self {
        self.retained_jobs = limit.max(1);
        self
    }

    /// The registry jobs are dispatched through.
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Queue `event` under `id` and start it in the background.
    ///
    /// The returned handle resolves once the job reaches a terminal state.
    pub async fn submit(&self, id: CorrelationId, event: Event) -> DaemonResult<JoinHandle<()>> {
        if self.is_shutdown() {
            return Err(DaemonError::Shutdown);
        }

        {
            let mut jobs = self.jobs.write().await;
            if jobs.statuses.contains_key(&id) {
                warn!(%id, "Rejecting duplicate job");
                return Err(DaemonError::DuplicateJob(id));
            }
            jobs.statuses.insert(id.clone(), JobStatus::Queued);
        }

        info!(%id, event_type = %event.event_type(), "Job queued");
        self.event_bus.send(DaemonEvent::JobSubmitted {
            id: id.clone(),
            event: event.clone(),
            timestamp: Utc::now(),
        });

        let registry = self.registry.clone();
        let event_bus = self.event_bus.clone();
        let permits = self.permits.clone();
        let jobs = self.jobs.clone();
        let cancel_token = self.cancel_token.clone();
        let retained_jobs = self.retained_jobs;

        Ok(tokio::spawn(async move {
            let status = tokio::select! {
                permit = permits.acquire_owned() => match permit {
                    Ok(_permit) => {
                        set_status(&jobs, &id, JobStatus::InProgress).await;
                        event_bus.send(DaemonEvent::JobStarted {
                            id: id.clone(),
                            event_type: event.event_type(),
                            timestamp: Utc::now(),
                        });
                        debug!(%id, "Job started");

                        match registry.dispatch(&event, &id).await {
                            Ok(result) => JobStatus::Completed { result },
                            Err(e) => JobStatus::Failed {
                                error_type: e.kind().to_string(),
                                error_message: e.to_string(),
                            },
                        }
                    },
                    Err(_) => shutdown_status(),
                },
                _ = cancel_token.cancelled() => shutdown_status(),
            };

            match &status {
                JobStatus::Completed { .. } => info!(%id, "Job completed"),
                JobStatus::Failed { error_type, error_message } => {
                    warn!(%id, %error_type, %error_message, "Job failed")
                },
                _ => {},
            }

            finish(&jobs, &id, status.clone(), retained_jobs).await;
            event_bus.send(DaemonEvent::JobCompleted(JobCompletion {
                id,
                event_type: event.event_type(),
                status,
                timestamp: Utc::now(),
            }));
        }))
    }

    /// Current status of job `id`.
    pub async fn status(&self, id: &CorrelationId) -> DaemonResult<JobStatus> {
        self.jobs
            .read()
            .await
            .statuses
            .get(id)
            .cloned()
            .ok_or_else(|| DaemonError::JobNotFound(id.clone()))
    }

    /// Number of jobs that have not yet reached a terminal state.
    pub async fn pending_count(&self) -> usize {
        self.jobs.read().await.statuses.values().filter(|s| !s.is_terminal()).count()
    }

    /// Number of jobs whose status can still be queried.
    pub async fn tracked_count(&self) -> usize {
        self.jobs.read().await.statuses.len()
    }

    /// Stop accepting jobs and abandon those still waiting for a slot.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

async fn set_status(jobs: &SharedJobs, id: &CorrelationId, status: JobStatus) {
    jobs.write().await.statuses.insert(id.clone(), status);
}

async fn finish(jobs: &SharedJobs, id: &CorrelationId, status: JobStatus, retained_jobs: usize) {
    let mut jobs = jobs.write().await;
    jobs.statuses.insert(id.clone(), status);
    jobs.finished.push_back(id.clone());

    while jobs.finished.len() > retained_jobs {
        if let Some(expired) = jobs.finished.pop_front() {
            jobs.statuses.remove(&expired);
            debug!(id = %expired, "Forgot finished job");
        }
    }
}

fn shutdown_status() -> JobStatus {
    JobStatus::Failed {
        error_type: DaemonError::Shutdown.kind().to_string(),
        error_message: DaemonError::Shutdown.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
