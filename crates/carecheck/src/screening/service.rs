use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::error::ScreeningError;
use super::machine::{Rejection, ScreeningEvent, ScreeningMachine, Transition};
use super::repository::{RepositoryError, SessionRecord, SessionStore};
use super::session::{AssessmentRun, RunId, Step};
use super::views::StepView;
use crate::collaborators::{Responder, ResponseGenerator};

/// Service composing the state machine with a session store.
pub struct ScreeningService<S, G> {
    store: Arc<S>,
    machine: ScreeningMachine<G>,
    in_flight: Mutex<HashSet<RunId>>,
}

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_run_id() -> RunId {
    let id = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RunId(format!("run-{id:06}"))
}

/// What a client sees after each call: where the run is and what to render.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReply {
    pub run_id: RunId,
    pub step: Step,
    pub step_code: u8,
    pub view: StepView,
}

impl ScreeningReply {
    fn new(run_id: RunId, run: &AssessmentRun, view: StepView) -> Self {
        Self {
            run_id,
            step: run.step,
            step_code: run.step.code(),
            view,
        }
    }
}

impl<S, G> ScreeningService<S, G>
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    pub fn new(store: Arc<S>, responder: Responder<G>) -> Self {
        Self {
            store,
            machine: ScreeningMachine::new(responder),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Open a run and greet it, leaving it at the selection step.
    pub async fn create(&self) -> Result<ScreeningReply, ScreeningServiceError> {
        let Transition { run, view } = self
            .machine
            .handle(AssessmentRun::new(), ScreeningEvent::Start)
            .await
            .map_err(|rejection| rejection.error)?;

        let run_id = next_run_id();
        let stored = self.store.insert(SessionRecord {
            run_id: run_id.clone(),
            run,
        })?;
        tracing::info!(run_id = %run_id, "screening run created");
        Ok(ScreeningReply::new(stored.run_id, &stored.run, view))
    }

    /// Apply one event to a stored run and persist the outcome. Rejected
    /// events are persisted too so a halted run stays halted.
    pub async fn dispatch(
        &self,
        run_id: &RunId,
        event: ScreeningEvent,
    ) -> Result<ScreeningReply, ScreeningServiceError> {
        let _claim = self.claim(run_id)?;

        let record = self
            .store
            .fetch(run_id)?
            .ok_or(RepositoryError::NotFound)?;

        match self.machine.handle(record.run, event).await {
            Ok(Transition { run, view }) => {
                let reply = ScreeningReply::new(run_id.clone(), &run, view);
                self.store.update(SessionRecord {
                    run_id: run_id.clone(),
                    run,
                })?;
                Ok(reply)
            }
            Err(Rejection { run, error }) => {
                self.store.update(SessionRecord {
                    run_id: run_id.clone(),
                    run: *run,
                })?;
                Err(error.into())
            }
        }
    }

    pub fn get(&self, run_id: &RunId) -> Result<SessionRecord, ScreeningServiceError> {
        let record = self
            .store
            .fetch(run_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn remove(&self, run_id: &RunId) -> Result<(), ScreeningServiceError> {
        let _claim = self.claim(run_id)?;
        self.store.remove(run_id)?;
        tracing::info!(run_id = %run_id, "screening run removed");
        Ok(())
    }

    fn claim(&self, run_id: &RunId) -> Result<InFlight<'_>, ScreeningServiceError> {
        let mut active = self
            .in_flight
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-flight registry poisoned".to_string()))?;
        if !active.insert(run_id.clone()) {
            tracing::warn!(run_id = %run_id, "event rejected while another is in flight");
            return Err(ScreeningServiceError::Busy(run_id.clone()));
        }
        Ok(InFlight {
            registry: &self.in_flight,
            run_id: run_id.clone(),
        })
    }
}

/// Releases the run's in-flight slot when dropped.
struct InFlight<'a> {
    registry: &'a Mutex<HashSet<RunId>>,
    run_id: RunId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.registry.lock() {
            active.remove(&self.run_id);
        }
    }
}

/// Error raised by the screening service.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Screening(#[from] ScreeningError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("run {0} is already processing an event")]
    Busy(RunId),
}

impl ScreeningServiceError {
    /// True when the run can no longer progress without a reset.
    pub fn halts_run(&self) -> bool {
        match self {
            ScreeningServiceError::Screening(error) => {
                error.is_fatal() || matches!(error, ScreeningError::RunHalted(_))
            }
            _ => false,
        }
    }
}
