use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::collaborators::{CollaboratorError, Responder, ResponseGenerator};
use crate::screening::catalog::AnswerChoice;
use crate::screening::machine::{ScreeningEvent, ScreeningMachine, Transition};
use crate::screening::repository::{RepositoryError, SessionRecord, SessionStore};
use crate::screening::service::ScreeningService;
use crate::screening::session::{AssessmentRun, RunId};

pub(super) const SCRIPTED_REPLY: &str = "That sounds hard. Thank you for sharing.";

/// Generator that always answers with the same line.
#[derive(Clone)]
pub(super) struct ScriptedGenerator;

#[async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        Ok(SCRIPTED_REPLY.to_string())
    }
}

pub(super) struct FailingGenerator;

#[async_trait]
impl ResponseGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("model offline".to_string()))
    }
}

/// Generator that holds the call open long enough for a second event to
/// arrive while the first is in flight.
pub(super) struct SlowGenerator;

#[async_trait]
impl ResponseGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(SCRIPTED_REPLY.to_string())
    }
}

pub(super) fn machine() -> ScreeningMachine<ScriptedGenerator> {
    ScreeningMachine::new(Responder::new(ScriptedGenerator, Duration::from_secs(1)))
}

pub(super) fn machine_with<G: ResponseGenerator>(generator: G) -> ScreeningMachine<G> {
    ScreeningMachine::new(Responder::new(generator, Duration::from_secs(1)))
}

/// Apply an event that is expected to succeed.
pub(super) async fn step<G: ResponseGenerator>(
    machine: &ScreeningMachine<G>,
    run: AssessmentRun,
    event: ScreeningEvent,
) -> Transition {
    let name = event.name();
    match machine.handle(run, event).await {
        Ok(transition) => transition,
        Err(rejection) => panic!("{name} rejected: {:?}", rejection.error),
    }
}

/// Greeted run waiting at the selection step.
pub(super) async fn greeted<G: ResponseGenerator>(machine: &ScreeningMachine<G>) -> AssessmentRun {
    step(machine, AssessmentRun::new(), ScreeningEvent::Start)
        .await
        .run
}

/// Answer `count` questions with the same choice, returning the last transition.
pub(super) async fn answer_all<G: ResponseGenerator>(
    machine: &ScreeningMachine<G>,
    mut run: AssessmentRun,
    choice: AnswerChoice,
    count: usize,
) -> Transition {
    assert!(count > 0, "at least one answer");
    for _ in 1..count {
        run = step(machine, run, ScreeningEvent::answer(choice)).await.run;
    }
    step(machine, run, ScreeningEvent::answer(choice)).await
}

pub(super) fn build_service() -> (
    ScreeningService<MemoryStore, ScriptedGenerator>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::default());
    let service = ScreeningService::new(
        store.clone(),
        Responder::new(ScriptedGenerator, Duration::from_secs(1)),
    );
    (service, store)
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<HashMap<RunId, SessionRecord>>>,
}

impl SessionStore for MemoryStore {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.run_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.run_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(record.run_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &RunId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &RunId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn insert(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: SessionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RunId) -> Result<Option<SessionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &RunId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
