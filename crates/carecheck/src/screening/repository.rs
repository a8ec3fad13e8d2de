use serde::{Deserialize, Serialize};

use super::session::{AssessmentRun, ChatMessage, RunId, Step};
use super::views::StepView;

/// Stored unit: a run plus the identifier it is addressed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub run_id: RunId,
    pub run: AssessmentRun,
}

impl SessionRecord {
    pub fn status_view(&self) -> RunStatusView {
        RunStatusView {
            run_id: self.run_id.clone(),
            step: self.run.step,
            step_code: self.run.step.code(),
            halted: self.run.halted.clone(),
            view: StepView::current(&self.run).ok(),
            history: self.run.chat_history().cloned().collect(),
        }
    }
}

/// Storage abstraction so the service can be exercised without a backend.
pub trait SessionStore: Send + Sync {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError>;
    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RunId) -> Result<Option<SessionRecord>, RepositoryError>;
    fn remove(&self, id: &RunId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("run already exists")]
    Conflict,
    #[error("run not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatusView {
    pub run_id: RunId,
    pub step: Step,
    pub step_code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<StepView>,
    pub history: Vec<ChatMessage>,
}
