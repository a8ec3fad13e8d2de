//! The screening dialogue: questionnaire catalog, scoring, keyword
//! classification, risk routing, and the step machine that ties them to a
//! single user's run.

pub mod catalog;
pub mod classifier;
pub mod crisis;
pub mod error;
pub mod machine;
pub mod report;
pub mod repository;
pub mod risk;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;
pub mod slider;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::{
    AnswerChoice, Questionnaire, SliderForm, SliderInventory, TestId, TestSelection,
    SLIDER_DEFAULT, SLIDER_ITEM_COUNT, SLIDER_MAX,
};
pub use classifier::{classify, is_crisis, KeywordCounts, SymptomSignal};
pub use crisis::{crisis_protocol, CrisisProtocol};
pub use error::ScreeningError;
pub use machine::{Rejection, ScreeningEvent, ScreeningMachine, Transition};
pub use report::{ScreeningReport, REPORT_FILE_NAME};
pub use repository::{RepositoryError, RunStatusView, SessionRecord, SessionStore};
pub use risk::RiskTier;
pub use router::screening_router;
pub use scoring::{score, ScreeningResult};
pub use service::{ScreeningReply, ScreeningService, ScreeningServiceError};
pub use session::{AssessmentRun, ChatMessage, Role, RunId, Step};
pub use slider::{SliderAssessment, SliderOutcome};
pub use views::StepView;
