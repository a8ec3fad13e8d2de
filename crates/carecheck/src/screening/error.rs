use super::catalog::TestId;
use super::session::Step;

/// Errors raised while a run moves through the screening steps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScreeningError {
    #[error("unknown test identifier '{0}'")]
    UnknownTest(String),
    #[error("{test} needs {expected} answers before scoring, got {actual}")]
    IncompleteAnswers {
        test: TestId,
        expected: usize,
        actual: usize,
    },
    #[error("'{0}' is not an option on the answer scale")]
    UnknownAnswer(String),
    #[error("{event} is not accepted while the run is at {step}")]
    InvalidEvent { step: Step, event: &'static str },
    #[error("run was halted ({0}); reset to start over")]
    RunHalted(String),
    #[error("no result recorded for {0}")]
    MissingResult(TestId),
}

impl ScreeningError {
    /// Fatal errors end the current run; only a reset recovers from them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScreeningError::UnknownTest(_)
                | ScreeningError::IncompleteAnswers { .. }
                | ScreeningError::MissingResult(_)
        )
    }
}
