use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{questionnaire, AnswerChoice, TestId};
use super::error::ScreeningError;

/// Scored outcome for one completed questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub test: TestId,
    pub total: u16,
    pub max_score: u16,
    pub label: String,
}

impl ScreeningResult {
    /// Human-readable form, e.g. `Severe depression (20/27)`.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScreeningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.label, self.total, self.max_score)
    }
}

/// Score a complete answer sequence for `test`.
pub fn score(test: TestId, answers: &[AnswerChoice]) -> Result<ScreeningResult, ScreeningError> {
    let definition = questionnaire(test);

    if answers.len() != definition.questions.len() {
        return Err(ScreeningError::IncompleteAnswers {
            test,
            expected: definition.questions.len(),
            actual: answers.len(),
        });
    }

    let raw: u16 = answers.iter().map(|answer| answer.value()).sum();
    let total = raw * definition.multiplier;

    let label = definition
        .bands
        .iter()
        .find(|band| total <= band.upper_bound)
        .map(|band| band.label)
        .ok_or_else(|| ScreeningError::UnknownTest(test.code().to_string()))?;

    Ok(ScreeningResult {
        test,
        total,
        max_score: definition.max_score(),
        label: label.to_string(),
    })
}
