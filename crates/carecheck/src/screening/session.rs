use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{questions, AnswerChoice, TestId, TestSelection};
use super::error::ScreeningError;
use super::scoring::ScreeningResult;

/// Identifier wrapper for an assessment run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub String);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Step tag for the screening dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    Selection,
    Screening,
    Results,
    Dashboard,
    Crisis,
}

impl Step {
    pub const fn code(self) -> u8 {
        match self {
            Step::Welcome => 0,
            Step::Selection => 1,
            Step::Screening => 2,
            Step::Results => 3,
            Step::Dashboard => 4,
            Step::Crisis => 99,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::Selection => "selection",
            Step::Screening => "screening",
            Step::Results => "results",
            Step::Dashboard => "dashboard",
            Step::Crisis => "crisis",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Entry in the run's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Screening prompts are shown inline rather than in the chat history.
    #[serde(default)]
    pub screening: bool,
}

/// Ordered list of tests administered by "all three" mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQueue {
    pub tests: Vec<TestId>,
    pub current_index: usize,
}

impl TestQueue {
    pub fn current(&self) -> Option<TestId> {
        self.tests.get(self.current_index).copied()
    }

    pub fn has_remaining(&self) -> bool {
        self.current_index + 1 < self.tests.len()
    }
}

/// The mutable unit of work for one user's screening session.
///
/// Answers accumulate in question order for the active test only; they are
/// cleared whenever the next test begins and the whole run is replaced on
/// reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRun {
    pub step: Step,
    pub active_test: Option<TestId>,
    pub queue: Option<TestQueue>,
    pub answers: Vec<AnswerChoice>,
    pub results: BTreeMap<TestId, ScreeningResult>,
    pub messages: Vec<ChatMessage>,
    pub halted: Option<String>,
}

impl Default for AssessmentRun {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentRun {
    pub fn new() -> Self {
        Self {
            step: Step::Welcome,
            active_test: None,
            queue: None,
            answers: Vec::new(),
            results: BTreeMap::new(),
            messages: Vec::new(),
            halted: None,
        }
    }

    /// Tear the run down and start over at the welcome step.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Apply an explicit selection, replacing any previous queue.
    pub fn select(&mut self, selection: TestSelection) {
        match selection {
            TestSelection::Single(test) => {
                self.queue = None;
                self.active_test = Some(test);
            }
            TestSelection::AllThree => {
                let queue = TestQueue {
                    tests: TestId::ALL.to_vec(),
                    current_index: 0,
                };
                self.active_test = queue.current();
                self.queue = Some(queue);
            }
        }
        self.answers.clear();
    }

    /// Re-read the active test from the queue when one is in play.
    pub fn sync_active_test(&mut self) {
        if let Some(current) = self.queue.as_ref().and_then(TestQueue::current) {
            self.active_test = Some(current);
        }
    }

    pub fn has_queued_tests(&self) -> bool {
        self.queue.as_ref().is_some_and(TestQueue::has_remaining)
    }

    /// Move the queue to its next test and clear the answer list. Returns the
    /// new active test, or `None` when the queue is exhausted.
    pub fn advance_queue(&mut self) -> Option<TestId> {
        let queue = self.queue.as_mut()?;
        if !queue.has_remaining() {
            return None;
        }
        queue.current_index += 1;
        self.answers.clear();
        self.active_test = queue.current();
        self.active_test
    }

    pub fn active_questions(&self) -> Result<&'static [&'static str], ScreeningError> {
        self.active_test
            .map(questions)
            .ok_or_else(|| ScreeningError::UnknownTest("no active test".to_string()))
    }

    pub fn answers_complete(&self) -> Result<bool, ScreeningError> {
        Ok(self.answers.len() >= self.active_questions()?.len())
    }

    /// Append one answer, refusing once the active test has a full set.
    pub fn record_answer(&mut self, choice: AnswerChoice) -> Result<(), ScreeningError> {
        if self.answers_complete()? {
            return Err(ScreeningError::InvalidEvent {
                step: self.step,
                event: "answer",
            });
        }
        self.answers.push(choice);
        Ok(())
    }

    /// Store a completed result. A result already recorded for the same test
    /// is kept as is.
    pub fn store_result(&mut self, result: ScreeningResult) -> &ScreeningResult {
        self.results.entry(result.test).or_insert(result)
    }

    pub fn latest_result(&self) -> Result<&ScreeningResult, ScreeningError> {
        let test = self
            .active_test
            .ok_or_else(|| ScreeningError::UnknownTest("no active test".to_string()))?;
        self.results
            .get(&test)
            .ok_or(ScreeningError::MissingResult(test))
    }

    pub fn log(&mut self, role: Role, content: impl Into<String>, screening: bool) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            screening,
        });
    }

    /// Chat history shown to the user, omitting inline screening prompts.
    pub fn chat_history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|message| !message.screening)
    }
}
