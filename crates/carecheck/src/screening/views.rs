use serde::Serialize;

use super::catalog::{questions, AnswerChoice, TestId, TestSelection};
use super::crisis::{crisis_protocol, CrisisProtocol};
use super::error::ScreeningError;
use super::risk::RiskTier;
use super::scoring::ScreeningResult;
use super::session::{AssessmentRun, Step};

pub const GREETING: &str = "Welcome! I'm your hospital mental health assistant.\n\n\
Tell me how you've been feeling, or choose a screening (PHQ-9, GAD-7 or DASS-21) \
and I'll guide you through it.\n\n\
100% confidential - no data stored.";

const WELCOME_NOTICE: &str = "Ready for a new screening. Send start to begin.";

const NOT_COMPLETED: &str = "Not completed";

/// Selection offered after the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOption {
    pub key: &'static str,
    pub label: &'static str,
}

impl From<TestSelection> for SelectionOption {
    fn from(selection: TestSelection) -> Self {
        let key = match selection {
            TestSelection::Single(test) => test.code(),
            TestSelection::AllThree => "all",
        };
        Self {
            key,
            label: selection.label(),
        }
    }
}

/// One dashboard slot per questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardEntry {
    pub test: TestId,
    pub display_name: &'static str,
    pub summary: String,
}

/// Everything the presentation layer needs to render the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "view")]
pub enum StepView {
    Welcome {
        message: &'static str,
    },
    Greeting {
        message: &'static str,
        options: Vec<SelectionOption>,
    },
    Question {
        test: TestId,
        display_name: &'static str,
        number: usize,
        total: usize,
        prompt: &'static str,
        scale: Vec<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        preface: Option<String>,
    },
    Results {
        result: ScreeningResult,
        summary: String,
        tier: RiskTier,
        guidance: Vec<String>,
    },
    Crisis {
        #[serde(skip_serializing_if = "Option::is_none")]
        preface: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<ScreeningResult>,
        tier: RiskTier,
        guidance: Vec<String>,
        protocol: CrisisProtocol,
    },
    Dashboard {
        entries: Vec<DashboardEntry>,
    },
    Report {
        file_name: &'static str,
        content: String,
    },
}

impl StepView {
    pub fn welcome() -> Self {
        StepView::Welcome {
            message: WELCOME_NOTICE,
        }
    }

    pub fn greeting() -> Self {
        StepView::Greeting {
            message: GREETING,
            options: TestSelection::options()
                .into_iter()
                .map(SelectionOption::from)
                .collect(),
        }
    }

    /// Next unanswered question of the active test.
    pub fn question(run: &AssessmentRun, preface: Option<String>) -> Result<Self, ScreeningError> {
        let test = active_test(run)?;
        let list = questions(test);
        let index = run.answers.len();
        let prompt = *list.get(index).ok_or(ScreeningError::InvalidEvent {
            step: run.step,
            event: "question",
        })?;

        Ok(StepView::Question {
            test,
            display_name: test.display_name(),
            number: index + 1,
            total: list.len(),
            prompt,
            scale: AnswerChoice::labels(),
            preface,
        })
    }

    pub fn results(result: &ScreeningResult) -> Self {
        let tier = RiskTier::from_label(&result.label);
        StepView::Results {
            result: result.clone(),
            summary: result.summary(),
            tier,
            guidance: tier.guidance(),
        }
    }

    pub fn crisis(result: Option<&ScreeningResult>, preface: Option<String>) -> Self {
        let tier = result
            .map(|result| RiskTier::from_label(&result.label))
            .filter(|tier| tier.requires_crisis_protocol())
            .unwrap_or(RiskTier::Crisis);
        StepView::Crisis {
            preface,
            result: result.cloned(),
            tier,
            guidance: tier.guidance(),
            protocol: crisis_protocol(),
        }
    }

    pub fn dashboard(run: &AssessmentRun) -> Self {
        let entries = TestId::ALL
            .into_iter()
            .map(|test| DashboardEntry {
                test,
                display_name: test.display_name(),
                summary: run
                    .results
                    .get(&test)
                    .map(ScreeningResult::summary)
                    .unwrap_or_else(|| NOT_COMPLETED.to_string()),
            })
            .collect();
        StepView::Dashboard { entries }
    }

    /// Render whatever the run's current step shows, without changing it.
    pub fn current(run: &AssessmentRun) -> Result<Self, ScreeningError> {
        match run.step {
            Step::Welcome => Ok(Self::welcome()),
            Step::Selection => Ok(Self::greeting()),
            Step::Screening => Self::question(run, None),
            Step::Results => run.latest_result().map(Self::results),
            Step::Dashboard => Ok(Self::dashboard(run)),
            Step::Crisis => Ok(Self::crisis(run.latest_result().ok(), None)),
        }
    }
}

fn active_test(run: &AssessmentRun) -> Result<TestId, ScreeningError> {
    run.queue
        .as_ref()
        .and_then(|queue| queue.current())
        .or(run.active_test)
        .ok_or_else(|| ScreeningError::UnknownTest("no active test".to_string()))
}
