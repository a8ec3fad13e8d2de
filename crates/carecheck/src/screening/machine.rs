use chrono::Local;
use serde::{Deserialize, Serialize};

use super::catalog::{AnswerChoice, TestSelection};
use super::classifier::{classify, SymptomSignal};
use super::error::ScreeningError;
use super::report::ScreeningReport;
use super::risk::RiskTier;
use super::scoring::score;
use super::session::{AssessmentRun, Role, Step};
use super::views::{StepView, GREETING};
use crate::collaborators::{Responder, ResponseGenerator};

/// One user-triggered input to the dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ScreeningEvent {
    Start,
    SelectTest { test: String },
    FreeText { text: String },
    Answer { choice: String },
    ExportReport,
    OpenDashboard,
    Reset,
}

impl ScreeningEvent {
    pub fn select(selection: TestSelection) -> Self {
        let test = match selection {
            TestSelection::Single(test) => test.code().to_string(),
            TestSelection::AllThree => "all".to_string(),
        };
        ScreeningEvent::SelectTest { test }
    }

    pub fn answer(choice: AnswerChoice) -> Self {
        ScreeningEvent::Answer {
            choice: choice.label().to_string(),
        }
    }

    pub fn free_text(text: impl Into<String>) -> Self {
        ScreeningEvent::FreeText { text: text.into() }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ScreeningEvent::Start => "start",
            ScreeningEvent::SelectTest { .. } => "select_test",
            ScreeningEvent::FreeText { .. } => "free_text",
            ScreeningEvent::Answer { .. } => "answer",
            ScreeningEvent::ExportReport => "export_report",
            ScreeningEvent::OpenDashboard => "open_dashboard",
            ScreeningEvent::Reset => "reset",
        }
    }
}

/// Successful step: the updated run plus what to render next.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub run: AssessmentRun,
    pub view: StepView,
}

/// Refused event. Non-fatal errors hand back the run untouched; fatal ones
/// hand it back halted so only a reset is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub run: Box<AssessmentRun>,
    pub error: ScreeningError,
}

/// Drives an [`AssessmentRun`] through welcome, selection, screening,
/// results, dashboard and crisis.
pub struct ScreeningMachine<G> {
    responder: Responder<G>,
}

impl<G> ScreeningMachine<G>
where
    G: ResponseGenerator,
{
    pub fn new(responder: Responder<G>) -> Self {
        Self { responder }
    }

    /// Apply one event. The run moves in and comes back out; nothing else
    /// holds state between calls.
    pub async fn handle(
        &self,
        mut run: AssessmentRun,
        event: ScreeningEvent,
    ) -> Result<Transition, Rejection> {
        let from = run.step;
        let name = event.name();

        if event == ScreeningEvent::Reset {
            run.reset();
            tracing::info!(from = %from, "screening run reset");
            return Ok(Transition {
                run,
                view: StepView::welcome(),
            });
        }

        if let Some(reason) = run.halted.clone() {
            return Err(Rejection {
                run: Box::new(run),
                error: ScreeningError::RunHalted(reason),
            });
        }

        match self.dispatch(&mut run, event).await {
            Ok(view) => {
                tracing::info!(event = name, from = %from, to = %run.step, "screening transition");
                Ok(Transition { run, view })
            }
            Err(error) => {
                if error.is_fatal() {
                    tracing::error!(event = name, step = %from, %error, "screening run halted");
                    run.halted = Some(error.to_string());
                } else {
                    tracing::debug!(event = name, step = %from, %error, "screening event rejected");
                }
                Err(Rejection {
                    run: Box::new(run),
                    error,
                })
            }
        }
    }

    async fn dispatch(
        &self,
        run: &mut AssessmentRun,
        event: ScreeningEvent,
    ) -> Result<StepView, ScreeningError> {
        match (run.step, event) {
            (Step::Welcome, ScreeningEvent::Start) => Ok(welcome(run)),
            (Step::Selection, ScreeningEvent::SelectTest { test }) => select(run, &test),
            (Step::Selection, ScreeningEvent::FreeText { text }) => {
                self.free_text(run, &text).await
            }
            (Step::Screening, ScreeningEvent::Answer { choice }) => answer(run, &choice),
            (Step::Results, ScreeningEvent::ExportReport) => export_report(run),
            (Step::Results, ScreeningEvent::OpenDashboard) => {
                run.step = Step::Dashboard;
                Ok(StepView::dashboard(run))
            }
            (step, event) => Err(ScreeningError::InvalidEvent {
                step,
                event: event.name(),
            }),
        }
    }

    async fn free_text(
        &self,
        run: &mut AssessmentRun,
        text: &str,
    ) -> Result<StepView, ScreeningError> {
        if text.trim().is_empty() {
            return Err(ScreeningError::InvalidEvent {
                step: run.step,
                event: "free_text",
            });
        }

        // Classification has no external dependency, so it runs before the
        // generator and cannot be skipped by a generator failure.
        let signal = classify(text);
        let reply = self.responder.respond(text).await;
        run.log(Role::User, text, false);

        match signal {
            SymptomSignal::Crisis => {
                tracing::warn!("crisis language detected in free text");
                let guidance = RiskTier::Crisis.guidance().join("\n");
                run.log(Role::Assistant, format!("{reply}\n\n{guidance}"), false);
                run.step = Step::Crisis;
                Ok(StepView::crisis(None, Some(reply)))
            }
            SymptomSignal::Test(test) => {
                run.select(TestSelection::Single(test));
                run.step = Step::Screening;
                let preface = format!("{reply}\n\nSuggested screening: {}", test.display_name());
                let view = StepView::question(run, Some(preface.clone()))?;
                if let StepView::Question {
                    number,
                    total,
                    prompt,
                    ..
                } = &view
                {
                    run.log(
                        Role::Assistant,
                        format!("{preface}\n\nQ{number}/{total}: {prompt}"),
                        true,
                    );
                }
                Ok(view)
            }
        }
    }
}

fn welcome(run: &mut AssessmentRun) -> StepView {
    run.log(Role::Assistant, GREETING, false);
    run.step = Step::Selection;
    StepView::greeting()
}

fn select(run: &mut AssessmentRun, raw: &str) -> Result<StepView, ScreeningError> {
    let selection: TestSelection = raw.parse()?;
    run.select(selection);
    run.step = Step::Screening;
    StepView::question(run, None)
}

fn answer(run: &mut AssessmentRun, raw: &str) -> Result<StepView, ScreeningError> {
    run.sync_active_test();
    let choice: AnswerChoice = raw.parse()?;

    // A full answer list is scored before anything else is accepted.
    if run.answers_complete()? {
        return complete_test(run);
    }

    run.record_answer(choice)?;
    if run.answers_complete()? {
        complete_test(run)
    } else {
        StepView::question(run, None)
    }
}

fn complete_test(run: &mut AssessmentRun) -> Result<StepView, ScreeningError> {
    let test = run
        .active_test
        .ok_or_else(|| ScreeningError::UnknownTest("no active test".to_string()))?;
    let scored = score(test, &run.answers)?;
    let result = run.store_result(scored).clone();
    run.step = Step::Results;

    let tier = RiskTier::from_label(&result.label);
    tracing::info!(%test, total = result.total, label = %result.label, tier = tier.label(), "test scored");
    run.log(Role::Assistant, result.summary(), false);

    if tier.requires_crisis_protocol() {
        run.step = Step::Crisis;
        return Ok(StepView::crisis(Some(&result), None));
    }

    if run.has_queued_tests() {
        let preface = format!(
            "{} complete: {}\n{}",
            test.display_name(),
            result,
            tier.guidance().join("\n")
        );
        if let Some(next) = run.advance_queue() {
            tracing::info!(completed = %test, next = %next, "advancing test queue");
            run.step = Step::Screening;
            return StepView::question(run, Some(preface));
        }
    }

    Ok(StepView::results(&result))
}

fn export_report(run: &AssessmentRun) -> Result<StepView, ScreeningError> {
    let result = run.latest_result()?.clone();
    let report = ScreeningReport::new(result, Local::now());
    Ok(StepView::Report {
        file_name: report.file_name(),
        content: report.render(),
    })
}
