use super::common::*;
use crate::collaborators::FALLBACK_REPLY;
use crate::screening::catalog::{AnswerChoice, TestId, TestSelection};
use crate::screening::error::ScreeningError;
use crate::screening::machine::ScreeningEvent;
use crate::screening::risk::RiskTier;
use crate::screening::session::{AssessmentRun, Role, Step};
use crate::screening::views::StepView;

#[tokio::test]
async fn start_greets_and_moves_to_selection() {
    let machine = machine();
    let transition = step(&machine, AssessmentRun::new(), ScreeningEvent::Start).await;

    assert_eq!(transition.run.step, Step::Selection);
    assert!(matches!(transition.view, StepView::Greeting { .. }));
    assert_eq!(transition.run.messages.len(), 1);
    assert_eq!(transition.run.messages[0].role, Role::Assistant);
}

#[tokio::test]
async fn selecting_a_test_shows_its_first_question() {
    let machine = machine();
    let run = greeted(&machine).await;
    let transition = step(
        &machine,
        run,
        ScreeningEvent::SelectTest {
            test: "phq-9".to_string(),
        },
    )
    .await;

    assert_eq!(transition.run.step, Step::Screening);
    assert_eq!(transition.run.active_test, Some(TestId::Phq9));
    match transition.view {
        StepView::Question {
            test,
            number,
            total,
            scale,
            ..
        } => {
            assert_eq!(test, TestId::Phq9);
            assert_eq!((number, total), (1, 9));
            assert_eq!(scale.len(), 4);
        }
        other => panic!("expected question, got {other:?}"),
    }
}

#[tokio::test]
async fn single_test_with_no_symptoms_reaches_low_risk_results() {
    let machine = machine();
    let run = greeted(&machine).await;
    let run = step(&machine, run, ScreeningEvent::select(TestSelection::Single(TestId::Phq9)))
        .await
        .run;
    let transition = answer_all(&machine, run, AnswerChoice::NotAtAll, 9).await;

    assert_eq!(transition.run.step, Step::Results);
    match transition.view {
        StepView::Results {
            summary,
            tier,
            guidance,
            ..
        } => {
            assert_eq!(summary, "Minimal depression (0/27)");
            assert_eq!(tier, RiskTier::Low);
            assert_eq!(guidance[0], "LOW RISK - continue self-care and monitoring");
        }
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn all_three_mode_runs_each_test_in_order() {
    let machine = machine();
    let run = greeted(&machine).await;
    let run = step(
        &machine,
        run,
        ScreeningEvent::SelectTest {
            test: "all".to_string(),
        },
    )
    .await
    .run;

    let after_phq = answer_all(&machine, run, AnswerChoice::SeveralDays, 9).await;
    assert_eq!(after_phq.run.step, Step::Screening);
    assert_eq!(after_phq.run.active_test, Some(TestId::Gad7));
    assert!(after_phq.run.answers.is_empty());
    match &after_phq.view {
        StepView::Question {
            test,
            number,
            preface,
            ..
        } => {
            assert_eq!(*test, TestId::Gad7);
            assert_eq!(*number, 1);
            let preface = preface.as_deref().expect("previous result shown");
            assert!(preface.contains("Mild depression (9/27)"));
        }
        other => panic!("expected GAD-7 question, got {other:?}"),
    }

    let after_gad = answer_all(&machine, after_phq.run, AnswerChoice::SeveralDays, 7).await;
    assert_eq!(after_gad.run.active_test, Some(TestId::Dass));

    let after_dass = answer_all(&machine, after_gad.run, AnswerChoice::SeveralDays, 7).await;
    assert_eq!(after_dass.run.step, Step::Results);
    let summaries: Vec<_> = after_dass
        .run
        .results
        .values()
        .map(|result| result.summary())
        .collect();
    assert_eq!(
        summaries,
        vec![
            "Mild depression (9/27)",
            "Mild anxiety (7/21)",
            "Normal (14/42)"
        ]
    );

    let dashboard = step(&machine, after_dass.run, ScreeningEvent::OpenDashboard).await;
    assert_eq!(dashboard.run.step, Step::Dashboard);
    match dashboard.view {
        StepView::Dashboard { entries } => assert_eq!(entries.len(), 3),
        other => panic!("expected dashboard, got {other:?}"),
    }
}

#[tokio::test]
async fn severe_result_abandons_queue_for_crisis() {
    let machine = machine();
    let run = greeted(&machine).await;
    let run = step(
        &machine,
        run,
        ScreeningEvent::SelectTest {
            test: "all".to_string(),
        },
    )
    .await
    .run;
    let transition = answer_all(&machine, run, AnswerChoice::NearlyEveryDay, 9).await;

    assert_eq!(transition.run.step, Step::Crisis);
    assert_eq!(transition.run.results.len(), 1);
    match &transition.view {
        StepView::Crisis {
            tier,
            result,
            protocol,
            ..
        } => {
            assert_eq!(*tier, RiskTier::HighSevere);
            assert_eq!(
                result.as_ref().map(|result| result.label.as_str()),
                Some("Severe depression")
            );
            assert_eq!(protocol.headline, "HOSPITAL CRISIS PROTOCOL ACTIVATED");
        }
        other => panic!("expected crisis, got {other:?}"),
    }

    let rejected = machine
        .handle(
            transition.run,
            ScreeningEvent::answer(AnswerChoice::NotAtAll),
        )
        .await
        .expect_err("crisis accepts no answers");
    assert!(matches!(
        rejected.error,
        ScreeningError::InvalidEvent {
            step: Step::Crisis,
            ..
        }
    ));
}

#[tokio::test]
async fn moderately_severe_routes_to_crisis() {
    let machine = machine();
    let run = greeted(&machine).await;
    let mut run = step(&machine, run, ScreeningEvent::select(TestSelection::Single(TestId::Phq9)))
        .await
        .run;
    // 8 x 2 = 16 then a final zero keeps the total at 16.
    for _ in 0..8 {
        run = step(
            &machine,
            run,
            ScreeningEvent::answer(AnswerChoice::MoreThanHalfTheDays),
        )
        .await
        .run;
    }
    let transition = step(&machine, run, ScreeningEvent::answer(AnswerChoice::NotAtAll)).await;

    assert_eq!(transition.run.step, Step::Crisis);
    assert_eq!(
        transition.run.results[&TestId::Phq9].label,
        "Moderately severe depression"
    );
}

#[tokio::test]
async fn free_text_selects_matching_questionnaire() {
    let machine = machine();
    let run = greeted(&machine).await;
    let transition = step(
        &machine,
        run,
        ScreeningEvent::free_text("I'm anxious and nervous all the time"),
    )
    .await;

    assert_eq!(transition.run.step, Step::Screening);
    assert_eq!(transition.run.active_test, Some(TestId::Gad7));
    match &transition.view {
        StepView::Question { preface, .. } => {
            let preface = preface.as_deref().expect("reply shown");
            assert!(preface.starts_with(SCRIPTED_REPLY));
            assert!(preface.contains("GAD-7"));
        }
        other => panic!("expected question, got {other:?}"),
    }

    let history: Vec<_> = transition.run.chat_history().collect();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::User);
    assert!(transition.run.messages.iter().any(|message| message.screening));
}

#[tokio::test]
async fn free_text_without_keywords_defaults_to_phq9() {
    let machine = machine();
    let run = greeted(&machine).await;
    let transition = step(&machine, run, ScreeningEvent::free_text("hello there")).await;
    assert_eq!(transition.run.active_test, Some(TestId::Phq9));
}

#[tokio::test]
async fn crisis_language_routes_to_crisis_protocol() {
    let machine = machine();
    let run = greeted(&machine).await;
    let transition = step(
        &machine,
        run,
        ScreeningEvent::free_text("I just want to end it all"),
    )
    .await;

    assert_eq!(transition.run.step, Step::Crisis);
    assert!(transition.run.active_test.is_none());
    match transition.view {
        StepView::Crisis {
            tier,
            preface,
            protocol,
            ..
        } => {
            assert_eq!(tier, RiskTier::Crisis);
            assert_eq!(preface.as_deref(), Some(SCRIPTED_REPLY));
            assert!(protocol
                .contacts
                .iter()
                .any(|contact| contact.destination == "14416"));
        }
        other => panic!("expected crisis, got {other:?}"),
    }
}

#[tokio::test]
async fn generator_failure_uses_fallback_reply() {
    let machine = machine_with(FailingGenerator);
    let run = greeted(&machine).await;
    let transition = step(
        &machine,
        run,
        ScreeningEvent::free_text("so stressed and under pressure"),
    )
    .await;

    assert_eq!(transition.run.active_test, Some(TestId::Dass));
    match transition.view {
        StepView::Question { preface, .. } => {
            assert!(preface
                .as_deref()
                .is_some_and(|preface| preface.starts_with(FALLBACK_REPLY)));
        }
        other => panic!("expected question, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_free_text_is_rejected_without_changes() {
    let machine = machine();
    let run = greeted(&machine).await;
    let before = run.clone();
    let rejection = machine
        .handle(run, ScreeningEvent::free_text("   "))
        .await
        .expect_err("blank text rejected");

    assert!(matches!(rejection.error, ScreeningError::InvalidEvent { .. }));
    assert_eq!(*rejection.run, before);
}

#[tokio::test]
async fn invalid_event_leaves_run_untouched() {
    let machine = machine();
    let run = greeted(&machine).await;
    let before = run.clone();
    let rejection = machine
        .handle(run, ScreeningEvent::answer(AnswerChoice::NotAtAll))
        .await
        .expect_err("no test selected yet");

    assert_eq!(
        rejection.error,
        ScreeningError::InvalidEvent {
            step: Step::Selection,
            event: "answer"
        }
    );
    assert_eq!(*rejection.run, before);
    assert!(rejection.run.halted.is_none());
}

#[tokio::test]
async fn unknown_answer_is_not_fatal() {
    let machine = machine();
    let run = greeted(&machine).await;
    let run = step(&machine, run, ScreeningEvent::select(TestSelection::Single(TestId::Gad7)))
        .await
        .run;
    let before = run.clone();
    let rejection = machine
        .handle(
            run,
            ScreeningEvent::Answer {
                choice: "sometimes".to_string(),
            },
        )
        .await
        .expect_err("unknown answer");

    assert_eq!(
        rejection.error,
        ScreeningError::UnknownAnswer("sometimes".to_string())
    );
    assert_eq!(*rejection.run, before);
}

#[tokio::test]
async fn unknown_test_halts_until_reset() {
    let machine = machine();
    let run = greeted(&machine).await;
    let rejection = machine
        .handle(
            run,
            ScreeningEvent::SelectTest {
                test: "BDI".to_string(),
            },
        )
        .await
        .expect_err("unknown test");
    assert_eq!(rejection.error, ScreeningError::UnknownTest("BDI".to_string()));
    assert!(rejection.run.halted.is_some());

    let halted = machine
        .handle(
            *rejection.run,
            ScreeningEvent::SelectTest {
                test: "PHQ9".to_string(),
            },
        )
        .await
        .expect_err("halted run refuses events");
    assert!(matches!(halted.error, ScreeningError::RunHalted(_)));

    let reset = step(&machine, *halted.run, ScreeningEvent::Reset).await;
    assert_eq!(reset.run, AssessmentRun::new());
    assert!(matches!(reset.view, StepView::Welcome { .. }));
}

#[tokio::test]
async fn export_report_keeps_results_step() {
    let machine = machine();
    let run = greeted(&machine).await;
    let run = step(&machine, run, ScreeningEvent::select(TestSelection::Single(TestId::Gad7)))
        .await
        .run;
    let results = answer_all(&machine, run, AnswerChoice::MoreThanHalfTheDays, 7).await;
    assert!(matches!(
        results.view,
        StepView::Results {
            tier: RiskTier::Moderate,
            ..
        }
    ));

    let exported = step(&machine, results.run, ScreeningEvent::ExportReport).await;
    assert_eq!(exported.run.step, Step::Results);
    match exported.view {
        StepView::Report { file_name, content } => {
            assert_eq!(file_name, "mental_health_report.txt");
            assert!(content.contains("RESULT: Moderate anxiety (14/21)"));
        }
        other => panic!("expected report, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_clears_every_piece_of_state() {
    let machine = machine();
    let run = greeted(&machine).await;
    let run = step(&machine, run, ScreeningEvent::select(TestSelection::Single(TestId::Dass)))
        .await
        .run;
    let run = answer_all(&machine, run, AnswerChoice::SeveralDays, 7).await.run;
    assert_eq!(run.results.len(), 1);

    let reset = step(&machine, run, ScreeningEvent::Reset).await;
    assert_eq!(reset.run.step, Step::Welcome);
    assert!(reset.run.results.is_empty());
    assert!(reset.run.messages.is_empty());
    assert!(reset.run.queue.is_none());
}
