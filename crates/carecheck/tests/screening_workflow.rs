use std::sync::Arc;
use std::time::Duration;

use carecheck::collaborators::{CentroidModel, OfflineGenerator, Responder, FALLBACK_REPLY};
use carecheck::screening::{
    classify, score, AnswerChoice, AssessmentRun, RiskTier, ScreeningEvent, ScreeningMachine,
    SliderAssessment, SliderInventory, Step, StepView, SymptomSignal, TestId, TestSelection,
    Transition,
};

fn offline_machine() -> ScreeningMachine<OfflineGenerator> {
    ScreeningMachine::new(Responder::new(OfflineGenerator, Duration::from_secs(1)))
}

async fn apply(
    machine: &ScreeningMachine<OfflineGenerator>,
    run: AssessmentRun,
    event: ScreeningEvent,
) -> Transition {
    machine
        .handle(run, event)
        .await
        .unwrap_or_else(|rejection| panic!("event rejected: {}", rejection.error))
}

async fn answer_with(
    machine: &ScreeningMachine<OfflineGenerator>,
    mut run: AssessmentRun,
    choices: &[AnswerChoice],
) -> Transition {
    let (last, rest) = choices.split_last().expect("at least one answer");
    for choice in rest {
        run = apply(machine, run, ScreeningEvent::answer(*choice)).await.run;
    }
    apply(machine, run, ScreeningEvent::answer(*last)).await
}

#[tokio::test]
async fn complete_assessment_walks_all_three_questionnaires() {
    let machine = offline_machine();
    let run = apply(&machine, AssessmentRun::new(), ScreeningEvent::Start)
        .await
        .run;
    let run = apply(&machine, run, ScreeningEvent::select(TestSelection::AllThree))
        .await
        .run;
    assert_eq!(run.active_test, Some(TestId::Phq9));

    let mut phq = vec![AnswerChoice::MoreThanHalfTheDays; 5];
    phq.extend([AnswerChoice::NotAtAll; 4]);
    let after_phq = answer_with(&machine, run, &phq).await;
    assert_eq!(after_phq.run.active_test, Some(TestId::Gad7));

    let after_gad = answer_with(&machine, after_phq.run, &[AnswerChoice::NotAtAll; 7]).await;
    assert_eq!(after_gad.run.active_test, Some(TestId::Dass));

    let dass = [
        AnswerChoice::NearlyEveryDay,
        AnswerChoice::NearlyEveryDay,
        AnswerChoice::SeveralDays,
        AnswerChoice::SeveralDays,
        AnswerChoice::NotAtAll,
        AnswerChoice::NotAtAll,
        AnswerChoice::NotAtAll,
    ];
    let finished = answer_with(&machine, after_gad.run, &dass).await;
    assert_eq!(finished.run.step, Step::Results);

    match finished.view {
        StepView::Results { result, tier, .. } => {
            assert_eq!(result.test, TestId::Dass);
            assert_eq!(result.to_string(), "Mild stress (16/42)");
            assert_eq!(tier, RiskTier::Low);
        }
        other => panic!("expected results view, got {other:?}"),
    }

    assert_eq!(
        finished.run.results[&TestId::Phq9].to_string(),
        "Moderate depression (10/27)"
    );
    assert_eq!(
        finished.run.results[&TestId::Gad7].to_string(),
        "Minimal anxiety (0/21)"
    );
}

#[tokio::test]
async fn severe_phq9_goes_straight_to_crisis() {
    let machine = offline_machine();
    let run = apply(&machine, AssessmentRun::new(), ScreeningEvent::Start)
        .await
        .run;
    let run = apply(
        &machine,
        run,
        ScreeningEvent::select(TestSelection::Single(TestId::Phq9)),
    )
    .await
    .run;

    let mut answers = vec![AnswerChoice::NearlyEveryDay; 6];
    answers.extend([AnswerChoice::SeveralDays; 3]);
    let outcome = answer_with(&machine, run, &answers).await;

    assert_eq!(outcome.run.step, Step::Crisis);
    assert_eq!(outcome.run.step.code(), 99);
    assert!(matches!(
        outcome.view,
        StepView::Crisis {
            tier: RiskTier::HighSevere,
            ..
        }
    ));
}

#[tokio::test]
async fn offline_responder_still_routes_free_text() {
    let machine = offline_machine();
    let run = apply(&machine, AssessmentRun::new(), ScreeningEvent::Start)
        .await
        .run;
    let outcome = apply(
        &machine,
        run,
        ScreeningEvent::free_text("I feel hopeless and sad every day"),
    )
    .await;

    assert_eq!(outcome.run.active_test, Some(TestId::Phq9));
    match outcome.view {
        StepView::Question { preface, .. } => {
            assert!(preface.is_some_and(|text| text.starts_with(FALLBACK_REPLY)));
        }
        other => panic!("expected question view, got {other:?}"),
    }
}

#[test]
fn scoring_and_classification_agree_with_cut_points() {
    let result = score(TestId::Gad7, &[AnswerChoice::MoreThanHalfTheDays; 7]).expect("scored");
    assert_eq!(result.label, "Moderate anxiety");
    assert_eq!(RiskTier::from_label(&result.label), RiskTier::Moderate);

    assert_eq!(classify("work pressure has me overwhelmed"), SymptomSignal::Test(TestId::Dass));
    assert_eq!(classify("I think about death"), SymptomSignal::Crisis);
}

#[test]
fn slider_assessment_uses_baseline_models() {
    let assessment = SliderAssessment::new(
        Arc::new(CentroidModel::baseline_stress()),
        Arc::new(CentroidModel::baseline_depression()),
    );

    let outcome = assessment
        .assess(SliderInventory::Stress, &[3, 3, 3, 3, 3, 3, 3, 3, 3, 3])
        .expect("valid answers");
    assert_eq!(outcome.label, "High");
    assert!(outcome.elevated);

    assert!(assessment.assess(SliderInventory::Depression, &[2; 4]).is_err());
}
