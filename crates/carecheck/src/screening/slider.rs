use std::sync::Arc;

use serde::Serialize;

use super::catalog::SliderInventory;
use crate::collaborators::{FeatureVector, InvalidFeatures, LabelPredictor};

pub const UNAVAILABLE_LABEL: &str = "Unavailable";

/// Outcome of a slider assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliderOutcome {
    pub kind: SliderInventory,
    pub label: String,
    pub elevated: bool,
    pub headline: String,
    pub advice: &'static str,
    pub summary: String,
}

/// Slider variant of the screening: ten 0-4 answers handed to a pretrained
/// predictor per inventory.
#[derive(Clone)]
pub struct SliderAssessment {
    stress: Arc<dyn LabelPredictor>,
    depression: Arc<dyn LabelPredictor>,
}

impl SliderAssessment {
    pub fn new(stress: Arc<dyn LabelPredictor>, depression: Arc<dyn LabelPredictor>) -> Self {
        Self { stress, depression }
    }

    fn predictor(&self, kind: SliderInventory) -> &dyn LabelPredictor {
        match kind {
            SliderInventory::Stress => self.stress.as_ref(),
            SliderInventory::Depression => self.depression.as_ref(),
        }
    }

    pub fn assess(
        &self,
        kind: SliderInventory,
        answers: &[u8],
    ) -> Result<SliderOutcome, InvalidFeatures> {
        let features = FeatureVector::new(answers)?;

        let label = match self.predictor(kind).predict(&features) {
            Ok(label) => label,
            Err(error) => {
                tracing::warn!(?kind, %error, "label predictor failed");
                return Ok(unavailable(kind));
            }
        };

        let elevated = is_elevated(kind, &label);
        tracing::info!(?kind, label = %label, elevated, "slider assessment predicted");

        let (noun, advice) = match (kind, elevated) {
            (SliderInventory::Stress, true) => (
                "stress",
                "You may be experiencing high stress. Consider relaxation techniques or professional support.",
            ),
            (SliderInventory::Stress, false) => {
                ("stress", "Your stress seems manageable. Keep taking care.")
            }
            (SliderInventory::Depression, true) => (
                "depression",
                "You may be experiencing emotional distress. Please consider speaking with a mental health professional.",
            ),
            (SliderInventory::Depression, false) => {
                ("depression", "Your responses suggest things are okay.")
            }
        };

        Ok(SliderOutcome {
            kind,
            headline: format!("Your {} Level: {label}", capitalized(noun)),
            summary: format!(
                "Your {noun} level assessment is {label}. {}",
                closing_note(kind)
            ),
            label,
            elevated,
            advice,
        })
    }
}

/// Labels that call for the cautionary message.
pub fn is_elevated(kind: SliderInventory, label: &str) -> bool {
    match kind {
        SliderInventory::Stress => matches!(label, "High" | "Severe"),
        SliderInventory::Depression => matches!(label, "Moderate" | "Severe"),
    }
}

fn closing_note(kind: SliderInventory) -> &'static str {
    match kind {
        SliderInventory::Stress => {
            "Remember to take breaks, stay hydrated, and practice mindfulness."
        }
        SliderInventory::Depression => {
            "Stay connected, take care of yourself, and reach out when needed."
        }
    }
}

fn capitalized(noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn unavailable(kind: SliderInventory) -> SliderOutcome {
    SliderOutcome {
        kind,
        label: UNAVAILABLE_LABEL.to_string(),
        elevated: false,
        headline: format!("{} is unavailable right now", kind.title()),
        advice: "Please try again later, or speak with a member of staff.",
        summary: format!("{} could not be completed.", kind.title()),
    }
}
