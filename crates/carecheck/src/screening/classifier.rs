use serde::{Deserialize, Serialize};

use super::catalog::TestId;

/// Phrases that route straight to the crisis protocol.
pub const CRISIS_PHRASES: [&str; 6] = ["suicide", "kill myself", "harm", "death", "die", "end it all"];

const DEPRESSION_KEYWORDS: [&str; 6] = ["sad", "depressed", "hopeless", "down", "tired", "no energy"];
const ANXIETY_KEYWORDS: [&str; 5] = ["anxious", "nervous", "worry", "panic", "restless"];
const STRESS_KEYWORDS: [&str; 4] = ["stress", "overwhelmed", "pressure", "tense"];

/// Outcome of scanning a free-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "signal", content = "test")]
pub enum SymptomSignal {
    Crisis,
    Test(TestId),
}

/// Per-category keyword hits, kept for logging and the classify endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeywordCounts {
    pub depression: usize,
    pub anxiety: usize,
    pub stress: usize,
}

impl KeywordCounts {
    pub fn scan(text: &str) -> Self {
        let lowered = text.to_lowercase();
        Self {
            depression: count_hits(&lowered, &DEPRESSION_KEYWORDS),
            anxiety: count_hits(&lowered, &ANXIETY_KEYWORDS),
            stress: count_hits(&lowered, &STRESS_KEYWORDS),
        }
    }

    /// Category with the strictly greatest count. Ties resolve in the fixed
    /// priority PHQ9, GAD7, DASS, so zero signal selects PHQ9.
    pub fn strongest(&self) -> TestId {
        let ranked = [
            (TestId::Phq9, self.depression),
            (TestId::Gad7, self.anxiety),
            (TestId::Dass, self.stress),
        ];

        let mut best = ranked[0];
        for candidate in &ranked[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best.0
    }

    pub fn is_empty(&self) -> bool {
        self.depression == 0 && self.anxiety == 0 && self.stress == 0
    }
}

fn count_hits(lowered: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count()
}

pub fn is_crisis(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CRISIS_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Classify free text into a crisis signal or the questionnaire to administer.
pub fn classify(text: &str) -> SymptomSignal {
    if is_crisis(text) {
        return SymptomSignal::Crisis;
    }
    SymptomSignal::Test(KeywordCounts::scan(text).strongest())
}
