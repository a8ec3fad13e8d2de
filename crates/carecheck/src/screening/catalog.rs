use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ScreeningError;

/// Identifier for one of the standardized questionnaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TestId {
    #[serde(rename = "PHQ9")]
    Phq9,
    #[serde(rename = "GAD7")]
    Gad7,
    #[serde(rename = "DASS")]
    Dass,
}

impl TestId {
    /// Administration order used by "all three" mode and by the dashboard.
    pub const ALL: [TestId; 3] = [TestId::Phq9, TestId::Gad7, TestId::Dass];

    pub const fn code(self) -> &'static str {
        match self {
            TestId::Phq9 => "PHQ9",
            TestId::Gad7 => "GAD7",
            TestId::Dass => "DASS",
        }
    }

    pub fn display_name(self) -> &'static str {
        questionnaire(self).display_name
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TestId {
    type Err = ScreeningError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "phq9" | "phq-9" => Ok(TestId::Phq9),
            "gad7" | "gad-7" => Ok(TestId::Gad7),
            "dass" | "dass-21" | "dass21" => Ok(TestId::Dass),
            _ => Err(ScreeningError::UnknownTest(raw.trim().to_string())),
        }
    }
}

/// Explicit choice made at the selection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "test")]
pub enum TestSelection {
    Single(TestId),
    AllThree,
}

impl TestSelection {
    pub fn label(self) -> &'static str {
        match self {
            TestSelection::Single(test) => test.display_name(),
            TestSelection::AllThree => "All three tests (complete assessment)",
        }
    }

    /// Every selection offered at the selection step, in display order.
    pub fn options() -> [TestSelection; 4] {
        [
            TestSelection::Single(TestId::Phq9),
            TestSelection::Single(TestId::Gad7),
            TestSelection::Single(TestId::Dass),
            TestSelection::AllThree,
        ]
    }
}

impl FromStr for TestSelection {
    type Err = ScreeningError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "all3" | "all three" | "all_three" => Ok(TestSelection::AllThree),
            _ => raw.parse().map(TestSelection::Single),
        }
    }
}

/// One point on the shared 4-point frequency scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerChoice {
    NotAtAll,
    SeveralDays,
    MoreThanHalfTheDays,
    NearlyEveryDay,
}

impl AnswerChoice {
    /// Scale in ascending score order.
    pub const SCALE: [AnswerChoice; 4] = [
        AnswerChoice::NotAtAll,
        AnswerChoice::SeveralDays,
        AnswerChoice::MoreThanHalfTheDays,
        AnswerChoice::NearlyEveryDay,
    ];

    pub const fn value(self) -> u16 {
        match self {
            AnswerChoice::NotAtAll => 0,
            AnswerChoice::SeveralDays => 1,
            AnswerChoice::MoreThanHalfTheDays => 2,
            AnswerChoice::NearlyEveryDay => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AnswerChoice::NotAtAll => "Not at all",
            AnswerChoice::SeveralDays => "Several days",
            AnswerChoice::MoreThanHalfTheDays => "More than half the days",
            AnswerChoice::NearlyEveryDay => "Nearly every day",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::SCALE.iter().map(|choice| choice.label()).collect()
    }
}

impl FromStr for AnswerChoice {
    type Err = ScreeningError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::SCALE
            .into_iter()
            .find(|choice| {
                normalized == choice.label().to_ascii_lowercase()
                    || normalized == choice.value().to_string()
                    || normalized == choice.label().to_ascii_lowercase().replace(' ', "_")
            })
            .ok_or_else(|| ScreeningError::UnknownAnswer(raw.trim().to_string()))
    }
}

/// Inclusive upper bound of a labelled score range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityBand {
    pub upper_bound: u16,
    pub label: &'static str,
}

const fn band(upper_bound: u16, label: &'static str) -> SeverityBand {
    SeverityBand { upper_bound, label }
}

/// Static definition of a questionnaire.
#[derive(Debug)]
pub struct Questionnaire {
    pub display_name: &'static str,
    pub questions: &'static [&'static str],
    pub bands: &'static [SeverityBand],
    /// Applied to the raw sum before the band lookup.
    pub multiplier: u16,
}

impl Questionnaire {
    pub fn max_score(&self) -> u16 {
        self.questions.len() as u16 * AnswerChoice::NearlyEveryDay.value() * self.multiplier
    }
}

static PHQ9: Questionnaire = Questionnaire {
    display_name: "PHQ-9 (Depression)",
    questions: &[
        "Little interest or pleasure in doing things?",
        "Feeling down, depressed, or hopeless?",
        "Trouble falling or staying asleep, or sleeping too much?",
        "Feeling tired or having little energy?",
        "Poor appetite or overeating?",
        "Feeling bad about yourself, or that you are a failure?",
        "Trouble concentrating on things?",
        "Moving or speaking so slowly others could notice? Or the opposite?",
        "Thoughts that you would be better off dead or of hurting yourself?",
    ],
    bands: &[
        band(4, "Minimal depression"),
        band(9, "Mild depression"),
        band(14, "Moderate depression"),
        band(19, "Moderately severe depression"),
        band(27, "Severe depression"),
    ],
    multiplier: 1,
};

static GAD7: Questionnaire = Questionnaire {
    display_name: "GAD-7 (Anxiety)",
    questions: &[
        "Feeling nervous, anxious, or on edge?",
        "Not being able to stop or control worrying?",
        "Worrying too much about different things?",
        "Trouble relaxing?",
        "Being so restless that it is hard to sit still?",
        "Becoming easily annoyed or irritable?",
        "Feeling afraid as if something awful might happen?",
    ],
    bands: &[
        band(4, "Minimal anxiety"),
        band(9, "Mild anxiety"),
        band(14, "Moderate anxiety"),
        band(21, "Severe anxiety"),
    ],
    multiplier: 1,
};

static DASS: Questionnaire = Questionnaire {
    display_name: "DASS-21 (Stress)",
    questions: &[
        "I found it hard to wind down?",
        "I was aware of dryness of my mouth?",
        "I couldn't seem to experience any positive feeling at all?",
        "I experienced breathing difficulty?",
        "I found it difficult to work up the initiative to do things?",
        "I tended to over-react to situations?",
        "I felt that I was using a lot of nervous energy?",
    ],
    bands: &[
        band(14, "Normal"),
        band(19, "Mild stress"),
        band(25, "Moderate stress"),
        band(42, "Severe stress"),
    ],
    multiplier: 2,
};

pub fn questionnaire(test: TestId) -> &'static Questionnaire {
    match test {
        TestId::Phq9 => &PHQ9,
        TestId::Gad7 => &GAD7,
        TestId::Dass => &DASS,
    }
}

pub fn questions(test: TestId) -> &'static [&'static str] {
    questionnaire(test).questions
}

pub fn thresholds(test: TestId) -> &'static [SeverityBand] {
    questionnaire(test).bands
}

pub fn max_score(test: TestId) -> u16 {
    questionnaire(test).max_score()
}

/// The two 10-item inventories answered on a 0-4 slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliderInventory {
    Stress,
    Depression,
}

pub const SLIDER_ITEM_COUNT: usize = 10;
pub const SLIDER_MAX: u8 = 4;
pub const SLIDER_DEFAULT: u8 = 2;

impl SliderInventory {
    pub fn title(self) -> &'static str {
        match self {
            SliderInventory::Stress => "Stress Assessment",
            SliderInventory::Depression => "Depression Assessment",
        }
    }

    pub fn questions(self) -> &'static [&'static str; SLIDER_ITEM_COUNT] {
        match self {
            SliderInventory::Stress => &STRESS_SLIDER_QUESTIONS,
            SliderInventory::Depression => &DEPRESSION_SLIDER_QUESTIONS,
        }
    }

    /// Everything a client needs to render the sliders.
    pub fn form(self) -> SliderForm {
        SliderForm {
            kind: self,
            title: self.title(),
            questions: self.questions(),
            min: 0,
            max: SLIDER_MAX,
            default: SLIDER_DEFAULT,
            scale: SLIDER_SCALE,
        }
    }
}

/// Labels for the two slider ends.
pub const SLIDER_SCALE: [&str; 2] = ["Never", "Always"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliderForm {
    pub kind: SliderInventory,
    pub title: &'static str,
    pub questions: &'static [&'static str; SLIDER_ITEM_COUNT],
    pub min: u8,
    pub max: u8,
    pub default: u8,
    pub scale: [&'static str; 2],
}

impl FromStr for SliderInventory {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stress" => Ok(SliderInventory::Stress),
            "depression" => Ok(SliderInventory::Depression),
            other => Err(format!("unknown slider inventory '{other}'")),
        }
    }
}

static STRESS_SLIDER_QUESTIONS: [&str; SLIDER_ITEM_COUNT] = [
    "How often do you feel overwhelmed by daily responsibilities?",
    "How often do you feel nervous or anxious?",
    "How difficult is it for you to relax?",
    "How often do you feel irritated or angry?",
    "Do you feel mentally exhausted at the end of the day?",
    "Are you having difficulty sleeping due to stress?",
    "How often do you feel pressure related to work or studies?",
    "How often do you worry about things beyond your control?",
    "Do you experience physical symptoms like headaches or fatigue?",
    "How difficult is it to concentrate because of stress?",
];

static DEPRESSION_SLIDER_QUESTIONS: [&str; SLIDER_ITEM_COUNT] = [
    "How often do you feel sad or hopeless?",
    "How often do you lose interest in activities you enjoy?",
    "How often do you feel tired or low in energy?",
    "How often do you have difficulty concentrating?",
    "How often do you feel worthless or guilty?",
    "How often do you have sleep problems?",
    "How often do you notice appetite or weight changes?",
    "How often do you feel restless or slowed down?",
    "How often do you avoid social interactions?",
    "How often do you feel life is meaningless?",
];
