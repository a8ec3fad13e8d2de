use serde::{Deserialize, Serialize};

/// Coarse routing tier derived from a result label or a crisis signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    HighSevere,
    Crisis,
}

impl RiskTier {
    /// Classify a severity label by substring. "Moderately severe" is checked
    /// explicitly because it does not contain the capitalized "Severe".
    pub fn from_label(label: &str) -> Self {
        if label.contains("Severe") || label.contains("Moderately severe") {
            RiskTier::HighSevere
        } else if label.contains("Moderate") {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::HighSevere => "high_severe",
            RiskTier::Crisis => "crisis",
        }
    }

    /// Tiers that force the run into the crisis protocol.
    pub const fn requires_crisis_protocol(self) -> bool {
        matches!(self, RiskTier::HighSevere | RiskTier::Crisis)
    }

    pub fn guidance(self) -> Vec<String> {
        match self {
            RiskTier::Low => vec!["LOW RISK - continue self-care and monitoring".to_string()],
            RiskTier::Moderate => vec![
                "MODERATE RISK - schedule a psychiatrist appointment this week".to_string(),
                "Psychiatry Department: Extension 123".to_string(),
            ],
            RiskTier::HighSevere => {
                vec!["HIGH RISK - immediate psychiatric evaluation required".to_string()]
            }
            RiskTier::Crisis => vec![
                "CRISIS DETECTED - please contact emergency services immediately".to_string(),
            ],
        }
    }
}
