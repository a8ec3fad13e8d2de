use chrono::{DateTime, Local};
use serde::Serialize;

use super::scoring::ScreeningResult;

pub const REPORT_FILE_NAME: &str = "mental_health_report.txt";

const HEADER: &str = "HOSPITAL MENTAL HEALTH SCREENING REPORT";
const DISCLAIMER: [&str; 2] = [
    "SCREENING ONLY - NOT A DIAGNOSIS",
    "Consult a psychiatrist for moderate/severe results.",
];

/// Plain-text export of a single completed result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningReport {
    pub generated_at: DateTime<Local>,
    pub result: ScreeningResult,
}

impl ScreeningReport {
    pub fn new(result: ScreeningResult, generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at,
            result,
        }
    }

    pub fn file_name(&self) -> &'static str {
        REPORT_FILE_NAME
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            HEADER.to_string(),
            format!("Date: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            String::new(),
            format!("TEST: {}", self.result.test.display_name()),
            format!("RESULT: {}", self.result),
            String::new(),
        ];
        lines.extend(DISCLAIMER.iter().map(|line| line.to_string()));
        lines.join("\n")
    }
}
