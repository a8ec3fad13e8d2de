//! Guided self-assessment screening.
//!
//! The crate administers the PHQ-9, GAD-7 and DASS questionnaires, scores the
//! answers against fixed cut-points, and routes each run to a self-care,
//! escalation or crisis outcome. Free text can select a questionnaire through
//! keyword signals, and a slider-based variant defers to a pretrained label
//! predictor.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod screening;
pub mod telemetry;
