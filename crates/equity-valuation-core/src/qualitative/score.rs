use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Four yes/no judgments about the business. Unanswered questions count as no.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitativeAnswers {
    /// Durable competitive advantage (moat)
    pub durable_competitive_advantage: bool,
    /// Solid financial position
    pub solid_financials: bool,
    pub growing_earnings: bool,
    /// Competent management
    pub competent_management: bool,
}

impl QualitativeAnswers {
    pub fn as_array(&self) -> [bool; 4] {
        [
            self.durable_competitive_advantage,
            self.solid_financials,
            self.growing_earnings,
            self.competent_management,
        ]
    }
}

impl From<[bool; 4]> for QualitativeAnswers {
    fn from(a: [bool; 4]) -> Self {
        Self {
            durable_competitive_advantage: a[0],
            solid_financials: a[1],
            growing_earnings: a[2],
            competent_management: a[3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualitativeLabel {
    Weak,
    Mixed,
    Good,
    Excellent,
}

impl std::fmt::Display for QualitativeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QualitativeLabel::Weak => "weak",
            QualitativeLabel::Mixed => "mixed",
            QualitativeLabel::Good => "good",
            QualitativeLabel::Excellent => "excellent",
        };
        write!(f, "{s}")
    }
}

/// Count of "yes" answers (0..=4) and its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitativeScore {
    pub score: u8,
    pub label: QualitativeLabel,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn score(answers: &QualitativeAnswers) -> QualitativeScore {
    let score = answers.as_array().iter().filter(|yes| **yes).count() as u8;
    let label = match score {
        0 | 1 => QualitativeLabel::Weak,
        2 => QualitativeLabel::Mixed,
        3 => QualitativeLabel::Good,
        _ => QualitativeLabel::Excellent,
    };
    QualitativeScore { score, label }
}

pub fn calculate_qualitative_score(answers: &QualitativeAnswers) -> ComputationOutput<QualitativeScore> {
    let start = Instant::now();
    let result = score(answers);
    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Four-question qualitative checklist",
        answers,
        Vec::new(),
        elapsed,
        result,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
