pub mod score;

pub use score::{calculate_qualitative_score, score, QualitativeAnswers, QualitativeLabel, QualitativeScore};
