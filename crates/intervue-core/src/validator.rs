use crate::fields::FieldSpec;
use crate::intents::IntentLexicon;

/// Outcome of the cheap pre-judge answer check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Ok,
    /// The answer is a deflection ("don't know" and friends).
    StopWordRejected,
    /// The answer is shorter than the field's minimum.
    TooShort { min: usize },
}

/// Validate an answer against a field before any judge call. Optional
/// fields accept anything; the stop-phrase check runs before the length
/// check so a short deflection reads as a deflection, not as too short.
pub fn validate(field: &FieldSpec, answer: &str, lexicon: &IntentLexicon) -> ValidationResult {
    if !field.required {
        return ValidationResult::Ok;
    }
    if lexicon.has_stop_phrase(answer) {
        return ValidationResult::StopWordRejected;
    }
    if field.min_len > 0 && answer.trim().chars().count() < field.min_len {
        return ValidationResult::TooShort { min: field.min_len };
    }
    ValidationResult::Ok
}
