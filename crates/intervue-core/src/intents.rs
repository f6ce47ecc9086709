/// Configurable keyword sets behind every intent heuristic. Matching is
/// plain substring lookup over the lowercased utterance; several call
/// sites rely on the exact same behavior.
#[derive(Debug, Clone)]
pub struct IntentLexicon {
    /// The user wants to end the conversation.
    pub finish: Vec<String>,
    /// The user declines upcoming optional questions.
    pub skip: Vec<String>,
    /// Deflections that are never acceptable for a required field.
    pub stop_phrases: Vec<String>,
    /// Values considered unusable during finalize re-validation.
    pub garbage: Vec<String>,
}

impl Default for IntentLexicon {
    fn default() -> Self {
        Self {
            finish: strings(&[
                "enough",
                "stop",
                "done",
                "that's all",
                "хватит",
                "достаточно",
                "стоп",
                "закончить",
            ]),
            skip: strings(&["skip", "not needed", "no thanks", "нет", "не надо", "пропустить"]),
            stop_phrases: strings(&[
                "don't know",
                "dont know",
                "not sure",
                "no idea",
                "не знаю",
                "незнаю",
                "не понимаю",
                "хз",
                "понятия не имею",
            ]),
            garbage: strings(&[
                "don't know",
                "dont know",
                "no idea",
                "не знаю",
                "незнаю",
                "не понял",
                "непонял",
                "не понимаю",
                "хз",
            ]),
        }
    }
}

impl IntentLexicon {
    pub fn is_finish(&self, text: &str) -> bool {
        contains_any(text, &self.finish)
    }

    pub fn wants_skip(&self, text: &str) -> bool {
        // Bare "no"/"nope" are matched exactly; as substrings they would
        // fire inside words like "know".
        let trimmed = text.trim().to_lowercase();
        if trimmed == "no" || trimmed == "nope" {
            return true;
        }
        contains_any(text, &self.skip)
    }

    pub fn has_stop_phrase(&self, text: &str) -> bool {
        contains_any(text, &self.stop_phrases)
    }

    /// Finalize-time check on an already-stored value.
    pub fn is_garbage_value(&self, value: &str) -> bool {
        value.trim().is_empty() || contains_any(value, &self.garbage)
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Keyword-based style extraction from the interview instruction text.
/// Same heuristic family as the lexicon: lookup, not classification.
pub fn extract_style(instruction: &str) -> &'static str {
    let lower = instruction.to_lowercase();
    if lower.contains("expert") || lower.contains("эксперт") {
        "expert"
    } else if lower.contains("neutral")
        || lower.contains("business")
        || lower.contains("нейтрал")
        || lower.contains("делов")
    {
        "neutral"
    } else {
        "friendly"
    }
}
