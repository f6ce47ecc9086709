use serde_json::{Map, Value};

/// Minimum value length re-checked for critical fields at finalize time.
pub const FINALIZE_MIN_LEN: usize = 10;

/// A static intake question. Defined per deployment, immutable at runtime.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub prompt: String,
    /// Short meaning of the field, handed to the judge for evaluation.
    pub description: String,
    pub required: bool,
    /// Minimum answer length in characters; 0 disables the check.
    pub min_len: usize,
    /// Critical fields are re-checked against FINALIZE_MIN_LEN on finalize.
    pub critical: bool,
}

impl FieldSpec {
    fn new(name: &str, prompt: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
            description: description.to_string(),
            required: false,
            min_len: 0,
            critical: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn min_len(mut self, min: usize) -> Self {
        self.min_len = min;
        self
    }

    fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// Ordered set of intake questions: required fields first, optional after.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    fields: Vec<FieldSpec>,
}

impl FieldPlan {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The default customer-development research intake.
    pub fn research_intake() -> Self {
        Self::new(vec![
            FieldSpec::new(
                "name",
                "How should I address you?",
                "Name or preferred form of address for the researcher",
            )
            .required(),
            FieldSpec::new(
                "industry",
                "What industry, niche, or context is this research about?",
                "Industry or business niche the research targets",
            )
            .required()
            .min_len(5)
            .critical(),
            FieldSpec::new(
                "target",
                "Who or what are you planning to study? If people: segment, role, age, \
                 geography. If a process or product: its stages and features, and where it hurts.",
                "Target audience or research subject with concrete characteristics",
            )
            .required()
            .min_len(10)
            .critical(),
            FieldSpec::new(
                "hypotheses",
                "What working hypotheses do you want to test? Phrase them as \
                 \"if ... then ... -> expected effect\".",
                "Concrete hypotheses in if-then form",
            )
            .required()
            .min_len(15)
            .critical(),
            FieldSpec::new(
                "style",
                "What tone should I use with respondents? For example: friendly and informal, \
                 neutral business, expert-to-expert, or light with humor.",
                "Communication style for talking to respondents",
            )
            .required()
            .min_len(5),
            FieldSpec::new(
                "success_metric",
                "Which metrics will tell you the research succeeded? \
                 E.g. \"find 3 key motivations\" or \"confirm 2 hypotheses\". (optional)",
                "Success metrics for the research",
            ),
            FieldSpec::new(
                "constraints",
                "Any constraints: interview length, taboo topics, \
                 legal requirements (NDA/GDPR)? (optional)",
                "Time, topic, or legal constraints",
            ),
            FieldSpec::new(
                "existing_data",
                "Is there existing data or analytics worth building on? \
                 A short description is fine. (optional)",
                "Existing data or prior research to build on",
            ),
        ])
    }

    pub fn get(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Required fields not yet present (or present but empty) in the
    /// collected map, in ask order.
    pub fn missing_required(&self, collected: &Map<String, Value>) -> Vec<&FieldSpec> {
        self.required_fields()
            .filter(|f| {
                collected
                    .get(&f.name)
                    .and_then(Value::as_str)
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .collect()
    }
}

impl Default for FieldPlan {
    fn default() -> Self {
        Self::research_intake()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intake_plan_orders_required_before_optional() {
        let plan = FieldPlan::research_intake();
        assert_eq!(plan.len(), 8);
        assert!(plan.get(0).unwrap().required);
        assert!(plan.get(4).unwrap().required);
        assert!(!plan.get(5).unwrap().required);
        assert_eq!(plan.required_fields().count(), 5);
    }

    #[test]
    fn missing_required_ignores_optional_and_filled() {
        let plan = FieldPlan::research_intake();
        let mut collected = Map::new();
        collected.insert("name".into(), json!("John"));
        collected.insert("industry".into(), json!("fintech"));
        collected.insert("success_metric".into(), json!("3 motivations"));

        let missing: Vec<&str> = plan
            .missing_required(&collected)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(missing, vec!["target", "hypotheses", "style"]);
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let plan = FieldPlan::research_intake();
        let mut collected = Map::new();
        collected.insert("name".into(), json!("  "));
        assert!(plan
            .missing_required(&collected)
            .iter()
            .any(|f| f.name == "name"));
    }
}
