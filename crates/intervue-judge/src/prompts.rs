use serde_json::{Map, Value};

use intervue_store::{MemoryMessage, QaPair, SpeakerRole};

use crate::traits::{EvaluationInput, NextQuestionInput};

/// Prompt templates shared by the judge backends.
pub struct JudgePrompts;

impl JudgePrompts {
    pub fn build_evaluation_prompt(input: EvaluationInput<'_>) -> String {
        format!(
            r#"You are evaluating one answer in a customer-development research intake.

## Field
name: {field}
meaning: {description}

## Question asked
{question}

## Answer given
{answer}

Decide whether the answer fully covers the field. An answer is complete when it
gives concrete, usable content for this field, not a deflection or a placeholder.

Respond with ONLY a JSON object of this exact shape:
{{"is_complete": true/false, "confidence": 0.0-1.0, "missing_aspects": ["..."], "extracted_value": "concise value to store, or null"}}"#,
            field = input.field,
            description = input.field_description,
            question = input.question,
            answer = input.answer,
        )
    }

    pub fn build_clarification_prompt(
        field: &str,
        question: &str,
        answer: &str,
        missing_aspects: &[String],
    ) -> String {
        format!(
            r#"A research participant gave an incomplete answer during study setup.

Field being collected: {field}
Original question: {question}
Their answer: {answer}
Missing aspects: {missing}

Write ONE short, friendly follow-up question that asks specifically for the
missing aspects. Return only the question text."#,
            missing = missing_aspects.join(", "),
        )
    }

    pub fn build_brief_prompt(fields: &Map<String, Value>) -> String {
        format!(
            r#"You are preparing a customer-development interview brief from the study
fields below.

## Study fields
{fields}

Produce a markdown brief with exactly these sections:

### 1. Research goal
### 2. Interview guide
### 3. First message to the respondent

Section 3 must be a complete, self-contained message that can be sent to a
respondent verbatim: greet them in the requested communication style, explain
what the interview is about and roughly how long it takes."#,
            fields = serde_json::to_string_pretty(&Value::Object(fields.clone()))
                .unwrap_or_else(|_| "{}".to_string()),
        )
    }

    pub fn build_instruction_prompt(fields: &Map<String, Value>) -> String {
        format!(
            r#"Write the opening message for a customer-development interview based on
these study fields:

{fields}

Greet the respondent in the requested communication style and explain what the
interview is about. Return only the message text."#,
            fields = serde_json::to_string_pretty(&Value::Object(fields.clone()))
                .unwrap_or_else(|_| "{}".to_string()),
        )
    }

    pub fn build_first_question_prompt(instruction: &str, style: &str) -> String {
        format!(
            r#"You are conducting a customer-development interview.

## Interview instruction
{instruction}

## Communication style
{style}

Write the opening question. It must be open-ended, easy to answer, and invite
the respondent to talk about their own experience. Return only the question."#,
        )
    }

    pub fn build_next_question_prompt(input: NextQuestionInput<'_>) -> String {
        format!(
            r#"You are conducting a customer-development interview.

## Interview instruction
{instruction}

## Answers so far ({count} total)
{answers}

## Recent conversation
{history}

## Communication style
{style}

Write the next open-ended question. Dig deeper into what the respondent already
said, follow the instruction's goals, and never repeat a question that was
already asked. If every goal of the instruction is genuinely covered, respond
with exactly: FINISH"#,
            instruction = input.instruction,
            count = input.answers.len(),
            answers = render_qa(input.answers),
            history = render_history(input.history),
            style = input.style,
        )
    }

    pub fn build_summary_prompt(answers: &[QaPair]) -> String {
        format!(
            r#"Summarize this customer-development interview for the researcher.

## Interview ({count} answers)
{qa}

Cover: key motivations and pains mentioned, notable quotes, and anything that
confirms or contradicts typical product hypotheses. Be concise and factual."#,
            count = answers.len(),
            qa = render_qa(answers),
        )
    }
}

fn render_qa(answers: &[QaPair]) -> String {
    answers
        .iter()
        .map(|qa| format!("Q: {}\nA: {}", qa.question, qa.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_history(history: &[MemoryMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let role = match m.role {
                SpeakerRole::User => "respondent",
                SpeakerRole::Assistant => "interviewer",
            };
            format!("{role}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
