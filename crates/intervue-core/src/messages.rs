//! All user-visible copy in one place. Both flows pull their text from
//! here so wording changes never touch control flow.

use intervue_store::QaPair;

pub const RESEARCHER_WELCOME: &str = "Hi! I'll help you set up a customer research interview. \
A few questions first, then I'll draft the interview brief.";

pub const ANSWER_TOO_VAGUE: &str =
    "That sounds like a placeholder rather than an answer. Could you be more concrete?";

pub fn answer_too_short(min: usize) -> String {
    format!(
        "Could you expand on that a little? At least {min} characters, \
         the more specific the better."
    )
}

pub const CLARIFICATION_FALLBACK: &str =
    "Could you add a bit more detail? A concrete example helps a lot.";

pub fn rejection_keep_or_skip(field_prompt: &str) -> String {
    format!(
        "I still don't have enough to work with there. Let's try once more, \
         or reply \"skip\" to move on.\n\n{field_prompt}"
    )
}

pub fn missing_required(prompts: &[&str]) -> String {
    let mut lines = vec![
        "Before we wrap up I still need a couple of things:".to_string(),
    ];
    for prompt in prompts.iter().take(2) {
        let short: String = prompt.chars().take(30).collect();
        if prompt.chars().count() > 30 {
            lines.push(format!("- {short}..."));
        } else {
            lines.push(format!("- {short}"));
        }
    }
    lines.join("\n")
}

pub fn finalize_validation_failed(field_prompts: &[&str]) -> String {
    let mut text = String::from(
        "Some answers are too thin to build a good interview on. \
         Let's redo these:\n",
    );
    for prompt in field_prompts {
        text.push_str("- ");
        text.push_str(prompt);
        text.push('\n');
    }
    text.push_str("\nSend /research to start over.");
    text
}

pub const BRIEF_GENERATION_FAILED: &str = "I couldn't put the interview brief together. \
Nothing was saved; send /research to start over.";

pub fn research_created(name: &str, link: &str) -> String {
    format!(
        "Done, {name}! Your interview is live.\n\n\
         Share this link with respondents:\n{link}\n\n\
         You'll get interim reports as answers come in and a final report \
         when each conversation ends."
    )
}

pub fn respondent_welcome(instruction: &str) -> String {
    format!("{instruction}\n\nYou can answer in text or voice, whatever is easier.")
}

pub const INTERVIEW_NOT_FOUND: &str =
    "I couldn't find that interview. Double-check the link with whoever sent it to you.";

pub const INTERVIEW_NOT_OPEN: &str =
    "This interview isn't accepting responses right now.";

pub const FINISH_CONFIRMATION: &str = "Sure, we can stop here. \
If you're certain, say so once more and I'll wrap up. \
Or just answer the last question and we'll keep going.";

pub const FIRST_REMINDER: &str = "Still there? No rush, your answers so far are saved. \
Reply whenever you're ready.";

pub const SECOND_REMINDER: &str = "I'll leave the conversation open in case you want to \
come back later. Thanks for the answers you've shared!";

pub fn thank_you(reward_link: Option<&str>) -> String {
    match reward_link {
        Some(link) => format!(
            "Thank you, that was genuinely helpful!\n\n\
             As promised, here's your reward: {link}"
        ),
        None => "Thank you, that was genuinely helpful! Have a great day.".to_string(),
    }
}

pub fn interim_report(answer_count: usize, respondent: i64, summary: &str) -> String {
    format!(
        "Interim report: respondent {respondent}, {answer_count} answers so far.\n\n{summary}"
    )
}

pub fn final_report(respondent: i64, answer_count: usize, summary: &str) -> String {
    format!(
        "Interview finished: respondent {respondent}, {answer_count} answers.\n\n{summary}"
    )
}

pub const CONTINUATION_QUESTION: &str =
    "Interesting. Could you tell me more about how that plays out day to day?";

pub const FALLBACK_FIRST_QUESTION: &str =
    "To start: tell me a bit about yourself and how this topic shows up in your life.";

pub const SUMMARY_NO_ANSWERS: &str =
    "The respondent opened the interview but didn't answer anything.";

pub fn summary_early_exit(answer_count: usize) -> String {
    format!(
        "The respondent left after {answer_count} answer(s); \
         too little material for a full summary."
    )
}

/// Plain digest used when the summarizer is unavailable.
pub fn summary_digest(answers: &[QaPair]) -> String {
    let mut text = String::from("Raw transcript digest:\n");
    for (i, qa) in answers.iter().enumerate() {
        text.push_str(&format!("{}. Q: {}\n   A: {}\n", i + 1, qa.question, qa.answer));
    }
    text
}

pub const TRANSCRIPTION_FAILED: &str =
    "I couldn't make out that voice message. Mind trying again, or typing it?";

pub const SESSION_CANCELLED: &str = "Okay, cancelled. Nothing was saved.";

pub const INTERVIEW_SAVE_FAILED: &str =
    "Something went wrong saving the conversation. Your answers may be incomplete on our side.";

pub const SETUP_FAILED: &str =
    "I couldn't start the setup just now. Please try /research again in a minute.";
