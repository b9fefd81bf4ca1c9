//! Prompts for error explanations.
//!
//! The system prompt is fixed so providers with prompt caching can reuse it;
//! only the user turn changes per error.

use crate::providers::ChatMessage;

/// System prompt shared by every explanation request.
pub const EXPLANATION_SYSTEM_PROMPT: &str = r#"
You assist operators reviewing flagged financial transactions.

You are given one validation error produced by a rule engine.
Explain in two or three plain sentences what commonly causes this kind of
error in a real transaction pipeline (data entry, currency conversion,
timezone handling, upstream system faults, and so on).

Do not restate the error. Do not invent details about the specific
transaction. Do not recommend legal or regulatory action.
"#;

/// The user turn for one error.
pub fn explanation_prompt(error: &str) -> String {
    format!(
        "Explain why the following error might have occurred in a financial transaction: {}",
        error
    )
}

/// Full message list for one error.
pub fn explanation_messages(error: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(EXPLANATION_SYSTEM_PROMPT.trim()),
        ChatMessage::user(explanation_prompt(error)),
    ]
}
