use serde::Deserialize;

use super::index::IndexedChunk;
use crate::constants::{MAX_HISTORY_EXCHANGES, OFF_TOPIC_REPLY};

/// A previous question and the answer it received
#[derive(Debug, Clone, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// Number retrieved chunks as `[#1] ...` separated by rules
pub fn format_context(chunks: &[&IndexedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[#{}] {}", i + 1, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Prefix the question with the most recent exchanges
pub fn question_with_history(question: &str, history: &[Exchange]) -> String {
    if history.is_empty() {
        return question.to_string();
    }

    let recent = &history[history.len().saturating_sub(MAX_HISTORY_EXCHANGES)..];
    let mut text = String::from("Previous Conversation:\n");
    for (i, exchange) in recent.iter().enumerate() {
        text.push_str(&format!(
            "Q{n}: {}\nA{n}: {}\n\n",
            exchange.question,
            exchange.answer,
            n = i + 1
        ));
    }
    text.push_str(&format!("Current Question: {}", question));
    text
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert Indian Income Tax consultant. Answer using ONLY the provided context.

Context:
{context}

Question: {question}

Instructions:
- Provide clear, readable answers (8-12 lines)
- Use line breaks between different points for better readability
- Mention key deductions with section numbers when relevant
- End with the final result clearly stated
- Use simple language, avoid jargon
- If asked anything outside of ITR-related topics, respond exactly with: \"{off_topic}\"

Answer:",
        context = context,
        question = question,
        off_topic = OFF_TOPIC_REPLY,
    )
}
