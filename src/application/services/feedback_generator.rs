use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{LlmClient, LlmClientError};
use crate::domain::FeedbackSections;

const PROMPT_TEMPLATE: &str = "\
You are an expert interview coach. Analyze the following interview transcript.
{resume_context}Identify the candidate's strengths, weaknesses, and provide actionable recommendations.
Your feedback should be insightful and directly related to the content of the interview.

Format your response as a single JSON object with three keys: 'strengths', 'weaknesses', 'recommendations'.";

/// Turns a transcript into the three critique sections: fixed prompt, one
/// remote completion, best-effort parse.
pub struct FeedbackGenerator<L: LlmClient> {
    llm_client: Arc<L>,
}

impl<L: LlmClient> FeedbackGenerator<L> {
    pub fn new(llm_client: Arc<L>) -> Self {
        Self { llm_client }
    }

    #[tracing::instrument(skip(self, transcript, resume_text))]
    pub async fn critique(
        &self,
        transcript: &str,
        resume_text: Option<&str>,
    ) -> Result<FeedbackSections, FeedbackError> {
        let system_prompt = build_system_prompt(resume_text);

        let reply = self
            .llm_client
            .complete(&system_prompt, transcript)
            .await
            .map_err(FeedbackError::Completion)?;

        tracing::debug!(reply_chars = reply.len(), "Feedback reply received");

        Ok(parse_feedback_reply(&reply))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("completion: {0}")]
    Completion(#[from] LlmClientError),
}

fn build_system_prompt(resume_text: Option<&str>) -> String {
    let resume_context = match resume_text {
        Some(text) => format!(
            "The candidate's resume is provided below. Use it to cross-reference \
             their spoken experience. Tailor your feedback based on both the \
             interview and the resume.\n\n--- RESUME ---\n{text}\n--- END RESUME ---\n"
        ),
        None => String::new(),
    };

    PROMPT_TEMPLATE.replace("{resume_context}", &resume_context)
}

/// Decomposes a model reply into the three sections. Never fails: a reply
/// that cannot be parsed yields placeholder sections, not an error.
pub fn parse_feedback_reply(reply: &str) -> FeedbackSections {
    if let Some(sections) = parse_json_reply(reply) {
        return sections;
    }
    parse_labeled_reply(reply)
}

fn parse_json_reply(reply: &str) -> Option<FeedbackSections> {
    let body = strip_code_fence(reply.trim());
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    Some(FeedbackSections::new(
        section_text(object.get("strengths")),
        section_text(object.get("weaknesses")),
        section_text(object.get("recommendations")),
    ))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

fn section_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(item_line)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn item_line(item: &Value) -> String {
    match item {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Strengths,
    Weaknesses,
    Recommendations,
}

fn parse_labeled_reply(reply: &str) -> FeedbackSections {
    let mut strengths: Vec<String> = Vec::new();
    let mut weaknesses: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    let mut current: Option<Section> = None;

    for line in reply.lines() {
        if let Some((section, remainder)) = match_section_label(line) {
            current = Some(section);
            if !remainder.is_empty() {
                match section {
                    Section::Strengths => strengths.push(remainder.to_string()),
                    Section::Weaknesses => weaknesses.push(remainder.to_string()),
                    Section::Recommendations => recommendations.push(remainder.to_string()),
                }
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match current {
            Some(Section::Strengths) => strengths.push(trimmed.to_string()),
            Some(Section::Weaknesses) => weaknesses.push(trimmed.to_string()),
            Some(Section::Recommendations) => recommendations.push(trimmed.to_string()),
            None => {}
        }
    }

    FeedbackSections::new(
        strengths.join("\n"),
        weaknesses.join("\n"),
        recommendations.join("\n"),
    )
}

/// Matches a section heading such as `Strengths:`, `**Weaknesses**` or
/// `3. Recommendations - ...`, returning any content on the same line.
fn match_section_label(line: &str) -> Option<(Section, &str)> {
    let stripped = line.trim().trim_start_matches(|c: char| {
        matches!(c, '#' | '*' | '-' | '>' | '.' | ')' | ' ') || c.is_ascii_digit()
    });

    let lower = stripped.to_lowercase();
    let (section, label_len) = if lower.starts_with("strengths") {
        (Section::Strengths, "strengths".len())
    } else if lower.starts_with("weaknesses") {
        (Section::Weaknesses, "weaknesses".len())
    } else if lower.starts_with("recommendations") {
        (Section::Recommendations, "recommendations".len())
    } else {
        return None;
    };

    // A heading, not prose: the label must end the word.
    let after = stripped[label_len..].trim_start();
    if after.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        return None;
    }

    let remainder = after.trim_start_matches(['*', ':', '-']).trim();
    Some((section, remainder))
}
