/// Substitute for a feedback section the model omitted or left blank.
pub const SECTION_PLACEHOLDER: &str = "N/A";

/// The three critique sections extracted from the model reply.
///
/// Invariant: no field is ever empty; absent content is replaced by
/// [`SECTION_PLACEHOLDER`] at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSections {
    pub strengths: String,
    pub weaknesses: String,
    pub recommendations: String,
}

impl FeedbackSections {
    pub fn new(strengths: String, weaknesses: String, recommendations: String) -> Self {
        Self {
            strengths: or_placeholder(strengths),
            weaknesses: or_placeholder(weaknesses),
            recommendations: or_placeholder(recommendations),
        }
    }

}

fn or_placeholder(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        SECTION_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Completed pipeline result: the critique plus the transcript echoed back
/// for client display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackReport {
    pub transcript: String,
    pub strengths: String,
    pub weaknesses: String,
    pub recommendations: String,
}

impl FeedbackReport {
    pub fn new(transcript: String, sections: FeedbackSections) -> Self {
        Self {
            transcript,
            strengths: sections.strengths,
            weaknesses: sections.weaknesses,
            recommendations: sections.recommendations,
        }
    }
}
