use async_trait::async_trait;

use crate::application::ports::{ResumeLoader, ResumeLoaderError};

use super::text_sanitizer::normalize_resume_text;

const ACCEPTED_TYPES: &[&str] = &["text/plain", "text/markdown"];

/// Accepts plain-text and markdown resumes. Other formats are rejected so
/// the client gets a clear unsupported-format response instead of garbage
/// text reaching the prompt.
#[derive(Default)]
pub struct PlainTextResumeLoader;

impl PlainTextResumeLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResumeLoader for PlainTextResumeLoader {
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: &str,
    ) -> Result<String, ResumeLoaderError> {
        let base_type = media_type.split(';').next().unwrap_or(media_type).trim();

        if !ACCEPTED_TYPES.contains(&base_type) {
            return Err(ResumeLoaderError::UnsupportedFormat(base_type.to_string()));
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| ResumeLoaderError::ExtractionFailed(format!("invalid utf-8: {e}")))?;

        Ok(normalize_resume_text(text))
    }
}
