use async_trait::async_trait;

/// Extracts plain text from an uploaded resume for prompt embedding.
#[async_trait]
pub trait ResumeLoader: Send + Sync {
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: &str,
    ) -> Result<String, ResumeLoaderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeLoaderError {
    #[error("unsupported resume format: {0}")]
    UnsupportedFormat(String),
    #[error("resume text extraction failed: {0}")]
    ExtractionFailed(String),
}
