use async_trait::async_trait;

/// Remote completion seam. One prompt, one reply, no retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("completion request failed: {0}")]
    ApiRequestFailed(String),
    #[error("completion request rejected: invalid credentials")]
    Unauthorized,
    #[error("rate limited by completion endpoint")]
    RateLimited,
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}
