mod llm_client;
mod resume_loader;
mod staging_store;
mod transcription_engine;

pub use llm_client::{LlmClient, LlmClientError};
pub use resume_loader::{ResumeLoader, ResumeLoaderError};
pub use staging_store::{StagingStore, StagingStoreError};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
