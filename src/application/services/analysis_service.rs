use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::application::ports::{
    LlmClient, ResumeLoader, ResumeLoaderError, StagingStore, StagingStoreError,
    TranscriptionEngine, TranscriptionError,
};
use crate::domain::{FeedbackReport, Recording, StoragePath};

use super::feedback_generator::{FeedbackError, FeedbackGenerator};

/// Per-request pipeline stages. Transitions are strictly linear; `Failed` is
/// terminal and reachable from `Transcribing` or `Generating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Received,
    Transcribing,
    Generating,
    Completed,
    Failed,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Received => "received",
            AnalysisStage::Transcribing => "transcribing",
            AnalysisStage::Generating => "generating",
            AnalysisStage::Completed => "completed",
            AnalysisStage::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional second upload cross-referenced in the critique prompt.
pub struct ResumeUpload {
    pub data: Bytes,
    pub media_type: String,
}

/// Sequences one request through intake, transcription and feedback
/// generation, and releases the staged audio on every exit path.
pub struct AnalysisService<L: LlmClient> {
    staging_store: Arc<dyn StagingStore>,
    transcription_engine: Arc<dyn TranscriptionEngine>,
    feedback_generator: FeedbackGenerator<L>,
    resume_loader: Arc<dyn ResumeLoader>,
}

impl<L: LlmClient> AnalysisService<L> {
    pub fn new(
        staging_store: Arc<dyn StagingStore>,
        transcription_engine: Arc<dyn TranscriptionEngine>,
        feedback_generator: FeedbackGenerator<L>,
        resume_loader: Arc<dyn ResumeLoader>,
    ) -> Self {
        Self {
            staging_store,
            transcription_engine,
            feedback_generator,
            resume_loader,
        }
    }

    #[tracing::instrument(
        skip(self, audio, resume),
        fields(recording_id = %recording.id)
    )]
    pub async fn analyze(
        &self,
        recording: &Recording,
        audio: Bytes,
        resume: Option<ResumeUpload>,
    ) -> Result<FeedbackReport, AnalysisError> {
        tracing::debug!(
            stage = %AnalysisStage::Received,
            filename = %recording.filename,
            media_type = %recording.media_type,
            bytes = recording.size_bytes,
            "Recording received"
        );

        if audio.is_empty() {
            return Err(AnalysisError::EmptyUpload);
        }

        // A rejected resume must not leave a staged artifact behind.
        let resume_text = match resume {
            Some(upload) => Some(
                self.resume_loader
                    .extract_text(&upload.data, &upload.media_type)
                    .await
                    .map_err(AnalysisError::Resume)?,
            ),
            None => None,
        };

        let path = StoragePath::for_recording(&recording.id, &recording.filename);
        let staged = self
            .staging_store
            .store(&path, audio)
            .await
            .map_err(AnalysisError::Staging)?;
        tracing::debug!(path = %path, bytes = staged, "Recording staged");

        let outcome = self.run_pipeline(&path, resume_text.as_deref()).await;

        // Unconditional release; a failed delete is logged but never masks
        // the pipeline outcome.
        if let Err(e) = self.staging_store.delete(&path).await {
            tracing::warn!(error = %e, path = %path, "Failed to remove staged recording");
        }

        match &outcome {
            Ok(report) => tracing::info!(
                stage = %AnalysisStage::Completed,
                transcript_chars = report.transcript.len(),
                "Analysis completed"
            ),
            Err(e) => tracing::error!(
                stage = %AnalysisStage::Failed,
                error = %e,
                "Analysis failed"
            ),
        }

        outcome
    }

    async fn run_pipeline(
        &self,
        path: &StoragePath,
        resume_text: Option<&str>,
    ) -> Result<FeedbackReport, AnalysisError> {
        let audio = self
            .staging_store
            .fetch(path)
            .await
            .map_err(AnalysisError::Staging)?;

        tracing::debug!(stage = %AnalysisStage::Transcribing, bytes = audio.len(), "Transcribing recording");
        let transcript = self
            .transcription_engine
            .transcribe(&audio)
            .await
            .map_err(AnalysisError::Transcription)?;

        tracing::debug!(
            stage = %AnalysisStage::Generating,
            transcript_chars = transcript.len(),
            "Generating feedback"
        );
        let sections = self
            .feedback_generator
            .critique(&transcript, resume_text)
            .await
            .map_err(AnalysisError::Feedback)?;

        Ok(FeedbackReport::new(transcript, sections))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no audio payload provided")]
    EmptyUpload,
    #[error("resume processing failed: {0}")]
    Resume(ResumeLoaderError),
    #[error("staging failed: {0}")]
    Staging(StagingStoreError),
    #[error("transcription failed: {0}")]
    Transcription(TranscriptionError),
    #[error("feedback generation failed: {0}")]
    Feedback(FeedbackError),
}
