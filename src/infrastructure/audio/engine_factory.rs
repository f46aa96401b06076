use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::presentation::config::{TranscriptionProviderSetting, TranscriptionSettings};

use super::remote_whisper_engine::RemoteWhisperEngine;
use super::whisper_engine::CandleWhisperEngine;

pub struct TranscriptionEngineFactory;

impl TranscriptionEngineFactory {
    /// Builds the configured engine. Called once at startup; the local
    /// provider performs its full (expensive) model load here.
    pub fn create(
        settings: &TranscriptionSettings,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        match settings.provider {
            TranscriptionProviderSetting::Local => {
                let engine = CandleWhisperEngine::new(&settings.model)?;
                Ok(Arc::new(engine))
            }
            TranscriptionProviderSetting::Remote => {
                let api_key = settings.api_key.clone().ok_or_else(|| {
                    TranscriptionError::ModelLoadFailed(
                        "api key required for remote transcription".to_string(),
                    )
                })?;
                let base_url = settings.base_url.clone().ok_or_else(|| {
                    TranscriptionError::ModelLoadFailed(
                        "base url required for remote transcription".to_string(),
                    )
                })?;
                let engine = RemoteWhisperEngine::new(
                    api_key,
                    base_url,
                    settings.model.clone(),
                    Duration::from_secs(settings.request_timeout_secs),
                )?;
                Ok(Arc::new(engine))
            }
        }
    }
}
