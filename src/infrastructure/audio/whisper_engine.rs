use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

use super::audio_decoder::decode_to_mono_16k;

const MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";
const MAX_DECODE_TOKENS: usize = 224;

/// Local Whisper transcription via candle.
///
/// The model is loaded once at construction (startup) and shared across
/// requests. Inference mutates the decoder KV cache, so calls are
/// serialized through a mutex, and the whole decode loop runs on a
/// blocking worker to keep the async runtime responsive.
pub struct CandleWhisperEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
}

impl CandleWhisperEngine {
    pub fn new(model_id: &str) -> Result<Self, TranscriptionError> {
        let device = Device::Cpu;

        tracing::info!(
            device = ?device,
            model = model_id,
            "Loading Whisper transcription model"
        );

        let api = Api::new().map_err(|e| TranscriptionError::ModelLoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("config.json: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("tokenizer.json: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("model.safetensors: {e}")))?;

        let mel_repo = api.repo(Repo::new(MEL_FILTERS_REPO.to_string(), RepoType::Model));
        let mel_path = mel_repo
            .get("melfilters.bytes")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("melfilters.bytes: {e}")))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("read config: {e}")))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("parse config: {e}")))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("tokenizer: {e}")))?;

        let mel_bytes = std::fs::read(&mel_path)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("mel filters: {e}")))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(|e| TranscriptionError::ModelLoadFailed(format!("weights: {e}")))?
        };

        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("model: {e}")))?;

        tracing::info!("Whisper model loaded");

        Ok(Self {
            inner: Arc::new(EngineInner {
                model: Mutex::new(model),
                tokenizer,
                config,
                device,
                mel_filters,
            }),
        })
    }
}

#[async_trait]
impl TranscriptionEngine for CandleWhisperEngine {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError> {
        let pcm = decode_to_mono_16k(audio)?;

        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.run_inference(&pcm))
            .await
            .map_err(|e| TranscriptionError::InferenceFailed(format!("worker: {e}")))?
    }
}

impl EngineInner {
    fn run_inference(&self, pcm: &[f32]) -> Result<String, TranscriptionError> {
        let mut mel_tensors = Vec::new();

        for chunk in pcm.chunks(m::N_SAMPLES) {
            let samples = if chunk.len() < m::N_SAMPLES {
                let mut padded = chunk.to_vec();
                padded.resize(m::N_SAMPLES, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;

            let mel = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(|e| TranscriptionError::InferenceFailed(format!("mel tensor: {e}")))?;

            mel_tensors.push(mel);
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| TranscriptionError::InferenceFailed("model lock poisoned".to_string()))?;

        let mut segments: Vec<String> = Vec::new();

        for (i, mel) in mel_tensors.iter().enumerate() {
            tracing::debug!(segment = i, "Transcribing audio segment");
            let text = self.decode_segment(&mut model, mel)?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = segments.join(" ");

        tracing::info!(
            segments = segments.len(),
            chars = transcript.len(),
            "Transcription completed"
        );

        Ok(transcript)
    }

    fn decode_segment(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
    ) -> Result<String, TranscriptionError> {
        let sot_token = self.token_id(m::SOT_TOKEN)?;
        let transcribe_token = self.token_id(m::TRANSCRIBE_TOKEN)?;
        let no_timestamps_token = self.token_id(m::NO_TIMESTAMPS_TOKEN)?;
        let eot_token = self.token_id(m::EOT_TOKEN)?;

        let audio_features = model
            .encoder
            .forward(mel, true)
            .map_err(|e| TranscriptionError::InferenceFailed(format!("encoder: {e}")))?;

        let mut tokens = vec![sot_token];
        // Multilingual checkpoints expect a language token after SOT.
        if let Some(english) = self.tokenizer.token_to_id("<|en|>") {
            tokens.push(english);
        }
        tokens.push(transcribe_token);
        tokens.push(no_timestamps_token);

        let prefix_len = tokens.len();
        let mut text = String::new();

        for _ in 0..MAX_DECODE_TOKENS {
            let token_tensor = Tensor::new(tokens.as_slice(), &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(|e| TranscriptionError::InferenceFailed(format!("tokens: {e}")))?;

            let decoder_output = model
                .decoder
                .forward(&token_tensor, &audio_features, tokens.len() == prefix_len)
                .map_err(|e| TranscriptionError::InferenceFailed(format!("decoder: {e}")))?;

            let logits = decoder_output
                .squeeze(0)
                .and_then(|t| model.decoder.final_linear(&t))
                .map_err(|e| TranscriptionError::InferenceFailed(format!("linear: {e}")))?;

            let seq_len = logits
                .dim(0)
                .map_err(|e| TranscriptionError::InferenceFailed(e.to_string()))?;

            let next_token = logits
                .get(seq_len - 1)
                .and_then(|t| t.argmax(0))
                .and_then(|t| t.to_scalar::<u32>())
                .map_err(|e| TranscriptionError::InferenceFailed(format!("argmax: {e}")))?;

            if next_token == eot_token {
                break;
            }

            tokens.push(next_token);

            if let Some(piece) = self.tokenizer.id_to_token(next_token) {
                let piece = piece.replace('Ġ', " ").replace('▁', " ");
                text.push_str(&piece);
            }
        }

        model.reset_kv_cache();

        Ok(text.trim().to_string())
    }

    fn token_id(&self, token: &str) -> Result<u32, TranscriptionError> {
        self.tokenizer
            .token_to_id(token)
            .ok_or_else(|| TranscriptionError::InferenceFailed(format!("token not found: {token}")))
    }
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
