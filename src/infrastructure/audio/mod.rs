pub mod audio_decoder;
mod engine_factory;
mod remote_whisper_engine;
mod whisper_engine;

pub use engine_factory::TranscriptionEngineFactory;
pub use remote_whisper_engine::RemoteWhisperEngine;
pub use whisper_engine::CandleWhisperEngine;
