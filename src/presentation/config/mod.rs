mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    LlmSettings, LoggingSettings, ServerSettings, Settings, StagingSettings,
    TranscriptionProviderSetting, TranscriptionSettings,
};
