mod analysis_service;
mod feedback_generator;

pub use analysis_service::{AnalysisError, AnalysisService, AnalysisStage, ResumeUpload};
pub use feedback_generator::{parse_feedback_reply, FeedbackError, FeedbackGenerator};
