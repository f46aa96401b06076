use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;

use crate::application::ports::{LlmClient, ResumeLoaderError};
use crate::application::services::{AnalysisError, ResumeUpload};
use crate::domain::{FeedbackReport, Recording};
use crate::infrastructure::observability::sanitize_excerpt;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub transcript: String,
    pub strengths: String,
    pub weaknesses: String,
    pub recommendations: String,
}

impl From<FeedbackReport> for AnalyzeResponse {
    fn from(report: FeedbackReport) -> Self {
        Self {
            transcript: report.transcript,
            strengths: report.strengths,
            weaknesses: report.weaknesses,
            recommendations: report.recommendations,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

struct AudioField {
    filename: String,
    media_type: String,
    data: Bytes,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn analyze_handler<L>(
    State(state): State<AppState<L>>,
    mut multipart: Multipart,
) -> Response
where
    L: LlmClient + 'static,
{
    let mut audio: Option<AudioField> = None;
    let mut resume: Option<ResumeUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Malformed multipart request: {e}"),
                );
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("recording").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = match field.bytes().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read audio field");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read audio upload: {e}"),
                        );
                    }
                };
                tracing::debug!(filename = %filename, media_type = %media_type, bytes = data.len(), "Audio field received");
                audio = Some(AudioField {
                    filename,
                    media_type,
                    data,
                });
            }
            "resume" => {
                let media_type = field.content_type().unwrap_or("text/plain").to_string();
                let data = match field.bytes().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read resume field");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read resume upload: {e}"),
                        );
                    }
                };
                resume = Some(ResumeUpload { data, media_type });
            }
            _ => continue,
        }
    }

    let Some(audio) = audio else {
        tracing::warn!("Analyze request with no audio file");
        return error_response(StatusCode::BAD_REQUEST, "No audio file uploaded".to_string());
    };

    if !Recording::accepts_media_type(&audio.media_type) {
        tracing::warn!(media_type = %audio.media_type, "Rejected non-audio upload");
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid file type. Please upload audio.".to_string(),
        );
    }

    if audio.data.is_empty() {
        tracing::warn!("Analyze request with empty audio payload");
        return error_response(
            StatusCode::BAD_REQUEST,
            "Uploaded audio file is empty".to_string(),
        );
    }

    let recording = Recording::new(audio.filename, audio.media_type, audio.data.len() as u64);

    match state
        .analysis_service
        .analyze(&recording, audio.data, resume)
        .await
    {
        Ok(report) => {
            tracing::debug!(
                transcript = %sanitize_excerpt(&report.transcript),
                "Returning feedback report"
            );
            (StatusCode::OK, Json(AnalyzeResponse::from(report))).into_response()
        }
        Err(e) => {
            let status = error_status(&e);
            tracing::error!(error = %e, status = %status, "Analyze request failed");
            error_response(status, e.to_string())
        }
    }
}

fn error_status(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::EmptyUpload => StatusCode::BAD_REQUEST,
        AnalysisError::Resume(ResumeLoaderError::UnsupportedFormat(_)) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        AnalysisError::Resume(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Staging(_) | AnalysisError::Transcription(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AnalysisError::Feedback(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { detail })).into_response()
}
