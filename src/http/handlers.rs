use super::state::{AppState, RecordingMode};
use crate::error::{RecorderError, RecorderResult};
use crate::recorder::{
    RecorderSnapshot, SessionState, SessionSummary, StartOutcome, StopOutcome, ToggleOutcome,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: RecorderSnapshot,

    /// Whether the Download control is enabled
    pub can_download: bool,

    /// Label for the Start/Stop control
    pub toggle_label: String,

    pub mode: RecordingMode,
}

#[derive(Debug, Serialize)]
pub struct RecorderActionResponse {
    pub status: SessionState,
    pub session_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: usize,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: RecordingMode,
}

#[derive(Debug, Serialize)]
pub struct ModeOption {
    pub value: RecordingMode,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModeResponse {
    pub selected: RecordingMode,
    pub options: Vec<ModeOption>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
    /// Text suitable for showing to the user
    pub notice: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /recorder/status
/// Current recorder state for binding the controls
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.recorder.snapshot();
    let mode = *state.mode.read().await;

    let toggle_label = match snapshot.state {
        SessionState::Recording | SessionState::Requesting => "Stop Recording",
        SessionState::Stopped => "Stopping...",
        SessionState::Idle => "Start Recording",
    };

    Json(StatusResponse {
        can_download: snapshot.can_export(),
        toggle_label: toggle_label.to_string(),
        mode,
        snapshot,
    })
}

/// POST /recorder/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    info!("Start requested over HTTP");
    start_response(state.recorder.start().await)
}

/// POST /recorder/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    info!("Stop requested over HTTP");
    let result = state.recorder.stop().await;
    stop_response(result, state.recorder.state())
}

/// POST /recorder/toggle
/// The combined Start/Stop control
pub async fn toggle_recording(State(state): State<AppState>) -> Response {
    match state.recorder.toggle().await {
        Ok(ToggleOutcome::Start(outcome)) => start_response(Ok(outcome)),
        Ok(ToggleOutcome::Stop(outcome)) => stop_response(Ok(outcome), state.recorder.state()),
        Err(e) => error_response(&e),
    }
}

/// GET /recorder/download
/// Stream the assembled recording as an attachment
pub async fn download_recording(State(state): State<AppState>) -> Response {
    match state.recorder.artifact().await {
        Some(artifact) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, artifact.mime_type.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.file_name),
                ),
            ],
            artifact.data,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// POST /recorder/export
/// Save the assembled recording into the configured directory
pub async fn export_recording(State(state): State<AppState>) -> Response {
    match state.recorder.export(state.sink.as_ref()).await {
        Ok(Some(artifact)) => {
            let path = state
                .sink
                .path_for(&artifact.file_name)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(ExportResponse {
                    file_name: artifact.file_name.clone(),
                    mime_type: artifact.mime_type.clone(),
                    bytes: artifact.len(),
                    path,
                }),
            )
                .into_response()
        }
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Export failed: {}", e);
            error_response(&e)
        }
    }
}

/// POST /recorder/reset
/// Discard the accumulated recording
pub async fn reset_recording(State(state): State<AppState>) -> Response {
    match state.recorder.reset().await {
        Ok(()) => (
            StatusCode::OK,
            Json(RecorderActionResponse {
                status: state.recorder.state(),
                session_id: None,
                message: "Recording discarded".to_string(),
                summary: None,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Reset rejected: {}", e);
            error_response(&e)
        }
    }
}

/// GET /recorder/mode
pub async fn get_mode(State(state): State<AppState>) -> impl IntoResponse {
    let selected = *state.mode.read().await;
    Json(ModeResponse {
        selected,
        options: RecordingMode::ALL
            .iter()
            .map(|mode| ModeOption {
                value: *mode,
                label: mode.label(),
            })
            .collect(),
    })
}

/// PUT /recorder/mode
pub async fn set_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> impl IntoResponse {
    *state.mode.write().await = req.mode;
    info!("Recording mode set to {}", req.mode.label());
    get_mode(State(state)).await
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Helpers
// ============================================================================

fn start_response(result: RecorderResult<StartOutcome>) -> Response {
    match result {
        Ok(StartOutcome::Started { session_id }) => (
            StatusCode::OK,
            Json(RecorderActionResponse {
                status: SessionState::Recording,
                message: format!("Recording started ({})", session_id),
                session_id: Some(session_id),
                summary: None,
            }),
        )
            .into_response(),
        Ok(StartOutcome::AlreadyActive(current)) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                code: "ALREADY_ACTIVE".to_string(),
                error: format!("Recorder is already {:?}", current),
                notice: "A recording is already in progress".to_string(),
            }),
        )
            .into_response(),
        Ok(StartOutcome::Cancelled(summary)) => (
            StatusCode::OK,
            Json(RecorderActionResponse {
                status: SessionState::Idle,
                session_id: Some(summary.session_id.clone()),
                message: "Recording cancelled".to_string(),
                summary: Some(summary),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            error_response(&e)
        }
    }
}

fn stop_response(result: RecorderResult<StopOutcome>, current: SessionState) -> Response {
    match result {
        Ok(StopOutcome::Stopped(summary)) => (
            StatusCode::OK,
            Json(RecorderActionResponse {
                status: SessionState::Idle,
                session_id: Some(summary.session_id.clone()),
                message: "Recording stopped".to_string(),
                summary: Some(summary),
            }),
        )
            .into_response(),
        Ok(StopOutcome::CancelPending) => (
            StatusCode::ACCEPTED,
            Json(RecorderActionResponse {
                status: SessionState::Requesting,
                session_id: None,
                message: "Recording will stop once capture is granted".to_string(),
                summary: None,
            }),
        )
            .into_response(),
        Ok(StopOutcome::NotRecording) => (
            StatusCode::OK,
            Json(RecorderActionResponse {
                status: current,
                session_id: None,
                message: "Not recording".to_string(),
                summary: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            error_response(&e)
        }
    }
}

fn error_response(e: &RecorderError) -> Response {
    let status = match e {
        RecorderError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        RecorderError::NoCaptureSource(_) => StatusCode::SERVICE_UNAVAILABLE,
        RecorderError::Busy(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            code: e.code().to_string(),
            error: e.to_string(),
            notice: e.notice(),
        }),
    )
        .into_response()
}
