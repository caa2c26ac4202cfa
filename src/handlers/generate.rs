use axum::{
    Json,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::core::GenerateRequest;
use crate::errors::AppResult;
use crate::state::AppState;

const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"topic-script.mp3\"";

/// Generate a narrated podcast for a topic and return it as an MP3 download.
///
/// Validation happens inside the pipeline so that a rejected topic never
/// reaches a provider.
pub async fn generate_script(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Response> {
    info!(
        minutes = request.minutes,
        background_music = request.mix.enable_background_music,
        "Generate request received"
    );

    let audio = state.pipeline.generate(&request).await?;
    info!(bytes = audio.len(), "Generated audio");

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(audio.mime_type)),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(DOWNLOAD_DISPOSITION),
            ),
        ],
        audio.data,
    )
        .into_response())
}
