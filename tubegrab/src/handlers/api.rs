use askama::Template;
use axum::{
    extract::{Form, State},
    response::{Html, Json}
};

use crate::download;
use crate::error::AppError;
use crate::models::DownloadForm;
use crate::progress::ProgressView;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "partials/status.html")]
struct StatusTemplate {
    kind: &'static str,
    message: String
}

#[derive(Template)]
#[template(path = "partials/progress.html")]
struct ProgressTemplate {
    view: ProgressView
}

/// Runs the download to completion and answers with the terminal status line.
#[tracing::instrument(skip(state))]
pub async fn start_download(
    State(state): State<AppState>,
    Form(input): Form<DownloadForm>
) -> Result<Html<String>, AppError> {
    let template = match download::submit(&state, &input.url, input.mode, input.is_playlist()).await {
        Ok(summary) => StatusTemplate {
            kind: "success",
            message: summary.message()
        },
        Err(e) => StatusTemplate {
            kind: e.severity().as_str(),
            message: e.to_string()
        }
    };
    Ok(Html(template.render()?))
}

pub async fn progress(State(state): State<AppState>) -> Json<serde_json::Value> {
    let view = state.progress.snapshot();
    let busy = state.in_flight.try_lock().is_err();
    Json(serde_json::json!({
        "progress": view,
        "busy": busy
    }))
}

pub async fn progress_fragment(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = state.progress.snapshot();
    Ok(Html(ProgressTemplate { view }.render()?))
}
