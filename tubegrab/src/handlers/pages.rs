use askama::Template;
use axum::{extract::State, response::Html};

use crate::error::AppError;
use crate::models::MediaMode;
use crate::progress::ProgressView;
use crate::state::AppState;

pub struct ModeOption {
    pub value: &'static str,
    pub label: &'static str
}

pub struct BinaryStatus {
    pub name: &'static str,
    pub summary: String,
    pub available: bool
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    modes: Vec<ModeOption>,
    download_dir: String,
    binaries: Vec<BinaryStatus>,
    view: ProgressView
}

#[tracing::instrument(skip(state))]
pub async fn home_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let modes = MediaMode::ALL
        .into_iter()
        .map(|mode| ModeOption {
            value: mode.as_str(),
            label: mode.label()
        })
        .collect();

    let binaries = [("yt-dlp", &state.tools.ytdlp), ("ffmpeg", &state.tools.ffmpeg)]
        .into_iter()
        .map(|(name, tool)| BinaryStatus {
            name,
            summary: tool.summary(),
            available: tool.available()
        })
        .collect();

    let template = HomeTemplate {
        modes,
        download_dir: state.download_dir.display().to_string(),
        binaries,
        view: state.progress.snapshot()
    };
    Ok(Html(template.render()?))
}
