mod config;
mod download;
mod engine;
mod error;
mod handlers;
mod models;
mod options;
mod progress;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post}
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yt_dlp::YtDlp;

use config::Config;
use handlers::{api, pages};
use state::{AppState, ToolStatus, Tools};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubegrab=info,yt_dlp=info,tower_http=debug".into())
        )
        .init();

    let config = Config::from_env();

    download::ensure_output_dir(&config.download_dir).await?;
    tracing::info!("Saving downloads to {}", config.download_dir.display());

    let mut yt_dlp = YtDlp::with_binary(&config.ytdlp_path);

    let ffmpeg = config.ffmpeg_location();
    match &ffmpeg {
        Some(path) => tracing::info!("Using ffmpeg at {}", path.display()),
        None => tracing::warn!("ffmpeg not found; merging and audio extraction will fail")
    }
    yt_dlp.set_ffmpeg_location(ffmpeg.clone());

    let ytdlp_version = match yt_dlp.check_binary().await {
        Ok(version) => {
            tracing::info!("yt-dlp version: {}", version);
            Some(version)
        }
        Err(e) => {
            tracing::warn!("yt-dlp not found or not executable: {}", e);
            None
        }
    };

    let tools = Tools {
        ytdlp: ToolStatus {
            path: Some(config.ytdlp_path.clone()),
            version: ytdlp_version
        },
        ffmpeg: ToolStatus::probe(ffmpeg, "-version").await
    };

    let state = AppState::new(Arc::new(yt_dlp), config.download_dir.clone(), tools);

    let app = create_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home_page))
        .route("/progress", get(api::progress_fragment))
        .route("/api/download", post(api::start_download))
        .route("/api/progress", get(api::progress))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
