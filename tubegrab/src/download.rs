use std::path::{Path, PathBuf};

use tokio_stream::StreamExt;
use yt_dlp::{DownloadEvent, DownloadProgress, ProgressStatus};

use crate::engine::Engine;
use crate::models::{DownloadRequest, MediaMode};
use crate::options::build_options;
use crate::progress::ProgressReporter;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error"
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Please enter a valid URL.")]
    EmptyUrl,

    #[error("A download is already running, wait for it to finish.")]
    Busy,

    #[error("Could not create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("An error occurred: {0}")]
    Engine(String),

    #[error("The download stopped unexpectedly: {0}")]
    Aborted(String)
}

impl DownloadError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::EmptyUrl | Self::Busy => Severity::Warning,
            Self::OutputDir { .. } | Self::Engine(_) | Self::Aborted(_) => Severity::Error
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub output_dir: PathBuf,
    pub last_file: Option<String>,
    pub completed_transfers: usize,
    /// Per-item errors yt-dlp skipped past in a playlist run.
    pub item_errors: Vec<String>
}

impl DownloadSummary {
    fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            last_file: None,
            completed_transfers: 0,
            item_errors: Vec::new()
        }
    }

    /// Number of distinct playlist entries that failed.
    ///
    /// yt-dlp prefixes item errors with `[extractor] id:`, and one entry can
    /// report several, so errors are grouped by that prefix.
    pub fn failed_items(&self) -> usize {
        let mut keys: Vec<&str> = self.item_errors.iter().map(String::as_str).map(item_key).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    pub fn message(&self) -> String {
        match self.failed_items() {
            0 => format!("Download completed! Files saved in: {}", self.output_dir.display()),
            n => format!(
                "Download completed with {n} failed item(s). Files saved in: {}",
                self.output_dir.display()
            )
        }
    }
}

fn item_key(message: &str) -> &str {
    if !message.starts_with('[') {
        return message;
    }
    let Some(close) = message.find(']') else {
        return message;
    };
    match message[close..].find(": ") {
        Some(offset) => &message[..close + offset],
        None => message
    }
}

/// Creates the output directory if needed. Safe to call repeatedly.
pub async fn ensure_output_dir(dir: &Path) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| DownloadError::OutputDir {
            path: dir.to_path_buf(),
            source
        })
}

/// Entry point for one button press: validate, claim the single download
/// slot, run the engine and report the outcome.
///
/// The run happens on its own task holding the slot, so it finishes even if
/// the caller stops waiting for it.
pub async fn submit(
    state: &AppState,
    url: &str,
    mode: MediaMode,
    is_playlist: bool
) -> Result<DownloadSummary, DownloadError> {
    let Some(request) = DownloadRequest::new(url, mode, is_playlist) else {
        tracing::warn!("Rejected download request with empty URL");
        return Err(DownloadError::EmptyUrl);
    };

    let Ok(guard) = state.in_flight.clone().try_lock_owned() else {
        tracing::warn!("Rejected download of {} while another is running", request.url);
        return Err(DownloadError::Busy);
    };

    let state = state.clone();
    let task = tokio::spawn(async move {
        let _guard = guard;
        let reporter = ProgressReporter::begin(state.progress.clone());
        let result = run_download(state.engine.as_ref(), &state.download_dir, &request, &reporter).await;
        drop(reporter);

        match &result {
            Ok(summary) => tracing::info!(
                "Download of {} finished: {} transfer(s), {} failed item(s), last file {}",
                request.url,
                summary.completed_transfers,
                summary.failed_items(),
                summary.last_file.as_deref().unwrap_or("unknown")
            ),
            Err(e) => tracing::error!("Download of {} failed: {}", request.url, e)
        }

        result
    });

    task.await.map_err(|e| {
        tracing::error!("Download task failed: {}", e);
        DownloadError::Aborted(e.to_string())
    })?
}

/// Runs the engine once for `request`, forwarding progress to `reporter`.
///
/// A non-zero exit is a failure, except for playlists that managed at least one
/// transfer: those succeed and carry the skipped item errors.
#[tracing::instrument(skip(engine, request, reporter), fields(url = %request.url, mode = %request.mode))]
pub async fn run_download(
    engine: &dyn Engine,
    output_dir: &Path,
    request: &DownloadRequest,
    reporter: &ProgressReporter
) -> Result<DownloadSummary, DownloadError> {
    ensure_output_dir(output_dir).await?;

    let options = build_options(request, output_dir);
    let mut summary = DownloadSummary::new(output_dir);

    let mut stream = engine.download(&request.url, &options);

    while let Some(event) = stream.next().await {
        let event = event.map_err(|e| DownloadError::Engine(e.to_string()))?;
        match event {
            DownloadEvent::Extracting { url } => {
                tracing::debug!("Extracting {}", url);
            }
            DownloadEvent::DownloadStarted { filename } => {
                tracing::info!("Downloading to {}", filename);
            }
            DownloadEvent::AlreadyDownloaded { filename } => {
                tracing::info!("Already downloaded: {}", filename);
                summary.completed_transfers += 1;
                reporter.report(&DownloadProgress::finished(0));
            }
            DownloadEvent::Progress(progress) => {
                if progress.status == ProgressStatus::Finished {
                    summary.completed_transfers += 1;
                }
                reporter.report(&progress);
            }
            DownloadEvent::PostProcessing { status } => {
                tracing::info!("Post-processing: {}", status);
            }
            DownloadEvent::MergingFormats => {
                tracing::info!("Merging formats");
            }
            DownloadEvent::Warning { message } => {
                tracing::warn!("yt-dlp: {}", message);
            }
            DownloadEvent::Error { message } => {
                tracing::warn!("yt-dlp error: {}", message);
                summary.item_errors.push(message);
            }
            DownloadEvent::Finished { filename } => {
                summary.last_file = filename;
                return Ok(summary);
            }
            DownloadEvent::Failed { code, message } => {
                if request.is_playlist && summary.completed_transfers > 0 {
                    tracing::warn!("Playlist finished with exit code {} after item errors", code);
                    if summary.item_errors.is_empty() {
                        summary.item_errors.push(message);
                    }
                    return Ok(summary);
                }
                return Err(DownloadError::Engine(message));
            }
        }
    }

    Err(DownloadError::Engine(
        "yt-dlp stopped without reporting a result".to_string()
    ))
}
