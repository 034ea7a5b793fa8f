use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use yt_dlp::{DownloadProgress, ProgressStatus, format_megabytes};

pub const COMPLETE_TEXT: &str = "Download complete! Processing file...";
const STARTING_TEXT: &str = "Starting download...";

/// The two display slots (bar and status line) plus the bits the page uses to
/// decide whether to show them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressView {
    pub fraction: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    pub active: bool
}

impl ProgressView {
    pub fn percent_label(&self) -> String {
        format!("{:.1}", self.fraction * 100.0)
    }

    /// Speed and ETA for the line under the bar, empty when neither is known.
    pub fn detail(&self) -> String {
        match (&self.speed, &self.eta) {
            (Some(speed), Some(eta)) => format!("{speed}, ETA {eta}"),
            (Some(speed), None) => speed.clone(),
            (None, Some(eta)) => format!("ETA {eta}"),
            (None, None) => String::new()
        }
    }
}

/// The view shared between the running download and the page handlers.
///
/// Writes are short and never held across an await, so a blocking lock is
/// enough and lets the reporter reset the view from `Drop`.
#[derive(Debug, Clone, Default)]
pub struct SharedProgress(Arc<RwLock<ProgressView>>);

impl SharedProgress {
    pub fn snapshot(&self) -> ProgressView {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, apply: impl FnOnce(&mut ProgressView)) {
        let mut view = self.0.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut view);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub fraction: f64,
    pub text: String,
    pub speed: Option<String>,
    pub eta: Option<String>
}

/// Derives what to show for one engine progress tick.
///
/// Returns `None` while the total size is unknown and for statuses other than
/// downloading/finished.
pub fn display_update(progress: &DownloadProgress) -> Option<DisplayUpdate> {
    match progress.status {
        ProgressStatus::Downloading => {
            let total = progress.known_total()?;
            let fraction = progress.fraction()?;
            Some(DisplayUpdate {
                fraction,
                text: format!(
                    "Downloading: {:.1}% ({} / {})",
                    fraction * 100.0,
                    format_megabytes(progress.downloaded_bytes),
                    format_megabytes(total)
                ),
                speed: progress.format_speed(),
                eta: progress.format_eta()
            })
        }
        ProgressStatus::Finished => Some(DisplayUpdate {
            fraction: 1.0,
            text: COMPLETE_TEXT.to_string(),
            speed: None,
            eta: None
        }),
        ProgressStatus::Other(_) => None
    }
}

/// Writes display updates into slots owned by whoever created it.
///
/// The view is active from [`ProgressReporter::begin`] until the reporter is
/// dropped, however the run ends.
pub struct ProgressReporter {
    view: SharedProgress
}

impl ProgressReporter {
    pub fn begin(view: SharedProgress) -> Self {
        view.update(|view| {
            *view = ProgressView {
                fraction: 0.0,
                text: STARTING_TEXT.to_string(),
                speed: None,
                eta: None,
                active: true
            };
        });
        Self { view }
    }

    pub fn report(&self, progress: &DownloadProgress) {
        let Some(update) = display_update(progress) else {
            return;
        };
        self.view.update(|view| {
            view.fraction = update.fraction;
            view.text = update.text;
            view.speed = update.speed;
            view.eta = update.eta;
        });
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.view.update(|view| view.active = false);
    }
}
