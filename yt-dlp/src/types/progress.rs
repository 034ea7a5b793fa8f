const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Other(String)
}

impl ProgressStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "downloading" => ProgressStatus::Downloading,
            "finished" => ProgressStatus::Finished,
            other => ProgressStatus::Other(other.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub status: ProgressStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    pub speed: Option<f64>,
    pub eta: Option<f64>,
    pub fragment_index: Option<u32>,
    pub fragment_count: Option<u32>
}

impl DownloadProgress {
    pub fn downloading(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes,
            total_bytes,
            total_bytes_estimate: None,
            speed: None,
            eta: None,
            fragment_index: None,
            fragment_count: None
        }
    }

    pub fn finished(downloaded_bytes: u64) -> Self {
        Self {
            status: ProgressStatus::Finished,
            total_bytes: Some(downloaded_bytes),
            ..Self::downloading(downloaded_bytes, None)
        }
    }

    /// Exact size when yt-dlp knows it, otherwise its running estimate.
    pub fn known_total(&self) -> Option<u64> {
        self.total_bytes
            .or(self.total_bytes_estimate)
            .filter(|t| *t > 0)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        self.known_total()
            .map(|total| (self.downloaded_bytes as f64 / total as f64).clamp(0.0, 1.0))
    }

    pub fn format_speed(&self) -> Option<String> {
        self.speed.map(|s| {
            if s >= 1_000_000.0 {
                format!("{:.2} MB/s", s / 1_000_000.0)
            } else if s >= 1_000.0 {
                format!("{:.2} KB/s", s / 1_000.0)
            } else {
                format!("{s:.0} B/s")
            }
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn format_eta(&self) -> Option<String> {
        self.eta.map(|e| {
            let secs = e as u64;
            let mins = secs / 60;
            let hours = mins / 60;
            if hours > 0 {
                format!("{}:{:02}:{:02}", hours, mins % 60, secs % 60)
            } else {
                format!("{}:{:02}", mins, secs % 60)
            }
        })
    }
}

/// Mebibytes with two decimals, e.g. `47.68MB`.
#[allow(clippy::cast_precision_loss)]
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / MIB)
}

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Extracting { url: String },
    DownloadStarted { filename: String },
    AlreadyDownloaded { filename: String },
    Progress(DownloadProgress),
    PostProcessing { status: String },
    MergingFormats,
    /// Terminal: yt-dlp exited successfully.
    Finished { filename: Option<String> },
    /// Terminal: yt-dlp exited with a non-zero code.
    Failed { code: i32, message: String },
    Error { message: String },
    Warning { message: String }
}

impl DownloadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadEvent::Finished { .. } | DownloadEvent::Failed { .. })
    }
}
