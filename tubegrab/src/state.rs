use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::engine::Engine;
use crate::progress::SharedProgress;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn Engine>,
    pub download_dir: PathBuf,
    pub progress: SharedProgress,
    /// Held for the whole engine run; only one download at a time.
    pub in_flight: Arc<Mutex<()>>,
    pub tools: Tools
}

/// External programs as found at startup.
#[derive(Clone, Debug, Default)]
pub struct Tools {
    pub ytdlp: ToolStatus,
    pub ffmpeg: ToolStatus
}

#[derive(Clone, Debug, Default)]
pub struct ToolStatus {
    pub path: Option<PathBuf>,
    pub version: Option<String>
}

impl ToolStatus {
    /// Runs `<path> <flag>` once and keeps the first line it prints.
    pub async fn probe(path: Option<PathBuf>, flag: &str) -> Self {
        let version = match &path {
            Some(binary) => binary_version(binary, flag).await,
            None => None
        };
        Self { path, version }
    }

    pub fn available(&self) -> bool {
        self.version.is_some()
    }

    pub fn summary(&self) -> String {
        match (&self.version, &self.path) {
            (Some(version), Some(path)) => format!("{version} ({})", path.display()),
            (Some(version), None) => version.clone(),
            (None, Some(path)) => format!("not found at {}", path.display()),
            (None, None) => "not found".to_string()
        }
    }
}

async fn binary_version(binary: &Path, flag: &str) -> Option<String> {
    let output = tokio::process::Command::new(binary)
        .arg(flag)
        .output()
        .await
        .ok()?;
    if output.status.success() {
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
    } else {
        None
    }
}

impl AppState {
    pub fn new(engine: Arc<dyn Engine>, download_dir: PathBuf, tools: Tools) -> Self {
        Self {
            engine,
            download_dir,
            progress: SharedProgress::default(),
            in_flight: Arc::new(Mutex::new(())),
            tools
        }
    }
}
