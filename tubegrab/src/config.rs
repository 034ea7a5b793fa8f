use std::ffi::OsString;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 8000;

#[cfg(windows)]
const FFMPEG_BIN: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BIN: &str = "ffmpeg";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub download_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    pub ffmpeg_override: Option<PathBuf>
}

impl Config {
    /// Reads `PORT`, `DOWNLOAD_DIR`, `YTDLP_PATH` and `FFMPEG_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid PORT {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT
        };

        let download_dir = non_empty("DOWNLOAD_DIR").map_or_else(default_download_dir, PathBuf::from);

        Self {
            port,
            download_dir,
            ytdlp_path: non_empty("YTDLP_PATH").map_or_else(|| PathBuf::from("yt-dlp"), PathBuf::from),
            ffmpeg_override: non_empty("FFMPEG_PATH").map(PathBuf::from)
        }
    }

    pub fn ffmpeg_location(&self) -> Option<PathBuf> {
        resolve_ffmpeg(self.ffmpeg_override.as_deref(), std::env::var_os("PATH"))
    }
}

fn default_download_dir() -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join("downloads"))
        .unwrap_or_else(|_| PathBuf::from("downloads"))
}

/// An override that points at a real file wins; otherwise the first `ffmpeg`
/// on `search_path`. `None` leaves discovery to yt-dlp, which then fails any
/// merge or audio extraction with its own error.
pub fn resolve_ffmpeg(override_path: Option<&Path>, search_path: Option<OsString>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!("FFMPEG_PATH {} is not a file, searching PATH", path.display());
    }

    let search_path = search_path?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(FFMPEG_BIN))
        .find(|candidate| candidate.is_file())
}
