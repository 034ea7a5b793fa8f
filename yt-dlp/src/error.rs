use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("yt-dlp binary not found: {0}")]
    BinaryNotFound(PathBuf),

    #[error("yt-dlp binary not executable: {0}")]
    BinaryNotExecutable(PathBuf),

    #[error("failed to execute yt-dlp: {0}")]
    ExecutionFailed(#[from] std::io::Error),

    #[error("yt-dlp command failed with exit code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("download failed: {0}")]
    DownloadFailed(String)
}

impl Error {
    pub(crate) fn from_spawn(binary: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::BinaryNotFound(binary.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Error::BinaryNotExecutable(binary.to_path_buf()),
            _ => Error::ExecutionFailed(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
