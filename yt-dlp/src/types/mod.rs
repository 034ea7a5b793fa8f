mod options;
mod progress;

pub use options::{Container, DownloadOptions, OutputFormat, PlaylistMode};
pub use progress::{DownloadEvent, DownloadProgress, ProgressStatus, format_megabytes};
