//! Async Rust wrapper for the yt-dlp CLI.
//!
//! Builds yt-dlp argument lists from typed [`DownloadOptions`] and turns the
//! process output into a stream of [`DownloadEvent`]s, including byte-level
//! progress read through a machine-readable `--progress-template`.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//! use yt_dlp::{DownloadEvent, DownloadOptions, OutputFormat, YtDlp};
//!
//! #[tokio::main]
//! async fn main() -> yt_dlp::Result<()> {
//!     let client = YtDlp::new();
//!     println!("yt-dlp version: {}", client.check_binary().await?);
//!
//!     let options = DownloadOptions::new()
//!         .format(OutputFormat::BestAudio)
//!         .output_template("downloads/%(title)s.%(ext)s");
//!
//!     let mut events = client.download_with_progress("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &options);
//!     while let Some(event) = events.next().await {
//!         if let DownloadEvent::Progress(progress) = event? {
//!             println!("{:?}", progress.fraction());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod command;
pub mod error;
pub mod types;

pub use client::{EventStream, YtDlp};
pub use error::{Error, Result};
pub use types::{
    Container, DownloadEvent, DownloadOptions, DownloadProgress, OutputFormat, PlaylistMode,
    ProgressStatus, format_megabytes
};
