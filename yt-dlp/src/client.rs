use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use futures_core::Stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;

use crate::command::{CommandBuilder, PROGRESS_PREFIX, PROGRESS_TEMPLATE};
use crate::error::{Error, Result};
use crate::types::{DownloadEvent, DownloadOptions, DownloadProgress, ProgressStatus};

pub type EventStream = Pin<Box<dyn Stream<Item = Result<DownloadEvent>> + Send + 'static>>;

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    ffmpeg_location: Option<PathBuf>,
    extra_args: Vec<String>
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self::with_binary("yt-dlp")
    }

    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: path.into(),
            ffmpeg_location: None,
            extra_args: Vec::new()
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn ffmpeg_location(&self) -> Option<&Path> {
        self.ffmpeg_location.as_deref()
    }

    pub fn set_ffmpeg_location(&mut self, path: Option<PathBuf>) {
        self.ffmpeg_location = path;
    }

    pub fn set_extra_args(&mut self, args: Vec<String>) {
        self.extra_args = args;
    }

    pub async fn check_binary(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| Error::from_spawn(&self.binary, e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Error::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string()
            })
        }
    }

    /// Runs one yt-dlp invocation for `url`.
    ///
    /// The stream always ends with exactly one terminal event, [`DownloadEvent::Finished`]
    /// or [`DownloadEvent::Failed`], unless the process could not be started, in which
    /// case it yields a single `Err`.
    pub fn download_with_progress(&self, url: &str, options: &DownloadOptions) -> EventStream {
        let url = url.to_string();
        let options = options.clone();
        let binary = self.binary.clone();
        let ffmpeg_location = self.ffmpeg_location.clone();
        let extra_args = self.extra_args.clone();

        Box::pin(async_stream::try_stream! {
            yield DownloadEvent::Extracting { url: url.clone() };

            let builder = CommandBuilder::new(&binary)
                .args(extra_args.iter().map(String::as_str))
                .ffmpeg_location_opt(ffmpeg_location.as_ref())
                .with_options(&options)
                .newline_progress()
                .progress_template(PROGRESS_TEMPLATE)
                .url(&url);

            tracing::debug!(
                binary = %binary.display(),
                args = ?builder.get_args(),
                "spawning yt-dlp"
            );

            let mut cmd = builder.build();
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            cmd.kill_on_drop(true);

            let mut child = cmd.spawn().map_err(|e| Error::from_spawn(&binary, e))?;

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| Error::DownloadFailed("stdout not captured".to_string()))?;
            let stderr = child
                .stderr
                .take()
                .ok_or_else(|| Error::DownloadFailed("stderr not captured".to_string()))?;

            // ERROR and WARNING lines go to stderr, progress to stdout. Output is
            // in the locale encoding, so lines are split as bytes and decoded lossily.
            let lines = SplitStream::new(BufReader::new(stdout).split(b'\n'))
                .merge(SplitStream::new(BufReader::new(stderr).split(b'\n')));
            tokio::pin!(lines);

            let mut current_filename: Option<String> = None;
            let mut last_error: Option<String> = None;

            while let Some(line) = lines.next().await {
                let line = line?;
                let line = String::from_utf8_lossy(&line);
                tracing::trace!(line = %line, "yt-dlp output");
                if let Some(event) = parse_progress_line(&line, &mut current_filename) {
                    if let DownloadEvent::Error { ref message } = event {
                        last_error = Some(message.clone());
                    }
                    yield event;
                }
            }

            let status = child.wait().await?;

            if status.success() {
                yield DownloadEvent::Finished { filename: current_filename };
            } else {
                let code = status.code().unwrap_or(-1);
                let message = last_error
                    .unwrap_or_else(|| format!("yt-dlp exited with code {code}"));
                yield DownloadEvent::Failed { code, message };
            }
        })
    }
}

fn parse_progress_line(line: &str, current_filename: &mut Option<String>) -> Option<DownloadEvent> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        return parse_template_progress(rest).map(DownloadEvent::Progress);
    }

    if let Some(rest) = line.strip_prefix("[download] Destination:") {
        let filename = rest.trim().to_string();
        *current_filename = Some(filename.clone());
        return Some(DownloadEvent::DownloadStarted { filename });
    }

    if line.starts_with("[download]") && line.ends_with("has already been downloaded") {
        let filename = line
            .trim_start_matches("[download]")
            .trim_end_matches("has already been downloaded")
            .trim()
            .to_string();
        *current_filename = Some(filename.clone());
        return Some(DownloadEvent::AlreadyDownloaded { filename });
    }

    if line.starts_with("[download]")
        && line.contains('%')
        && let Some(progress) = parse_download_progress(line)
    {
        return Some(DownloadEvent::Progress(progress));
    }

    if line.starts_with("[Merger]") || line.contains("Merging formats") {
        if let Some(filename) = quoted(line) {
            *current_filename = Some(filename.to_string());
        }
        return Some(DownloadEvent::MergingFormats);
    }

    if let Some(rest) = line.strip_prefix("[ExtractAudio] Destination:") {
        *current_filename = Some(rest.trim().to_string());
        return Some(DownloadEvent::PostProcessing {
            status: line.to_string()
        });
    }

    if line.starts_with("[ExtractAudio]") || line.starts_with("[ffmpeg]") {
        return Some(DownloadEvent::PostProcessing {
            status: line.to_string()
        });
    }

    if let Some(rest) = line.strip_prefix("WARNING:") {
        return Some(DownloadEvent::Warning {
            message: rest.trim().to_string()
        });
    }

    if let Some(rest) = line.strip_prefix("ERROR:") {
        return Some(DownloadEvent::Error {
            message: rest.trim().to_string()
        });
    }

    None
}

fn quoted(line: &str) -> Option<&str> {
    let start = line.find('"')?;
    let end = line.rfind('"')?;
    (end > start).then(|| &line[start + 1..end])
}

fn parse_template_progress(content: &str) -> Option<DownloadProgress> {
    let fields: Vec<&str> = content.trim().split('|').collect();
    let status = ProgressStatus::parse(fields.first()?);

    let downloaded_bytes = fields.get(1).and_then(|s| parse_count(s)).unwrap_or(0);

    Some(DownloadProgress {
        status,
        downloaded_bytes,
        total_bytes: fields.get(2).and_then(|s| parse_count(s)),
        total_bytes_estimate: fields.get(3).and_then(|s| parse_count(s)),
        speed: fields.get(4).and_then(|s| parse_float(s)),
        eta: fields.get(5).and_then(|s| parse_float(s)),
        fragment_index: fields.get(6).and_then(|s| parse_count(s)).and_then(|n| u32::try_from(n).ok()),
        fragment_count: fields.get(7).and_then(|s| parse_count(s)).and_then(|n| u32::try_from(n).ok())
    })
}

fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "NA" || s == "None" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(s: &str) -> Option<u64> {
    parse_float(s).map(|v| v as u64)
}

/// Parses yt-dlp's human progress line, e.g.
/// `[download]  50.0% of ~95.37MiB at 2.00MiB/s ETA 00:24`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn parse_download_progress(line: &str) -> Option<DownloadProgress> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let mut percent: Option<f64> = None;
    let mut total_bytes: Option<u64> = None;
    let mut speed: Option<f64> = None;
    let mut eta: Option<f64> = None;

    for (i, part) in parts.iter().enumerate() {
        let prev = i.checked_sub(1).and_then(|j| parts.get(j)).copied();
        if part.ends_with('%') {
            percent = part.trim_end_matches('%').parse().ok();
        } else if part.contains("/s") {
            speed = parse_speed(part);
        } else if part.contains('B') && total_bytes.is_none() {
            if prev.is_some_and(|p| p.ends_with('%') || p == "of") {
                total_bytes = parse_size(part);
            }
        } else if prev == Some("ETA") {
            eta = parse_eta(part);
        }
    }

    let percent = percent?;
    let downloaded_bytes = total_bytes.map_or(0, |t| ((percent / 100.0) * t as f64) as u64);

    Some(DownloadProgress {
        total_bytes,
        speed,
        eta,
        ..DownloadProgress::downloading(downloaded_bytes, None)
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().trim_start_matches('~');
    if s == "N/A" || s == "Unknown" || s.is_empty() {
        return None;
    }

    let multipliers = [
        ("GiB", 1024u64 * 1024 * 1024),
        ("MiB", 1024 * 1024),
        ("KiB", 1024),
        ("GB", 1000 * 1000 * 1000),
        ("MB", 1000 * 1000),
        ("KB", 1000),
        ("B", 1)
    ];

    for (suffix, mult) in multipliers {
        if let Some(num_str) = s.strip_suffix(suffix)
            && let Ok(num) = num_str.trim().parse::<f64>()
        {
            return Some((num * mult as f64) as u64);
        }
    }

    None
}

#[allow(clippy::cast_precision_loss)]
fn parse_speed(s: &str) -> Option<f64> {
    let s = s.trim().trim_end_matches("/s");
    parse_size(s).map(|b| b as f64)
}

fn parse_eta(s: &str) -> Option<f64> {
    let s = s.trim();
    if s == "N/A" || s == "Unknown" || s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split(':').collect();
    match parts.len() {
        1 => parts[0].parse::<f64>().ok(),
        2 => {
            let mins: f64 = parts[0].parse().ok()?;
            let secs: f64 = parts[1].parse().ok()?;
            Some(mins * 60.0 + secs)
        }
        3 => {
            let hours: f64 = parts[0].parse().ok()?;
            let mins: f64 = parts[1].parse().ok()?;
            let secs: f64 = parts[2].parse().ok()?;
            Some(hours * 3600.0 + mins * 60.0 + secs)
        }
        _ => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100MiB"), Some(104_857_600));
        assert_eq!(parse_size("1GiB"), Some(1_073_741_824));
        assert_eq!(parse_size("500KiB"), Some(512_000));
        assert_eq!(parse_size("~2.00MiB"), Some(2_097_152));
        assert_eq!(parse_size("1000B"), Some(1000));
        assert_eq!(parse_size("N/A"), None);
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("1MiB/s"), Some(1_048_576.0));
        assert_eq!(parse_speed("500KiB/s"), Some(512_000.0));
    }

    #[test]
    fn test_parse_eta() {
        assert_eq!(parse_eta("1:30"), Some(90.0));
        assert_eq!(parse_eta("1:00:00"), Some(3600.0));
        assert_eq!(parse_eta("N/A"), None);
    }

    #[test]
    fn test_parse_template_downloading() {
        let mut filename = None;
        let event = parse_progress_line(
            "[progress] downloading|50000000|100000000|NA|2097152.5|24|3|10",
            &mut filename
        );
        let Some(DownloadEvent::Progress(progress)) = event else {
            panic!("expected progress event");
        };
        assert_eq!(progress.status, ProgressStatus::Downloading);
        assert_eq!(progress.downloaded_bytes, 50_000_000);
        assert_eq!(progress.total_bytes, Some(100_000_000));
        assert_eq!(progress.total_bytes_estimate, None);
        assert_eq!(progress.speed, Some(2_097_152.5));
        assert_eq!(progress.eta, Some(24.0));
        assert_eq!(progress.fragment_index, Some(3));
        assert_eq!(progress.fragment_count, Some(10));
    }

    #[test]
    fn test_parse_template_estimate_only() {
        let mut filename = None;
        let event = parse_progress_line("[progress] downloading|1024|NA|4096.0|NA|NA|NA|NA", &mut filename);
        let Some(DownloadEvent::Progress(progress)) = event else {
            panic!("expected progress event");
        };
        assert_eq!(progress.total_bytes, None);
        assert_eq!(progress.total_bytes_estimate, Some(4096));
        assert_eq!(progress.fraction(), Some(0.25));
    }

    #[test]
    fn test_parse_template_finished() {
        let mut filename = None;
        let event = parse_progress_line("[progress] finished|2048|2048|NA|NA|NA|NA|NA", &mut filename);
        assert!(matches!(
            event,
            Some(DownloadEvent::Progress(DownloadProgress { status: ProgressStatus::Finished, .. }))
        ));
    }

    #[test]
    fn test_parse_legacy_progress_line() {
        let mut filename = None;
        let event = parse_progress_line(
            "[download]  50.0% of ~100.00MiB at    2.00MiB/s ETA 00:24",
            &mut filename
        );
        let Some(DownloadEvent::Progress(progress)) = event else {
            panic!("expected progress event");
        };
        assert_eq!(progress.total_bytes, Some(104_857_600));
        assert_eq!(progress.downloaded_bytes, 52_428_800);
        assert_eq!(progress.speed, Some(2_097_152.0));
        assert_eq!(progress.eta, Some(24.0));
    }

    #[test]
    fn test_parse_progress_line_destination() {
        let mut filename = None;
        let event = parse_progress_line(
            "[download] Destination: video.mp4",
            &mut filename
        );
        assert!(matches!(event, Some(DownloadEvent::DownloadStarted { .. })));
        assert_eq!(filename, Some("video.mp4".to_string()));
    }

    #[test]
    fn test_parse_progress_line_already_downloaded() {
        let mut filename = None;
        let event = parse_progress_line(
            "[download] downloads/clip.mp4 has already been downloaded",
            &mut filename
        );
        assert!(matches!(event, Some(DownloadEvent::AlreadyDownloaded { .. })));
        assert_eq!(filename.as_deref(), Some("downloads/clip.mp4"));
    }

    #[test]
    fn test_parse_progress_line_merger_updates_filename() {
        let mut filename = Some("video.f137.mp4".to_string());
        let event = parse_progress_line(
            "[Merger] Merging formats into \"downloads/video.mp4\"",
            &mut filename
        );
        assert!(matches!(event, Some(DownloadEvent::MergingFormats)));
        assert_eq!(filename.as_deref(), Some("downloads/video.mp4"));
    }

    #[test]
    fn test_parse_progress_line_extract_audio() {
        let mut filename = None;
        let event = parse_progress_line(
            "[ExtractAudio] Destination: downloads/song.mp3",
            &mut filename
        );
        assert!(matches!(event, Some(DownloadEvent::PostProcessing { .. })));
        assert_eq!(filename.as_deref(), Some("downloads/song.mp3"));
    }

    #[test]
    fn test_parse_progress_line_error_and_warning() {
        let mut filename = None;
        let event = parse_progress_line("ERROR: Video unavailable", &mut filename);
        assert!(matches!(event, Some(DownloadEvent::Error { ref message }) if message == "Video unavailable"));

        let event = parse_progress_line("WARNING: falling back to generic extractor", &mut filename);
        assert!(matches!(event, Some(DownloadEvent::Warning { .. })));
    }

    #[test]
    fn test_parse_progress_line_ignores_noise() {
        let mut filename = None;
        assert!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage", &mut filename).is_none());
        assert!(parse_progress_line("", &mut filename).is_none());
    }

    #[test]
    fn test_ytdlp_default() {
        let client = YtDlp::default();
        assert_eq!(client.binary(), Path::new("yt-dlp"));
        assert!(client.ffmpeg_location().is_none());
        assert!(client.extra_args.is_empty());
    }

    #[test]
    fn test_ytdlp_ffmpeg_location() {
        let mut client = YtDlp::with_binary("/usr/local/bin/yt-dlp");
        client.set_ffmpeg_location(Some(PathBuf::from("/usr/local/bin/ffmpeg")));
        assert_eq!(client.binary(), Path::new("/usr/local/bin/yt-dlp"));
        assert_eq!(client.ffmpeg_location(), Some(Path::new("/usr/local/bin/ffmpeg")));
    }

    #[tokio::test]
    async fn test_missing_binary_yields_error() {
        let client = YtDlp::with_binary("/nonexistent/yt-dlp-binary");
        let mut stream = client.download_with_progress("https://example.com/v", &DownloadOptions::default());

        assert!(matches!(stream.next().await, Some(Ok(DownloadEvent::Extracting { .. }))));
        assert!(matches!(stream.next().await, Some(Err(Error::BinaryNotFound(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_check_binary_missing() {
        let client = YtDlp::with_binary("/nonexistent/yt-dlp-binary");
        assert!(matches!(client.check_binary().await, Err(Error::BinaryNotFound(_))));
    }

    /// Stands in for yt-dlp with `sh -c SCRIPT`; every generated argument lands in `$0..$n`.
    #[cfg(unix)]
    fn scripted(script: &str) -> YtDlp {
        let mut client = YtDlp::with_binary("sh");
        client.set_extra_args(vec!["-c".to_string(), script.to_string()]);
        client
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_stream() {
        let client = scripted(
            "echo '[download] Destination: out/clip.mp4'; \
             echo '[progress] downloading|50|100|NA|NA|NA|NA|NA'; \
             echo '[progress] finished|100|100|NA|NA|NA|NA|NA'"
        );
        let events: Vec<DownloadEvent> = client
            .download_with_progress("https://example.com/v", &DownloadOptions::default())
            .collect::<Result<Vec<_>>>()
            .await
            .unwrap();

        assert!(matches!(events.first(), Some(DownloadEvent::Extracting { .. })));
        let progress_count = events
            .iter()
            .filter(|e| matches!(e, DownloadEvent::Progress(_)))
            .count();
        assert_eq!(progress_count, 2);
        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Finished { filename: Some(f) }) if f == "out/clip.mp4"
        ));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_reports_last_error() {
        let client = scripted("echo 'ERROR: Unsupported URL: https://example.com/v' >&2; exit 1");
        let events: Vec<DownloadEvent> = client
            .download_with_progress("https://example.com/v", &DownloadOptions::default())
            .collect::<Result<Vec<_>>>()
            .await
            .unwrap();

        assert!(events.iter().any(|e| matches!(e, DownloadEvent::Error { .. })));
        match events.last() {
            Some(DownloadEvent::Failed { code, message }) => {
                assert_eq!(*code, 1);
                assert_eq!(message, "Unsupported URL: https://example.com/v");
            }
            other => panic!("expected failure, got {other:?}")
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_without_error_line() {
        let client = scripted("exit 3");
        let events: Vec<DownloadEvent> = client
            .download_with_progress("https://example.com/v", &DownloadOptions::default())
            .collect::<Result<Vec<_>>>()
            .await
            .unwrap();

        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Failed { code: 3, message }) if message == "yt-dlp exited with code 3"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_output_does_not_abort_run() {
        let client = scripted(
            "printf '[download] Destination: caf\\351.mp4\\n'; \
             echo '[progress] finished|100|100|NA|NA|NA|NA|NA'; \
             printf 'WARNING: odd byte \\377 on stderr\\n' >&2; \
             exit 0"
        );
        let events: Vec<DownloadEvent> = client
            .download_with_progress("https://example.com/v", &DownloadOptions::default())
            .collect::<Result<Vec<_>>>()
            .await
            .unwrap();

        assert!(events.iter().any(|e| matches!(e, DownloadEvent::Warning { .. })));
        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Finished { filename: Some(f) }) if f == "caf\u{FFFD}.mp4"
        ));
    }
}
