use std::path::Path;

use yt_dlp::{Container, DownloadOptions, OutputFormat, PlaylistMode};

use crate::models::{DownloadRequest, MediaMode};

const AUDIO_CODEC: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";
const CONCURRENT_FRAGMENTS: u32 = 5;

const PLAYLIST_TEMPLATE: &str = "%(playlist_title)s/%(title)s.%(ext)s";
const SINGLE_TEMPLATE: &str = "%(title)s.%(ext)s";

pub fn output_template(base_dir: &Path, is_playlist: bool) -> String {
    let file = if is_playlist { PLAYLIST_TEMPLATE } else { SINGLE_TEMPLATE };
    base_dir.join(file).to_string_lossy().into_owned()
}

/// Maps one form submission onto the yt-dlp options it runs with.
///
/// Every request merges separate streams into mp4, tolerates per-item playlist
/// failures, resumes partial transfers without leaving `.part` files, restricts
/// filenames to what Windows accepts and fetches up to five fragments at once.
pub fn build_options(request: &DownloadRequest, base_dir: &Path) -> DownloadOptions {
    let playlist = if request.is_playlist {
        PlaylistMode::Yes
    } else {
        PlaylistMode::No
    };

    let options = DownloadOptions::new()
        .output_template(output_template(base_dir, request.is_playlist))
        .container(Container::Mp4)
        .playlist(playlist)
        .ignore_errors(true)
        .continue_partial(true)
        .no_part(true)
        .windows_filenames(true)
        .quiet(false)
        .concurrent_fragments(CONCURRENT_FRAGMENTS);

    match request.mode {
        MediaMode::AudioOnly => options
            .format(OutputFormat::BestAudio)
            .extract_audio(true)
            .audio_format(AUDIO_CODEC)
            .audio_quality(AUDIO_QUALITY),
        MediaMode::VideoOnly => options.format(OutputFormat::BestVideoOnly(Container::Mp4)),
        MediaMode::VideoWithAudio => options.format(OutputFormat::BestVideoWithAudio)
    }
}
