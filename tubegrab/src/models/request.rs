use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaMode {
    #[default]
    AudioOnly,
    VideoOnly,
    VideoWithAudio
}

impl MediaMode {
    pub const ALL: [MediaMode; 3] = [Self::AudioOnly, Self::VideoOnly, Self::VideoWithAudio];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AudioOnly => "audio_only",
            Self::VideoOnly => "video_only",
            Self::VideoWithAudio => "video_with_audio"
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AudioOnly => "Audio (MP3)",
            Self::VideoOnly => "Video Only (no audio)",
            Self::VideoWithAudio => "Video with Audio (MP4)"
        }
    }
}

impl std::fmt::Display for MediaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw form submission. Browsers omit unchecked checkboxes entirely.
#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    pub url: String,
    pub mode: MediaMode,
    #[serde(default)]
    pub playlist: Option<String>
}

impl DownloadForm {
    pub fn is_playlist(&self) -> bool {
        self.playlist.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: MediaMode,
    pub is_playlist: bool
}

impl DownloadRequest {
    /// Returns `None` when the URL is blank after trimming.
    pub fn new(url: &str, mode: MediaMode, is_playlist: bool) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            mode,
            is_playlist
        })
    }
}
