#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Default,
    /// Best audio stream, or the best combined stream when no audio-only one exists.
    BestAudio,
    /// Best video-only stream restricted to one container.
    BestVideoOnly(Container),
    /// Best video plus best audio, or the best combined stream.
    BestVideoWithAudio
}

impl OutputFormat {
    pub fn as_arg(&self) -> Option<String> {
        match self {
            OutputFormat::Default => None,
            OutputFormat::BestAudio => Some("bestaudio/best".to_string()),
            OutputFormat::BestVideoOnly(container) => Some(match container.as_str() {
                Some(ext) => format!("bestvideo[ext={ext}]"),
                None => "bestvideo".to_string()
            }),
            OutputFormat::BestVideoWithAudio => Some("bestvideo+bestaudio/best".to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Container {
    #[default]
    Default,
    Mp4
}

impl Container {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Container::Default => None,
            Container::Mp4 => Some("mp4")
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaylistMode {
    #[default]
    Auto,
    Yes,
    No
}

/// Everything a single yt-dlp invocation is told, apart from the URL.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub format: OutputFormat,
    pub container: Container,
    pub output_template: Option<String>,
    pub extract_audio: bool,
    pub audio_format: Option<String>,
    pub audio_quality: Option<String>,
    pub playlist: PlaylistMode,
    pub ignore_errors: bool,
    pub continue_partial: bool,
    pub no_part: bool,
    pub windows_filenames: bool,
    pub quiet: bool,
    pub concurrent_fragments: Option<u32>
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    pub fn extract_audio(mut self, extract: bool) -> Self {
        self.extract_audio = extract;
        self
    }

    pub fn audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = Some(format.into());
        self
    }

    pub fn audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.audio_quality = Some(quality.into());
        self
    }

    pub fn playlist(mut self, mode: PlaylistMode) -> Self {
        self.playlist = mode;
        self
    }

    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    pub fn continue_partial(mut self, resume: bool) -> Self {
        self.continue_partial = resume;
        self
    }

    pub fn no_part(mut self, no_part: bool) -> Self {
        self.no_part = no_part;
        self
    }

    pub fn windows_filenames(mut self, restrict: bool) -> Self {
        self.windows_filenames = restrict;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn concurrent_fragments(mut self, count: u32) -> Self {
        self.concurrent_fragments = Some(count);
        self
    }
}
