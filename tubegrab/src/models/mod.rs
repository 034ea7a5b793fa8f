mod request;

pub use request::{DownloadForm, DownloadRequest, MediaMode};
