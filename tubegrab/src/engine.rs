use yt_dlp::{DownloadOptions, EventStream, YtDlp};

/// Whatever actually fetches media. Production uses the yt-dlp executable.
pub trait Engine: Send + Sync {
    fn download(&self, url: &str, options: &DownloadOptions) -> EventStream;
}

impl Engine for YtDlp {
    fn download(&self, url: &str, options: &DownloadOptions) -> EventStream {
        self.download_with_progress(url, options)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use futures::StreamExt;
    use tokio::sync::Notify;
    use yt_dlp::{DownloadEvent, DownloadOptions, DownloadProgress, EventStream};

    use super::Engine;

    /// Replays a fixed list of events and records every invocation.
    pub struct ScriptedEngine {
        script: fn() -> Vec<yt_dlp::Result<DownloadEvent>>,
        calls: AtomicUsize,
        last_call: Mutex<Option<(String, DownloadOptions)>>
    }

    impl ScriptedEngine {
        pub fn new(script: fn() -> Vec<yt_dlp::Result<DownloadEvent>>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
                last_call: Mutex::new(None)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_call(&self) -> Option<(String, DownloadOptions)> {
            self.last_call.lock().unwrap().clone()
        }
    }

    impl Engine for ScriptedEngine {
        fn download(&self, url: &str, options: &DownloadOptions) -> EventStream {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_call.lock().unwrap() = Some((url.to_string(), options.clone()));
            Box::pin(futures::stream::iter((self.script)()))
        }
    }

    /// Reports 10% and then waits for `release` before finishing the transfer.
    #[derive(Default)]
    pub struct GatedEngine {
        gate: Arc<Notify>,
        completed: Arc<AtomicBool>
    }

    impl GatedEngine {
        pub fn release(&self) {
            self.gate.notify_one();
        }

        /// Whether the stream was polled through to its terminal event.
        pub fn completed(&self) -> bool {
            self.completed.load(Ordering::SeqCst)
        }
    }

    impl Engine for GatedEngine {
        fn download(&self, _url: &str, _options: &DownloadOptions) -> EventStream {
            let gate = self.gate.clone();
            let completed = self.completed.clone();

            let head = futures::stream::iter(vec![Ok::<_, yt_dlp::Error>(DownloadEvent::Progress(
                DownloadProgress::downloading(10, Some(100))
            ))]);
            let tail = futures::stream::once(async move {
                gate.notified().await;
                Ok::<_, yt_dlp::Error>(DownloadEvent::Progress(DownloadProgress::finished(100)))
            })
            .chain(futures::stream::once(async move {
                completed.store(true, Ordering::SeqCst);
                Ok::<_, yt_dlp::Error>(DownloadEvent::Finished { filename: None })
            }));

            Box::pin(head.chain(tail))
        }
    }
}
