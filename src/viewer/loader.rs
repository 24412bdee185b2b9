use std::{
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    error::ViewerError,
    image_utils::{ImageDecoder, ImageSource, LoadedImage, SlideImage},
};

struct LoadJob {
    generation: u64,
    sources: Vec<ImageSource>,
}

enum LoadEvent {
    Decoded {
        generation: u64,
        index: usize,
        result: Result<LoadedImage, ViewerError>,
    },
    Finished {
        generation: u64,
    },
}

/// What changed during one [`ImageLoader::update`].
#[derive(Debug, Default)]
pub struct LoaderUpdate {
    /// The current list was published this call.
    pub published: bool,
    /// Images of the current list that failed since the last call.
    pub failures: Vec<ViewerError>,
}

/// Sequential background decoder with a minimum visible loading time.
///
/// Every call to [`ImageLoader::load`] starts a new generation; results of
/// older generations are dropped on arrival, and the worker abandons an old
/// list as soon as it notices a newer one.
pub struct ImageLoader {
    job_tx: Sender<LoadJob>,
    event_rx: Receiver<LoadEvent>,
    generation: u64,
    sources: Vec<ImageSource>,
    pending: Vec<SlideImage>,
    started_at: Instant,
    decoded_all: bool,
    published: Option<Vec<SlideImage>>,
    min_loading: Duration,
}

impl ImageLoader {
    pub fn new(
        decoder: Arc<dyn ImageDecoder>,
        decode_timeout: Option<Duration>,
        min_loading: Duration,
    ) -> Self {
        let (job_tx, event_rx) = Self::spawn_worker(decoder, decode_timeout);
        Self {
            job_tx,
            event_rx,
            generation: 0,
            sources: Vec::new(),
            pending: Vec::new(),
            started_at: Instant::now(),
            decoded_all: true,
            published: Some(Vec::new()),
            min_loading,
        }
    }

    fn spawn_worker(
        decoder: Arc<dyn ImageDecoder>,
        decode_timeout: Option<Duration>,
    ) -> (Sender<LoadJob>, Receiver<LoadEvent>) {
        let (job_tx, job_rx) = mpsc::channel::<LoadJob>();
        let (event_tx, event_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("slideviewer-loader".into())
            .spawn(move || Self::run_worker(job_rx, event_tx, decoder, decode_timeout));
        if let Err(err) = spawned {
            tracing::error!("failed to spawn loader thread: {err}");
        }
        (job_tx, event_rx)
    }

    fn run_worker(
        job_rx: Receiver<LoadJob>,
        event_tx: Sender<LoadEvent>,
        decoder: Arc<dyn ImageDecoder>,
        decode_timeout: Option<Duration>,
    ) {
        let mut next = job_rx.recv().ok();
        while let Some(job) = next.take() {
            let mut superseded = false;
            for (index, source) in job.sources.iter().enumerate() {
                // Only the newest queued list matters
                while let Ok(newer) = job_rx.try_recv() {
                    next = Some(newer);
                }
                if next.is_some() {
                    superseded = true;
                    break;
                }
                let result = match await_decode(&decoder, source, decode_timeout, &job_rx) {
                    DecodeOutcome::Done(result) => result,
                    DecodeOutcome::Superseded(newer) => {
                        next = Some(newer);
                        while let Ok(newer) = job_rx.try_recv() {
                            next = Some(newer);
                        }
                        superseded = true;
                        break;
                    }
                    DecodeOutcome::Shutdown => return,
                };
                let event = LoadEvent::Decoded {
                    generation: job.generation,
                    index,
                    result,
                };
                if event_tx.send(event).is_err() {
                    return;
                }
            }
            if superseded {
                tracing::debug!(generation = job.generation, "loader run superseded");
                continue;
            }
            if event_tx
                .send(LoadEvent::Finished {
                    generation: job.generation,
                })
                .is_err()
            {
                return;
            }
            next = job_rx.recv().ok();
        }
    }

    /// Starts loading `sources`. A list with the same URLs in the same order
    /// as the current one is ignored and returns false.
    pub fn load(&mut self, sources: Vec<ImageSource>) -> bool {
        if sources == self.sources {
            return false;
        }
        self.generation += 1;
        self.started_at = Instant::now();
        self.pending = Vec::with_capacity(sources.len());
        self.decoded_all = false;
        self.published = None;
        self.sources = sources.clone();
        tracing::debug!(
            generation = self.generation,
            count = sources.len(),
            "starting loader run"
        );
        let job = LoadJob {
            generation: self.generation,
            sources,
        };
        if self.job_tx.send(job).is_err() {
            tracing::error!("loader thread is gone, images will never load");
        }
        true
    }

    /// Drains worker results. Publishes the list once everything is decoded
    /// and the minimum loading time has passed.
    pub fn update(&mut self, now: Instant) -> LoaderUpdate {
        let mut update = LoaderUpdate::default();
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                LoadEvent::Decoded {
                    generation,
                    index,
                    result,
                } => {
                    if generation != self.generation {
                        tracing::trace!(generation, index, "dropping stale decode");
                        continue;
                    }
                    debug_assert_eq!(index, self.pending.len());
                    let source = self.sources[index].clone();
                    let slot = match result {
                        Ok(image) => SlideImage::Ready(image),
                        Err(error) => {
                            tracing::warn!("{error}");
                            update.failures.push(error.clone());
                            SlideImage::Failed { source, error }
                        }
                    };
                    self.pending.push(slot);
                }
                LoadEvent::Finished { generation } => {
                    if generation == self.generation {
                        self.decoded_all = true;
                    }
                }
            }
        }

        if self.published.is_none()
            && self.decoded_all
            && now.saturating_duration_since(self.started_at) >= self.min_loading
        {
            tracing::debug!(
                generation = self.generation,
                count = self.pending.len(),
                "publishing image list"
            );
            self.published = Some(std::mem::take(&mut self.pending));
            update.published = true;
        }
        update
    }

    pub fn is_loading(&self) -> bool {
        self.published.is_none()
    }

    /// The published images, empty while loading.
    pub fn images(&self) -> &[SlideImage] {
        self.published.as_deref().unwrap_or(&[])
    }

    /// The most recently requested list, published or not.
    pub fn sources(&self) -> &[ImageSource] {
        &self.sources
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// How long the worker waits on a decode before looking for a newer list.
const JOB_POLL_INTERVAL: Duration = Duration::from_millis(10);

enum DecodeOutcome {
    Done(Result<LoadedImage, ViewerError>),
    /// A newer list arrived while the decode was running.
    Superseded(LoadJob),
    /// The loader was dropped.
    Shutdown,
}

/// Runs the decoder on a helper thread and waits for it, bounded by
/// `timeout` when one is configured. A newer job on `job_rx` ends the wait
/// early, so a hung decode never blocks the next list.
///
/// An abandoned helper thread is left to finish on its own and its result
/// is discarded.
fn await_decode(
    decoder: &Arc<dyn ImageDecoder>,
    source: &ImageSource,
    timeout: Option<Duration>,
    job_rx: &Receiver<LoadJob>,
) -> DecodeOutcome {
    let (tx, rx) = mpsc::channel();
    let decoder = Arc::clone(decoder);
    let job_source = source.clone();
    let spawned = thread::Builder::new()
        .name("slideviewer-decode".into())
        .spawn(move || {
            let _ = tx.send(decoder.decode(&job_source));
        });
    if spawned.is_err() {
        return DecodeOutcome::Done(Err(ViewerError::DecoderGone {
            url: source.url.clone(),
        }));
    }

    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    loop {
        match job_rx.try_recv() {
            Ok(newer) => {
                tracing::debug!(url = %source.url, "abandoning decode for a newer list");
                return DecodeOutcome::Superseded(newer);
            }
            Err(TryRecvError::Disconnected) => return DecodeOutcome::Shutdown,
            Err(TryRecvError::Empty) => {}
        }

        let wait = match (deadline, timeout) {
            (Some(deadline), Some(timeout)) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return DecodeOutcome::Done(Err(ViewerError::DecodeTimeout {
                        url: source.url.clone(),
                        after: timeout,
                    }));
                }
                left.min(JOB_POLL_INTERVAL)
            }
            _ => JOB_POLL_INTERVAL,
        };

        match rx.recv_timeout(wait) {
            Ok(result) => return DecodeOutcome::Done(result),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return DecodeOutcome::Done(Err(ViewerError::DecoderGone {
                    url: source.url.clone(),
                }))
            }
        }
    }
}
