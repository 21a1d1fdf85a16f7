//! The top-level periodic loop (spec.md §4.1): a ticker plus three message
//! channels (`flush_incoming`, `flush_outgoing`, `removal`) fanning work out
//! to the merger, uploader, and return/correction processor, serializing
//! their completion.
//!
//! Follows the same resolve-then-dispatch shape generalized one level up:
//! where the uploader/processor resolve a transport per file, the
//! controller resolves a *worker* per tick branch and awaits both before
//! serving the next `select!` iteration. Cancellation is a
//! [`CancellationToken`] awaited alongside the ticker and the request
//! channels in a single `tokio::select!`; a panicking child worker
//! surfaces as a `JoinError` that gets logged rather than unwinding the
//! controller, so the next tick still proceeds.

use crate::error::Result;
use crate::merger::Merger;
use crate::processor::Processor;
use crate::uploader::Uploader;
use ach_store::ConfigRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Reply to a `flushIncoming` request: the download-and-process pass ran to
/// completion (or failed; the error is reported, not the panic path).
pub struct FlushIncomingRequest {
    pub reply: oneshot::Sender<Result<()>>,
}

/// Reply to a `flushOutgoing` request. `skip_upload` mirrors the Go
/// source's flag of the same name: when set, only the merge runs.
pub struct FlushOutgoingRequest {
    pub skip_upload: bool,
    pub reply: oneshot::Sender<Result<()>>,
}

/// Reply to a `removal` request: whether a batch carrying `trace_number`
/// was found and excised from an open mergable file.
pub struct RemovalRequest {
    pub trace_number: String,
    pub reply: oneshot::Sender<Result<bool>>,
}

pub struct Controller {
    merger: Merger,
    uploader: Uploader,
    processor: Processor,
    config: Arc<ConfigRepository>,
    batch_size: usize,
    /// `None` corresponds to `ACH_FILE_TRANSFER_INTERVAL=off`: the ticker
    /// never fires and the controller only ever acts on flush/removal
    /// messages.
    interval: Option<Duration>,
}

impl Controller {
    pub fn new(
        merger: Merger,
        uploader: Uploader,
        processor: Processor,
        config: Arc<ConfigRepository>,
        batch_size: usize,
        interval: Option<Duration>,
    ) -> Self {
        Self { merger, uploader, processor, config, batch_size, interval }
    }

    /// Runs until `cancel` fires. One iteration of the loop either serves
    /// the ticker or one pending message from each of the three channels;
    /// manual flushes are answered FIFO per channel and complete before the
    /// next tick is served on that channel, since each branch is handled to
    /// completion (awaited) before `select!` is re-entered.
    pub async fn run(
        self,
        cancel: CancellationToken,
        mut flush_incoming: mpsc::Receiver<FlushIncomingRequest>,
        mut flush_outgoing: mpsc::Receiver<FlushOutgoingRequest>,
        mut removal: mpsc::Receiver<RemovalRequest>,
    ) {
        let mut ticker = self.interval.map(tokio::time::interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("pipeline controller received cancellation, shutting down");
                    break;
                }
                _ = Self::tick_or_pending(&mut ticker) => {
                    self.run_tick().await;
                }
                Some(req) = flush_incoming.recv() => {
                    let result = self.processor.process_all(&self.config).await.map_err(Into::into);
                    let _ = req.reply.send(result);
                }
                Some(req) = flush_outgoing.recv() => {
                    let result = self.handle_flush_outgoing(req.skip_upload).await;
                    let _ = req.reply.send(result);
                }
                Some(req) = removal.recv() => {
                    let result = self.merger.remove_entry(&req.trace_number);
                    let _ = req.reply.send(result);
                }
                else => break,
            }
        }
    }

    async fn tick_or_pending(ticker: &mut Option<tokio::time::Interval>) -> tokio::time::Instant {
        match ticker {
            Some(t) => t.tick().await,
            None => std::future::pending().await,
        }
    }

    /// One scheduled tick: download-and-process and merge-and-upload run
    /// concurrently as separate tasks (so a panic in either is caught as a
    /// `JoinError` instead of taking down the controller) and the tick is
    /// complete only once both return. Errors from either are logged, not
    /// propagated — a failed tick must not block the next one.
    async fn run_tick(&self) {
        let processor = self.processor.clone();
        let config = self.config.clone();
        let download = tokio::spawn(async move { processor.process_all(&config).await });

        let merger = self.merger.clone();
        let uploader = self.uploader.clone();
        let batch_size = self.batch_size;
        let upload = tokio::spawn(async move { uploader.merge_and_upload_files(&merger, batch_size, false).await });

        let (download_res, upload_res) = tokio::join!(download, upload);

        match download_res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "download/process pass failed this tick"),
            Err(join_err) => tracing::error!(error = %join_err, "download/process worker panicked"),
        }
        match upload_res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "merge/upload pass failed this tick"),
            Err(join_err) => tracing::error!(error = %join_err, "merge/upload worker panicked"),
        }
    }

    /// spec §4.1: merge always runs; upload runs with `force=true` (bypasses
    /// the cutoff-proximity gate) unless the caller asked to skip it.
    async fn handle_flush_outgoing(&self, skip_upload: bool) -> Result<()> {
        if skip_upload {
            self.merger.drain(self.batch_size)?;
            Ok(())
        } else {
            self.uploader.merge_and_upload_files(&self.merger, self.batch_size, true).await
        }
    }
}

/// Sender handles for the controller's three channels, plus the token that
/// stops it. This is the surface `ach-admin`'s HTTP handlers and `ach-
/// gateway`'s own startup code use; neither ever touches the `Controller`
/// or the channels' receiving ends directly.
#[derive(Clone)]
pub struct PipelineHandles {
    flush_incoming: mpsc::Sender<FlushIncomingRequest>,
    flush_outgoing: mpsc::Sender<FlushOutgoingRequest>,
    removal: mpsc::Sender<RemovalRequest>,
    cancel: CancellationToken,
}

impl PipelineHandles {
    pub async fn flush_incoming(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.flush_incoming.send(FlushIncomingRequest { reply: tx }).await.map_err(|_| crate::error::PipelineError::ControllerStopped)?;
        rx.await.map_err(|_| crate::error::PipelineError::ControllerStopped)?
    }

    pub async fn flush_outgoing(&self, skip_upload: bool) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.flush_outgoing
            .send(FlushOutgoingRequest { skip_upload, reply: tx })
            .await
            .map_err(|_| crate::error::PipelineError::ControllerStopped)?;
        rx.await.map_err(|_| crate::error::PipelineError::ControllerStopped)?
    }

    pub async fn remove(&self, trace_number: String) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.removal
            .send(RemovalRequest { trace_number, reply: tx })
            .await
            .map_err(|_| crate::error::PipelineError::ControllerStopped)?;
        rx.await.map_err(|_| crate::error::PipelineError::ControllerStopped)?
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

const CHANNEL_CAPACITY: usize = 32;

/// Spawns the controller as its own task and returns the handles used to
/// drive it plus a join handle for orderly shutdown.
pub fn spawn(controller: Controller) -> (PipelineHandles, tokio::task::JoinHandle<()>) {
    let (fi_tx, fi_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (fo_tx, fo_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (rm_tx, rm_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(controller.run(cancel.clone(), fi_rx, fo_rx, rm_rx));

    (PipelineHandles { flush_incoming: fi_tx, flush_outgoing: fo_tx, removal: rm_tx, cancel }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ach_core::{FixedClock, InMemoryMetrics};
    use ach_store::Store;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn controller(interval: Option<Duration>) -> Controller {
        let dir = tempdir().unwrap();
        let store = Store::temporary().unwrap();
        let clock: Arc<dyn ach_core::Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 28, 14, 30, 0).unwrap()));
        let metrics = Arc::new(InMemoryMetrics::new());
        let merger = Merger::new(store.clone(), dir.path().join("merged"), 10_000, clock.clone());
        let uploader = Uploader::new(ConfigRepository::new(), metrics.clone(), clock.clone(), Duration::from_secs(300));
        let processor = Processor::new(store, metrics, clock, false);
        Controller::new(merger, uploader, processor, Arc::new(ConfigRepository::new()), 100, interval)
    }

    #[tokio::test]
    async fn flush_outgoing_with_skip_upload_only_drains_merger() {
        let controller = controller(None);
        let (handles, join) = spawn(controller);

        handles.flush_outgoing(true).await.unwrap();
        handles.shutdown();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn flush_incoming_completes_with_no_configured_routes() {
        let controller = controller(None);
        let (handles, join) = spawn(controller);

        handles.flush_incoming().await.unwrap();
        handles.shutdown();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn removal_on_empty_merged_dir_returns_false() {
        let controller = controller(None);
        let (handles, join) = spawn(controller);

        let found = handles.remove("091400600000001".to_string()).await.unwrap();
        assert!(!found);

        handles.shutdown();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let controller = controller(Some(Duration::from_millis(10)));
        let (handles, join) = spawn(controller);
        handles.shutdown();
        tokio::time::timeout(Duration::from_secs(1), join).await.unwrap().unwrap();
    }
}
