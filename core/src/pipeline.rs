//! Orchestration of the capture, compression, and delivery stages.
//!
//! The command handler blocks for the duration of the whole pipeline; the
//! only deliberate concurrency is the progress consumer task, fed by
//! fire-and-forget channel sends from the compression thread. There is no
//! cancellation and no automatic retry: each failure either triggers its
//! one predefined fallback or terminates the invocation.

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::error;

use crate::activity::ActivityEntry;
use crate::activity::ActivityLog;
use crate::activity::Locator;
use crate::backend::HeapBackend;
use crate::compress;
use crate::compress::CompressionMethod;
use crate::deliver;
use crate::deliver::DeliveryOutcome;
use crate::deliver::UploadClient;
use crate::notify::NotificationSink;
use crate::paths::resolve_save_file;
use crate::progress;
use crate::progress::ProgressEvent;
use crate::progress::ThrottledProgress;
use crate::summary::SUMMARY_MEDIA_TYPE;
use crate::util::format_bytes;
use crate::util::percent;

const SUMMARY_LABEL: &str = "Heap dump summary";
const DUMP_LABEL: &str = "Heap dump";

/// Options for a summary capture, built once from operator input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryOptions {
    pub run_gc_before: bool,
    pub save_to_file: bool,
}

/// Options for a full dump capture.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub run_gc_before: bool,
    pub include_non_live: bool,
    /// Raw operator flag value. Values that do not name a known method
    /// silently disable compression; they are never an error.
    pub compress: Option<String>,
}

/// The capture-compress-deliver pipeline with its collaborators resolved
/// once at startup.
pub struct HeapAnalysis {
    backend: Arc<dyn HeapBackend>,
    uploader: UploadClient,
    sink: Arc<dyn NotificationSink>,
    activity: Arc<dyn ActivityLog>,
    save_dir: PathBuf,
    progress_interval: Duration,
}

impl HeapAnalysis {
    pub fn new(
        backend: Arc<dyn HeapBackend>,
        uploader: UploadClient,
        sink: Arc<dyn NotificationSink>,
        activity: Arc<dyn ActivityLog>,
        save_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            uploader,
            sink,
            activity,
            save_dir: save_dir.into(),
            progress_interval: progress::DEFAULT_REPORT_INTERVAL,
        }
    }

    /// Override the gap between forwarded compression-progress messages.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Capture a heap summary and deliver it, preferring upload unless the
    /// operator asked for a file.
    ///
    /// All operator-facing messages are emitted here; failures have already
    /// been reported (generic message to the operator, full detail to the
    /// log) when `None` is returned.
    pub async fn heap_summary(&self, actor: &str, opts: SummaryOptions) -> Option<DeliveryOutcome> {
        if opts.run_gc_before {
            self.sink.broadcast("Running garbage collector...".to_string());
            self.backend.request_gc();
        }

        self.sink
            .broadcast("Creating a new heap dump summary, please wait...".to_string());

        let summary = match self.backend.capture_summary() {
            Ok(summary) => summary,
            Err(err) => {
                error!("heap inspection failed: {err}");
                self.sink
                    .broadcast("An error occurred whilst inspecting the heap.".to_string());
                return None;
            }
        };

        let payload = match summary.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                // Nothing deliverable exists yet, so this follows the
                // inspection-failure path.
                error!("failed to encode heap summary payload: {err}");
                self.sink
                    .broadcast("An error occurred whilst inspecting the heap.".to_string());
                return None;
            }
        };

        let save_path = resolve_save_file(&self.save_dir, "heapsummary", "cinderheap");
        let outcome = deliver::deliver(
            &self.uploader,
            self.sink.as_ref(),
            &payload,
            SUMMARY_MEDIA_TYPE,
            &save_path,
            opts.save_to_file,
        )
        .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("failed to save heap summary: {err}");
                self.sink
                    .broadcast("An error occurred whilst saving the data.".to_string());
                return None;
            }
        };

        match &outcome {
            DeliveryOutcome::Uploaded(url) => {
                self.sink.broadcast("Heap dump summary output:".to_string());
                self.sink.broadcast(url.clone());
                self.record(actor, SUMMARY_LABEL, Locator::Url(url.clone()));
            }
            DeliveryOutcome::SavedLocally(path) => {
                self.sink
                    .broadcast(format!("Heap dump summary written to: {}", path.display()));
                self.sink.broadcast(format!(
                    "You can read the heap dump summary file using the viewer web-app - {}",
                    self.uploader.viewer_base()
                ));
                self.record(actor, SUMMARY_LABEL, Locator::File(path.clone()));
            }
        }

        Some(outcome)
    }

    /// Capture a full heap dump into a resolved file, record it, then run
    /// the optional compression sub-step.
    ///
    /// The dump itself never goes through the upload/save decision: it is
    /// always written directly by the backend, and the compressed
    /// derivative is only ever saved beside the original. Returns the dump
    /// path once the dump has been delivered; a later compression failure
    /// does not disturb that result or its activity record.
    pub async fn heap_dump(&self, actor: &str, opts: DumpOptions) -> Option<PathBuf> {
        // Extension is fixed by whichever backend was selected at startup.
        let format = self.backend.dump_format();
        let file = resolve_save_file(&self.save_dir, "heap", format.extension());

        let live_objects_only = !opts.include_non_live;

        if opts.run_gc_before {
            self.sink.broadcast("Running garbage collector...".to_string());
            self.backend.request_gc();
        }

        self.sink
            .broadcast("Creating a new heap dump, please wait...".to_string());

        if let Err(err) = self.backend.capture_dump(&file, live_objects_only) {
            error!("heap dump capture failed: {err}");
            self.sink
                .broadcast("An error occurred whilst creating a heap dump.".to_string());
            return None;
        }

        self.sink
            .broadcast(format!("Heap dump written to: {}", file.display()));
        self.record(actor, DUMP_LABEL, Locator::File(file.clone()));

        let method = opts.compress.as_deref().and_then(CompressionMethod::from_flag);
        if let Some(method) = method {
            if let Err(err) = self.compress_dump(&file, method).await {
                // Sub-step failure only; the dump above stays delivered
                // and recorded.
                error!("heap dump compression failed: {err}");
            }
        }

        Some(file)
    }

    async fn compress_dump(&self, file: &Path, method: CompressionMethod) -> io::Result<()> {
        self.sink
            .broadcast("Compressing heap dump, please wait...".to_string());

        let size = std::fs::metadata(file)?.len();

        // Rendering happens on its own task so the compression loop never
        // waits on the notification channel.
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let sink = Arc::clone(&self.sink);
        let consumer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                sink.broadcast(format!(
                    "Compressed {} / {} so far... ({})",
                    format_bytes(event.processed),
                    format_bytes(event.total),
                    percent(event.processed, event.total),
                ));
            }
        });

        let source = file.to_path_buf();
        let interval = self.progress_interval;
        let compressed = tokio::task::spawn_blocking(move || {
            let mut throttle = ThrottledProgress::with_interval(tx, size, interval);
            compress::compress(&source, method, &mut |processed| throttle.report(processed))
        })
        .await
        .map_err(io::Error::other)??;

        // The sender was dropped with the blocking closure, closing the
        // channel; wait for the consumer to drain so the completion
        // messages come last.
        let _ = consumer.await;

        self.sink.broadcast(format!(
            "Compression complete: {} --> {} ({})",
            format_bytes(size),
            format_bytes(compressed.size),
            percent(compressed.size, size),
        ));
        self.sink.broadcast(format!(
            "Compressed heap dump written to: {}",
            compressed.path.display()
        ));

        Ok(())
    }

    fn record(&self, actor: &str, label: &str, locator: Locator) {
        self.activity.record(ActivityEntry {
            actor: actor.to_string(),
            timestamp_millis: Utc::now().timestamp_millis(),
            label: label.to_string(),
            locator,
        });
    }
}
