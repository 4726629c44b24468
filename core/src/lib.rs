//! cinder-core: on-demand heap diagnostics for a running process.
//!
//! The pipeline captures heap state — a class-histogram summary or a full
//! binary dump — optionally compresses dump files with throttled progress
//! reporting, and delivers the artifact to the operator via a hosted upload
//! endpoint with a local-file fallback. Every delivered artifact leaves one
//! append-only activity record.
//!
//! The expensive primitives (walking the heap, rendering output) live
//! behind the [`backend::HeapBackend`] and [`notify::NotificationSink`]
//! traits; this crate owns the orchestration between them.

pub mod activity;
pub mod backend;
pub mod compress;
pub mod deliver;
pub mod error;
pub mod notify;
pub mod paths;
pub mod pipeline;
pub mod progress;
pub mod summary;
pub mod util;

pub use activity::ActivityEntry;
pub use activity::ActivityLog;
pub use activity::JsonlActivityLog;
pub use activity::Locator;
pub use activity::MemoryActivityLog;
pub use backend::DumpFormat;
pub use backend::HeapBackend;
pub use compress::CompressedFile;
pub use compress::CompressionMethod;
pub use compress::compress;
pub use deliver::DeliveryOutcome;
pub use deliver::UploadClient;
pub use deliver::deliver;
pub use error::InspectionError;
pub use error::SaveError;
pub use error::UploadError;
pub use notify::NotificationSink;
pub use pipeline::DumpOptions;
pub use pipeline::HeapAnalysis;
pub use pipeline::SummaryOptions;
pub use progress::ProgressEvent;
pub use progress::ThrottledProgress;
pub use summary::ClassEntry;
pub use summary::HeapSummary;
pub use summary::SUMMARY_MEDIA_TYPE;
