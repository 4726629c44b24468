//! Heap-inspection capability boundary.
//!
//! The engine that actually walks the heap is an opaque capability chosen
//! once at startup. The pipeline never re-queries platform state: the
//! selected backend carries the dump format and the (advisory) GC hook.

use std::path::Path;

use crate::error::InspectionError;
use crate::summary::HeapSummary;

/// Binary format produced by the active dump backend.
///
/// The two formats are mutually exclusive; which one is in play is decided
/// when the backend is constructed and never reconsidered per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    /// Allocator-profiler heap profile.
    HeapProfile,
    /// Portable raw memory-map snapshot.
    RawSnapshot,
}

impl DumpFormat {
    /// File extension for dump files of this format.
    pub fn extension(self) -> &'static str {
        match self {
            DumpFormat::HeapProfile => "heap",
            DumpFormat::RawSnapshot => "memsnap",
        }
    }
}

/// Heap-inspection primitives exposed by the host runtime.
///
/// Capture may pause or materially slow the host process; callers are
/// expected to warn the operator before invoking either primitive.
pub trait HeapBackend: Send + Sync {
    /// Produce an in-memory class-histogram summary of the live heap.
    fn capture_summary(&self) -> Result<HeapSummary, InspectionError>;

    /// Write a full heap dump to `target`. The parent directory must
    /// already exist and be writable.
    fn capture_dump(&self, target: &Path, live_objects_only: bool)
    -> Result<(), InspectionError>;

    /// Advisory request for a full garbage collection before capture.
    /// The runtime is free to ignore or delay it; completion is never
    /// verified.
    fn request_gc(&self) {}

    /// The dump format this backend emits.
    fn dump_format(&self) -> DumpFormat;
}
