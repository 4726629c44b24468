//! Process-memory backend built on `/proc/self/smaps`.
//!
//! This is the portable-snapshot flavor of the capability: summaries are a
//! histogram of mapped regions grouped by backing path, dumps are a raw
//! snapshot of the smaps content. On platforms without procfs every
//! capture fails with an inspection error, which the pipeline already
//! reports cleanly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cinder_core::ClassEntry;
use cinder_core::DumpFormat;
use cinder_core::HeapBackend;
use cinder_core::HeapSummary;
use cinder_core::InspectionError;
use tracing::debug;

pub struct SmapsBackend;

#[derive(Default)]
struct RegionStats {
    count: u64,
    rss_bytes: u64,
}

impl SmapsBackend {
    fn read_smaps(&self) -> Result<String, InspectionError> {
        fs::read_to_string("/proc/self/smaps")
            .map_err(|err| InspectionError::with_source("cannot read /proc/self/smaps", err))
    }
}

impl HeapBackend for SmapsBackend {
    fn capture_summary(&self) -> Result<HeapSummary, InspectionError> {
        let smaps = self.read_smaps()?;

        let mut regions: BTreeMap<String, RegionStats> = BTreeMap::new();
        let mut current: Option<String> = None;
        for line in smaps.lines() {
            if let Some(rest) = line.strip_prefix("Rss:") {
                let kb: u64 = rest
                    .trim()
                    .trim_end_matches("kB")
                    .trim()
                    .parse()
                    .unwrap_or(0);
                if let Some(name) = &current {
                    let stats = regions.entry(name.clone()).or_default();
                    stats.rss_bytes += kb * 1024;
                }
            } else if line.contains('-') && line.split_whitespace().count() >= 5 {
                // Header line: "addr-addr perms offset dev inode [path]"
                let name = line
                    .split_whitespace()
                    .nth(5)
                    .unwrap_or("[anon]")
                    .to_string();
                let stats = regions.entry(name.clone()).or_default();
                stats.count += 1;
                current = Some(name);
            }
        }

        let entries = regions
            .into_iter()
            .map(|(type_name, stats)| ClassEntry {
                type_name,
                instances: stats.count,
                bytes: stats.rss_bytes,
            })
            .collect();
        Ok(HeapSummary::new(entries))
    }

    fn capture_dump(&self, target: &Path, live_objects_only: bool) -> Result<(), InspectionError> {
        let smaps = self.read_smaps()?;

        let body = if live_objects_only {
            // Keep only regions that are actually resident.
            let mut out = String::new();
            let mut block = String::new();
            let mut resident = false;
            for line in smaps.lines() {
                if line.contains('-') && line.split_whitespace().count() >= 5 && !block.is_empty() {
                    if resident {
                        out.push_str(&block);
                    }
                    block.clear();
                    resident = false;
                }
                if let Some(rest) = line.strip_prefix("Rss:") {
                    let kb: u64 = rest
                        .trim()
                        .trim_end_matches("kB")
                        .trim()
                        .parse()
                        .unwrap_or(0);
                    resident = resident || kb > 0;
                }
                block.push_str(line);
                block.push('\n');
            }
            if resident {
                out.push_str(&block);
            }
            out
        } else {
            smaps
        };

        fs::write(target, body)
            .map_err(|err| InspectionError::with_source("cannot write dump file", err))
    }

    fn request_gc(&self) {
        // No collector to nudge in this runtime; the request is advisory.
        debug!("garbage collection requested; nothing to do for this backend");
    }

    fn dump_format(&self) -> DumpFormat {
        DumpFormat::RawSnapshot
    }
}
