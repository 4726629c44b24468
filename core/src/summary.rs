//! Versioned heap-summary payload.

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Media type tag sent with uploaded summary payloads.
pub const SUMMARY_MEDIA_TYPE: &str = "application/x-cinder-heap";

/// Envelope framing for serialized payloads.
const PAYLOAD_MAGIC: [u8; 4] = *b"CNDR";
const PAYLOAD_VERSION: u16 = 1;

/// One row of the class histogram.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassEntry {
    pub type_name: String,
    pub instances: u64,
    pub bytes: u64,
}

/// Class-histogram summary of the live heap at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeapSummary {
    pub schema_version: String,
    pub captured_at_millis: i64,
    pub entries: Vec<ClassEntry>,
    pub total_instances: u64,
    pub total_bytes: u64,
}

impl HeapSummary {
    pub const SCHEMA_VERSION: &'static str = "heap_summary@1";

    pub fn new(entries: Vec<ClassEntry>) -> Self {
        let total_instances = entries.iter().map(|e| e.instances).sum();
        let total_bytes = entries.iter().map(|e| e.bytes).sum();
        Self {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            captured_at_millis: Utc::now().timestamp_millis(),
            entries,
            total_instances,
            total_bytes,
        }
    }

    /// Serialize into the versioned binary envelope the viewer accepts:
    /// 4-byte magic, big-endian payload version, JSON body. Delivery
    /// treats the result as opaque bytes.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        let body = serde_json::to_vec(self)?;
        let mut out = Vec::with_capacity(body.len() + 6);
        out.extend_from_slice(&PAYLOAD_MAGIC);
        out.extend_from_slice(&PAYLOAD_VERSION.to_be_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }
}
