//! Thin serialization convenience over the declarative document model
//! (spec.md §9: "a schema loader is an external collaborator's concern").
//!
//! The core never reads a file or parses bytes on its own; `Codec` is an
//! optional seam for callers who want to round-trip an `Infrastructure`
//! through a concrete wire format without hand-rolling `serde_json` calls.

use crate::error::{Result, TopologyError};
use crate::model::Infrastructure;

/// A reversible encoding of an [`Infrastructure`] document.
pub trait Codec {
    fn encode(&self, infra: &Infrastructure) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Infrastructure>;
}

/// JSON encoding via `serde_json`, gated behind the `json` feature.
#[cfg(feature = "json")]
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(&self, infra: &Infrastructure) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(infra).map_err(|e| TopologyError::MalformedDocument(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Infrastructure> {
        serde_json::from_slice(bytes).map_err(|e| TopologyError::MalformedDocument(e.to_string()))
    }
}
