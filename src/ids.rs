//! Unique identifier generation for public-facing resource ids.

use uuid::Uuid;

/// Capability for minting prefixed unique identifiers.
///
/// Consumers never track uniqueness themselves; every call yields a fresh id.
pub trait IdSource: Send + Sync {
    /// Returns a new unique id of the form `<prefix>_<uuid>`.
    fn new_id(&self, prefix: &str) -> String;
}

/// Production id source backed by random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn new_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, Uuid::new_v4())
    }
}
