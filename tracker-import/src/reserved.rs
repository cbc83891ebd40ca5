//! Reserved values for generated attributes.
//!
//! Generated attribute values are handed out ahead of time against a text
//! pattern. Once such a value is stored by a committed import it is marked
//! used so it is never handed out again.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::ImportResult;

/// Tracks reserved values of pattern-generated attributes.
pub trait ReservedValueService {
    /// Marks `value` of `text_pattern` as consumed. Marking a value that is
    /// already used is a no-op.
    fn use_reserved_value(&mut self, text_pattern: &str, value: &str) -> ImportResult<()>;

    /// Whether `value` is still handed out and waiting to be used.
    fn is_reserved(&self, text_pattern: &str, value: &str) -> bool;

    fn is_used(&self, text_pattern: &str, value: &str) -> bool;
}

/// Reserved values kept in memory, per pattern.
#[derive(Debug, Default)]
pub struct InMemoryReservedValues {
    reserved: BTreeMap<String, BTreeSet<String>>,
    used: BTreeMap<String, BTreeSet<String>>,
}

impl InMemoryReservedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out `value` for `text_pattern`.
    pub fn reserve(&mut self, text_pattern: &str, value: &str) {
        self.reserved
            .entry(text_pattern.to_string())
            .or_default()
            .insert(value.to_string());
    }
}

impl ReservedValueService for InMemoryReservedValues {
    fn use_reserved_value(&mut self, text_pattern: &str, value: &str) -> ImportResult<()> {
        // Values typed in by hand were never reserved; they are still recorded.
        if let Some(values) = self.reserved.get_mut(text_pattern) {
            values.remove(value);
        }
        let fresh = self
            .used
            .entry(text_pattern.to_string())
            .or_default()
            .insert(value.to_string());
        if fresh {
            debug!(text_pattern, value, "reserved value used");
        }
        Ok(())
    }

    fn is_reserved(&self, text_pattern: &str, value: &str) -> bool {
        self.reserved
            .get(text_pattern)
            .is_some_and(|values| values.contains(value))
    }

    fn is_used(&self, text_pattern: &str, value: &str) -> bool {
        self.used
            .get(text_pattern)
            .is_some_and(|values| values.contains(value))
    }
}
