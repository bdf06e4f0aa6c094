//! Degradation statistics tracking.
//!
//! This module provides thread-safe counters for every [`ErrorType`] seen during
//! a scan.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe degradation statistics tracker.
///
/// All error types are initialized to zero on creation, so increments never
/// allocate and can be shared across tasks through `Arc`.
pub struct ScanStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStats {
    /// Creates a tracker with every counter at zero.
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        ScanStats { errors }
    }

    /// Increment an error counter.
    pub fn increment(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ScanStats initialization.",
                error
            );
        }
    }

    /// Get the count for an error type.
    pub fn get(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get total count across all error types.
    pub fn total(&self) -> usize {
        ErrorType::iter().map(|e| self.get(e)).sum()
    }

    /// Non-zero counters keyed by their snake_case name, for serialization.
    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        ErrorType::iter()
            .filter_map(|e| {
                let count = self.get(e);
                (count > 0).then(|| (e.to_string(), count))
            })
            .collect()
    }
}
