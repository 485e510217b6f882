//! Utilities module for Printdown
//!
//! Shared helpers:
//! - Keyed debouncing for edit coalescing
//! - Path utilities

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Debounce helper for coalescing bursts of triggers per key
///
/// Each trigger gets a generation number; after the quiet period the
/// caller checks whether its generation is still the latest and drops it
/// otherwise, so only the last trigger of a burst fires.
#[derive(Debug)]
pub struct Debouncer<K> {
    delay: Duration,
    latest: HashMap<K, u64>,
    next_generation: u64,
}

impl<K: Eq + Hash + Copy> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: HashMap::new(),
            next_generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a trigger for `key`; returns its generation
    pub fn trigger(&mut self, key: K) -> u64 {
        self.next_generation += 1;
        self.latest.insert(key, self.next_generation);
        self.next_generation
    }

    /// Consume the trigger if it is the latest for `key`
    pub fn fire(&mut self, key: K, generation: u64) -> bool {
        if self.latest.get(&key) == Some(&generation) {
            self.latest.remove(&key);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.latest.contains_key(&key)
    }

    /// Drop any pending trigger for `key`
    pub fn reset(&mut self, key: K) {
        self.latest.remove(&key);
    }
}

/// Path utilities
pub mod path {
    use super::*;

    /// Check if the path has one of the given extensions (case-insensitive)
    pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Expand tilde to home directory
    pub fn expand_tilde(path: &Path) -> PathBuf {
        if let Ok(stripped) = path.strip_prefix("~") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        path.to_path_buf()
    }

    /// Absolute form of a user-supplied path, resolving symlinks when it exists
    pub fn absolutize(path: &Path) -> PathBuf {
        let expanded = expand_tilde(path);
        if let Ok(canonical) = std::fs::canonicalize(&expanded) {
            return canonical;
        }
        if expanded.is_absolute() {
            expanded
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&expanded))
                .unwrap_or(expanded)
        }
    }
}
