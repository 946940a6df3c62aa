//! CPU reference backend.
//!
//! Buffers are plain `Vec<i32>`s. Every creation and release is counted in
//! shared [`HostStats`], so tests can check that nothing leaks and nothing is
//! released twice. Creations can be made to fail by label.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{ComputeBackend, Release};
use crate::error::BackendError;

/// Allocation counters shared by a backend and all its buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Buffers created.
    pub created: u64,
    /// Buffers released.
    pub released: u64,
    /// Buffers currently alive.
    pub live: u64,
    /// Words currently held by live buffers.
    pub live_words: usize,
    /// Label of every created buffer, in creation order.
    pub labels: Vec<String>,
}

/// A host-memory buffer.
#[derive(Debug)]
pub struct HostBuffer {
    id: u64,
    label: String,
    data: Vec<i32>,
    stats: Arc<Mutex<HostStats>>,
}

impl HostBuffer {
    /// Creation sequence number, unique per backend.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Label the buffer was created with.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Buffer contents.
    #[must_use]
    pub fn data(&self) -> &[i32] {
        &self.data
    }
}

impl Release for HostBuffer {
    fn release(self) {
        let mut stats = self.stats.lock();
        stats.released += 1;
        stats.live -= 1;
        stats.live_words -= self.data.len();
    }
}

/// CPU implementation of [`ComputeBackend`].
#[derive(Debug, Default)]
pub struct HostBackend {
    stats: Arc<Mutex<HostStats>>,
    fail_labels: HashSet<String>,
    max_words: Option<usize>,
}

impl HostBackend {
    /// Creates a backend with no limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses buffers larger than `words`.
    #[must_use]
    pub fn with_max_words(mut self, words: usize) -> Self {
        self.max_words = Some(words);
        self
    }

    /// Makes every later creation of a buffer labelled `label` fail.
    pub fn fail_on(&mut self, label: &str) {
        self.fail_labels.insert(label.to_string());
    }

    /// Removes every injected failure.
    pub fn clear_failures(&mut self) {
        self.fail_labels.clear();
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> HostStats {
        self.stats.lock().clone()
    }

    /// Shared handle to the counters, valid after the backend is dropped.
    #[must_use]
    pub fn stats_handle(&self) -> Arc<Mutex<HostStats>> {
        Arc::clone(&self.stats)
    }
}

impl ComputeBackend for HostBackend {
    type Buffer = HostBuffer;

    fn create_int_buffer(&mut self, label: &str, data: &[i32]) -> Result<HostBuffer, BackendError> {
        if self.fail_labels.contains(label) {
            return Err(BackendError::Allocation {
                label: label.to_string(),
                words: data.len(),
                reason: "injected failure".to_string(),
            });
        }
        if let Some(limit) = self.max_words {
            if data.len() > limit {
                return Err(BackendError::TooLarge {
                    label: label.to_string(),
                    words: data.len(),
                    limit,
                });
            }
        }

        let id = {
            let mut stats = self.stats.lock();
            stats.created += 1;
            stats.live += 1;
            stats.live_words += data.len();
            stats.labels.push(label.to_string());
            stats.created
        };
        Ok(HostBuffer {
            id,
            label: label.to_string(),
            data: data.to_vec(),
            stats: Arc::clone(&self.stats),
        })
    }
}
