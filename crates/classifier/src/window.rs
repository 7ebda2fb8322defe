//! Fixed-capacity sliding window of samples.
//!
//! Backed by a `HeapRb` that overwrites its oldest element once full, so
//! arrival order and the capacity bound hold after every push.

use std::fmt;

use contracts::{SensorSample, WINDOW_CAPACITY};
use ringbuf::{traits::*, HeapRb};

/// The three window slots in arrival order
#[derive(Debug, Clone, Copy)]
pub struct Triple<'a> {
    pub prev: &'a SensorSample,
    pub curr: &'a SensorSample,
    pub next: &'a SensorSample,
}

/// Sliding window over the most recent samples
pub struct SlidingWindow {
    samples: HeapRb<SensorSample>,
}

impl fmt::Debug for SlidingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindow")
            .field("len", &self.samples.occupied_len())
            .field("capacity", &WINDOW_CAPACITY)
            .finish()
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SlidingWindow {
    /// Create an empty window
    pub fn new() -> Self {
        Self {
            samples: HeapRb::new(WINDOW_CAPACITY),
        }
    }

    /// Append a sample, evicting the oldest one when full
    ///
    /// Returns the evicted sample, if any.
    #[inline]
    pub fn push(&mut self, sample: SensorSample) -> Option<SensorSample> {
        self.samples.push_overwrite(sample)
    }

    /// The `prev, curr, next` slots, only when the window is full
    #[inline]
    pub fn triple(&self) -> Option<Triple<'_>> {
        let mut slots = self.samples.iter();
        match (slots.next(), slots.next(), slots.next(), slots.next()) {
            (Some(prev), Some(curr), Some(next), None) => Some(Triple { prev, curr, next }),
            _ => None,
        }
    }

    /// Samples oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SensorSample> + '_ {
        self.samples.iter()
    }

    /// Number of samples held
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.occupied_len()
    }

    /// Check if the window is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check if the window holds a full triple
    #[inline]
    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }
}
