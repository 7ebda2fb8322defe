//! # Classifier
//!
//! Road-surface classifier over a fixed three-sample sliding window.
//!
//! Responsibilities:
//! - Keep the three most recent samples, oldest first
//! - Detect local extrema of vertical acceleration (bump / pothole)
//! - Emit one `ClassifiedRecord` per sample once warmed up, lagging one sample
//!
//! ## Usage Example
//!
//! ```ignore
//! use classifier::RoadClassifier;
//!
//! let mut classifier = RoadClassifier::new(1000.0);
//!
//! // Push samples as they arrive
//! if let Some(record) = classifier.process(sample) {
//!     // record.sample is the middle of the last three samples
//! }
//! ```

mod engine;
mod window;

pub use engine::{classify, RoadClassifier};
pub use window::{SlidingWindow, Triple};

// Re-export contracts types
pub use contracts::{ClassifiedRecord, ClassifierConfig, RoadState, SensorSample};
