//! Road-surface classifier.

use contracts::{
    ClassifiedRecord, ClassifierConfig, RoadState, SensorSample, DEFAULT_THRESHOLD_HEIGHT,
};
use tracing::{debug, trace};

use crate::window::SlidingWindow;

/// Classify the middle of three vertical-acceleration readings
///
/// A bump (pothole) is a strict local maximum (minimum) that exceeds the
/// threshold on both sides. Equality with the threshold is smooth.
pub fn classify(prev: f64, curr: f64, next: f64, threshold: f64) -> RoadState {
    let rise = curr - prev;
    let fall = curr - next;

    if curr > prev && curr > next && rise > threshold && fall > threshold {
        RoadState::Bump
    } else if curr < prev && curr < next && -rise > threshold && -fall > threshold {
        RoadState::Pothole
    } else {
        RoadState::Smooth
    }
}

/// Sliding-window road-surface classifier
///
/// One instance per agent stream. Not `Sync`-shared: callers serialize access.
#[derive(Debug)]
pub struct RoadClassifier {
    window: SlidingWindow,
    threshold: f64,
    samples_seen: u64,
}

impl Default for RoadClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_HEIGHT)
    }
}

impl RoadClassifier {
    /// Create a classifier; the threshold is normalized to its magnitude
    pub fn new(threshold_height: f64) -> Self {
        Self {
            window: SlidingWindow::new(),
            threshold: threshold_height.abs(),
            samples_seen: 0,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.threshold_height)
    }

    /// Effective threshold (always >= 0)
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current window contents
    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// Total samples ingested
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Ingest one sample
    ///
    /// Returns `None` while the window is warming up (first two samples),
    /// then exactly one record per call describing the previous sample.
    pub fn process(&mut self, sample: SensorSample) -> Option<ClassifiedRecord> {
        self.window.push(sample);
        self.samples_seen += 1;

        let Some(triple) = self.window.triple() else {
            debug!(
                window_len = self.window.len(),
                "window warming up, not enough samples"
            );
            return None;
        };

        let road_state = classify(
            triple.prev.vertical(),
            triple.curr.vertical(),
            triple.next.vertical(),
            self.threshold,
        );

        trace!(
            road_state = %road_state,
            prev_z = triple.prev.vertical(),
            z = triple.curr.vertical(),
            next_z = triple.next.vertical(),
            "sample classified"
        );

        Some(ClassifiedRecord::new(road_state, *triple.curr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use contracts::{Accelerometer, Gps};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn samples(zs: &[f64]) -> Vec<SensorSample> {
        let start = Utc.with_ymd_and_hms(2024, 2, 27, 10, 0, 0).unwrap();
        zs.iter()
            .enumerate()
            .map(|(i, &z)| {
                SensorSample::new(
                    Accelerometer { x: 0.0, y: 0.0, z },
                    Gps {
                        latitude: 50.45,
                        longitude: 30.52 + i as f64 * 1e-5,
                    },
                    start + Duration::milliseconds(100 * i as i64),
                )
            })
            .collect()
    }

    fn run(classifier: &mut RoadClassifier, zs: &[f64]) -> Vec<Option<ClassifiedRecord>> {
        samples(zs)
            .into_iter()
            .map(|s| classifier.process(s))
            .collect()
    }

    #[test]
    fn test_warmup_yields_nothing() {
        let mut classifier = RoadClassifier::new(10.0);
        let out = run(&mut classifier, &[0.0, 500.0]);
        assert!(out.iter().all(Option::is_none));
        assert_eq!(classifier.window().len(), 2);
    }

    #[test]
    fn test_one_result_per_sample_after_warmup() {
        let mut classifier = RoadClassifier::new(10.0);
        let out = run(&mut classifier, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(out[0].is_none() && out[1].is_none());
        assert!(out[2..].iter().all(Option::is_some));
        assert_eq!(classifier.window().len(), 3);
        assert_eq!(classifier.samples_seen(), 6);
    }

    #[test]
    fn test_bump_local_maximum() {
        let mut classifier = RoadClassifier::new(50.0);
        let out = run(&mut classifier, &[0.0, 100.0, 0.0]);
        let record = out[2].unwrap();
        assert_eq!(record.road_state, RoadState::Bump);
        assert_eq!(record.sample.vertical(), 100.0);
        assert_eq!(record.id, None);
    }

    #[test]
    fn test_pothole_local_minimum() {
        let mut classifier = RoadClassifier::new(5.0);
        let out = run(&mut classifier, &[10.0, 0.0, 10.0]);
        assert_eq!(out[2].unwrap().road_state, RoadState::Pothole);
    }

    #[test]
    fn test_threshold_equality_is_smooth() {
        assert_eq!(classify(0.0, 50.0, 0.0, 50.0), RoadState::Smooth);
        assert_eq!(classify(0.0, 51.0, 0.0, 50.0), RoadState::Bump);
        assert_eq!(classify(50.0, 0.0, 50.0, 50.0), RoadState::Smooth);
        // One side short of the threshold
        assert_eq!(classify(0.0, 100.0, 60.0, 50.0), RoadState::Smooth);
        assert_eq!(classify(100.0, 0.0, 40.0, 50.0), RoadState::Smooth);
    }

    #[test]
    fn test_monotonic_ramp_is_smooth() {
        assert_eq!(classify(0.0, 5000.0, 10000.0, 10.0), RoadState::Smooth);
        assert_eq!(classify(10000.0, 5000.0, 0.0, 10.0), RoadState::Smooth);
    }

    #[test]
    fn test_negative_threshold_is_normalized() {
        let classifier = RoadClassifier::new(-1000.0);
        assert_eq!(classifier.threshold(), 1000.0);
        assert_eq!(RoadClassifier::default().threshold(), 1000.0);
    }

    #[test]
    fn test_zero_threshold_still_requires_strict_extremum() {
        assert_eq!(classify(1.0, 1.0, 1.0, 0.0), RoadState::Smooth);
        assert_eq!(classify(1.0, 1.5, 1.0, 0.0), RoadState::Bump);
    }

    #[test]
    fn test_one_sample_lag() {
        let mut classifier = RoadClassifier::new(1000.0);
        let zs = [1.0, 1.0, 1.0, 1.0, 2000.0, 1.0, 1.0];
        let out = run(&mut classifier, &zs);

        let emitted: Vec<ClassifiedRecord> = out.into_iter().flatten().collect();
        assert_eq!(emitted.len(), zs.len() - 2);

        let bumps: Vec<&ClassifiedRecord> = emitted
            .iter()
            .filter(|r| r.road_state == RoadState::Bump)
            .collect();
        assert_eq!(bumps.len(), 1);
        assert_eq!(bumps[0].sample.vertical(), 2000.0);
        assert!(emitted
            .iter()
            .filter(|r| r.road_state != RoadState::Bump)
            .all(|r| r.road_state == RoadState::Smooth));

        // Reported sample is always the one before the newest
        let input = samples(&zs);
        for (i, record) in emitted.iter().enumerate() {
            assert_eq!(record.sample.timestamp, input[i + 1].timestamp);
        }
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let zs: Vec<f64> = (0..500).map(|_| rng.random_range(-3000.0..3000.0)).collect();

        let first = run(&mut RoadClassifier::new(800.0), &zs);
        let second = run(&mut RoadClassifier::new(800.0), &zs);
        assert_eq!(first, second);
        assert_eq!(first.iter().flatten().count(), zs.len() - 2);
    }
}
