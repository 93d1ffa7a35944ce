//! Vehicle trips
//!
//! Technicians' vehicles report GPS fixes far more often than is useful to
//! store. [`PositionThrottle`] decides which fixes to keep and [`Trip`]
//! accumulates the kept ones into a distance travelled.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single GPS reading.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,

    /// Reported accuracy radius in metres, if known
    pub accuracy_m: Option<f64>,

    /// When the reading was taken
    pub recorded_at: Timestamp,
}

impl GpsFix {
    /// Create a fix without accuracy information.
    pub fn new(latitude: f64, longitude: f64, recorded_at: Timestamp) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            recorded_at,
        }
    }

    /// Set the accuracy radius.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

/// Great-circle distance between two fixes, in metres.
pub fn haversine_m(a: &GpsFix, b: &GpsFix) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Drops GPS fixes that arrive too soon after the last kept one.
///
/// A fix is kept when it is the first one, when at least `min_interval` has
/// passed since the last kept fix, or when it is at least `min_distance_m`
/// away from it. Fixes older than the last kept one are always dropped.
#[derive(Debug, Clone)]
pub struct PositionThrottle {
    min_interval: SignedDuration,
    min_distance_m: f64,
    max_accuracy_m: Option<f64>,
    last: Option<GpsFix>,
}

impl PositionThrottle {
    /// Create a throttle with the given interval and distance thresholds.
    pub fn new(min_interval: SignedDuration, min_distance_m: f64) -> Self {
        Self {
            min_interval,
            min_distance_m,
            max_accuracy_m: None,
            last: None,
        }
    }

    /// Also drop fixes whose accuracy radius is larger than `max_accuracy_m`.
    #[must_use]
    pub fn with_max_accuracy(mut self, max_accuracy_m: f64) -> Self {
        self.max_accuracy_m = Some(max_accuracy_m);
        self
    }

    /// Offer a fix, returning it if it should be kept.
    pub fn offer(&mut self, fix: GpsFix) -> Option<GpsFix> {
        if let (Some(max), Some(accuracy)) = (self.max_accuracy_m, fix.accuracy_m)
            && accuracy > max
        {
            trace!(accuracy, max, "dropping inaccurate fix");
            return None;
        }

        if let Some(last) = &self.last {
            if fix.recorded_at < last.recorded_at {
                trace!(at = %fix.recorded_at, last = %last.recorded_at, "dropping stale fix");
                return None;
            }

            let elapsed = fix.recorded_at.duration_since(last.recorded_at);
            let moved = haversine_m(last, &fix);

            if elapsed < self.min_interval && moved < self.min_distance_m {
                return None;
            }
        }

        self.last = Some(fix);

        Some(fix)
    }

    /// The last fix that was kept.
    pub fn last(&self) -> Option<&GpsFix> {
        self.last.as_ref()
    }

    /// Forget the last kept fix, so the next offer is always kept.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// The path of a single vehicle trip.
#[derive(Debug, Clone, Default)]
pub struct Trip {
    points: Vec<GpsFix>,
    distance_m: f64,
}

impl Trip {
    /// Create an empty trip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fix to the trip.
    pub fn record(&mut self, fix: GpsFix) {
        if let Some(last) = self.points.last() {
            self.distance_m += haversine_m(last, &fix);
        }

        self.points.push(fix);
    }

    /// Distance travelled, in kilometres.
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1_000.0
    }

    /// Time between the first and last recorded fix.
    pub fn duration(&self) -> SignedDuration {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.recorded_at.duration_since(first.recorded_at),
            _ => SignedDuration::ZERO,
        }
    }

    /// Every recorded fix, oldest first.
    pub fn points(&self) -> &[GpsFix] {
        &self.points
    }
}

/// Feeds fixes through a [`PositionThrottle`] into a [`Trip`].
#[derive(Debug, Clone)]
pub struct TripTracker {
    throttle: PositionThrottle,
    trip: Trip,
}

impl TripTracker {
    /// Start tracking a new trip.
    pub fn new(throttle: PositionThrottle) -> Self {
        Self {
            throttle,
            trip: Trip::new(),
        }
    }

    /// Offer a fix; returns `true` if it was recorded.
    pub fn track(&mut self, fix: GpsFix) -> bool {
        let Some(kept) = self.throttle.offer(fix) else {
            return false;
        };

        self.trip.record(kept);

        true
    }

    /// The trip recorded so far.
    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    /// Stop tracking and return the recorded trip.
    pub fn finish(self) -> Trip {
        self.trip
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn at(seconds: i64) -> TestResult<Timestamp> {
        Ok(Timestamp::from_second(1_700_000_000 + seconds)?)
    }

    fn throttle() -> PositionThrottle {
        PositionThrottle::new(SignedDuration::from_secs(30), 50.0)
    }

    #[test]
    fn haversine_matches_known_distance() {
        let sao_paulo = GpsFix::new(-23.5505, -46.6333, Timestamp::UNIX_EPOCH);
        let rio = GpsFix::new(-22.9068, -43.1729, Timestamp::UNIX_EPOCH);

        let km = haversine_m(&sao_paulo, &rio) / 1_000.0;

        assert!((km - 360.0).abs() < 5.0, "expected ~360km, got {km}");
    }

    #[test]
    fn haversine_of_same_point_is_zero() {
        let fix = GpsFix::new(-23.5, -46.6, Timestamp::UNIX_EPOCH);

        assert!(haversine_m(&fix, &fix).abs() < f64::EPSILON);
    }

    #[test]
    fn first_fix_is_always_kept() -> TestResult {
        let mut throttle = throttle();

        assert!(throttle.offer(GpsFix::new(-23.5, -46.6, at(0)?)).is_some());

        Ok(())
    }

    #[test]
    fn nearby_fix_inside_interval_is_dropped() -> TestResult {
        let mut throttle = throttle();

        throttle.offer(GpsFix::new(-23.5, -46.6, at(0)?));

        assert!(throttle.offer(GpsFix::new(-23.5001, -46.6, at(10)?)).is_none());

        Ok(())
    }

    #[test]
    fn fix_after_interval_is_kept() -> TestResult {
        let mut throttle = throttle();

        throttle.offer(GpsFix::new(-23.5, -46.6, at(0)?));

        assert!(throttle.offer(GpsFix::new(-23.5, -46.6, at(30)?)).is_some());

        Ok(())
    }

    #[test]
    fn distant_fix_inside_interval_is_kept() -> TestResult {
        let mut throttle = throttle();

        throttle.offer(GpsFix::new(-23.5, -46.6, at(0)?));

        // ~111m north
        assert!(throttle.offer(GpsFix::new(-23.499, -46.6, at(5)?)).is_some());

        Ok(())
    }

    #[test]
    fn stale_and_inaccurate_fixes_are_dropped() -> TestResult {
        let mut throttle = throttle().with_max_accuracy(25.0);

        throttle.offer(GpsFix::new(-23.5, -46.6, at(60)?));

        assert!(throttle.offer(GpsFix::new(-23.4, -46.6, at(0)?)).is_none());
        assert!(
            throttle
                .offer(GpsFix::new(-23.4, -46.6, at(120)?).with_accuracy(80.0))
                .is_none()
        );
        assert_eq!(throttle.last().map(|fix| fix.recorded_at), Some(at(60)?));

        throttle.reset();

        assert!(throttle.last().is_none());

        Ok(())
    }

    #[test]
    fn tracker_records_only_kept_fixes() -> TestResult {
        let mut tracker = TripTracker::new(throttle());

        assert!(tracker.track(GpsFix::new(-23.5, -46.6, at(0)?)));
        assert!(!tracker.track(GpsFix::new(-23.5, -46.6, at(5)?)));
        assert!(tracker.track(GpsFix::new(-23.49, -46.6, at(60)?)));
        assert_eq!(tracker.trip().points().len(), 2);
        assert_eq!(tracker.trip().duration(), SignedDuration::from_secs(60));

        assert!(tracker.track(GpsFix::new(-23.48, -46.6, at(120)?)));

        let trip = tracker.finish();

        assert_eq!(trip.points().len(), 3);
        assert_eq!(trip.duration(), SignedDuration::from_secs(120));
        assert!(
            (trip.distance_km() - 2.22).abs() < 0.01,
            "expected ~2.22km, got {}",
            trip.distance_km()
        );

        Ok(())
    }

    #[test]
    fn empty_trip_has_no_distance_or_duration() {
        let trip = Trip::new();

        assert!(trip.distance_km().abs() < f64::EPSILON);
        assert_eq!(trip.duration(), SignedDuration::ZERO);
    }
}
