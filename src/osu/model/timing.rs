//! Timing directives and the chronological timing chain.

/// One line of the `[TimingPoints]` section.
///
/// A point with a positive beat length defines the tempo from its offset
/// onward ("uninherited"); a point with a negative beat length scales the
/// slider velocity instead ("inherited"). The sequence is assumed ordered by
/// non-decreasing offset as encountered in the source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingPoint {
    /// Time offset this point takes effect from, in milliseconds.
    pub offset: f64,
    /// Milliseconds per beat. Negative values encode a velocity multiplier
    /// of `abs(100 / beat_length)` instead of a tempo.
    pub beat_length: f64,
    /// Beats per measure.
    pub meter: i32,
    /// Default sample set id for objects governed by this point.
    pub sample_set_id: i32,
    /// Custom sample index, 0 for the skin default.
    pub custom_sample_index: i32,
    /// Sample volume percentage.
    pub sample_volume: i32,
    /// Whether the point defines a new tempo. `None` when the source line
    /// omitted the field.
    pub timing_change: Option<bool>,
    /// Whether kiai time is active from this point. `None` when the source
    /// line omitted the field.
    pub kiai: Option<bool>,
    /// The resolved slider-velocity multiplier. 1.0 by default, overwritten
    /// when the point is inherited.
    pub velocity: f64,
}

impl TimingPoint {
    /// Whether this point scales slider velocity instead of defining a
    /// tempo: its beat length is negative and it is not explicitly marked as
    /// a timing change.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.beat_length < 0.0 && !self.timing_change.unwrap_or(false)
    }
}

/// Resolves the point governing `offset`: the last point in sequence order
/// whose offset is at or before the query, falling back to the first point
/// when the query precedes all of them. `None` only when `points` is empty.
#[must_use]
pub fn timing_point_at(points: &[TimingPoint], offset: f64) -> Option<&TimingPoint> {
    points
        .iter()
        .rev()
        .find(|point| point.offset <= offset)
        .or_else(|| points.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(offset: f64) -> TimingPoint {
        TimingPoint {
            offset,
            beat_length: 500.0,
            meter: 4,
            sample_set_id: 0,
            custom_sample_index: 0,
            sample_volume: 100,
            timing_change: None,
            kiai: None,
            velocity: 1.0,
        }
    }

    #[test]
    fn floor_lookup() {
        let points = [point_at(0.0), point_at(1000.0), point_at(2000.0)];
        assert_eq!(timing_point_at(&points, 1500.0).unwrap().offset, 1000.0);
        assert_eq!(timing_point_at(&points, 2000.0).unwrap().offset, 2000.0);
        assert_eq!(timing_point_at(&points, 999.9).unwrap().offset, 0.0);
    }

    #[test]
    fn falls_back_to_first_point() {
        let points = [point_at(0.0), point_at(1000.0)];
        assert_eq!(timing_point_at(&points, -50.0).unwrap().offset, 0.0);
        assert_eq!(timing_point_at(&[], 100.0), None);
    }

    #[test]
    fn inherited_classification() {
        let mut point = point_at(0.0);
        point.beat_length = -50.0;
        assert!(point.is_inherited());
        point.timing_change = Some(true);
        assert!(!point.is_inherited());
        point.timing_change = Some(false);
        assert!(point.is_inherited());
        point.beat_length = 500.0;
        assert!(!point.is_inherited());
    }
}
