//! Derived gameplay metrics over a fully decoded beatmap.
//!
//! Runs once after all sections are decoded: object counts, play and drain
//! time, the resolved tempo and the maximum achievable combo, which replays
//! the timing chain with a slider-tick counting rule.

use thiserror::Error;

use super::model::{Beatmap, hit_object::HitObjectKind};

/// An error occurred when computing derived metrics.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricsError {
    /// The metrics pass needs at least one hit object.
    #[error("derived metrics need at least one hit object")]
    NoHitObjects,
    /// The max-combo replay found a slider but the map has no timing points
    /// to govern it.
    #[error("max combo needs at least one timing point to govern sliders")]
    NoTimingPoints,
}

/// The derived fields of a beatmap, valid for the decoded content they were
/// computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeatmapMetrics {
    /// MD5 hex digest of the raw source bytes, the stable map identity.
    pub md5: String,
    /// Tempo fixed by the first timing point, rounded to whole beats per
    /// minute. `-1` when no timing point defines one.
    pub bpm: i32,
    /// The maximum achievable combo including slider ticks.
    pub max_combo: u32,
    /// Count of all hit objects.
    pub total_hits: u32,
    /// Count of circles.
    pub circles: u32,
    /// Count of sliders.
    pub sliders: u32,
    /// Count of spinners.
    pub spinners: u32,
    /// Whole seconds from the start to the last object.
    pub play_time: i64,
    /// Whole seconds of active play: first to last object minus breaks.
    pub drain_time: i64,
    /// Total milliseconds spent in break periods.
    pub break_time: i64,
}

/// Computes every derived field over the decoded content. `md5` is the
/// identity of the source the content was decoded from.
pub(crate) fn compute(beatmap: &Beatmap, md5: String) -> Result<BeatmapMetrics, MetricsError> {
    let (Some(first), Some(last)) = (beatmap.hit_objects.first(), beatmap.hit_objects.last())
    else {
        return Err(MetricsError::NoHitObjects);
    };

    let break_time: i64 = beatmap
        .events
        .breaks
        .iter()
        .map(|period| i64::from(period.end - period.start))
        .sum();
    let play_time = i64::from(last.start_time).div_euclid(1000);
    let drain_time = (i64::from(last.start_time) - i64::from(first.start_time) - break_time)
        .div_euclid(1000);

    let bpm = beatmap
        .timing_points
        .first()
        .filter(|point| point.beat_length != 0.0)
        .map_or(-1, |point| (60000.0 / point.beat_length).round() as i32);

    let (mut circles, mut sliders, mut spinners) = (0, 0, 0);
    for object in &beatmap.hit_objects {
        match &object.kind {
            HitObjectKind::Circle => circles += 1,
            HitObjectKind::Slider(_) => sliders += 1,
            HitObjectKind::Spinner { .. } => spinners += 1,
            HitObjectKind::Generic { .. } => {}
        }
    }

    Ok(BeatmapMetrics {
        md5,
        bpm,
        max_combo: max_combo(beatmap)?,
        total_hits: beatmap.hit_objects.len() as u32,
        circles,
        sliders,
        spinners,
        play_time,
        drain_time,
        break_time,
    })
}

/// Replays the timing chain over the objects in order. Every non-slider
/// contributes 1; a slider contributes its edge count plus the ticks that
/// fit along its path at the governing velocity.
fn max_combo(beatmap: &Beatmap) -> Result<u32, MetricsError> {
    let timings = &beatmap.timing_points;
    let mut combo: u64 = 0;

    // Cursor over the timing chain; the spacing is recomputed only when the
    // cursor advances past another point.
    let mut cursor = 0;
    let mut px_per_beat = 0.0_f64;
    let mut next_offset = Some(f64::NEG_INFINITY);

    for object in &beatmap.hit_objects {
        let HitObjectKind::Slider(slider) = &object.kind else {
            combo += 1;
            continue;
        };

        while let Some(offset) = next_offset {
            if f64::from(object.start_time) < offset {
                break;
            }
            let Some(timing) = timings.get(cursor) else {
                return Err(MetricsError::NoTimingPoints);
            };
            next_offset = timings.get(cursor + 1).map(|point| point.offset);

            let mut sv_multiplier = 1.0;
            if !timing.timing_change.unwrap_or(false) && timing.beat_length < 0.0 {
                sv_multiplier = -100.0 / timing.beat_length;
            }
            px_per_beat = beatmap.difficulty.slider_multiplier * 100.0 * sv_multiplier;
            if beatmap.format_version < 8 {
                // Versions below 8 scale tick spacing back by the inherited
                // multiplier.
                px_per_beat /= sv_multiplier;
            }
            cursor += 1;
        }

        let repeat = i64::from(slider.repeat_count);
        let num_beats = slider.pixel_length * repeat as f64 / px_per_beat;
        let mut ticks = ((num_beats - 0.1) / repeat as f64 * beatmap.difficulty.slider_tick_rate)
            .ceil() as i64;
        ticks -= 1;
        ticks *= repeat;
        ticks += repeat + 1;
        combo += ticks.max(0) as u64;
    }
    Ok(combo as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osu::{
        command::{CurveKind, Position},
        model::{
            Difficulty,
            hit_object::{Edge, HitObject, SliderData},
            timing::TimingPoint,
        },
    };

    fn uninherited(offset: f64, beat_length: f64) -> TimingPoint {
        TimingPoint {
            offset,
            beat_length,
            meter: 4,
            sample_set_id: 0,
            custom_sample_index: 0,
            sample_volume: 100,
            timing_change: Some(true),
            kiai: None,
            velocity: 1.0,
        }
    }

    fn circle(start_time: i32) -> HitObject {
        HitObject {
            pos: Position::new(0, 0),
            start_time,
            new_combo: false,
            colour_skip: 0,
            sound: 0,
            additions: None,
            kind: HitObjectKind::Circle,
        }
    }

    fn slider(start_time: i32, pixel_length: f64, repeat_count: u32) -> HitObject {
        let edges = vec![Edge::default(); repeat_count as usize + 1];
        HitObject {
            kind: HitObjectKind::Slider(SliderData {
                repeat_count,
                pixel_length,
                curve_kind: CurveKind::Linear,
                points: vec![Position::new(100, 0)],
                end_position: Position::new(100, 0),
                duration: 0,
                end_time: start_time,
                edges,
            }),
            ..circle(start_time)
        }
    }

    #[test]
    fn single_slider_combo() {
        let beatmap = Beatmap {
            format_version: 14,
            difficulty: Difficulty {
                slider_multiplier: 1.0,
                slider_tick_rate: 1.0,
                ..Default::default()
            },
            timing_points: vec![uninherited(0.0, 500.0)],
            hit_objects: vec![slider(0, 300.0, 1)],
            ..Default::default()
        };
        // px/beat 100, 3 beats, ceil(2.9) = 3 ticks, (3-1)*1 + 1 + 1 = 4.
        let metrics = compute(&beatmap, String::new()).unwrap();
        assert_eq!(metrics.max_combo, 4);
        assert_eq!(metrics.sliders, 1);
        assert_eq!(metrics.total_hits, 1);
    }

    #[test]
    fn non_sliders_contribute_one_each() {
        let beatmap = Beatmap {
            format_version: 14,
            timing_points: vec![uninherited(0.0, 500.0)],
            hit_objects: vec![
                circle(0),
                circle(500),
                HitObject {
                    kind: HitObjectKind::Spinner { end_time: 2000 },
                    ..circle(1000)
                },
            ],
            ..Default::default()
        };
        let metrics = compute(&beatmap, String::new()).unwrap();
        assert_eq!(metrics.max_combo, 3);
        assert_eq!(metrics.circles, 2);
        assert_eq!(metrics.spinners, 1);
        assert_eq!(metrics.bpm, 120);
    }

    #[test]
    fn no_objects_is_a_precondition_violation() {
        let beatmap = Beatmap::default();
        assert_eq!(
            compute(&beatmap, String::new()),
            Err(MetricsError::NoHitObjects)
        );
    }

    #[test]
    fn slider_without_timing_points_is_a_precondition_violation() {
        let beatmap = Beatmap {
            format_version: 14,
            hit_objects: vec![slider(0, 100.0, 1)],
            ..Default::default()
        };
        assert_eq!(
            compute(&beatmap, String::new()),
            Err(MetricsError::NoTimingPoints)
        );
    }

    #[test]
    fn play_and_drain_time() {
        let mut beatmap = Beatmap {
            format_version: 14,
            timing_points: vec![uninherited(0.0, 500.0)],
            hit_objects: vec![circle(500), circle(30000)],
            ..Default::default()
        };
        beatmap.events.breaks.push(crate::osu::model::BreakPeriod {
            start: 24000,
            end: 28000,
        });
        let metrics = compute(&beatmap, String::new()).unwrap();
        assert_eq!(metrics.break_time, 4000);
        assert_eq!(metrics.play_time, 30);
        // (30000 - 500 - 4000) / 1000, floored.
        assert_eq!(metrics.drain_time, 25);
    }
}
