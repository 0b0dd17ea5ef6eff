//! Decoding of `[HitObjects]` records.
//!
//! A record is comma-separated: `x,y,time,type,hitSound,objectParams...`,
//! where the bit-packed type byte selects the kind and the kind selects the
//! schema of the remaining fields. Sliders nest two more delimiter levels:
//! `|` between curve tokens and per-edge lists, `:` inside control points
//! and additions sub-records.

use super::{malformed, number};
use crate::osu::{
    ParseError,
    command::{CurveKind, Position, SampleSet, object_type},
    lex::Section,
    model::{
        Beatmap,
        hit_object::{Additions, Edge, HitObject, HitObjectKind, SliderData},
        timing::timing_point_at,
    },
};

const SECTION: Section = Section::HitObjects;

pub(crate) fn hit_object(beatmap: &mut Beatmap, record: &str) -> Result<(), ParseError> {
    let fields: Vec<&str> = record.split(',').collect();
    let [x, y, start_time, raw_type, sound, rest @ ..] = fields.as_slice() else {
        return Err(malformed(SECTION, record, "expected at least 5 fields"));
    };
    let pos = Position::new(
        number(SECTION, record, "x", x)?,
        number(SECTION, record, "y", y)?,
    );
    let start_time: i32 = number(SECTION, record, "start time", start_time)?;
    let raw_type: u32 = number(SECTION, record, "type", raw_type)?;
    let sound: u32 = number(SECTION, record, "hit sound", sound)?;

    let new_combo = raw_type & object_type::NEW_COMBO != 0;
    let colour_skip = ((raw_type & object_type::COLOUR_SKIP_MASK) >> 4) as u8;

    let (kind, additions) = if raw_type & object_type::CIRCLE != 0 {
        (HitObjectKind::Circle, additions_field(record, rest.first())?)
    } else if raw_type & object_type::SPINNER != 0 {
        let end_time = rest
            .first()
            .ok_or_else(|| malformed(SECTION, record, "spinner needs an end time"))?;
        let end_time = number(SECTION, record, "end time", end_time)?;
        (
            HitObjectKind::Spinner { end_time },
            additions_field(record, rest.get(1))?,
        )
    } else if raw_type & object_type::SLIDER != 0 {
        slider(beatmap, record, start_time, rest)?
    } else {
        // An object kind this parser does not know about; keep the shared
        // fields and the type byte as-is.
        (HitObjectKind::Generic { raw_kind: raw_type }, None)
    };

    beatmap.hit_objects.push(HitObject {
        pos,
        start_time,
        new_combo,
        colour_skip,
        sound,
        additions,
        kind,
    });
    Ok(())
}

/// Decodes the slider tail: `curve,repeats,length[,edgeSounds[,edgeSets[,hitSample]]]`.
fn slider(
    beatmap: &Beatmap,
    record: &str,
    start_time: i32,
    rest: &[&str],
) -> Result<(HitObjectKind, Option<Additions>), ParseError> {
    let [curve, repeat_count, pixel_length, tail @ ..] = rest else {
        return Err(malformed(
            SECTION,
            record,
            "slider needs a curve, repeat count and length",
        ));
    };
    let repeat_count: u32 = number(SECTION, record, "repeat count", repeat_count)?;
    let pixel_length: f64 = number(SECTION, record, "pixel length", pixel_length)?;

    let mut curve_tokens = curve.split('|');
    let curve_kind = curve_tokens
        .next()
        .and_then(CurveKind::from_code)
        .ok_or_else(|| malformed(SECTION, record, "unknown curve kind"))?;
    let points = curve_tokens
        .map(|token| {
            let (x, y) = token
                .split_once(':')
                .ok_or_else(|| malformed(SECTION, record, "control point must be `x:y`"))?;
            Ok(Position::new(
                number(SECTION, record, "control point x", x)?,
                number(SECTION, record, "control point y", y)?,
            ))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    let end_position = *points
        .last()
        .ok_or_else(|| malformed(SECTION, record, "slider has no control points"))?;

    // The duration is resolved against the point governing the start time,
    // using that point's raw beat length.
    let timing = timing_point_at(&beatmap.timing_points, f64::from(start_time))
        .ok_or(ParseError::MissingTimingPoint { start_time })?;
    let px_per_beat = beatmap.difficulty.slider_multiplier * 100.0 * timing.velocity;
    let beats_count = pixel_length * f64::from(repeat_count) / px_per_beat;
    let duration = (beats_count * timing.beat_length).ceil() as i32;

    // One edge per traversal; indices missing from the pipe lists leave the
    // edge unset.
    let edge_sounds: Vec<&str> = tail.first().copied().unwrap_or("").split('|').collect();
    let edge_additions: Vec<&str> = tail.get(1).copied().unwrap_or("").split('|').collect();
    let mut edges = Vec::with_capacity(repeat_count as usize + 1);
    for index in 0..=repeat_count as usize {
        let sound = match edge_sounds.get(index) {
            None | Some(&"") => None,
            Some(&token) => Some(number(SECTION, record, "edge sound", token)?),
        };
        let additions = match edge_additions.get(index) {
            None => None,
            Some(&token) => parse_additions(record, token)?,
        };
        edges.push(Edge { sound, additions });
    }

    let additions = additions_field(record, tail.get(2))?;
    Ok((
        HitObjectKind::Slider(SliderData {
            repeat_count,
            pixel_length,
            curve_kind,
            points,
            end_position,
            duration,
            end_time: start_time + duration,
            edges,
        }),
        additions,
    ))
}

fn additions_field(
    record: &str,
    field: Option<&&str>,
) -> Result<Option<Additions>, ParseError> {
    field.map_or(Ok(None), |&token| parse_additions(record, token))
}

/// Decodes a colon-separated additions sub-record. Fields beyond the end of
/// the record stay unset; a record carrying no data at all decodes to
/// `None`.
pub(crate) fn parse_additions(record: &str, token: &str) -> Result<Option<Additions>, ParseError> {
    if token.is_empty() {
        return Ok(None);
    }
    let mut fields = token.split(':');
    let additions = Additions {
        normal: fields.next().and_then(SampleSet::from_token),
        additional: fields.next().and_then(SampleSet::from_token),
        custom_sample_index: fields
            .next()
            .map(|value| number(SECTION, record, "custom sample index", value))
            .transpose()?,
        volume: fields
            .next()
            .map(|value| number::<i32>(SECTION, record, "volume", value))
            .transpose()?
            .map(|volume| volume.max(0)),
        filename: fields.next().map(ToOwned::to_owned),
    };
    Ok((!additions.is_unset()).then_some(additions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osu::model::{Difficulty, timing::TimingPoint};

    fn beatmap_with_timing() -> Beatmap {
        Beatmap {
            format_version: 14,
            difficulty: Difficulty {
                slider_multiplier: 1.0,
                slider_tick_rate: 1.0,
                ..Default::default()
            },
            timing_points: vec![TimingPoint {
                offset: 0.0,
                beat_length: 500.0,
                meter: 4,
                sample_set_id: 0,
                custom_sample_index: 0,
                sample_volume: 100,
                timing_change: Some(true),
                kiai: None,
                velocity: 1.0,
            }],
            ..Default::default()
        }
    }

    fn decode(record: &str) -> HitObject {
        let mut beatmap = beatmap_with_timing();
        hit_object(&mut beatmap, record).expect("record must decode");
        beatmap.hit_objects.pop().expect("one object decoded")
    }

    #[test]
    fn type_byte_circle() {
        let object = decode("256,192,500,1,0");
        assert_eq!(object.kind, HitObjectKind::Circle);
        assert!(!object.new_combo);
        assert_eq!(object.colour_skip, 0);
        assert_eq!(object.additions, None);
    }

    #[test]
    fn type_byte_new_combo_and_colour_skip() {
        let object = decode("256,192,500,5,0");
        assert_eq!(object.kind, HitObjectKind::Circle);
        assert!(object.new_combo);
        assert_eq!(object.colour_skip, 0);

        // Bit 7 carries no meaning here; bits 4-6 carry the colour skip.
        let object = decode("256,192,500,133,0");
        assert_eq!(object.kind, HitObjectKind::Circle);
        assert!(object.new_combo);
        assert_eq!(object.colour_skip, 0);

        let object = decode("256,192,500,117,0");
        assert!(object.new_combo);
        assert_eq!(object.colour_skip, 0b111);
    }

    #[test]
    fn unknown_kind_is_kept_generic() {
        let object = decode("256,192,500,128,4");
        assert_eq!(object.kind, HitObjectKind::Generic { raw_kind: 128 });
        assert_eq!(object.sound, 4);
    }

    #[test]
    fn spinner_end_time() {
        let object = decode("256,192,500,12,0,3500,0:0:0:50:");
        assert_eq!(object.kind, HitObjectKind::Spinner { end_time: 3500 });
        assert!(object.new_combo);
        assert_eq!(
            object.additions,
            Some(Additions {
                volume: Some(50),
                custom_sample_index: Some(0),
                filename: Some(String::new()),
                ..Default::default()
            })
        );

        let mut beatmap = beatmap_with_timing();
        assert!(hit_object(&mut beatmap, "256,192,500,12,0").is_err());
    }

    #[test]
    fn slider_duration_and_edges() {
        let object = decode("256,192,1500,2,0,B|350:192|350:100,1,150,2|0,0:0|1:2,0:0:0:0:");
        let HitObjectKind::Slider(slider) = &object.kind else {
            panic!("expected a slider");
        };
        assert_eq!(slider.curve_kind, CurveKind::Bezier);
        assert_eq!(
            slider.points,
            vec![Position::new(350, 192), Position::new(350, 100)]
        );
        assert_eq!(slider.end_position, Position::new(350, 100));
        // px/beat 100, 1.5 beats over one pass, ceil(1.5 * 500) = 750.
        assert_eq!(slider.duration, 750);
        assert_eq!(slider.end_time, 2250);
        assert_eq!(slider.edges.len(), 2);
        assert_eq!(slider.edges.first().unwrap().sound, Some(2));
        assert_eq!(slider.edges.first().unwrap().additions, None);
        assert_eq!(slider.edges.get(1).unwrap().sound, Some(0));
        assert_eq!(
            slider.edges.get(1).unwrap().additions,
            Some(Additions {
                normal: Some(SampleSet::Normal),
                additional: Some(SampleSet::Soft),
                ..Default::default()
            })
        );
    }

    #[test]
    fn slider_edges_default_to_unset() {
        let object = decode("50,50,500,6,0,L|150:50,2,100");
        let HitObjectKind::Slider(slider) = &object.kind else {
            panic!("expected a slider");
        };
        assert_eq!(slider.repeat_count, 2);
        assert_eq!(slider.edges.len(), 3);
        assert!(slider.edges.iter().all(|edge| edge.sound.is_none()));
        assert!(slider.edges.iter().all(|edge| edge.additions.is_none()));
    }

    #[test]
    fn slider_without_timing_points_is_fatal() {
        let mut beatmap = Beatmap::default();
        let err = hit_object(&mut beatmap, "50,50,500,2,0,L|150:50,1,100").unwrap_err();
        assert_eq!(err, ParseError::MissingTimingPoint { start_time: 500 });
    }

    #[test]
    fn malformed_slider_records() {
        let mut beatmap = beatmap_with_timing();
        assert!(hit_object(&mut beatmap, "50,50,500,2,0,L|150:50,1").is_err());
        assert!(hit_object(&mut beatmap, "50,50,500,2,0,Q|150:50,1,100").is_err());
        assert!(hit_object(&mut beatmap, "50,50,500,2,0,L,1,100").is_err());
        assert!(hit_object(&mut beatmap, "50,50,500,2,0,L|150;50,1,100").is_err());
        assert!(beatmap.hit_objects.is_empty());
    }

    #[test]
    fn additions_sub_record() {
        let additions = parse_additions("", "1:2:0:50:hit.wav").unwrap().unwrap();
        assert_eq!(additions.normal, Some(SampleSet::Normal));
        assert_eq!(additions.additional, Some(SampleSet::Soft));
        assert_eq!(additions.custom_sample_index, Some(0));
        assert_eq!(additions.volume, Some(50));
        assert_eq!(additions.filename.as_deref(), Some("hit.wav"));
    }

    #[test]
    fn empty_additions_are_unset() {
        assert_eq!(parse_additions("", "").unwrap(), None);
        // A record carrying only unrecognized sample tokens is no record.
        assert_eq!(parse_additions("", "0:0").unwrap(), None);
    }

    #[test]
    fn additions_volume_is_clamped() {
        let additions = parse_additions("", "0:0:1:-20").unwrap().unwrap();
        assert_eq!(additions.volume, Some(0));
        assert_eq!(additions.custom_sample_index, Some(1));
    }
}
