//! Render a [`Beatmap`] back into the sectioned .osu text form.
//!
//! The structural inverse of [`crate::osu::parse`]: sections come out in the
//! fixed order General, Editor, Metadata, Difficulty, Events, TimingPoints,
//! Colours, HitObjects, and every float crosses the text boundary through
//! [`osu_float`]. Nothing is validated here; the in-memory model's
//! invariants are trusted.

use std::fmt::Write;

use itertools::Itertools;

use super::{
    command::{SampleSet, object_type},
    lex::OSU_FILE_HEADER,
    model::{
        Beatmap,
        hit_object::{Additions, Edge, HitObject, HitObjectKind, SliderData},
    },
};

/// Formats a float the way the .osu format writes it: render normally, then
/// drop a trailing `.0`.
#[must_use]
pub fn osu_float(value: f64) -> String {
    let repr = value.to_string();
    match repr.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_owned(),
        None => repr,
    }
}

impl Beatmap {
    /// Renders the decoded model back into .osu text.
    ///
    /// Derived metrics are not re-derived and do not appear in the output;
    /// rows declared lossy on decode (storyboard commands, lines of
    /// unrecognized sections) are not reproduced.
    #[must_use]
    pub fn unparse(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{OSU_FILE_HEADER}{}", self.format_version);

        let _ = writeln!(out, "\n[General]");
        self.unparse_general(&mut out);
        let _ = writeln!(out, "\n[Editor]");
        self.unparse_editor(&mut out);
        let _ = writeln!(out, "\n[Metadata]");
        self.unparse_metadata(&mut out);
        let _ = writeln!(out, "\n[Difficulty]");
        self.unparse_difficulty(&mut out);
        let _ = writeln!(out, "\n[Events]");
        self.unparse_events(&mut out);
        let _ = writeln!(out, "\n[TimingPoints]");
        self.unparse_timing_points(&mut out);
        let _ = writeln!(out, "\n[Colours]");
        self.unparse_colours(&mut out);
        let _ = writeln!(out, "\n[HitObjects]");
        self.unparse_hit_objects(&mut out);
        out
    }

    fn unparse_general(&self, out: &mut String) {
        let general = &self.general;
        let _ = writeln!(out, "AudioFilename: {}", general.audio_filename);
        let _ = writeln!(out, "AudioLeadIn: {}", general.audio_lead_in);
        let _ = writeln!(out, "PreviewTime: {}", general.preview_time);
        let _ = writeln!(out, "Countdown: {}", general.countdown);
        let _ = writeln!(out, "SampleSet: {}", general.sample_set);
        let _ = writeln!(out, "StackLeniency: {}", osu_float(general.stack_leniency));
        let _ = writeln!(out, "Mode: {}", general.mode);
        let _ = writeln!(
            out,
            "LetterboxInBreaks: {}",
            i32::from(general.letterbox_in_breaks)
        );
        let _ = writeln!(
            out,
            "WidescreenStoryboard: {}",
            i32::from(general.widescreen_storyboard)
        );
    }

    fn unparse_editor(&self, out: &mut String) {
        let editor = &self.editor;
        let _ = writeln!(out, "DistanceSpacing: {}", osu_float(editor.distance_spacing));
        let _ = writeln!(out, "BeatDivisor: {}", editor.beat_divisor);
        let _ = writeln!(out, "GridSize: {}", editor.grid_size);
        let _ = writeln!(out, "TimelineZoom: {}", osu_float(editor.timeline_zoom));
    }

    fn unparse_metadata(&self, out: &mut String) {
        let metadata = &self.metadata;
        let _ = writeln!(out, "Title:{}", metadata.title);
        let _ = writeln!(out, "TitleUnicode:{}", metadata.title_unicode);
        let _ = writeln!(out, "Artist:{}", metadata.artist);
        let _ = writeln!(out, "ArtistUnicode:{}", metadata.artist_unicode);
        let _ = writeln!(out, "Creator:{}", metadata.creator);
        let _ = writeln!(out, "Version:{}", metadata.version);
        let _ = writeln!(out, "Source:{}", metadata.source);
        let _ = writeln!(out, "Tags: {}", metadata.tags);
        let _ = writeln!(out, "BeatmapID:{}", metadata.beatmap_id);
        let _ = writeln!(out, "BeatmapSetID:{}", metadata.beatmap_set_id);
    }

    fn unparse_difficulty(&self, out: &mut String) {
        let difficulty = &self.difficulty;
        let _ = writeln!(out, "HPDrainRate:{}", osu_float(difficulty.hp_drain_rate));
        let _ = writeln!(out, "CircleSize:{}", osu_float(difficulty.circle_size));
        let _ = writeln!(
            out,
            "OverallDifficulty:{}",
            osu_float(difficulty.overall_difficulty)
        );
        let _ = writeln!(out, "ApproachRate:{}", osu_float(difficulty.approach_rate));
        let _ = writeln!(
            out,
            "SliderMultiplier:{}",
            osu_float(difficulty.slider_multiplier)
        );
        let _ = writeln!(
            out,
            "SliderTickRate:{}",
            osu_float(difficulty.slider_tick_rate)
        );
    }

    fn unparse_events(&self, out: &mut String) {
        let events = &self.events;
        let _ = writeln!(out, "//Background and Video events");
        if events.has_video {
            let _ = writeln!(
                out,
                "Video,{},\"{}\"",
                events.video_start_time, events.video_file
            );
        }
        let _ = writeln!(out, "0,0,\"{}\",0,0", events.background_file);
        let _ = writeln!(out, "//Break Periods");
        for period in &events.breaks {
            let _ = writeln!(out, "2,{},{}", period.start, period.end);
        }
        let _ = writeln!(out, "//Storyboard Layer 0 (Background)");
        let _ = writeln!(out, "//Storyboard Layer 1 (Fail)");
        let _ = writeln!(out, "//Storyboard Layer 2 (Pass)");
        let _ = writeln!(out, "//Storyboard Layer 3 (Foreground)");
        let _ = writeln!(out, "//Storyboard Layer 4 (Overlay)");
        let _ = writeln!(out, "//Storyboard Sound Samples");
    }

    fn unparse_timing_points(&self, out: &mut String) {
        for point in &self.timing_points {
            let mut fields = vec![
                osu_float(point.offset),
                osu_float(point.beat_length),
                point.meter.to_string(),
                point.sample_set_id.to_string(),
                point.custom_sample_index.to_string(),
                point.sample_volume.to_string(),
            ];
            if let Some(timing_change) = point.timing_change {
                fields.push(i32::from(timing_change).to_string());
            }
            if let Some(kiai) = point.kiai {
                fields.push(i32::from(kiai).to_string());
            }
            let _ = writeln!(out, "{}", fields.iter().join(","));
        }
    }

    fn unparse_colours(&self, out: &mut String) {
        for (name, colour) in &self.colours {
            let _ = writeln!(out, "{name} : {},{},{}", colour.r, colour.g, colour.b);
        }
    }

    fn unparse_hit_objects(&self, out: &mut String) {
        for object in &self.hit_objects {
            let mut fields = vec![
                object.pos.x.to_string(),
                object.pos.y.to_string(),
                object.start_time.to_string(),
                type_byte(object).to_string(),
                object.sound.to_string(),
            ];
            match &object.kind {
                HitObjectKind::Circle | HitObjectKind::Generic { .. } => {}
                HitObjectKind::Spinner { end_time } => fields.push(end_time.to_string()),
                HitObjectKind::Slider(slider) => {
                    encode_slider(slider, object.additions.is_some(), &mut fields);
                }
            }
            if let Some(additions) = &object.additions {
                fields.push(encode_additions(additions));
            }
            let _ = writeln!(out, "{}", fields.iter().join(","));
        }
    }
}

/// Reassembles the bit-packed type byte. Generic objects re-emit the byte
/// they were decoded from.
fn type_byte(object: &HitObject) -> u32 {
    match &object.kind {
        HitObjectKind::Generic { raw_kind } => *raw_kind,
        kind => {
            kind.type_bits()
                + u32::from(object.new_combo) * object_type::NEW_COMBO
                + (u32::from(object.colour_skip) << 4)
        }
    }
}

fn encode_slider(slider: &SliderData, has_additions: bool, fields: &mut Vec<String>) {
    let curve = std::iter::once(slider.curve_kind.to_string())
        .chain(
            slider
                .points
                .iter()
                .map(|point| format!("{}:{}", point.x, point.y)),
        )
        .join("|");
    fields.push(curve);
    fields.push(slider.repeat_count.to_string());
    fields.push(osu_float(slider.pixel_length));

    // The pipe lists position the trailing hit sample, so they are needed
    // whenever any edge carries data or a hit sample follows.
    let needs_edge_lists = has_additions
        || slider
            .edges
            .iter()
            .any(|edge| edge.sound.is_some() || edge.additions.is_some());
    if needs_edge_lists {
        fields.push(
            slider
                .edges
                .iter()
                .map(|edge| edge.sound.map_or_else(String::new, |sound| sound.to_string()))
                .join("|"),
        );
        fields.push(slider.edges.iter().map(encode_edge_additions).join("|"));
    }
}

fn encode_edge_additions(edge: &Edge) -> String {
    let (normal, additional) = edge
        .additions
        .as_ref()
        .map_or((None, None), |additions| {
            (additions.normal, additions.additional)
        });
    format!("{}:{}", sample_code(normal), sample_code(additional))
}

/// Encodes an additions sub-record up to its last set field, mirroring the
/// decoder's positional schema.
fn encode_additions(additions: &Additions) -> String {
    let mut fields = vec![
        sample_code(additions.normal),
        sample_code(additions.additional),
    ];
    let tail = [
        additions.custom_sample_index.map(|index| index.to_string()),
        additions.volume.map(|volume| volume.to_string()),
        additions.filename.clone(),
    ];
    if let Some(last) = tail.iter().rposition(Option::is_some) {
        fields.extend(
            tail.into_iter()
                .take(last + 1)
                .map(|slot| slot.unwrap_or_else(|| "0".to_owned())),
        );
    }
    fields.join(":")
}

fn sample_code(sample: Option<SampleSet>) -> String {
    sample.map_or_else(|| "0".to_owned(), |sample| sample.to_string())
}
