//! Section decoders of the .osu format.
//!
//! One linear pass: each non-blank line is routed to the decoder of the
//! section it stands in, which assigns typed fields on the aggregate model.
//! Unknown sections and unknown keys are skipped for forward compatibility;
//! a recognized record that fails to decode stops the pass with the first
//! fatal error.

pub(crate) mod hit_object;

use std::str::FromStr;

use super::{
    ParseError,
    command::Rgb,
    lex::{self, Section},
    model::{Beatmap, BreakPeriod, timing::TimingPoint},
};

type SectionDecoder = fn(&mut Beatmap, &str) -> Result<(), ParseError>;

/// Runs the line pass over a BOM-stripped source and returns the populated
/// model, without the derived-metrics pass.
pub(crate) fn parse_str(source: &str) -> Result<Beatmap, ParseError> {
    let source = lex::strip_bom(source);
    let mut lines = source.split('\n').map(str::trim);

    let format_version = lex::parse_version(lines.next().unwrap_or(""))?;
    let mut beatmap = Beatmap {
        format_version,
        ..Beatmap::default()
    };

    // The decoder is resolved once per section header; lines under an
    // unrecognized section fall through with no decoder.
    let mut decoder: Option<SectionDecoder> = None;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some(name) = lex::section_header(line) {
            decoder = Section::from_name(name).map(section_decoder);
            continue;
        }
        if let Some(decode) = decoder {
            decode(&mut beatmap, line)?;
        }
    }
    Ok(beatmap)
}

const fn section_decoder(section: Section) -> SectionDecoder {
    match section {
        Section::General => general,
        Section::Editor => editor,
        Section::Metadata => metadata,
        Section::Difficulty => difficulty,
        Section::Events => events,
        Section::TimingPoints => timing_points,
        Section::Colours => colours,
        Section::HitObjects => hit_object::hit_object,
    }
}

pub(crate) fn malformed(section: Section, record: &str, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedRecord {
        section,
        record: record.to_owned(),
        reason: reason.into(),
    }
}

pub(crate) fn number<T: FromStr>(
    section: Section,
    record: &str,
    name: &str,
    value: &str,
) -> Result<T, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| malformed(section, record, format!("invalid {name} `{value}`")))
}

/// Splits a `Key:value` / `Key: value` line on a recognized key. Returns
/// `None` when the line carries some other key.
fn value_of<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(str::trim)
}

/// Strips one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

fn general(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::General;
    let general = &mut beatmap.general;
    if let Some(value) = value_of(line, "AudioFilename") {
        general.audio_filename = value.to_owned();
    } else if let Some(value) = value_of(line, "AudioLeadIn") {
        general.audio_lead_in = number(SECTION, line, "AudioLeadIn", value)?;
    } else if let Some(value) = value_of(line, "PreviewTime") {
        general.preview_time = number(SECTION, line, "PreviewTime", value)?;
    } else if let Some(value) = value_of(line, "Countdown") {
        general.countdown = number(SECTION, line, "Countdown", value)?;
    } else if let Some(value) = value_of(line, "SampleSet") {
        general.sample_set = value.to_owned();
    } else if let Some(value) = value_of(line, "StackLeniency") {
        general.stack_leniency = number(SECTION, line, "StackLeniency", value)?;
    } else if let Some(value) = value_of(line, "Mode") {
        general.mode = number(SECTION, line, "Mode", value)?;
    } else if let Some(value) = value_of(line, "LetterboxInBreaks") {
        general.letterbox_in_breaks = value == "1";
    } else if let Some(value) = value_of(line, "WidescreenStoryboard") {
        general.widescreen_storyboard = value == "1";
    }
    Ok(())
}

fn editor(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::Editor;
    let editor = &mut beatmap.editor;
    if let Some(value) = value_of(line, "DistanceSpacing") {
        editor.distance_spacing = number(SECTION, line, "DistanceSpacing", value)?;
    } else if let Some(value) = value_of(line, "BeatDivisor") {
        editor.beat_divisor = number(SECTION, line, "BeatDivisor", value)?;
    } else if let Some(value) = value_of(line, "GridSize") {
        editor.grid_size = number(SECTION, line, "GridSize", value)?;
    } else if let Some(value) = value_of(line, "TimelineZoom") {
        editor.timeline_zoom = number(SECTION, line, "TimelineZoom", value)?;
    }
    Ok(())
}

fn metadata(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::Metadata;
    let metadata = &mut beatmap.metadata;
    // `Title`/`Artist` must not shadow their `*Unicode` siblings; the colon
    // check in `value_of` keeps each key exact.
    if let Some(value) = value_of(line, "Title") {
        metadata.title = value.to_owned();
    } else if let Some(value) = value_of(line, "TitleUnicode") {
        metadata.title_unicode = value.to_owned();
    } else if let Some(value) = value_of(line, "Artist") {
        metadata.artist = value.to_owned();
    } else if let Some(value) = value_of(line, "ArtistUnicode") {
        metadata.artist_unicode = value.to_owned();
    } else if let Some(value) = value_of(line, "Creator") {
        metadata.creator = value.to_owned();
    } else if let Some(value) = value_of(line, "Version") {
        metadata.version = value.to_owned();
    } else if let Some(value) = value_of(line, "Source") {
        metadata.source = value.to_owned();
    } else if let Some(value) = value_of(line, "Tags") {
        metadata.tags = value.to_owned();
    } else if let Some(value) = value_of(line, "BeatmapID") {
        metadata.beatmap_id = number(SECTION, line, "BeatmapID", value)?;
    } else if let Some(value) = value_of(line, "BeatmapSetID") {
        metadata.beatmap_set_id = number(SECTION, line, "BeatmapSetID", value)?;
    }
    Ok(())
}

fn difficulty(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::Difficulty;
    let difficulty = &mut beatmap.difficulty;
    if let Some(value) = value_of(line, "HPDrainRate") {
        difficulty.hp_drain_rate = number(SECTION, line, "HPDrainRate", value)?;
    } else if let Some(value) = value_of(line, "CircleSize") {
        difficulty.circle_size = number(SECTION, line, "CircleSize", value)?;
    } else if let Some(value) = value_of(line, "OverallDifficulty") {
        difficulty.overall_difficulty = number(SECTION, line, "OverallDifficulty", value)?;
    } else if let Some(value) = value_of(line, "ApproachRate") {
        difficulty.approach_rate = number(SECTION, line, "ApproachRate", value)?;
    } else if let Some(value) = value_of(line, "SliderMultiplier") {
        difficulty.slider_multiplier = number(SECTION, line, "SliderMultiplier", value)?;
    } else if let Some(value) = value_of(line, "SliderTickRate") {
        difficulty.slider_tick_rate = number(SECTION, line, "SliderTickRate", value)?;
    }
    Ok(())
}

fn events(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::Events;
    if line.starts_with("//") {
        return Ok(());
    }
    let fields: Vec<&str> = line.split(',').collect();
    match *fields.as_slice() {
        ["Video", start, file, ..] => {
            beatmap.events.has_video = true;
            beatmap.events.video_start_time = number(SECTION, line, "video start", start)?;
            beatmap.events.video_file = unquote(file).to_owned();
        }
        ["0", "0", file, ..] => {
            beatmap.events.background_file = unquote(file).to_owned();
        }
        ["2", start, end, ..] => {
            beatmap.events.breaks.push(BreakPeriod {
                start: number(SECTION, line, "break start", start)?,
                end: number(SECTION, line, "break end", end)?,
            });
        }
        ["Video", ..] | ["0", "0", ..] | ["2", ..] => {
            return Err(malformed(SECTION, line, "missing event parameters"));
        }
        // Storyboard commands and other event rows are not modeled.
        _ => {}
    }
    Ok(())
}

fn timing_points(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::TimingPoints;
    let fields: Vec<&str> = line.split(',').collect();
    let [offset, beat_length, meter, sample_set_id, custom_sample_index, sample_volume, rest @ ..] =
        fields.as_slice()
    else {
        return Err(malformed(SECTION, line, "expected at least 6 fields"));
    };
    let mut point = TimingPoint {
        offset: number(SECTION, line, "offset", offset)?,
        beat_length: number(SECTION, line, "beat length", beat_length)?,
        meter: number(SECTION, line, "meter", meter)?,
        sample_set_id: number(SECTION, line, "sample set", sample_set_id)?,
        custom_sample_index: number(SECTION, line, "sample index", custom_sample_index)?,
        sample_volume: number(SECTION, line, "sample volume", sample_volume)?,
        timing_change: rest.first().map(|&value| value == "1"),
        kiai: rest.get(1).map(|&value| value == "1"),
        velocity: 1.0,
    };
    // The first point overall is tempo-defining; later inherited points
    // carry a velocity multiplier in their negative beat length.
    if !beatmap.timing_points.is_empty() && point.is_inherited() {
        point.velocity = (100.0 / point.beat_length).abs();
    }
    beatmap.timing_points.push(point);
    Ok(())
}

fn colours(beatmap: &mut Beatmap, line: &str) -> Result<(), ParseError> {
    const SECTION: Section = Section::Colours;
    let (name, channels) = line
        .split_once(" : ")
        .ok_or_else(|| malformed(SECTION, line, "expected `Name : R,G,B`"))?;
    let mut channels = channels.split(',');
    let mut channel = |label| {
        channels
            .next()
            .ok_or_else(|| malformed(SECTION, line, format!("missing {label} channel")))
            .and_then(|value| number::<u8>(SECTION, line, label, value))
    };
    let colour = Rgb::new(channel("red")?, channel("green")?, channel("blue")?);
    beatmap.colours.insert(name.to_owned(), colour);
    Ok(())
}
