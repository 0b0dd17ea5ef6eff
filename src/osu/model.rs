//! The decoded beatmap model.
//!
//! [`Beatmap`] is populated field by field while the section decoders scan
//! the source top to bottom, then finalized by one metrics pass. After that
//! the decoded fields may be edited freely; derived metrics become stale on
//! edit and stay so until [`Beatmap::recompute_metrics`] is called.

pub mod hit_object;
pub mod timing;

use std::collections::BTreeMap;

use md5::{Digest, Md5};

use self::{hit_object::HitObject, timing::TimingPoint};
use super::{
    ParseError,
    command::Rgb,
    metrics::{self, BeatmapMetrics, MetricsError},
    parse,
};

/// A decoded .osu beatmap.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beatmap {
    /// The format version from the header line.
    pub format_version: i32,
    /// The `[General]` section.
    pub general: General,
    /// The `[Editor]` section.
    pub editor: Editor,
    /// The `[Metadata]` section.
    pub metadata: Metadata,
    /// The `[Difficulty]` section.
    pub difficulty: Difficulty,
    /// The `[Events]` section: background, video and break periods.
    pub events: Events,
    /// The `[TimingPoints]` section, in source order.
    pub timing_points: Vec<TimingPoint>,
    /// The `[Colours]` section. Later duplicate slot names overwrite
    /// earlier ones.
    pub colours: BTreeMap<String, Rgb>,
    /// The `[HitObjects]` section, in source order.
    pub hit_objects: Vec<HitObject>,
    /// Derived metrics. Not part of the decoded content; see
    /// [`Beatmap::metrics`].
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) metrics: Option<BeatmapMetrics>,
}

/// Equality of the decoded content. Derived metrics are excluded, so a
/// beatmap compares equal to its own parse → unparse → parse round trip.
impl PartialEq for Beatmap {
    fn eq(&self, other: &Self) -> bool {
        self.format_version == other.format_version
            && self.general == other.general
            && self.editor == other.editor
            && self.metadata == other.metadata
            && self.difficulty == other.difficulty
            && self.events == other.events
            && self.timing_points == other.timing_points
            && self.colours == other.colours
            && self.hit_objects == other.hit_objects
    }
}

impl Beatmap {
    /// Parses a beatmap from the raw bytes of a .osu file.
    ///
    /// Strips an optional UTF-8 byte order mark, decodes every section and,
    /// when the map has at least one hit object, runs the derived-metrics
    /// pass with the MD5 of `bytes` as the map identity. A map with no
    /// objects parses successfully with [`Beatmap::metrics`] left empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let source = std::str::from_utf8(bytes)?;
        let mut beatmap = parse::parse_str(source)?;
        if !beatmap.hit_objects.is_empty() {
            let md5 = format!("{:x}", Md5::digest(bytes));
            beatmap.metrics = Some(metrics::compute(&beatmap, md5)?);
        }
        Ok(beatmap)
    }

    /// The derived metrics from the last metrics pass, or `None` for a map
    /// parsed without hit objects or built by hand.
    ///
    /// Editing the decoded fields does not refresh this; call
    /// [`Beatmap::recompute_metrics`] after mutation.
    #[must_use]
    pub const fn metrics(&self) -> Option<&BeatmapMetrics> {
        self.metrics.as_ref()
    }

    /// Reruns the derived-metrics pass over the current decoded content.
    ///
    /// The content hash is the identity of the originally parsed source and
    /// is carried over unchanged; it is empty for hand-built maps.
    pub fn recompute_metrics(&mut self) -> Result<(), MetricsError> {
        let md5 = self.metrics.take().map(|m| m.md5).unwrap_or_default();
        self.metrics = Some(metrics::compute(self, md5)?);
        Ok(())
    }
}

impl std::str::FromStr for Beatmap {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(source.as_bytes())
    }
}

/// Scalar fields of the `[General]` section.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct General {
    /// The audio file relative to the beatmap directory.
    pub audio_filename: String,
    /// Milliseconds of silence before the audio starts.
    pub audio_lead_in: i32,
    /// Time in milliseconds the song preview starts from.
    pub preview_time: i32,
    /// Countdown speed before the first object.
    pub countdown: i32,
    /// Default sample set name (`Normal`, `Soft`, `Drum`).
    pub sample_set: String,
    /// How much stacked objects lean away from each other.
    pub stack_leniency: f64,
    /// Game mode id.
    pub mode: i32,
    /// Whether breaks letterbox the playfield.
    pub letterbox_in_breaks: bool,
    /// Whether the storyboard is widescreen.
    pub widescreen_storyboard: bool,
}

/// Scalar fields of the `[Editor]` section.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Editor {
    /// Distance snap multiplier.
    pub distance_spacing: f64,
    /// Beat snap divisor.
    pub beat_divisor: i32,
    /// Grid size in the editor.
    pub grid_size: i32,
    /// Editor timeline zoom factor.
    pub timeline_zoom: f64,
}

/// Scalar fields of the `[Metadata]` section.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Romanized song title.
    pub title: String,
    /// Song title as written in its source language.
    pub title_unicode: String,
    /// Romanized artist name.
    pub artist: String,
    /// Artist name as written in its source language.
    pub artist_unicode: String,
    /// Who mapped the beatmap.
    pub creator: String,
    /// The difficulty name of this map within its set.
    pub version: String,
    /// Where the song comes from.
    pub source: String,
    /// Space-separated search terms.
    pub tags: String,
    /// Online id of this map.
    pub beatmap_id: i64,
    /// Online id of the beatmap set.
    pub beatmap_set_id: i64,
}

/// Scalar fields of the `[Difficulty]` section.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Difficulty {
    /// HP drain rate, 0-10.
    pub hp_drain_rate: f64,
    /// Circle size, 0-10.
    pub circle_size: f64,
    /// Overall difficulty, 0-10.
    pub overall_difficulty: f64,
    /// Approach rate, 0-10.
    pub approach_rate: f64,
    /// Base slider speed in hundreds of osu! pixels per beat.
    pub slider_multiplier: f64,
    /// Slider ticks per beat.
    pub slider_tick_rate: f64,
}

/// Recognized rows of the `[Events]` section. Storyboard command rows are
/// not modeled and are dropped on a round trip.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Events {
    /// Whether a `Video` row was present.
    pub has_video: bool,
    /// The video file of the `Video` row, quotes stripped.
    pub video_file: String,
    /// The start offset of the `Video` row, in milliseconds.
    pub video_start_time: i32,
    /// The background image of the `0,0` row, quotes stripped.
    pub background_file: String,
    /// Break periods, in source order.
    pub breaks: Vec<BreakPeriod>,
}

/// One `2,start,end` break row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakPeriod {
    /// Start of the break in milliseconds.
    pub start: i32,
    /// End of the break in milliseconds.
    pub end: i32,
}
