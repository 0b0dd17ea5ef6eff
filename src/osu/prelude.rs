//! Prelude module for the osu crate.
//!
//! This module re-exports all public types from the osu module for
//! convenient access. You can use `use osu_rs::osu::prelude::*;` to import
//! them all at once.

pub use super::{
    ParseError,
    command::{CurveKind, Position, Rgb, SampleSet, object_type},
    lex::{OSU_FILE_HEADER, Section, section_header, strip_bom},
    metrics::{BeatmapMetrics, MetricsError},
    model::{
        Beatmap, BreakPeriod, Difficulty, Editor, Events, General, Metadata,
        hit_object::{Additions, Edge, HitObject, HitObjectKind, SliderData},
        timing::{TimingPoint, timing_point_at},
    },
    parse_osu,
    unparse::osu_float,
};
