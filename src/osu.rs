//! The parser module of osu! beatmap (.osu) files.
//!
//! This module consists of three phases: line classification, section
//! decoding and a derived-metrics pass.
//!
//! `lex` module validates the fixed header line and recognizes `[Section]`
//! headers. `parse` module gives each line its meaning: one decoder per
//! section assigns typed fields on the [`model::Beatmap`] aggregate, with
//! the bit-packed hit-object grammar handled by a dedicated decoder.
//! `metrics` module runs once over the finished model and derives the map
//! identity hash, object counts, play and drain time, the tempo and the
//! maximum achievable combo. `unparse` module is the structural inverse and
//! reproduces the format's numeric conventions.
//!
//! In detail, our policies are:
//!
//! - Support only UTF-8 (an optional byte order mark is accepted).
//! - Skip unknown sections and unknown keys instead of erroring, so newer
//!   files keep parsing.
//! - Stop at the first fatal error; no partial recovery mid-record.
//! - Do not model storyboard command rows; they are dropped on a round
//!   trip.

pub mod command;
pub mod lex;
pub mod metrics;
pub mod model;
pub mod parse;
pub mod prelude;
pub mod unparse;

use thiserror::Error;

use self::{lex::Section, metrics::MetricsError, model::Beatmap};

/// An error occurred when parsing a .osu file.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The first line did not carry the `osu file format v` prefix followed
    /// by an integer version.
    #[error("malformed header line: `{header}`")]
    MalformedHeader {
        /// The offending header line.
        header: String,
    },
    /// A recognized record failed to decode: a numeric field did not parse
    /// or a required field was absent.
    #[error("malformed [{section}] record `{record}`: {reason}")]
    MalformedRecord {
        /// The section the record stood in.
        section: Section,
        /// The offending line.
        record: String,
        /// What failed to decode.
        reason: String,
    },
    /// A slider record needs a governing timing point but the timing
    /// sequence is empty.
    #[error("slider at {start_time}ms has no governing timing point")]
    MissingTimingPoint {
        /// The slider's start time.
        start_time: i32,
    },
    /// The input bytes were not valid UTF-8.
    #[error("beatmap source is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// The derived-metrics pass failed on the parsed map.
    #[error("metrics: {0}")]
    Metrics(#[from] MetricsError),
}

/// Parses a beatmap from the raw bytes of a .osu file.
///
/// A convenience for [`Beatmap::from_bytes`].
///
/// # Example
///
/// ```
/// use osu_rs::osu::parse_osu;
///
/// let source = b"osu file format v14\n\n[Metadata]\nTitle:Example\n";
/// let beatmap = parse_osu(source).expect("source must parse");
/// assert_eq!(beatmap.format_version, 14);
/// assert_eq!(beatmap.metadata.title, "Example");
/// ```
pub fn parse_osu(bytes: &[u8]) -> Result<Beatmap, ParseError> {
    Beatmap::from_bytes(bytes)
}
