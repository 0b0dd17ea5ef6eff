//! Line classifier of the .osu format.
//!
//! A .osu file is a line-oriented text format: a fixed header line carrying
//! the format version, then `[Section]` headers switching the active section
//! and one record per line within it. This module decodes the raw text side
//! of that grammar; [`crate::osu::parse`] gives the lines their meaning.

use super::ParseError;

/// The fixed prefix of the first line of every .osu file. The format version
/// integer follows it immediately, e.g. `osu file format v14`.
pub const OSU_FILE_HEADER: &str = "osu file format v";

/// Removes a leading UTF-8 byte order mark, which osu! clients commonly
/// write.
#[must_use]
pub fn strip_bom(source: &str) -> &str {
    source.strip_prefix('\u{feff}').unwrap_or(source)
}

/// Validates the header line and extracts the format version from it.
pub fn parse_version(header_line: &str) -> Result<i32, ParseError> {
    header_line
        .strip_prefix(OSU_FILE_HEADER)
        .and_then(|version| version.trim().parse().ok())
        .ok_or_else(|| ParseError::MalformedHeader {
            header: header_line.to_owned(),
        })
}

/// A recognized `[Section]` of the file.
///
/// Unrecognized sections have no variant: their lines are discarded for
/// forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Section {
    /// `[General]`
    General,
    /// `[Editor]`
    Editor,
    /// `[Metadata]`
    Metadata,
    /// `[Difficulty]`
    Difficulty,
    /// `[Events]`
    Events,
    /// `[TimingPoints]`
    TimingPoints,
    /// `[Colours]`
    Colours,
    /// `[HitObjects]`
    HitObjects,
}

impl Section {
    /// Resolves a section from its header name, matched case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "general" => Some(Self::General),
            "editor" => Some(Self::Editor),
            "metadata" => Some(Self::Metadata),
            "difficulty" => Some(Self::Difficulty),
            "events" => Some(Self::Events),
            "timingpoints" => Some(Self::TimingPoints),
            "colours" => Some(Self::Colours),
            "hitobjects" => Some(Self::HitObjects),
            _ => None,
        }
    }

    /// The name written in the section header line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Editor => "Editor",
            Self::Metadata => "Metadata",
            Self::Difficulty => "Difficulty",
            Self::Events => "Events",
            Self::TimingPoints => "TimingPoints",
            Self::Colours => "Colours",
            Self::HitObjects => "HitObjects",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracts the name of a `[Section]` header line, or `None` when the line
/// is an ordinary record.
#[must_use]
pub fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']'))
}
