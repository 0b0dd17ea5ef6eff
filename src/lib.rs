//! The osu! beatmap (.osu) format parser.
//!
//! A .osu file is a line-oriented, sectioned text file describing one
//! playable beatmap: metadata, timing directives and hit objects. This
//! crate parses it into a typed [`osu::model::Beatmap`], derives gameplay
//! metrics (tempo, slider durations, maximum combo) from the decoded
//! content, and serializes the model back into the same text form.
//!
//! # Example
//!
//! ```
//! use osu_rs::osu::parse_osu;
//!
//! let source = b"osu file format v14\n\n[Metadata]\nTitle:Example\nArtist:Someone\n";
//! let beatmap = parse_osu(source).expect("source must parse");
//! assert_eq!(beatmap.metadata.artist, "Someone");
//! let round_tripped = beatmap.unparse();
//! assert!(round_tripped.starts_with("osu file format v14"));
//! ```

pub mod osu;
