use osu_rs::osu::prelude::*;
use pretty_assertions::assert_eq;

fn roundtrip_source(source: &str) {
    // source -> Beatmap
    let first: Beatmap = source.parse().expect("source must parse");

    // Beatmap -> source -> Beatmap
    let unparsed = first.unparse();
    let second: Beatmap = unparsed.parse().expect("unparsed text must parse");

    // Every decoded field survives; lossy rows (storyboard commands,
    // unknown sections) are the declared exception.
    assert_eq!(second, first);

    // A second render of the reparsed model is a fixed point.
    assert_eq!(second.unparse(), unparsed);
}

#[test]
fn roundtrip_simple_file() {
    roundtrip_source(include_str!("files/simple.osu"));
}

#[test]
fn roundtrip_sliders_file() {
    roundtrip_source(include_str!("files/sliders.osu"));
}

#[test]
fn roundtrip_keeps_format_version() {
    let source = "osu file format v7\n\n[Metadata]\nTitle:Old\n";
    let beatmap: Beatmap = source.parse().expect("source must parse");
    assert_eq!(beatmap.format_version, 7);
    assert!(beatmap.unparse().starts_with("osu file format v7\n"));
}

#[test]
fn roundtrip_generic_objects() {
    // Type byte 64 matches no known kind bit; the shared fields round-trip
    // with the byte intact.
    let source = "osu file format v14\n\n[TimingPoints]\n0,300,4,1,0,100\n\n[HitObjects]\n10,20,300,64,4\n";
    let beatmap: Beatmap = source.parse().expect("source must parse");
    let object = beatmap.hit_objects.first().unwrap();
    assert_eq!(object.kind, HitObjectKind::Generic { raw_kind: 64 });

    let reparsed: Beatmap = beatmap.unparse().parse().expect("unparsed text must parse");
    assert_eq!(reparsed, beatmap);
}

#[test]
fn roundtrip_slider_edge_lists() {
    // Edge sounds without edge sets in the source; the writer fills the
    // placeholder set list so the trailing hit sample keeps its position.
    let source = "osu file format v14\n\n[Difficulty]\nSliderMultiplier:1.4\nSliderTickRate:1\n\n[TimingPoints]\n0,300,4,1,0,100\n\n[HitObjects]\n0,0,300,2,0,L|100:0,1,100,4|0,0:0|0:0,1:2:0:50:\n";
    let beatmap: Beatmap = source.parse().expect("source must parse");
    let reparsed: Beatmap = beatmap.unparse().parse().expect("unparsed text must parse");
    assert_eq!(reparsed, beatmap);
}
