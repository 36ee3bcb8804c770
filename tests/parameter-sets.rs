//! Out-of-band SPS/PPS from `sprop-parameter-sets`.

use std::collections::HashMap;

use h264_depack::{Depacketizer, DepacketizerConfig, FormatParams, Packet, PacketQueue};
use h264_depack::{ParameterSetMode, ParameterSets, ParseOutput};

mod common;
use common::{annexb, init_log, PPS, SPROP, SPS};

fn fmtp(sprop: &str) -> FormatParams {
    FormatParams::new()
        .set("packetization-mode", "1")
        .set("sprop-parameter-sets", sprop)
}

fn idr_and_slice() -> PacketQueue {
    [
        Packet::new(vec![0x65_u8, 0x88, 0x84], 0),
        Packet::new(vec![0x41_u8, 0x9a, 0x02], 3000),
    ]
    .into_iter()
    .collect()
}

#[test]
fn decodes_sps_and_pps() {
    init_log();

    let depack = Depacketizer::new(96.into(), &fmtp(SPROP)).unwrap();
    let sets = depack.parameter_sets();

    assert_eq!(sets.as_bytes(), annexb(&[SPS, PPS]));
    assert_eq!(sets.sps(), Some(SPS));
    assert_eq!(sets.pps(), Some(PPS));
}

#[test]
fn malformed_middle_token_is_skipped() {
    init_log();

    let depack = Depacketizer::new(96.into(), &fmtp("Z0IAH5WoFAFuQA==,!!!,aM48gA==")).unwrap();
    let sets = depack.parameter_sets();

    assert_eq!(sets.as_bytes(), annexb(&[SPS, PPS]));
    assert_eq!(sets.skipped(), 1);
}

#[test]
fn no_valid_tokens_is_not_an_error() {
    init_log();

    let mut depack = Depacketizer::new(96.into(), &fmtp("!!!,???")).unwrap();
    assert!(depack.parameter_sets().is_empty());

    let mut q = idr_and_slice();
    let out = depack.parse(&mut q).unwrap();
    assert_eq!(out.configuration(), None);
    assert!(!depack.is_configuration_emitted());
}

#[test]
fn out_of_band_emitted_once() {
    init_log();

    let mut depack = Depacketizer::new(96.into(), &fmtp(SPROP)).unwrap();
    let mut q = idr_and_slice();

    match depack.parse(&mut q).unwrap() {
        ParseOutput::Unit {
            unit,
            configuration,
        } => {
            assert_eq!(configuration, Some(annexb(&[SPS, PPS])));
            // Parameter sets are not mixed into the unit.
            assert_eq!(unit.data, &[0, 0, 0, 1, 0x65, 0x88, 0x84]);
        }
        o => panic!("Unexpected {:?}", o),
    }

    let out = depack.parse(&mut q).unwrap();
    assert_eq!(out.configuration(), None);
    assert!(depack.is_configuration_emitted());
}

#[test]
fn in_band_prefixed_once() {
    init_log();

    let mut depack = DepacketizerConfig::new()
        .set_parameter_set_mode(ParameterSetMode::InBand)
        .build(96.into(), &fmtp(SPROP))
        .unwrap();
    let mut q = idr_and_slice();

    let out = depack.parse(&mut q).unwrap();
    assert_eq!(out.configuration(), None);
    assert_eq!(
        out.unit().unwrap().data,
        annexb(&[SPS, PPS, &[0x65, 0x88, 0x84]])
    );

    let out = depack.parse(&mut q).unwrap();
    assert_eq!(out.unit().unwrap().data, annexb(&[&[0x41, 0x9a, 0x02]]));

    // Parameter sets count towards the bytes handed out.
    let sets_len = annexb(&[SPS, PPS]).len() as u64;
    assert_eq!(depack.stats().bytes_out, sets_len + 7 + 7);
}

#[test]
fn out_of_band_not_in_bytes_out() {
    init_log();

    let mut depack = Depacketizer::new(96.into(), &fmtp(SPROP)).unwrap();
    let mut q = idr_and_slice();

    depack.parse(&mut q).unwrap();
    depack.parse(&mut q).unwrap();
    assert_eq!(depack.stats().bytes_out, 7 + 7);
}

#[test]
fn emission_is_per_session() {
    init_log();

    let mut a = Depacketizer::new(96.into(), &fmtp(SPROP)).unwrap();
    let mut b = Depacketizer::new(97.into(), &fmtp(SPROP)).unwrap();

    let mut qa = idr_and_slice();
    let mut qb = idr_and_slice();

    assert!(a.parse(&mut qa).unwrap().configuration().is_some());
    assert!(a.parse(&mut qa).unwrap().configuration().is_none());

    // Another session hands out its own parameter sets.
    assert!(!b.is_configuration_emitted());
    assert!(b.parse(&mut qb).unwrap().configuration().is_some());
}

#[test]
fn attributes_from_map() {
    init_log();

    let mut attrs = HashMap::new();
    attrs.insert("sprop-parameter-sets".to_string(), SPROP.to_string());

    let depack = Depacketizer::new(96.into(), &attrs).unwrap();
    assert_eq!(depack.packetization_mode(), 0);
    assert_eq!(
        depack.parameter_sets(),
        &ParameterSets::parse(SPROP).unwrap()
    );
}

#[test]
fn parameter_sets_from_camera() {
    init_log();

    let fmtp = FormatParams::parse_line(
        "a=fmtp:96 packetization-mode=1;profile-level-id=4d001e;sprop-parameter-sets=Z00AHpWoLQ9puAgICBAAAAAB,aO48gAAAAAE=",
    );
    let depack = Depacketizer::new(96.into(), &fmtp).unwrap();
    let sets = depack.parameter_sets();

    let nals: Vec<&[u8]> = sets.nal_units().collect();
    assert_eq!(
        nals,
        vec![
            &b"\x67\x4d\x00\x1e\x95\xa8\x2d\x0f\x69\xb8\x08\x08\x08\x10"[..],
            &b"\x68\xee\x3c\x80"[..],
        ]
    );
}
