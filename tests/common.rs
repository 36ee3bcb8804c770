#![allow(unused)]
use std::sync::Once;

use h264_depack::{Packet, PacketQueue};

pub const NALU_TYPE_BITMASK: u8 = 0x1f;
pub const NALU_REF_IDC_BITMASK: u8 = 0x60;
pub const FUA_NALU_TYPE: u8 = 28;
pub const FUA_HEADER_SIZE: usize = 2;

/// SPS/PPS as found in an fmtp line, and the same decoded.
pub const SPROP: &str = "Z0IAH5WoFAFuQA==,aM48gA==";
pub const SPS: &[u8] = &[0x67, 0x42, 0x00, 0x1f, 0x95, 0xa8, 0x14, 0x01, 0x6e, 0x40];
pub const PPS: &[u8] = &[0x68, 0xce, 0x3c, 0x80];

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

/// Prefix each NAL unit with a start code.
pub fn annexb(nals: &[&[u8]]) -> Vec<u8> {
    let mut v = vec![];
    for n in nals {
        v.extend_from_slice(&[0, 0, 0, 1]);
        v.extend_from_slice(n);
    }
    v
}

/// RTP payloads for one NAL unit. Single NAL unit packet if it fits in `mtu`,
/// otherwise FU-A fragments.
pub fn packetize(nalu: &[u8], mtu: usize) -> Vec<Vec<u8>> {
    if nalu.len() <= mtu {
        return vec![nalu.to_vec()];
    }

    let nalu_type = nalu[0] & NALU_TYPE_BITMASK;
    let nalu_ref_idc = nalu[0] & NALU_REF_IDC_BITMASK;
    let max_fragment_size = mtu - FUA_HEADER_SIZE;

    let data = &nalu[1..];
    let chunks: Vec<&[u8]> = data.chunks(max_fragment_size).collect();
    let last = chunks.len() - 1;

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut out = Vec::with_capacity(FUA_HEADER_SIZE + chunk.len());
            out.push(FUA_NALU_TYPE | nalu_ref_idc);

            let mut b1 = nalu_type;
            if i == 0 {
                b1 |= 1 << 7;
            } else if i == last {
                b1 |= 1 << 6;
            }
            out.push(b1);

            out.extend_from_slice(chunk);
            out
        })
        .collect()
}

/// Queue the payloads with consecutive sequence numbers starting at `seq_no`.
pub fn queue(payloads: Vec<Vec<u8>>, timestamp: u32, seq_no: u16) -> PacketQueue {
    payloads
        .into_iter()
        .enumerate()
        .map(|(i, p)| Packet::new(p, timestamp).with_seq_no(seq_no.wrapping_add(i as u16)))
        .collect()
}
