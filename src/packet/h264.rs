use std::collections::TryReserveError;

use super::{AccessUnit, FuReassembler, NalBuffer, PacketError, Reassembly};
use crate::stats::DepacketizerStats;
use crate::DepackError;

pub const STAPA_NALU_TYPE: u8 = 24;
pub const STAPB_NALU_TYPE: u8 = 25;
pub const MTAP16_NALU_TYPE: u8 = 26;
pub const MTAP24_NALU_TYPE: u8 = 27;
pub const FUA_NALU_TYPE: u8 = 28;
pub const FUB_NALU_TYPE: u8 = 29;
pub const IDR_NALU_TYPE: u8 = 5;
pub const SPS_NALU_TYPE: u8 = 7;
pub const PPS_NALU_TYPE: u8 = 8;

pub const FUA_HEADER_SIZE: usize = 2;

/// Shortest RTP payload the dispatcher accepts.
pub const MIN_PAYLOAD_SIZE: usize = 3;

pub const NALU_TYPE_BITMASK: u8 = 0x1F;
pub const NALU_F_NRI_BITMASK: u8 = 0xE0;
pub const FU_START_BITMASK: u8 = 0x80;
pub const FU_END_BITMASK: u8 = 0x40;

pub static ANNEXB_NALUSTART_CODE: &[u8] = &[0x00, 0x00, 0x00, 0x01];

/// Classification of an RTP payload by the type field of its first byte.
///
/// See <https://tools.ietf.org/html/rfc6184#section-5.4>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalKind {
    /// Single NAL unit packet, types 1-23.
    Single(u8),
    /// Fragmentation unit A, type 28.
    FuA,
    /// STAP-A, STAP-B, MTAP16, MTAP24 or FU-B. Valid, but not handled.
    Unsupported(u8),
    /// Types 0, 30 and 31.
    Undefined(u8),
}

impl NalKind {
    /// Classify from the first payload byte.
    pub fn classify(b0: u8) -> Self {
        match b0 & NALU_TYPE_BITMASK {
            t @ 1..=23 => NalKind::Single(t),
            FUA_NALU_TYPE => NalKind::FuA,
            t @ (STAPA_NALU_TYPE | STAPB_NALU_TYPE | MTAP16_NALU_TYPE | MTAP24_NALU_TYPE
            | FUB_NALU_TYPE) => NalKind::Unsupported(t),
            t => NalKind::Undefined(t),
        }
    }
}

/// Depacketizes H264 RTP payloads into Annex-B NAL units.
#[derive(Debug)]
pub(crate) struct H264Depacketizer {
    buf: NalBuffer,
    fua: FuReassembler,
    max_unit_size: usize,
    stats: DepacketizerStats,
}

impl H264Depacketizer {
    pub fn new(initial_capacity: usize, max_unit_size: usize) -> Result<Self, TryReserveError> {
        Ok(H264Depacketizer {
            buf: NalBuffer::with_capacity(initial_capacity)?,
            fua: FuReassembler::new(max_unit_size),
            max_unit_size,
            stats: DepacketizerStats::default(),
        })
    }

    pub fn stats(&self) -> &DepacketizerStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut DepacketizerStats {
        &mut self.stats
    }

    /// Bytes currently held for an unfinished unit.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Handle one RTP payload.
    ///
    /// Returns `Ok(None)` while a fragmented unit is still open.
    pub fn depacketize(
        &mut self,
        payload: &[u8],
        timestamp: u32,
        seq_no: Option<u16>,
    ) -> Result<Option<AccessUnit>, DepackError> {
        self.stats.packets += 1;

        let result = self.do_depacketize(payload, timestamp, seq_no);

        match &result {
            Ok(Some(unit)) => {
                self.stats.units += 1;
                self.stats.bytes_out += unit.data.len() as u64;
            }
            Ok(None) => {}
            Err(DepackError::Packet(_)) => self.stats.malformed += 1,
            Err(DepackError::UnsupportedPacketType(_)) => self.stats.unsupported += 1,
            Err(DepackError::Allocation(_)) => self.stats.allocation_failures += 1,
            Err(DepackError::Config(_)) => {}
        }

        result
    }

    fn do_depacketize(
        &mut self,
        payload: &[u8],
        timestamp: u32,
        seq_no: Option<u16>,
    ) -> Result<Option<AccessUnit>, DepackError> {
        if payload.len() < MIN_PAYLOAD_SIZE {
            return Err(PacketError::ShortPacket {
                len: payload.len(),
                min: MIN_PAYLOAD_SIZE,
            }
            .into());
        }

        match NalKind::classify(payload[0]) {
            NalKind::Single(nal_type) => {
                if !self.buf.is_empty() || self.fua.is_accumulating() {
                    warn!(
                        "Single NAL unit type {} at {} while {} bytes pending from {:?}, discarding",
                        nal_type,
                        timestamp,
                        self.buf.len(),
                        self.buf.pending_timestamp()
                    );
                    self.stats.desyncs += 1;
                    self.fua.abort(&mut self.buf, &mut self.stats);
                }

                let size = ANNEXB_NALUSTART_CODE.len() + payload.len();
                if size > self.max_unit_size {
                    return Err(PacketError::UnitTooLarge {
                        size,
                        max: self.max_unit_size,
                    }
                    .into());
                }
                self.buf.ensure_capacity(size)?;
                self.buf.emit_start_code_if_empty();
                self.buf.append(payload);

                trace!("Single NAL unit type {} at {}", nal_type, timestamp);
                Ok(Some(self.finish(timestamp, nal_type)?))
            }
            NalKind::FuA => {
                match self
                    .fua
                    .push(&mut self.buf, payload, timestamp, seq_no, &mut self.stats)?
                {
                    Reassembly::NeedMore => Ok(None),
                    Reassembly::Complete => {
                        let header = self.buf.as_slice()[ANNEXB_NALUSTART_CODE.len()];
                        Ok(Some(self.finish(timestamp, header & NALU_TYPE_BITMASK)?))
                    }
                }
            }
            NalKind::Unsupported(t) | NalKind::Undefined(t) => {
                Err(DepackError::UnsupportedPacketType(t))
            }
        }
    }

    fn finish(&mut self, timestamp: u32, nal_type: u8) -> Result<AccessUnit, TryReserveError> {
        let len = self.buf.len();
        let data = self.buf.take().map_err(|e| {
            warn!("Failed to hand out {} byte unit at {}: {}", len, timestamp, e);
            self.stats.discarded_bytes += len as u64;
            e
        })?;
        Ok(AccessUnit {
            timestamp,
            nal_type,
            data,
        })
    }

    /// Drop any partial unit and free the accumulation buffer.
    pub fn release(&mut self) {
        trace!("Release buffer of {} bytes", self.buf.capacity());
        self.fua.abort(&mut self.buf, &mut self.stats);
        self.buf.release();
    }
}
