use super::buffer::NalBuffer;
use super::{PacketError, ANNEXB_NALUSTART_CODE};
use super::{FUA_HEADER_SIZE, FU_END_BITMASK, FU_START_BITMASK};
use super::{NALU_F_NRI_BITMASK, NALU_TYPE_BITMASK};
use crate::stats::DepacketizerStats;
use crate::DepackError;

/// Outcome of feeding one fragment to the [`FuReassembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reassembly {
    /// The unit is still open, more fragments are needed.
    NeedMore,
    /// The end fragment arrived. The buffer holds the complete unit.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FuState {
    Idle,
    Accumulating {
        timestamp: u32,
        /// Reconstructed NAL header, F|NRI from the indicator, type from the FU header.
        header: u8,
    },
}

/// FU-A state machine, RFC 6184 section 5.8.
///
/// Fragments belong together when they share one RTP timestamp. Sequence
/// numbers, when the source has them, are only used to report gaps.
#[derive(Debug)]
pub(crate) struct FuReassembler {
    state: FuState,
    max_unit_size: usize,
    last_seq_no: Option<u16>,
}

impl FuReassembler {
    pub fn new(max_unit_size: usize) -> Self {
        FuReassembler {
            state: FuState::Idle,
            max_unit_size,
            last_seq_no: None,
        }
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, FuState::Accumulating { .. })
    }

    /// Drop the open unit, if any.
    pub fn abort(&mut self, buf: &mut NalBuffer, stats: &mut DepacketizerStats) {
        let discarded = buf.reset();
        stats.discarded_bytes += discarded as u64;
        self.state = FuState::Idle;
        self.last_seq_no = None;
    }

    pub fn push(
        &mut self,
        buf: &mut NalBuffer,
        payload: &[u8],
        timestamp: u32,
        seq_no: Option<u16>,
        stats: &mut DepacketizerStats,
    ) -> Result<Reassembly, DepackError> {
        if payload.len() < FUA_HEADER_SIZE {
            return Err(PacketError::ShortPacket {
                len: payload.len(),
                min: FUA_HEADER_SIZE,
            }
            .into());
        }

        // FU indicator        FU header
        // +---------------+   +---------------+
        // |0|1|2|3|4|5|6|7|   |0|1|2|3|4|5|6|7|
        // +-+-+-+-+-+-+-+-+   +-+-+-+-+-+-+-+-+
        // |F|NRI|  Type   |   |S|E|R|  Type   |
        // +---------------+   +---------------+
        let indicator = payload[0];
        let fu_header = payload[1];
        let start = fu_header & FU_START_BITMASK != 0;
        let end = fu_header & FU_END_BITMASK != 0;
        let header = (indicator & NALU_F_NRI_BITMASK) | (fu_header & NALU_TYPE_BITMASK);
        let fragment = &payload[FUA_HEADER_SIZE..];

        if start && end {
            self.abort(buf, stats);
            return Err(PacketError::InvalidFuHeader(fu_header).into());
        }

        if start {
            if let FuState::Accumulating { timestamp: open, .. } = self.state {
                warn!(
                    "FU-A start at {} while unit at {} is open, discarding {} bytes",
                    timestamp,
                    open,
                    buf.len()
                );
                stats.desyncs += 1;
                self.abort(buf, stats);
            }

            let size = ANNEXB_NALUSTART_CODE.len() + 1 + fragment.len();
            if size > self.max_unit_size {
                return Err(PacketError::UnitTooLarge {
                    size,
                    max: self.max_unit_size,
                }
                .into());
            }
            buf.ensure_capacity(size)?;
            buf.emit_start_code_if_empty();
            buf.push(header);
            buf.append(fragment);
            buf.set_pending_timestamp(timestamp);

            trace!("FU-A start {:02x} at {}", header, timestamp);
            self.state = FuState::Accumulating { timestamp, header };
            self.last_seq_no = seq_no;

            return Ok(Reassembly::NeedMore);
        }

        let FuState::Accumulating {
            timestamp: open_timestamp,
            header: open_header,
        } = self.state
        else {
            return Err(PacketError::MissingFragmentStart.into());
        };

        if open_timestamp != timestamp {
            self.abort(buf, stats);
            return Err(PacketError::TimestampMismatch {
                expected: open_timestamp,
                actual: timestamp,
            }
            .into());
        }

        if open_header & NALU_TYPE_BITMASK != header & NALU_TYPE_BITMASK {
            self.abort(buf, stats);
            return Err(PacketError::InvalidFuHeader(fu_header).into());
        }

        if let (Some(last), Some(seq_no)) = (self.last_seq_no, seq_no) {
            if seq_no != last.wrapping_add(1) {
                warn!(
                    "FU-A sequence gap in unit at {}: {} -> {}",
                    timestamp, last, seq_no
                );
                stats.seq_gaps += 1;
            }
        }
        self.last_seq_no = seq_no;

        let size = buf.len() + fragment.len();
        if size > self.max_unit_size {
            self.abort(buf, stats);
            return Err(PacketError::UnitTooLarge {
                size,
                max: self.max_unit_size,
            }
            .into());
        }
        if let Err(e) = buf.ensure_capacity(fragment.len()) {
            // The fragment is lost, the unit can't be completed.
            self.abort(buf, stats);
            return Err(e.into());
        }
        buf.append(fragment);

        if end {
            trace!("FU-A end at {}, {} bytes", timestamp, buf.len());
            self.state = FuState::Idle;
            self.last_seq_no = None;
            Ok(Reassembly::Complete)
        } else {
            Ok(Reassembly::NeedMore)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn setup() -> (FuReassembler, NalBuffer, DepacketizerStats) {
        (
            FuReassembler::new(1024),
            NalBuffer::with_capacity(64).unwrap(),
            DepacketizerStats::default(),
        )
    }

    #[test]
    fn three_fragments() {
        let (mut fu, mut buf, mut stats) = setup();

        let r = fu.push(&mut buf, &[0x7c, 0x85, 1, 2], 10, None, &mut stats);
        assert_eq!(r, Ok(Reassembly::NeedMore));
        assert!(fu.is_accumulating());
        assert_eq!(buf.pending_timestamp(), Some(10));

        let r = fu.push(&mut buf, &[0x7c, 0x05, 3, 4], 10, None, &mut stats);
        assert_eq!(r, Ok(Reassembly::NeedMore));

        let r = fu.push(&mut buf, &[0x7c, 0x45, 5], 10, None, &mut stats);
        assert_eq!(r, Ok(Reassembly::Complete));
        assert!(!fu.is_accumulating());

        // F|NRI = 0x60 from 0x7c, type 5 from the FU header.
        assert_eq!(buf.as_slice(), &[0, 0, 0, 1, 0x65, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn short_fragment() {
        let (mut fu, mut buf, mut stats) = setup();
        let r = fu.push(&mut buf, &[0x7c], 0, None, &mut stats);
        assert_eq!(
            r,
            Err(DepackError::Packet(PacketError::ShortPacket { len: 1, min: 2 }))
        );
    }

    #[test]
    fn end_without_start() {
        let (mut fu, mut buf, mut stats) = setup();
        let r = fu.push(&mut buf, &[0x7c, 0x45, 1], 0, None, &mut stats);
        assert_eq!(
            r,
            Err(DepackError::Packet(PacketError::MissingFragmentStart))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn timestamp_mismatch_discards() {
        let (mut fu, mut buf, mut stats) = setup();
        fu.push(&mut buf, &[0x7c, 0x81, 1, 2], 100, None, &mut stats)
            .unwrap();

        let r = fu.push(&mut buf, &[0x7c, 0x41, 3], 200, None, &mut stats);
        assert_eq!(
            r,
            Err(DepackError::Packet(PacketError::TimestampMismatch {
                expected: 100,
                actual: 200
            }))
        );
        assert!(buf.is_empty());
        assert!(!fu.is_accumulating());
        assert_eq!(stats.discarded_bytes, 7);
    }

    #[test]
    fn restart_discards_open_unit() {
        let (mut fu, mut buf, mut stats) = setup();
        fu.push(&mut buf, &[0x7c, 0x81, 0xaa, 0xaa], 1, None, &mut stats)
            .unwrap();
        fu.push(&mut buf, &[0x7c, 0x81, 0xbb], 2, None, &mut stats)
            .unwrap();
        let r = fu.push(&mut buf, &[0x7c, 0x41, 0xcc], 2, None, &mut stats);

        assert_eq!(r, Ok(Reassembly::Complete));
        assert_eq!(buf.as_slice(), &[0, 0, 0, 1, 0x61, 0xbb, 0xcc]);
        assert_eq!(stats.desyncs, 1);
    }

    #[test]
    fn start_and_end_is_invalid() {
        let (mut fu, mut buf, mut stats) = setup();
        let r = fu.push(&mut buf, &[0x7c, 0xc5, 1], 0, None, &mut stats);
        assert_eq!(r, Err(DepackError::Packet(PacketError::InvalidFuHeader(0xc5))));
        assert!(buf.is_empty());
    }

    #[test]
    fn type_change_mid_unit() {
        let (mut fu, mut buf, mut stats) = setup();
        fu.push(&mut buf, &[0x7c, 0x85, 1], 0, None, &mut stats)
            .unwrap();
        let r = fu.push(&mut buf, &[0x7c, 0x41, 2], 0, None, &mut stats);
        assert_eq!(r, Err(DepackError::Packet(PacketError::InvalidFuHeader(0x41))));
        assert!(buf.is_empty());
    }

    #[test]
    fn sequence_gap_is_counted_not_rejected() {
        let (mut fu, mut buf, mut stats) = setup();
        fu.push(&mut buf, &[0x7c, 0x85, 1], 0, Some(65535), &mut stats)
            .unwrap();
        fu.push(&mut buf, &[0x7c, 0x05, 2], 0, Some(0), &mut stats)
            .unwrap();
        let r = fu.push(&mut buf, &[0x7c, 0x45, 3], 0, Some(2), &mut stats);
        assert_eq!(r, Ok(Reassembly::Complete));
        assert_eq!(stats.seq_gaps, 1);
        assert_eq!(buf.as_slice(), &[0, 0, 0, 1, 0x65, 1, 2, 3]);
    }

    #[test]
    fn unit_too_large() {
        let mut fu = FuReassembler::new(10);
        let mut buf = NalBuffer::with_capacity(16).unwrap();
        let mut stats = DepacketizerStats::default();

        fu.push(&mut buf, &[0x7c, 0x85, 1, 2], 0, None, &mut stats)
            .unwrap();
        let r = fu.push(&mut buf, &[0x7c, 0x45, 3, 4, 5, 6], 0, None, &mut stats);
        assert_eq!(
            r,
            Err(DepackError::Packet(PacketError::UnitTooLarge {
                size: 11,
                max: 10
            }))
        );
        assert!(buf.is_empty());
        assert!(!fu.is_accumulating());
    }
}
