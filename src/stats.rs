//! Depacketizer counters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters for one [`Depacketizer`][crate::Depacketizer] session.
///
/// Every recoverable condition that is logged is also counted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepacketizerStats {
    /// RTP packets handed to the depacketizer.
    pub packets: u64,
    /// Completed NAL units.
    pub units: u64,
    /// Annex-B bytes handed out in completed units, start codes and in-band
    /// parameter sets included.
    pub bytes_out: u64,
    /// Packets rejected as malformed.
    pub malformed: u64,
    /// Packets of a NAL type that is not handled (STAP, MTAP, FU-B, undefined).
    pub unsupported: u64,
    /// Partial units abandoned because a new unit started before the end fragment.
    pub desyncs: u64,
    /// Bytes of partial units that were thrown away.
    pub discarded_bytes: u64,
    /// Sequence number gaps observed inside a fragmented unit.
    pub seq_gaps: u64,
    /// Failed attempts to grow the accumulation buffer.
    pub allocation_failures: u64,
}

impl DepacketizerStats {
    /// Packets that did not contribute to a unit.
    pub fn dropped(&self) -> u64 {
        self.malformed + self.unsupported + self.allocation_failures
    }
}

impl fmt::Display for DepacketizerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packets={} units={} bytes_out={} malformed={} unsupported={} \
            desyncs={} discarded_bytes={} seq_gaps={} allocation_failures={}",
            self.packets,
            self.units,
            self.bytes_out,
            self.malformed,
            self.unsupported,
            self.desyncs,
            self.discarded_bytes,
            self.seq_gaps,
            self.allocation_failures
        )
    }
}
