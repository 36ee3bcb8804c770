use std::error::Error;
use std::fmt;

/// Errors arising in depacketization of a single RTP payload.
///
/// All of these are recoverable. The offending packet is dropped, any partially
/// reassembled NAL unit is discarded and the depacketizer can be fed the next packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Payload shorter than the minimum required for its packet type.
    ShortPacket {
        /// Length of the payload.
        len: usize,
        /// Minimum length required.
        min: usize,
    },
    /// A FU-A continuation or end fragment arrived while no fragmented unit was open.
    MissingFragmentStart,
    /// A FU-A fragment does not share the RTP timestamp of the unit being reassembled.
    TimestampMismatch {
        /// Timestamp of the open unit.
        expected: u32,
        /// Timestamp of the offending fragment.
        actual: u32,
    },
    /// FU header is inconsistent (start and end both set, or NAL type changed mid unit).
    InvalidFuHeader(u8),
    /// The reassembled unit grew past the configured maximum.
    UnitTooLarge {
        /// Size the unit would have had.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::ShortPacket { len, min } => {
                write!(f, "Packet is too short: {} < {}", len, min)
            }
            PacketError::MissingFragmentStart => {
                write!(f, "H264 FU-A fragment without preceding start fragment")
            }
            PacketError::TimestampMismatch { expected, actual } => write!(
                f,
                "H264 FU-A fragment timestamp {} does not match open unit {}",
                actual, expected
            ),
            PacketError::InvalidFuHeader(b) => write!(f, "H264 invalid FU header: {:08b}", b),
            PacketError::UnitTooLarge { size, max } => {
                write!(f, "H264 NAL unit too large: {} > {}", size, max)
            }
        }
    }
}

impl Error for PacketError {}
