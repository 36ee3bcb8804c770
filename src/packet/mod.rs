//! RTP payload handling for H.264, RFC 6184.

use std::fmt;

mod buffer;
pub(crate) use buffer::NalBuffer;

mod error;
pub use error::PacketError;

mod fua;
pub(crate) use fua::{FuReassembler, Reassembly};

mod h264;
pub(crate) use h264::H264Depacketizer;
pub use h264::NalKind;
pub(crate) use h264::{ANNEXB_NALUSTART_CODE, IDR_NALU_TYPE, PPS_NALU_TYPE, SPS_NALU_TYPE};
pub(crate) use h264::{FUA_HEADER_SIZE, FU_END_BITMASK, FU_START_BITMASK};
pub(crate) use h264::{NALU_F_NRI_BITMASK, NALU_TYPE_BITMASK};

mod h264_profile;
pub use h264_profile::{H264Profile, ProfileLevelId};

/// One complete NAL unit in Annex-B form, start code included.
///
/// Several of these make up an access unit (coded picture). They all carry the
/// same RTP timestamp.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessUnit {
    /// RTP timestamp shared by all packets the unit was carried in.
    pub timestamp: u32,
    /// NAL unit type, the low 5 bits of the NAL header.
    pub nal_type: u8,
    /// `00 00 00 01` followed by the NAL header and payload.
    ///
    /// With [`ParameterSetMode::InBand`][crate::ParameterSetMode::InBand] the
    /// first unit of a session is preceded by the parameter sets.
    pub data: Vec<u8>,
}

impl AccessUnit {
    /// Tests if this unit is an IDR slice, i.e. decoding can start here.
    pub fn is_keyframe(&self) -> bool {
        self.nal_type == IDR_NALU_TYPE
    }
}

impl fmt::Debug for AccessUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessUnit")
            .field("timestamp", &self.timestamp)
            .field("nal_type", &self.nal_type)
            .field("len", &self.data.len())
            .finish()
    }
}
