use std::fmt;

/// Decoded `profile-level-id` fmtp parameter.
///
/// Three bytes written as six hex digits: `profile_idc`, `profile-iop`
/// (constraint_set flags) and `level_idc`.
///
/// * 42 00 1f - 4200=baseline (B)              1f=level 3.1
/// * 42 e0 1f - 42e0=constrained baseline (CB) 1f=level 3.1
/// * 4d 00 1f - 4d00=main (M)                  1f=level 3.1
/// * 64 00 1f - 6400=high (H)                  1f=level 3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileLevelId {
    profile_idc: u8,
    profile_iop: u8,
    level_idc: u8,
}

/// Named H.264 profiles, RFC 6184 section 8.1 table 5.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum H264Profile {
    Baseline,
    ConstrainedBaseline,
    Main,
    Extended,
    High,
    High10,
    High422,
    High444Predictive,
    High10Intra,
    High422Intra,
    High444Intra,
    CAVLC444Intra,
}

const CONSTRAINT_SET3_FLAG: u8 = 0x10;

// (profile, profile_idc, iop mask, iop value). First match wins, so the
// constrained variants go before their unconstrained counterparts.
#[rustfmt::skip]
const PROFILES: &[(H264Profile, u8, u8, u8)] = &[
    (H264Profile::ConstrainedBaseline, 0x42, 0b0100_1111, 0b0100_0000),
    (H264Profile::ConstrainedBaseline, 0x4d, 0b1000_1111, 0b1000_0000),
    (H264Profile::ConstrainedBaseline, 0x58, 0b1100_1111, 0b1100_0000),
    (H264Profile::Baseline,            0x42, 0b0100_1111, 0b0000_0000),
    (H264Profile::Baseline,            0x58, 0b1100_1111, 0b1000_0000),
    (H264Profile::Main,                0x4d, 0b1010_1111, 0b0000_0000),
    (H264Profile::Extended,            0x58, 0b1100_1111, 0b0000_0000),
    (H264Profile::High,                0x64, 0b1111_1111, 0b0000_0000),
    (H264Profile::High10,              0x6e, 0b1111_1111, 0b0000_0000),
    (H264Profile::High422,             0x7a, 0b1111_1111, 0b0000_0000),
    (H264Profile::High444Predictive,   0xf4, 0b1111_1111, 0b0000_0000),
    (H264Profile::High10Intra,         0x6e, 0b1111_1111, 0b0001_0000),
    (H264Profile::High422Intra,        0x7a, 0b1111_1111, 0b0001_0000),
    (H264Profile::High444Intra,        0xf4, 0b1111_1111, 0b0001_0000),
    (H264Profile::CAVLC444Intra,       0x2c, 0b1111_1111, 0b0001_0000),
];

impl ProfileLevelId {
    /// Parse from the fmtp value. Must be exactly six hex digits.
    pub fn parse(v: &str) -> Option<Self> {
        if v.len() != 6 || !v.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let n = u32::from_str_radix(v, 16).ok()?;
        let [_, profile_idc, profile_iop, level_idc] = n.to_be_bytes();
        Some(ProfileLevelId {
            profile_idc,
            profile_iop,
            level_idc,
        })
    }

    /// The `profile_idc` byte.
    pub fn profile_idc(&self) -> u8 {
        self.profile_idc
    }

    /// The `profile-iop` byte, constraint_set0..5 flags in the high bits.
    pub fn profile_iop(&self) -> u8 {
        self.profile_iop
    }

    /// The `level_idc` byte. Ten times the level number, i.e. 31 for 3.1.
    pub fn level_idc(&self) -> u8 {
        self.level_idc
    }

    /// Level 1b is signalled as level_idc 11 with constraint_set3 for the
    /// Baseline, Main and Extended profiles.
    pub fn is_level_1b(&self) -> bool {
        matches!(self.profile_idc, 0x42 | 0x4d | 0x58)
            && self.level_idc == 11
            && self.profile_iop & CONSTRAINT_SET3_FLAG != 0
    }

    /// The named profile, if the idc/iop combination is a known one.
    pub fn profile(&self) -> Option<H264Profile> {
        PROFILES
            .iter()
            .find(|(_, idc, mask, value)| {
                *idc == self.profile_idc && self.profile_iop & mask == *value
            })
            .map(|(profile, ..)| *profile)
    }
}

impl fmt::Display for ProfileLevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}",
            self.profile_idc, self.profile_iop, self.level_idc
        )
    }
}
