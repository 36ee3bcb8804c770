//! Negotiated format parameters and out-of-band parameter sets.

mod format_params;
mod sprop;

pub use format_params::{AttributeLookup, FormatParams};
pub use sprop::{ParameterSets, MAX_PARAMETER_SET_SIZE};

/// fmtp key for the H.264 profile and level.
pub const PROFILE_LEVEL_ID: &str = "profile-level-id";

/// fmtp key for the packetization mode.
pub const PACKETIZATION_MODE: &str = "packetization-mode";

/// fmtp key for the base64 encoded SPS/PPS.
pub const SPROP_PARAMETER_SETS: &str = "sprop-parameter-sets";
