use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::AttributeLookup;
use crate::{DepackError, Depacketizer, Pt};

/// How the out-of-band parameter sets reach the caller.
///
/// Either way they are surfaced once per session, and never if
/// `sprop-parameter-sets` yielded nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterSetMode {
    /// Returned as `configuration` alongside the first parse output.
    #[default]
    OutOfBand,
    /// Written in front of the data of the first completed unit.
    InBand,
}

/// Configuration for a [`Depacketizer`].
///
/// ```
/// use h264_depack::{DepacketizerConfig, FormatParams, ParameterSetMode};
///
/// let fmtp = FormatParams::parse_line("packetization-mode=1;sprop-parameter-sets=Z0IAH5WoFAFuQA==,aM48gA==");
///
/// let depack = DepacketizerConfig::new()
///     .set_parameter_set_mode(ParameterSetMode::InBand)
///     .build(96.into(), &fmtp)
///     .unwrap();
///
/// assert_eq!(depack.packetization_mode(), 1);
/// ```
///
/// Configs implement [`Clone`] to help create one session per payload type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepacketizerConfig {
    parameter_set_mode: ParameterSetMode,
    initial_capacity: usize,
    max_unit_size: usize,
}

impl DepacketizerConfig {
    /// Creates a new default config.
    pub fn new() -> Self {
        DepacketizerConfig::default()
    }

    /// How parameter sets from `sprop-parameter-sets` are handed out.
    ///
    /// Defaults to [`ParameterSetMode::OutOfBand`].
    pub fn set_parameter_set_mode(mut self, mode: ParameterSetMode) -> Self {
        self.parameter_set_mode = mode;
        self
    }

    /// Returns the parameter set mode.
    pub fn parameter_set_mode(&self) -> ParameterSetMode {
        self.parameter_set_mode
    }

    /// Bytes reserved for the accumulation buffer up front.
    ///
    /// The buffer grows as needed. Default: 64KiB
    pub fn set_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Returns the initial buffer capacity.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Largest NAL unit, start code included, that will be reassembled.
    ///
    /// Larger units are dropped with [`PacketError::UnitTooLarge`][crate::error::PacketError::UnitTooLarge].
    ///
    /// Default: 8MiB
    pub fn set_max_unit_size(mut self, size: usize) -> Self {
        self.max_unit_size = size;
        self
    }

    /// Returns the max unit size.
    ///
    /// ```
    /// # use h264_depack::DepacketizerConfig;
    /// let config = DepacketizerConfig::new();
    ///
    /// assert_eq!(config.max_unit_size(), 8 * 1024 * 1024);
    /// ```
    pub fn max_unit_size(&self) -> usize {
        self.max_unit_size
    }

    /// Create a [`Depacketizer`] for `pt` from the negotiated format parameters.
    ///
    /// Fails on an unsupported `packetization-mode` or if the buffers can't be
    /// allocated.
    pub fn build<A>(self, pt: Pt, attrs: &A) -> Result<Depacketizer, DepackError>
    where
        A: AttributeLookup + ?Sized,
    {
        Depacketizer::new_from_config(self, pt, attrs)
    }
}

impl Default for DepacketizerConfig {
    fn default() -> Self {
        Self {
            parameter_set_mode: ParameterSetMode::OutOfBand,
            initial_capacity: 64 * 1024,
            max_unit_size: 8 * 1024 * 1024,
        }
    }
}

/// Errors in the negotiated format parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `packetization-mode` other than 0 or 1.
    UnsupportedPacketizationMode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedPacketizationMode(v) => {
                write!(f, "Unsupported packetization-mode: {}", v)
            }
        }
    }
}

impl Error for ConfigError {}
