use std::collections::TryReserveError;

use crate::format::{AttributeLookup, ParameterSets};
use crate::format::{PACKETIZATION_MODE, PROFILE_LEVEL_ID, SPROP_PARAMETER_SETS};
use crate::packet::{AccessUnit, H264Depacketizer, ProfileLevelId};
use crate::source::PacketSource;
use crate::stats::DepacketizerStats;
use crate::{ConfigError, DepackError, DepacketizerConfig, ParameterSetMode, Pt};

/// Result of one [`Depacketizer::parse`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutput {
    /// The packet source was empty.
    NoData,
    /// A packet was consumed, the current unit is not complete yet.
    NeedMore {
        /// Annex-B parameter sets, set once per session.
        configuration: Option<Vec<u8>>,
    },
    /// A packet was consumed and completed a unit.
    Unit {
        /// The completed unit, owned by the caller.
        unit: AccessUnit,
        /// Annex-B parameter sets, set once per session.
        configuration: Option<Vec<u8>>,
    },
}

impl ParseOutput {
    /// The completed unit, if any.
    pub fn unit(&self) -> Option<&AccessUnit> {
        match self {
            ParseOutput::Unit { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// The parameter sets, if this output carries them.
    pub fn configuration(&self) -> Option<&[u8]> {
        match self {
            ParseOutput::NoData => None,
            ParseOutput::NeedMore { configuration } | ParseOutput::Unit { configuration, .. } => {
                configuration.as_deref()
            }
        }
    }
}

/// A payload parser driven one packet at a time.
///
/// Object safe so a host can keep one boxed parser per payload type.
pub trait PayloadParser {
    /// Consume at most one packet from `source`.
    fn parse(&mut self, source: &mut dyn PacketSource) -> Result<ParseOutput, DepackError>;

    /// Free all buffers held by the parser.
    fn uninit(&mut self);
}

/// H.264 depacketizer for one payload type.
///
/// Created by [`DepacketizerConfig::build`] or [`Depacketizer::new`].
#[derive(Debug)]
pub struct Depacketizer {
    pt: Pt,
    config: DepacketizerConfig,
    depack: H264Depacketizer,
    parameter_sets: ParameterSets,
    profile_level_id: Option<ProfileLevelId>,
    packetization_mode: u8,
    /// Parameter sets have been handed out.
    configuration_emitted: bool,
}

impl Depacketizer {
    /// Create a depacketizer with the default [`DepacketizerConfig`].
    pub fn new<A>(pt: Pt, attrs: &A) -> Result<Self, DepackError>
    where
        A: AttributeLookup + ?Sized,
    {
        DepacketizerConfig::default().build(pt, attrs)
    }

    pub(crate) fn new_from_config<A>(
        config: DepacketizerConfig,
        pt: Pt,
        attrs: &A,
    ) -> Result<Self, DepackError>
    where
        A: AttributeLookup + ?Sized,
    {
        if !pt.is_dynamic() {
            debug!("H264 on static payload type {}", pt);
        }

        let packetization_mode = match attrs.attribute(PACKETIZATION_MODE).map(str::trim) {
            None => 0,
            Some("0") => 0,
            Some("1") => 1,
            Some(v) => {
                return Err(ConfigError::UnsupportedPacketizationMode(v.to_string()).into());
            }
        };

        let profile_level_id = attrs.attribute(PROFILE_LEVEL_ID).and_then(|v| {
            let p = ProfileLevelId::parse(v.trim());
            match &p {
                Some(p) => debug!(
                    "PT {} profile-level-id {} profile {:?} level_idc {}",
                    pt,
                    p,
                    p.profile(),
                    p.level_idc()
                ),
                None => warn!("PT {} ignoring invalid profile-level-id: {}", pt, v),
            }
            p
        });

        let parameter_sets = match attrs.attribute(SPROP_PARAMETER_SETS) {
            Some(v) => ParameterSets::parse(v)?,
            None => ParameterSets::default(),
        };

        let depack = H264Depacketizer::new(config.initial_capacity(), config.max_unit_size())?;

        debug!(
            "PT {} depacketizer packetization-mode {} parameter sets {:?}",
            pt, packetization_mode, parameter_sets
        );

        Ok(Depacketizer {
            pt,
            config,
            depack,
            parameter_sets,
            profile_level_id,
            packetization_mode,
            configuration_emitted: false,
        })
    }

    /// Handle the packet at the head of `source`, if there is one.
    ///
    /// The packet is always removed from `source`, also when it can't be
    /// handled. Errors other than [`DepackError::Config`] leave the session
    /// usable for the next packet.
    pub fn parse(&mut self, source: &mut dyn PacketSource) -> Result<ParseOutput, DepackError> {
        let result = match source.peek() {
            Some(packet) => {
                trace!(
                    "PT {} packet ts {} seq {:?} len {}",
                    self.pt,
                    packet.timestamp(),
                    packet.seq_no(),
                    packet.payload().len()
                );
                self.depack
                    .depacketize(packet.payload(), packet.timestamp(), packet.seq_no())
            }
            None => return Ok(ParseOutput::NoData),
        };

        source.remove();

        match result {
            Ok(None) => Ok(ParseOutput::NeedMore {
                configuration: self.configuration_out_of_band(),
            }),
            Ok(Some(mut unit)) => {
                let configuration = self.configuration_out_of_band();
                self.configuration_in_band(&mut unit);
                Ok(ParseOutput::Unit {
                    unit,
                    configuration,
                })
            }
            Err(e) => {
                match &e {
                    DepackError::UnsupportedPacketType(t) => {
                        debug!("PT {} drop unsupported NAL type {}", self.pt, t)
                    }
                    _ => warn!("PT {} drop packet: {}", self.pt, e),
                }
                Err(e)
            }
        }
    }

    fn configuration_out_of_band(&mut self) -> Option<Vec<u8>> {
        if self.config.parameter_set_mode() != ParameterSetMode::OutOfBand
            || !self.configuration_pending()
        {
            return None;
        }

        match copy_fallible(self.parameter_sets.as_bytes()) {
            Ok(v) => {
                self.configuration_emitted = true;
                Some(v)
            }
            Err(e) => {
                warn!("PT {} parameter sets not emitted: {}", self.pt, e);
                self.depack.stats_mut().allocation_failures += 1;
                None
            }
        }
    }

    fn configuration_in_band(&mut self, unit: &mut AccessUnit) {
        if self.config.parameter_set_mode() != ParameterSetMode::InBand
            || !self.configuration_pending()
        {
            return;
        }

        let sets = self.parameter_sets.as_bytes();
        let mut data = Vec::new();
        if let Err(e) = data.try_reserve_exact(sets.len() + unit.data.len()) {
            warn!("PT {} parameter sets not emitted: {}", self.pt, e);
            self.depack.stats_mut().allocation_failures += 1;
            return;
        }
        data.extend_from_slice(sets);
        data.extend_from_slice(&unit.data);

        unit.data = data;
        self.configuration_emitted = true;
        // The prefix is part of what the caller receives.
        self.depack.stats_mut().bytes_out += sets.len() as u64;
    }

    fn configuration_pending(&self) -> bool {
        !self.configuration_emitted && !self.parameter_sets.is_empty()
    }

    /// Free the accumulation buffer and the parameter sets.
    ///
    /// Any unfinished unit is lost. Calling this more than once is fine, and
    /// the session behaves as one without parameter sets afterwards.
    pub fn uninit(&mut self) {
        if self.depack.pending_len() > 0 {
            debug!(
                "PT {} uninit drops {} pending bytes",
                self.pt,
                self.depack.pending_len()
            );
        }
        self.depack.release();
        self.parameter_sets.release();
    }

    /// The payload type this session handles.
    pub fn pt(&self) -> Pt {
        self.pt
    }

    /// The config the session was built with.
    pub fn config(&self) -> &DepacketizerConfig {
        &self.config
    }

    /// Counters for this session.
    pub fn stats(&self) -> &DepacketizerStats {
        self.depack.stats()
    }

    /// Parameter sets decoded from `sprop-parameter-sets`.
    pub fn parameter_sets(&self) -> &ParameterSets {
        &self.parameter_sets
    }

    /// Decoded `profile-level-id`, if present and valid.
    pub fn profile_level_id(&self) -> Option<ProfileLevelId> {
        self.profile_level_id
    }

    /// Negotiated `packetization-mode`, 0 or 1.
    pub fn packetization_mode(&self) -> u8 {
        self.packetization_mode
    }

    /// Tests if the parameter sets have been handed out.
    pub fn is_configuration_emitted(&self) -> bool {
        self.configuration_emitted
    }
}

impl PayloadParser for Depacketizer {
    fn parse(&mut self, source: &mut dyn PacketSource) -> Result<ParseOutput, DepackError> {
        Depacketizer::parse(self, source)
    }

    fn uninit(&mut self) {
        Depacketizer::uninit(self)
    }
}

fn copy_fallible(src: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(src.len())?;
    v.extend_from_slice(src);
    Ok(v)
}
