use std::collections::TryReserveError;
use std::fmt;
use std::ops::Range;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::packet::{ANNEXB_NALUSTART_CODE, NALU_TYPE_BITMASK, PPS_NALU_TYPE, SPS_NALU_TYPE};

/// Largest single parameter set accepted from `sprop-parameter-sets`.
pub const MAX_PARAMETER_SET_SIZE: usize = 1024;

// Some senders drop the trailing `=` padding.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Out-of-band SPS/PPS from the `sprop-parameter-sets` fmtp parameter.
///
/// Held as one Annex-B blob, `00 00 00 01 ++ nal` for every parameter set in the
/// order they appear in the attribute. See RFC 6184 section 8.2.1.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ParameterSets {
    blob: Vec<u8>,
    /// Position of each NAL unit in `blob`, start code excluded.
    nals: Vec<Range<usize>>,
    skipped: usize,
}

impl ParameterSets {
    /// Decode a comma separated list of base64 NAL units.
    ///
    /// Tokens that are not valid base64, decode to nothing, or are larger than
    /// [`MAX_PARAMETER_SET_SIZE`] are skipped. The only error is failing to
    /// grow the blob.
    pub fn parse(value: &str) -> Result<Self, TryReserveError> {
        let mut scratch = [0_u8; MAX_PARAMETER_SET_SIZE];
        let mut sets = ParameterSets::default();

        for token in value.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }

            let len = match BASE64.decode_slice(token, &mut scratch) {
                Ok(len) => len,
                Err(e) => {
                    debug!("Skip parameter set {:?}: {}", token, e);
                    sets.skipped += 1;
                    continue;
                }
            };

            // Seen in the wild: an Annex-B start code left at the end of each set.
            let decoded = &scratch[..len];
            let nal = decoded
                .strip_suffix(ANNEXB_NALUSTART_CODE)
                .unwrap_or(decoded);

            if nal.is_empty() {
                debug!("Skip empty parameter set {:?}", token);
                sets.skipped += 1;
                continue;
            }

            sets.push(nal)?;
        }

        trace!(
            "Parsed {} parameter sets ({} bytes), skipped {}",
            sets.nals.len(),
            sets.blob.len(),
            sets.skipped
        );

        Ok(sets)
    }

    fn push(&mut self, nal: &[u8]) -> Result<(), TryReserveError> {
        self.blob
            .try_reserve(ANNEXB_NALUSTART_CODE.len() + nal.len())?;
        self.nals.try_reserve(1)?;

        self.blob.extend_from_slice(ANNEXB_NALUSTART_CODE);
        let start = self.blob.len();
        self.blob.extend_from_slice(nal);
        self.nals.push(start..self.blob.len());

        Ok(())
    }

    /// The Annex-B blob, ready to be fed to a decoder ahead of the first picture.
    pub fn as_bytes(&self) -> &[u8] {
        &self.blob
    }

    /// Length of the Annex-B blob in bytes.
    pub fn len(&self) -> usize {
        self.blob.len()
    }

    /// Tests if no parameter set could be decoded.
    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// Number of tokens that were skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The decoded NAL units, without start codes.
    pub fn nal_units(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.nals.iter().map(|r| &self.blob[r.clone()])
    }

    /// First sequence parameter set.
    pub fn sps(&self) -> Option<&[u8]> {
        self.find(SPS_NALU_TYPE)
    }

    /// First picture parameter set.
    pub fn pps(&self) -> Option<&[u8]> {
        self.find(PPS_NALU_TYPE)
    }

    fn find(&self, nal_type: u8) -> Option<&[u8]> {
        self.nal_units()
            .find(|n| n[0] & NALU_TYPE_BITMASK == nal_type)
    }

    /// Free the blob.
    pub(crate) fn release(&mut self) {
        *self = ParameterSets::default();
    }
}

impl fmt::Debug for ParameterSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSets")
            .field("count", &self.nals.len())
            .field("len", &self.blob.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}
