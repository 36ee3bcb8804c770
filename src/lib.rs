//! A Sans I/O H.264 RTP depacketizer.
//!
//! Turns RTP payloads carrying H.264 per [RFC 6184][rfc] back into an Annex-B
//! byte stream, ready for a decoder. Handles Single NAL Unit packets and
//! fragmentation units (FU-A), and decodes the out-of-band SPS/PPS carried in
//! the `sprop-parameter-sets` format parameter.
//!
//! Aggregation packets (STAP-A, STAP-B, MTAP16, MTAP24) and FU-B are
//! recognized, reported as [`DepackError::UnsupportedPacketType`] and dropped.
//!
//! # Sans I/O
//!
//! Like the rest of this family of crates, the depacketizer does no I/O and
//! has no internal threads or timers. The host owns the socket, parses RTP
//! headers, and queues payloads per payload type in a [`PacketSource`]. Each
//! call to [`Depacketizer::parse`] consumes at most one packet from it.
//!
//! ```
//! use h264_depack::{Depacketizer, FormatParams, Packet, PacketQueue, ParseOutput};
//!
//! let fmtp = FormatParams::parse_line(
//!     "a=fmtp:96 packetization-mode=1;profile-level-id=42e01f;sprop-parameter-sets=Z0IAH5WoFAFuQA==,aM48gA==",
//! );
//! let mut depack = Depacketizer::new(96.into(), &fmtp).unwrap();
//!
//! let mut queue = PacketQueue::new();
//! // IDR slice in three FU-A fragments.
//! queue.push(Packet::new(vec![0x7c_u8, 0x85, 0x88, 0x84], 90_000));
//! queue.push(Packet::new(vec![0x7c_u8, 0x05, 0x00, 0x33], 90_000));
//! queue.push(Packet::new(vec![0x7c_u8, 0x45, 0xff], 90_000));
//!
//! let mut units = vec![];
//! loop {
//!     match depack.parse(&mut queue) {
//!         Ok(ParseOutput::NoData) => break,
//!         Ok(ParseOutput::NeedMore { configuration }) => {
//!             if let Some(sps_pps) = configuration {
//!                 // Feed to the decoder ahead of the first picture.
//!                 assert_eq!(&sps_pps[..5], &[0, 0, 0, 1, 0x67]);
//!             }
//!         }
//!         Ok(ParseOutput::Unit { unit, .. }) => units.push(unit),
//!         Err(e) => panic!("{}", e),
//!     }
//! }
//!
//! assert_eq!(units.len(), 1);
//! assert!(units[0].is_keyframe());
//! assert_eq!(units[0].data, &[0, 0, 0, 1, 0x65, 0x88, 0x84, 0x00, 0x33, 0xff]);
//! ```
//!
//! # Errors
//!
//! Only a bad `packetization-mode` ([`DepackError::Config`]) is fatal, and it
//! is only reported when building the session. Every other error drops the
//! offending packet, discards any partial unit it corrupted, and leaves the
//! session ready for the next packet. All of them are logged through
//! `tracing` and counted in [`DepacketizerStats`].
//!
//! [rfc]: https://www.rfc-editor.org/rfc/rfc6184

#![forbid(unsafe_code)]
#![allow(clippy::new_without_default)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

use std::collections::TryReserveError;

use thiserror::Error;

mod config;
pub use config::{ConfigError, DepacketizerConfig, ParameterSetMode};

pub mod format;
pub use format::{AttributeLookup, FormatParams, ParameterSets};

mod id;
pub use id::Pt;

mod packet;
pub use packet::{AccessUnit, H264Profile, NalKind, ProfileLevelId};

mod session;
pub use session::{Depacketizer, ParseOutput, PayloadParser};

mod source;
pub use source::{Packet, PacketQueue, PacketSource, RtpPacket};

mod stats;
pub use stats::DepacketizerStats;

/// Errors for the leaf parts of the depacketizer.
pub mod error {
    pub use crate::config::ConfigError;
    pub use crate::packet::PacketError;
}

/// Errors for the whole depacketizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DepackError {
    /// Failed to grow a buffer.
    #[error("allocation: {0}")]
    Allocation(#[from] TryReserveError),

    /// Malformed RTP payload.
    #[error("{0}")]
    Packet(#[from] error::PacketError),

    /// NAL unit type that is valid H.264 but not handled, or undefined.
    #[error("Unsupported NAL unit type: {0}")]
    UnsupportedPacketType(u8),

    /// Bad format parameters.
    #[error("{0}")]
    Config(#[from] error::ConfigError),
}

impl DepackError {
    /// Tests if the session can't be used after this error.
    pub fn is_fatal_for_session(&self) -> bool {
        matches!(self, DepackError::Config(_))
    }
}
