//! Where RTP packets come from.

use std::collections::VecDeque;
use std::fmt;

/// The parts of an RTP packet the depacketizer looks at.
pub trait RtpPacket {
    /// The RTP payload, header and padding removed.
    fn payload(&self) -> &[u8];

    /// The RTP timestamp.
    fn timestamp(&self) -> u32;

    /// The RTP sequence number, if the source keeps it.
    ///
    /// Only used to report gaps inside fragmented units.
    fn seq_no(&self) -> Option<u16> {
        None
    }
}

/// Queue of incoming packets for one payload type, in transport order.
///
/// The depacketizer looks at the head with [`PacketSource::peek`] and
/// consumes it with [`PacketSource::remove`] once handled.
pub trait PacketSource {
    /// The packet at the head of the queue.
    fn peek(&mut self) -> Option<&dyn RtpPacket>;

    /// Drop the packet at the head of the queue.
    fn remove(&mut self);
}

/// An owned RTP packet.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// RTP payload.
    pub payload: Vec<u8>,
    /// RTP timestamp.
    pub timestamp: u32,
    /// RTP sequence number.
    pub seq_no: Option<u16>,
}

impl Packet {
    /// Creates a packet without sequence number.
    pub fn new(payload: impl Into<Vec<u8>>, timestamp: u32) -> Self {
        Packet {
            payload: payload.into(),
            timestamp,
            seq_no: None,
        }
    }

    /// Set the sequence number.
    pub fn with_seq_no(mut self, seq_no: u16) -> Self {
        self.seq_no = Some(seq_no);
        self
    }
}

impl RtpPacket for Packet {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn seq_no(&self) -> Option<u16> {
        self.seq_no
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("timestamp", &self.timestamp)
            .field("seq_no", &self.seq_no)
            .field("len", &self.payload.len())
            .finish()
    }
}

/// In memory [`PacketSource`].
#[derive(Debug, Default)]
pub struct PacketQueue {
    queue: VecDeque<Packet>,
}

impl PacketQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        PacketQueue::default()
    }

    /// Add a packet at the back.
    pub fn push(&mut self, packet: Packet) {
        self.queue.push_back(packet);
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Tests if there are no queued packets.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl PacketSource for PacketQueue {
    fn peek(&mut self) -> Option<&dyn RtpPacket> {
        self.queue.front().map(|p| p as &dyn RtpPacket)
    }

    fn remove(&mut self) {
        self.queue.pop_front();
    }
}

impl Extend<Packet> for PacketQueue {
    fn extend<I: IntoIterator<Item = Packet>>(&mut self, iter: I) {
        self.queue.extend(iter);
    }
}

impl FromIterator<Packet> for PacketQueue {
    fn from_iter<I: IntoIterator<Item = Packet>>(iter: I) -> Self {
        PacketQueue {
            queue: iter.into_iter().collect(),
        }
    }
}
