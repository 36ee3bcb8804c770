use std::collections::TryReserveError;

use super::ANNEXB_NALUSTART_CODE;

/// Growable accumulation buffer for one Annex-B NAL unit.
///
/// `len() == 0` means the buffer is ready for a new unit. A non-empty buffer
/// always starts with [`ANNEXB_NALUSTART_CODE`].
#[derive(Debug, Default)]
pub(crate) struct NalBuffer {
    data: Vec<u8>,
    /// RTP timestamp of the fragmented unit currently being assembled.
    pending_timestamp: Option<u32>,
}

impl NalBuffer {
    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut data = Vec::new();
        data.try_reserve(capacity)?;
        Ok(NalBuffer {
            data,
            pending_timestamp: None,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn pending_timestamp(&self) -> Option<u32> {
        self.pending_timestamp
    }

    pub fn set_pending_timestamp(&mut self, timestamp: u32) {
        self.pending_timestamp = Some(timestamp);
    }

    /// Make room for `additional` more bytes.
    ///
    /// On failure the buffer, contents and capacity, is left untouched.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.data.try_reserve(additional)
    }

    /// Append `data`. Callers reserve with [`NalBuffer::ensure_capacity`] first.
    pub fn append(&mut self, data: &[u8]) {
        debug_assert!(self.data.capacity() - self.data.len() >= data.len());
        self.data.extend_from_slice(data);
    }

    pub fn push(&mut self, byte: u8) {
        debug_assert!(self.data.capacity() > self.data.len());
        self.data.push(byte);
    }

    /// Writes the start code if nothing has been written yet.
    ///
    /// Returns true if the start code was written.
    pub fn emit_start_code_if_empty(&mut self) -> bool {
        if !self.data.is_empty() {
            return false;
        }
        self.append(ANNEXB_NALUSTART_CODE);
        true
    }

    /// Logically clear the buffer, keeping the allocation.
    ///
    /// Returns the number of bytes discarded.
    pub fn reset(&mut self) -> usize {
        let discarded = self.data.len();
        self.data.clear();
        self.pending_timestamp = None;
        discarded
    }

    /// Hand the accumulated bytes to the caller.
    ///
    /// The caller gets an exact-size copy and the buffer is reset, keeping its
    /// allocation for the next unit. On failure the unit is discarded.
    pub fn take(&mut self) -> Result<Vec<u8>, TryReserveError> {
        let mut out = Vec::new();
        let result = out.try_reserve_exact(self.data.len());
        if result.is_ok() {
            out.extend_from_slice(&self.data);
        }
        self.reset();
        result.map(|_| out)
    }

    /// Free the backing allocation.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.pending_timestamp = None;
    }
}
