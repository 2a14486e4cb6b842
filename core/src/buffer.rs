//! Growable byte buffer with a typed pack/unpack cursor.
//!
//! The buffer is the transport for both persisted event records and active
//! messages. The wire layout is fixed: multi-byte integers in big-endian
//! network order, floating-point values as their IEEE-754 bit pattern in the
//! same order, and definition references as `u32` ids with `u32::MAX`
//! encoding "none".

use thiserror::Error;

use crate::Timestamp;

// BUFFER ERROR
// ================================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("end of buffer reached ({requested} bytes requested, {remaining} remaining)")]
    EndOfBuffer { requested: usize, remaining: usize },
}

// BUFFER
// ================================================================================================

/// Byte buffer with a read cursor.
///
/// Writers append at the end; readers consume from the cursor. Buffers are
/// move-only: ownership passes between the event packing code, an outgoing
/// request, or a listener, but the bytes are never shared.
#[derive(Debug, Default)]
pub struct Buffer {
    data: Vec<u8>,
    position: usize,
}

impl Buffer {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    pub fn new() -> Self {
        Self { data: Vec::new(), position: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), position: 0 }
    }

    /// Wraps received bytes for unpacking; the cursor starts at offset 0.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    // MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Enlarges the capacity by at least `additional` bytes.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Rewinds the read cursor to the start of the buffer.
    pub fn reset_cursor(&mut self) {
        self.position = 0;
    }

    /// Discards all content and rewinds the cursor.
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }

    /// Replaces the content with received bytes and rewinds the cursor.
    pub fn assign(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
        self.position = 0;
    }

    // TYPED WRITERS
    // --------------------------------------------------------------------------------------------

    pub fn put_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.data.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    pub fn put_timestamp(&mut self, value: Timestamp) {
        self.put_f64(value);
    }

    /// Writes a definition reference; `None` encodes as `u32::MAX`.
    pub fn put_id<I: Into<u32>>(&mut self, id: Option<I>) {
        self.put_u32(id.map_or(u32::MAX, Into::into));
    }

    /// Writes a length-prefixed byte blob.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_u32(bytes.len() as u32);
        self.data.extend_from_slice(bytes);
    }

    // TYPED READERS
    // --------------------------------------------------------------------------------------------

    pub fn get_u8(&mut self) -> Result<u8, BufferError> {
        let bytes = self.take::<1>()?;
        Ok(bytes[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_be_bytes(self.take::<4>()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_be_bytes(self.take::<8>()?))
    }

    pub fn get_i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_be_bytes(self.take::<8>()?))
    }

    pub fn get_f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.take::<8>()?)))
    }

    pub fn get_timestamp(&mut self) -> Result<Timestamp, BufferError> {
        self.get_f64()
    }

    /// Reads a definition reference; `u32::MAX` decodes as `None`.
    pub fn get_id<I: From<u32>>(&mut self) -> Result<Option<I>, BufferError> {
        let raw = self.get_u32()?;
        Ok((raw != u32::MAX).then(|| I::from(raw)))
    }

    /// Reads a length-prefixed byte blob.
    pub fn get_bytes(&mut self) -> Result<Vec<u8>, BufferError> {
        let len = self.get_u32()? as usize;
        if len > self.remaining() {
            return Err(BufferError::EndOfBuffer {
                requested: len,
                remaining: self.remaining(),
            });
        }
        let blob = self.data[self.position..self.position + len].to_vec();
        self.position += len;
        Ok(blob)
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        if self.remaining() < N {
            return Err(BufferError::EndOfBuffer {
                requested: N,
                remaining: self.remaining(),
            });
        }
        let mut bytes = [0_u8; N];
        bytes.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        Ok(bytes)
    }
}

// TESTS
// ================================================================================================
