/// LSB-first bit window over the current LZW sub-block.
///
/// Bits left over from one sub-block stay in the window when the next one is
/// pushed, since GIF codes freely straddle sub-block boundaries.
#[derive(Debug, Default)]
pub struct BitReader {
  bytes: Vec<u8>,
  byte_offset: usize,
  window: u32,
  window_bits: u8,
}

impl BitReader {
  pub fn new() -> Self {
    Self {
      bytes: Vec::with_capacity(255),
      byte_offset: 0,
      window: 0,
      window_bits: 0,
    }
  }

  /// Number of bits available without another `push_bytes`.
  pub fn available_bits(&self) -> usize {
    self.window_bits as usize + 8 * (self.bytes.len() - self.byte_offset)
  }

  pub fn has_bits(&self, len: u8) -> bool {
    self.available_bits() >= len as usize
  }

  /// Reads `len` (at most 16) bits, or `None` if the window runs dry first.
  /// Nothing is consumed on `None`.
  pub fn read_bits(&mut self, len: u8) -> Option<u16> {
    debug_assert!(len <= 16);
    if !self.has_bits(len) {
      return None;
    }
    while self.window_bits < len {
      self.window |= (self.bytes[self.byte_offset] as u32) << self.window_bits;
      self.byte_offset += 1;
      self.window_bits += 8;
    }
    let mask = (1u32 << len) - 1;
    let value = (self.window & mask) as u16;
    self.window >>= len;
    self.window_bits -= len;
    Some(value)
  }

  /// Queues the next sub-block behind whatever is still unread.
  pub fn push_bytes(&mut self, bytes: &[u8]) {
    if self.byte_offset == self.bytes.len() {
      self.bytes.clear();
    } else {
      self.bytes.drain(..self.byte_offset);
    }
    self.byte_offset = 0;
    self.bytes.extend_from_slice(bytes);
  }
}
