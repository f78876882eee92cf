use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{DecodeError, Halt, ParseResult};

/// Growable window over the not-yet-committed part of the input.
///
/// The supplier appends at the back; the parser reads from `position` and
/// either commits (`checkpoint`) or rolls back (`revert`) once it knows
/// whether the record it was reading is complete.
#[derive(Debug, Default)]
pub struct ByteSource {
  buffer: Vec<u8>,
  position: usize,
  revert_position: usize,
  finished: bool,
  appended: u64,
  handed_out: u64,
  last_shared: Option<Arc<[u8]>>,
}

impl ByteSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn append(&mut self, bytes: &[u8]) {
    self.buffer.extend_from_slice(bytes);
    self.appended += bytes.len() as u64;
  }

  /// Appends a chunk the supplier may hand over more than once. A chunk that
  /// is the same allocation as the previous shared chunk is ignored.
  ///
  /// Returns whether the chunk was appended.
  pub fn append_shared(&mut self, chunk: &Arc<[u8]>) -> bool {
    if let Some(last) = &self.last_shared {
      if Arc::ptr_eq(last, chunk) {
        log::debug!("dropping redelivered chunk of {} bytes", chunk.len());
        return false;
      }
    }
    self.append(chunk);
    self.last_shared = Some(Arc::clone(chunk));
    true
  }

  /// No more bytes will arrive; short reads now return what is left.
  pub fn mark_finished(&mut self) {
    self.finished = true;
    self.last_shared = None;
  }

  pub fn is_finished(&self) -> bool {
    self.finished
  }

  /// Unread bytes after the cursor.
  pub fn remaining(&self) -> usize {
    self.buffer.len() - self.position
  }

  /// Bytes held in memory, including the ones before the cursor that have
  /// not been compacted away yet.
  pub fn buffered(&self) -> usize {
    self.buffer.len()
  }

  pub fn position(&self) -> usize {
    self.position
  }

  /// Total bytes ever appended. Used to tell whether a retry can make progress.
  pub fn total_appended(&self) -> u64 {
    self.appended
  }

  /// Bytes handed out by `read`, counting every re-read after a `revert`.
  pub fn bytes_read(&self) -> u64 {
    self.handed_out
  }

  /// Reads exactly `n` bytes.
  ///
  /// `None` means "come back later": fewer than `n` bytes are buffered and the
  /// stream is still open. Nothing is consumed in that case. Once the stream
  /// is finished a short read returns whatever is left, possibly nothing.
  pub fn read(&mut self, n: usize) -> Option<&[u8]> {
    let available = self.remaining();
    if available < n && !self.finished {
      return None;
    }
    let start = self.position;
    let end = start + n.min(available);
    self.position = end;
    self.handed_out += (end - start) as u64;
    Some(&self.buffer[start..end])
  }

  /// Commits everything read so far.
  ///
  /// Committed bytes are dropped once they make up at least half of the
  /// buffer.
  pub fn checkpoint(&mut self) {
    if self.position * 2 >= self.buffer.len() {
      self.buffer.drain(..self.position);
      self.position = 0;
    }
    self.revert_position = self.position;
  }

  /// Rewinds to the last checkpoint.
  pub fn revert(&mut self) {
    self.position = self.revert_position;
  }

  pub(crate) fn take(&mut self, n: usize) -> ParseResult<&[u8]> {
    let available = self.remaining();
    match self.read(n) {
      None => Err(Halt::Pending),
      Some(bytes) if bytes.len() < n => Err(DecodeError::Truncated { needed: n, available }.into()),
      Some(bytes) => Ok(bytes),
    }
  }

  pub(crate) fn take_u8(&mut self) -> ParseResult<u8> {
    Ok(self.take(1)?[0])
  }

  pub(crate) fn take_u16(&mut self) -> ParseResult<u16> {
    Ok(LittleEndian::read_u16(self.take(2)?))
  }

  pub(crate) fn take_array<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(self.take(N)?);
    Ok(out)
  }
}
