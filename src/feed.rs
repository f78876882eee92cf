use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::stream::GifStream;

/// Shared flag that asks a running [`pump`] to stop between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Release);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
  /// The reader hit EOF and the stream was marked finished.
  Finished { bytes: u64 },
  /// Stopped on request; the stream stays open.
  Cancelled { bytes: u64 },
}

/// Copies `reader` into `stream` in chunks of up to `chunk_size` bytes.
///
/// Only appends; decoding is left to whoever drives `decode_more`. An I/O
/// error is returned as is and leaves the stream open, so the caller decides
/// whether to `mark_finished` and accept a truncated animation.
pub fn pump<R: Read>(
  mut reader: R,
  stream: &GifStream,
  cancel: &CancelToken,
  chunk_size: usize,
) -> std::io::Result<FeedOutcome> {
  let mut chunk = vec![0u8; chunk_size.max(1)];
  let mut bytes = 0u64;
  loop {
    if cancel.is_cancelled() {
      log::debug!("feed cancelled after {} bytes", bytes);
      return Ok(FeedOutcome::Cancelled { bytes });
    }
    let read = match reader.read(&mut chunk) {
      Ok(0) => {
        stream.mark_finished();
        log::debug!("feed finished after {} bytes", bytes);
        return Ok(FeedOutcome::Finished { bytes });
      }
      Ok(read) => read,
      Err(err) if err.kind() == ErrorKind::Interrupted => continue,
      Err(err) => return Err(err),
    };
    stream.append_bytes(&chunk[..read]);
    bytes += read as u64;
  }
}
