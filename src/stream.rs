use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::clock::AnimationClock;
use crate::compositor::{Canvas, Compositor};
use crate::error::{DecodeError, Result};
use crate::format::LogicalScreenDescriptor;
use crate::options::DecoderOptions;
use crate::parser::{Parser, Progress};
use crate::source::ByteSource;
use crate::store::{Frame, FrameStore};

/// Read access to the composited canvas. Decoding waits while it is held.
pub type CanvasGuard<'a> = MappedRwLockReadGuard<'a, Canvas>;

#[derive(Debug)]
struct DecodeState {
  parser: Parser,
  store: FrameStore,
  compositor: Compositor,
  clock: AnimationClock,
}

impl DecodeState {
  fn frame_count(&self) -> Result<usize> {
    self.store.checked_len(self.parser.images_parsed())
  }
}

/// Progressive GIF decoder.
///
/// Bytes are appended from one thread (a network callback, a file reader)
/// while another drives `decode_more` and `canvas_for_elapsed`. The input
/// buffer has its own lock so appending never waits for a decode pass to
/// finish compositing. When both are needed the decode state is locked first.
#[derive(Debug)]
pub struct GifStream {
  source: Mutex<ByteSource>,
  state: RwLock<DecodeState>,
}

impl Default for GifStream {
  fn default() -> Self {
    Self::new()
  }
}

impl GifStream {
  pub fn new() -> Self {
    Self::with_options(DecoderOptions::default())
  }

  pub fn with_options(options: DecoderOptions) -> Self {
    Self {
      source: Mutex::new(ByteSource::new()),
      state: RwLock::new(DecodeState {
        parser: Parser::new(options),
        store: FrameStore::new(),
        compositor: Compositor::new(),
        clock: AnimationClock::new(),
      }),
    }
  }

  /// Convenience for input that is already complete.
  pub fn from_bytes(bytes: &[u8], options: DecoderOptions) -> Self {
    let stream = Self::with_options(options);
    stream.append_bytes(bytes);
    stream.mark_finished();
    stream
  }

  pub fn append_bytes(&self, chunk: &[u8]) {
    self.source.lock().append(chunk);
  }

  /// Appends a chunk that the supplier may deliver more than once; see
  /// [`ByteSource::append_shared`].
  pub fn append_shared(&self, chunk: &Arc<[u8]>) -> bool {
    self.source.lock().append_shared(chunk)
  }

  pub fn mark_finished(&self) {
    self.source.lock().mark_finished();
  }

  /// Parses whatever complete records are buffered.
  ///
  /// Returns whether a later call may still make progress: `false` once the
  /// trailer has been reached or after a failure. The failure itself is
  /// returned once; the frames decoded before it remain available.
  pub fn decode_more(&self) -> Result<bool> {
    let mut state = self.state.write();
    if state.parser.is_done() || state.parser.error().is_some() {
      return Ok(false);
    }
    let mut source = self.source.lock();
    let DecodeState { parser, store, .. } = &mut *state;
    match parser.slurp(&mut source, store)? {
      Progress::Complete => Ok(false),
      Progress::Advanced { frames } => {
        log::debug!("{} new frames, {} total", frames, store.len());
        Ok(true)
      }
      Progress::Pending => Ok(true),
    }
  }

  /// Parses everything buffered so far and reports the frame count.
  pub fn decode_all(&self) -> Result<usize> {
    self.decode_more()?;
    self.frame_count()
  }

  /// Canvas width in pixels, 0 before the header has been parsed.
  pub fn width(&self) -> u32 {
    self.state.read().store.screen().map_or(0, |screen| screen.width)
  }

  pub fn height(&self) -> u32 {
    self.state.read().store.screen().map_or(0, |screen| screen.height)
  }

  pub fn screen(&self) -> Option<LogicalScreenDescriptor> {
    self.state.read().store.screen().cloned()
  }

  pub fn frame_count(&self) -> Result<usize> {
    self.state.read().frame_count()
  }

  /// Copy of a decoded frame, raster included.
  pub fn frame(&self, index: usize) -> Result<Frame> {
    self.state.read().store.frame(index).cloned()
  }

  pub fn frame_delay_ms(&self, index: usize) -> Result<u32> {
    self.state.read().store.delay_ms(index)
  }

  /// The trailer has been parsed.
  pub fn is_fully_loaded(&self) -> bool {
    self.state.read().store.is_complete()
  }

  pub fn loop_count(&self) -> Option<u16> {
    self.state.read().store.loop_count()
  }

  /// The error that stopped decoding, if any.
  pub fn error(&self) -> Option<DecodeError> {
    self.state.read().parser.error().cloned()
  }

  /// Composites the frame due `elapsed_ms` after playback started and
  /// returns the canvas, or `None` while no frame has been decoded.
  pub fn canvas_for_elapsed(&self, elapsed_ms: u64) -> Result<Option<CanvasGuard<'_>>> {
    let mut state = self.state.write();
    let frame_count = state.frame_count()?;
    if frame_count == 0 {
      return Ok(None);
    }
    let DecodeState {
      store,
      compositor,
      clock,
      ..
    } = &mut *state;
    let tick = clock.frame_for_elapsed(elapsed_ms, frame_count, store.is_complete(), |index| {
      store.frames()[index].delay_ms
    });
    if tick.changed {
      log::trace!("showing frame {} at {} ms", tick.index, elapsed_ms);
    }
    compositor.composite(store, tick.index);

    let state = RwLockWriteGuard::downgrade(state);
    Ok(RwLockReadGuard::try_map(state, |state| state.compositor.canvas()).ok())
  }

  /// Index of the frame shown by the last `canvas_for_elapsed` call.
  pub fn current_frame(&self) -> usize {
    self.state.read().clock.current()
  }

  /// Starts playback over from frame 0. Decoded frames are kept.
  pub fn restart(&self) {
    let mut state = self.state.write();
    state.clock.reset();
    state.compositor.reset();
  }
}
