/// Result of mapping an elapsed time onto a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
  pub index: usize,
  /// The index differs from the previous tick, or this is the first tick.
  pub changed: bool,
}

/// Maps total elapsed playback time to the frame that should be on screen.
#[derive(Debug, Default)]
pub struct AnimationClock {
  current: usize,
  started: bool,
}

impl AnimationClock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Index reported by the last tick.
  pub fn current(&self) -> usize {
    self.current
  }

  /// Back to frame 0; the next tick reports a change.
  pub fn reset(&mut self) {
    self.current = 0;
    self.started = false;
  }

  pub fn frame_for_elapsed<F>(&mut self, elapsed_ms: u64, frame_count: usize, fully_loaded: bool, delay_ms: F) -> Tick
  where
    F: Fn(usize) -> u32,
  {
    let index = frame_at(elapsed_ms, frame_count, fully_loaded, delay_ms);
    let changed = !self.started || index != self.current;
    self.started = true;
    self.current = index;
    Tick { index, changed }
  }
}

/// Frame on screen `elapsed_ms` after playback started.
///
/// Frame `i` is shown for `delay_ms(i)` milliseconds, ending exactly at the
/// sum of delays up to and including it. Once the stream is fully loaded the
/// timeline repeats forever; while it is still loading, time past the last
/// decoded frame holds on that frame.
pub fn frame_at<F>(elapsed_ms: u64, frame_count: usize, fully_loaded: bool, delay_ms: F) -> usize
where
  F: Fn(usize) -> u32,
{
  if frame_count == 0 || elapsed_ms == 0 {
    return 0;
  }
  let mut elapsed = elapsed_ms;
  if fully_loaded {
    let total: u64 = (0..frame_count).map(|index| u64::from(delay_ms(index))).sum();
    if total > 0 && elapsed > total {
      elapsed -= total * ((elapsed - 1) / total);
    }
  }
  let mut accounted = 0u64;
  for index in 0..frame_count {
    accounted += u64::from(delay_ms(index));
    if accounted >= elapsed {
      return index;
    }
  }
  frame_count - 1
}
