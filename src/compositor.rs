use crate::format::{DisposalMethod, LogicalScreenDescriptor};
use crate::store::{Frame, FrameStore};

pub const BYTES_PER_PIXEL: usize = 4;

/// Screen-sized BGRA pixel buffer, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
  width: u32,
  height: u32,
  pixels: Vec<u8>,
}

impl Canvas {
  pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Self {
    let mut canvas = Self {
      width,
      height,
      pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
    };
    canvas.clear(fill);
    canvas
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn stride(&self) -> usize {
    self.width as usize * BYTES_PER_PIXEL
  }

  pub fn pixels(&self) -> &[u8] {
    &self.pixels
  }

  /// BGRA value at `(x, y)`, or `None` outside the canvas.
  pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= self.width || y >= self.height {
      return None;
    }
    let start = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
    let mut out = [0u8; 4];
    out.copy_from_slice(&self.pixels[start..start + BYTES_PER_PIXEL]);
    Some(out)
  }

  fn clear(&mut self, fill: [u8; 4]) {
    for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
      pixel.copy_from_slice(&fill);
    }
  }

  fn fill_rect(&mut self, rect: Rect, fill: [u8; 4]) {
    let stride = self.stride();
    for y in rect.top..rect.bottom {
      let row = &mut self.pixels[y * stride..(y + 1) * stride];
      for pixel in row[rect.left * BYTES_PER_PIXEL..rect.right * BYTES_PER_PIXEL].chunks_exact_mut(BYTES_PER_PIXEL) {
        pixel.copy_from_slice(&fill);
      }
    }
  }

  fn copy_rect_from(&mut self, snapshot: &[u8], rect: Rect) {
    let stride = self.stride();
    for y in rect.top..rect.bottom {
      let span = y * stride + rect.left * BYTES_PER_PIXEL..y * stride + rect.right * BYTES_PER_PIXEL;
      self.pixels[span.clone()].copy_from_slice(&snapshot[span]);
    }
  }
}

/// Frame rectangle clipped to the canvas, in pixels, right and bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
  left: usize,
  top: usize,
  right: usize,
  bottom: usize,
}

impl Rect {
  fn clipped(frame: &Frame, canvas: &Canvas) -> Option<Self> {
    let descriptor = &frame.descriptor;
    let left = descriptor.left.min(canvas.width);
    let top = descriptor.top.min(canvas.height);
    let right = descriptor.left.saturating_add(descriptor.width).min(canvas.width);
    let bottom = descriptor.top.saturating_add(descriptor.height).min(canvas.height);
    (left < right && top < bottom).then_some(Self {
      left: left as usize,
      top: top as usize,
      right: right as usize,
      bottom: bottom as usize,
    })
  }
}

/// Paints frames onto one persistent canvas, honouring each frame's disposal
/// method before the next frame is drawn.
///
/// Moving forward only paints the frames in between; moving backwards (a
/// loop wrapping around) replays from the first frame.
#[derive(Debug, Default)]
pub struct Compositor {
  canvas: Option<Canvas>,
  snapshot: Option<Vec<u8>>,
  last_composited: Option<usize>,
}

impl Compositor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn canvas(&self) -> Option<&Canvas> {
    self.canvas.as_ref()
  }

  pub fn last_composited(&self) -> Option<usize> {
    self.last_composited
  }

  /// Forgets the painted state; the next `composite` starts from frame 0.
  pub fn reset(&mut self) {
    self.last_composited = None;
  }

  /// Brings the canvas to the state in which frame `target` is displayed.
  ///
  /// `target` is clamped to the frames decoded so far. Returns `None` until
  /// the header and at least one frame are available.
  pub fn composite(&mut self, store: &FrameStore, target: usize) -> Option<&Canvas> {
    let screen = store.screen()?;
    if store.is_empty() {
      return None;
    }
    let target = target.min(store.len() - 1);
    let background = screen.background_bgra();

    let start = match self.last_composited {
      Some(last) if self.canvas.is_some() && target == last => return self.canvas.as_ref(),
      Some(last) if self.canvas.is_some() && target > last => last + 1,
      _ => {
        self.restart_canvas(screen, background);
        0
      }
    };

    let frames = store.frames();
    let canvas = self.canvas.as_mut()?;
    for index in start..=target {
      if let Some(previous) = index.checked_sub(1).map(|previous| &frames[previous]) {
        dispose(canvas, self.snapshot.as_deref(), previous, background);
      }
      let frame = &frames[index];
      if frame.disposal() == DisposalMethod::RestorePrevious {
        let snapshot = self.snapshot.get_or_insert_with(Vec::new);
        snapshot.clear();
        snapshot.extend_from_slice(canvas.pixels());
      }
      paint(canvas, frame, screen, index);
    }
    self.last_composited = Some(target);
    self.canvas.as_ref()
  }

  fn restart_canvas(&mut self, screen: &LogicalScreenDescriptor, background: [u8; 4]) {
    match &mut self.canvas {
      Some(canvas) if canvas.width == screen.width && canvas.height == screen.height => canvas.clear(background),
      _ => self.canvas = Some(Canvas::new(screen.width, screen.height, background)),
    }
    self.last_composited = None;
  }
}

fn dispose(canvas: &mut Canvas, snapshot: Option<&[u8]>, frame: &Frame, background: [u8; 4]) {
  let Some(rect) = Rect::clipped(frame, canvas) else {
    return;
  };
  match frame.disposal() {
    DisposalMethod::RestoreBackground => canvas.fill_rect(rect, background),
    DisposalMethod::RestorePrevious => {
      if let Some(snapshot) = snapshot {
        canvas.copy_rect_from(snapshot, rect);
      }
    }
    DisposalMethod::Unspecified | DisposalMethod::DoNotDispose => {}
  }
}

fn paint(canvas: &mut Canvas, frame: &Frame, screen: &LogicalScreenDescriptor, index: usize) {
  let Some(table) = frame.color_table(screen.global_color_table.as_ref()) else {
    log::warn!("frame {} has no color table; leaving the canvas untouched", index);
    return;
  };
  let Some(rect) = Rect::clipped(frame, canvas) else {
    return;
  };
  let lookup = table.to_bgra_lookup();
  let transparent = frame.transparent_index();
  let frame_width = frame.descriptor.width as usize;
  let frame_left = frame.descriptor.left as usize;
  let frame_top = frame.descriptor.top as usize;
  let stride = canvas.stride();

  for y in rect.top..rect.bottom {
    let source_start = (y - frame_top) * frame_width + (rect.left - frame_left);
    let indices = &frame.raster[source_start..source_start + (rect.right - rect.left)];
    let row = &mut canvas.pixels[y * stride + rect.left * BYTES_PER_PIXEL..y * stride + rect.right * BYTES_PER_PIXEL];
    for (pixel, &index) in row.chunks_exact_mut(BYTES_PER_PIXEL).zip(indices) {
      if Some(index) == transparent {
        continue;
      }
      if let Some(bgra) = lookup[index as usize] {
        pixel.copy_from_slice(&bgra);
      }
    }
  }
}
