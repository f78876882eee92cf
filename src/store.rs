use derivative::Derivative;

use crate::error::{DecodeError, Result};
use crate::format::{
  ColorTable, DisposalMethod, ExtensionBlock, GraphicControl, ImageDescriptor, LogicalScreenDescriptor,
};

/// One decoded image together with the metadata that preceded it.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Frame {
  pub descriptor: ImageDescriptor,
  pub control: Option<GraphicControl>,
  /// Effective display time after the delay policy was applied.
  pub delay_ms: u32,
  /// Every extension block seen since the previous image, graphic control included.
  pub extensions: Vec<ExtensionBlock>,
  /// Color indices, `width * height`, rows in display order.
  #[derivative(Debug = "ignore")]
  pub raster: Vec<u8>,
}

impl Frame {
  pub fn disposal(&self) -> DisposalMethod {
    self.control.map(|control| control.disposal).unwrap_or_default()
  }

  pub fn transparent_index(&self) -> Option<u8> {
    self.control.and_then(|control| control.transparent_index)
  }

  /// The local table if the image carries one, otherwise the global table.
  pub fn color_table<'a>(&'a self, global: Option<&'a ColorTable>) -> Option<&'a ColorTable> {
    self.descriptor.local_color_table.as_ref().or(global)
  }
}

/// Append-only list of decoded frames plus the stream-level metadata.
#[derive(Debug, Default)]
pub struct FrameStore {
  screen: Option<LogicalScreenDescriptor>,
  frames: Vec<Frame>,
  trailing_extensions: Vec<ExtensionBlock>,
  complete: bool,
}

impl FrameStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// `None` until the header has been parsed.
  pub fn screen(&self) -> Option<&LogicalScreenDescriptor> {
    self.screen.as_ref()
  }

  pub(crate) fn set_screen(&mut self, screen: LogicalScreenDescriptor) {
    self.screen = Some(screen);
  }

  pub(crate) fn push(&mut self, frame: Frame) {
    self.frames.push(frame);
  }

  pub(crate) fn finish(&mut self, trailing_extensions: Vec<ExtensionBlock>) {
    self.trailing_extensions = trailing_extensions;
    self.complete = true;
  }

  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  /// The trailer has been reached; no more frames will be added.
  pub fn is_complete(&self) -> bool {
    self.complete
  }

  pub fn frames(&self) -> &[Frame] {
    &self.frames
  }

  pub fn frame(&self, index: usize) -> Result<&Frame> {
    self.frames.get(index).ok_or(DecodeError::FrameOutOfRange {
      index,
      count: self.frames.len(),
    })
  }

  pub fn delay_ms(&self, index: usize) -> Result<u32> {
    Ok(self.frame(index)?.delay_ms)
  }

  /// Extension blocks between the last image and the trailer.
  pub fn trailing_extensions(&self) -> &[ExtensionBlock] {
    &self.trailing_extensions
  }

  /// Loop count announced by the first application extension that carries one.
  pub fn loop_count(&self) -> Option<u16> {
    self
      .frames
      .iter()
      .flat_map(|frame| frame.extensions.iter())
      .chain(self.trailing_extensions.iter())
      .find_map(ExtensionBlock::loop_count)
  }

  /// Frame count, cross-checked against the number of images the parser committed.
  pub fn checked_len(&self, images_parsed: usize) -> Result<usize> {
    if self.frames.len() != images_parsed {
      return Err(DecodeError::FrameCountMismatch {
        frames: self.frames.len(),
        images: images_parsed,
      });
    }
    Ok(self.frames.len())
  }
}
