use crate::error::{DecodeError, Halt, ParseResult, Result};
use crate::format::{
  ColorTable, ExtensionBlock, GraphicControl, ImageDescriptor, LogicalScreenDescriptor, EXTENSION_INTRODUCER,
  GRAPHIC_CONTROL_LABEL, HEADER_LEN, IMAGE_DESCRIPTOR_LEN, IMAGE_SEPARATOR, TRAILER,
};
use crate::lzw::Decompressor;
use crate::options::DecoderOptions;
use crate::source::ByteSource;
use crate::store::{Frame, FrameStore};

/// Row offset and step of the four interlace passes.
const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Outcome of one `Parser::slurp` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
  /// New frames were committed before the input ran out.
  Advanced { frames: usize },
  /// Nothing new could be committed; more input is needed.
  Pending,
  /// The trailer has been reached.
  Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
  Header,
  Records { screen_width: u32, screen_height: u32 },
  Done,
  Failed(DecodeError),
}

enum Step {
  Continue,
  Finished,
}

/// Image whose descriptor has been read but whose pixels are still arriving.
#[derive(Debug)]
struct PartialImage {
  descriptor: ImageDescriptor,
  lzw: Decompressor,
  raster: Vec<u8>,
  rows_done: usize,
}

impl PartialImage {
  /// Decodes rows until the image is complete or the input runs out.
  fn decode(&mut self, source: &mut ByteSource) -> ParseResult<()> {
    let width = self.descriptor.width as usize;
    let height = self.descriptor.height as usize;
    while self.rows_done < height {
      let row = if self.descriptor.interlaced {
        interlaced_row(self.rows_done, height)
      } else {
        self.rows_done
      };
      self.lzw.decode_line(source, &mut self.raster[row * width..(row + 1) * width])?;
      self.rows_done += 1;
    }
    Ok(())
  }
}

/// Raster row of the `line`-th row stored in an interlaced image.
fn interlaced_row(mut line: usize, height: usize) -> usize {
  for (offset, step) in INTERLACE_PASSES {
    let rows = (height + step - 1 - offset) / step;
    if line < rows {
      return offset + line * step;
    }
    line -= rows;
  }
  line
}

/// Resumable GIF record parser.
///
/// The source is checkpointed after each complete record and reverted to that
/// checkpoint when the input runs dry, so a retry re-reads a partial record
/// from its start. Image data is the exception: once the image descriptor is
/// in, the image is kept here and its LZW sub-blocks are committed one by one,
/// so a retry continues with the sub-block that was cut short. The frame is
/// only committed to the store once its last row is decoded. Extension blocks
/// and the graphic control they carry are kept here until then as well.
#[derive(Debug)]
pub struct Parser {
  options: DecoderOptions,
  state: State,
  image: Option<PartialImage>,
  pending_extensions: Vec<ExtensionBlock>,
  pending_control: Option<GraphicControl>,
  images_parsed: usize,
  stalled_at: Option<u64>,
}

impl Parser {
  pub fn new(options: DecoderOptions) -> Self {
    Self {
      options,
      state: State::Header,
      image: None,
      pending_extensions: Vec::new(),
      pending_control: None,
      images_parsed: 0,
      stalled_at: None,
    }
  }

  pub fn options(&self) -> &DecoderOptions {
    &self.options
  }

  pub fn images_parsed(&self) -> usize {
    self.images_parsed
  }

  pub fn is_done(&self) -> bool {
    self.state == State::Done
  }

  pub fn error(&self) -> Option<&DecodeError> {
    match &self.state {
      State::Failed(err) => Some(err),
      _ => None,
    }
  }

  /// Parses as many complete records as the source holds.
  pub fn slurp(&mut self, source: &mut ByteSource, store: &mut FrameStore) -> Result<Progress> {
    match &self.state {
      State::Done => return Ok(Progress::Complete),
      State::Failed(err) => return Err(err.clone()),
      _ => {}
    }
    // Re-reading the same partial input cannot get further.
    if self.stalled_at == Some(source.total_appended()) && !source.is_finished() {
      return Ok(Progress::Pending);
    }

    let frames_before = store.len();
    loop {
      let step = match self.state {
        State::Records { .. } if self.image.is_some() => self.finish_image(source, store),
        State::Header => self.read_header(source, store),
        State::Records {
          screen_width,
          screen_height,
        } => self.read_record(source, store, screen_width, screen_height),
        State::Done | State::Failed(_) => Ok(Step::Finished),
      };
      match step {
        Ok(Step::Continue) => source.checkpoint(),
        Ok(Step::Finished) => {
          source.checkpoint();
          self.state = State::Done;
          self.stalled_at = None;
          log::info!("reached trailer after {} frames", store.len());
          return Ok(Progress::Complete);
        }
        Err(Halt::Pending) => {
          source.revert();
          self.stalled_at = Some(source.total_appended());
          let frames = store.len() - frames_before;
          log::trace!("waiting for input, {} bytes buffered", source.buffered());
          return Ok(if frames > 0 {
            Progress::Advanced { frames }
          } else {
            Progress::Pending
          });
        }
        Err(Halt::Failed(err)) => {
          source.revert();
          log::error!("decode failed after {} frames: {}", store.len(), err);
          self.state = State::Failed(err.clone());
          return Err(err);
        }
      }
    }
  }

  fn read_header(&mut self, source: &mut ByteSource, store: &mut FrameStore) -> ParseResult<Step> {
    let header: [u8; HEADER_LEN] = source.take_array()?;
    let (mut screen, table_len) = LogicalScreenDescriptor::from_header(&header)?;
    if table_len > 0 {
      screen.global_color_table = Some(ColorTable::from_rgb(source.take(table_len * 3)?));
    }
    if self.options.round_to_even {
      screen.width += screen.width % 2;
      screen.height += screen.height % 2;
    }
    let pixels = u64::from(screen.width) * u64::from(screen.height);
    if pixels > self.options.max_canvas_pixels {
      return Err(
        DecodeError::CanvasTooLarge {
          width: screen.width,
          height: screen.height,
          limit: self.options.max_canvas_pixels,
        }
        .into(),
      );
    }
    log::info!(
      "{:?} stream, {}x{} screen, global color table: {} entries",
      screen.version,
      screen.width,
      screen.height,
      table_len
    );
    self.state = State::Records {
      screen_width: screen.width,
      screen_height: screen.height,
    };
    store.set_screen(screen);
    Ok(Step::Continue)
  }

  fn read_record(
    &mut self,
    source: &mut ByteSource,
    store: &mut FrameStore,
    screen_width: u32,
    screen_height: u32,
  ) -> ParseResult<Step> {
    match source.take_u8()? {
      EXTENSION_INTRODUCER => {
        let block = read_extension(source)?;
        self.accept_extension(block)?;
      }
      IMAGE_SEPARATOR => {
        self.image = Some(read_image_header(source, screen_width, screen_height)?);
      }
      TRAILER => {
        store.finish(std::mem::take(&mut self.pending_extensions));
        return Ok(Step::Finished);
      }
      other => log::warn!("skipping unknown record type {:#04x}", other),
    }
    Ok(Step::Continue)
  }

  fn accept_extension(&mut self, block: ExtensionBlock) -> Result<()> {
    log::debug!("extension {:#04x}: {:?}", block.function, block);
    if block.function == GRAPHIC_CONTROL_LABEL {
      self.pending_control = Some(GraphicControl::from_extension(&block)?);
    }
    self.pending_extensions.push(block);
    Ok(())
  }

  /// Decodes the rest of the in-flight image and commits it as a frame.
  fn finish_image(&mut self, source: &mut ByteSource, store: &mut FrameStore) -> ParseResult<Step> {
    if let Some(image) = self.image.as_mut() {
      image.decode(source)?;
    }
    let image = match self.image.take() {
      Some(image) => image,
      None => return Ok(Step::Continue),
    };

    // Only now is the image complete; the pending metadata belongs to it.
    let control = self.pending_control.take();
    let frame = Frame {
      delay_ms: self.options.effective_delay_ms(control.map(|control| control.delay_cs)),
      descriptor: image.descriptor,
      control,
      extensions: std::mem::take(&mut self.pending_extensions),
      raster: image.raster,
    };
    log::debug!(
      "frame {}: {}x{} at ({}, {}), {} ms",
      store.len(),
      frame.descriptor.width,
      frame.descriptor.height,
      frame.descriptor.left,
      frame.descriptor.top,
      frame.delay_ms
    );
    store.push(frame);
    self.images_parsed += 1;
    Ok(Step::Continue)
  }
}

/// Reads an image descriptor, its local color table and the LZW minimum
/// code size.
fn read_image_header(source: &mut ByteSource, screen_width: u32, screen_height: u32) -> ParseResult<PartialImage> {
  let bytes: [u8; IMAGE_DESCRIPTOR_LEN] = source.take_array()?;
  let (mut descriptor, table_len) = ImageDescriptor::from_bytes(&bytes);
  if table_len > 0 {
    descriptor.local_color_table = Some(ColorTable::from_rgb(source.take(table_len * 3)?));
  }
  descriptor.validate(screen_width, screen_height)?;

  let lzw = Decompressor::begin(source, descriptor.pixel_count())?;
  Ok(PartialImage {
    raster: vec![0u8; descriptor.pixel_count()],
    descriptor,
    lzw,
    rows_done: 0,
  })
}

/// Reads the label and the data sub-blocks of an extension record.
fn read_extension(source: &mut ByteSource) -> ParseResult<ExtensionBlock> {
  let function = source.take_u8()?;
  let mut data = Vec::new();
  loop {
    let len = source.take_u8()? as usize;
    if len == 0 {
      break;
    }
    data.extend_from_slice(source.take(len)?);
  }
  Ok(ExtensionBlock { function, data })
}
