use derivative::Derivative;

use crate::bit_reader::BitReader;
use crate::error::{DecodeError, ParseResult};
use crate::source::ByteSource;

pub const MAX_CODE_BITS: u8 = 12;
/// Pixel indices are bytes, so literals never need more than 8 bits. A
/// minimum of 1 is out of the GIF89a range but some two-color encoders
/// write it, and it decodes with 2-bit codes.
pub const MIN_CODE_SIZES: std::ops::RangeInclusive<u8> = 1..=8;
const TABLE_SIZE: usize = 1 << MAX_CODE_BITS;
const NO_CODE: u16 = 4098;

/// Variable-width LZW decoder for a single GIF image block.
///
/// The compressed bytes are pulled from the [`ByteSource`] one sub-block at a
/// time, so the decoder halts with `Pending` as soon as a sub-block is not
/// fully buffered. Output is produced in caller-sized lines; pixels that do
/// not fit the current line stay on the stack for the next one.
///
/// Every sub-block is committed to the source as soon as it is in the bit
/// window, so after a stall the decoder picks up where it stopped instead of
/// starting the image over.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Decompressor {
  min_code_size: u8,
  clear_code: u16,
  eoi_code: u16,
  next_code: u16,
  code_size: u8,
  prev_code: Option<u16>,
  first_pixel: u8,
  #[derivative(Debug = "ignore")]
  prefix: Box<[u16]>,
  #[derivative(Debug = "ignore")]
  suffix: Box<[u8]>,
  #[derivative(Debug = "ignore")]
  stack: Vec<u8>,
  #[derivative(Debug = "ignore")]
  bits: BitReader,
  pixels_remaining: usize,
  line_filled: usize,
  terminated: bool,
}

impl Decompressor {
  pub fn new(min_code_size: u8, pixel_count: usize) -> Result<Self, DecodeError> {
    if !MIN_CODE_SIZES.contains(&min_code_size) {
      return Err(DecodeError::InvalidCodeSize(min_code_size));
    }
    let clear_code = 1u16 << min_code_size;
    let mut suffix = vec![0u8; TABLE_SIZE].into_boxed_slice();
    for code in 0..clear_code {
      suffix[code as usize] = code as u8;
    }
    Ok(Self {
      min_code_size,
      clear_code,
      eoi_code: clear_code + 1,
      next_code: clear_code + 2,
      code_size: min_code_size + 1,
      prev_code: None,
      first_pixel: 0,
      prefix: vec![NO_CODE; TABLE_SIZE].into_boxed_slice(),
      suffix,
      stack: Vec::with_capacity(TABLE_SIZE),
      bits: BitReader::new(),
      pixels_remaining: pixel_count,
      line_filled: 0,
      terminated: false,
    })
  }

  /// Reads the minimum code size byte that opens every image block.
  pub(crate) fn begin(source: &mut ByteSource, pixel_count: usize) -> ParseResult<Self> {
    let min_code_size = source.take_u8()?;
    Ok(Self::new(min_code_size, pixel_count)?)
  }

  pub fn pixels_remaining(&self) -> usize {
    self.pixels_remaining
  }

  pub fn code_size(&self) -> u8 {
    self.code_size
  }

  /// Fills `line` with the next `line.len()` pixel indices.
  ///
  /// After `Halt::Pending` the same line must be passed again; the pixels
  /// already written to it are kept. Once the last pixel of the image has
  /// been produced the rest of the block, up to and including its
  /// zero-length terminator, is consumed.
  pub(crate) fn decode_line(&mut self, source: &mut ByteSource, line: &mut [u8]) -> ParseResult<()> {
    debug_assert!(line.len() <= self.pixels_remaining);
    while self.line_filled < line.len() {
      if let Some(pixel) = self.stack.pop() {
        line[self.line_filled] = pixel;
        self.line_filled += 1;
        continue;
      }

      let code = self.read_code(source, self.pixels_remaining - self.line_filled)?;
      if code == self.clear_code {
        self.reset();
      } else if code == self.eoi_code {
        return Err(
          DecodeError::PrematureEndOfInformation {
            remaining: self.pixels_remaining - self.line_filled,
          }
          .into(),
        );
      } else {
        self.expand(code)?;
      }
    }
    if self.pixels_remaining == line.len() {
      self.finish(source)?;
    }
    self.pixels_remaining -= line.len();
    self.line_filled = 0;
    Ok(())
  }

  /// Consumes the sub-blocks left after the last pixel, terminator included.
  fn finish(&mut self, source: &mut ByteSource) -> ParseResult<()> {
    while !self.terminated {
      let len = source.take_u8()?;
      if len == 0 {
        self.terminated = true;
      } else {
        source.take(len as usize)?;
        source.checkpoint();
      }
    }
    Ok(())
  }

  fn reset(&mut self) {
    // Every link goes, not just the ones above the current code; stale
    // prefixes would otherwise resurface once the table refills.
    self.prefix.fill(NO_CODE);
    self.next_code = self.eoi_code + 1;
    self.code_size = self.min_code_size + 1;
    self.prev_code = None;
  }

  /// Pushes the pixels of `code` onto the stack, last pixel first, and grows
  /// the table by one entry.
  fn expand(&mut self, code: u16) -> Result<(), DecodeError> {
    let prev = match self.prev_code {
      Some(prev) => prev,
      None => {
        // First code after a clear has to be a literal.
        if code >= self.clear_code {
          return Err(DecodeError::InvalidCode {
            code,
            next: self.next_code,
          });
        }
        self.stack.push(code as u8);
        self.prev_code = Some(code);
        self.first_pixel = code as u8;
        return Ok(());
      }
    };

    let mut current = if code < self.clear_code || (code > self.eoi_code && code < self.next_code) {
      code
    } else if code == self.next_code {
      // KwKwK: the code being defined right now is the previous string plus
      // its own first pixel.
      self.stack.push(self.first_pixel);
      prev
    } else {
      return Err(DecodeError::InvalidCode {
        code,
        next: self.next_code,
      });
    };

    while current > self.eoi_code {
      if self.stack.len() >= TABLE_SIZE {
        return Err(DecodeError::PrefixChainTooDeep);
      }
      let parent = self.prefix[current as usize];
      if parent == NO_CODE {
        return Err(DecodeError::InvalidCode {
          code: current,
          next: self.next_code,
        });
      }
      self.stack.push(self.suffix[current as usize]);
      current = parent;
    }
    if self.stack.len() >= TABLE_SIZE {
      return Err(DecodeError::PrefixChainTooDeep);
    }
    let root = current as u8;
    self.stack.push(root);

    if (self.next_code as usize) < TABLE_SIZE {
      self.prefix[self.next_code as usize] = prev;
      self.suffix[self.next_code as usize] = root;
      self.next_code += 1;
      if self.next_code >= 1 << self.code_size && self.code_size < MAX_CODE_BITS {
        self.code_size += 1;
      }
    }
    self.prev_code = Some(code);
    self.first_pixel = root;
    Ok(())
  }

  fn read_code(&mut self, source: &mut ByteSource, remaining: usize) -> ParseResult<u16> {
    if self.code_size > MAX_CODE_BITS {
      return Err(DecodeError::CodeWidthOverflow.into());
    }
    loop {
      if let Some(code) = self.bits.read_bits(self.code_size) {
        return Ok(code);
      }
      let len = source.take_u8()?;
      if len == 0 {
        return Err(DecodeError::MissingImageData { remaining }.into());
      }
      let block = source.take(len as usize)?;
      self.bits.push_bytes(block);
      source.checkpoint();
    }
  }
}
