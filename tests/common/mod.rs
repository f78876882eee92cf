#![allow(dead_code)]

use std::collections::HashMap;

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];
pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];

/// Canvas value of an opaque RGB color.
pub fn bgra(rgb: [u8; 3]) -> [u8; 4] {
  [rgb[2], rgb[1], rgb[0], 255]
}

pub const DISPOSE_NONE: u8 = 1;
pub const DISPOSE_BACKGROUND: u8 = 2;
pub const DISPOSE_PREVIOUS: u8 = 3;

#[derive(Default)]
struct BitWriter {
  bytes: Vec<u8>,
  acc: u32,
  bits: u8,
}

impl BitWriter {
  fn write(&mut self, code: u16, width: u8) {
    self.acc |= (code as u32) << self.bits;
    self.bits += width;
    while self.bits >= 8 {
      self.bytes.push(self.acc as u8);
      self.acc >>= 8;
      self.bits -= 8;
    }
  }

  fn finish(mut self) -> Vec<u8> {
    if self.bits > 0 {
      self.bytes.push(self.acc as u8);
    }
    self.bytes
  }
}

/// GIF-flavoured LZW: clear code first, code width tracking the decoder's
/// table. When the 4096-entry table fills up it either emits a clear or keeps
/// going with the full table and 12-bit codes.
pub fn lzw_encode(min_code_size: u8, indices: &[u8], clear_when_full: bool) -> Vec<u8> {
  let clear = 1u16 << min_code_size;
  let eoi = clear + 1;
  let mut width = min_code_size + 1;
  let mut next = eoi + 1;
  let mut table: HashMap<(u16, u8), u16> = HashMap::new();
  let mut writer = BitWriter::default();
  writer.write(clear, width);

  let emit = |writer: &mut BitWriter, code: u16, next: u16, width: &mut u8| {
    if u32::from(next) > 1u32 << *width && *width < 12 {
      *width += 1;
    }
    writer.write(code, *width);
  };

  let mut prefix: Option<u16> = None;
  for &pixel in indices {
    let Some(current) = prefix else {
      prefix = Some(pixel as u16);
      continue;
    };
    if let Some(&code) = table.get(&(current, pixel)) {
      prefix = Some(code);
      continue;
    }
    emit(&mut writer, current, next, &mut width);
    if next < 4096 {
      table.insert((current, pixel), next);
      next += 1;
      if next == 4096 && clear_when_full {
        emit(&mut writer, clear, next, &mut width);
        table.clear();
        width = min_code_size + 1;
        next = eoi + 1;
      }
    }
    prefix = Some(pixel as u16);
  }
  if let Some(current) = prefix {
    emit(&mut writer, current, next, &mut width);
    next += 1;
  }
  emit(&mut writer, eoi, next, &mut width);
  writer.finish()
}

fn sub_blocks(out: &mut Vec<u8>, data: &[u8], block_len: usize) {
  for chunk in data.chunks(block_len) {
    out.push(chunk.len() as u8);
    out.extend_from_slice(chunk);
  }
  out.push(0);
}

fn table_size_field(len: usize) -> u8 {
  let mut field = 0;
  while (2usize << field) < len {
    field += 1;
  }
  field
}

fn push_table(out: &mut Vec<u8>, colors: &[[u8; 3]]) {
  let entries = 2usize << table_size_field(colors.len());
  for index in 0..entries {
    out.extend_from_slice(&colors.get(index).copied().unwrap_or(BLACK));
  }
}

#[derive(Clone, Debug)]
pub struct ImageSpec {
  pub left: u16,
  pub top: u16,
  pub width: u16,
  pub height: u16,
  /// Row-major, display order.
  pub indices: Vec<u8>,
  pub local_table: Option<Vec<[u8; 3]>>,
  pub interlaced: bool,
  pub min_code_size: u8,
  pub block_len: usize,
  pub clear_when_full: bool,
}

impl ImageSpec {
  pub fn new(left: u16, top: u16, width: u16, height: u16, indices: Vec<u8>) -> Self {
    assert_eq!(indices.len(), width as usize * height as usize);
    let max = indices.iter().copied().max().unwrap_or(0);
    let mut min_code_size = 2;
    while (1u16 << min_code_size) <= max as u16 {
      min_code_size += 1;
    }
    Self {
      left,
      top,
      width,
      height,
      indices,
      local_table: None,
      interlaced: false,
      min_code_size,
      block_len: 255,
      clear_when_full: true,
    }
  }

  pub fn local_table(mut self, colors: &[[u8; 3]]) -> Self {
    self.local_table = Some(colors.to_vec());
    self
  }

  pub fn interlaced(mut self) -> Self {
    self.interlaced = true;
    self
  }

  pub fn min_code_size(mut self, size: u8) -> Self {
    self.min_code_size = size;
    self
  }

  pub fn block_len(mut self, len: usize) -> Self {
    self.block_len = len;
    self
  }

  /// Never emit a clear code; once the table is full it stays full.
  pub fn without_clear(mut self) -> Self {
    self.clear_when_full = false;
    self
  }

  /// Rows in the order they are stored in the stream.
  fn stream_order(&self) -> Vec<u8> {
    let width = self.width as usize;
    let height = self.height as usize;
    if !self.interlaced {
      return self.indices.clone();
    }
    let mut out = Vec::with_capacity(self.indices.len());
    for (offset, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
      for row in (offset..height).step_by(step) {
        out.extend_from_slice(&self.indices[row * width..(row + 1) * width]);
      }
    }
    out
  }
}

/// Assembles GIF89a streams record by record.
pub struct GifBuilder {
  bytes: Vec<u8>,
}

impl GifBuilder {
  pub fn new(width: u16, height: u16) -> Self {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&[0x00, 0x00, 0x00]);
    Self { bytes }
  }

  pub fn with_global_table(width: u16, height: u16, colors: &[[u8; 3]], background: u8) -> Self {
    let mut builder = Self::new(width, height);
    builder.bytes[10] = 0b1111_0000 | table_size_field(colors.len());
    builder.bytes[11] = background;
    push_table(&mut builder.bytes, colors);
    builder
  }

  pub fn graphic_control(mut self, disposal: u8, delay_cs: u16, transparent: Option<u8>) -> Self {
    let packed = (disposal << 2) | u8::from(transparent.is_some());
    self.bytes.extend_from_slice(&[0x21, 0xF9, 0x04, packed]);
    self.bytes.extend_from_slice(&delay_cs.to_le_bytes());
    self.bytes.extend_from_slice(&[transparent.unwrap_or(0), 0x00]);
    self
  }

  pub fn netscape_loop(mut self, loops: u16) -> Self {
    self.bytes.extend_from_slice(&[0x21, 0xFF, 0x0B]);
    self.bytes.extend_from_slice(b"NETSCAPE2.0");
    self.bytes.extend_from_slice(&[0x03, 0x01]);
    self.bytes.extend_from_slice(&loops.to_le_bytes());
    self.bytes.push(0x00);
    self
  }

  pub fn comment(mut self, text: &str) -> Self {
    self.bytes.extend_from_slice(&[0x21, 0xFE]);
    sub_blocks(&mut self.bytes, text.as_bytes(), 255);
    self
  }

  pub fn raw(mut self, bytes: &[u8]) -> Self {
    self.bytes.extend_from_slice(bytes);
    self
  }

  pub fn image(mut self, image: &ImageSpec) -> Self {
    self.bytes.push(0x2C);
    for value in [image.left, image.top, image.width, image.height] {
      self.bytes.extend_from_slice(&value.to_le_bytes());
    }
    let mut packed = 0u8;
    if image.interlaced {
      packed |= 0b0100_0000;
    }
    if let Some(table) = &image.local_table {
      packed |= 0b1000_0000 | table_size_field(table.len());
    }
    self.bytes.push(packed);
    if let Some(table) = &image.local_table {
      push_table(&mut self.bytes, table);
    }
    self.bytes.push(image.min_code_size);
    let data = lzw_encode(image.min_code_size, &image.stream_order(), image.clear_when_full);
    sub_blocks(&mut self.bytes, &data, image.block_len);
    self
  }

  /// Stream without the trailer byte.
  pub fn unterminated(self) -> Vec<u8> {
    self.bytes
  }

  pub fn finish(mut self) -> Vec<u8> {
    self.bytes.push(0x3B);
    self.bytes
  }
}

/// Deterministic xorshift noise for test images.
pub fn noise(len: usize, colors: u8, mut seed: u32) -> Vec<u8> {
  (0..len)
    .map(|_| {
      seed ^= seed << 13;
      seed ^= seed >> 17;
      seed ^= seed << 5;
      (seed % u32::from(colors)) as u8
    })
    .collect()
}

/// The two-frame 2x2 animation: black, then a white top-left pixel drawn
/// through a local table, one second each.
pub fn two_frame_scenario() -> Vec<u8> {
  GifBuilder::with_global_table(2, 2, &[BLACK, WHITE], 0)
    .graphic_control(DISPOSE_NONE, 100, None)
    .image(&ImageSpec::new(0, 0, 2, 2, vec![0, 0, 0, 0]))
    .graphic_control(DISPOSE_NONE, 100, None)
    .image(&ImageSpec::new(0, 0, 2, 2, vec![0, 1, 1, 1]).local_table(&[WHITE, BLACK]))
    .finish()
}

/// A larger animation touching every decoder path: interlacing, tiny
/// sub-blocks, local tables, table resets and all disposal methods.
/// A 256-entry gradient palette.
pub fn gradient() -> Vec<[u8; 3]> {
  (0..=255u8).map(|i| [i, 255 - i, i / 2]).collect()
}

pub fn kitchen_sink() -> Vec<u8> {
  GifBuilder::with_global_table(96, 64, &gradient(), 7)
    .netscape_loop(0)
    .comment("generated")
    .graphic_control(DISPOSE_NONE, 4, None)
    .image(&ImageSpec::new(0, 0, 96, 64, noise(96 * 64, 255, 0x1234_5678)))
    .graphic_control(DISPOSE_BACKGROUND, 7, Some(3))
    .image(&ImageSpec::new(5, 3, 33, 17, noise(33 * 17, 8, 99)).interlaced().block_len(5))
    .graphic_control(DISPOSE_PREVIOUS, 0, Some(0))
    .image(
      &ImageSpec::new(40, 30, 24, 18, noise(24 * 18, 4, 7))
        .local_table(&[RED, GREEN, BLUE, WHITE])
        .block_len(1),
    )
    .image(&ImageSpec::new(10, 10, 9, 9, vec![2; 81]).min_code_size(8))
    .finish()
}
