use byteorder::{ByteOrder, LittleEndian};
use derivative::Derivative;

use crate::error::{DecodeError, Result};

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const IMAGE_SEPARATOR: u8 = 0x2C;
pub const TRAILER: u8 = 0x3B;

pub const PLAIN_TEXT_LABEL: u8 = 0x01;
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
pub const COMMENT_LABEL: u8 = 0xFE;
pub const APPLICATION_LABEL: u8 = 0xFF;

/// Signature plus logical screen descriptor, without the color table.
pub const HEADER_LEN: usize = 13;
pub const IMAGE_DESCRIPTOR_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
  Gif87a,
  Gif89a,
}

impl Version {
  pub fn from_signature(signature: &[u8; 6]) -> Result<Self> {
    match signature {
      b"GIF87a" => Ok(Version::Gif87a),
      b"GIF89a" => Ok(Version::Gif89a),
      _ => Err(DecodeError::NotGif(*signature)),
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Color {
  pub red: u8,
  pub green: u8,
  pub blue: u8,
}

impl Color {
  pub const fn new(red: u8, green: u8, blue: u8) -> Self {
    Self { red, green, blue }
  }

  /// Opaque pixel in canvas byte order.
  pub fn to_bgra(self) -> [u8; 4] {
    [self.blue, self.green, self.red, 0xFF]
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
  colors: Vec<Color>,
}

impl ColorTable {
  /// Number of entries announced by the 3-bit size field of a packed byte.
  pub fn entries_for(size_field: u8) -> usize {
    2 << (size_field & 0b0000_0111)
  }

  pub fn from_rgb(bytes: &[u8]) -> Self {
    let colors = bytes
      .chunks_exact(3)
      .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
      .collect();
    Self { colors }
  }

  pub fn get(&self, index: u8) -> Option<Color> {
    self.colors.get(index as usize).copied()
  }

  pub fn len(&self) -> usize {
    self.colors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.colors.is_empty()
  }

  /// Table expanded to canvas pixels, one entry per possible index. Indices
  /// past the end of the table map to `None`.
  pub fn to_bgra_lookup(&self) -> [Option<[u8; 4]>; 256] {
    let mut lookup = [None; 256];
    for (slot, color) in lookup.iter_mut().zip(&self.colors) {
      *slot = Some(color.to_bgra());
    }
    lookup
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
  pub version: Version,
  pub width: u32,
  pub height: u32,
  pub color_resolution: u8,
  pub sorted: bool,
  pub background_color_index: u8,
  pub pixel_aspect_ratio: u8,
  pub global_color_table: Option<ColorTable>, // filled in after the header when announced
}

impl LogicalScreenDescriptor {
  /// Parses signature and screen descriptor. Returns the descriptor and the
  /// number of global color table entries that follow it.
  pub fn from_header(header: &[u8; HEADER_LEN]) -> Result<(Self, usize)> {
    let mut signature = [0u8; 6];
    signature.copy_from_slice(&header[0..6]);
    let version = Version::from_signature(&signature)?;

    let packed_field = header[10];
    let global_color_flag = (packed_field & 0b1000_0000) != 0;
    let table_len = if global_color_flag {
      ColorTable::entries_for(packed_field)
    } else {
      0
    };

    let descriptor = Self {
      version,
      width: LittleEndian::read_u16(&header[6..8]) as u32,
      height: LittleEndian::read_u16(&header[8..10]) as u32,
      color_resolution: ((packed_field & 0b0111_0000) >> 4) + 1,
      sorted: (packed_field & 0b0000_1000) != 0,
      background_color_index: header[11],
      pixel_aspect_ratio: header[12],
      global_color_table: None,
    };
    Ok((descriptor, table_len))
  }

  /// Background pixel used to clear disposed regions: the global table's
  /// background entry, or fully transparent when there is none.
  pub fn background_bgra(&self) -> [u8; 4] {
    self
      .global_color_table
      .as_ref()
      .and_then(|table| table.get(self.background_color_index))
      .map(Color::to_bgra)
      .unwrap_or([0, 0, 0, 0])
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMethod {
  #[default]
  Unspecified,
  DoNotDispose,
  RestoreBackground,
  RestorePrevious,
}

impl DisposalMethod {
  pub fn from_bits(bits: u8) -> Self {
    match bits {
      1 => DisposalMethod::DoNotDispose,
      2 => DisposalMethod::RestoreBackground,
      3 => DisposalMethod::RestorePrevious,
      // 0 and the reserved values 4-7 leave the canvas alone.
      _ => DisposalMethod::Unspecified,
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
  pub disposal: DisposalMethod,
  pub user_input: bool,
  /// Hundredths of a second, as stored in the stream.
  pub delay_cs: u16,
  pub transparent_index: Option<u8>,
}

impl GraphicControl {
  pub fn from_extension(block: &ExtensionBlock) -> Result<Self> {
    if block.data.len() != 4 {
      return Err(DecodeError::InvalidGraphicControl(block.data.len()));
    }
    let packed_field = block.data[0];
    let transparent_color_flag = (packed_field & 0b0000_0001) != 0;
    Ok(Self {
      disposal: DisposalMethod::from_bits((packed_field & 0b0001_1100) >> 2),
      user_input: (packed_field & 0b0000_0010) != 0,
      delay_cs: LittleEndian::read_u16(&block.data[1..3]),
      transparent_index: transparent_color_flag.then_some(block.data[3]),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
  pub left: u32,
  pub top: u32,
  pub width: u32,
  pub height: u32,
  pub interlaced: bool,
  pub sorted: bool,
  pub local_color_table: Option<ColorTable>,
}

impl ImageDescriptor {
  /// Parses the fixed part of an image descriptor (after the separator).
  /// Returns the descriptor and the number of local color table entries
  /// that follow it.
  pub fn from_bytes(bytes: &[u8; IMAGE_DESCRIPTOR_LEN]) -> (Self, usize) {
    let packed_field = bytes[8];
    let local_color_table_flag = (packed_field & 0b1000_0000) != 0;
    let table_len = if local_color_table_flag {
      ColorTable::entries_for(packed_field)
    } else {
      0
    };
    let descriptor = Self {
      left: LittleEndian::read_u16(&bytes[0..2]) as u32,
      top: LittleEndian::read_u16(&bytes[2..4]) as u32,
      width: LittleEndian::read_u16(&bytes[4..6]) as u32,
      height: LittleEndian::read_u16(&bytes[6..8]) as u32,
      interlaced: (packed_field & 0b0100_0000) != 0,
      sorted: (packed_field & 0b0010_0000) != 0,
      local_color_table: None,
    };
    (descriptor, table_len)
  }

  pub fn pixel_count(&self) -> usize {
    self.width as usize * self.height as usize
  }

  /// Rejects empty images and images bigger than the logical screen. Images
  /// that merely hang off the screen edge are accepted and clipped later.
  pub fn validate(&self, screen_width: u32, screen_height: u32) -> Result<()> {
    if self.width == 0 || self.height == 0 || self.width > screen_width || self.height > screen_height {
      return Err(DecodeError::InvalidGeometry {
        left: self.left,
        top: self.top,
        width: self.width,
        height: self.height,
        screen_width,
        screen_height,
      });
    }
    Ok(())
  }
}

/// An extension record with its sub-blocks concatenated.
#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct ExtensionBlock {
  pub function: u8,
  #[derivative(Debug(format_with = "fmt_len"))]
  pub data: Vec<u8>,
}

#[allow(clippy::ptr_arg)]
fn fmt_len(data: &Vec<u8>, f: &mut std::fmt::Formatter) -> std::fmt::Result {
  write!(f, "[{} bytes]", data.len())
}

impl ExtensionBlock {
  /// Identifier of an application extension, e.g. `NETSCAPE2.0`.
  pub fn application_identifier(&self) -> Option<&[u8]> {
    if self.function == APPLICATION_LABEL && self.data.len() >= 11 {
      Some(&self.data[..11])
    } else {
      None
    }
  }

  /// Loop count from a NETSCAPE2.0 / ANIMEXTS1.0 block. Zero means forever.
  pub fn loop_count(&self) -> Option<u16> {
    match self.application_identifier() {
      Some(b"NETSCAPE2.0") | Some(b"ANIMEXTS1.0") if self.data.len() >= 14 && self.data[11] == 0x01 => {
        Some(LittleEndian::read_u16(&self.data[12..14]))
      }
      _ => None,
    }
  }

  pub fn comment(&self) -> Option<String> {
    (self.function == COMMENT_LABEL).then(|| String::from_utf8_lossy(&self.data).into_owned())
  }
}
