use thiserror::Error;

/// Fatal decode failures.
///
/// Running out of input while the stream is still open is not an error; the
/// parser rolls back to its last checkpoint and reports `Progress::Pending`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
  #[error("not a GIF stream: signature {0:?}")]
  NotGif([u8; 6]),

  #[error("stream ended after mark_finished: needed {needed} bytes, {available} left")]
  Truncated { needed: usize, available: usize },

  #[error("logical screen {width}x{height} exceeds the {limit} pixel limit")]
  CanvasTooLarge { width: u32, height: u32, limit: u64 },

  #[error("invalid image descriptor: {width}x{height} at ({left}, {top}) on a {screen_width}x{screen_height} screen")]
  InvalidGeometry {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    screen_width: u32,
    screen_height: u32,
  },

  #[error("graphic control block must be 4 bytes, got {0}")]
  InvalidGraphicControl(usize),

  #[error("LZW minimum code size {0} is outside 1..=8")]
  InvalidCodeSize(u8),

  #[error("LZW code width grew past 12 bits")]
  CodeWidthOverflow,

  #[error("LZW prefix chain deeper than the code table")]
  PrefixChainTooDeep,

  #[error("LZW code {code} is past the next assignable code {next}")]
  InvalidCode { code: u16, next: u16 },

  #[error("LZW end-of-information code with {remaining} pixels still expected")]
  PrematureEndOfInformation { remaining: usize },

  #[error("image data ended with {remaining} pixels still expected")]
  MissingImageData { remaining: usize },

  #[error("frame store holds {frames} frames but {images} images were parsed")]
  FrameCountMismatch { frames: usize, images: usize },

  #[error("frame index {index} out of range ({count} frames)")]
  FrameOutOfRange { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Why a parse attempt stopped before reaching its next checkpoint.
#[derive(Debug)]
pub(crate) enum Halt {
  /// Not enough bytes yet; revert and retry once more arrive.
  Pending,
  Failed(DecodeError),
}

impl From<DecodeError> for Halt {
  fn from(err: DecodeError) -> Self {
    Halt::Failed(err)
  }
}

pub(crate) type ParseResult<T> = std::result::Result<T, Halt>;
