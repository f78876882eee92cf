#![deny(clippy::all)]

//! Progressive GIF decoding.
//!
//! Bytes are appended to a [`GifStream`] as they arrive, in chunks of any
//! size. Each [`GifStream::decode_more`] call commits every complete record
//! that is buffered, and [`GifStream::canvas_for_elapsed`] composites the
//! frame due at a given playback time into a BGRA canvas.
//!
//! ```
//! use gif_stream::GifStream;
//!
//! let stream = GifStream::new();
//! stream.append_bytes(b"GIF89a");
//! assert!(stream.decode_more().unwrap());
//! assert_eq!(stream.frame_count().unwrap(), 0);
//! ```

mod bit_reader;
pub mod clock;
pub mod compositor;
pub mod error;
pub mod feed;
pub mod format;
pub mod lzw;
#[cfg(feature = "node")]
pub mod node;
pub mod options;
pub mod parser;
pub mod source;
pub mod store;
pub mod stream;

pub use clock::{AnimationClock, Tick};
pub use compositor::{Canvas, Compositor};
pub use error::{DecodeError, Result};
pub use feed::{pump, CancelToken, FeedOutcome};
pub use format::{
  Color, ColorTable, DisposalMethod, ExtensionBlock, GraphicControl, ImageDescriptor, LogicalScreenDescriptor,
  Version,
};
pub use options::DecoderOptions;
pub use parser::{Parser, Progress};
pub use source::ByteSource;
pub use store::{Frame, FrameStore};
pub use stream::{CanvasGuard, GifStream};
