use napi::bindgen_prelude::Buffer;
use napi::{Error, Result};
use napi_derive::napi;

use crate::error::DecodeError;
use crate::options::DecoderOptions;
use crate::stream::GifStream;

#[derive(Default, Clone)]
#[napi(object)]
pub struct StreamOptions {
  pub round_to_even: Option<bool>,
  pub min_frame_delay_ms: Option<u32>,
  pub default_frame_delay_ms: Option<u32>,
  pub max_canvas_pixels: Option<u32>,
}

impl From<StreamOptions> for DecoderOptions {
  fn from(options: StreamOptions) -> Self {
    let defaults = DecoderOptions::default();
    DecoderOptions {
      round_to_even: options.round_to_even.unwrap_or(defaults.round_to_even),
      min_frame_delay_ms: options.min_frame_delay_ms.unwrap_or(defaults.min_frame_delay_ms),
      default_frame_delay_ms: options
        .default_frame_delay_ms
        .unwrap_or(defaults.default_frame_delay_ms),
      max_canvas_pixels: options
        .max_canvas_pixels
        .map_or(defaults.max_canvas_pixels, u64::from),
    }
  }
}

fn to_napi(err: DecodeError) -> Error {
  Error::from_reason(err.to_string())
}

#[napi(js_name = "GifStream")]
pub struct JsGifStream {
  inner: GifStream,
}

#[napi]
impl JsGifStream {
  #[napi(constructor)]
  pub fn new(options: Option<StreamOptions>) -> Self {
    Self {
      inner: GifStream::with_options(options.map(DecoderOptions::from).unwrap_or_default()),
    }
  }

  #[napi]
  pub fn append_bytes(&self, chunk: Buffer) {
    self.inner.append_bytes(&chunk);
  }

  #[napi]
  pub fn mark_finished(&self) {
    self.inner.mark_finished();
  }

  #[napi]
  pub fn decode_more(&self) -> Result<bool> {
    self.inner.decode_more().map_err(to_napi)
  }

  #[napi(getter)]
  pub fn width(&self) -> u32 {
    self.inner.width()
  }

  #[napi(getter)]
  pub fn height(&self) -> u32 {
    self.inner.height()
  }

  #[napi]
  pub fn frame_count(&self) -> Result<u32> {
    self.inner.frame_count().map(|count| count as u32).map_err(to_napi)
  }

  #[napi]
  pub fn frame_delay_ms(&self, index: u32) -> Result<u32> {
    self.inner.frame_delay_ms(index as usize).map_err(to_napi)
  }

  #[napi]
  pub fn is_fully_loaded(&self) -> bool {
    self.inner.is_fully_loaded()
  }

  #[napi]
  pub fn restart(&self) {
    self.inner.restart();
  }

  /// BGRA canvas for the given playback time, or `null` before the first frame.
  #[napi]
  pub fn canvas_for_elapsed(&self, total_elapsed_ms: f64) -> Result<Option<Buffer>> {
    let elapsed = total_elapsed_ms.max(0.0) as u64;
    let canvas = self.inner.canvas_for_elapsed(elapsed).map_err(to_napi)?;
    Ok(canvas.map(|canvas| Buffer::from(canvas.pixels().to_vec())))
  }
}
