use derivative::Derivative;

/// Decoder policy knobs. The defaults reproduce the behaviour browsers and
/// most GIF players agree on.
#[derive(Derivative, Clone, Copy, PartialEq, Eq)]
#[derivative(Default, Debug)]
pub struct DecoderOptions {
  /// Round odd logical screen dimensions up to the next even value.
  #[derivative(Default(value = "true"))]
  pub round_to_even: bool,
  /// Delays shorter than this are replaced by `default_frame_delay_ms`.
  #[derivative(Default(value = "20"))]
  pub min_frame_delay_ms: u32,
  /// Delay for frames with no graphic control block or a too-short delay.
  #[derivative(Default(value = "100"))]
  pub default_frame_delay_ms: u32,
  /// Upper bound on `width * height` of the logical screen.
  #[derivative(Default(value = "16_777_216"))]
  pub max_canvas_pixels: u64,
}

impl DecoderOptions {
  /// Converts a graphic control delay (hundredths of a second) into the
  /// effective display time in milliseconds.
  pub fn effective_delay_ms(&self, delay_cs: Option<u16>) -> u32 {
    match delay_cs {
      Some(cs) => {
        let ms = u32::from(cs) * 10;
        if ms < self.min_frame_delay_ms {
          self.default_frame_delay_ms
        } else {
          ms
        }
      }
      None => self.default_frame_delay_ms,
    }
  }
}
