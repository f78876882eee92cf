mod common;

use common::*;
use gif_stream::{DecoderOptions, GifStream};

fn decoded(bytes: &[u8]) -> GifStream {
  decoded_with(bytes, DecoderOptions {
    round_to_even: false,
    ..DecoderOptions::default()
  })
}

fn decoded_with(bytes: &[u8], options: DecoderOptions) -> GifStream {
  let stream = GifStream::from_bytes(bytes, options);
  stream.decode_all().unwrap();
  assert!(stream.is_fully_loaded());
  stream
}

fn row(stream: &GifStream, elapsed_ms: u64, y: u32) -> Vec<[u8; 4]> {
  let canvas = stream.canvas_for_elapsed(elapsed_ms).unwrap().unwrap();
  (0..canvas.width()).map(|x| canvas.pixel(x, y).unwrap()).collect()
}

#[test]
fn two_frame_scenario_shows_white_pixel_in_second_second() {
  let stream = decoded(&two_frame_scenario());
  assert_eq!(stream.frame_count().unwrap(), 2);
  assert_eq!(stream.frame_delay_ms(0).unwrap(), 1000);
  assert_eq!(stream.frame_delay_ms(1).unwrap(), 1000);

  {
    let canvas = stream.canvas_for_elapsed(0).unwrap().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (2, 2));
    assert_eq!(canvas.stride(), 8);
    assert!(canvas.pixels().chunks(4).all(|pixel| pixel == bgra(BLACK)));
  }

  let canvas = stream.canvas_for_elapsed(1500).unwrap().unwrap();
  assert_eq!(canvas.pixel(0, 0), Some(bgra(WHITE)));
  assert_eq!(canvas.pixel(1, 0), Some(bgra(BLACK)));
  assert_eq!(canvas.pixel(0, 1), Some(bgra(BLACK)));
  assert_eq!(canvas.pixel(1, 1), Some(bgra(BLACK)));
}

#[test]
fn no_disposal_accumulates_frames() {
  let bytes = GifBuilder::with_global_table(4, 1, &[RED, GREEN, BLUE, WHITE], 3)
    .graphic_control(DISPOSE_NONE, 10, None)
    .image(&ImageSpec::new(0, 0, 1, 1, vec![0]))
    .graphic_control(DISPOSE_NONE, 10, None)
    .image(&ImageSpec::new(1, 0, 1, 1, vec![1]))
    .graphic_control(DISPOSE_NONE, 10, Some(0))
    .image(&ImageSpec::new(0, 0, 3, 1, vec![0, 0, 2]))
    .finish();
  let stream = decoded(&bytes);
  assert_eq!(
    row(&stream, 300, 0),
    vec![bgra(RED), bgra(GREEN), bgra(BLUE), bgra(WHITE)]
  );
  // Jumping straight to frame 2 gives the same picture.
  stream.restart();
  assert_eq!(
    row(&stream, 250, 0),
    vec![bgra(RED), bgra(GREEN), bgra(BLUE), bgra(WHITE)]
  );
}

#[test]
fn restore_background_clears_before_next_frame() {
  let bytes = GifBuilder::with_global_table(2, 1, &[RED, GREEN, BLUE, WHITE], 3)
    .graphic_control(DISPOSE_BACKGROUND, 10, None)
    .image(&ImageSpec::new(0, 0, 2, 1, vec![0, 0]))
    .graphic_control(DISPOSE_NONE, 10, Some(0))
    .image(&ImageSpec::new(0, 0, 2, 1, vec![0, 1]))
    .finish();
  let stream = decoded(&bytes);
  assert_eq!(row(&stream, 50, 0), vec![bgra(RED), bgra(RED)]);
  assert_eq!(row(&stream, 150, 0), vec![bgra(WHITE), bgra(GREEN)]);
}

#[test]
fn restore_previous_skips_over_the_disposed_frame() {
  let bytes = GifBuilder::with_global_table(3, 1, &[RED, GREEN, BLUE, WHITE], 3)
    .graphic_control(DISPOSE_NONE, 10, None)
    .image(&ImageSpec::new(0, 0, 3, 1, vec![0, 1, 0]))
    .graphic_control(DISPOSE_PREVIOUS, 10, None)
    .image(&ImageSpec::new(0, 0, 2, 1, vec![2, 2]))
    .graphic_control(DISPOSE_NONE, 10, Some(3))
    .image(&ImageSpec::new(2, 0, 1, 1, vec![3]))
    .finish();
  let stream = decoded(&bytes);
  assert_eq!(row(&stream, 150, 0), vec![bgra(BLUE), bgra(BLUE), bgra(RED)]);
  assert_eq!(row(&stream, 250, 0), vec![bgra(RED), bgra(GREEN), bgra(RED)]);
  // Two frames ahead from a fresh start gives the same canvas.
  stream.restart();
  assert_eq!(row(&stream, 250, 0), vec![bgra(RED), bgra(GREEN), bgra(RED)]);
}

#[test]
fn looping_replays_from_the_first_frame() {
  let bytes = GifBuilder::with_global_table(1, 1, &[RED, GREEN], 0)
    .graphic_control(DISPOSE_NONE, 10, None)
    .image(&ImageSpec::new(0, 0, 1, 1, vec![0]))
    .graphic_control(DISPOSE_NONE, 10, None)
    .image(&ImageSpec::new(0, 0, 1, 1, vec![1]))
    .finish();
  let stream = decoded(&bytes);
  assert_eq!(row(&stream, 150, 0), vec![bgra(GREEN)]);
  assert_eq!(stream.current_frame(), 1);
  assert_eq!(row(&stream, 250, 0), vec![bgra(RED)]);
  assert_eq!(stream.current_frame(), 0);
}

#[test]
fn odd_screens_are_padded_with_background() {
  let bytes = GifBuilder::with_global_table(3, 1, &[RED, GREEN], 1)
    .image(&ImageSpec::new(0, 0, 3, 1, vec![0, 0, 0]))
    .finish();
  let stream = decoded_with(&bytes, DecoderOptions::default());
  assert_eq!((stream.width(), stream.height()), (4, 2));
  assert_eq!(
    row(&stream, 0, 0),
    vec![bgra(RED), bgra(RED), bgra(RED), bgra(GREEN)]
  );
  assert_eq!(row(&stream, 0, 1), vec![bgra(GREEN); 4]);
}

#[test]
fn canvas_follows_frames_as_they_stream_in() {
  let bytes = two_frame_scenario();
  let stream = GifStream::new();
  let split = bytes.len() - 1;
  let mut frame_counts = Vec::new();
  for piece in bytes[..split].chunks(3) {
    stream.append_bytes(piece);
    stream.decode_more().unwrap();
    let count = stream.frame_count().unwrap();
    frame_counts.push(count);
    // Past the end while loading holds on the newest frame.
    if let Some(canvas) = stream.canvas_for_elapsed(10_000).unwrap() {
      let expected = if count == 2 { WHITE } else { BLACK };
      assert_eq!(canvas.pixel(0, 0), Some(bgra(expected)));
    }
  }
  assert_eq!(frame_counts.last(), Some(&2));
  assert!(!stream.is_fully_loaded());

  stream.append_bytes(&bytes[split..]);
  assert!(!stream.decode_more().unwrap());
  assert!(stream.is_fully_loaded());
  // 10 s into a 2 s loop is the end of the second frame.
  assert_eq!(row(&stream, 10_000, 0), vec![bgra(WHITE), bgra(BLACK)]);
  assert_eq!(row(&stream, 10_001, 0), vec![bgra(BLACK), bgra(BLACK)]);
}
