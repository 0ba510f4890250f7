use image::{ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realign::overlay::{BACKGROUND, EDGE};
use realign::{
    build_overlay, encode_base64, estimate_alignment, extract_features, Horizontal, Pipeline,
    RealignError,
};
use std::io::Cursor;

const CELL: usize = 12;
const MARGIN: usize = 64;

/// Random mosaic of flat cells, large enough to crop shifted frames from.
struct Scene {
    cells: Vec<u8>,
    cols: usize,
}

impl Scene {
    fn new(seed: u64, width: usize, height: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let cols = (width + 2 * MARGIN) / CELL + 1;
        let rows = (height + 2 * MARGIN) / CELL + 1;
        let cells = (0..cols * rows).map(|_| rng.random_range(0..=255u8)).collect();
        Self { cells, cols }
    }

    /// Renders a frame whose content is moved by `(shift_x, shift_y)` pixels.
    fn frame(&self, width: u32, height: u32, shift_x: i32, shift_y: i32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let wx = (x as i32 + MARGIN as i32 - shift_x) as usize;
            let wy = (y as i32 + MARGIN as i32 - shift_y) as usize;
            let v = self.cells[(wy / CELL) * self.cols + wx / CELL];
            Rgb([v, v, v])
        })
    }
}

fn to_base64_png(img: &RgbImage) -> String {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    encode_base64(out.get_ref())
}

#[test]
fn identical_frame_is_aligned_exactly() {
    let scene = Scene::new(11, 240, 180);
    let encoded = to_base64_png(&scene.frame(240, 180, 0, 0));

    let reference = extract_features(&encoded).unwrap();
    assert!(reference.len() >= 10);

    let alignment = estimate_alignment(&reference, &encoded).unwrap();
    assert!(alignment.is_aligned);
    assert_eq!((alignment.dx, alignment.dy), (0, 0));
}

#[test]
fn small_shift_is_measured_and_tolerated() {
    let scene = Scene::new(23, 240, 180);
    let reference = extract_features(&to_base64_png(&scene.frame(240, 180, 0, 0))).unwrap();
    let current = to_base64_png(&scene.frame(240, 180, 5, 0));

    let est = Pipeline::default().estimate_motion(&reference, &current).unwrap();
    assert!(est.num_matches > 0 && est.num_matches <= 10);
    assert!((-6..=-4).contains(&est.dx), "dx = {}", est.dx);
    assert!((-1..=1).contains(&est.dy), "dy = {}", est.dy);
    assert!(est.is_aligned);
    assert_eq!(est.guidance().horizontal, None);
}

#[test]
fn large_shift_is_not_aligned() {
    let scene = Scene::new(37, 240, 180);
    let reference = extract_features(&to_base64_png(&scene.frame(240, 180, 0, 0))).unwrap();
    let current = to_base64_png(&scene.frame(240, 180, 50, 0));

    let est = Pipeline::default().estimate_motion(&reference, &current).unwrap();
    assert!(!est.is_aligned);
    assert!(est.dx < -10, "dx = {}", est.dx);
    assert_eq!(est.guidance().horizontal, Some(Horizontal::Left));
}

/// Dark frame with one centred checkerboard square of high-contrast cells,
/// moved right by `shift` pixels.
fn checkerboard_square(seed: u64, shift: i32) -> RgbImage {
    const SIDE: i32 = 100;
    const SQUARE_CELL: i32 = 10;
    let (width, height) = (240i32, 180i32);
    let mut rng = StdRng::seed_from_u64(seed);
    let per_side = (SIDE / SQUARE_CELL) as usize;
    let cells: Vec<u8> = (0..per_side * per_side)
        .map(|idx| {
            if (idx % per_side + idx / per_side) % 2 == 0 {
                rng.random_range(170..=255u8)
            } else {
                rng.random_range(0..=60u8)
            }
        })
        .collect();
    let (left, top) = ((width - SIDE) / 2, (height - SIDE) / 2);
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let sx = x as i32 - shift - left;
        let sy = y as i32 - top;
        if (0..SIDE).contains(&sx) && (0..SIDE).contains(&sy) {
            let idx = (sy / SQUARE_CELL) as usize * per_side + (sx / SQUARE_CELL) as usize;
            let v = cells[idx];
            Rgb([v, v, v])
        } else {
            Rgb([20, 20, 20])
        }
    })
}

#[test]
fn centred_square_shift_scenarios() {
    let reference = extract_features(&to_base64_png(&checkerboard_square(8, 0))).unwrap();
    assert!(reference.len() >= 2);

    let near = to_base64_png(&checkerboard_square(8, 5));
    let est = Pipeline::default().estimate_motion(&reference, &near).unwrap();
    assert!(est.is_aligned);
    assert!((-6..=-4).contains(&est.dx), "dx = {}", est.dx);
    assert!((-1..=1).contains(&est.dy), "dy = {}", est.dy);

    let far = to_base64_png(&checkerboard_square(8, 50));
    let est = Pipeline::default().estimate_motion(&reference, &far).unwrap();
    assert!(!est.is_aligned);
    assert!(est.dx < -10, "dx = {}", est.dx);
    assert_eq!(est.guidance().horizontal, Some(Horizontal::Left));
}

#[test]
fn blank_frame_has_no_matches() {
    let scene = Scene::new(5, 200, 150);
    let reference = extract_features(&to_base64_png(&scene.frame(200, 150, 0, 0))).unwrap();
    let blank = to_base64_png(&RgbImage::from_pixel(200, 150, Rgb([90, 90, 90])));

    assert!(extract_features(&blank).unwrap().is_empty());
    let err = estimate_alignment(&reference, &blank).unwrap_err();
    assert_eq!(err, RealignError::InsufficientMatches);
}

#[test]
fn overlay_matches_source_dimensions() {
    let scene = Scene::new(3, 160, 120);
    let (overlay, features) = build_overlay(&to_base64_png(&scene.frame(160, 120, 0, 0))).unwrap();
    assert!(!features.is_empty());

    let raw = realign::image::io::decode_base64(&overlay).unwrap();
    assert_eq!(raw.len(), 160 * 120 * 4);
    let mut edges = 0usize;
    for px in raw.chunks_exact(4) {
        assert!(px == BACKGROUND || px == EDGE);
        if px == EDGE {
            edges += 1;
        }
    }
    assert!(edges > 0);
}

#[test]
fn invalid_payloads_propagate_decode_errors() {
    let err = extract_features("definitely not base64").unwrap_err();
    assert!(matches!(err, RealignError::Decode { .. }));
    let err = build_overlay(&encode_base64(b"not an image")).unwrap_err();
    assert!(matches!(err, RealignError::UnsupportedFormat { .. }));
}
