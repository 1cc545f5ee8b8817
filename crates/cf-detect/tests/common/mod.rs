use cf_core::Image;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Zero image with one bright line segment of the given half length.
///
/// The segment passes through `(cx, cy)` at angle `theta` (radians,
/// counter-clockwise on screen).
pub fn segment(
    width: usize,
    height: usize,
    (cx, cy): (f64, f64),
    theta: f64,
    half_len: f64,
) -> Image<f32> {
    let (s, c) = theta.sin_cos();
    Image::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = -(y as f64 - cy);
        let along = dx * c + dy * s;
        let across = -dx * s + dy * c;
        if along.abs() <= half_len && across.abs() <= 0.5 {
            1.0
        } else {
            0.0
        }
    })
}

pub fn vertical_line(size: usize) -> Image<f32> {
    Image::from_fn(size, size, |x, _| if x == size / 2 { 1.0 } else { 0.0 })
}
