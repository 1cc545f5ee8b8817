//! Whole-image pixel operations.
//!
//! All functions preserve the input shape. Binary operations require equal
//! shapes and report [`Error::ShapeMismatch`] otherwise.

use crate::border::{BorderMode, map_index};
use crate::image::{Image, ImageView};
use crate::{Error, Result};

/// Cyclically shifts `src` by `(dx, dy)` pixels.
///
/// `out(x, y) = src((x - dx) mod w, (y - dy) mod h)`, so positive `dx` moves
/// content to the right and positive `dy` moves it down. Shifting back by
/// `(-dx, -dy)` restores the input exactly.
pub fn shift_image<T: Copy>(src: &ImageView<'_, T>, dx: isize, dy: isize) -> Image<T> {
    let (w, h) = src.shape();
    if w == 0 || h == 0 {
        return src.to_image();
    }

    let wrap = BorderMode::<T>::Wrap;
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        let sy = map_index(y as isize - dy, h, &wrap).expect("wrap maps non-empty axis");
        let row = src.row(sy);
        let sx0 = map_index(-dx, w, &wrap).expect("wrap maps non-empty axis");
        // Row rotation: `row[sx0..]` followed by `row[..sx0]`.
        data.extend_from_slice(&row[sx0..]);
        data.extend_from_slice(&row[..sx0]);
    }

    Image::from_vec(w, h, data).expect("shifted buffer matches source shape")
}

/// Replaces every value below `min` with `min`.
pub fn clip_below(img: &mut Image<f32>, min: f32) {
    for v in img.data_mut() {
        if *v < min {
            *v = min;
        }
    }
}

/// Sets every value strictly below `threshold` to zero.
pub fn zero_below(img: &mut Image<f32>, threshold: f32) {
    for v in img.data_mut() {
        if *v < threshold {
            *v = 0.0;
        }
    }
}

/// Zeroes values below `fraction * max(img)`.
pub fn suppress_relative(img: &mut Image<f32>, fraction: f32) {
    if let Some(max) = max_value(img.data()) {
        zero_below(img, fraction * max);
    }
}

pub fn max_value(data: &[f32]) -> Option<f32> {
    data.iter().copied().reduce(f32::max)
}

pub fn min_value(data: &[f32]) -> Option<f32> {
    data.iter().copied().reduce(f32::min)
}

/// Maps the value range onto `[0, 1]`.
///
/// Degenerate inputs do not fail: an all-zero image is returned unchanged and
/// a constant non-zero image is divided by that constant.
pub fn normalize(src: &Image<f32>) -> Image<f32> {
    let (Some(mn), Some(mx)) = (min_value(src.data()), max_value(src.data())) else {
        return src.clone();
    };

    let mut out = src.clone();
    if mn == mx {
        if mn != 0.0 {
            for v in out.data_mut() {
                *v /= mn;
            }
        }
        return out;
    }

    let range = mx - mn;
    for v in out.data_mut() {
        *v = (*v - mn) / range;
    }
    out
}

/// [`normalize`] followed by an affine map onto `[lo, hi]`.
pub fn rescale(src: &Image<f32>, lo: f32, hi: f32) -> Image<f32> {
    let mut out = normalize(src);
    let span = hi - lo;
    for v in out.data_mut() {
        *v = *v * span + lo;
    }
    out
}

/// Binary map: `on` where `value > cut`, `off` elsewhere.
pub fn threshold(src: &Image<f32>, cut: f32, on: f32, off: f32) -> Image<f32> {
    let mut out = src.clone();
    for v in out.data_mut() {
        *v = if *v > cut { on } else { off };
    }
    out
}

fn check_shape(a: (usize, usize), b: (usize, usize)) -> Result<()> {
    if a != b {
        return Err(Error::ShapeMismatch { left: a, right: b });
    }
    Ok(())
}

/// `acc = max(acc, other)` elementwise.
pub fn max_assign(acc: &mut Image<f32>, other: &Image<f32>) -> Result<()> {
    check_shape(acc.shape(), other.shape())?;
    for (a, &b) in acc.data_mut().iter_mut().zip(other.data()) {
        *a = a.max(b);
    }
    Ok(())
}

/// `acc += other` elementwise.
pub fn add_assign(acc: &mut Image<f32>, other: &Image<f32>) -> Result<()> {
    check_shape(acc.shape(), other.shape())?;
    for (a, &b) in acc.data_mut().iter_mut().zip(other.data()) {
        *a += b;
    }
    Ok(())
}

/// `acc *= other` elementwise.
pub fn mul_assign(acc: &mut Image<f32>, other: &Image<f32>) -> Result<()> {
    check_shape(acc.shape(), other.shape())?;
    for (a, &b) in acc.data_mut().iter_mut().zip(other.data()) {
        *a *= b;
    }
    Ok(())
}

/// Elementwise maximum over a non-empty sequence of equally shaped images.
pub fn max_reduce<I>(images: I) -> Result<Image<f32>>
where
    I: IntoIterator<Item = Image<f32>>,
{
    let mut iter = images.into_iter();
    let mut acc = iter.next().ok_or(Error::EmptyReduction)?;
    for img in iter {
        max_assign(&mut acc, &img)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn ramp(w: usize, h: usize) -> Image<f32> {
        Image::from_fn(w, h, |x, y| (y * w + x) as f32)
    }

    #[test]
    fn shift_matches_roll_semantics() {
        let img = ramp(4, 3);
        let shifted = shift_image(&img.as_view(), 1, 0);
        assert_eq!(shifted.row(0), &[3.0, 0.0, 1.0, 2.0]);

        let shifted = shift_image(&img.as_view(), 0, -1);
        assert_eq!(shifted.row(0), img.row(1));
        assert_eq!(shifted.row(2), img.row(0));
    }

    #[test]
    fn shift_is_self_inverse_under_negated_offsets() {
        let img = Image::from_fn(7, 5, |x, y| ((x * 31 + y * 17) % 11) as f32 - 3.5);
        for dx in -9isize..=9 {
            for dy in -6isize..=6 {
                let there = shift_image(&img.as_view(), dx, dy);
                let back = shift_image(&there.as_view(), -dx, -dy);
                assert_eq!(back, img, "dx={dx} dy={dy}");
            }
        }
    }

    #[test]
    fn gating_helpers() {
        let mut img = Image::from_vec(4, 1, vec![-1.0f32, 0.5, 2.0, 10.0]).expect("valid image");
        zero_below(&mut img, 0.5);
        assert_eq!(img.data(), &[0.0, 0.5, 2.0, 10.0]);

        suppress_relative(&mut img, 0.2);
        assert_eq!(img.data(), &[0.0, 0.0, 2.0, 10.0]);

        let mut neg = Image::from_vec(2, 1, vec![-3.0f32, 1.0]).expect("valid image");
        clip_below(&mut neg, 0.0);
        assert_eq!(neg.data(), &[0.0, 1.0]);
    }

    #[test]
    fn normalize_degenerate_inputs() {
        let zeros = Image::new_fill(3, 2, 0.0f32);
        assert_eq!(normalize(&zeros), zeros);

        let constant = Image::new_fill(3, 2, 4.0f32);
        assert!(normalize(&constant).data().iter().all(|&v| v == 1.0));

        let img = Image::from_vec(3, 1, vec![2.0f32, 4.0, 6.0]).expect("valid image");
        let scaled = rescale(&img, 0.0, 255.0);
        assert_abs_diff_eq!(scaled.data()[0], 0.0);
        assert_abs_diff_eq!(scaled.data()[1], 127.5);
        assert_abs_diff_eq!(scaled.data()[2], 255.0);
    }

    #[test]
    fn binary_ops_check_shapes() {
        let mut a = Image::new_fill(2, 2, 1.0f32);
        let b = Image::new_fill(2, 3, 1.0f32);
        assert!(max_assign(&mut a, &b).is_err());
        assert!(add_assign(&mut a, &b).is_err());

        let c = Image::from_vec(2, 2, vec![0.0f32, 3.0, -1.0, 2.0]).expect("valid image");
        max_assign(&mut a, &c).expect("same shape");
        assert_eq!(a.data(), &[1.0, 3.0, 1.0, 2.0]);

        let t = threshold(&c, 1.0, 255.0, 0.0);
        assert_eq!(t.data(), &[0.0, 255.0, 0.0, 255.0]);

        assert!(max_reduce(Vec::new()).is_err());
        let m = max_reduce(vec![c.clone(), Image::new_fill(2, 2, 2.5)]).expect("non-empty");
        assert_eq!(m.data(), &[2.5, 3.0, 2.5, 2.5]);
    }
}
