//! 2D convolution on `f32` images, output shape equals input shape.

use cf_core::{BorderMode, Image, ImageView, map_index};

use crate::conv1d::convolve_f32;

/// Separable convolution: rows with `kx`, then columns with `ky`.
pub fn convolve_separable(
    src: &ImageView<'_, f32>,
    kx: &[f32],
    ky: &[f32],
    border: &BorderMode<f32>,
) -> Image<f32> {
    let (w, h) = src.shape();
    let mut tmp = Image::new_fill(w, h, 0.0f32);
    if w == 0 || h == 0 {
        return tmp;
    }

    for y in 0..h {
        convolve_f32(src.row(y), kx, border, tmp.row_mut(y));
    }

    let mut out = Image::new_fill(w, h, 0.0f32);
    let mut col = vec![0.0f32; h];
    let mut col_out = vec![0.0f32; h];
    for x in 0..w {
        for (y, c) in col.iter_mut().enumerate() {
            *c = tmp.data()[y * w + x];
        }
        convolve_f32(&col, ky, border, &mut col_out);
        for (y, &c) in col_out.iter().enumerate() {
            out.data_mut()[y * w + x] = c;
        }
    }
    out
}

/// Dense 2D convolution with an odd-sized kernel, anchored at its center.
///
/// `out(x, y) = sum K(kx, ky) * src(x + rx - kx, y + ry - ky)`.
pub fn convolve_dense(
    src: &ImageView<'_, f32>,
    kernel: &Image<f32>,
    border: &BorderMode<f32>,
) -> Image<f32> {
    assert!(
        kernel.width() % 2 == 1 && kernel.height() % 2 == 1,
        "kernel dimensions must be odd"
    );

    let (w, h) = src.shape();
    let rx = (kernel.width() / 2) as isize;
    let ry = (kernel.height() / 2) as isize;
    let fill = match border {
        BorderMode::Constant(c) => *c,
        _ => 0.0,
    };

    Image::from_fn(w, h, |x, y| {
        let mut acc = 0.0f32;
        for ky in 0..kernel.height() {
            let sy = map_index(y as isize + ry - ky as isize, h, border);
            let krow = kernel.row(ky);
            let Some(sy) = sy else {
                if fill != 0.0 {
                    acc += fill * krow.iter().sum::<f32>();
                }
                continue;
            };
            let srow = src.row(sy);
            for (kx, &kv) in krow.iter().enumerate() {
                let v = match map_index(x as isize + rx - kx as isize, w, border) {
                    Some(sx) => srow[sx],
                    None => fill,
                };
                acc += v * kv;
            }
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cf_core::{BorderMode, Image};

    use super::{convolve_dense, convolve_separable};

    #[test]
    fn separable_matches_dense_outer_product() {
        let src = Image::from_fn(9, 7, |x, y| ((x * 7 + y * 3) % 5) as f32);
        let kx = [0.25f32, 0.5, 0.25];
        let ky = [0.1f32, 0.2, 0.4, 0.2, 0.1];
        let dense = Image::from_fn(3, 5, |x, y| kx[x] * ky[y]);

        for border in [BorderMode::Constant(0.0), BorderMode::Reflect101] {
            let a = convolve_separable(&src.as_view(), &kx, &ky, &border);
            let b = convolve_dense(&src.as_view(), &dense, &border);
            for (va, vb) in a.data().iter().zip(b.data()) {
                assert_abs_diff_eq!(va, vb, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn dense_is_true_convolution() {
        let src = Image::from_fn(5, 5, |x, y| if (x, y) == (2, 2) { 1.0f32 } else { 0.0 });
        let kernel = Image::from_fn(3, 3, |x, y| (y * 3 + x) as f32);

        let out = convolve_dense(&src.as_view(), &kernel, &BorderMode::Constant(0.0));
        // An impulse reproduces the kernel unflipped around the impulse.
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(out.get(x + 1, y + 1), kernel.get(x, y));
            }
        }
        assert_eq!(out.get(0, 0), Some(&0.0));
    }
}
