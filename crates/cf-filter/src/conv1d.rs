use cf_core::{BorderMode, map_index};

/// 1D convolution `out[i] = sum_k kernel[k] * signal[i + radius - k]`.
///
/// `kernel.len()` must be odd; `radius = kernel.len() / 2`. Samples outside
/// the signal are resolved through `border`.
pub fn convolve_f32(signal: &[f32], kernel: &[f32], border: &BorderMode<f32>, out: &mut [f32]) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");
    assert!(kernel.len() % 2 == 1, "kernel len must be odd");

    let n = signal.len();
    if n == 0 {
        return;
    }

    let radius = kernel.len() / 2;
    let interior_start = radius.min(n);
    let interior_end = n.saturating_sub(radius).max(interior_start);

    for i in (0..interior_start).chain(interior_end..n) {
        out[i] = convolve_at_border(signal, kernel, radius, i, border);
    }

    // Full kernel footprint in bounds: `i - radius >= 0`, `i + radius < n`.
    let klen = kernel.len();
    for i in interior_start..interior_end {
        let window = &signal[i - radius..i - radius + klen];
        let mut acc = 0.0f32;
        for (s, k) in window.iter().zip(kernel.iter().rev()) {
            acc += s * k;
        }
        out[i] = acc;
    }
}

fn convolve_at_border(
    signal: &[f32],
    kernel: &[f32],
    radius: usize,
    i: usize,
    border: &BorderMode<f32>,
) -> f32 {
    let n = signal.len();
    let fill = match border {
        BorderMode::Constant(c) => *c,
        _ => 0.0,
    };

    let mut acc = 0.0f32;
    for (k, &kv) in kernel.iter().enumerate() {
        let idx = i as isize + radius as isize - k as isize;
        let v = match map_index(idx, n, border) {
            Some(j) => signal[j],
            None => fill,
        };
        acc += v * kv;
    }
    acc
}

#[cfg(test)]
mod tests {
    use cf_core::BorderMode;

    use crate::conv1d::convolve_f32;

    #[test]
    fn identity_kernel() {
        let signal = [1.0f32, 2.0, 3.0, 4.0];
        let mut out = vec![0.0f32; signal.len()];
        convolve_f32(&signal, &[1.0], &BorderMode::Wrap, &mut out);
        assert_eq!(&out, &signal);
    }

    #[test]
    fn constant_border() {
        let signal = [1.0f32, 2.0, 3.0];
        let mut out = vec![0.0f32; signal.len()];
        convolve_f32(&signal, &[1.0, 1.0, 1.0], &BorderMode::Constant(0.0), &mut out);
        assert_eq!(out, vec![3.0, 6.0, 5.0]);
    }

    #[test]
    fn reflect101_border() {
        let signal = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        let mut out = vec![0.0f32; signal.len()];
        convolve_f32(&signal, &[1.0, 1.0, 1.0], &BorderMode::Reflect101, &mut out);
        // Left: 2 + 1 + 2, right: 4 + 5 + 4.
        assert_eq!(out, vec![5.0, 6.0, 9.0, 12.0, 13.0]);
    }

    #[test]
    fn kernel_is_flipped() {
        let signal = [0.0f32, 0.0, 1.0, 0.0, 0.0];
        let mut out = vec![0.0f32; signal.len()];
        convolve_f32(&signal, &[1.0, 2.0, 3.0], &BorderMode::Constant(0.0), &mut out);
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn kernel_longer_than_signal() {
        let signal = [1.0f32, 1.0];
        let mut out = vec![0.0f32; signal.len()];
        convolve_f32(&signal, &[1.0; 7], &BorderMode::Wrap, &mut out);
        assert_eq!(out, vec![7.0, 7.0]);
    }
}
