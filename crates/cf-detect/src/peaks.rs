//! Local maxima of a cyclic sequence.

/// Values closer than this are treated as equal.
pub const PEAK_TOLERANCE: f32 = 5e-5;

/// Indices of local maxima of the cyclic sequence `values`.
///
/// An index is a peak when both cyclic neighbors are lower by more than
/// [`PEAK_TOLERANCE`]. Inside a flat run (both neighbors within tolerance) an
/// index is a peak when it sits at the center of the run: `l` equal values to
/// its left and `r` to its right with `l == r` or `l + 1 == r`, and neither
/// bounding value higher than the run.
///
/// If measuring a run wraps around the whole sequence, the scan stops and
/// only the peaks found so far are returned. A constant sequence therefore
/// has no peaks.
pub fn circular_peaks(values: &[f32]) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    if n == 0 {
        return peaks;
    }

    let d = PEAK_TOLERANCE;
    let at = |k: isize| values[k.rem_euclid(n as isize) as usize];

    for (i, &v) in values.iter().enumerate() {
        let ii = i as isize;
        let prev = at(ii - 1);
        let next = at(ii + 1);

        if prev + d < v && next + d < v {
            peaks.push(i);
            continue;
        }
        if (prev - v).abs() >= d || (next - v).abs() >= d {
            continue;
        }

        let Some(l) = plateau_run(&at, ii, v, -1, n) else {
            return peaks;
        };
        let Some(r) = plateau_run(&at, ii, v, 1, n) else {
            return peaks;
        };
        if l > 0 && r > 0 && (l == r || l + 1 == r) {
            peaks.push(i);
        }
    }

    peaks
}

/// Length of the near-equal run next to `i` in direction `dir`.
///
/// `Some(0)` when the run is bounded by a higher value, `None` when the run
/// covers the whole sequence.
fn plateau_run(at: &impl Fn(isize) -> f32, i: isize, v: f32, dir: isize, n: usize) -> Option<usize> {
    let d = PEAK_TOLERANCE;
    let mut run = 0usize;
    let mut k = 1usize;
    while k < n && (at(i + dir * k as isize) - v).abs() < d {
        run += 1;
        k += 1;
    }
    if k == n {
        return None;
    }
    if at(i + dir * k as isize) > v + d {
        run = 0;
    }
    Some(run)
}
