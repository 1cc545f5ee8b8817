//! Shift-and-combine for one rotation/scale variation.

use cf_core::Image;
use cf_core::ops::{clip_below, shift_image};
use serde::{Deserialize, Serialize};

use crate::config::CombineMethod;
use crate::prototype::Tuple;
use crate::responses::{ResponseKey, ResponseMap, scaled_radius};
use crate::{DetectError, Result};

/// One element of the rotation × scale invariance set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// Rotation offset added to every tuple angle, radians.
    pub psi: f64,
    /// Scale factor applied to every tuple radius.
    pub upsilon: f64,
}

/// Cartesian product `rotations × scales`, rotation outermost.
pub fn variations(rotations: &[f64], scales: &[f64]) -> Vec<Variation> {
    rotations
        .iter()
        .flat_map(|&psi| scales.iter().map(move |&upsilon| Variation { psi, upsilon }))
        .collect()
}

/// Pixel offset of the polar position `(rho, phi)`.
///
/// `dy` is negated: angles are read with y pointing up, while tuple angles
/// are measured with image y pointing down. Tuples of a prototype that is
/// not symmetric about its horizontal axis therefore match its vertical
/// mirror image.
pub fn pixel_shift(rho: f64, phi: f64) -> (isize, isize) {
    let dx = (rho * phi.cos()).round_ties_even() as isize;
    let dy = (-rho * phi.sin()).round_ties_even() as isize;
    (dx, dy)
}

/// Combined response of every tuple under `variation`.
///
/// Each tuple's cached response is shifted so its contribution lands on the
/// support center, clipped at zero, and the results are merged with a
/// (weighted) geometric mean.
pub fn shift_combine(
    responses: &ResponseMap,
    tuples: &[Tuple],
    variation: Variation,
    method: CombineMethod,
) -> Result<Image<f32>> {
    if tuples.is_empty() {
        return Err(DetectError::EmptyTuples);
    }

    let radii: Vec<f64> = tuples
        .iter()
        .map(|t| scaled_radius(t.rho, variation.upsilon))
        .collect();
    let weights = match method {
        CombineMethod::Geometric => vec![1.0; tuples.len()],
        CombineMethod::WeightedGeometric => radius_weights(&radii),
    };

    let mut acc: Option<(usize, usize, Vec<f64>)> = None;
    for ((t, &scaled), &w) in tuples.iter().zip(&radii).zip(&weights) {
        let key = ResponseKey::new(scaled, t.params.clone());
        let Some(response) = responses.get(&key) else {
            return Err(DetectError::MissingResponse {
                scaled_radius: scaled,
                params: t.params.clone(),
            });
        };

        let (dx, dy) = pixel_shift(scaled, t.phi + variation.psi);
        let mut shifted = shift_image(&response.as_view(), -dx, -dy);
        clip_below(&mut shifted, 0.0);

        let (w_px, h_px, prod) = acc.get_or_insert_with(|| {
            (shifted.width(), shifted.height(), vec![1.0; shifted.data().len()])
        });
        if (*w_px, *h_px) != shifted.shape() {
            return Err(cf_core::Error::ShapeMismatch {
                left: (*w_px, *h_px),
                right: shifted.shape(),
            }
            .into());
        }

        match method {
            CombineMethod::Geometric => {
                for (p, &v) in prod.iter_mut().zip(shifted.data()) {
                    *p *= v as f64;
                }
            }
            CombineMethod::WeightedGeometric => {
                for (p, &v) in prod.iter_mut().zip(shifted.data()) {
                    *p *= (v as f64).powf(w);
                }
            }
        }
    }

    let total: f64 = weights.iter().sum();
    let (w_px, h_px, prod) = acc.ok_or(DetectError::EmptyTuples)?;
    let exponent = 1.0 / total;
    let data = prod.into_iter().map(|p| p.powf(exponent) as f32).collect();
    Ok(Image::from_vec(w_px, h_px, data)?)
}

/// `exp(-rho^2 / (2 (rho_max / 3)^2))`; all ones when every radius is zero.
fn radius_weights(radii: &[f64]) -> Vec<f64> {
    let rho_max = radii.iter().copied().fold(0.0, f64::max);
    let denom = 2.0 * (rho_max / 3.0).powi(2);
    if denom == 0.0 {
        return vec![1.0; radii.len()];
    }
    radii.iter().map(|r| (-(r * r) / denom).exp()).collect()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use cf_core::Image;
    use cf_filter::FilterParams;

    use super::*;

    fn params() -> FilterParams {
        FilterParams::new(vec![1.0])
    }

    fn tuple(rho: f64, phi: f64) -> Tuple {
        Tuple {
            rho,
            phi,
            params: params(),
        }
    }

    fn dot(w: usize, h: usize, x: usize, y: usize, v: f32) -> Image<f32> {
        Image::from_fn(w, h, |px, py| if (px, py) == (x, y) { v } else { 0.0 })
    }

    #[test]
    fn variations_put_rotation_outermost() {
        let v = variations(&[0.0, 1.0], &[1.0, 2.0, 3.0]);
        assert_eq!(v.len(), 6);
        assert_eq!(v[1], Variation { psi: 0.0, upsilon: 2.0 });
        assert_eq!(v[3], Variation { psi: 1.0, upsilon: 1.0 });
    }

    #[test]
    fn pixel_shift_points_up_for_quarter_turn() {
        assert_eq!(pixel_shift(4.0, 0.0), (4, 0));
        assert_eq!(pixel_shift(4.0, FRAC_PI_2), (0, -4));
        assert_eq!(pixel_shift(4.0, PI), (-4, 0));
        assert_eq!(pixel_shift(2.0, 3.0 * FRAC_PI_2), (0, 2));
    }

    #[test]
    fn equal_responses_give_their_value() {
        let img = Arc::new(Image::new_fill(6, 5, 0.7f32));
        let mut map = ResponseMap::new();
        map.insert(ResponseKey::new(0.0, params()), Arc::clone(&img));
        map.insert(ResponseKey::new(2.0, params()), img);

        let tuples = [tuple(0.0, 0.0), tuple(2.0, 0.0), tuple(2.0, PI)];
        let v = Variation { psi: 0.0, upsilon: 1.0 };
        for method in [CombineMethod::Geometric, CombineMethod::WeightedGeometric] {
            let out = shift_combine(&map, &tuples, v, method).expect("cached responses");
            assert_eq!(out.shape(), (6, 5));
            for &p in out.data() {
                assert_relative_eq!(p, 0.7, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn shifts_bring_responses_to_the_center() {
        // Response at (6, 4) belongs to the tuple two pixels right of center (4, 4).
        let mut map = ResponseMap::new();
        map.insert(ResponseKey::new(2.0, params()), Arc::new(dot(9, 9, 6, 4, 1.0)));
        map.insert(ResponseKey::new(0.0, params()), Arc::new(dot(9, 9, 4, 4, 1.0)));

        let tuples = [tuple(0.0, 0.0), tuple(2.0, 0.0)];
        let out = shift_combine(
            &map,
            &tuples,
            Variation { psi: 0.0, upsilon: 1.0 },
            CombineMethod::Geometric,
        )
        .expect("cached responses");
        assert_relative_eq!(*out.get(4, 4).expect("in bounds"), 1.0, max_relative = 1e-6);
        assert_eq!(out.data().iter().filter(|&&v| v > 0.0).count(), 1);

        // Rotating by π moves the expected contribution to the left of center.
        let out = shift_combine(
            &map,
            &tuples,
            Variation { psi: PI, upsilon: 1.0 },
            CombineMethod::Geometric,
        )
        .expect("cached responses");
        assert!(out.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn negative_responses_are_clipped() {
        let mut map = ResponseMap::new();
        map.insert(ResponseKey::new(0.0, params()), Arc::new(Image::new_fill(3, 3, -2.0f32)));
        map.insert(ResponseKey::new(1.0, params()), Arc::new(Image::new_fill(3, 3, 0.5f32)));
        let tuples = [tuple(0.0, 0.0), tuple(1.0, 0.0)];
        let v = Variation { psi: 0.0, upsilon: 1.0 };
        for method in [CombineMethod::Geometric, CombineMethod::WeightedGeometric] {
            let out = shift_combine(&map, &tuples, v, method).expect("cached responses");
            assert!(out.data().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn missing_and_empty_inputs_fail() {
        let map = ResponseMap::new();
        let v = Variation { psi: 0.0, upsilon: 1.0 };
        assert_eq!(
            shift_combine(&map, &[], v, CombineMethod::Geometric),
            Err(DetectError::EmptyTuples)
        );
        assert!(matches!(
            shift_combine(&map, &[tuple(2.0, 0.0)], v, CombineMethod::Geometric),
            Err(DetectError::MissingResponse { .. })
        ));
    }

    #[test]
    fn weights_decay_with_radius() {
        let w = radius_weights(&[0.0, 3.0, 9.0]);
        assert_eq!(w[0], 1.0);
        assert!(w[1] > w[2]);
        assert_relative_eq!(w[1], (-0.5f64).exp(), max_relative = 1e-12);
        assert_relative_eq!(w[2], (-4.5f64).exp(), max_relative = 1e-12);
        assert_eq!(radius_weights(&[0.0, 0.0]), vec![1.0, 1.0]);
    }
}
