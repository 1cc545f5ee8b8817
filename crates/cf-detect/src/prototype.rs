//! Fit-time analysis of a prototype.
//!
//! The prototype is filtered once per parameter tuple. Concentric circles
//! around the support center are then sampled, and every local maximum of the
//! strongest filtered value along a circle becomes a [`Tuple`].

use std::collections::HashSet;
use std::f64::consts::TAU;
use std::fmt;
use std::time::Instant;

use cf_core::ops::suppress_relative;
use cf_core::{Image, ImageView};
use cf_filter::{Filter, FilterFamily, FilterParams};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::observer::{StageObserver, record};
use crate::peaks::circular_peaks;

/// Number of angular samples taken on each circle.
pub const CIRCLE_SAMPLES: usize = 360;

/// Polar offset from the support center plus the filter that fired there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    pub rho: f64,
    /// `atan2(dy, dx)` of the pixel offset in `[0, 2π)`; image y points down.
    pub phi: f64,
    pub params: FilterParams,
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(rho={}, phi={:.4}, {})", self.rho, self.phi, self.params)
    }
}

/// The prototype filtered once per parameter tuple, weak values suppressed.
#[derive(Debug, Clone)]
pub struct FilteredPrototypes {
    layers: Vec<(FilterParams, Image<f32>)>,
}

impl FilteredPrototypes {
    /// Filters `prototype` with every params tuple, in parallel.
    ///
    /// In each filtered image, values below `t2` times its own maximum are
    /// set to zero. Layers keep the order of `params`.
    pub fn build<F: FilterFamily>(
        prototype: &ImageView<'_, f32>,
        family: &F,
        params: &[FilterParams],
        t2: f32,
    ) -> Result<Self> {
        let layers = params
            .par_iter()
            .map(|p| -> Result<(FilterParams, Image<f32>)> {
                let filter = family.build(p)?;
                let mut img = filter.apply(prototype);
                suppress_relative(&mut img, t2);
                Ok((p.clone(), img))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> impl Iterator<Item = (&FilterParams, &Image<f32>)> {
        self.layers.iter().map(|(p, img)| (p, img))
    }

    /// Largest strictly positive value at `(x, y)` over all layers.
    ///
    /// The last layer in expansion order wins ties. `None` when no layer is
    /// positive there or the point lies outside the prototype.
    pub fn strongest_at(&self, x: isize, y: isize) -> Option<(f32, &FilterParams)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);

        let mut best: Option<(f32, &FilterParams)> = None;
        for (params, img) in self.layers.iter().rev() {
            let Some(&v) = img.get(x, y) else {
                return None;
            };
            if v > best.map_or(0.0, |(b, _)| b) {
                best = Some((v, params));
            }
        }
        best
    }
}

/// Distinct pixels on the circle of radius `rho` around `center`.
///
/// Sample `i` sits at angle `i / 360 * 2π`; coordinates are rounded half to
/// even and duplicates keep their first position.
pub fn circle_points(center: (usize, usize), rho: u32) -> Vec<(isize, isize)> {
    let (cx, cy) = (center.0 as isize, center.1 as isize);
    let r = rho as f64;

    let mut seen = HashSet::with_capacity(CIRCLE_SAMPLES);
    let mut points = Vec::new();
    for i in 0..CIRCLE_SAMPLES {
        let phi = i as f64 / CIRCLE_SAMPLES as f64 * TAU;
        let p = (
            cx + (r * phi.cos()).round_ties_even() as isize,
            cy + (r * phi.sin()).round_ties_even() as isize,
        );
        if seen.insert(p) {
            points.push(p);
        }
    }
    points
}

/// Collects tuples for every radius in `rho_list`, smallest radius first.
///
/// `rho == 0` yields at most one tuple at the center, kept only when its
/// value exceeds `t1`. Larger radii yield one tuple per circular peak.
pub fn find_tuples(
    stack: &FilteredPrototypes,
    center: (usize, usize),
    rho_list: &[u32],
    t1: f32,
    observer: &mut dyn StageObserver,
) -> Vec<Tuple> {
    let (cx, cy) = (center.0 as isize, center.1 as isize);
    let mut radii = rho_list.to_vec();
    radii.sort_unstable();

    let mut tuples = Vec::new();
    for rho in radii {
        let start = Instant::now();
        let before = tuples.len();

        if rho == 0 {
            if let Some((v, params)) = stack.strongest_at(cx, cy)
                && v > t1
            {
                tuples.push(Tuple {
                    rho: 0.0,
                    phi: 0.0,
                    params: params.clone(),
                });
            }
        } else {
            let points = circle_points(center, rho);
            let strongest: Vec<_> = points
                .iter()
                .map(|&(x, y)| stack.strongest_at(x, y))
                .collect();
            let values: Vec<f32> = strongest
                .iter()
                .map(|s| s.map_or(0.0, |(v, _)| v))
                .collect();

            for i in circular_peaks(&values) {
                let Some((_, params)) = strongest[i] else {
                    continue;
                };
                let (x, y) = points[i];
                let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
                tuples.push(Tuple {
                    rho: rho as f64,
                    phi: dy.atan2(dx).rem_euclid(TAU),
                    params: params.clone(),
                });
            }
        }

        let found = tuples.len() - before;
        if found == 0 {
            warn!("no tuples found at rho={rho}");
        } else {
            debug!("rho={rho}: {found} tuple(s)");
        }
        record(observer, &format!("tuples rho={rho}"), start);
    }

    tuples
}
