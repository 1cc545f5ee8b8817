//! Per-image response cache.
//!
//! Each distinct filter is applied to the subject once. The result is gated
//! by `t1` and blurred once per `(scaled radius, params)` key; shift-combine
//! then only reads from the map.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use cf_core::ops::zero_below;
use cf_core::{Image, ImageView};
use cf_filter::kernels::blur_size;
use cf_filter::{Filter, FilterFamily, FilterParams, GaussianFilter};
use rayon::prelude::*;

use crate::Result;
use crate::config::CircleConfig;
use crate::observer::{StageObserver, record};
use crate::prototype::Tuple;

/// Cache key: radius after scaling plus the filter params.
///
/// Equality and hashing use the bit pattern of `scaled_radius`, so lookups
/// must compute the radius with the same expression as insertion.
#[derive(Debug, Clone)]
pub struct ResponseKey {
    pub scaled_radius: f64,
    pub params: FilterParams,
}

impl ResponseKey {
    pub fn new(scaled_radius: f64, params: FilterParams) -> Self {
        Self {
            scaled_radius,
            params,
        }
    }
}

impl PartialEq for ResponseKey {
    fn eq(&self, other: &Self) -> bool {
        self.scaled_radius.to_bits() == other.scaled_radius.to_bits()
            && self.params == other.params
    }
}

impl Eq for ResponseKey {}

impl Hash for ResponseKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scaled_radius.to_bits().hash(state);
        self.params.hash(state);
    }
}

pub type ResponseMap = HashMap<ResponseKey, Arc<Image<f32>>>;

/// `rho * upsilon`; the single place scaled radii are computed.
#[inline]
pub fn scaled_radius(rho: f64, upsilon: f64) -> f64 {
    rho * upsilon
}

struct BlurJob {
    source: usize,
    sigma: f32,
    /// `None` selects the default Gaussian footprint.
    size: Option<usize>,
    keys: Vec<ResponseKey>,
}

/// Builds the response map of `subject` for every tuple and scale factor.
///
/// With `alpha != 0` every key gets its own blur of
/// `sigma0 + scaled_radius * alpha`. With `alpha == 0` all keys sharing
/// params share one `sigma0` blur. A blur sigma of exactly zero stores the
/// gated filter response unblurred.
pub fn compute_responses<F: FilterFamily>(
    subject: &ImageView<'_, f32>,
    tuples: &[Tuple],
    family: &F,
    config: &CircleConfig,
    observer: &mut dyn StageObserver,
) -> Result<ResponseMap> {
    let start = Instant::now();

    let mut seen = HashSet::new();
    let distinct: Vec<&FilterParams> = tuples
        .iter()
        .map(|t| &t.params)
        .filter(|p| seen.insert(*p))
        .collect();

    let filtered = distinct
        .par_iter()
        .map(|p| -> Result<Arc<Image<f32>>> {
            let filter = family.build(p)?;
            let mut img = filter.apply(subject);
            zero_below(&mut img, config.t1);
            Ok(Arc::new(img))
        })
        .collect::<Result<Vec<_>>>()?;
    record(
        observer,
        &format!("apply {} filter(s)", filtered.len()),
        start,
    );

    let start = Instant::now();
    let jobs = plan_blurs(&distinct, tuples, config);
    let blurred = jobs
        .par_iter()
        .map(|job| -> Result<Arc<Image<f32>>> {
            let src = &filtered[job.source];
            if job.sigma == 0.0 {
                return Ok(Arc::clone(src));
            }
            let blur = match job.size {
                Some(size) => GaussianFilter::with_size(job.sigma, size)?,
                None => GaussianFilter::new(job.sigma)?,
            };
            Ok(Arc::new(blur.apply(&src.as_view())))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut responses = ResponseMap::new();
    for (job, img) in jobs.into_iter().zip(blurred) {
        for key in job.keys {
            responses.insert(key, Arc::clone(&img));
        }
    }
    record(
        observer,
        &format!("blur {} response(s)", responses.len()),
        start,
    );

    Ok(responses)
}

fn plan_blurs(distinct: &[&FilterParams], tuples: &[Tuple], config: &CircleConfig) -> Vec<BlurJob> {
    let source_of = |params: &FilterParams| {
        distinct
            .iter()
            .position(|p| *p == params)
            .expect("tuple params were collected into the distinct list")
    };

    let mut seen = HashSet::new();
    let mut jobs = Vec::new();

    if config.alpha != 0.0 {
        for t in tuples {
            for &upsilon in &config.scales {
                let scaled = scaled_radius(t.rho, upsilon);
                let key = ResponseKey::new(scaled, t.params.clone());
                if !seen.insert(key.clone()) {
                    continue;
                }
                let sigma = (config.sigma0 as f64 + scaled * config.alpha as f64) as f32;
                jobs.push(BlurJob {
                    source: source_of(&t.params),
                    sigma,
                    size: Some(blur_size(sigma)),
                    keys: vec![key],
                });
            }
        }
        return jobs;
    }

    let mut job_of: HashMap<usize, usize> = HashMap::new();
    for t in tuples {
        let source = source_of(&t.params);
        let j = match job_of.entry(source) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                jobs.push(BlurJob {
                    source,
                    sigma: config.sigma0,
                    size: None,
                    keys: Vec::new(),
                });
                *e.insert(jobs.len() - 1)
            }
        };
        for &upsilon in &config.scales {
            let key = ResponseKey::new(scaled_radius(t.rho, upsilon), t.params.clone());
            if seen.insert(key.clone()) {
                jobs[j].keys.push(key);
            }
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cf_core::Image;
    use cf_filter::{FilterKind, FilterParams};

    use super::{ResponseKey, compute_responses};
    use crate::config::CircleConfig;
    use crate::observer::{NoopObserver, TimingBreakdown};
    use crate::prototype::Tuple;

    fn tuple(rho: f64, params: &[f32]) -> Tuple {
        Tuple {
            rho,
            phi: 0.0,
            params: FilterParams::new(params.to_vec()),
        }
    }

    fn subject() -> Image<f32> {
        Image::from_fn(24, 20, |x, y| ((x * 7 + y * 3) % 5) as f32 - 1.0)
    }

    #[test]
    fn one_key_per_scaled_radius_and_params() {
        let tuples = [tuple(0.0, &[1.0]), tuple(2.0, &[1.0]), tuple(2.0, &[2.0])];
        let cfg = CircleConfig {
            filter: FilterKind::Gaussian,
            sigma0: 0.5,
            alpha: 0.1,
            scales: vec![1.0, 2.0],
            ..CircleConfig::default()
        };
        let img = subject();
        let mut timings = TimingBreakdown::default();
        let map = compute_responses(&img.as_view(), &tuples, &FilterKind::Gaussian, &cfg, &mut timings)
            .expect("valid filters");

        // rho 0 collapses across scales: (0,[1]), (2,[1]), (4,[1]), (2,[2]), (4,[2]).
        assert_eq!(map.len(), 5);
        for key in map.keys() {
            let r = &map[key];
            assert_eq!(r.shape(), img.shape());
            assert!(r.data().iter().all(|&v| v >= 0.0));
        }
        assert_eq!(timings.stages.len(), 2);
    }

    #[test]
    fn zero_alpha_shares_one_buffer_across_scales() {
        let tuples = [tuple(2.0, &[1.0]), tuple(4.0, &[1.0])];
        let cfg = CircleConfig {
            sigma0: 1.0,
            alpha: 0.0,
            scales: vec![1.0, 1.5],
            ..CircleConfig::default()
        };
        let img = subject();
        let map = compute_responses(&img.as_view(), &tuples, &FilterKind::Gaussian, &cfg, &mut NoopObserver)
            .expect("valid filters");

        assert_eq!(map.len(), 4);
        let p = FilterParams::new(vec![1.0]);
        let a = &map[&ResponseKey::new(2.0, p.clone())];
        let b = &map[&ResponseKey::new(6.0, p)];
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn zero_sigma_keeps_gated_response() {
        let tuples = [tuple(0.0, &[1.0])];
        let cfg = CircleConfig {
            t1: 0.5,
            ..CircleConfig::default()
        };
        let img = subject();
        let map = compute_responses(&img.as_view(), &tuples, &FilterKind::Gaussian, &cfg, &mut NoopObserver)
            .expect("valid filters");

        let r = &map[&ResponseKey::new(0.0, FilterParams::new(vec![1.0]))];
        assert!(r.data().iter().all(|&v| v == 0.0 || v >= 0.5));
    }

    #[test]
    fn invalid_params_fail() {
        let tuples = [tuple(0.0, &[-1.0])];
        let img = subject();
        let cfg = CircleConfig::default();
        assert!(
            compute_responses(&img.as_view(), &tuples, &FilterKind::Gaussian, &cfg, &mut NoopObserver)
                .is_err()
        );
    }
}
