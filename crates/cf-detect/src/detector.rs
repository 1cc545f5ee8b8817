use std::time::{Duration, Instant};

use cf_core::ops::max_reduce;
use cf_core::{Image, ImageView};
use cf_filter::{FilterError, FilterFamily, FilterKind};
use log::{debug, warn};
use rayon::prelude::*;

use crate::combine::{Variation, shift_combine, variations};
use crate::config::CircleConfig;
use crate::observer::{NoopObserver, StageObserver, record, record_elapsed};
use crate::prototype::{FilteredPrototypes, Tuple, find_tuples};
use crate::responses::compute_responses;
use crate::{DetectError, Result};

/// A detector fitted to one prototype.
///
/// Holds the filter family, the configuration used at apply time and the
/// tuple list discovered during fit. The tuple list never changes after fit;
/// [`FittedDetector::restrict`] builds a new detector instead.
#[derive(Debug, Clone)]
pub struct FittedDetector<F = FilterKind> {
    family: F,
    config: CircleConfig,
    tuples: Vec<Tuple>,
}

impl<F: FilterFamily> FittedDetector<F> {
    /// Detector with a precomputed tuple list, e.g. one loaded from disk.
    pub fn from_tuples(family: F, config: CircleConfig, tuples: Vec<Tuple>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            family,
            config,
            tuples,
        })
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn config(&self) -> &CircleConfig {
        &self.config
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    /// New detector keeping only the tuples matching `keep`.
    pub fn restrict(&self, keep: impl Fn(&Tuple) -> bool) -> Self
    where
        F: Clone,
    {
        Self {
            family: self.family.clone(),
            config: self.config.clone(),
            tuples: self.tuples.iter().filter(|&t| keep(t)).cloned().collect(),
        }
    }

    pub fn apply(&self, subject: &ImageView<'_, f32>) -> Result<Image<f32>> {
        self.apply_observed(subject, &mut NoopObserver)
    }

    /// Response map of `subject`, maximized over all variations.
    ///
    /// The output has the subject's shape and is not normalized.
    pub fn apply_observed(
        &self,
        subject: &ImageView<'_, f32>,
        observer: &mut dyn StageObserver,
    ) -> Result<Image<f32>> {
        if self.tuples.is_empty() {
            return Err(DetectError::EmptyTuples);
        }

        let responses =
            compute_responses(subject, &self.tuples, &self.family, &self.config, observer)?;

        let variations = variations(&self.config.rotations, &self.config.scales);
        let combined = variations
            .par_iter()
            .map(|&v| -> Result<(Image<f32>, Duration)> {
                let start = Instant::now();
                let img = shift_combine(&responses, &self.tuples, v, self.config.combine)?;
                Ok((img, start.elapsed()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut images = Vec::with_capacity(combined.len());
        for (v, (img, elapsed)) in variations.iter().zip(combined) {
            record_elapsed(observer, &variation_label(v), elapsed);
            images.push(img);
        }

        let start = Instant::now();
        let result = max_reduce(images)?;
        record(observer, "max over variations", start);
        Ok(result)
    }
}

fn variation_label(v: &Variation) -> String {
    format!("combine psi={:.2} upsilon={}", v.psi, v.upsilon)
}

/// Fits a detector using the built-in family selected by `config.filter`.
pub fn fit(prototype: &ImageView<'_, f32>, config: &CircleConfig) -> Result<FittedDetector> {
    fit_observed(prototype, config, &mut NoopObserver)
}

pub fn fit_observed(
    prototype: &ImageView<'_, f32>,
    config: &CircleConfig,
    observer: &mut dyn StageObserver,
) -> Result<FittedDetector> {
    fit_with_family(prototype, config, config.filter, observer)
}

/// Fits a detector with a caller-supplied filter family.
///
/// `config.filter` is ignored; every other setting applies.
pub fn fit_with_family<F: FilterFamily>(
    prototype: &ImageView<'_, f32>,
    config: &CircleConfig,
    family: F,
    observer: &mut dyn StageObserver,
) -> Result<FittedDetector<F>> {
    config.validate()?;

    let (w, h) = prototype.shape();
    let (cx, cy) = config.center;
    if cx >= w || cy >= h {
        return Err(DetectError::CenterOutsidePrototype {
            center: config.center,
            shape: (w, h),
        });
    }

    let params = config.domain.expand().map_err(|e| match e {
        FilterError::EmptyDomain => DetectError::EmptyDomain,
        other => other.into(),
    })?;

    let start = Instant::now();
    let stack = FilteredPrototypes::build(prototype, &family, &params, config.t2)?;
    record(
        observer,
        &format!("filter prototype with {} params", stack.len()),
        start,
    );

    let start = Instant::now();
    let tuples = find_tuples(&stack, config.center, &config.rho_list, config.t1, observer);
    record(
        observer,
        &format!("found {} tuples over {} radii", tuples.len(), config.rho_list.len()),
        start,
    );

    if tuples.is_empty() {
        warn!("fit produced no tuples; apply will fail");
    } else {
        debug!("fitted {} tuples", tuples.len());
    }

    Ok(FittedDetector {
        family,
        config: config.clone(),
        tuples,
    })
}

/// Free-function form of [`FittedDetector::apply`].
pub fn apply<F: FilterFamily>(
    detector: &FittedDetector<F>,
    subject: &ImageView<'_, f32>,
) -> Result<Image<f32>> {
    detector.apply(subject)
}

pub fn apply_observed<F: FilterFamily>(
    detector: &FittedDetector<F>,
    subject: &ImageView<'_, f32>,
    observer: &mut dyn StageObserver,
) -> Result<Image<f32>> {
    detector.apply_observed(subject, observer)
}
