//! B-COSFIRE: detection of elongated, vessel-like structures.
//!
//! Two circle-strategy detectors are fitted to the same vertical-bar
//! prototype:
//! - a symmetric bank (DoG sigma 2.4, radii `0..=8`, 12 rotations over `π`),
//!   responding along the whole length of a bar;
//! - an asymmetric bank (DoG sigma 1.8, radii `0..=22`, 24 rotations over
//!   `2π`) restricted to tuples with `phi <= π`, responding to bar endings.
//!
//! [`BcosfireDetector::segment`] sums both responses, applies an optional
//! mask, rescales to `[0, 255]` and thresholds the result.
//!
//! Blur parameters are expressed in pixels. The published values (`sigma0`
//! 3 and 2, `alpha` 0.7 and 0.1) are in kernel-size units and are divided by
//! six here.

use std::f64::consts::{PI, TAU};
use std::time::Instant;

use cf_core::ops::{add_assign, mul_assign, rescale, threshold};
use cf_core::{Image, ImageView};
use cf_detect::{
    CircleConfig, FittedDetector, NoopObserver, Result, StageObserver, evenly_spaced, fit_observed,
};
use cf_filter::{FilterArgumentDomain, FilterKind};
use log::debug;
use serde::{Deserialize, Serialize};

pub const PROTOTYPE_SIZE: usize = 201;
pub const PROTOTYPE_CENTER: (usize, usize) = (100, 100);
/// Rescaled responses above this value are marked as vessel.
pub const SEGMENTATION_CUTOFF: f32 = 37.0;

/// `PROTOTYPE_SIZE` square, zero except for a one-pixel vertical line
/// through the center.
pub fn vertical_bar_prototype() -> Image<f32> {
    let (cx, _) = PROTOTYPE_CENTER;
    Image::from_fn(PROTOTYPE_SIZE, PROTOTYPE_SIZE, |x, _| {
        if x == cx { 1.0 } else { 0.0 }
    })
}

fn bank(dog_sigma: f32, rho_max: u32, sigma0: f32, alpha: f32, rotations: Vec<f64>) -> CircleConfig {
    CircleConfig {
        filter: FilterKind::DifferenceOfGaussians,
        domain: FilterArgumentDomain::fixed(&[dog_sigma, 1.0]),
        center: PROTOTYPE_CENTER,
        rho_list: (0..=rho_max).step_by(2).collect(),
        sigma0,
        alpha,
        rotations,
        ..CircleConfig::default()
    }
}

pub fn symmetric_config() -> CircleConfig {
    bank(2.4, 8, 3.0 / 6.0, 0.7 / 6.0, evenly_spaced(12, PI))
}

pub fn asymmetric_config() -> CircleConfig {
    bank(1.8, 22, 2.0 / 6.0, 0.1 / 6.0, evenly_spaced(24, TAU))
}

/// Green channel `g` mapped to `(255 - g) / 255`, so dark vessels become
/// bright.
pub fn vessel_subject_from_green(green: &ImageView<'_, u8>) -> Image<f32> {
    green.map(|&g| (255 - g) as f32 / 255.0)
}

/// Outputs of [`BcosfireDetector::segment`], all with the subject's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Masked sum of both banks, rescaled to `[0, 255]`.
    pub response: Image<f32>,
    /// `255` where `response` exceeds the cutoff, `0` elsewhere.
    pub binary: Image<f32>,
    /// Symmetric bank alone, rescaled to `[0, 255]`.
    pub symmetric: Image<f32>,
    /// Asymmetric bank alone, rescaled to `[0, 255]`.
    pub asymmetric: Image<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    pub cutoff: f32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            cutoff: SEGMENTATION_CUTOFF,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BcosfireDetector {
    symmetric: FittedDetector,
    asymmetric: FittedDetector,
    params: SegmentParams,
}

impl BcosfireDetector {
    /// Fits both banks with the published configuration.
    pub fn fit() -> Result<Self> {
        Self::fit_with(
            &symmetric_config(),
            &asymmetric_config(),
            SegmentParams::default(),
            &mut NoopObserver,
        )
    }

    /// Fits both banks to the vertical-bar prototype with custom settings.
    ///
    /// The asymmetric bank keeps only tuples with `phi <= π`.
    pub fn fit_with(
        symmetric: &CircleConfig,
        asymmetric: &CircleConfig,
        params: SegmentParams,
        observer: &mut dyn StageObserver,
    ) -> Result<Self> {
        let proto = vertical_bar_prototype();
        let view = proto.as_view();

        let symmetric = fit_observed(&view, symmetric, observer)?;
        let asymmetric = fit_observed(&view, asymmetric, observer)?.restrict(|t| t.phi <= PI);
        debug!(
            "b-cosfire fitted: {} symmetric, {} asymmetric tuples",
            symmetric.tuples().len(),
            asymmetric.tuples().len()
        );

        Ok(Self {
            symmetric,
            asymmetric,
            params,
        })
    }

    pub fn symmetric(&self) -> &FittedDetector {
        &self.symmetric
    }

    pub fn asymmetric(&self) -> &FittedDetector {
        &self.asymmetric
    }

    pub fn params(&self) -> SegmentParams {
        self.params
    }

    pub fn segment(
        &self,
        subject: &ImageView<'_, f32>,
        mask: Option<&ImageView<'_, f32>>,
    ) -> Result<Segmentation> {
        self.segment_observed(subject, mask, &mut NoopObserver)
    }

    /// Applies both banks and combines them into a vessel map.
    ///
    /// `mask`, when given, must have the subject's shape; it multiplies the
    /// summed response before rescaling.
    pub fn segment_observed(
        &self,
        subject: &ImageView<'_, f32>,
        mask: Option<&ImageView<'_, f32>>,
        observer: &mut dyn StageObserver,
    ) -> Result<Segmentation> {
        let symmetric = self.symmetric.apply_observed(subject, observer)?;
        let asymmetric = self.asymmetric.apply_observed(subject, observer)?;

        let start = Instant::now();
        let mut sum = symmetric.clone();
        add_assign(&mut sum, &asymmetric)?;
        if let Some(mask) = mask {
            mul_assign(&mut sum, &mask.to_image())?;
        }

        let response = rescale(&sum, 0.0, 255.0);
        let binary = threshold(&response, self.params.cutoff, 255.0, 0.0);
        let elapsed = start.elapsed();
        debug!("b-cosfire combine: {:.3} ms", elapsed.as_secs_f64() * 1e3);
        observer.stage("combine banks", elapsed);

        Ok(Segmentation {
            response,
            binary,
            symmetric: rescale(&symmetric, 0.0, 255.0),
            asymmetric: rescale(&asymmetric, 0.0, 255.0),
        })
    }
}
