//! Parameter types configuring the circle strategy.
//!
//! `sigma0` and `alpha` are Gaussian standard deviations in pixels: a
//! response used at radius `rho` is blurred with `sigma0 + rho * alpha`.
//! Rotation offsets are radians; scale factors are multipliers on `rho`.

use cf_filter::{FilterArgumentDomain, FilterKind};
use serde::{Deserialize, Serialize};

use crate::{DetectError, Result};

/// How the shifted responses of one variation are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMethod {
    /// `(prod r_i)^(1/k)`.
    #[default]
    Geometric,
    /// `(prod r_i^w_i)^(1/sum w_i)` with `w_i = exp(-rho_i^2 / (2 (rho_max/3)^2))`.
    WeightedGeometric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    pub filter: FilterKind,
    pub domain: FilterArgumentDomain,
    /// Support center `(cx, cy)` in prototype pixels.
    pub center: (usize, usize),
    /// Candidate circle radii, in pixels.
    pub rho_list: Vec<u32>,
    pub sigma0: f32,
    pub alpha: f32,
    pub rotations: Vec<f64>,
    pub scales: Vec<f64>,
    /// Absolute floor on filter responses.
    pub t1: f32,
    /// Fraction of each filtered prototype's maximum kept during fit.
    pub t2: f32,
    pub combine: CombineMethod,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            filter: FilterKind::DifferenceOfGaussians,
            domain: FilterArgumentDomain::default(),
            center: (0, 0),
            rho_list: Vec::new(),
            sigma0: 0.0,
            alpha: 0.0,
            rotations: vec![0.0],
            scales: vec![1.0],
            t1: 0.0,
            t2: 0.2,
            combine: CombineMethod::Geometric,
        }
    }
}

impl CircleConfig {
    /// Checks everything that does not depend on the prototype.
    pub fn validate(&self) -> Result<()> {
        if self.rho_list.is_empty() {
            return Err(DetectError::EmptyRhoList);
        }
        if self.rotations.is_empty() {
            return Err(DetectError::EmptyInvarianceSet("rotation"));
        }
        if self.scales.is_empty() {
            return Err(DetectError::EmptyInvarianceSet("scale"));
        }
        if let Some(&psi) = self.rotations.iter().find(|v| !v.is_finite()) {
            return Err(DetectError::InvalidRotation(psi));
        }
        if let Some(&s) = self.scales.iter().find(|&&s| !(s.is_finite() && s > 0.0)) {
            return Err(DetectError::InvalidScale(s));
        }

        let settings = [
            ("sigma0", self.sigma0, self.sigma0 >= 0.0),
            ("alpha", self.alpha, self.alpha >= 0.0),
            ("t1", self.t1, true),
            ("t2", self.t2, true),
        ];
        for (name, value, ok) in settings {
            if !(value.is_finite() && ok) {
                return Err(DetectError::InvalidSetting {
                    name,
                    value: value as f64,
                });
            }
        }
        Ok(())
    }
}

/// `count` offsets `k * span / count` for `k in 0..count`.
pub fn evenly_spaced(count: usize, span: f64) -> Vec<f64> {
    (0..count).map(|k| k as f64 / count as f64 * span).collect()
}
