//! COSFIRE detectors built with the circle strategy.
//!
//! ## Fit
//! A prototype image is filtered with every parameter tuple of a
//! [`cf_filter::FilterArgumentDomain`]. Circles of the configured radii are
//! sampled around a support center and each local maximum of the strongest
//! filter response becomes a [`Tuple`] `(rho, phi, params)`.
//!
//! ## Apply
//! Every distinct filter is applied to the subject once, gated by `t1` and
//! blurred with a radius-dependent Gaussian. For each rotation/scale
//! variation the blurred responses are shifted back to the support center and
//! merged with a geometric mean; the output is the pixelwise maximum over all
//! variations. Output is never normalized.
//!
//! Stage timings are reported to an explicit [`StageObserver`] and logged at
//! `debug` level.

pub mod combine;
mod config;
mod detector;
mod error;
pub mod observer;
pub mod peaks;
pub mod prototype;
pub mod responses;

pub use combine::{Variation, pixel_shift, shift_combine, variations};
pub use config::{CircleConfig, CombineMethod, evenly_spaced};
pub use detector::{FittedDetector, apply, apply_observed, fit, fit_observed, fit_with_family};
pub use error::{DetectError, Result};
pub use observer::{NoopObserver, StageObserver, StageTiming, TimingBreakdown};
pub use peaks::{PEAK_TOLERANCE, circular_peaks};
pub use prototype::{FilteredPrototypes, Tuple, circle_points, find_tuples};
pub use responses::{ResponseKey, ResponseMap, compute_responses};
