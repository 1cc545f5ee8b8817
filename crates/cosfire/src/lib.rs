//! Umbrella crate for the COSFIRE workspace.
//!
//! Re-exports the image primitives, the filter family and the circle-strategy
//! detector, and adds [`bcosfire`], the two-bank vessel detector built on top
//! of them.

pub mod bcosfire;

pub use cf_core::{BorderMode, Error as ImageError, Image, ImageView, map_index, ops};
pub use cf_detect::{
    CircleConfig, CombineMethod, DetectError, FilteredPrototypes, FittedDetector, NoopObserver,
    PEAK_TOLERANCE, ResponseKey, ResponseMap, StageObserver, StageTiming, TimingBreakdown, Tuple,
    Variation, apply, apply_observed, circle_points, circular_peaks, compute_responses,
    evenly_spaced, find_tuples, fit, fit_observed, fit_with_family, pixel_shift, shift_combine,
    variations,
};
pub use cf_filter::{
    ArgDimension, BuiltinFilter, DogFilter, Filter, FilterArgumentDomain, FilterError,
    FilterFamily, FilterKind, FilterParams, GaborFilter, GaussianFilter, GaussianKernel1D,
};
