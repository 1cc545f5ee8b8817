//! Linear filters used to build COSFIRE detectors.
//!
//! Coordinates follow the pixel-center convention of `cf-core`. Every filter
//! returns an image with the same shape as its input.
//!
//! A [`FilterFamily`] turns a [`FilterParams`] tuple into a concrete
//! [`Filter`]. Families must be deterministic because parameter tuples double
//! as cache keys in the detector. [`FilterArgumentDomain`] enumerates the
//! parameter tuples a detector is fitted over.
//!
//! Border handling differs per filter: the Gaussian blur reflects (101), the
//! difference-of-Gaussians and Gabor filters assume zero outside the image.

pub mod conv1d;
pub mod conv2d;
mod error;
mod filters;
pub mod kernels;
mod params;

pub use error::FilterError;
pub use filters::{
    BuiltinFilter, DogFilter, Filter, FilterFamily, FilterKind, GaborFilter, GaussianFilter,
};
pub use kernels::GaussianKernel1D;
pub use params::{ArgDimension, FilterArgumentDomain, FilterParams};
