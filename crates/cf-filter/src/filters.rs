use cf_core::{BorderMode, Image, ImageView};
use serde::{Deserialize, Serialize};

use crate::conv2d::{convolve_dense, convolve_separable};
use crate::kernels::{GaussianKernel1D, check_sigma, default_size};
use crate::{FilterError, FilterParams};

/// Deterministic `image -> image` transform; output shape equals input shape.
pub trait Filter: Send + Sync {
    fn apply(&self, src: &ImageView<'_, f32>) -> Image<f32>;
}

/// Builds filters from parameter tuples.
///
/// Construction must be pure: equal params yield identical filters, since
/// params are used as cache keys downstream.
pub trait FilterFamily: Sync {
    type Filter: Filter;

    fn build(&self, params: &FilterParams) -> Result<Self::Filter, FilterError>;
}

/// Separable Gaussian blur with reflect-101 borders.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianFilter {
    kernel: GaussianKernel1D,
}

impl GaussianFilter {
    pub fn new(sigma: f32) -> Result<Self, FilterError> {
        Ok(Self {
            kernel: GaussianKernel1D::new(sigma)?,
        })
    }

    pub fn with_size(sigma: f32, size: usize) -> Result<Self, FilterError> {
        Ok(Self {
            kernel: GaussianKernel1D::with_size(sigma, size)?,
        })
    }

    pub fn kernel(&self) -> &GaussianKernel1D {
        &self.kernel
    }
}

impl Filter for GaussianFilter {
    fn apply(&self, src: &ImageView<'_, f32>) -> Image<f32> {
        let taps = &self.kernel.taps;
        convolve_separable(src, taps, taps, &BorderMode::Reflect101)
    }
}

/// Difference of two concentric Gaussians, zero-padded.
///
/// On-center (`on_off = true`): narrow minus wide, responds positively to
/// bright structures on a dark background.
#[derive(Debug, Clone, PartialEq)]
pub struct DogFilter {
    wide: GaussianKernel1D,
    narrow: GaussianKernel1D,
    on_center: bool,
}

impl DogFilter {
    pub const DEFAULT_SIGMA_RATIO: f32 = 0.5;

    pub fn new(sigma: f32, on_center: bool, sigma_ratio: f32) -> Result<Self, FilterError> {
        check_sigma(sigma)?;
        if !(sigma_ratio.is_finite() && sigma_ratio > 0.0) {
            return Err(FilterError::InvalidParam {
                name: "sigma_ratio",
                value: sigma_ratio,
            });
        }

        let size = default_size(sigma);
        Ok(Self {
            wide: GaussianKernel1D::with_size(sigma, size)?,
            narrow: GaussianKernel1D::with_size(sigma * sigma_ratio, size)?,
            on_center,
        })
    }
}

impl Filter for DogFilter {
    fn apply(&self, src: &ImageView<'_, f32>) -> Image<f32> {
        let zero = BorderMode::Constant(0.0);
        let wide = convolve_separable(src, &self.wide.taps, &self.wide.taps, &zero);
        let mut out = convolve_separable(src, &self.narrow.taps, &self.narrow.taps, &zero);

        for (o, &w) in out.data_mut().iter_mut().zip(wide.data()) {
            *o = if self.on_center { *o - w } else { w - *o };
        }
        out
    }
}

/// Gabor kernel (cosine carrier under an elliptical Gaussian), zero-padded.
#[derive(Debug, Clone, PartialEq)]
pub struct GaborFilter {
    kernel: Image<f32>,
}

impl GaborFilter {
    pub fn new(
        sigma: f32,
        theta: f32,
        lambda: f32,
        gamma: f32,
        psi: f32,
    ) -> Result<Self, FilterError> {
        check_sigma(sigma)?;
        for (name, value) in [("lambda", lambda), ("gamma", gamma)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(FilterError::InvalidParam { name, value });
            }
        }
        for (name, value) in [("theta", theta), ("psi", psi)] {
            if !value.is_finite() {
                return Err(FilterError::InvalidParam { name, value });
            }
        }

        let size = default_size(sigma);
        let half = (size / 2) as isize;
        let (s, c) = (theta as f64).sin_cos();
        let sigma_x = sigma as f64;
        let sigma_y = sigma as f64 / gamma as f64;
        let ex = -0.5 / (sigma_x * sigma_x);
        let ey = -0.5 / (sigma_y * sigma_y);
        let carrier = std::f64::consts::TAU / lambda as f64;

        // Row `half - y`, column `half - x` holds the sample at offset (x, y).
        let kernel = Image::from_fn(size, size, |col, row| {
            let x = (half - col as isize) as f64;
            let y = (half - row as isize) as f64;
            let xr = x * c + y * s;
            let yr = -x * s + y * c;
            ((ex * xr * xr + ey * yr * yr).exp() * (carrier * xr + psi as f64).cos()) as f32
        });

        Ok(Self { kernel })
    }

    pub fn kernel(&self) -> &Image<f32> {
        &self.kernel
    }
}

impl Filter for GaborFilter {
    fn apply(&self, src: &ImageView<'_, f32>) -> Image<f32> {
        convolve_dense(src, &self.kernel, &BorderMode::Constant(0.0))
    }
}

/// Built-in filter family.
///
/// Parameter layouts:
/// - `Gaussian`: `[sigma]` or `[sigma, size]`.
/// - `DifferenceOfGaussians`: `[sigma, on_off]` or `[sigma, on_off, ratio]`;
///   `on_off != 0` selects the on-center kernel.
/// - `Gabor`: `[sigma, theta, lambda, gamma, psi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Gaussian,
    DifferenceOfGaussians,
    Gabor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinFilter {
    Gaussian(GaussianFilter),
    Dog(DogFilter),
    Gabor(GaborFilter),
}

impl Filter for BuiltinFilter {
    fn apply(&self, src: &ImageView<'_, f32>) -> Image<f32> {
        match self {
            Self::Gaussian(f) => f.apply(src),
            Self::Dog(f) => f.apply(src),
            Self::Gabor(f) => f.apply(src),
        }
    }
}

impl FilterFamily for FilterKind {
    type Filter = BuiltinFilter;

    fn build(&self, params: &FilterParams) -> Result<BuiltinFilter, FilterError> {
        let p = params.values();
        match (self, p) {
            (Self::Gaussian, [sigma]) => GaussianFilter::new(*sigma).map(BuiltinFilter::Gaussian),
            (Self::Gaussian, [sigma, size]) => {
                let sz = kernel_size_param(*size)?;
                GaussianFilter::with_size(*sigma, sz).map(BuiltinFilter::Gaussian)
            }
            (Self::DifferenceOfGaussians, [sigma, on_off]) => {
                DogFilter::new(*sigma, *on_off != 0.0, DogFilter::DEFAULT_SIGMA_RATIO)
                    .map(BuiltinFilter::Dog)
            }
            (Self::DifferenceOfGaussians, [sigma, on_off, ratio]) => {
                DogFilter::new(*sigma, *on_off != 0.0, *ratio).map(BuiltinFilter::Dog)
            }
            (Self::Gabor, [sigma, theta, lambda, gamma, psi]) => {
                GaborFilter::new(*sigma, *theta, *lambda, *gamma, *psi).map(BuiltinFilter::Gabor)
            }
            (Self::Gaussian, _) => Err(param_count("gaussian", "1 or 2", p.len())),
            (Self::DifferenceOfGaussians, _) => Err(param_count("dog", "2 or 3", p.len())),
            (Self::Gabor, _) => Err(param_count("gabor", "5", p.len())),
        }
    }
}

fn param_count(filter: &'static str, expected: &'static str, actual: usize) -> FilterError {
    FilterError::ParamCount {
        filter,
        expected,
        actual,
    }
}

fn kernel_size_param(size: f32) -> Result<usize, FilterError> {
    if !(size.is_finite() && size >= 1.0 && size.fract() == 0.0) || size as usize % 2 == 0 {
        return Err(FilterError::InvalidKernelSize(size));
    }
    Ok(size as usize)
}
