use crate::FilterError;

/// Normalized 1D Gaussian kernel.
///
/// Conventions:
/// - `taps[i] ∝ exp(-(i - (size-1)/2)^2 / (2*sigma^2))`, `sum(taps) ~= 1`.
/// - `size` is odd so the kernel has a center tap at `size / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel1D {
    pub sigma: f32,
    pub taps: Vec<f32>,
}

impl GaussianKernel1D {
    /// Kernel with the default footprint `2*ceil(3*sigma) + 1`.
    pub fn new(sigma: f32) -> Result<Self, FilterError> {
        check_sigma(sigma)?;
        Self::with_size(sigma, default_size(sigma))
    }

    pub fn with_size(sigma: f32, size: usize) -> Result<Self, FilterError> {
        check_sigma(sigma)?;
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size as f32));
        }

        let sigma = sigma as f64;
        let center = (size - 1) as f64 * 0.5;
        let scale = -0.5 / (sigma * sigma);
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let x = i as f64 - center;
                (scale * x * x).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();

        Ok(Self {
            sigma: sigma as f32,
            taps: raw.iter().map(|&t| (t / sum) as f32).collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.taps.len()
    }

    pub fn radius(&self) -> usize {
        self.taps.len() / 2
    }
}

pub(crate) fn check_sigma(sigma: f32) -> Result<(), FilterError> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidSigma(sigma))
    }
}

/// `2*ceil(3*sigma) + 1`, always odd.
pub fn default_size(sigma: f32) -> usize {
    ((3.0 * sigma).ceil().max(0.0) as usize) * 2 + 1
}

/// Smallest odd integer `>= 6*sigma`.
///
/// Footprint used for the radius-dependent blurs.
pub fn blur_size(sigma: f32) -> usize {
    let base = (6.0 * sigma as f64).ceil().max(0.0) as usize;
    if base % 2 == 0 { base + 1 } else { base }
}
