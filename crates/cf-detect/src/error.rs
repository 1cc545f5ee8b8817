use cf_filter::{FilterError, FilterParams};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error("rho list is empty")]
    EmptyRhoList,
    #[error("filter argument domain is empty")]
    EmptyDomain,
    #[error("{0} invariance set is empty")]
    EmptyInvarianceSet(&'static str),
    #[error("scale factors must be finite and > 0, got {0}")]
    InvalidScale(f64),
    #[error("rotation offsets must be finite, got {0}")]
    InvalidRotation(f64),
    #[error("invalid {name} = {value}")]
    InvalidSetting { name: &'static str, value: f64 },
    #[error("support center {center:?} lies outside the {shape:?} prototype")]
    CenterOutsidePrototype {
        center: (usize, usize),
        shape: (usize, usize),
    },
    #[error("detector has no tuples to combine")]
    EmptyTuples,
    #[error("no cached response for radius {scaled_radius} with params {params}")]
    MissingResponse {
        scaled_radius: f64,
        params: FilterParams,
    },
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Image(#[from] cf_core::Error),
}

impl DetectError {
    /// Configuration defects, as opposed to filter or image failures.
    pub fn is_config(&self) -> bool {
        !matches!(
            self,
            Self::Filter(_) | Self::Image(_) | Self::MissingResponse { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
