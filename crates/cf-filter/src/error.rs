use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("sigma must be finite and > 0, got {0}")]
    InvalidSigma(f32),
    #[error("kernel size must be a positive odd integer, got {0}")]
    InvalidKernelSize(f32),
    #[error("{filter} expects {expected} parameters, got {actual}")]
    ParamCount {
        filter: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("invalid {name} = {value}")]
    InvalidParam { name: &'static str, value: f32 },
    #[error("filter argument domain is empty")]
    EmptyDomain,
}
