//! Foundational image primitives for COSFIRE filtering.
//!
//! ## Images and Stride
//! Images hold `width * height` samples in row-major order with the origin at
//! the top-left pixel. Borrowed views carry an element stride (not a byte
//! stride) that may exceed `width`, which allows views over padded buffers.
//!
//! ## Border Modes
//! Index mapping supports constant fill, reflect-101 and cyclic wrap.
//! Gaussian blurs reflect, the DoG and Gabor filters read zeros outside the
//! image, and wrap treats each axis as a ring for [`ops::shift_image`].

mod border;
mod error;
mod image;
pub mod ops;

pub use border::{BorderMode, map_index};
pub use error::{Error, Result};
pub use image::{Image, ImageView};
