use gblur_image::ImageError;

use crate::parallel::ParallelError;

/// Errors that can occur before a convolution is launched.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The kernel size is even or zero.
    #[error("kernel size must be odd and positive, got {0}")]
    InvalidKernelSize(usize),

    /// The gaussian sigma is not a finite positive number.
    #[error("sigma must be finite and > 0, got {0}")]
    InvalidSigma(f64),

    /// The source image has fewer than three channels.
    #[error("source image must have at least 3 channels, got {0}")]
    UnsupportedChannels(usize),

    /// Error from the image module.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error from the parallel module.
    #[error(transparent)]
    ParallelError(#[from] ParallelError),
}
