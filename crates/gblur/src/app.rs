use std::{path::PathBuf, time::Duration};

use argh::FromArgs;

use crate::{
    image::ImageSize,
    imgproc::{
        filter::{gaussian_blur_threaded, kernels, FilterError, GaussianBlurParams},
        parallel::RemainderPolicy,
    },
    io::{
        error::IoError,
        functional::{self as F, GenericImage},
        jpeg::DEFAULT_JPEG_QUALITY,
    },
    timing::TimingLog,
};

#[derive(FromArgs, Debug, Clone, PartialEq)]
/// Blur an image with a gaussian kernel, splitting the pixels across worker threads
pub struct Args {
    /// path to the input image
    #[argh(positional)]
    pub input_path: PathBuf,

    /// path to the output image (.jpg, .jpeg or .png)
    #[argh(positional)]
    pub output_path: PathBuf,

    /// side length of the square kernel, must be odd
    #[argh(positional)]
    pub kernel_size: usize,

    /// number of worker threads
    #[argh(positional)]
    pub thread_count: usize,

    /// standard deviation of the gaussian
    #[argh(option, default = "kernels::DEFAULT_SIGMA")]
    pub sigma: f64,

    /// jpeg quality from 0 to 100
    #[argh(option, default = "DEFAULT_JPEG_QUALITY")]
    pub quality: u8,

    /// directory of the timing log
    #[argh(option, default = "PathBuf::from(\".\")")]
    pub timing_dir: PathBuf,

    /// give the pixels left over by the range split to the last worker
    #[argh(switch)]
    pub cover_remainder: bool,

    /// log the kernel weights
    #[argh(switch)]
    pub print_kernel: bool,
}

impl Args {
    /// Reject configurations that can be detected without reading the image.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(AppError::InvalidKernelSize(self.kernel_size));
        }
        if self.thread_count == 0 {
            return Err(AppError::InvalidThreadCount(self.thread_count));
        }
        Ok(())
    }

    /// The blur parameters described by the arguments.
    pub fn blur_params(&self) -> GaussianBlurParams {
        let remainder = if self.cover_remainder {
            RemainderPolicy::AssignToLast
        } else {
            RemainderPolicy::Drop
        };

        GaussianBlurParams::default()
            .with_kernel_size(self.kernel_size)
            .with_sigma(self.sigma)
            .with_num_workers(self.thread_count)
            .with_remainder(remainder)
    }
}

/// Errors of a command line run.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The kernel size is even or zero.
    #[error("kernel size must be odd and positive, got {0}")]
    InvalidKernelSize(usize),

    /// No worker thread was requested.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The decoded image cannot be blurred.
    #[error("image has {0} channel(s), at least 3 are required")]
    UnsupportedChannels(usize),

    /// Error while reading or writing an image.
    #[error(transparent)]
    IoError(#[from] IoError),

    /// Error raised by the convolution engine.
    #[error(transparent)]
    FilterError(#[from] FilterError),

    /// Error while appending to the timing log.
    #[error("failed to append to the timing log {0}: {1}")]
    TimingLogError(PathBuf, std::io::Error),
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Size of the input image.
    pub size: ImageSize,
    /// Channels of the decoded input image.
    pub channels: usize,
    /// Duration of the parallel convolution phase.
    pub elapsed: Duration,
    /// File the duration was appended to.
    pub timing_path: PathBuf,
}

/// Load, blur and save an image, then append the elapsed time to the timing log.
///
/// Configuration errors are reported before the image is read.
pub fn run(args: &Args) -> Result<RunReport, AppError> {
    args.validate()?;

    let image = F::read_image_any(&args.input_path)?;
    let size = image.size();
    let channels = image.num_channels();
    log::info!(
        "width: {}px, height: {}px, channels: {}",
        size.width,
        size.height,
        channels
    );

    let params = args.blur_params();
    if args.print_kernel {
        log_kernel(&params)?;
    }

    let output = match &image {
        GenericImage::Rgb8(src) => gaussian_blur_threaded(src, &params)?,
        GenericImage::Rgba8(src) => gaussian_blur_threaded(src, &params)?,
        GenericImage::L8(_) | GenericImage::La8(_) => {
            return Err(AppError::UnsupportedChannels(channels))
        }
    };

    let covered = output.ranges.iter().map(|r| r.len()).sum::<usize>();
    if covered < size.num_pixels() {
        log::warn!(
            "{} trailing pixel(s) were not assigned to any worker",
            size.num_pixels() - covered
        );
    }

    F::write_image_rgb8(&args.output_path, &output.image, args.quality)?;

    let timing = TimingLog::new(&args.timing_dir, &args.input_path, args.kernel_size);
    timing
        .append(output.elapsed)
        .map_err(|e| AppError::TimingLogError(timing.path().to_path_buf(), e))?;

    log::info!(
        "blurred with {} worker(s) in {:.6}s, timing appended to {}",
        params.num_workers,
        output.elapsed.as_secs_f64(),
        timing.path().display()
    );

    Ok(RunReport {
        size,
        channels,
        elapsed: output.elapsed,
        timing_path: timing.path().to_path_buf(),
    })
}

fn log_kernel(params: &GaussianBlurParams) -> Result<(), AppError> {
    let kernel = kernels::gaussian_kernel_2d(params.kernel_size, params.sigma)?;
    log::info!(
        "gaussian kernel {}x{}, sigma {}:",
        kernel.size(),
        kernel.size(),
        params.sigma
    );
    for row in kernel.rows() {
        let line = row
            .iter()
            .map(|w| format!("{w:.6}"))
            .collect::<Vec<_>>()
            .join(" ");
        log::info!("{line}");
    }
    Ok(())
}
