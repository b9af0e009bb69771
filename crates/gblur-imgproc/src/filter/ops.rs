use std::time::{Duration, Instant};

use gblur_image::{Image, ImageError};

use super::{
    convolve_range,
    kernels::{self, Kernel2d},
    FilterError, OUTPUT_CHANNELS,
};
use crate::parallel::{self, ExecutionStrategy, ParallelError, RemainderPolicy, WorkRange};

/// Parameters of the threaded gaussian blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlurParams {
    /// Side length of the square kernel, odd and positive.
    pub kernel_size: usize,
    /// Standard deviation of the gaussian.
    pub sigma: f64,
    /// Number of worker threads, one pixel range each.
    pub num_workers: usize,
    /// Handling of the pixels left over by the range split.
    pub remainder: RemainderPolicy,
}

impl Default for GaussianBlurParams {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            sigma: kernels::DEFAULT_SIGMA,
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            remainder: RemainderPolicy::Drop,
        }
    }
}

impl GaussianBlurParams {
    /// Set the kernel size.
    pub fn with_kernel_size(mut self, kernel_size: usize) -> Self {
        self.kernel_size = kernel_size;
        self
    }

    /// Set the sigma.
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the number of workers.
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Set the remainder policy.
    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }
}

/// Result of a blur run.
#[derive(Debug, Clone)]
pub struct BlurOutput {
    /// The blurred RGB image.
    pub image: Image<u8, 3>,
    /// Wall-clock duration of the convolution phase.
    pub elapsed: Duration,
    /// The pixel ranges that were handed to the workers.
    pub ranges: Vec<WorkRange>,
}

/// Blur an image with a gaussian kernel using a fixed pool of worker threads.
///
/// The pixels are split in `params.num_workers` contiguous ranges and each range is
/// convolved by its own task on a thread pool of that size. All validation happens
/// before any thread is started. The returned duration covers the parallel phase
/// only: kernel construction and buffer allocation are not timed.
///
/// The output always has three channels; extra source channels such as alpha are
/// ignored. With [`RemainderPolicy::Drop`] pixels outside every range stay black.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C), C >= 3.
/// * `params` - The blur parameters.
///
/// # Errors
///
/// If the image has fewer than three channels or no pixels, or if the kernel size,
/// sigma or worker count is invalid.
///
/// # Example
///
/// ```
/// use gblur_image::Image;
/// use gblur_imgproc::filter::{gaussian_blur_threaded, GaussianBlurParams};
///
/// let src = Image::<u8, 3>::from_size_val([8, 4].into(), 120).unwrap();
/// let params = GaussianBlurParams::default()
///     .with_kernel_size(3)
///     .with_num_workers(4);
///
/// let out = gaussian_blur_threaded(&src, &params).unwrap();
/// assert_eq!(out.image.size(), src.size());
/// assert_eq!(out.ranges.len(), 4);
/// ```
pub fn gaussian_blur_threaded<const C: usize>(
    src: &Image<u8, C>,
    params: &GaussianBlurParams,
) -> Result<BlurOutput, FilterError> {
    gaussian_blur_with(src, params, ExecutionStrategy::Fixed(params.num_workers))
}

/// Blur an image with a gaussian kernel on the calling thread.
///
/// The image is split in the same ranges as [`gaussian_blur_threaded`] and the ranges
/// are processed one after the other, so both functions produce identical pixels.
pub fn gaussian_blur_serial<const C: usize>(
    src: &Image<u8, C>,
    params: &GaussianBlurParams,
) -> Result<BlurOutput, FilterError> {
    gaussian_blur_with(src, params, ExecutionStrategy::Serial)
}

fn gaussian_blur_with<const C: usize>(
    src: &Image<u8, C>,
    params: &GaussianBlurParams,
    strategy: ExecutionStrategy,
) -> Result<BlurOutput, FilterError> {
    if C < OUTPUT_CHANNELS {
        return Err(FilterError::UnsupportedChannels(C));
    }

    if params.num_workers == 0 {
        return Err(ParallelError::InvalidThreadCount(params.num_workers).into());
    }

    if src.num_pixels() == 0 {
        return Err(ImageError::EmptyImage(src.width(), src.height()).into());
    }

    let kernel = kernels::gaussian_kernel_2d(params.kernel_size, params.sigma)?;
    let ranges =
        parallel::partition_with(src.num_pixels(), params.num_workers, params.remainder)?;

    let mut dst = Image::<u8, 3>::from_size_val(src.size(), 0)?;
    let elapsed = convolve_ranges(src, &kernel, &ranges, &mut dst, strategy)?;

    log::debug!(
        "blurred {} with a {}x{} kernel on {} workers in {:?}",
        src.size(),
        kernel.size(),
        kernel.size(),
        params.num_workers,
        elapsed
    );

    Ok(BlurOutput {
        image: dst,
        elapsed,
        ranges,
    })
}

/// Dispatch one convolution task per range and wait for all of them.
///
/// Returns the wall-clock time between the dispatch and the join.
fn convolve_ranges<const C: usize>(
    src: &Image<u8, C>,
    kernel: &Kernel2d,
    ranges: &[WorkRange],
    dst: &mut Image<u8, 3>,
    strategy: ExecutionStrategy,
) -> Result<Duration, FilterError> {
    let size = src.size();
    let src_data = src.as_slice();

    let tasks = parallel::split_disjoint_mut(dst.as_slice_mut(), ranges, OUTPUT_CHANNELS)?
        .into_iter()
        .zip(ranges.iter().copied())
        .enumerate()
        .collect::<Vec<_>>();

    let now = Instant::now();
    parallel::run_tasks(strategy, tasks, |(worker, (dst_chunk, range))| {
        log::trace!("worker {worker}: pixels {}..{}", range.start, range.end);
        convolve_range(src_data, size, C, kernel, range, dst_chunk);
    })?;

    Ok(now.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gblur_image::ImageSize;

    fn gradient_image(size: ImageSize) -> Result<Image<u8, 3>, ImageError> {
        let data = (0..size.num_pixels() * 3)
            .map(|i| (i * 7 % 251) as u8)
            .collect();
        Image::new(size, data)
    }

    #[test]
    fn test_gaussian_blur_threaded_matches_serial() -> Result<(), FilterError> {
        let src = gradient_image([6, 4].into())?;
        for num_workers in [1, 2, 3, 4, 6, 8, 12, 24] {
            let params = GaussianBlurParams::default()
                .with_kernel_size(3)
                .with_num_workers(num_workers);
            let threaded = gaussian_blur_threaded(&src, &params)?;
            let serial = gaussian_blur_serial(&src, &params)?;
            assert_eq!(threaded.image, serial.image, "num_workers = {num_workers}");
            assert_eq!(threaded.ranges.len(), num_workers);
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_rejects_few_channels() -> Result<(), FilterError> {
        let gray = Image::<u8, 1>::from_size_val([4, 4].into(), 0)?;
        let res = gaussian_blur_threaded(&gray, &GaussianBlurParams::default());
        assert_eq!(res.err(), Some(FilterError::UnsupportedChannels(1)));

        let gray_alpha = Image::<u8, 2>::from_size_val([4, 4].into(), 0)?;
        let res = gaussian_blur_threaded(&gray_alpha, &GaussianBlurParams::default());
        assert_eq!(res.err(), Some(FilterError::UnsupportedChannels(2)));
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_rejects_bad_params() -> Result<(), FilterError> {
        let src = Image::<u8, 3>::from_size_val([4, 4].into(), 0)?;

        let params = GaussianBlurParams::default().with_kernel_size(4);
        let res = gaussian_blur_threaded(&src, &params);
        assert_eq!(res.err(), Some(FilterError::InvalidKernelSize(4)));

        let params = GaussianBlurParams::default().with_sigma(-1.0);
        let res = gaussian_blur_threaded(&src, &params);
        assert_eq!(res.err(), Some(FilterError::InvalidSigma(-1.0)));

        let params = GaussianBlurParams::default().with_num_workers(0);
        let res = gaussian_blur_threaded(&src, &params);
        assert_eq!(
            res.err(),
            Some(FilterError::ParallelError(ParallelError::InvalidThreadCount(0)))
        );
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_rejects_empty_image() -> Result<(), FilterError> {
        let src = Image::<u8, 3>::new([0, 5].into(), vec![])?;
        let res = gaussian_blur_threaded(&src, &GaussianBlurParams::default());
        assert_eq!(
            res.err(),
            Some(FilterError::ImageError(ImageError::EmptyImage(0, 5)))
        );
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_remainder_policy() -> Result<(), FilterError> {
        // 25 pixels on 4 workers leaves the last pixel out of every range
        let src = Image::<u8, 3>::from_size_val([5, 5].into(), 200)?;
        let params = GaussianBlurParams::default()
            .with_kernel_size(3)
            .with_num_workers(4);

        let reference = gaussian_blur_serial(&src, &params.with_num_workers(1))?;

        let dropped = gaussian_blur_threaded(&src, &params)?;
        assert_eq!(dropped.ranges.last(), Some(&WorkRange::new(18, 24)));
        assert_eq!(
            &dropped.image.as_slice()[..24 * 3],
            &reference.image.as_slice()[..24 * 3]
        );
        assert_eq!(&dropped.image.as_slice()[24 * 3..], &[0, 0, 0]);
        assert_ne!(&reference.image.as_slice()[24 * 3..], &[0, 0, 0]);

        let covered = gaussian_blur_threaded(
            &src,
            &params.with_remainder(RemainderPolicy::AssignToLast),
        )?;
        assert_eq!(covered.ranges.last(), Some(&WorkRange::new(18, 25)));
        assert_eq!(covered.image, reference.image);
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_ignores_alpha() -> Result<(), FilterError> {
        let rgb = gradient_image([5, 3].into())?;
        let rgba_data = rgb
            .as_slice()
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 17])
            .collect();
        let rgba = Image::<u8, 4>::new(rgb.size(), rgba_data)?;

        let params = GaussianBlurParams::default()
            .with_kernel_size(5)
            .with_num_workers(3);
        let out_rgb = gaussian_blur_threaded(&rgb, &params)?;
        let out_rgba = gaussian_blur_threaded(&rgba, &params)?;
        assert_eq!(out_rgb.image, out_rgba.image);
        Ok(())
    }
}
