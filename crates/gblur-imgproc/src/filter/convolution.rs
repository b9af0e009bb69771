use gblur_image::ImageSize;

use super::kernels::Kernel2d;
use crate::parallel::WorkRange;

/// Sample value used for every channel of a neighbour outside the image.
pub const BORDER_SENTINEL: f64 = 1.0;

/// Number of channels written per output pixel.
pub const OUTPUT_CHANNELS: usize = 3;

/// Convolve a contiguous range of pixels with a square kernel.
///
/// Neighbours are addressed with flat index arithmetic, `target = p + i * width + j`,
/// so taps past the left or right edge of a row wrap into the adjacent row. Only
/// targets outside `[0, width * height)` are treated as missing, and those contribute
/// [`BORDER_SENTINEL`] to each of the three channels. The accumulated values are
/// truncated toward zero when written.
///
/// # Arguments
///
/// * `src` - The flat source samples with `channels` samples per pixel.
/// * `size` - The size of the source image.
/// * `channels` - Samples per source pixel. Only the first three are read.
/// * `kernel` - The convolution kernel.
/// * `range` - The pixels to compute.
/// * `dst` - The output samples for `range` only, `range.len() * 3` bytes.
///
/// PRECONDITION: `channels >= 3`, `src` holds `size.num_pixels() * channels` samples and
/// `range.end <= size.num_pixels()`.
pub fn convolve_range(
    src: &[u8],
    size: ImageSize,
    channels: usize,
    kernel: &Kernel2d,
    range: WorkRange,
    dst: &mut [u8],
) {
    debug_assert!(channels >= OUTPUT_CHANNELS);
    debug_assert_eq!(src.len(), size.num_pixels() * channels);
    debug_assert_eq!(dst.len(), range.len() * OUTPUT_CHANNELS);

    let width = size.width as isize;
    let num_pixels = size.num_pixels() as isize;
    let half = kernel.half() as isize;

    for (p, dst_pixel) in (range.start..range.end).zip(dst.chunks_exact_mut(OUTPUT_CHANNELS)) {
        let p = p as isize;
        let mut acc = [0.0f64; OUTPUT_CHANNELS];

        for (ki, weights) in kernel.rows().enumerate() {
            let row_offset = (ki as isize - half) * width;
            for (kj, &w) in weights.iter().enumerate() {
                let target = p + row_offset + (kj as isize - half);

                if target < 0 || target >= num_pixels {
                    acc.iter_mut().for_each(|a| *a += w * BORDER_SENTINEL);
                    continue;
                }

                let offset = target as usize * channels;
                acc.iter_mut()
                    .zip(&src[offset..offset + OUTPUT_CHANNELS])
                    .for_each(|(a, &v)| *a += w * v as f64);
            }
        }

        // float to int casts truncate toward zero
        dst_pixel
            .iter_mut()
            .zip(acc.iter())
            .for_each(|(d, &a)| *d = a as u8);
    }
}
