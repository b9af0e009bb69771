use super::FilterError;

/// Default standard deviation of the gaussian kernel.
///
/// Kernel size and blur strength are independent controls, so small kernels with this
/// sigma behave almost like a box blur.
pub const DEFAULT_SIGMA: f64 = 15.0;

/// A square 2D convolution kernel with odd side length.
///
/// The weights are stored row-major in a flat buffer with shape `(size, size)`.
/// Row `r` and column `c` correspond to the offsets `(r - half, c - half)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2d {
    data: Vec<f64>,
    size: usize,
}

impl Kernel2d {
    /// Side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Shape of the kernel as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.size, self.size)
    }

    /// Half of the side length, i.e. the largest offset `m` of a tap.
    pub fn half(&self) -> usize {
        self.size / 2
    }

    /// The weights in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Iterate over the kernel rows.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.size)
    }

    /// Get the weight at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.data.get(row * self.size + col).copied()
    }

    /// Get the weight at offset `(i, j)` with `i, j` in `[-half, half]`.
    pub fn at(&self, i: isize, j: isize) -> Option<f64> {
        let half = self.half() as isize;
        if i < -half || i > half || j < -half || j > half {
            return None;
        }
        self.get((i + half) as usize, (j + half) as usize)
    }

    /// Sum of all the weights.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Create a normalized 2D gaussian kernel.
///
/// # Arguments
///
/// * `kernel_size` - The side length of the kernel. Must be odd and positive.
/// * `sigma` - The standard deviation of the gaussian. Must be finite and positive.
///
/// # Returns
///
/// A kernel whose weights sum to one.
///
/// # Errors
///
/// [`FilterError::InvalidKernelSize`] for an even or zero size and
/// [`FilterError::InvalidSigma`] for a bad sigma.
pub fn gaussian_kernel_2d(kernel_size: usize, sigma: f64) -> Result<Kernel2d, FilterError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(FilterError::InvalidKernelSize(kernel_size));
    }

    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FilterError::InvalidSigma(sigma));
    }

    let half = (kernel_size / 2) as isize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let scale = std::f64::consts::PI * two_sigma_sq;

    // compute the density over the truncated window
    let mut data = Vec::with_capacity(kernel_size * kernel_size);
    for x in -half..=half {
        for y in -half..=half {
            let r2 = (x * x + y * y) as f64;
            data.push((-r2 / two_sigma_sq).exp() / scale);
        }
    }

    // the truncated window does not integrate to one
    let norm = data.iter().sum::<f64>();
    data.iter_mut().for_each(|k| *k /= norm);

    Ok(Kernel2d {
        data,
        size: kernel_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_kernel_2d_sigma_one() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(3, 1.0)?;

        let expected = [
            0.075113608,
            0.1238414032,
            0.075113608,
            0.1238414032,
            0.2041799556,
            0.1238414032,
            0.075113608,
            0.1238414032,
            0.075113608,
        ];

        assert_eq!(kernel.shape(), (3, 3));
        for (&k, &e) in kernel.as_slice().iter().zip(expected.iter()) {
            assert_relative_eq!(k, e, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_large_sigma_is_near_box() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(3, DEFAULT_SIGMA)?;
        assert_relative_eq!(kernel.at(0, 0).unwrap(), 0.1114406951, epsilon = 1e-9);
        assert_relative_eq!(kernel.at(-1, 0).unwrap(), 0.1111933241, epsilon = 1e-9);
        assert_relative_eq!(kernel.at(1, 1).unwrap(), 0.1109465021, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_normalized() -> Result<(), FilterError> {
        for kernel_size in (1..=21).step_by(2) {
            for sigma in [0.3, 1.0, 2.5, DEFAULT_SIGMA, 100.0] {
                let kernel = gaussian_kernel_2d(kernel_size, sigma)?;
                assert_eq!(kernel.as_slice().len(), kernel_size * kernel_size);
                assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-9);
                assert!(kernel.as_slice().iter().all(|&k| k >= 0.0));
            }
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_symmetric() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(7, 1.7)?;
        let half = kernel.half() as isize;
        for i in -half..=half {
            for j in -half..=half {
                assert_eq!(kernel.at(i, j), kernel.at(-i, -j));
                assert_eq!(kernel.at(i, j), kernel.at(j, i));
            }
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_single_tap() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(1, DEFAULT_SIGMA)?;
        assert_eq!(kernel.as_slice(), &[1.0]);
        assert_eq!(kernel.half(), 0);
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_invalid() {
        assert_eq!(
            gaussian_kernel_2d(4, 1.0),
            Err(FilterError::InvalidKernelSize(4))
        );
        assert_eq!(
            gaussian_kernel_2d(0, 1.0),
            Err(FilterError::InvalidKernelSize(0))
        );
        assert_eq!(
            gaussian_kernel_2d(3, 0.0),
            Err(FilterError::InvalidSigma(0.0))
        );
        assert!(matches!(
            gaussian_kernel_2d(3, f64::NAN),
            Err(FilterError::InvalidSigma(_))
        ));
    }

    #[test]
    fn test_kernel_accessors_bounds() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(5, 1.0)?;
        assert_eq!(kernel.half(), 2);
        assert_eq!(kernel.get(5, 0), None);
        assert_eq!(kernel.get(0, 5), None);
        assert_eq!(kernel.at(3, 0), None);
        assert_eq!(kernel.at(0, -3), None);
        assert_eq!(kernel.at(-2, -2), kernel.get(0, 0));
        assert_eq!(kernel.rows().count(), 5);
        Ok(())
    }
}
