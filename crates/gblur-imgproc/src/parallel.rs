use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// There is nothing to partition.
    #[error("cannot partition an empty workload")]
    EmptyWorkload,

    /// The ranges are unsorted or share elements.
    #[error("range {start}..{end} overlaps or precedes the previous range ending at {previous_end}")]
    OverlappingRanges {
        /// Start of the offending range.
        start: usize,
        /// End of the offending range.
        end: usize,
        /// End of the range that came before it.
        previous_end: usize,
    },

    /// A range reaches past the end of the buffer.
    #[error("range ending at element {0} does not fit in a buffer of {1} elements")]
    RangeOutOfBounds(usize, usize),
}

/// Controls how parallel operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or as the reference result for the
    /// threaded path.
    #[default]
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// The pool is created on every call and dropped once all tasks joined.
    Fixed(usize),
}

/// A contiguous half-open range `[start, end)` of flat pixel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkRange {
    /// First pixel index of the range.
    pub start: usize,
    /// One past the last pixel index of the range.
    pub end: usize,
}

impl WorkRange {
    /// Create a new range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of pixels in the range.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the pixel index `p` belongs to the range.
    pub fn contains(&self, p: usize) -> bool {
        p >= self.start && p < self.end
    }
}

/// What to do with the pixels left over by the floor division of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Leave the trailing `total % workers` pixels unassigned.
    ///
    /// Their output pixels keep the value the buffer was initialized with.
    #[default]
    Drop,

    /// Extend the last range up to the end of the workload.
    AssignToLast,
}

/// Split `total` pixels into `workers` equal contiguous ranges.
///
/// Worker `k` owns `[k * block, (k + 1) * block)` with `block = total / workers`.
/// When `total` is not a multiple of `workers` the trailing pixels belong to no range.
///
/// # Errors
///
/// If `total` or `workers` is zero.
///
/// # Example
///
/// ```
/// use gblur_imgproc::parallel::{partition, WorkRange};
///
/// let ranges = partition(10, 3).unwrap();
/// assert_eq!(
///     ranges,
///     vec![WorkRange::new(0, 3), WorkRange::new(3, 6), WorkRange::new(6, 9)]
/// );
/// ```
pub fn partition(total: usize, workers: usize) -> Result<Vec<WorkRange>, ParallelError> {
    partition_with(total, workers, RemainderPolicy::Drop)
}

/// Split `total` pixels into `workers` contiguous ranges with a remainder policy.
///
/// With [`RemainderPolicy::Drop`] this is exactly [`partition`]. With
/// [`RemainderPolicy::AssignToLast`] the last range ends at `total`.
///
/// When `workers > total` the block size is zero and every range is empty
/// under [`RemainderPolicy::Drop`].
pub fn partition_with(
    total: usize,
    workers: usize,
    policy: RemainderPolicy,
) -> Result<Vec<WorkRange>, ParallelError> {
    if workers == 0 {
        return Err(ParallelError::InvalidThreadCount(workers));
    }

    if total == 0 {
        return Err(ParallelError::EmptyWorkload);
    }

    let block = total / workers;
    let mut ranges = (0..workers)
        .map(|k| WorkRange::new(k * block, (k + 1) * block))
        .collect::<Vec<_>>();

    if policy == RemainderPolicy::AssignToLast {
        if let Some(last) = ranges.last_mut() {
            last.end = total;
        }
    }

    Ok(ranges)
}

/// Hand out one mutable sub-slice per range of a flat buffer.
///
/// Each range selects `range.len() * stride` elements starting at `range.start * stride`.
/// The slices are carved with `split_at_mut`, so they are disjoint by construction.
///
/// # Errors
///
/// If the ranges are not sorted and non-overlapping, or do not fit in `buf`.
pub fn split_disjoint_mut<'a, T>(
    buf: &'a mut [T],
    ranges: &[WorkRange],
    stride: usize,
) -> Result<Vec<&'a mut [T]>, ParallelError> {
    let buf_len = buf.len();
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = buf;
    let mut previous_end = 0;

    for range in ranges {
        if range.start < previous_end || range.end < range.start {
            return Err(ParallelError::OverlappingRanges {
                start: range.start,
                end: range.end,
                previous_end,
            });
        }

        if range.end * stride > buf_len {
            return Err(ParallelError::RangeOutOfBounds(range.end * stride, buf_len));
        }

        let skip = (range.start - previous_end) * stride;
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
        let (chunk, tail) = tail.split_at_mut(range.len() * stride);
        chunks.push(chunk);

        rest = tail;
        previous_end = range.end;
    }

    Ok(chunks)
}

/// Run one closure invocation per task and wait for all of them.
///
/// With [`ExecutionStrategy::Fixed`] a fresh pool of `n` threads is built, every task
/// is spawned inside a single scope and the call returns once the scope has joined.
/// No ordering between tasks is guaranteed. With [`ExecutionStrategy::Serial`] the
/// tasks run in order on the calling thread.
///
/// # Errors
///
/// If the thread count is zero or the pool cannot be built.
pub fn run_tasks<T, F>(
    strategy: ExecutionStrategy,
    tasks: Vec<T>,
    op: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(T) + Sync + Send,
{
    match strategy {
        ExecutionStrategy::Serial => {
            tasks.into_iter().for_each(op);
        }
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("gblur-worker-{i}"))
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            let op = &op;
            pool.scope(move |s| {
                for task in tasks {
                    s.spawn(move |_| op(task));
                }
            });
        }
    }
    Ok(())
}
