#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use gblur_image as image;

#[doc(inline)]
pub use gblur_imgproc as imgproc;

#[doc(inline)]
pub use gblur_io as io;

/// command line application: argument parsing and the blur run.
pub mod app;

/// append-only log of the convolution timings.
pub mod timing;
