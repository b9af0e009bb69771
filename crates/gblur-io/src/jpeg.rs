use crate::error::IoError;
use gblur_image::Image;
use jpeg_encoder::{ColorType, Encoder};
use std::path::Path;

/// JPEG quality used when none is given, the highest the encoder supports.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Writes the given JPEG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG image.
/// - `image` - The image containing the RGB data.
/// - `quality` - The quality of the JPEG encoding, range from 0 (lowest) to 100 (highest)
///
/// # Errors
///
/// If a side of the image is larger than 65535 pixels or the encoding fails.
pub fn write_image_jpeg_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
    quality: u8,
) -> Result<(), IoError> {
    let image_size = image.size();
    let (Ok(width), Ok(height)) = (
        u16::try_from(image_size.width),
        u16::try_from(image_size.height),
    ) else {
        return Err(IoError::ImageTooLarge(
            image_size.width,
            image_size.height,
            "jpeg",
        ));
    };

    let encoder = Encoder::new_file(file_path, quality)?;
    encoder.encode(image.as_slice(), width, height, ColorType::Rgb)?;
    Ok(())
}
