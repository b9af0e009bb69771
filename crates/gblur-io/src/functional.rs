use std::path::Path;

use gblur_image::{Image, ImageSize};

use crate::{error::IoError, jpeg::write_image_jpeg_rgb8, png::write_image_png_rgb8};

/// A decoded 8-bit image with its channel count resolved at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericImage {
    /// 8-bit grayscale image
    L8(Image<u8, 1>),
    /// 8-bit grayscale image with alpha channel
    La8(Image<u8, 2>),
    /// 8-bit RGB image
    Rgb8(Image<u8, 3>),
    /// 8-bit RGB image with alpha channel
    Rgba8(Image<u8, 4>),
}

impl GenericImage {
    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            GenericImage::L8(image) => image.size(),
            GenericImage::La8(image) => image.size(),
            GenericImage::Rgb8(image) => image.size(),
            GenericImage::Rgba8(image) => image.size(),
        }
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        match self {
            GenericImage::L8(image) => image.num_channels(),
            GenericImage::La8(image) => image.num_channels(),
            GenericImage::Rgb8(image) => image.num_channels(),
            GenericImage::Rgba8(image) => image.num_channels(),
        }
    }
}

/// Reads an image from the given file path.
///
/// The method tries to read from any image format supported by the image crate.
/// 8-bit images keep their channel layout. Any other color type is converted to
/// rgb8, or to rgba8 when it carries an alpha channel.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An image containing the image data.
pub fn read_image_any(file_path: impl AsRef<Path>) -> Result<GenericImage, IoError> {
    let file_path = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(&file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let image = match img.color() {
        image::ColorType::L8 => {
            GenericImage::L8(Image::new(size, img.into_luma8().into_raw())?)
        }
        image::ColorType::La8 => {
            GenericImage::La8(Image::new(size, img.into_luma_alpha8().into_raw())?)
        }
        image::ColorType::Rgb8 => {
            GenericImage::Rgb8(Image::new(size, img.into_rgb8().into_raw())?)
        }
        color if color.has_alpha() => {
            GenericImage::Rgba8(Image::new(size, img.into_rgba8().into_raw())?)
        }
        _ => GenericImage::Rgb8(Image::new(size, img.into_rgb8().into_raw())?),
    };

    Ok(image)
}

/// Writes an rgb8 image, choosing the encoder from the file extension.
///
/// `jpg` and `jpeg` are encoded as JPEG with the given quality, `png` as PNG, where the
/// quality is ignored. The extension is matched case-insensitively.
///
/// # Arguments
///
/// * `file_path` - The path of the file to create.
/// * `image` - The image to encode.
/// * `quality` - The JPEG quality, from 0 (lowest) to 100 (highest).
pub fn write_image_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
    quality: u8,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => write_image_jpeg_rgb8(file_path, image, quality),
        Some("png") => write_image_png_rgb8(file_path, image),
        _ => Err(IoError::InvalidFileExtension(file_path.to_path_buf())),
    }
}
