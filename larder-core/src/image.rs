//! Recipe image validation and upload naming.
//!
//! Uploaded bytes are sniffed and fully decoded before they are accepted, so a
//! file with an image extension but non-image content is rejected.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use uuid::Uuid;

/// Allowed image formats for recipe images.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum file size for images (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Directory, relative to the media root, that holds recipe images.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("The submitted file is empty.")]
    Empty,

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,

    #[error("Unsupported image format: {0}. Allowed: JPEG, PNG, GIF, WebP")]
    Unsupported(String),
}

/// An upload that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedImage {
    pub format: ImageFormat,
}

impl ValidatedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Canonical extension for the detected format, e.g. `"png"`.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

/// Validate uploaded image bytes: size, detected format, and that they decode.
pub fn validate_image(data: &[u8]) -> Result<ValidatedImage, ImageError> {
    if data.is_empty() {
        return Err(ImageError::Empty);
    }

    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge {
            size: data.len(),
            max: MAX_FILE_SIZE,
        });
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| ImageError::NotAnImage)?;

    let format = reader.format().ok_or(ImageError::NotAnImage)?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::Unsupported(format!("{format:?}")));
    }

    reader.decode().map_err(|_| ImageError::NotAnImage)?;

    Ok(ValidatedImage { format })
}

/// Lower-cased extension of the client's filename, kept only when it names
/// the detected format (`photo.JPEG` for a JPEG, not `photo.html` for a PNG).
fn filename_extension(filename: &str, image: &ValidatedImage) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    image
        .format
        .extensions_str()
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Storage path, relative to the media root, for a new recipe image:
/// `uploads/recipe/<uuid>.<ext>`.
///
/// The extension comes from the uploaded filename when it matches the
/// detected format, otherwise from the format itself.
pub fn recipe_image_path(original_filename: Option<&str>, image: &ValidatedImage) -> String {
    let ext = original_filename
        .and_then(|name| filename_extension(name, image))
        .unwrap_or_else(|| image.extension().to_string());

    format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 4, Rgb([200, 10, 10]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_validate_png() {
        let image = validate_image(&png_bytes()).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_validate_invalid_format() {
        assert_eq!(validate_image(b"not an image"), Err(ImageError::NotAnImage));
    }

    #[test]
    fn test_validate_empty() {
        assert_eq!(validate_image(&[]), Err(ImageError::Empty));
    }

    #[test]
    fn test_validate_truncated_jpeg() {
        // Detected as JPEG from the header but does not decode.
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0];
        assert_eq!(validate_image(&jpeg_header), Err(ImageError::NotAnImage));
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 4, Rgb([10, 200, 10]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_recipe_image_path_keeps_matching_extension() {
        let image = validate_image(&jpeg_bytes()).unwrap();
        for (filename, expected) in [("myimage.JPG", "jpg"), ("photo.jpeg", "jpeg")] {
            let path = recipe_image_path(Some(filename), &image);

            let name = path.strip_prefix("uploads/recipe/").unwrap();
            let (stem, ext) = name.rsplit_once('.').unwrap();
            assert_eq!(ext, expected);
            assert!(Uuid::parse_str(stem).is_ok());
        }
    }

    #[test]
    fn test_recipe_image_path_falls_back_to_format() {
        let image = validate_image(&png_bytes()).unwrap();
        for filename in [
            None,
            Some("noext"),
            Some("weird.p/g"),
            Some("evil.html"),
            Some("setup.exe"),
            Some("other.jpg"),
        ] {
            assert!(recipe_image_path(filename, &image).ends_with(".png"));
        }
    }

    #[test]
    fn test_recipe_image_path_fits_column() {
        let image = validate_image(&png_bytes()).unwrap();
        let long_ext = format!("a.{}", "x".repeat(240));
        let long_stem = format!("{}.png", "y".repeat(300));
        for filename in [long_ext.as_str(), long_stem.as_str()] {
            assert!(recipe_image_path(Some(filename), &image).len() <= 255);
        }
    }

    #[test]
    fn test_recipe_image_paths_are_unique() {
        let image = validate_image(&png_bytes()).unwrap();
        assert_ne!(
            recipe_image_path(Some("a.png"), &image),
            recipe_image_path(Some("a.png"), &image)
        );
    }
}
