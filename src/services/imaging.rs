// src/services/imaging.rs
// DOCUMENTATION: Image decoding and thumbnail generation
// PURPOSE: Read dimensions and produce JPEG thumbnails off the async workers

use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::sync::Arc;

use crate::errors::FolioError;

const THUMBNAIL_QUALITY: u8 = 82;

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    /// JPEG bytes, longest edge bounded by the requested size
    pub thumbnail: Vec<u8>,
}

/// Decode an image and build its thumbnail. CPU bound.
pub fn process_image(bytes: &[u8], max_edge: u32) -> Result<ProcessedImage, FolioError> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        log::warn!("Could not decode uploaded image: {}", e);
        FolioError::UnsupportedMediaType(format!("undecodable image: {}", e))
    })?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(FolioError::InvalidInput("Image has no pixels".to_string()));
    }

    let thumb = if width.max(height) > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(thumb.to_rgb8());
    let mut thumbnail = Vec::new();
    rgb.write_to(
        &mut Cursor::new(&mut thumbnail),
        ImageOutputFormat::Jpeg(THUMBNAIL_QUALITY),
    )
    .map_err(|e| {
        log::error!("Failed to encode thumbnail: {}", e);
        FolioError::InternalError
    })?;

    Ok(ProcessedImage {
        width,
        height,
        thumbnail,
    })
}

/// Run `process_image` on the blocking pool
pub async fn process_image_blocking(
    bytes: Arc<Vec<u8>>,
    max_edge: u32,
) -> Result<ProcessedImage, FolioError> {
    tokio::task::spawn_blocking(move || process_image(&bytes, max_edge))
        .await
        .map_err(|e| {
            log::error!("Image worker panicked: {}", e);
            FolioError::InternalError
        })?
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 255) as u8, (y % 255) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ImageKind;

    #[test]
    fn test_process_image_reads_dimensions_and_bounds_thumbnail() {
        let processed = process_image(&sample_png(300, 150), 64).unwrap();
        assert_eq!((processed.width, processed.height), (300, 150));

        assert_eq!(ImageKind::detect(&processed.thumbnail), Some(ImageKind::Jpeg));
        let thumb = image::load_from_memory(&processed.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (64, 32));
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let processed = process_image(&sample_png(20, 10), 64).unwrap();
        let thumb = image::load_from_memory(&processed.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (20, 10));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = process_image(b"\xFF\xD8\xFFnot really a jpeg", 64).unwrap_err();
        assert!(matches!(err, FolioError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_blocking_wrapper() {
        let processed = process_image_blocking(Arc::new(sample_png(10, 10)), 64).await.unwrap();
        assert_eq!(processed.width, 10);
    }
}
