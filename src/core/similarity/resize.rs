//! SIMD-accelerated grayscale resizing.
//!
//! Uses fast_image_resize, which picks AVX2/NEON paths when available.

use crate::error::SimilarityError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{GrayImage, ImageBuffer};

/// Grayscale resizer; keep one per thread to reuse its scratch buffers
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize a grayscale image to exactly `width` x `height`.
    ///
    /// Returns the input untouched when it already has that size.
    pub fn resize(
        &mut self,
        gray: GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, SimilarityError> {
        if gray.width() == width && gray.height() == height {
            return Ok(gray);
        }

        if gray.width() == 0 || gray.height() == 0 || width == 0 || height == 0 {
            return Err(SimilarityError::Computation(format!(
                "cannot resize {}x{} image to {}x{}",
                gray.width(),
                gray.height(),
                width,
                height
            )));
        }

        let src_image = Image::from_vec_u8(gray.width(), gray.height(), gray.into_raw(), PixelType::U8)
            .map_err(|e| SimilarityError::Computation(format!("invalid source image: {}", e)))?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| SimilarityError::Computation(format!("resize failed: {}", e)))?;

        ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
            SimilarityError::Computation("resized buffer does not match dimensions".to_string())
        })
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}
