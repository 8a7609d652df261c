//! Windowed structural similarity (SSIM) over grayscale images.

use super::{FastDecoder, FastResizer, SimilarityProvider, SimilarityScore};
use crate::error::SimilarityError;
use image::GrayImage;
use std::path::Path;

/// Stabilizing constants for 8-bit dynamic range
const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// SSIM parameters
#[derive(Debug, Clone)]
pub struct SsimConfig {
    /// Gaussian window width in pixels (forced odd)
    pub window_size: usize,
    /// Gaussian standard deviation
    pub sigma: f64,
    /// Downscale so the longer side is at most this many pixels
    pub max_dimension: Option<u32>,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window_size: 11,
            sigma: 1.5,
            max_dimension: None,
        }
    }
}

/// SSIM-based similarity provider
pub struct SsimComparator {
    config: SsimConfig,
    kernel: Vec<f64>,
}

impl SsimComparator {
    pub fn new(config: SsimConfig) -> Self {
        let size = config.window_size.max(1) | 1;
        let sigma = if config.sigma > 0.0 { config.sigma } else { 1.5 };
        Self {
            kernel: gaussian_kernel(size, sigma),
            config,
        }
    }

    /// Score two already-decoded grayscale images
    pub fn compare_images(
        &self,
        a: GrayImage,
        b: GrayImage,
    ) -> Result<SimilarityScore, SimilarityError> {
        let (width, height) = self.target_size(&a, &b);

        let mut resizer = FastResizer::new();
        let a = resizer.resize(a, width, height)?;
        let b = resizer.resize(b, width, height)?;

        let x: Vec<f64> = a.as_raw().iter().map(|&p| p as f64).collect();
        let y: Vec<f64> = b.as_raw().iter().map(|&p| p as f64).collect();

        Ok(SimilarityScore::new(self.mean_ssim(
            &x,
            &y,
            width as usize,
            height as usize,
        )))
    }

    /// Common size both images are compared at.
    ///
    /// Depends only on the unordered pair of sizes, which keeps the score
    /// symmetric.
    fn target_size(&self, a: &GrayImage, b: &GrayImage) -> (u32, u32) {
        let width = a.width().min(b.width());
        let height = a.height().min(b.height());

        match self.config.max_dimension {
            Some(max) if max > 0 && width.max(height) > max => {
                let scale = max as f64 / width.max(height) as f64;
                let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
                (scaled(width), scaled(height))
            }
            _ => (width, height),
        }
    }

    fn mean_ssim(&self, x: &[f64], y: &[f64], width: usize, height: usize) -> f64 {
        let xx: Vec<f64> = x.iter().map(|v| v * v).collect();
        let yy: Vec<f64> = y.iter().map(|v| v * v).collect();
        let xy: Vec<f64> = x.iter().zip(y).map(|(a, b)| a * b).collect();

        let mu_x = self.blur(x, width, height);
        let mu_y = self.blur(y, width, height);
        let blur_xx = self.blur(&xx, width, height);
        let blur_yy = self.blur(&yy, width, height);
        let blur_xy = self.blur(&xy, width, height);

        let total: f64 = (0..x.len())
            .map(|i| {
                let (mx, my) = (mu_x[i], mu_y[i]);
                let var_x = blur_xx[i] - mx * mx;
                let var_y = blur_yy[i] - my * my;
                let cov = blur_xy[i] - mx * my;

                let numerator = (2.0 * mx * my + C1) * (2.0 * cov + C2);
                let denominator = (mx * mx + my * my + C1) * (var_x + var_y + C2);
                numerator / denominator
            })
            .sum();

        total / x.len() as f64
    }

    /// Separable Gaussian blur with reflect-101 borders
    fn blur(&self, src: &[f64], width: usize, height: usize) -> Vec<f64> {
        let radius = (self.kernel.len() / 2) as isize;

        let mut horizontal = vec![0.0; src.len()];
        for row in 0..height {
            let line = &src[row * width..(row + 1) * width];
            for col in 0..width {
                horizontal[row * width + col] = self
                    .kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * line[reflect_101(col as isize + k as isize - radius, width)])
                    .sum();
            }
        }

        let mut out = vec![0.0; src.len()];
        for row in 0..height {
            for col in 0..width {
                out[row * width + col] = self
                    .kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let r = reflect_101(row as isize + k as isize - radius, height);
                        w * horizontal[r * width + col]
                    })
                    .sum();
            }
        }

        out
    }

    fn load_gray(path: &Path) -> Result<GrayImage, SimilarityError> {
        let gray = FastDecoder::decode(path)?.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(SimilarityError::Decode {
                path: path.to_path_buf(),
                reason: "image has no pixels".to_string(),
            });
        }
        Ok(gray)
    }
}

impl Default for SsimComparator {
    fn default() -> Self {
        Self::new(SsimConfig::default())
    }
}

impl SimilarityProvider for SsimComparator {
    fn similarity(&self, a: &Path, b: &Path) -> Result<SimilarityScore, SimilarityError> {
        let gray_a = Self::load_gray(a)?;
        let gray_b = Self::load_gray(b)?;
        self.compare_images(gray_a, gray_b)
    }
}

/// Normalized 1-D Gaussian weights
fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size / 2) as f64;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Mirror an out-of-range index without repeating the edge pixel
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}
