use serde::{Deserialize, Serialize};

use crate::grid::{Rgb, fit_len};

/// Pixel payload of one layer track at one frame index.
///
/// `visible` and `opacity` are per-frame overrides; `None` inherits the
/// owning track's value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerFrame {
    pub pixels: Vec<Rgb>,
    /// Per-pixel alpha (255 = opaque). Missing entries read as 255.
    #[serde(default)]
    pub alpha: Option<Vec<u8>>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    opacity: Option<f32>,
    /// Per-pixel brightness mask in [0, 1].
    #[serde(default)]
    pub mask: Option<Vec<f32>>,
}

impl LayerFrame {
    pub fn new(pixels: Vec<Rgb>) -> Self {
        Self {
            pixels,
            ..Self::default()
        }
    }

    /// Black pixels with every alpha entry set to `alpha`.
    pub fn blank(pixel_count: usize, alpha: u8) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; pixel_count],
            alpha: Some(vec![alpha; pixel_count]),
            ..Self::default()
        }
    }

    pub fn with_alpha(mut self, alpha: Vec<u8>) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn opacity(&self) -> Option<f32> {
        self.opacity
    }

    /// Set or clear the opacity override. Values are clamped to [0, 1].
    pub fn set_opacity(&mut self, opacity: Option<f32>) {
        self.opacity = opacity.map(|o| o.clamp(0.0, 1.0));
    }

    /// Set the mask, clamping every value to [0, 1].
    pub fn set_mask(&mut self, mask: &[f32]) {
        self.mask = Some(mask.iter().map(|v| v.clamp(0.0, 1.0)).collect());
    }

    /// Alpha at `index`, defaulting to 255 when the alpha array is missing or short.
    pub fn get_pixel_alpha(&self, index: usize) -> u8 {
        self.alpha
            .as_ref()
            .and_then(|a| a.get(index).copied())
            .unwrap_or(255)
    }

    /// Make sure the alpha array exists with exactly `pixel_count` entries.
    pub fn ensure_alpha(&mut self, pixel_count: usize) {
        self.alpha
            .get_or_insert_with(Vec::new)
            .resize(pixel_count, 255);
    }

    /// Pixels padded with black or truncated to `pixel_count`.
    pub fn fitted_pixels(&self, pixel_count: usize) -> Vec<Rgb> {
        fit_len(&self.pixels, pixel_count, Rgb::BLACK)
    }

    /// Alpha padded with 255 or truncated to `pixel_count`.
    pub fn fitted_alpha(&self, pixel_count: usize) -> Vec<u8> {
        match &self.alpha {
            Some(alpha) => fit_len(alpha, pixel_count, 255),
            None => vec![255; pixel_count],
        }
    }

    /// Pixels scaled per channel by the mask. Without a mask the pixels are
    /// returned as stored.
    pub fn apply_mask(&self, width: usize, height: usize) -> Vec<Rgb> {
        let Some(mask) = &self.mask else {
            return self.pixels.clone();
        };
        let expected = width * height;
        let mask = fit_len(mask, expected, 1.0);
        self.fitted_pixels(expected)
            .into_iter()
            .zip(mask)
            .map(|(pixel, m)| pixel.scale(m))
            .collect()
    }

    /// Pad or truncate pixels, alpha and mask together after a pattern resize.
    pub fn resize(&mut self, pixel_count: usize) {
        self.pixels.resize(pixel_count, Rgb::BLACK);
        if let Some(alpha) = &mut self.alpha {
            alpha.resize(pixel_count, 255);
        }
        if let Some(mask) = &mut self.mask {
            mask.resize(pixel_count, 1.0);
        }
    }
}
