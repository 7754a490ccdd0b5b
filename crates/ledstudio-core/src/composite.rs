use serde::{Deserialize, Serialize};

use crate::grid::Rgb;

/// Scale brightness by `opacity`, flooring each channel.
///
/// Opacity of 1.0 or more leaves the pixels untouched.
pub fn apply_opacity(pixels: &mut [Rgb], opacity: f32) {
    if opacity >= 1.0 {
        return;
    }
    let opacity = opacity.max(0.0);
    for pixel in pixels {
        *pixel = pixel.scale(opacity);
    }
}

/// Copy every non-black pixel of `layer` over `buffer`. Black is transparent.
pub fn overwrite_nonblack(buffer: &mut [Rgb], layer: &[Rgb]) {
    for (dst, &src) in buffer.iter_mut().zip(layer) {
        if !src.is_black() {
            *dst = src;
        }
    }
}

/// How `LayerStack::merge_tracks` folds a source layer into the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Linear mix weighted by the source's opacity.
    #[default]
    Composite,
    /// The source replaces the target outright when more than half opaque.
    Replace,
}

/// Fold `source` into `target` in place.
pub fn merge_into(target: &mut [Rgb], source: &[Rgb], opacity: f32, mode: MergeMode) {
    match mode {
        MergeMode::Composite => {
            for (t, &s) in target.iter_mut().zip(source) {
                *t = mix(*t, s, opacity);
            }
        }
        MergeMode::Replace => {
            if opacity > 0.5 {
                for (t, &s) in target.iter_mut().zip(source) {
                    *t = s;
                }
            }
        }
    }
}

fn mix(target: Rgb, source: Rgb, opacity: f32) -> Rgb {
    let channel = |t: u8, s: u8| (t as f32 * (1.0 - opacity) + s as f32 * opacity) as u8;
    Rgb::new(
        channel(target.r, source.r),
        channel(target.g, source.g),
        channel(target.b, source.b),
    )
}
