//! Keyframed per-track animation from before automation actions existed.
//!
//! A track only falls back to its legacy animation when it carries no
//! automation actions. Keyframe positions are normalised: 0 is the first
//! frame of the animation window and 100 the last.

use serde::{Deserialize, Serialize};

use crate::automation::{RotateDirection, ScrollDirection};
use crate::grid::{Grid, Rgb};
use crate::transforms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    #[default]
    None,
    Scroll,
    Fade,
    Pulse,
    Rotate,
    Scale,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedProperty {
    OffsetX,
    OffsetY,
    Rotation,
    Scale,
    Opacity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationKeyframe {
    /// Normalised position, 0..=100.
    pub frame_index: u32,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
    /// Degrees.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl AnimationKeyframe {
    pub fn at(frame_index: u32) -> Self {
        Self {
            frame_index,
            opacity: None,
            visible: None,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            scale: 1.0,
        }
    }

    fn value(&self, property: AnimatedProperty) -> Option<f32> {
        match property {
            AnimatedProperty::OffsetX => Some(self.offset_x),
            AnimatedProperty::OffsetY => Some(self.offset_y),
            AnimatedProperty::Rotation => Some(self.rotation),
            AnimatedProperty::Scale => Some(self.scale),
            AnimatedProperty::Opacity => self.opacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAnimation {
    pub kind: AnimationKind,
    /// Multiplier on keyframe progression and on scroll offsets.
    pub speed: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub keyframes: Vec<AnimationKeyframe>,
    pub start_frame: usize,
    /// Inclusive; `None` runs to the last pattern frame.
    pub end_frame: Option<usize>,
}

impl Default for LegacyAnimation {
    fn default() -> Self {
        Self {
            kind: AnimationKind::None,
            speed: 1.0,
            looping: true,
            keyframes: Vec::new(),
            start_frame: 0,
            end_frame: None,
        }
    }
}

impl LegacyAnimation {
    /// Scroll the layer one full extent across the animation window.
    pub fn scroll(direction: ScrollDirection, speed: f32) -> Self {
        let mut end = AnimationKeyframe::at(100);
        match direction {
            ScrollDirection::Right => end.offset_x = 1.0,
            ScrollDirection::Left => end.offset_x = -1.0,
            ScrollDirection::Down => end.offset_y = 1.0,
            ScrollDirection::Up => end.offset_y = -1.0,
        }
        Self {
            kind: AnimationKind::Scroll,
            speed,
            keyframes: vec![AnimationKeyframe::at(0), end],
            ..Self::default()
        }
    }

    pub fn fade(fade_in: bool, start_frame: usize, duration_frames: usize) -> Self {
        let (from, to) = if fade_in { (0.0, 1.0) } else { (1.0, 0.0) };
        Self {
            kind: AnimationKind::Fade,
            keyframes: vec![
                AnimationKeyframe {
                    opacity: Some(from),
                    ..AnimationKeyframe::at(0)
                },
                AnimationKeyframe {
                    opacity: Some(to),
                    ..AnimationKeyframe::at(100)
                },
            ],
            start_frame,
            end_frame: Some(start_frame + duration_frames),
            ..Self::default()
        }
    }

    pub fn pulse(min_opacity: f32, max_opacity: f32) -> Self {
        let key = |frame_index, opacity| AnimationKeyframe {
            opacity: Some(opacity),
            ..AnimationKeyframe::at(frame_index)
        };
        Self {
            kind: AnimationKind::Pulse,
            keyframes: vec![
                key(0, min_opacity),
                key(50, max_opacity),
                key(100, min_opacity),
            ],
            ..Self::default()
        }
    }

    pub fn with_window(mut self, start_frame: usize, end_frame: Option<usize>) -> Self {
        self.start_frame = start_frame;
        self.end_frame = end_frame;
        self
    }

    /// Last frame of the window given the pattern length.
    fn window_end(&self, total_frames: usize) -> Option<usize> {
        match self.end_frame {
            Some(end) => Some(end),
            None => total_frames.checked_sub(1),
        }
    }

    /// Position of `frame_index` on the normalised 0..=100 keyframe axis.
    fn normalised_position(&self, frame_index: usize, total_frames: usize) -> Option<u32> {
        let end = self.window_end(total_frames)?;
        if frame_index < self.start_frame || frame_index > end {
            return None;
        }
        let length = end - self.start_frame + 1;
        let local = frame_index - self.start_frame;
        let mut sped = (local as f32 * self.speed).max(0.0) as usize;
        if self.looping {
            sped %= length;
        } else {
            sped = sped.min(length - 1);
        }
        let normalised = (sped as f32 / length as f32 * 100.0) as u32;
        Some(normalised.min(100))
    }

    /// Interpolated value of `property` at `frame_index`, or `None` when the
    /// frame lies outside the window or no keyframe carries the property.
    pub fn property_at(
        &self,
        frame_index: usize,
        total_frames: usize,
        property: AnimatedProperty,
    ) -> Option<f32> {
        if self.keyframes.is_empty() {
            return None;
        }
        let pos = self.normalised_position(frame_index, total_frames)?;

        let before = self.keyframes.iter().rev().find(|k| k.frame_index <= pos);
        let after = self.keyframes.iter().find(|k| k.frame_index >= pos);

        match (before, after) {
            (Some(b), _) if b.frame_index == pos => b.value(property),
            (_, Some(a)) if a.frame_index == pos => a.value(property),
            (Some(b), Some(a)) => {
                let t = (pos - b.frame_index) as f32 / (a.frame_index - b.frame_index) as f32;
                match (b.value(property), a.value(property)) {
                    (Some(bv), Some(av)) => Some(bv + (av - bv) * t),
                    (bv, av) => bv.or(av),
                }
            }
            (Some(k), None) | (None, Some(k)) => k.value(property),
            (None, None) => None,
        }
    }

    /// Transform `pixels` for `frame_index`. Alpha is never moved by a legacy
    /// animation.
    pub fn apply(
        &self,
        pixels: Vec<Rgb>,
        frame_index: usize,
        total_frames: usize,
        width: usize,
        height: usize,
    ) -> Vec<Rgb> {
        let prop = |p| self.property_at(frame_index, total_frames, p);
        match self.kind {
            AnimationKind::None => pixels,
            AnimationKind::Scroll => {
                let ox = prop(AnimatedProperty::OffsetX).map(|v| v * self.speed);
                let oy = prop(AnimatedProperty::OffsetY).map(|v| v * self.speed);
                if ox.is_none() && oy.is_none() {
                    return pixels;
                }
                let dx = (ox.unwrap_or(0.0) * width as f32) as i64;
                let dy = (oy.unwrap_or(0.0) * height as f32) as i64;
                let grid = Grid::from_flat(width, height, &pixels, Rgb::BLACK);
                transforms::scroll(&grid, dx, dy, Rgb::BLACK).into_flat()
            }
            AnimationKind::Rotate => match prop(AnimatedProperty::Rotation) {
                Some(degrees) => {
                    let turns = (degrees / 90.0).round() as i64;
                    let grid = Grid::from_flat(width, height, &pixels, Rgb::BLACK);
                    transforms::rotate(
                        &grid,
                        RotateDirection::Clockwise,
                        turns.rem_euclid(4) as usize,
                        Rgb::BLACK,
                    )
                    .into_flat()
                }
                None => pixels,
            },
            AnimationKind::Scale => match prop(AnimatedProperty::Scale) {
                Some(factor) => {
                    let grid = Grid::from_flat(width, height, &pixels, Rgb::BLACK);
                    transforms::scale_nearest(&grid, factor, Rgb::BLACK).into_flat()
                }
                None => pixels,
            },
            AnimationKind::Fade | AnimationKind::Pulse => match prop(AnimatedProperty::Opacity) {
                Some(opacity) => {
                    let opacity = opacity.clamp(0.0, 1.0);
                    pixels.into_iter().map(|p| p.scale(opacity)).collect()
                }
                None => pixels,
            },
            AnimationKind::Custom => {
                tracing::warn!("custom legacy animation has no built-in transform, skipped");
                pixels
            }
        }
    }
}
