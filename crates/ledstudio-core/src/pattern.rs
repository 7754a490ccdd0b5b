use serde::{Deserialize, Serialize};

use crate::grid::{Rgb, fit_len};

pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

/// One flat frame of the host pattern: what the device actually plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub pixels: Vec<Rgb>,
    pub duration_ms: u32,
}

impl Frame {
    pub fn new(pixels: Vec<Rgb>, duration_ms: u32) -> Self {
        Self {
            pixels,
            duration_ms,
        }
    }

    pub fn blank(pixel_count: usize) -> Self {
        Self::new(vec![Rgb::BLACK; pixel_count], DEFAULT_FRAME_DURATION_MS)
    }
}

/// The LED-matrix pattern the layer stack composites into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub frames: Vec<Frame>,
}

impl Pattern {
    /// An empty pattern with no frames.
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            frames: Vec::new(),
        }
    }

    /// A pattern of `frame_count` black frames.
    pub fn blank(name: impl Into<String>, width: usize, height: usize, frame_count: usize) -> Self {
        let mut pattern = Self::new(name, width, height);
        pattern.frames = (0..frame_count)
            .map(|_| Frame::blank(width * height))
            .collect();
        pattern
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Change dimensions, padding or truncating every frame's pixels.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let count = self.pixel_count();
        for frame in &mut self.frames {
            frame.pixels = fit_len(&frame.pixels, count, Rgb::BLACK);
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new("Untitled", 8, 8)
    }
}
