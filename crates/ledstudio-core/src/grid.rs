//! Pixel types and the row-major grid every geometric transform works on.

use serde::{Deserialize, Serialize};

/// A single LED colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "(u8, u8, u8)", into = "(u8, u8, u8)")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black is the compositor's "transparent" colour.
    pub fn is_black(self) -> bool {
        self == Self::BLACK
    }

    /// Multiply every channel by `factor`, flooring the result.
    pub fn scale(self, factor: f32) -> Self {
        let f = |c: u8| (c as f32 * factor) as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn invert(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(c: Rgb) -> Self {
        (c.r, c.g, c.b)
    }
}

/// A flat, row-major frame of pixels as consumed by previews and exporters.
pub type PixelBuffer = Vec<Rgb>;

/// Pad with `fill` or truncate so that `values` holds exactly `len` entries.
pub fn fit_len<T: Copy>(values: &[T], len: usize, fill: T) -> Vec<T> {
    let mut out = Vec::with_capacity(len);
    out.extend(values.iter().take(len).copied());
    out.resize(len, fill);
    out
}

/// A width x height grid stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Build a grid from a flat sequence. Short input is padded with `fill`,
    /// long input is truncated.
    pub fn from_flat(width: usize, height: usize, flat: &[T], fill: T) -> Self {
        Self {
            width,
            height,
            cells: fit_len(flat, width * height, fill),
        }
    }

    pub fn into_flat(self) -> Vec<T> {
        self.cells
    }

    pub fn as_flat(&self) -> &[T] {
        &self.cells
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the cell at (x, y). Panics if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[y * self.width + x]
    }

    /// Bounds-checked lookup with signed coordinates.
    pub fn get_signed(&self, x: i64, y: i64) -> Option<T> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.get(x as usize, y as usize))
    }

    /// Set the cell at (x, y). Panics if out of bounds.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[y * self.width + x] = value;
    }

    /// Write a cell if the signed coordinates fall inside the grid.
    pub fn set_signed(&mut self, x: i64, y: i64, value: T) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.set(x as usize, y as usize, value);
        true
    }

    /// Build a same-sized grid where each cell is read from `src(x, y)`.
    pub fn remap<F>(&self, fill: T, src: F) -> Self
    where
        F: Fn(usize, usize) -> Option<(i64, i64)>,
    {
        let mut out = Self::filled(self.width, self.height, fill);
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some((sx, sy)) = src(x, y) {
                    if let Some(v) = self.get_signed(sx, sy) {
                        out.set(x, y, v);
                    }
                }
            }
        }
        out
    }
}
