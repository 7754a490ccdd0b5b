use crate::automation::{Axis, CycleMode, RevealEdge, RotateDirection, WipeMode};
use crate::grid::{Grid, Rgb};

// =============================================================================
// Geometric transforms (shared by pixels and alpha)
// =============================================================================

/// Shift every cell by (dx, dy). Cells whose source falls outside the grid
/// take `fill`; nothing wraps.
pub fn scroll<T: Copy>(grid: &Grid<T>, dx: i64, dy: i64, fill: T) -> Grid<T> {
    if dx == 0 && dy == 0 {
        return grid.clone();
    }
    grid.remap(fill, |x, y| Some((x as i64 - dx, y as i64 - dy)))
}

/// One quarter turn inside the fixed width x height buffer.
///
/// Clockwise moves (x, y) to (h-1-y, x), counter-clockwise to (y, w-1-x).
/// On non-square grids destinations outside the buffer are dropped and
/// unreached cells take `fill`.
pub fn rotate_quarter<T: Copy>(grid: &Grid<T>, direction: RotateDirection, fill: T) -> Grid<T> {
    let (w, h) = (grid.width() as i64, grid.height() as i64);
    let mut out = Grid::filled(grid.width(), grid.height(), fill);
    for y in 0..h {
        for x in 0..w {
            let (nx, ny) = match direction {
                RotateDirection::Clockwise => (h - 1 - y, x),
                RotateDirection::CounterClockwise => (y, w - 1 - x),
            };
            out.set_signed(nx, ny, grid.get(x as usize, y as usize));
        }
    }
    out
}

/// `turns mod 4` successive quarter turns.
pub fn rotate<T: Copy>(grid: &Grid<T>, direction: RotateDirection, turns: usize, fill: T) -> Grid<T> {
    let mut out = grid.clone();
    for _ in 0..turns % 4 {
        out = rotate_quarter(&out, direction, fill);
    }
    out
}

/// Reflect across an axis. `Horizontal` reverses each row (left/right),
/// `Vertical` reverses the row order (top/bottom).
pub fn reflect<T: Copy>(grid: &Grid<T>, axis: Axis) -> Grid<T> {
    let (w, h) = (grid.width(), grid.height());
    let mut out = grid.clone();
    for y in 0..h {
        for x in 0..w {
            let v = match axis {
                Axis::Horizontal => grid.get(w - 1 - x, y),
                Axis::Vertical => grid.get(x, h - 1 - y),
            };
            out.set(x, y, v);
        }
    }
    out
}

/// Nearest-neighbour scale about the grid centre.
pub fn scale_nearest<T: Copy>(grid: &Grid<T>, factor: f32, fill: T) -> Grid<T> {
    if factor <= 0.0 {
        return Grid::filled(grid.width(), grid.height(), fill);
    }
    if factor == 1.0 {
        return grid.clone();
    }
    let cx = grid.width() as f32 / 2.0;
    let cy = grid.height() as f32 / 2.0;
    grid.remap(fill, |x, y| {
        let sx = cx + (x as f32 + 0.5 - cx) / factor;
        let sy = cy + (y as f32 + 0.5 - cy) / factor;
        Some((sx.floor() as i64, sy.floor() as i64))
    })
}

// =============================================================================
// Pixel-only transforms
// =============================================================================

fn fade_factor(p: usize, pos: usize, extent: usize) -> f32 {
    if p < pos {
        return 1.0;
    }
    let span = extent.saturating_sub(pos).max(1) as f32;
    (1.0 - (p - pos) as f32 / span).max(0.0)
}

/// Fade cells at or beyond the wipe threshold linearly toward black.
///
/// The threshold is measured from the leading edge of `mode` and clamped to
/// the grid extent along that direction.
pub fn wipe(grid: &Grid<Rgb>, mode: WipeMode, pos: usize) -> Grid<Rgb> {
    let (w, h) = (grid.width(), grid.height());
    let mut out = grid.clone();
    for y in 0..h {
        for x in 0..w {
            let (p, extent) = match mode {
                WipeMode::LeftToRight => (x, w),
                WipeMode::RightToLeft => (w - 1 - x, w),
                WipeMode::TopToBottom => (y, h),
                WipeMode::BottomToTop => (h - 1 - y, h),
            };
            let fade = fade_factor(p, pos.min(extent), extent);
            out.set(x, y, grid.get(x, y).scale(fade));
        }
    }
    out
}

/// Keep only the band of `pos` cells nearest `edge`; everything else is black.
pub fn reveal(grid: &Grid<Rgb>, edge: RevealEdge, pos: usize) -> Grid<Rgb> {
    let (w, h) = (grid.width(), grid.height());
    let mut out = grid.clone();
    for y in 0..h {
        for x in 0..w {
            let kept = match edge {
                RevealEdge::Left => x < pos.min(w),
                RevealEdge::Right => x >= w - pos.min(w),
                RevealEdge::Top => y < pos.min(h),
                RevealEdge::Bottom => y >= h - pos.min(h),
            };
            if !kept {
                out.set(x, y, Rgb::BLACK);
            }
        }
    }
    out
}

/// Shear every cell around the centre, then rotate the result by
/// `step * 0.1` radians. Cells nothing lands on stay black.
pub fn spiral(grid: &Grid<Rgb>, step: usize) -> Grid<Rgb> {
    let cx = grid.width() as f64 / 2.0;
    let cy = grid.height() as f64 / 2.0;
    let (sin, cos) = (step as f64 * 0.1).sin_cos();
    let mut out = Grid::filled(grid.width(), grid.height(), Rgb::BLACK);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let sx = dx * 0.9 - dy * 0.1;
            let sy = dy * 0.9 + dx * 0.1;
            let rx = sx * cos - sy * sin;
            let ry = sx * sin + sy * cos;
            out.set_signed((cx + rx) as i64, (cy + ry) as i64, grid.get(x, y));
        }
    }
    out
}

/// Dim cells by distance from the centre, modulated by a 10-step pulse.
pub fn pulse(grid: &Grid<Rgb>, step: usize) -> Grid<Rgb> {
    let cx = grid.width() as f32 / 2.0;
    let cy = grid.height() as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt();
    let phase = (step % 10) as f32 / 10.0;
    let pulse = 0.5 + 0.5 * (1.0 - (phase - 0.5).abs() * 2.0);

    let mut out = grid.clone();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let dist_factor = if max_dist > 0.0 { dist / max_dist } else { 0.0 };
            let factor = (1.0 - dist_factor * 0.5) * pulse;
            out.set(x, y, grid.get(x, y).scale(factor));
        }
    }
    out
}

/// Rotate colour channels: `Rgb` gives (g, b, r), `Ryb` gives (b, r, g).
pub fn colour_cycle(pixels: &mut [Rgb], mode: CycleMode) {
    for p in pixels {
        *p = match mode {
            CycleMode::Rgb => Rgb::new(p.g, p.b, p.r),
            CycleMode::Ryb => Rgb::new(p.b, p.r, p.g),
        };
    }
}

pub fn invert(pixels: &mut [Rgb]) {
    for p in pixels {
        *p = p.invert();
    }
}
