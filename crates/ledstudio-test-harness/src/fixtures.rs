use ledstudio_core::grid::Rgb;

pub const RED: Rgb = Rgb::new(255, 0, 0);
pub const GREEN: Rgb = Rgb::new(0, 255, 0);
pub const BLUE: Rgb = Rgb::new(0, 0, 255);

/// `width * height` pixels of one colour.
pub fn solid(width: usize, height: usize, colour: Rgb) -> Vec<Rgb> {
    vec![colour; width * height]
}

/// Black everywhere except `(x, y)`.
pub fn single_pixel(width: usize, height: usize, x: usize, y: usize, colour: Rgb) -> Vec<Rgb> {
    let mut pixels = solid(width, height, Rgb::BLACK);
    pixels[y * width + x] = colour;
    pixels
}

/// Every pixel distinct and non-black: red rises along x, green along y.
pub fn gradient(width: usize, height: usize) -> Vec<Rgb> {
    let step = |i: usize, n: usize| (((i + 1) * 255) / n.max(1)) as u8;
    (0..height)
        .flat_map(|y| (0..width).map(move |x| Rgb::new(step(x, width), step(y, height), 1)))
        .collect()
}
