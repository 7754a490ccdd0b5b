use ledstudio_core::grid::Rgb;
use ledstudio_core::stack::LayerStack;
use ledstudio_core::track::LayerTrack;

/// Assert two pixel buffers match, reporting the first differing index.
pub fn assert_pixels_eq(actual: &[Rgb], expected: &[Rgb]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "buffer has {} pixels, expected {}",
        actual.len(),
        expected.len()
    );
    if let Some(i) = actual.iter().zip(expected).position(|(a, e)| a != e) {
        panic!(
            "pixel {i} is {:?}, expected {:?}\n  actual:   {actual:?}\n  expected: {expected:?}",
            actual[i], expected[i]
        );
    }
}

pub fn assert_all_black(pixels: &[Rgb]) {
    if let Some(i) = pixels.iter().position(|p| !p.is_black()) {
        panic!("pixel {i} is {:?}, expected black", pixels[i]);
    }
}

/// Assert a track stores frames at exactly `expected`.
pub fn assert_frame_keys(track: &LayerTrack, expected: &[usize]) {
    assert_eq!(
        track.frame_indices(),
        expected,
        "track {:?} stores the wrong frame indices",
        track.name
    );
}

/// Assert z indices run 0..N in track order.
pub fn assert_contiguous_z(stack: &LayerStack) {
    for (i, track) in stack.tracks().iter().enumerate() {
        assert_eq!(
            track.z_index, i,
            "track {:?} at position {i} has z_index {}",
            track.name, track.z_index
        );
    }
}
