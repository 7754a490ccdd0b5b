use std::sync::Arc;

use ledstudio_core::automation::AutomationAction;
use ledstudio_core::context::EditContext;
use ledstudio_core::frame::LayerFrame;
use ledstudio_core::grid::Rgb;
use ledstudio_core::pattern::{DEFAULT_FRAME_DURATION_MS, Frame, Pattern};
use ledstudio_core::stack::{LayerStack, LayerState};
use ledstudio_core::track::LayerTrack;

/// Builder for test LayerFrames sized to a matrix.
pub struct FrameBuilder {
    width: usize,
    pixels: Vec<Rgb>,
    alpha: Option<Vec<u8>>,
    visible: Option<bool>,
    opacity: Option<f32>,
    mask: Option<Vec<f32>>,
}

impl FrameBuilder {
    /// An all-black frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            pixels: vec![Rgb::BLACK; width * height],
            alpha: None,
            visible: None,
            opacity: None,
            mask: None,
        }
    }

    pub fn pixels(mut self, pixels: Vec<Rgb>) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn fill(mut self, colour: Rgb) -> Self {
        self.pixels.fill(colour);
        self
    }

    pub fn pixel(mut self, x: usize, y: usize, colour: Rgb) -> Self {
        self.pixels[y * self.width + x] = colour;
        self
    }

    pub fn alpha(mut self, alpha: Vec<u8>) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn mask(mut self, mask: Vec<f32>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn build(self) -> LayerFrame {
        let mut frame = LayerFrame::new(self.pixels);
        frame.alpha = self.alpha;
        frame.visible = self.visible;
        frame.set_opacity(self.opacity);
        if let Some(mask) = self.mask {
            frame.set_mask(&mask);
        }
        frame
    }
}

/// Builder for test LayerTracks.
pub struct TrackBuilder {
    track: LayerTrack,
}

impl TrackBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            track: LayerTrack::new(name, 0),
        }
    }

    pub fn frame(mut self, frame_index: usize, frame: LayerFrame) -> Self {
        self.track.set_frame(frame_index, frame);
        self
    }

    /// Store `pixels` at `frame_index` with no alpha or overrides.
    pub fn pixels(self, frame_index: usize, pixels: Vec<Rgb>) -> Self {
        self.frame(frame_index, LayerFrame::new(pixels))
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.track.set_opacity(opacity);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.track.visible = false;
        self
    }

    pub fn window(mut self, start_frame: usize, end_frame: Option<usize>) -> Self {
        self.track.start_frame = Some(start_frame);
        self.track.end_frame = end_frame;
        self
    }

    pub fn automation(mut self, action: AutomationAction) -> Self {
        self.track
            .add_automation(action)
            .expect("unsupported action in test builder");
        self
    }

    pub fn build(self) -> LayerTrack {
        self.track
    }
}

/// Build a pattern, or a layer stack over one, with explicit tracks.
pub struct PatternBuilder {
    name: String,
    width: usize,
    height: usize,
    frame_count: usize,
    tracks: Vec<LayerTrack>,
}

impl PatternBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            name: "Test".into(),
            width,
            height,
            frame_count: 1,
            tracks: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.into();
        self
    }

    pub fn frames(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Tracks are stacked bottom to top in the order added.
    pub fn track(mut self, track: LayerTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn build_pattern(&self) -> Pattern {
        let mut pattern = Pattern::new(&self.name, self.width, self.height);
        pattern.frames = (0..self.frame_count)
            .map(|_| Frame::new(vec![Rgb::BLACK; self.width * self.height], DEFAULT_FRAME_DURATION_MS))
            .collect();
        pattern
    }

    /// A stack holding exactly the added tracks, or the default seeded track
    /// when none were added.
    pub fn build(self) -> LayerStack {
        let pattern = self.build_pattern();
        if self.tracks.is_empty() {
            return LayerStack::new(pattern);
        }
        let state = LayerState {
            pattern,
            tracks: self.tracks,
            ..LayerState::default()
        };
        LayerStack::from_state(state, Arc::new(EditContext::new()))
    }
}
