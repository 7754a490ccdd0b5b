use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animation::LegacyAnimation;
use crate::automation::{self, AutomationAction, Effect};
use crate::error::{CoreError, Result};
use crate::frame::LayerFrame;
use crate::frame_store::FrameStore;
use crate::grid::Rgb;

/// A layer that spans the whole timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTrack {
    pub id: Uuid,
    pub name: String,
    /// Sparse frame payloads. A missing index contributes nothing.
    #[serde(default)]
    pub frames: FrameStore,
    pub visible: bool,
    opacity: f32,
    #[serde(default)]
    pub locked: bool,
    /// Lookup-only reference into the stack's groups.
    #[serde(default)]
    pub group_id: Option<Uuid>,
    /// Composite order, lowest at the bottom.
    pub z_index: usize,
    /// `None` runs from frame 0 and is never shifted by timeline edits.
    #[serde(default)]
    pub start_frame: Option<usize>,
    /// Inclusive; `None` runs to the end of the pattern.
    #[serde(default)]
    pub end_frame: Option<usize>,
    #[serde(default)]
    pub automation: Vec<AutomationAction>,
}

impl LayerTrack {
    pub fn new(name: impl Into<String>, z_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            frames: FrameStore::new(),
            visible: true,
            opacity: 1.0,
            locked: false,
            group_id: None,
            z_index,
            start_frame: None,
            end_frame: None,
            automation: Vec::new(),
        }
    }

    /// Alias of `z_index`.
    pub fn order(&self) -> usize {
        self.z_index
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Whether `frame_index` falls inside the track's window.
    pub fn is_active_at(&self, frame_index: usize) -> bool {
        self.start_frame.is_none_or(|start| frame_index >= start)
            && self.end_frame.is_none_or(|end| frame_index <= end)
    }

    /// The frame at `frame_index`, or `None` outside the window or when absent.
    pub fn get_frame(&self, frame_index: usize) -> Option<&LayerFrame> {
        if !self.is_active_at(frame_index) {
            return None;
        }
        self.frames.get(frame_index)
    }

    pub fn get_frame_mut(&mut self, frame_index: usize) -> Option<&mut LayerFrame> {
        if !self.is_active_at(frame_index) {
            return None;
        }
        self.frames.get_mut(frame_index)
    }

    /// The stored frame, created black and fully opaque if missing.
    ///
    /// Existing frames get their alpha array sized to the pixel count.
    /// `LayerStack::add_track` seeds its blank frames with alpha 0 instead.
    pub fn get_or_create_frame(
        &mut self,
        frame_index: usize,
        width: usize,
        height: usize,
    ) -> &mut LayerFrame {
        let count = width * height;
        let frame = self
            .frames
            .get_or_insert_with(frame_index, || LayerFrame::blank(count, 255));
        frame.ensure_alpha(count);
        frame
    }

    pub fn set_frame(&mut self, frame_index: usize, frame: LayerFrame) {
        self.frames.insert(frame_index, frame);
    }

    pub fn remove_frame(&mut self, frame_index: usize) -> Option<LayerFrame> {
        self.frames.remove(frame_index)
    }

    /// Highest stored frame index plus one.
    pub fn frame_count(&self) -> usize {
        self.frames.last_index().map_or(0, |i| i + 1)
    }

    pub fn frame_indices(&self) -> Vec<usize> {
        self.frames.indices().collect()
    }

    /// The frame override if present, else the track default.
    pub fn get_effective_visibility(&self, frame_index: usize) -> bool {
        self.get_frame(frame_index)
            .and_then(|f| f.visible)
            .unwrap_or(self.visible)
    }

    pub fn get_effective_opacity(&self, frame_index: usize) -> f32 {
        self.get_frame(frame_index)
            .and_then(|f| f.opacity())
            .unwrap_or(self.opacity)
    }

    /// Append an action. Actions of an unrecognised type are refused.
    pub fn add_automation(&mut self, action: AutomationAction) -> Result<()> {
        if action.effect == Effect::Unknown {
            return Err(CoreError::UnsupportedAction(
                action.effect.kind().display_name().to_string(),
            ));
        }
        self.automation.push(action);
        Ok(())
    }

    pub fn remove_automation(&mut self, index: usize) -> Option<AutomationAction> {
        (index < self.automation.len()).then(|| self.automation.remove(index))
    }

    pub fn get_automation(&self) -> &[AutomationAction] {
        &self.automation
    }

    /// Base pixels for `frame_index` with automation applied, or with the
    /// legacy animation when the track has no automation.
    ///
    /// Returns `None` when the track contributes nothing at this frame.
    pub fn render_pixels(
        &self,
        frame_index: usize,
        width: usize,
        height: usize,
        legacy: Option<&LegacyAnimation>,
        total_frames: usize,
    ) -> Option<Vec<Rgb>> {
        let frame = self.get_frame(frame_index)?;
        let base = frame.fitted_pixels(width * height);
        if self.automation.is_empty() {
            return Some(match legacy {
                Some(animation) => animation.apply(base, frame_index, total_frames, width, height),
                None => base,
            });
        }
        Some(automation::apply_pipeline(
            &self.automation,
            &base,
            frame_index,
            width,
            height,
        ))
    }

    /// Alpha for `frame_index`, moved the same way the pixels are.
    pub fn render_alpha(&self, frame_index: usize, width: usize, height: usize) -> Option<Vec<u8>> {
        let frame = self.get_frame(frame_index)?;
        let base = frame.fitted_alpha(width * height);
        Some(automation::apply_alpha_pipeline(
            &self.automation,
            &base,
            frame_index,
            width,
            height,
        ))
    }

    /// Deep copy under a fresh id. Action ids are regenerated too.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        for action in &mut copy.automation {
            action.id = Uuid::new_v4();
        }
        copy
    }
}

/// Metadata shared by a set of tracks. Deleting a group never deletes tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerGroup {
    pub group_id: Uuid,
    pub name: String,
    pub visible: bool,
    opacity: f32,
}

impl LayerGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            group_id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            opacity: 1.0,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}
