use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animation::LegacyAnimation;
use crate::automation::{AutomationAction, Effect};
use crate::composite::{self, MergeMode};
use crate::context::EditContext;
use crate::error::{CoreError, Result};
use crate::events::{EventBus, FrameScope, LayerEvent};
use crate::frame::LayerFrame;
use crate::grid::{PixelBuffer, Rgb, fit_len};
use crate::pattern::Pattern;
use crate::reindex::TimelineEdit;
use crate::track::{LayerGroup, LayerTrack};

/// Tolerance below which a frame opacity counts as equal to the track's.
const OPACITY_EPSILON: f32 = 0.001;

// =============================================================================
// LayerState
// =============================================================================

/// Everything a layer stack owns. Cloned whole for undo and persisted by
/// `PatternDocument`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    pub pattern: Pattern,
    pub tracks: Vec<LayerTrack>,
    #[serde(default)]
    pub groups: BTreeMap<Uuid, LayerGroup>,
    /// Legacy animations keyed by track id.
    #[serde(default)]
    pub animations: BTreeMap<Uuid, LegacyAnimation>,
}

/// One track flattened at a single frame, for callers that still expect a
/// per-frame list of layers.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerView {
    pub track_id: Uuid,
    pub name: String,
    pub pixels: Vec<Rgb>,
    /// Alpha moved by the track's automation, opaque where the frame is absent.
    pub alpha: Vec<u8>,
    pub visible: bool,
    pub opacity: f32,
    pub mask: Option<Vec<f32>>,
    pub locked: bool,
    pub group_id: Option<Uuid>,
}

// =============================================================================
// LayerStack
// =============================================================================

/// The tracks, groups and legacy animations composited into one pattern.
#[derive(Debug)]
pub struct LayerStack {
    state: LayerState,
    context: Arc<EditContext>,
    events: EventBus,
}

impl LayerStack {
    /// A stack over `pattern` with its own edit context.
    pub fn new(pattern: Pattern) -> Self {
        Self::with_context(pattern, Arc::new(EditContext::new()))
    }

    /// A stack sharing `context` with its editors.
    pub fn with_context(pattern: Pattern, context: Arc<EditContext>) -> Self {
        let mut stack = Self {
            state: LayerState::default(),
            context,
            events: EventBus::new(),
        };
        stack.set_pattern(pattern);
        stack
    }

    /// Rebuild a stack from saved state. An empty track list gets one blank track.
    pub fn from_state(state: LayerState, context: Arc<EditContext>) -> Self {
        let mut stack = Self {
            state,
            context,
            events: EventBus::new(),
        };
        if stack.state.tracks.is_empty() {
            stack.add_track(None, None);
        }
        stack.reassign_z();
        stack
    }

    /// Replace the pattern. All tracks, groups and animations are dropped and a
    /// single track is seeded from the pattern's flat frames, fully opaque.
    pub fn set_pattern(&mut self, pattern: Pattern) {
        let count = pattern.pixel_count();
        let mut track = LayerTrack::new("Layer 1", 0);
        for (i, frame) in pattern.frames.iter().enumerate() {
            track.set_frame(
                i,
                LayerFrame::new(fit_len(&frame.pixels, count, Rgb::BLACK))
                    .with_alpha(vec![255; count]),
            );
        }
        tracing::debug!(
            width = pattern.width,
            height = pattern.height,
            frames = pattern.frame_count(),
            "loaded pattern into layer stack"
        );
        self.state = LayerState {
            pattern,
            tracks: vec![track],
            groups: BTreeMap::new(),
            animations: BTreeMap::new(),
        };
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
    }

    pub fn pattern(&self) -> &Pattern {
        &self.state.pattern
    }

    pub fn width(&self) -> usize {
        self.state.pattern.width
    }

    pub fn height(&self) -> usize {
        self.state.pattern.height
    }

    pub fn context(&self) -> &Arc<EditContext> {
        &self.context
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    /// Copy of the whole layer state.
    pub fn snapshot(&self) -> LayerState {
        self.state.clone()
    }

    /// Swap in a previously captured state.
    pub fn restore(&mut self, state: LayerState) {
        self.state = state;
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
    }

    pub fn into_state(self) -> LayerState {
        self.state
    }

    fn emit(&self, event: LayerEvent) {
        self.events.emit(event);
    }

    fn pixel_count(&self) -> usize {
        self.state.pattern.pixel_count()
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    pub fn tracks(&self) -> &[LayerTrack] {
        &self.state.tracks
    }

    pub fn track_count(&self) -> usize {
        self.state.tracks.len()
    }

    pub fn track(&self, index: usize) -> Result<&LayerTrack> {
        self.state
            .tracks
            .get(index)
            .ok_or(CoreError::TrackNotFound(index))
    }

    /// Direct access for hosts and importers. No events are emitted.
    pub fn track_mut(&mut self, index: usize) -> Result<&mut LayerTrack> {
        self.state
            .tracks
            .get_mut(index)
            .ok_or(CoreError::TrackNotFound(index))
    }

    pub fn find_track(&self, id: Uuid) -> Option<usize> {
        self.state.tracks.iter().position(|t| t.id == id)
    }

    /// Add a blank track and return its index.
    ///
    /// Seeded frames are black with alpha 0 so the new layer is transparent
    /// until painted. Without `insert_at` the track goes on top.
    pub fn add_track(&mut self, name: Option<&str>, insert_at: Option<usize>) -> usize {
        let len = self.state.tracks.len();
        let name = name.map_or_else(|| format!("Layer {}", len + 1), str::to_string);
        let mut track = LayerTrack::new(name, len);
        let count = self.pixel_count();
        for i in 0..self.state.pattern.frame_count() {
            track.set_frame(i, LayerFrame::blank(count, 0));
        }

        let index = insert_at.map_or(len, |i| i.min(len));
        let id = track.id;
        self.state.tracks.insert(index, track);
        self.reassign_z();

        tracing::debug!(index, %id, "added layer track");
        self.emit(LayerEvent::TrackAdded { index, id });
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        index
    }

    /// Remove a track. The last remaining track cannot be removed.
    pub fn remove_track(&mut self, index: usize) -> Result<LayerTrack> {
        self.track(index)?;
        if self.state.tracks.len() <= 1 {
            return Err(CoreError::LastTrack);
        }
        let track = self.detach_track(index);
        self.reassign_z();
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(track)
    }

    fn detach_track(&mut self, index: usize) -> LayerTrack {
        let track = self.state.tracks.remove(index);
        self.state.animations.remove(&track.id);
        tracing::debug!(index, id = %track.id, "removed layer track");
        self.emit(LayerEvent::TrackRemoved {
            index,
            id: track.id,
        });
        track
    }

    /// Move a track to a new position in the composite order.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        self.track(from)?;
        self.track(to)?;
        if from == to {
            return Ok(());
        }
        let track = self.state.tracks.remove(from);
        self.state.tracks.insert(to, track);
        self.reassign_z();

        tracing::debug!(from, to, "moved layer track");
        self.emit(LayerEvent::TrackMoved { from, to });
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    /// Insert a deep copy directly above `index` and return the copy's index.
    pub fn duplicate_track(&mut self, index: usize) -> Result<usize> {
        let source = self.track(index)?;
        let mut copy = source.duplicate();
        copy.name = format!("{} copy", source.name);
        if let Some(animation) = self.state.animations.get(&source.id).cloned() {
            self.state.animations.insert(copy.id, animation);
        }

        let id = copy.id;
        let new_index = index + 1;
        self.state.tracks.insert(new_index, copy);
        self.reassign_z();

        tracing::debug!(source = index, index = new_index, "duplicated layer track");
        self.emit(LayerEvent::TrackAdded {
            index: new_index,
            id,
        });
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(new_index)
    }

    /// Fold several tracks into one.
    ///
    /// `target` defaults to the lowest source index and must be one of the
    /// sources. Every frame any source stores is merged into the target; the
    /// other sources are applied in z order and then removed. Hidden sources
    /// are skipped. Returns the target's index after removal.
    pub fn merge_tracks(
        &mut self,
        sources: &[usize],
        target: Option<usize>,
        mode: MergeMode,
    ) -> Result<usize> {
        let mut sources = sources.to_vec();
        sources.sort_unstable();
        sources.dedup();
        if sources.len() < 2 {
            return Err(CoreError::MergeNeedsTwoLayers(sources.len()));
        }
        for &index in &sources {
            self.track(index)?;
        }
        let target = target.unwrap_or(sources[0]);
        if !sources.contains(&target) {
            return Err(CoreError::MergeTargetNotInSources { target });
        }

        let (width, height) = (self.width(), self.height());
        let count = width * height;
        let mut others: Vec<usize> = sources.iter().copied().filter(|&i| i != target).collect();
        others.sort_by_key(|&i| self.state.tracks[i].z_index);

        let frame_indices: BTreeSet<usize> = sources
            .iter()
            .flat_map(|&i| self.state.tracks[i].frames.indices())
            .collect();

        for frame_index in frame_indices {
            let layers: Vec<(Vec<Rgb>, f32)> = others
                .iter()
                .map(|&i| &self.state.tracks[i])
                .filter(|t| t.get_effective_visibility(frame_index))
                .filter_map(|t| {
                    t.get_frame(frame_index).map(|f| {
                        (f.fitted_pixels(count), t.get_effective_opacity(frame_index))
                    })
                })
                .collect();

            let frame = self.state.tracks[target].get_or_create_frame(frame_index, width, height);
            let mut pixels = frame.fitted_pixels(count);
            for (source, opacity) in &layers {
                composite::merge_into(&mut pixels, source, *opacity, mode);
            }
            frame.pixels = pixels;
        }

        let mut removed = others.clone();
        removed.sort_unstable();
        for &index in removed.iter().rev() {
            self.detach_track(index);
        }
        self.reassign_z();

        let target_index = target - others.iter().filter(|&&i| i < target).count();
        tracing::debug!(?sources, target = target_index, ?mode, "merged layer tracks");
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(target_index)
    }

    fn reassign_z(&mut self) {
        for (i, track) in self.state.tracks.iter_mut().enumerate() {
            track.z_index = i;
        }
    }

    // =========================================================================
    // Track properties
    // =========================================================================

    pub fn set_track_visible(&mut self, index: usize, visible: bool) -> Result<()> {
        self.track_mut(index)?.visible = visible;
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    pub fn set_track_opacity(&mut self, index: usize, opacity: f32) -> Result<()> {
        self.track_mut(index)?.set_opacity(opacity);
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    /// Lock state is advisory. The host decides what a locked track refuses.
    pub fn set_track_locked(&mut self, index: usize, locked: bool) -> Result<()> {
        self.track_mut(index)?.locked = locked;
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    pub fn set_track_name(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.track_mut(index)?.name = name.into();
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    pub fn set_track_window(
        &mut self,
        index: usize,
        start_frame: Option<usize>,
        end_frame: Option<usize>,
    ) -> Result<()> {
        let track = self.track_mut(index)?;
        track.start_frame = start_frame;
        track.end_frame = end_frame;
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    /// Override visibility at one frame. Matching the track default clears
    /// the override instead.
    pub fn set_frame_visible(
        &mut self,
        index: usize,
        frame_index: usize,
        visible: bool,
    ) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        let track = self.track_mut(index)?;
        let default = track.visible;
        let frame = track.get_or_create_frame(frame_index, width, height);
        frame.visible = (visible != default).then_some(visible);
        self.emit(LayerEvent::LayersChanged(FrameScope::Frame(frame_index)));
        Ok(())
    }

    /// Override opacity at one frame. Matching the track default clears the
    /// override instead.
    pub fn set_frame_opacity(
        &mut self,
        index: usize,
        frame_index: usize,
        opacity: f32,
    ) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        let track = self.track_mut(index)?;
        let default = track.opacity();
        let frame = track.get_or_create_frame(frame_index, width, height);
        let overridden = (opacity - default).abs() >= OPACITY_EPSILON;
        frame.set_opacity(overridden.then_some(opacity));
        self.emit(LayerEvent::LayersChanged(FrameScope::Frame(frame_index)));
        Ok(())
    }

    // =========================================================================
    // Automation and legacy animation
    // =========================================================================

    pub fn add_automation(&mut self, index: usize, action: AutomationAction) -> Result<()> {
        self.track_mut(index)?.add_automation(action)?;
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    pub fn remove_automation(
        &mut self,
        index: usize,
        action_index: usize,
    ) -> Result<Option<AutomationAction>> {
        let removed = self.track_mut(index)?.remove_automation(action_index);
        if removed.is_some() {
            self.emit(LayerEvent::LayersChanged(FrameScope::All));
        }
        Ok(removed)
    }

    /// Replace a track's automation. Nothing changes if any action is unknown.
    pub fn set_automation(&mut self, index: usize, actions: Vec<AutomationAction>) -> Result<()> {
        if let Some(bad) = actions.iter().find(|a| a.effect == Effect::Unknown) {
            return Err(CoreError::UnsupportedAction(
                bad.effect.kind().display_name().to_string(),
            ));
        }
        self.track_mut(index)?.automation = actions;
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    /// Attach a legacy animation. It only plays while the track has no automation.
    pub fn set_animation(&mut self, index: usize, animation: LegacyAnimation) -> Result<()> {
        let id = self.track(index)?.id;
        self.state.animations.insert(id, animation);
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    pub fn animation(&self, index: usize) -> Option<&LegacyAnimation> {
        let id = self.state.tracks.get(index)?.id;
        self.state.animations.get(&id)
    }

    pub fn remove_animation(&mut self, index: usize) -> Result<Option<LegacyAnimation>> {
        let id = self.track(index)?.id;
        let removed = self.state.animations.remove(&id);
        if removed.is_some() {
            self.emit(LayerEvent::LayersChanged(FrameScope::All));
        }
        Ok(removed)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Composite every track at `frame_index` into one buffer.
    ///
    /// Tracks are drawn bottom to top. Each visible track's pixels run through
    /// its automation (or legacy animation), are dimmed by opacity, then
    /// overwrite the buffer wherever they are not black. Layer state is not
    /// touched.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn render_frame(&self, frame_index: usize) -> PixelBuffer {
        let _guard = self.context.enter_render();
        let (width, height) = (self.width(), self.height());
        let total_frames = self.state.pattern.frame_count();
        let mut buffer = vec![Rgb::BLACK; width * height];

        for track in self.tracks_in_z_order() {
            if !track.is_active_at(frame_index)
                || !track.get_effective_visibility(frame_index)
                || !self.group_visible(track)
            {
                continue;
            }
            let animation = self.state.animations.get(&track.id);
            let Some(mut pixels) =
                track.render_pixels(frame_index, width, height, animation, total_frames)
            else {
                continue;
            };
            composite::apply_opacity(&mut pixels, track.get_effective_opacity(frame_index));
            composite::overwrite_nonblack(&mut buffer, &pixels);
        }
        buffer
    }

    /// Render a range of frames in parallel.
    pub fn render_frames(&self, frames: Range<usize>) -> Vec<PixelBuffer> {
        frames
            .into_par_iter()
            .map(|frame_index| self.render_frame(frame_index))
            .collect()
    }

    fn tracks_in_z_order(&self) -> Vec<&LayerTrack> {
        let mut tracks: Vec<&LayerTrack> = self.state.tracks.iter().collect();
        tracks.sort_by_key(|t| t.z_index);
        tracks
    }

    /// Tracks whose group is missing count as visible.
    fn group_visible(&self, track: &LayerTrack) -> bool {
        track
            .group_id
            .and_then(|id| self.state.groups.get(&id))
            .is_none_or(|g| g.visible)
    }

    /// Write the composite of `frame_index` into the pattern. Returns false
    /// when the pattern has no such frame.
    pub fn sync_frame_from_layers(&mut self, frame_index: usize) -> bool {
        if frame_index >= self.state.pattern.frame_count() {
            return false;
        }
        let pixels = self.render_frame(frame_index);
        self.state.pattern.frames[frame_index].pixels = pixels;
        true
    }

    pub fn sync_all_frames(&mut self) {
        let rendered = self.render_frames(0..self.state.pattern.frame_count());
        for (frame, pixels) in self.state.pattern.frames.iter_mut().zip(rendered) {
            frame.pixels = pixels;
        }
    }

    /// One view per track at `frame_index`, bottom first.
    pub fn layers_at(&self, frame_index: usize) -> Vec<LayerView> {
        let (width, height) = (self.width(), self.height());
        let count = width * height;
        self.state
            .tracks
            .iter()
            .map(|track| {
                let frame = track.get_frame(frame_index);
                LayerView {
                    track_id: track.id,
                    name: track.name.clone(),
                    pixels: frame
                        .map(|f| f.fitted_pixels(count))
                        .unwrap_or_else(|| vec![Rgb::BLACK; count]),
                    alpha: track
                        .render_alpha(frame_index, width, height)
                        .unwrap_or_else(|| vec![255; count]),
                    visible: track.get_effective_visibility(frame_index),
                    opacity: track.get_effective_opacity(frame_index),
                    mask: frame.and_then(|f| f.mask.clone()),
                    locked: track.locked,
                    group_id: track.group_id,
                }
            })
            .collect()
    }

    // =========================================================================
    // Pixel edits
    // =========================================================================

    /// Paint one pixel on a track, creating the frame if needed, and resync
    /// the pattern frame.
    pub fn apply_pixel(
        &mut self,
        index: usize,
        frame_index: usize,
        x: usize,
        y: usize,
        colour: Rgb,
    ) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        if x >= width || y >= height {
            return Err(CoreError::PixelOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        self.check_edit(index)?;

        let pixel = y * width + x;
        let frame = self.track_mut(index)?.get_or_create_frame(frame_index, width, height);
        frame.pixels.resize(width * height, Rgb::BLACK);
        frame.pixels[pixel] = colour;
        if let Some(alpha) = frame.alpha.as_mut() {
            alpha[pixel] = 255;
        }

        self.sync_frame_from_layers(frame_index);
        self.emit(LayerEvent::PixelChanged {
            frame_index,
            x,
            y,
            colour,
        });
        self.emit(LayerEvent::LayersChanged(FrameScope::Frame(frame_index)));
        Ok(())
    }

    /// Replace a frame's pixels wholesale, padding or truncating to the
    /// pattern size.
    pub fn replace_pixels(&mut self, index: usize, frame_index: usize, pixels: &[Rgb]) -> Result<()> {
        self.check_edit(index)?;
        let (width, height) = (self.width(), self.height());
        let count = width * height;
        let frame = self.track_mut(index)?.get_or_create_frame(frame_index, width, height);
        frame.pixels = fit_len(pixels, count, Rgb::BLACK);
        frame.ensure_alpha(count);

        self.sync_frame_from_layers(frame_index);
        self.emit(LayerEvent::FramePixelsChanged(FrameScope::Frame(frame_index)));
        self.emit(LayerEvent::LayersChanged(FrameScope::Frame(frame_index)));
        Ok(())
    }

    /// Bulk-load decoded frames (e.g. from a GIF) into a track starting at
    /// `start`. Existing pattern frames take `duration_ms` when given.
    pub fn import_frames(
        &mut self,
        index: usize,
        start: usize,
        frames: &[Vec<Rgb>],
        duration_ms: Option<u32>,
    ) -> Result<()> {
        self.check_edit(index)?;
        let (width, height) = (self.width(), self.height());
        let count = width * height;
        let track = self.track_mut(index)?;
        for (offset, pixels) in frames.iter().enumerate() {
            let frame = track.get_or_create_frame(start + offset, width, height);
            frame.pixels = fit_len(pixels, count, Rgb::BLACK);
        }
        if let Some(duration_ms) = duration_ms {
            let end = (start + frames.len()).min(self.state.pattern.frame_count());
            for frame in self.state.pattern.frames.iter_mut().take(end).skip(start) {
                frame.duration_ms = duration_ms;
            }
        }
        for frame_index in start..start + frames.len() {
            self.sync_frame_from_layers(frame_index);
        }

        tracing::debug!(index, start, frames = frames.len(), "imported frames");
        self.emit(LayerEvent::FramePixelsChanged(FrameScope::All));
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
        Ok(())
    }

    /// Change the matrix size. Every stored frame is padded or truncated to
    /// match before the pattern is resynced.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.state.pattern.resize(width, height);
        let count = width * height;
        for track in &mut self.state.tracks {
            for frame in track.frames.iter_mut() {
                frame.resize(count);
            }
        }
        self.sync_all_frames();

        tracing::debug!(width, height, "resized layer stack");
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
    }

    /// Copy one frame of a track onto other frame indices of the same track.
    /// The source index itself is skipped. Returns how many frames were written.
    pub fn copy_frame_to(&mut self, index: usize, frame_index: usize, targets: &[usize]) -> Result<usize> {
        let track = self.track_mut(index)?;
        let Some(source) = track.frames.get(frame_index).cloned() else {
            return Ok(0);
        };
        let mut copied = 0;
        for &target in targets.iter().filter(|&&t| t != frame_index) {
            track.set_frame(target, source.clone());
            copied += 1;
        }
        if copied > 0 {
            self.emit(LayerEvent::LayersChanged(FrameScope::All));
        }
        Ok(copied)
    }

    fn check_edit(&self, index: usize) -> Result<()> {
        let id = self.track(index)?.id;
        self.context.check_edit(id)
    }

    // =========================================================================
    // Masks
    // =========================================================================

    /// Set a frame's mask, sized to the pattern and clamped to [0, 1].
    pub fn set_mask(&mut self, index: usize, frame_index: usize, mask: &[f32]) -> Result<()> {
        self.check_edit(index)?;
        let (width, height) = (self.width(), self.height());
        let frame = self.track_mut(index)?.get_or_create_frame(frame_index, width, height);
        frame.set_mask(&fit_len(mask, width * height, 1.0));
        self.emit(LayerEvent::LayersChanged(FrameScope::Frame(frame_index)));
        Ok(())
    }

    /// Returns false when the frame does not exist.
    pub fn clear_mask(&mut self, index: usize, frame_index: usize) -> Result<bool> {
        self.check_edit(index)?;
        let Some(frame) = self.track_mut(index)?.frames.get_mut(frame_index) else {
            return Ok(false);
        };
        frame.mask = None;
        self.emit(LayerEvent::LayersChanged(FrameScope::Frame(frame_index)));
        Ok(true)
    }

    pub fn mask(&self, index: usize, frame_index: usize) -> Option<&[f32]> {
        self.state
            .tracks
            .get(index)?
            .frames
            .get(frame_index)?
            .mask
            .as_deref()
    }

    // =========================================================================
    // Groups
    // =========================================================================

    pub fn groups(&self) -> impl Iterator<Item = &LayerGroup> + '_ {
        self.state.groups.values()
    }

    pub fn group(&self, group_id: Uuid) -> Option<&LayerGroup> {
        self.state.groups.get(&group_id)
    }

    pub fn create_group(&mut self, name: impl Into<String>) -> Uuid {
        let group = LayerGroup::new(name);
        let id = group.group_id;
        self.state.groups.insert(id, group);
        self.emit_group_changed();
        id
    }

    /// Delete a group. Its members stay, ungrouped.
    pub fn remove_group(&mut self, group_id: Uuid) -> Result<LayerGroup> {
        let group = self
            .state
            .groups
            .remove(&group_id)
            .ok_or(CoreError::GroupNotFound(group_id))?;
        for track in &mut self.state.tracks {
            if track.group_id == Some(group_id) {
                track.group_id = None;
            }
        }
        self.emit_group_changed();
        Ok(group)
    }

    pub fn add_to_group(&mut self, index: usize, group_id: Uuid) -> Result<()> {
        if !self.state.groups.contains_key(&group_id) {
            return Err(CoreError::GroupNotFound(group_id));
        }
        self.track_mut(index)?.group_id = Some(group_id);
        self.emit_group_changed();
        Ok(())
    }

    /// Returns the group the track left, if any.
    pub fn remove_from_group(&mut self, index: usize) -> Result<Option<Uuid>> {
        let previous = self.track_mut(index)?.group_id.take();
        self.emit_group_changed();
        Ok(previous)
    }

    /// Indices of the tracks in a group.
    pub fn group_members(&self, group_id: Uuid) -> Vec<usize> {
        self.state
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.group_id == Some(group_id))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn set_group_visible(&mut self, group_id: Uuid, visible: bool) -> Result<()> {
        self.group_mut(group_id)?.visible = visible;
        self.emit_group_changed();
        Ok(())
    }

    /// Stored for hosts. The compositor only honours group visibility.
    pub fn set_group_opacity(&mut self, group_id: Uuid, opacity: f32) -> Result<()> {
        self.group_mut(group_id)?.set_opacity(opacity);
        self.emit_group_changed();
        Ok(())
    }

    fn group_mut(&mut self, group_id: Uuid) -> Result<&mut LayerGroup> {
        self.state
            .groups
            .get_mut(&group_id)
            .ok_or(CoreError::GroupNotFound(group_id))
    }

    fn emit_group_changed(&self) {
        self.emit(LayerEvent::GroupChanged(FrameScope::All));
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
    }

    // =========================================================================
    // Timeline edits
    // =========================================================================

    /// Renumber every track, action window and legacy animation, and apply the
    /// same edit to the pattern's frame list.
    pub fn apply_timeline_edit(&mut self, edit: TimelineEdit) {
        for track in &mut self.state.tracks {
            edit.apply_to_track(track);
        }
        for animation in self.state.animations.values_mut() {
            edit.apply_to_window(&mut animation.start_frame, &mut animation.end_frame);
        }
        let count = self.pixel_count();
        edit.apply_to_frames(&mut self.state.pattern.frames, count);

        tracing::debug!(?edit, "re-indexed layer frames");
        self.emit(LayerEvent::LayersChanged(FrameScope::All));
    }
}
