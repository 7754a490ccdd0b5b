use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;

use crate::error::{CoreError, Result};

/// The single layer (and frame) edits are allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub layer_id: Uuid,
    pub frame_index: usize,
}

/// Gate shared between a layer stack and its editors.
///
/// Pixel edits are refused while any render pass holds a [`RenderGuard`],
/// and, when an [`EditTarget`] is set, when they aim at another layer.
#[derive(Debug, Default)]
pub struct EditContext {
    render_depth: AtomicUsize,
    target: RwLock<Option<EditTarget>>,
}

impl EditContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a render pass as in flight until the guard is dropped. Guards nest.
    pub fn enter_render(&self) -> RenderGuard<'_> {
        self.render_depth.fetch_add(1, Ordering::SeqCst);
        RenderGuard { context: self }
    }

    pub fn is_rendering(&self) -> bool {
        self.render_depth.load(Ordering::SeqCst) > 0
    }

    pub fn set_target(&self, target: Option<EditTarget>) {
        *self.target.write().unwrap_or_else(|e| e.into_inner()) = target;
    }

    pub fn target(&self) -> Option<EditTarget> {
        *self.target.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ensure_not_rendering(&self) -> Result<()> {
        if self.is_rendering() {
            return Err(CoreError::RenderInProgress);
        }
        Ok(())
    }

    /// Check that a pixel edit on `layer_id` is allowed right now.
    pub fn check_edit(&self, layer_id: Uuid) -> Result<()> {
        self.ensure_not_rendering()?;
        match self.target() {
            Some(target) if target.layer_id != layer_id => Err(CoreError::EditTargetMismatch {
                target: layer_id,
                active: target.layer_id,
            }),
            _ => Ok(()),
        }
    }
}

/// Held for the duration of a render pass.
#[derive(Debug)]
pub struct RenderGuard<'a> {
    context: &'a EditContext,
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.context.render_depth.fetch_sub(1, Ordering::SeqCst);
    }
}
