use std::fs;
use std::path::Path;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::context::EditContext;
use crate::error::{CoreError, Result};
use crate::stack::{LayerStack, LayerState};

/// Version written by [`PatternDocument::save`].
pub const CURRENT_DOCUMENT_VERSION: Version = Version::new(1, 0, 0);

/// A pattern and its layers as saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDocument {
    pub version: Version,
    pub state: LayerState,
}

impl PatternDocument {
    pub fn from_stack(stack: &LayerStack) -> Self {
        Self {
            version: CURRENT_DOCUMENT_VERSION,
            state: stack.snapshot(),
        }
    }

    /// Rebuild a stack with a fresh edit context.
    pub fn into_stack(self) -> LayerStack {
        self.into_stack_with_context(Arc::new(EditContext::new()))
    }

    pub fn into_stack_with_context(self, context: Arc<EditContext>) -> LayerStack {
        LayerStack::from_state(self.state, context)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "saved pattern document");
        Ok(())
    }

    /// Load a document. Documents from a newer major version are refused.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let document: Self = serde_json::from_str(&json)?;
        if document.version.major > CURRENT_DOCUMENT_VERSION.major {
            return Err(CoreError::UnsupportedVersion {
                found: document.version,
                current: CURRENT_DOCUMENT_VERSION,
            });
        }
        Ok(document)
    }
}
