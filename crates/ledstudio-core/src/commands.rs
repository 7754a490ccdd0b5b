use crate::error::{CoreError, Result};
use crate::stack::{LayerStack, LayerState};

/// One undoable edit, stored as the layer state on either side of it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    description: String,
    before: LayerState,
    after: LayerState,
}

impl Snapshot {
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Undo/redo history over a [`LayerStack`].
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the stack and record it for undo.
    ///
    /// A failing closure records nothing. Its partial changes, if any, stay in
    /// the stack.
    pub fn execute<F, T>(&mut self, stack: &mut LayerStack, description: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut LayerStack) -> Result<T>,
    {
        let before = stack.snapshot();
        let result = f(stack)?;
        self.undo_stack.push(Snapshot {
            description: description.to_string(),
            before,
            after: stack.snapshot(),
        });
        self.redo_stack.clear();
        Ok(result)
    }

    pub fn undo(&mut self, stack: &mut LayerStack) -> Result<()> {
        let cmd = self.undo_stack.pop().ok_or(CoreError::NothingToUndo)?;
        stack.restore(cmd.before.clone());
        self.redo_stack.push(cmd);
        Ok(())
    }

    pub fn redo(&mut self, stack: &mut LayerStack) -> Result<()> {
        let cmd = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        stack.restore(cmd.after.clone());
        self.undo_stack.push(cmd);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(Snapshot::description)
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(Snapshot::description)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
