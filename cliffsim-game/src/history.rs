//! Undo/redo stacks over whole-state snapshots.

use crate::error::{SimError, SimResult};

/// Holds the committed value plus every prior and undone snapshot.
///
/// Values are replaced wholesale; nothing on either stack is mutated after
/// it has been pushed.
#[derive(Debug, Clone)]
pub struct History<T> {
    current: T,
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
}

impl<T> History<T> {
    #[must_use]
    pub const fn new(initial: T) -> Self {
        Self {
            current: initial,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    #[must_use]
    pub const fn current(&self) -> &T {
        &self.current
    }

    /// Adopt `next` as current. The redo stack is discarded.
    pub fn commit(&mut self, next: T) {
        let previous = std::mem::replace(&mut self.current, next);
        self.undo_stack.push(previous);
        self.redo_stack.clear();
    }

    /// # Errors
    ///
    /// Returns [`SimError::NothingToUndo`] when no commit precedes the current value.
    pub fn undo(&mut self) -> SimResult<&T> {
        let previous = self.undo_stack.pop().ok_or(SimError::NothingToUndo)?;
        let undone = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(undone);
        Ok(&self.current)
    }

    /// # Errors
    ///
    /// Returns [`SimError::NothingToRedo`] when nothing has been undone since the last commit.
    pub fn redo(&mut self) -> SimResult<&T> {
        let next = self.redo_stack.pop().ok_or(SimError::NothingToRedo)?;
        let redone = std::mem::replace(&mut self.current, next);
        self.undo_stack.push(redone);
        Ok(&self.current)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn into_current(self) -> T {
        self.current
    }
}

impl<T: Default> Default for History<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{GameState, Genre};

    #[test]
    fn undo_and_redo_fail_when_empty() {
        let mut history = History::new(1_u8);
        assert!(matches!(history.undo(), Err(SimError::NothingToUndo)));
        assert!(matches!(history.redo(), Err(SimError::NothingToRedo)));
        assert_eq!(*history.current(), 1);
    }

    #[test]
    fn undo_restores_exact_prior_state() {
        let before = GameState::default();
        let mut after = before.clone();
        after.set_notoriety(Genre::Suspense, 120);
        after.total_hunts = 9;

        let mut history = History::new(before.clone());
        history.commit(after.clone());
        assert_eq!(history.undo().unwrap(), &before);
        assert_eq!(history.redo().unwrap(), &after);
    }

    #[test]
    fn commit_after_undo_discards_redo() {
        let mut history = History::new(0_u32);
        history.commit(1);
        history.commit(2);
        history.undo().unwrap();
        assert!(history.can_redo());
        history.commit(5);
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(*history.undo().unwrap(), 1);
    }
}
