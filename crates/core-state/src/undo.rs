use core_text::Position;
use std::collections::VecDeque;
use tracing::trace;

/// Default number of undo groups retained.
pub const UNDO_HISTORY_MAX: usize = 1000;

/// One reversible edit: lines `[start, start + before.len())` were replaced by
/// `after`. Undo puts `before` back over `[start, start + after.len())`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineChange {
    pub start: usize,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

/// A user-level change: every `LineChange` made between `begin_group` and
/// the matching `end_group`, or a single change made outside any group.
#[derive(Clone, Debug)]
pub struct UndoGroup {
    pub changes: Vec<LineChange>,
    /// Cursor when the group started; restored by undo and redo.
    pub cursor: Position,
}

pub struct UndoEngine {
    undo_stack: VecDeque<UndoGroup>,
    redo_stack: Vec<UndoGroup>,
    open: Option<UndoGroup>,
    depth: usize,
    limit: usize,
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new(UNDO_HISTORY_MAX)
    }
}

impl UndoEngine {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            open: None,
            depth: 0,
            limit: limit.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Open (or nest into) a group. Changes recorded until the outermost
    /// `end_group` undo together.
    pub fn begin_group(&mut self, cursor: Position) {
        self.depth += 1;
        if self.open.is_none() {
            self.open = Some(UndoGroup {
                changes: Vec::new(),
                cursor,
            });
        }
    }

    pub fn end_group(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.close();
        }
    }

    /// Close every open level at once.
    pub fn end_all_groups(&mut self) {
        self.depth = 0;
        self.close();
    }

    fn close(&mut self) {
        if let Some(group) = self.open.take()
            && !group.changes.is_empty()
        {
            self.push_group(group);
        }
    }

    pub fn record(&mut self, change: LineChange, cursor: Position) {
        match self.open.as_mut() {
            Some(group) => {
                group.changes.push(change);
                // A redo branch is dead as soon as the buffer diverges.
                self.redo_stack.clear();
            }
            None => self.push_group(UndoGroup {
                changes: vec![change],
                cursor,
            }),
        }
    }

    fn push_group(&mut self, group: UndoGroup) {
        let changes = group.changes.len();
        self.undo_stack.push_back(group);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), changes, "push_group");
        if self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        self.redo_stack.clear();
    }

    pub fn take_undo(&mut self) -> Option<UndoGroup> {
        self.end_all_groups();
        let group = self.undo_stack.pop_back();
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), hit = group.is_some(), "undo_pop");
        group
    }

    pub fn take_redo(&mut self) -> Option<UndoGroup> {
        self.end_all_groups();
        let group = self.redo_stack.pop();
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), hit = group.is_some(), "redo_pop");
        group
    }

    /// Return an undone group so redo can replay it.
    pub fn push_redo(&mut self, group: UndoGroup) {
        self.redo_stack.push(group);
    }

    /// Return a redone group to the undo stack without clearing redo.
    pub fn push_undo_from_redo(&mut self, group: UndoGroup) {
        self.undo_stack.push_back(group);
        if self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }
}
