//! Screen regions recorded while painting, for mouse routing.

use crate::table::action::CellRef;
use crate::table::add_row::AddRowTarget;
use crate::table::ids::ColumnId;
use crate::table::ids::RowId;
use crate::table::row::ActionKind;
use ratatui::layout::Position;
use ratatui::layout::Rect;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HitTarget {
    SelectAll,
    ColumnTitle(ColumnId),
    ResizeHandle(ColumnId),
    RowSelect(RowId),
    RowDragHandle(RowId),
    Chevron(RowId),
    Favorite(RowId),
    Status(RowId),
    RowAction { row: RowId, action: ActionKind },
    Cell(CellRef),
    Tag { row: RowId, index: usize },
    TagEditor(RowId),
    AddRowSlot { target: AddRowTarget, slot: usize },
    DropdownItem(usize),
}

/// Hit regions of the last frame. Later entries sit on top of earlier ones.
#[derive(Clone, Debug, Default)]
pub struct HitMap {
    entries: Vec<(Rect, HitTarget)>,
}

impl HitMap {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, rect: Rect, target: HitTarget) {
        if rect.width > 0 && rect.height > 0 {
            self.entries.push((rect, target));
        }
    }

    /// Topmost target under `(x, y)`.
    pub fn at(&self, x: u16, y: u16) -> Option<&HitTarget> {
        self.entries
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(Position { x, y }))
            .map(|(_, target)| target)
    }

    pub fn rect_of(&self, target: &HitTarget) -> Option<Rect> {
        self.entries
            .iter()
            .rev()
            .find(|(_, t)| t == target)
            .map(|(rect, _)| *rect)
    }
}
