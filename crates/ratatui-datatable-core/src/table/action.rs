use crate::table::ids::ColumnId;
use crate::table::ids::RowId;

/// Address of one cell: the row, the cell's index in [`crate::table::TableRow::cells`] and the
/// column it is drawn under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: RowId,
    pub cell: usize,
    pub column: ColumnId,
}

/// What the caller should do after [`crate::table::TableView::handle_event`].
///
/// Row content, selection, status, favorites and controlled expansion belong to the caller, so
/// the table reports requested changes instead of applying them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableAction {
    None,
    Redraw,
    /// The header checkbox was toggled; carries the requested state.
    SelectAllChanged(bool),
    SelectionChanged {
        row: RowId,
        selected: bool,
    },
    ExpandToggled {
        row: RowId,
        expanded: bool,
    },
    StatusActivated(RowId),
    FavoriteToggled {
        row: RowId,
        favorite: bool,
    },
    /// A caller-supplied row action fired; `index` points into `TableRow::actions`.
    RowActionInvoked {
        row: RowId,
        index: usize,
    },
    AddSubTaskRequested(RowId),
    /// The add-sub-task line lost focus with a blank first value.
    AddSubTaskCancelled(RowId),
    /// One value per column, in column definition order.
    RowAdded(Vec<String>),
    SubTaskAdded {
        parent: RowId,
        values: Vec<String>,
    },
    CellChanged {
        cell: CellRef,
        value: String,
    },
    CellCommitted {
        cell: CellRef,
        value: String,
    },
    CellSelected {
        cell: CellRef,
        index: usize,
    },
    TagAdded {
        row: RowId,
        tag: String,
    },
    TagRemoved {
        row: RowId,
        index: usize,
    },
    TagsEditorClosed(RowId),
    ColumnResized {
        column: ColumnId,
        width: u16,
    },
    ColumnOrderChanged(Vec<ColumnId>),
    RowOrderChanged(Vec<RowId>),
}

impl TableAction {
    pub fn is_none(&self) -> bool {
        matches!(self, TableAction::None)
    }
}
