use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::keymap;
use crate::keymap::Binding;
use crate::table::ids::ColumnId;
use crate::table::ids::RowId;
use ratatui::style::Style;

/// Visual flavour of the table. Has no structural effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableVariant {
    #[default]
    Default,
    /// No grid lines between columns.
    Minimal,
    /// Alternating row backgrounds.
    Striped,
}

/// Table-level configuration for [`crate::table::TableView`].
///
/// Feature flags mirror what a caller can switch on per table; everything a row or cell needs
/// beyond that lives on [`crate::table::TableRow`] and [`crate::table::TableCell`].
#[derive(Clone, Debug)]
pub struct TableOptions {
    pub variant: TableVariant,
    pub show_header: bool,
    pub show_scrollbar: bool,
    /// Columns can be resized by dragging the header's trailing edge (or with `<`/`>`).
    pub resizable: bool,
    /// A trailing spacer absorbs the width left over by the columns.
    pub fill_column: bool,
    /// Rows with `expand_content` can expand to show it.
    pub expandable: bool,
    /// An add-row line is appended below the data rows.
    pub addable: bool,
    pub selection_column: bool,
    pub selection_column_width: u16,
    /// Reported by the caller; the header never derives it from row state.
    pub select_all_checked: bool,
    /// Rows show their status slot and may expand into sub-task trees.
    pub status_column: bool,
    pub reorderable_columns: bool,
    pub reorderable_rows: bool,
    /// Controlled column order. When set, reorders are reported and never applied internally.
    pub column_order: Option<Vec<ColumnId>>,
    /// Controlled row order, same contract as `column_order`.
    pub row_order: Option<Vec<RowId>>,
    /// Columns of indentation added per sub-task nesting level.
    pub indent_width: u16,
    pub add_row_placeholder: String,
    pub add_sub_task_label: String,
    pub style: Style,
    pub header_style: Style,
    pub grid_line_style: Style,
    pub scrollbar_style: Style,
    pub cursor_style: Style,
    pub bindings: TableBindings,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            variant: TableVariant::Default,
            show_header: true,
            show_scrollbar: true,
            resizable: false,
            fill_column: false,
            expandable: false,
            addable: false,
            selection_column: false,
            selection_column_width: 5,
            select_all_checked: false,
            status_column: false,
            reorderable_columns: false,
            reorderable_rows: false,
            column_order: None,
            row_order: None,
            indent_width: 2,
            add_row_placeholder: "+ Add row".to_string(),
            add_sub_task_label: "Add sub-task".to_string(),
            style: Style::default(),
            header_style: Style::default(),
            grid_line_style: Style::default(),
            scrollbar_style: Style::default(),
            cursor_style: Style::default(),
            bindings: TableBindings::default(),
        }
    }
}

impl TableOptions {
    /// Width reserved for the selection slot, or zero when the feature is off.
    pub fn selection_width(&self) -> u16 {
        if self.selection_column {
            self.selection_column_width
        } else {
            0
        }
    }
}

/// Key bindings for table interactions.
///
/// Navigation keys (arrows, `hjkl`, `PageUp`/`PageDown`, `Home`/`End`) are fixed; these are the
/// actions an app may want to remap or show in a help bar.
#[derive(Clone, Debug)]
pub struct TableBindings {
    pub toggle_select: Binding,
    pub toggle_expand: Binding,
    pub activate: Binding,
    pub toggle_favorite: Binding,
    pub activate_status: Binding,
    pub move_row_up: Binding,
    pub move_row_down: Binding,
    pub move_column_left: Binding,
    pub move_column_right: Binding,
    pub grow_column: Binding,
    pub shrink_column: Binding,
    pub select_all: Binding,
}

impl Default for TableBindings {
    fn default() -> Self {
        Self {
            toggle_select: Binding::new("space", "select", vec![keymap::key_char(' ')]),
            toggle_expand: Binding::new("o", "expand", vec![keymap::key_char('o')]),
            activate: Binding::new("enter", "edit", vec![KeyEvent::new(KeyCode::Enter)]),
            toggle_favorite: Binding::new("f", "favorite", vec![keymap::key_char('f')]),
            activate_status: Binding::new("s", "status", vec![keymap::key_char('s')]),
            move_row_up: Binding::new("alt+↑", "move row", vec![keymap::key_alt(KeyCode::Up)]),
            move_row_down: Binding::new(
                "alt+↓",
                "move row",
                vec![keymap::key_alt(KeyCode::Down)],
            ),
            move_column_left: Binding::new(
                "alt+←",
                "move column",
                vec![keymap::key_alt(KeyCode::Left)],
            ),
            move_column_right: Binding::new(
                "alt+→",
                "move column",
                vec![keymap::key_alt(KeyCode::Right)],
            ),
            grow_column: Binding::new(">", "widen", vec![keymap::key_char('>')]),
            shrink_column: Binding::new("<", "narrow", vec![keymap::key_char('<')]),
            select_all: Binding::new("ctrl+a", "select all", vec![keymap::key_ctrl('a')]),
        }
    }
}

impl TableBindings {
    /// The bindings worth advertising in a one-line help bar.
    pub fn help_items(&self) -> Vec<&Binding> {
        vec![
            &self.toggle_select,
            &self.toggle_expand,
            &self.activate,
            &self.move_row_up,
            &self.grow_column,
            &self.shrink_column,
        ]
    }
}
