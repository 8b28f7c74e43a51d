//! Interactive data table: resizable and reorderable columns, nested rows, inline editing and
//! add-row lines.
//!
//! The caller owns the data. Each frame it hands a [`RowTree`] and the column definitions to
//! [`TableView::render`], feeds input to [`TableView::handle_event`] and applies the returned
//! [`TableAction`] to its own state. Column geometry and orders live in the view's
//! [`LayoutRegistry`].
//!
//! ```no_run
//! use ratatui_datatable_core::table::RowTree;
//! use ratatui_datatable_core::table::TableAction;
//! use ratatui_datatable_core::table::TableColumn;
//! use ratatui_datatable_core::table::TableRow;
//! use ratatui_datatable_core::table::TableView;
//!
//! let mut rows = RowTree::new();
//! rows.push(TableRow::new(["Jean", "jean@example.com"]).id("jean"));
//! let columns = vec![
//!     TableColumn::new("Name", 12).id("name"),
//!     TableColumn::new("Email", 20).id("email"),
//! ];
//! let mut view = TableView::new();
//! # let event = ratatui_datatable_core::input::InputEvent::Paste(String::new());
//! if let TableAction::SelectionChanged { row, selected } = view.handle_event(event, &rows, &columns) {
//!     println!("{row} -> {selected}");
//! }
//! ```

pub mod action;
pub mod add_row;
pub mod body;
pub mod cell;
pub mod column;
pub mod header;
pub mod hit;
pub mod ids;
pub mod layout;
pub mod options;
pub mod reorder;
pub mod resize;
pub mod row;
pub mod tree;
pub mod view;

pub use action::CellRef;
pub use action::TableAction;
pub use add_row::AddRowTarget;
pub use body::LineKind;
pub use cell::CellContent;
pub use cell::CellMode;
pub use cell::TableCell;
pub use column::SortIndicator;
pub use column::TableColumn;
pub use ids::ColumnId;
pub use ids::DragId;
pub use ids::ParseDragIdError;
pub use ids::RowId;
pub use layout::ColumnGeometry;
pub use layout::LayoutRegistry;
pub use options::TableBindings;
pub use options::TableOptions;
pub use options::TableVariant;
pub use reorder::array_move;
pub use tree::RowAction;
pub use tree::RowTree;
pub use tree::TableRow;
pub use tree::TagsConfig;
pub use view::TableView;
