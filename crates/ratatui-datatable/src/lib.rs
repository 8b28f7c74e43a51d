//! Interactive data table for [ratatui](https://ratatui.rs).
//!
//! This is the facade crate: it re-exports `ratatui-datatable-core` so apps depend on a single
//! crate. Enable the `crossterm` feature for the event adapter, and `serde` to (de)serialize
//! ids, column definitions, sort indicators and the table variant.
//!
//! See [`table::TableView`] for the widget and the `table` example for a complete event loop.
pub use ratatui_datatable_core::input;
pub use ratatui_datatable_core::keymap;
pub use ratatui_datatable_core::line_input;
pub use ratatui_datatable_core::render;
pub use ratatui_datatable_core::table;
pub use ratatui_datatable_core::theme;
pub use ratatui_datatable_core::viewport;

#[cfg(feature = "crossterm")]
pub use ratatui_datatable_core::crossterm_input;

pub use ratatui_datatable_core::table::TableAction;
pub use ratatui_datatable_core::table::TableView;
