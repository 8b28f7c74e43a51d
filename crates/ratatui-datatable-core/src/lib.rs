//! `ratatui-datatable-core` provides the building blocks of an interactive data table for
//! terminal UIs.
//!
//! This crate is designed for **widget library authors** and apps that want fine-grained control.
//! The facade crate `ratatui-datatable` re-exports it and ships a runnable demo.
//!
//! ## Design goals
//!
//! - Event-loop agnostic: you drive input + rendering from your app.
//! - No async runtime: all components run on the main thread.
//! - Data stays with the app: the table reports requested changes as
//!   [`table::TableAction`] values and the caller decides whether to apply them.
//!
//! ## Getting started
//!
//! Useful entry points:
//! - [`table::TableView`]: the table itself (header, rows, sub-tasks, add-row line).
//! - [`table::LayoutRegistry`]: column geometry, auto-fit and reorder bookkeeping.
//! - [`line_input::LineInput`]: the single-line editor used by cells and add-row slots.
//! - [`crossterm_input`] (feature `crossterm`): converts crossterm events into [`input::InputEvent`].
//!
//! ## Logging
//!
//! Gestures and commits are logged with `tracing` at `debug`, ignored input at `trace`. The
//! crate never installs a subscriber.
pub mod theme;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod render;
pub mod viewport;

pub mod input;
pub mod keymap;
pub mod line_input;
pub mod table;
