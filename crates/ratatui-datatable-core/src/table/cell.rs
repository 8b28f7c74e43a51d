//! Cell content and how each kind of cell draws itself.

use crate::line_input;
use crate::line_input::LineInput;
use crate::render;
use crate::table::action::CellRef;
use crate::table::ids::ColumnId;
use crate::theme::Theme;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;

/// What a cell holds. Exactly one kind per cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    /// Static text (or nothing).
    Text(Option<String>),
    /// Inline-editable text; edits are reported as [`crate::table::TableAction::CellChanged`].
    Editable {
        value: String,
        placeholder: Option<String>,
    },
    /// A value bound to a fixed list of options.
    Select {
        options: Vec<String>,
        selected: Option<usize>,
    },
    /// Pre-styled content drawn as is.
    Custom(Line<'static>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub content: CellContent,
    /// Aligns the cell with a header column when columns are reorderable.
    pub column_id: Option<ColumnId>,
    /// Extra nesting indent for this cell, on top of the row's depth.
    pub indent_level: u16,
    /// Suppresses the hover underline on editable cells.
    pub no_hover_border: bool,
    /// The editor only opens through a row action flagged `activates_edit`.
    pub edit_on_action: bool,
}

impl TableCell {
    pub fn new(content: CellContent) -> Self {
        Self {
            content,
            column_id: None,
            indent_level: 0,
            no_hover_border: false,
            edit_on_action: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(CellContent::Text(Some(text.into())))
    }

    pub fn empty() -> Self {
        Self::new(CellContent::Text(None))
    }

    pub fn editable(value: impl Into<String>) -> Self {
        Self::new(CellContent::Editable {
            value: value.into(),
            placeholder: None,
        })
    }

    pub fn select<I, S>(options: I, selected: Option<usize>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CellContent::Select {
            options: options.into_iter().map(Into::into).collect(),
            selected,
        })
    }

    pub fn custom(line: impl Into<Line<'static>>) -> Self {
        Self::new(CellContent::Custom(line.into()))
    }

    pub fn column(mut self, id: impl Into<ColumnId>) -> Self {
        self.column_id = Some(id.into());
        self
    }

    pub fn indent(mut self, level: u16) -> Self {
        self.indent_level = level;
        self
    }

    pub fn no_hover_border(mut self) -> Self {
        self.no_hover_border = true;
        self
    }

    pub fn edit_on_action(mut self) -> Self {
        self.edit_on_action = true;
        self
    }

    pub fn placeholder(mut self, hint: impl Into<String>) -> Self {
        if let CellContent::Editable { placeholder, .. } = &mut self.content {
            *placeholder = Some(hint.into());
        }
        self
    }

    pub fn mode(&self) -> CellMode {
        match &self.content {
            CellContent::Editable { .. } => CellMode::Editable {
                deferred: self.edit_on_action,
            },
            CellContent::Select { .. } => CellMode::Dropdown,
            CellContent::Text(_) => CellMode::ReadOnlyText,
            CellContent::Custom(_) => CellMode::Custom,
        }
    }

    /// The text an editor opens with, for editable cells.
    pub fn editable_value(&self) -> Option<&str> {
        match &self.content {
            CellContent::Editable { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn select_options(&self) -> Option<(&[String], Option<usize>)> {
        match &self.content {
            CellContent::Select { options, selected } => Some((options, *selected)),
            _ => None,
        }
    }
}

impl From<&str> for TableCell {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for TableCell {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

/// Render mode, decided in priority order: editable, dropdown, plain text, custom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellMode {
    /// `deferred` cells show their value until a row action opens the editor.
    Editable { deferred: bool },
    Dropdown,
    ReadOnlyText,
    Custom,
}

pub(crate) struct CellPaint<'a> {
    pub style: Style,
    pub hovered: bool,
    pub editor: Option<&'a mut LineInput>,
    pub theme: &'a Theme,
}

/// Draws the cell's own content into `area` (one line) and returns the editor cursor, if any.
pub(crate) fn paint_cell(
    cell: &TableCell,
    area: Rect,
    buf: &mut Buffer,
    paint: CellPaint<'_>,
) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let CellPaint {
        style,
        hovered,
        editor,
        theme,
    } = paint;

    match (&cell.content, editor) {
        (CellContent::Editable { .. }, Some(editor)) => editor.render_ref(area, buf, style),
        (CellContent::Editable { value, placeholder }, None) => {
            let style = if hovered && !cell.no_hover_border {
                style.patch(theme.hover)
            } else {
                style
            };
            let hint = placeholder.as_deref().map(|p| (p, style.patch(theme.placeholder)));
            line_input::render_inline(area, buf, value, style, hint);
            None
        }
        (CellContent::Select { options, selected }, _) => {
            let caret = " ▾";
            let text_w = area.width.saturating_sub(caret.chars().count() as u16);
            match selected.and_then(|i| options.get(i)) {
                Some(value) => line_input::render_inline(
                    Rect {
                        width: text_w,
                        ..area
                    },
                    buf,
                    value,
                    style,
                    None,
                ),
                None => line_input::render_inline(
                    Rect {
                        width: text_w,
                        ..area
                    },
                    buf,
                    "",
                    style,
                    Some(("Select…", style.patch(theme.placeholder))),
                ),
            };
            if area.width > text_w {
                buf.set_stringn(
                    area.x + text_w,
                    area.y,
                    caret,
                    (area.width - text_w) as usize,
                    style.patch(theme.text_muted),
                );
            }
            None
        }
        (CellContent::Text(text), _) => {
            line_input::render_inline(area, buf, text.as_deref().unwrap_or(""), style, None);
            None
        }
        (CellContent::Custom(line), _) => {
            render::render_line_ellipsis(area.x, area.y, area.width, buf, line, style);
            None
        }
    }
}

/// Open dropdown for a select cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dropdown {
    pub target: CellRef,
    pub highlighted: usize,
    pub len: usize,
}

impl Dropdown {
    pub fn new(target: CellRef, selected: Option<usize>, len: usize) -> Self {
        Self {
            target,
            highlighted: selected.unwrap_or(0).min(len.saturating_sub(1)),
            len,
        }
    }

    pub fn move_by(&mut self, delta: i32) {
        if self.len == 0 {
            return;
        }
        let next = (self.highlighted as i64 + delta as i64).clamp(0, self.len as i64 - 1);
        self.highlighted = next as usize;
    }
}

/// Draws the option list of an open dropdown anchored under (or above) `anchor`.
///
/// Returns the rect of each option, in option order, for hit testing.
pub(crate) fn paint_dropdown(
    dropdown: &Dropdown,
    options: &[String],
    anchor: Rect,
    bounds: Rect,
    buf: &mut Buffer,
    theme: &Theme,
) -> Vec<Rect> {
    if options.is_empty() || bounds.width == 0 || bounds.height == 0 {
        return Vec::new();
    }
    let width = options
        .iter()
        .map(|o| render::display_width(o) as u16 + 2)
        .max()
        .unwrap_or(0)
        .max(anchor.width)
        .min(bounds.width);
    let height = (options.len() as u16).min(bounds.height);

    let below = anchor.y.saturating_add(1);
    let y = if below + height <= bounds.bottom() {
        below
    } else {
        anchor.y.saturating_sub(height).max(bounds.y)
    };
    let x = anchor.x.min(bounds.right().saturating_sub(width));
    let popup = Rect::new(x, y, width, height);
    render::fill(popup, buf, " ", theme.text_primary);

    let first = dropdown
        .highlighted
        .saturating_sub(height.saturating_sub(1) as usize);
    let mut rects = vec![Rect::default(); options.len()];
    let visible = options
        .iter()
        .enumerate()
        .skip(first)
        .take(height as usize);
    for (row, (i, option)) in visible.enumerate() {
        let rect = Rect::new(popup.x, popup.y + row as u16, popup.width, 1);
        let style = if i == dropdown.highlighted {
            theme.cursor
        } else {
            theme.text_primary
        };
        buf.set_style(rect, style);
        render::render_str_ellipsis(
            rect.x + 1,
            rect.y,
            rect.width.saturating_sub(2),
            buf,
            option,
            style,
        );
        rects[i] = rect;
    }
    rects
}
