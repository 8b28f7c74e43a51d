//! Row-level decisions and painting.
//!
//! A row's structural features (chevron, favorite, status, tags, actions) are merged onto its
//! first cell in display order, whatever that cell's own content is. Every other cell is drawn
//! as authored.

use crate::line_input;
use crate::line_input::LineInput;
use crate::render;
use crate::table::action::CellRef;
use crate::table::cell;
use crate::table::cell::CellPaint;
use crate::table::cell::TableCell;
use crate::table::header::GRID_LINE;
use crate::table::header::HeaderSlot;
use crate::table::header::SlotKind;
use crate::table::header::checkbox;
use crate::table::hit::HitMap;
use crate::table::hit::HitTarget;
use crate::table::ids::ColumnId;
use crate::table::ids::RowId;
use crate::table::options::TableOptions;
use crate::table::options::TableVariant;
use crate::table::tree::RowTree;
use crate::table::tree::TableRow;
use crate::theme::Theme;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::collections::HashSet;

const DRAG_HANDLE: &str = "⠿";
const CHEVRON_WIDTH: u16 = 2;

/// What expanding a row reveals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpansionFlavor {
    /// Child rows, followed by the add-sub-task line while the caller reports it.
    SubTasks,
    /// The row's `expand_content`, spanning the full width.
    Content,
}

/// Decides how `id` expands, if at all. Sub-tasks win over free content.
pub fn expansion_flavor(
    tree: &RowTree,
    id: &RowId,
    options: &TableOptions,
) -> Option<ExpansionFlavor> {
    let row = tree.get(id)?;
    let sub_tasks =
        !tree.children(id).is_empty() || row.has_sub_tasks || row.can_add_sub_task;
    if options.status_column && sub_tasks {
        Some(ExpansionFlavor::SubTasks)
    } else if options.expandable && row.expand_content.is_some() {
        Some(ExpansionFlavor::Content)
    } else {
        None
    }
}

/// Controlled rows follow `row.expanded`; the rest follow the view-local set.
pub fn is_expanded(row: &TableRow, id: &RowId, local: &HashSet<RowId>) -> bool {
    row.expanded.unwrap_or_else(|| local.contains(id))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Implicit action of rows that expand into sub-tasks.
    AddSubTask,
    /// Index into `TableRow::actions`.
    Caller(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    pub icon: String,
    pub label: String,
    pub activates_edit: bool,
}

/// Row actions in display order, with the add-sub-task action first for sub-task rows.
pub fn resolved_actions(
    row: &TableRow,
    flavor: Option<ExpansionFlavor>,
    options: &TableOptions,
) -> Vec<ResolvedAction> {
    let implicit = (flavor == Some(ExpansionFlavor::SubTasks)).then(|| ResolvedAction {
        kind: ActionKind::AddSubTask,
        icon: "+".to_string(),
        label: options.add_sub_task_label.clone(),
        activates_edit: false,
    });
    implicit
        .into_iter()
        .chain(row.actions.iter().enumerate().map(|(i, a)| ResolvedAction {
            kind: ActionKind::Caller(i),
            icon: a.icon.clone(),
            label: a.label.clone(),
            activates_edit: a.activates_edit,
        }))
        .collect()
}

/// Finds the cell drawn under `column`.
///
/// Cells carrying a `column_id` match by id; the others match by position against the column
/// definition order (`registration_index`).
pub fn cell_for_column<'a>(
    row: &'a TableRow,
    column: &ColumnId,
    registration_index: Option<usize>,
) -> Option<(usize, &'a TableCell)> {
    if let Some(i) = row
        .cells
        .iter()
        .position(|c| c.column_id.as_ref() == Some(column))
    {
        return Some((i, &row.cells[i]));
    }
    let i = registration_index?;
    let cell = row.cells.get(i)?;
    cell.column_id.is_none().then_some((i, cell))
}

/// The cell a row action flagged `activates_edit` opens.
pub fn edit_on_action_cell(row: &TableRow) -> Option<usize> {
    row.cells
        .iter()
        .position(|c| c.edit_on_action && c.editable_value().is_some())
}

/// Per-line inputs for [`paint_row`].
pub(crate) struct RowLine<'a> {
    pub id: &'a RowId,
    pub row: &'a TableRow,
    pub depth: usize,
    pub flavor: Option<ExpansionFlavor>,
    pub expanded: bool,
    pub draggable: bool,
    pub reveal_actions: bool,
    pub cursor_column: Option<&'a ColumnId>,
    pub style: Style,
}

/// Table-wide inputs shared by every painted line.
pub(crate) struct RowEnv<'a> {
    pub options: &'a TableOptions,
    pub theme: &'a Theme,
    pub slots: &'a [HeaderSlot],
    /// Column id of each column definition, in definition order.
    pub registered: &'a [ColumnId],
    pub grid_style: Style,
    pub cursor_style: Style,
}

impl RowEnv<'_> {
    pub fn registration_index(&self, id: &ColumnId) -> Option<usize> {
        self.registered.iter().position(|c| c == id)
    }

    pub fn paint_edges(&self, y: u16, buf: &mut Buffer) {
        if self.options.variant == TableVariant::Minimal {
            return;
        }
        for slot in self.slots {
            if slot.column().is_some() && slot.width > 1 {
                buf.set_stringn(slot.x + slot.inner_width(), y, GRID_LINE, 1, self.grid_style);
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct RowEditors<'a> {
    /// Open cell editor and the index of the cell it edits.
    pub cell: Option<(usize, &'a mut LineInput)>,
    pub tags: Option<&'a mut LineInput>,
}

/// Paints one data row at `y` and returns the screen position of an active text cursor.
pub(crate) fn paint_row(
    y: u16,
    buf: &mut Buffer,
    line: &RowLine<'_>,
    env: &RowEnv<'_>,
    editors: RowEditors<'_>,
    hits: &mut HitMap,
) -> Option<(u16, u16)> {
    let RowEditors {
        cell: mut cell_editor,
        tags: mut tag_editor,
    } = editors;
    let mut cursor = None;
    let mut first = true;

    for slot in env.slots {
        if slot.width == 0 {
            continue;
        }
        let rect = slot.rect(y, 1);
        buf.set_style(rect, line.style);
        match &slot.kind {
            SlotKind::Selection => paint_selection(slot, y, buf, line, env, hits),
            SlotKind::Fill => {}
            SlotKind::Column(column) => {
                let inner = Rect::new(slot.x, y, slot.inner_width(), 1);
                let mut style = line.style;
                if line.cursor_column == Some(column) {
                    style = style.patch(env.cursor_style);
                    buf.set_style(inner, style);
                }
                let found = cell_for_column(line.row, column, env.registration_index(column));
                let editor = match (found, cell_editor.take()) {
                    (Some((i, _)), Some((e, input))) if i == e => Some(input),
                    (_, other) => {
                        cell_editor = other;
                        None
                    }
                };
                let ctx = CellSlot {
                    column,
                    inner,
                    style,
                    found,
                    editor,
                };
                let pos = if first {
                    first = false;
                    paint_first_cell(buf, line, env, ctx, tag_editor.take(), hits)
                } else {
                    paint_plain_cell(buf, line, env, ctx, hits)
                };
                cursor = cursor.or(pos);
            }
        }
    }
    env.paint_edges(y, buf);
    cursor
}

struct CellSlot<'a, 'r> {
    column: &'a ColumnId,
    inner: Rect,
    style: Style,
    found: Option<(usize, &'r TableCell)>,
    editor: Option<&'a mut LineInput>,
}

fn paint_selection(
    slot: &HeaderSlot,
    y: u16,
    buf: &mut Buffer,
    line: &RowLine<'_>,
    env: &RowEnv<'_>,
    hits: &mut HitMap,
) {
    if line.draggable {
        buf.set_stringn(slot.x, y, DRAG_HANDLE, 1, line.style.patch(env.theme.text_muted));
        hits.push(
            Rect::new(slot.x, y, 1, 1),
            HitTarget::RowDragHandle(line.id.clone()),
        );
    }
    let w = slot.width.saturating_sub(1).min(3);
    let x = slot.x + 1;
    buf.set_stringn(x, y, checkbox(line.row.selected), w as usize, line.style);
    hits.push(Rect::new(x, y, w, 1), HitTarget::RowSelect(line.id.clone()));
}

fn cell_ref(line: &RowLine<'_>, index: usize, column: &ColumnId) -> CellRef {
    CellRef {
        row: line.id.clone(),
        cell: index,
        column: column.clone(),
    }
}

fn paint_plain_cell(
    buf: &mut Buffer,
    line: &RowLine<'_>,
    env: &RowEnv<'_>,
    ctx: CellSlot<'_, '_>,
    hits: &mut HitMap,
) -> Option<(u16, u16)> {
    let (index, cell) = ctx.found?;
    hits.push(ctx.inner, HitTarget::Cell(cell_ref(line, index, ctx.column)));
    let indent = cell.indent_level.saturating_mul(env.options.indent_width);
    let area = shrink_left(ctx.inner, indent);
    cell::paint_cell(
        cell,
        area,
        buf,
        CellPaint {
            style: ctx.style,
            hovered: line.reveal_actions,
            editor: ctx.editor,
            theme: env.theme,
        },
    )
}

/// Chevron, favorite, status, own content, tags, then the action overlay.
fn paint_first_cell(
    buf: &mut Buffer,
    line: &RowLine<'_>,
    env: &RowEnv<'_>,
    ctx: CellSlot<'_, '_>,
    tag_editor: Option<&mut LineInput>,
    hits: &mut HitMap,
) -> Option<(u16, u16)> {
    let options = env.options;
    let theme = env.theme;
    let y = ctx.inner.y;
    let right = ctx.inner.right();
    if let Some((index, _)) = ctx.found {
        hits.push(ctx.inner, HitTarget::Cell(cell_ref(line, index, ctx.column)));
    }

    let cell_indent = ctx.found.map(|(_, c)| c.indent_level).unwrap_or(0);
    let depth = u16::try_from(line.depth).unwrap_or(u16::MAX);
    let indent = depth
        .saturating_add(cell_indent)
        .saturating_mul(options.indent_width);
    let mut x = ctx.inner.x.saturating_add(indent).min(right);

    if options.expandable || options.status_column {
        if line.flavor.is_some() && x < right {
            let glyph = if line.expanded { "▾" } else { "▸" };
            buf.set_stringn(x, y, glyph, 1, ctx.style.patch(theme.text_muted));
            hits.push(Rect::new(x, y, 1, 1), HitTarget::Chevron(line.id.clone()));
        }
        x = x.saturating_add(CHEVRON_WIDTH).min(right);
    }

    if let Some(favorite) = line.row.favorite.filter(|_| x < right) {
        let (glyph, style) = if favorite {
            ("★", ctx.style.patch(theme.accent))
        } else {
            ("☆", ctx.style.patch(theme.text_muted))
        };
        buf.set_stringn(x, y, glyph, 1, style);
        hits.push(Rect::new(x, y, 1, 1), HitTarget::Favorite(line.id.clone()));
        x = x.saturating_add(2).min(right);
    }

    if options.status_column && x < right {
        let w = match &line.row.status {
            Some(status) => render::render_line_ellipsis(x, y, right - x, buf, status, ctx.style),
            None => render::render_str_ellipsis(
                x,
                y,
                right - x,
                buf,
                "○",
                ctx.style.patch(theme.text_muted),
            ),
        };
        hits.push(Rect::new(x, y, w, 1), HitTarget::Status(line.id.clone()));
        x = x.saturating_add(w + 1).min(right);
    }

    let tags_width = tags_width(line.row, tag_editor.as_deref(), right - x);
    let content = Rect::new(x, y, right - x - tags_width, 1);
    let mut cursor = None;
    if let Some((_, cell)) = ctx.found {
        cursor = cell::paint_cell(
            cell,
            content,
            buf,
            CellPaint {
                style: ctx.style,
                hovered: line.reveal_actions,
                editor: ctx.editor,
                theme,
            },
        );
    }

    if tags_width > 0 {
        let area = Rect::new(content.right(), y, tags_width, 1);
        let pos = paint_tags(area, buf, line, env, tag_editor, hits);
        cursor = cursor.or(pos);
    }

    if line.reveal_actions {
        let actions = resolved_actions(line.row, line.flavor, options);
        paint_actions(ctx.inner, buf, line, env, &actions, hits);
    }
    cursor
}

fn tag_chip(tag: &str) -> String {
    format!("#{tag}")
}

fn tags_width(row: &TableRow, editor: Option<&LineInput>, available: u16) -> u16 {
    let Some(tags) = &row.tags else {
        return 0;
    };
    let chips: usize = tags
        .tags
        .iter()
        .map(|t| render::display_width(&tag_chip(t)) + 1)
        .sum();
    let editing = if row.show_tags_editor {
        let typed = editor.map(|e| render::display_width(e.text())).unwrap_or(0) + 1;
        typed.max(render::display_width(&tags.placeholder)).max(4)
    } else {
        0
    };
    let wanted = u16::try_from(chips + editing).unwrap_or(u16::MAX);
    wanted.min(available / 2)
}

fn paint_tags(
    area: Rect,
    buf: &mut Buffer,
    line: &RowLine<'_>,
    env: &RowEnv<'_>,
    editor: Option<&mut LineInput>,
    hits: &mut HitMap,
) -> Option<(u16, u16)> {
    let tags = line.row.tags.as_ref()?;
    let right = area.right();
    let mut x = area.x + 1;
    for (index, tag) in tags.tags.iter().enumerate() {
        if x >= right {
            break;
        }
        let w = render::render_str_ellipsis(
            x,
            area.y,
            right - x,
            buf,
            &tag_chip(tag),
            line.style.patch(env.theme.tag),
        );
        hits.push(
            Rect::new(x, area.y, w, 1),
            HitTarget::Tag {
                row: line.id.clone(),
                index,
            },
        );
        x = x.saturating_add(w + 1);
    }
    if !line.row.show_tags_editor || x >= right {
        return None;
    }
    let rect = Rect::new(x, area.y, right - x, 1);
    hits.push(rect, HitTarget::TagEditor(line.id.clone()));
    match editor {
        Some(input) => input.render_ref(rect, buf, line.style),
        None => {
            let hint = (tags.placeholder.as_str(), line.style.patch(env.theme.placeholder));
            line_input::render_inline(rect, buf, "", line.style, Some(hint));
            None
        }
    }
}

/// Overlays the action buttons at the right edge of `inner`, last action rightmost.
fn paint_actions(
    inner: Rect,
    buf: &mut Buffer,
    line: &RowLine<'_>,
    env: &RowEnv<'_>,
    actions: &[ResolvedAction],
    hits: &mut HitMap,
) {
    let style = line.style.patch(env.theme.accent);
    let mut x = inner.right();
    for action in actions.iter().rev() {
        let w = u16::try_from(render::display_width(&action.icon)).unwrap_or(u16::MAX);
        let Some(start) = x.checked_sub(w + 1).filter(|s| *s >= inner.x) else {
            break;
        };
        buf.set_stringn(start, inner.y, " ", 1, line.style);
        buf.set_stringn(start + 1, inner.y, &action.icon, w as usize, style);
        hits.push(
            Rect::new(start + 1, inner.y, w, 1),
            HitTarget::RowAction {
                row: line.id.clone(),
                action: action.kind,
            },
        );
        x = start;
    }
}

fn shrink_left(rect: Rect, by: u16) -> Rect {
    let by = by.min(rect.width);
    Rect::new(rect.x + by, rect.y, rect.width - by, rect.height)
}
