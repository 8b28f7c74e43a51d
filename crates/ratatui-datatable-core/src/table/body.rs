//! Flattening of the row tree into display lines, and painting of the non-row lines.

use crate::line_input;
use crate::render;
use crate::table::add_row::AddRowDraft;
use crate::table::add_row::AddRowTarget;
use crate::table::header::SlotKind;
use crate::table::hit::HitMap;
use crate::table::hit::HitTarget;
use crate::table::ids::RowId;
use crate::table::layout::LayoutRegistry;
use crate::table::options::TableOptions;
use crate::table::row;
use crate::table::row::ExpansionFlavor;
use crate::table::row::RowEnv;
use crate::table::tree::RowTree;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Text;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    Row { id: RowId, depth: usize },
    /// The expanded `expand_content` of `id`.
    ExpandContent { id: RowId, depth: usize },
    AddSubRow { parent: RowId, depth: usize },
    AddRow,
}

impl LineKind {
    pub fn row_id(&self) -> Option<&RowId> {
        match self {
            LineKind::Row { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn add_target(&self) -> Option<AddRowTarget> {
        match self {
            LineKind::AddRow => Some(AddRowTarget::TopLevel),
            LineKind::AddSubRow { parent, .. } => Some(AddRowTarget::SubTask(parent.clone())),
            _ => None,
        }
    }

    /// Expanded content is read-only and never takes the cursor.
    pub fn is_focusable(&self) -> bool {
        !matches!(self, LineKind::ExpandContent { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyLine {
    pub kind: LineKind,
    /// Offset of the line from the top of the body content.
    pub top: u32,
    pub height: u16,
}

enum Step {
    Row(RowId, usize),
    AddSubRow(RowId, usize),
}

/// Flattens the visible part of `tree` in display order.
///
/// Siblings follow the registry's effective row order. Expanded rows are followed by their
/// content line, or by their children and the add-sub-task line, depending on their flavor.
/// With `addable` on, one add-row line closes the list.
pub fn build_lines(
    tree: &RowTree,
    registry: &LayoutRegistry,
    options: &TableOptions,
    local_expanded: &HashSet<RowId>,
) -> Vec<BodyLine> {
    let mut lines = Vec::with_capacity(tree.len() + 1);
    let mut top = 0u32;
    let mut push = |kind: LineKind, height: u16, top: &mut u32| {
        lines.push(BodyLine {
            kind,
            top: *top,
            height,
        });
        *top = top.saturating_add(u32::from(height));
    };

    let mut stack: Vec<Step> = registry
        .effective_row_order(tree.roots())
        .into_iter()
        .rev()
        .map(|id| Step::Row(id, 0))
        .collect();

    while let Some(step) = stack.pop() {
        let (id, depth) = match step {
            Step::Row(id, depth) => (id, depth),
            Step::AddSubRow(parent, depth) => {
                push(LineKind::AddSubRow { parent, depth }, 1, &mut top);
                continue;
            }
        };
        let Some(data) = tree.get(&id) else {
            continue;
        };
        push(
            LineKind::Row {
                id: id.clone(),
                depth,
            },
            1,
            &mut top,
        );
        if !row::is_expanded(data, &id, local_expanded) {
            continue;
        }
        match row::expansion_flavor(tree, &id, options) {
            Some(ExpansionFlavor::Content) => {
                let height = data
                    .expand_content
                    .as_ref()
                    .map(|t| t.lines.len())
                    .unwrap_or(0)
                    .clamp(1, usize::from(u16::MAX)) as u16;
                push(LineKind::ExpandContent { id, depth }, height, &mut top);
            }
            Some(ExpansionFlavor::SubTasks) => {
                if data.adding_sub_task {
                    stack.push(Step::AddSubRow(id.clone(), depth + 1));
                }
                let children = registry.effective_row_order(tree.children(&id));
                stack.extend(
                    children
                        .into_iter()
                        .rev()
                        .map(|child| Step::Row(child, depth + 1)),
                );
            }
            None => {}
        }
    }

    if options.addable {
        push(LineKind::AddRow, 1, &mut top);
    }
    lines
}

pub fn content_height(lines: &[BodyLine]) -> u32 {
    lines
        .last()
        .map(|l| l.top.saturating_add(u32::from(l.height)))
        .unwrap_or(0)
}

/// Index of the line covering content offset `y`.
pub fn line_at(lines: &[BodyLine], y: u32) -> Option<usize> {
    let i = lines.partition_point(|l| l.top.saturating_add(u32::from(l.height)) <= y);
    (i < lines.len()).then_some(i)
}

/// Paints the visible part of an expanded content block, `skip` lines already scrolled away.
pub(crate) fn paint_expand_content(
    area: Rect,
    skip: u16,
    content: &Text<'_>,
    depth: usize,
    env: &RowEnv<'_>,
    style: Style,
    buf: &mut Buffer,
) {
    buf.set_style(area, style);
    let first_column_x = env
        .slots
        .iter()
        .find(|s| s.column().is_some())
        .map(|s| s.x)
        .unwrap_or(area.x);
    let depth = u16::try_from(depth + 1).unwrap_or(u16::MAX);
    let x = first_column_x
        .saturating_add(depth.saturating_mul(env.options.indent_width))
        .min(area.right());
    let base = style.patch(content.style);
    for (dy, line) in content
        .lines
        .iter()
        .skip(usize::from(skip))
        .take(usize::from(area.height))
        .enumerate()
    {
        render::render_line_ellipsis(x, area.y + dy as u16, area.right() - x, buf, line, base);
    }
}

/// Inputs for [`paint_add_line`].
pub(crate) struct AddLine<'a> {
    pub target: &'a AddRowTarget,
    pub depth: usize,
    pub label: &'a str,
    /// The line holds the keyboard focus.
    pub focused: bool,
    pub style: Style,
}

/// Paints an add-row or add-sub-task line: one slot per column, aligned with the header.
pub(crate) fn paint_add_line(
    y: u16,
    buf: &mut Buffer,
    line: &AddLine<'_>,
    mut draft: Option<&mut AddRowDraft>,
    env: &RowEnv<'_>,
    hits: &mut HitMap,
) -> Option<(u16, u16)> {
    let mut cursor = None;
    let mut first = true;
    for slot in env.slots {
        if slot.width == 0 {
            continue;
        }
        buf.set_style(slot.rect(y, 1), line.style);
        let SlotKind::Column(column) = &slot.kind else {
            continue;
        };
        let Some(index) = env.registration_index(column) else {
            continue;
        };
        let mut inner = Rect::new(slot.x, y, slot.inner_width(), 1);
        if first {
            first = false;
            let depth = u16::try_from(line.depth).unwrap_or(u16::MAX);
            let indent = depth.saturating_mul(env.options.indent_width).min(inner.width);
            inner = Rect::new(inner.x + indent, y, inner.width - indent, 1);
        }
        hits.push(
            inner,
            HitTarget::AddRowSlot {
                target: line.target.clone(),
                slot: index,
            },
        );

        let hint_style = line.style.patch(env.theme.placeholder);
        let hint = (index == 0).then_some((line.label, hint_style));
        let focused_slot = draft.as_ref().map(|d| d.focused());
        match draft.as_deref_mut().and_then(|d| d.slot_mut(index)) {
            Some(input) if line.focused && focused_slot == Some(index) => {
                let style = line.style.patch(env.cursor_style);
                cursor = input.render_ref(inner, buf, style);
            }
            Some(input) => {
                line_input::render_inline(inner, buf, input.text(), line.style, hint);
            }
            None => {
                line_input::render_inline(inner, buf, "", line.style, hint);
            }
        }
    }
    env.paint_edges(y, buf);
    cursor
}
