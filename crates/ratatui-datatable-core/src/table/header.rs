//! Header layout and painting.
//!
//! [`header_slots`] is also the horizontal layout of every body line, so the selection and fill
//! slots the header adds at the row edges are mirrored by each rendered row.

use crate::render;
use crate::table::column::TableColumn;
use crate::table::hit::HitMap;
use crate::table::hit::HitTarget;
use crate::table::ids::ColumnId;
use crate::table::layout::LayoutRegistry;
use crate::table::options::TableOptions;
use crate::table::options::TableVariant;
use crate::theme::Theme;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;

pub(crate) const GRID_LINE: &str = "│";
const RESIZE_HANDLE: &str = "┆";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Selection,
    Column(ColumnId),
    Fill,
}

/// One horizontal slot of the header and of every body line. `x` is a screen column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderSlot {
    pub kind: SlotKind,
    pub x: u16,
    /// Visible width; columns running past the right edge are clipped, possibly to zero.
    pub width: u16,
}

impl HeaderSlot {
    pub fn rect(&self, y: u16, height: u16) -> Rect {
        Rect::new(self.x, y, self.width, height)
    }

    pub fn column(&self) -> Option<&ColumnId> {
        match &self.kind {
            SlotKind::Column(id) => Some(id),
            _ => None,
        }
    }

    /// Content width of a column slot; its last cell is the grid edge.
    pub fn inner_width(&self) -> u16 {
        self.width.saturating_sub(1)
    }
}

/// Lays out the selection slot, the live columns in display order and the fill slot.
pub fn header_slots(registry: &LayoutRegistry, fill_column: bool, area: Rect) -> Vec<HeaderSlot> {
    let right = area.right();
    let mut x = area.x;
    let mut slots = Vec::with_capacity(registry.live_count() + 2);

    let mut push = |kind: SlotKind, want: u16, x: &mut u16| {
        let width = want.min(right.saturating_sub(*x));
        slots.push(HeaderSlot {
            kind,
            x: *x,
            width,
        });
        *x = x.saturating_add(width);
    };

    let selection = registry.features().selection_width;
    if selection > 0 {
        push(SlotKind::Selection, selection, &mut x);
    }
    for (id, width) in registry.column_widths() {
        push(SlotKind::Column(id), width, &mut x);
    }
    let fill = registry.fill_width(area.width);
    if fill_column && fill > 0 {
        push(SlotKind::Fill, fill, &mut x);
    }
    slots
}

pub(crate) fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

/// Live gesture state the header highlights.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct HeaderGestures<'a> {
    pub resizing: Option<&'a ColumnId>,
    pub drop_target: Option<&'a ColumnId>,
    pub focused: Option<&'a ColumnId>,
}

pub(crate) struct HeaderPaint<'a> {
    pub options: &'a TableOptions,
    pub theme: &'a Theme,
    pub style: Style,
    pub grid_style: Style,
    pub gestures: HeaderGestures<'a>,
}

/// Draws the header into `area` (one line) and records its hit regions.
pub(crate) fn paint_header<'c>(
    area: Rect,
    buf: &mut Buffer,
    slots: &[HeaderSlot],
    column: impl Fn(&ColumnId) -> Option<&'c TableColumn>,
    paint: &HeaderPaint<'_>,
    hits: &mut HitMap,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    buf.set_style(area, paint.style);
    let y = area.y;

    for slot in slots {
        if slot.width == 0 {
            continue;
        }
        match &slot.kind {
            SlotKind::Selection => {
                let x = slot.x + 1;
                let w = slot.width.saturating_sub(1).min(3);
                let checked = paint.options.select_all_checked;
                buf.set_stringn(x, y, checkbox(checked), w as usize, paint.style);
                hits.push(Rect::new(x, y, w, 1), HitTarget::SelectAll);
            }
            SlotKind::Column(id) => paint_column_title(slot, id, column(id), y, buf, paint, hits),
            SlotKind::Fill => {}
        }
    }
}

fn paint_column_title(
    slot: &HeaderSlot,
    id: &ColumnId,
    column: Option<&TableColumn>,
    y: u16,
    buf: &mut Buffer,
    paint: &HeaderPaint<'_>,
    hits: &mut HitMap,
) {
    let inner = slot.inner_width();
    let title_rect = Rect::new(slot.x, y, inner, 1);

    let mut style = paint.style;
    if paint.gestures.focused == Some(id) {
        style = style.patch(paint.theme.accent);
    }
    if paint.gestures.drop_target == Some(id) {
        style = style.patch(paint.theme.drag_target);
    }
    buf.set_style(title_rect, style);

    let title = column.map(|c| c.title.as_str()).unwrap_or("");
    let sort = column.and_then(|c| c.sort);
    let glyph_w = if sort.is_some() && inner >= 3 { 2 } else { 0 };
    render::render_str_ellipsis(slot.x, y, inner - glyph_w, buf, title, style);
    if let Some(sort) = sort.filter(|_| glyph_w > 0) {
        let mut tmp = [0u8; 4];
        buf.set_stringn(
            slot.x + inner - 1,
            y,
            sort.glyph().encode_utf8(&mut tmp),
            1,
            style.patch(paint.theme.text_muted),
        );
    }
    hits.push(title_rect, HitTarget::ColumnTitle(id.clone()));

    if slot.width == 0 || inner == slot.width {
        return;
    }
    let edge_x = slot.x + inner;
    if paint.options.resizable {
        let handle_style = if paint.gestures.resizing == Some(id) {
            paint.grid_style.patch(paint.theme.accent)
        } else {
            paint.grid_style
        };
        buf.set_stringn(edge_x, y, RESIZE_HANDLE, 1, handle_style);
        hits.push(
            Rect::new(edge_x, y, 1, 1),
            HitTarget::ResizeHandle(id.clone()),
        );
    } else if paint.options.variant != TableVariant::Minimal {
        buf.set_stringn(edge_x, y, GRID_LINE, 1, paint.grid_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::SortIndicator;
    use crate::table::layout::LayoutFeatures;

    fn registry(selection_width: u16) -> LayoutRegistry {
        let mut reg = LayoutRegistry::new(LayoutFeatures {
            selection_width,
            ..LayoutFeatures::default()
        });
        reg.begin_pass();
        reg.register_column(6, Some(8), None, Some(ColumnId::new("name")));
        reg.register_column(6, None, None, Some(ColumnId::new("status")));
        reg.end_pass();
        reg
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn slots_mirror_selection_and_fill() {
        let reg = registry(5);
        let slots = header_slots(&reg, true, Rect::new(2, 0, 30, 1));
        let kinds: Vec<&SlotKind> = slots.iter().map(|s| &s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &SlotKind::Selection,
                &SlotKind::Column(ColumnId::new("name")),
                &SlotKind::Column(ColumnId::new("status")),
                &SlotKind::Fill,
            ]
        );
        assert_eq!(slots[1].x, 7);
        assert_eq!(slots[3].x, 21);
        assert_eq!(slots[3].width, 11);
    }

    #[test]
    fn narrow_area_clips_trailing_columns() {
        let reg = registry(0);
        let slots = header_slots(&reg, true, Rect::new(0, 0, 10, 1));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].width, 2);
    }

    #[test]
    fn paints_titles_sort_glyph_and_handles() {
        let reg = registry(5);
        let area = Rect::new(0, 0, 24, 1);
        let slots = header_slots(&reg, false, area);
        let columns = [
            TableColumn::new("Name of person", 6)
                .id("name")
                .sort(SortIndicator::Ascending),
            TableColumn::new("Status", 6).id("status"),
        ];
        let options = TableOptions {
            resizable: true,
            select_all_checked: true,
            ..TableOptions::default()
        };
        let theme = Theme::default();
        let paint = HeaderPaint {
            options: &options,
            theme: &theme,
            style: Style::default(),
            grid_style: Style::default(),
            gestures: HeaderGestures::default(),
        };
        let mut buf = Buffer::empty(area);
        let mut hits = HitMap::default();
        paint_header(
            area,
            &mut buf,
            &slots,
            |id| columns.iter().find(|c| c.id.as_ref() == Some(id)),
            &paint,
            &mut hits,
        );

        assert_eq!(row_text(&buf, 0), " [x] Name… ▲┆Stat…┆     ");
        assert_eq!(hits.at(1, 0), Some(&HitTarget::SelectAll));
        assert_eq!(
            hits.at(12, 0),
            Some(&HitTarget::ResizeHandle(ColumnId::new("name")))
        );
        assert_eq!(
            hits.at(14, 0),
            Some(&HitTarget::ColumnTitle(ColumnId::new("status")))
        );
    }
}
