use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use crate::viewport::ViewportState;

pub const ELLIPSIS: char = '…';

pub fn render_scrollbar(area: Rect, buf: &mut Buffer, state: &ViewportState, style: Style) {
    buf.set_style(area, style);
    if area.height == 0 {
        return;
    }
    if state.content_h <= state.viewport_h as u32 || state.content_h == 0 {
        for dy in 0..area.height {
            buf.set_stringn(area.x, area.y + dy, " ", 1, style);
        }
        return;
    }

    let track_h = area.height as f64;
    let thumb_h = ((state.viewport_h as f64 / state.content_h as f64) * track_h)
        .round()
        .clamp(1.0, track_h) as u16;

    let max_y = state
        .content_h
        .saturating_sub(state.viewport_h as u32)
        .max(1) as f64;
    let thumb_top = ((state.y as f64 / max_y) * (track_h - thumb_h as f64))
        .round()
        .clamp(0.0, (track_h - thumb_h as f64).max(0.0)) as u16;

    for dy in 0..area.height {
        let ch = if dy >= thumb_top && dy < thumb_top + thumb_h {
            "█"
        } else {
            " "
        };
        buf.set_stringn(area.x, area.y + dy, ch, 1, style);
    }
}

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates `input` to at most `max_cols` display columns, ending in `…` when cut.
///
/// Tabs and newlines render as a single space so a cell never grows past one line.
pub fn truncate_with_ellipsis(input: &str, max_cols: usize) -> String {
    if max_cols == 0 {
        return String::new();
    }
    let flat = flatten_whitespace(input);
    if display_width(&flat) <= max_cols {
        return flat;
    }

    let budget = max_cols - 1;
    let mut out = String::new();
    let mut used = 0usize;
    for ch in flat.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push(ELLIPSIS);
    out
}

/// Writes `input` at `(x, y)` clipped to `max_cols` with a trailing ellipsis.
///
/// Returns the number of columns written.
pub fn render_str_ellipsis(
    x: u16,
    y: u16,
    max_cols: u16,
    buf: &mut Buffer,
    input: &str,
    style: Style,
) -> u16 {
    if max_cols == 0 {
        return 0;
    }
    let text = truncate_with_ellipsis(input, max_cols as usize);
    let (end_x, _) = buf.set_stringn(x, y, &text, max_cols as usize, style);
    end_x.saturating_sub(x)
}

/// Same as [`render_str_ellipsis`] for styled lines; span styles patch `base`.
pub fn render_line_ellipsis(
    x: u16,
    y: u16,
    max_cols: u16,
    buf: &mut Buffer,
    line: &Line<'_>,
    base: Style,
) -> u16 {
    if max_cols == 0 {
        return 0;
    }
    let total: usize = line.spans.iter().map(|s| display_width(&s.content)).sum();
    let mut remaining = max_cols as usize;
    let cut = total > remaining;
    if cut {
        remaining -= 1;
    }

    let mut dx = 0u16;
    for span in &line.spans {
        if remaining == 0 {
            break;
        }
        let style = base.patch(line.style).patch(span.style);
        let text = flatten_whitespace(&span.content);
        let mut piece = String::new();
        let mut used = 0usize;
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + w > remaining {
                break;
            }
            piece.push(ch);
            used += w;
        }
        buf.set_stringn(x + dx, y, &piece, used, style);
        dx += used as u16;
        remaining -= used;
        if used < display_width(&text) {
            break;
        }
    }
    if cut {
        buf.set_stringn(x + dx, y, ELLIPSIS.to_string(), 1, base.patch(line.style));
        dx += 1;
    }
    dx
}

/// Fills `area` with `symbol` in `style`.
pub fn fill(area: Rect, buf: &mut Buffer, symbol: &str, style: Style) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
}

fn flatten_whitespace(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
