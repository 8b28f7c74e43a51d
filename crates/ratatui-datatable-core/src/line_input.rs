//! Single-line text input used for inline cell editing, add-row drafts and tag entry.
//!
//! Unfocused (and read-only) text goes through [`render_inline`], so editable and static cells
//! share typography and truncation.

use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::render;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineInputAction {
    None,
    Changed,
    Submitted(String),
    Cancelled,
}

#[derive(Clone, Debug, Default)]
pub struct LineInput {
    text: String,
    cursor: usize, // char index
    scroll: usize, // display columns hidden on the left
}

impl LineInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set_text(text);
        input
    }

    /// Replaces the content and moves the cursor to the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text
            .into()
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .collect();
        self.cursor = self.text.chars().count();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn input(&mut self, event: InputEvent) -> LineInputAction {
        match event {
            InputEvent::Paste(s) => {
                let mut changed = false;
                for ch in s.chars().filter(|c| *c != '\n' && *c != '\r') {
                    self.insert_char(ch);
                    changed = true;
                }
                if changed {
                    LineInputAction::Changed
                } else {
                    LineInputAction::None
                }
            }
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Mouse(_) => LineInputAction::None,
        }
    }

    /// Renders the text with a visible cursor and returns the cursor's screen position.
    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer, style: Style) -> Option<(u16, u16)> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        buf.set_style(Rect::new(area.x, area.y, area.width, 1), style);

        let cursor_x = self.cursor_display_x();
        let width = area.width as usize;
        if cursor_x < self.scroll {
            self.scroll = cursor_x;
        } else if cursor_x >= self.scroll + width {
            self.scroll = cursor_x + 1 - width;
        }

        let mut col = 0usize;
        let mut dx = 0u16;
        let mut tmp = [0u8; 4];
        for ch in self.text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if col < self.scroll {
                col += w;
                continue;
            }
            if dx as usize + w > width {
                break;
            }
            if let Some(cell) = buf.cell_mut((area.x + dx, area.y)) {
                cell.set_symbol(ch.encode_utf8(&mut tmp));
                cell.set_style(style);
            }
            dx += w as u16;
            col += w;
        }

        let x = area.x + (cursor_x - self.scroll).min(width.saturating_sub(1)) as u16;
        Some((x, area.y))
    }

    fn handle_key(&mut self, key: KeyEvent) -> LineInputAction {
        if let Some(c) = key.text_char() {
            self.insert_char(c);
            return LineInputAction::Changed;
        }
        match key.code {
            KeyCode::Enter => LineInputAction::Submitted(self.text.clone()),
            KeyCode::Esc => LineInputAction::Cancelled,
            KeyCode::Backspace => {
                if self.backspace() {
                    LineInputAction::Changed
                } else {
                    LineInputAction::None
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    LineInputAction::Changed
                } else {
                    LineInputAction::None
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                LineInputAction::None
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.char_len());
                LineInputAction::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                LineInputAction::None
            }
            KeyCode::End => {
                self.cursor = self.char_len();
                LineInputAction::None
            }
            _ => LineInputAction::None,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn cursor_display_x(&self) -> usize {
        self.text
            .chars()
            .take(self.cursor)
            .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
            .sum()
    }

    fn insert_char(&mut self, ch: char) {
        let byte_idx = byte_index_from_char_index(&self.text, self.cursor);
        self.text.insert(byte_idx, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = byte_index_from_char_index(&self.text, self.cursor - 1);
        let end = byte_index_from_char_index(&self.text, self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
        true
    }

    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let start = byte_index_from_char_index(&self.text, self.cursor);
        let end = byte_index_from_char_index(&self.text, self.cursor + 1);
        self.text.replace_range(start..end, "");
        true
    }
}

/// Renders non-editing text the way an unfocused [`LineInput`] shows it.
///
/// Empty text shows `placeholder` in `placeholder_style` instead.
pub fn render_inline(
    area: Rect,
    buf: &mut Buffer,
    text: &str,
    style: Style,
    placeholder: Option<(&str, Style)>,
) -> u16 {
    if area.width == 0 || area.height == 0 {
        return 0;
    }
    match placeholder {
        Some((hint, hint_style)) if text.is_empty() => {
            render::render_str_ellipsis(area.x, area.y, area.width, buf, hint, hint_style)
        }
        _ => render::render_str_ellipsis(area.x, area.y, area.width, buf, text, style),
    }
}

fn byte_index_from_char_index(s: &str, char_idx: usize) -> usize {
    match s.char_indices().nth(char_idx) {
        Some((i, _)) => i,
        None => s.len(),
    }
}
