use ratatui::style::Style;

/// Shared palette for table rendering.
///
/// Widget options may override individual styles; a style left at `Style::default()` falls back
/// to the matching theme entry.
#[derive(Clone, Debug)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub accent: Style,
    pub header: Style,
    pub grid_line: Style,
    pub cursor: Style,
    pub hover: Style,
    pub selected_row: Style,
    /// Background of every other row in the striped variant.
    pub stripe: Style,
    pub drag_target: Style,
    pub tag: Style,
    pub placeholder: Style,
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            accent: Style::default().cyan(),
            header: Style::default().bold(),
            grid_line: Style::default().dark_gray(),
            cursor: Style::default().reversed(),
            hover: Style::default().underlined(),
            selected_row: Style::default().bold(),
            stripe: Style::default().on_black(),
            drag_target: Style::default().yellow(),
            tag: Style::default().magenta(),
            placeholder: Style::default().dark_gray().italic(),
        }
    }
}
