use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::line_input::LineInput;
use crate::line_input::LineInputAction;
use crate::render;
use crate::table::action::CellRef;
use crate::table::action::TableAction;
use crate::table::add_row::AddRowDraft;
use crate::table::add_row::AddRowTarget;
use crate::table::add_row::BlurOutcome;
use crate::table::add_row::DraftAction;
use crate::table::body;
use crate::table::body::AddLine;
use crate::table::body::BodyLine;
use crate::table::body::LineKind;
use crate::table::cell;
use crate::table::cell::CellMode;
use crate::table::cell::Dropdown;
use crate::table::cell::TableCell;
use crate::table::column::TableColumn;
use crate::table::header;
use crate::table::header::HeaderGestures;
use crate::table::header::HeaderPaint;
use crate::table::header::HeaderSlot;
use crate::table::hit::HitMap;
use crate::table::hit::HitTarget;
use crate::table::ids::ColumnId;
use crate::table::ids::DragId;
use crate::table::ids::ParseDragIdError;
use crate::table::ids::RowId;
use crate::table::layout::LayoutFeatures;
use crate::table::layout::LayoutRegistry;
use crate::table::layout::Reordered;
use crate::table::options::TableBindings;
use crate::table::options::TableOptions;
use crate::table::options::TableVariant;
use crate::table::resize::ColumnResizer;
use crate::table::row;
use crate::table::row::ActionKind;
use crate::table::row::RowEditors;
use crate::table::row::RowEnv;
use crate::table::row::RowLine;
use crate::table::tree::RowTree;
use crate::table::tree::TableRow;
use crate::theme::Theme;
use crate::viewport::ViewportState;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::debug;
use tracing::trace;

const SCROLL_STEP: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    SelectAll,
    ToggleSelect,
    ToggleExpand,
    Activate,
    ToggleFavorite,
    ActivateStatus,
    MoveRowUp,
    MoveRowDown,
    MoveColumnLeft,
    MoveColumnRight,
    GrowColumn,
    ShrinkColumn,
}

fn command_for(bindings: &TableBindings, key: &KeyEvent) -> Option<Command> {
    // Terminals disagree on whether shifted characters carry SHIFT.
    let mut key = key.clone();
    if matches!(key.code, KeyCode::Char(_)) {
        key.modifiers.shift = false;
    }
    [
        (&bindings.select_all, Command::SelectAll),
        (&bindings.toggle_select, Command::ToggleSelect),
        (&bindings.toggle_expand, Command::ToggleExpand),
        (&bindings.activate, Command::Activate),
        (&bindings.toggle_favorite, Command::ToggleFavorite),
        (&bindings.activate_status, Command::ActivateStatus),
        (&bindings.move_row_up, Command::MoveRowUp),
        (&bindings.move_row_down, Command::MoveRowDown),
        (&bindings.move_column_left, Command::MoveColumnLeft),
        (&bindings.move_column_right, Command::MoveColumnRight),
        (&bindings.grow_column, Command::GrowColumn),
        (&bindings.shrink_column, Command::ShrinkColumn),
    ]
    .into_iter()
    .find(|(binding, _)| binding.matches(&key))
    .map(|(_, command)| command)
}

fn is_vertical(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown
    )
}

fn or_theme(style: Style, fallback: Style) -> Style {
    if style == Style::default() {
        fallback
    } else {
        style
    }
}

#[derive(Clone, Debug)]
struct CellEditor {
    target: CellRef,
    input: LineInput,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ReorderDrag {
    dragged: DragId,
    over: Option<DragId>,
}

#[derive(Clone, Copy, Debug)]
struct Styles {
    base: Style,
    header: Style,
    grid: Style,
    cursor: Style,
}

/// An interactive table over a caller-owned [`RowTree`].
///
/// The view owns presentation state only: column geometry and orders (through its
/// [`LayoutRegistry`]), the keyboard cursor, locally expanded rows, open editors and add-row
/// drafts. Row content and every caller-visible flag stay with the app, which passes the tree
/// and the column definitions to each [`TableView::render`] and [`TableView::handle_event`]
/// call and applies the returned [`TableAction`].
///
/// Keyboard focus goes, in order, to an open dropdown, an open cell editor, the tags editor of
/// the cursor row, the add line under the cursor, and finally the grid itself.
#[derive(Clone, Debug)]
pub struct TableView {
    pub state: ViewportState,
    options: TableOptions,
    registry: LayoutRegistry,
    resizer: ColumnResizer,
    reorder: Option<ReorderDrag>,
    cursor_line: usize,
    /// Survives line rebuilds, so the cursor follows its line when rows move.
    cursor_key: Option<LineKind>,
    /// Display index of the focused column.
    cursor_column: usize,
    expanded: HashSet<RowId>,
    editor: Option<CellEditor>,
    dropdown: Option<Dropdown>,
    tag_input: Option<(RowId, LineInput)>,
    add_row: Option<AddRowDraft>,
    sub_drafts: HashMap<RowId, AddRowDraft>,
    /// Add line to focus as soon as the caller shows it.
    pending_focus: Option<AddRowTarget>,
    hover: Option<(u16, u16)>,
    registered: Vec<ColumnId>,
    lines: Vec<BodyLine>,
    slots: Vec<HeaderSlot>,
    hits: HitMap,
    body_area: Rect,
    cursor_position: Option<(u16, u16)>,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

impl TableView {
    pub fn new() -> Self {
        Self::with_options(TableOptions::default())
    }

    pub fn with_options(options: TableOptions) -> Self {
        let mut registry = LayoutRegistry::new(LayoutFeatures::from(&options));
        registry.set_controlled_orders(options.column_order.clone(), options.row_order.clone());
        Self {
            state: ViewportState::default(),
            options,
            registry,
            resizer: ColumnResizer::new(),
            reorder: None,
            cursor_line: 0,
            cursor_key: None,
            cursor_column: 0,
            expanded: HashSet::new(),
            editor: None,
            dropdown: None,
            tag_input: None,
            add_row: None,
            sub_drafts: HashMap::new(),
            pending_focus: None,
            hover: None,
            registered: Vec::new(),
            lines: Vec::new(),
            slots: Vec::new(),
            hits: HitMap::default(),
            body_area: Rect::default(),
            cursor_position: None,
        }
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TableOptions) {
        self.registry.set_features(LayoutFeatures::from(&options));
        self.registry
            .set_controlled_orders(options.column_order.clone(), options.row_order.clone());
        self.options = options;
    }

    pub fn set_select_all_checked(&mut self, checked: bool) {
        self.options.select_all_checked = checked;
    }

    /// Switches column order between controlled (`Some`) and internal (`None`).
    pub fn set_column_order(&mut self, order: Option<Vec<ColumnId>>) {
        self.options.column_order = order;
        self.registry.set_controlled_orders(
            self.options.column_order.clone(),
            self.options.row_order.clone(),
        );
    }

    /// Switches row order between controlled (`Some`) and internal (`None`).
    pub fn set_row_order(&mut self, order: Option<Vec<RowId>>) {
        self.options.row_order = order;
        self.registry.set_controlled_orders(
            self.options.column_order.clone(),
            self.options.row_order.clone(),
        );
    }

    pub fn registry(&self) -> &LayoutRegistry {
        &self.registry
    }

    /// Programmatic width updates go through here; like a drag, they turn auto-fit off.
    pub fn registry_mut(&mut self) -> &mut LayoutRegistry {
        &mut self.registry
    }

    /// Terminal cursor position of the focused text input after the last render.
    pub fn cursor_position(&self) -> Option<(u16, u16)> {
        self.cursor_position
    }

    pub fn lines(&self) -> &[BodyLine] {
        &self.lines
    }

    pub fn focused_line(&self) -> Option<&LineKind> {
        self.lines.get(self.cursor_line).map(|l| &l.kind)
    }

    pub fn focused_row(&self) -> Option<&RowId> {
        self.focused_line().and_then(LineKind::row_id)
    }

    pub fn focused_column(&self) -> Option<ColumnId> {
        self.registry
            .effective_column_order()
            .get(self.cursor_column)
            .cloned()
    }

    /// A cell editor or dropdown holds the keyboard.
    pub fn is_editing(&self) -> bool {
        self.editor.is_some() || self.dropdown.is_some()
    }

    /// Current values of an open add line, in column definition order.
    pub fn draft_values(&self, target: &AddRowTarget) -> Option<Vec<String>> {
        match target {
            AddRowTarget::TopLevel => self.add_row.as_ref(),
            AddRowTarget::SubTask(parent) => self.sub_drafts.get(parent),
        }
        .map(AddRowDraft::values)
    }

    pub fn render(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        theme: &Theme,
        tree: &RowTree,
        columns: &[TableColumn],
    ) {
        self.hits.clear();
        self.cursor_position = None;
        if area.width == 0 || area.height == 0 {
            return;
        }

        let header_h = u16::from(self.options.show_header).min(area.height);
        let (content_area, scrollbar_x) = if self.options.show_scrollbar && area.width >= 2 {
            (
                Rect::new(area.x, area.y, area.width - 1, area.height),
                Some(area.x + area.width - 1),
            )
        } else {
            (area, None)
        };

        self.sync(tree, columns);
        self.registry.observe_container_width(content_area.width);

        let header_area = Rect::new(content_area.x, content_area.y, content_area.width, header_h);
        let body_area = Rect::new(
            content_area.x,
            content_area.y + header_h,
            content_area.width,
            content_area.height - header_h,
        );
        self.body_area = body_area;
        self.slots = header::header_slots(&self.registry, self.options.fill_column, content_area);
        self.state.set_viewport(body_area.width, body_area.height);
        self.state.set_content(
            u32::from(body_area.width),
            body::content_height(&self.lines),
        );

        let styles = Styles {
            base: or_theme(self.options.style, theme.text_primary),
            header: theme.header.patch(self.options.header_style),
            grid: or_theme(self.options.grid_line_style, theme.grid_line),
            cursor: or_theme(self.options.cursor_style, theme.cursor),
        };
        buf.set_style(content_area, styles.base);

        if header_area.height > 0 {
            self.paint_header(header_area, buf, theme, columns, &styles);
        }
        self.paint_body(body_area, buf, theme, tree, &styles);
        self.paint_dropdown(body_area, buf, theme, tree);

        if let Some(sb_x) = scrollbar_x {
            render::render_scrollbar(
                Rect::new(sb_x, body_area.y, 1, body_area.height),
                buf,
                &ViewportState {
                    x: 0,
                    y: self.state.y,
                    viewport_w: 1,
                    viewport_h: body_area.height,
                    content_w: 1,
                    content_h: self.state.content_h,
                },
                or_theme(self.options.scrollbar_style, theme.text_muted),
            );
        }
    }

    pub fn handle_event(
        &mut self,
        event: InputEvent,
        tree: &RowTree,
        columns: &[TableColumn],
    ) -> TableAction {
        self.sync(tree, columns);
        match event {
            InputEvent::Key(key) => self.handle_key(key, tree),
            InputEvent::Paste(text) => self.handle_paste(text),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse, tree),
        }
    }

    /// Registers this frame's columns and rows and reconciles transient state with the tree.
    fn sync(&mut self, tree: &RowTree, columns: &[TableColumn]) {
        self.registry.begin_pass();
        self.registered.clear();
        for column in columns {
            let id = self.registry.register_column(
                column.min_width,
                column.default_width,
                column.max_width,
                column.id.clone(),
            );
            self.registered.push(id);
        }
        self.registry.end_pass();
        for id in tree.iter_ids() {
            if tree.has_explicit_id(&id) {
                self.registry.register_row(&id);
            }
        }
        self.registry.retain_rows(|id| tree.has_explicit_id(id));

        let count = self.registered.len();
        if !self.options.addable {
            self.add_row = None;
        }
        if let Some(draft) = &mut self.add_row {
            draft.sync_columns(count);
        }
        self.sub_drafts
            .retain(|parent, _| tree.get(parent).is_some_and(|r| r.adding_sub_task));
        for draft in self.sub_drafts.values_mut() {
            draft.sync_columns(count);
        }
        if self
            .editor
            .as_ref()
            .is_some_and(|e| !tree.contains(&e.target.row))
        {
            self.editor = None;
        }
        if self
            .dropdown
            .as_ref()
            .is_some_and(|d| !tree.contains(&d.target.row))
        {
            self.dropdown = None;
        }
        self.expanded.retain(|id| tree.contains(id));

        self.rebuild_lines(tree);

        if let Some(target) = self.pending_focus.clone() {
            if let Some(i) = self.line_of_add(&target) {
                self.pending_focus = None;
                self.set_cursor_line(i);
            } else if let AddRowTarget::SubTask(parent) = &target {
                if !tree.contains(parent) {
                    self.pending_focus = None;
                }
            }
        }
        if let Some(target) = self.cursor_add_target() {
            self.draft_entry(&target);
        }

        let tag_row = self
            .focused_row()
            .filter(|id| tree.get(id).is_some_and(|r| r.show_tags_editor))
            .cloned();
        match tag_row {
            Some(id) => {
                if self.tag_input.as_ref().is_none_or(|(r, _)| *r != id) {
                    self.tag_input = Some((id, LineInput::new()));
                }
            }
            None => self.tag_input = None,
        }
    }

    fn rebuild_lines(&mut self, tree: &RowTree) {
        self.lines = body::build_lines(tree, &self.registry, &self.options, &self.expanded);
        if let Some(i) = self
            .cursor_key
            .as_ref()
            .and_then(|key| self.lines.iter().position(|l| &l.kind == key))
        {
            self.cursor_line = i;
        }
        self.clamp_cursor();
        self.state.set_content(
            u32::from(self.state.viewport_w),
            body::content_height(&self.lines),
        );
    }

    fn clamp_cursor(&mut self) {
        let Some(last) = self.lines.len().checked_sub(1) else {
            self.cursor_line = 0;
            self.cursor_key = None;
            return;
        };
        let mut i = self.cursor_line.min(last);
        while i > 0 && !self.lines[i].kind.is_focusable() {
            i -= 1;
        }
        self.cursor_line = i;
        self.cursor_key = Some(self.lines[i].kind.clone());
        self.cursor_column = self
            .cursor_column
            .min(self.registry.live_count().saturating_sub(1));
    }

    fn paint_header(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        theme: &Theme,
        columns: &[TableColumn],
        styles: &Styles,
    ) {
        let focused = self.focused_column();
        let drop_target = match self.reorder.as_ref().and_then(|d| d.over.as_ref()) {
            Some(DragId::Column(id)) => Some(id),
            _ => None,
        };
        let paint = HeaderPaint {
            options: &self.options,
            theme,
            style: styles.header,
            grid_style: styles.grid,
            gestures: HeaderGestures {
                resizing: self.resizer.active_column(),
                drop_target,
                focused: focused.as_ref(),
            },
        };
        let registered = &self.registered;
        header::paint_header(
            area,
            buf,
            &self.slots,
            |id| {
                registered
                    .iter()
                    .position(|c| c == id)
                    .and_then(|i| columns.get(i))
            },
            &paint,
            &mut self.hits,
        );
    }

    fn paint_body(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        theme: &Theme,
        tree: &RowTree,
        styles: &Styles,
    ) {
        if area.height == 0 {
            return;
        }
        let hovered = self.hovered_line();
        let focused_column = self.focused_column();
        let drop_row = match self.reorder.as_ref().and_then(|d| d.over.as_ref()) {
            Some(DragId::Row(id)) => Some(id.clone()),
            _ => None,
        };
        let grid_focused = self.editor.is_none() && self.dropdown.is_none();

        let env = RowEnv {
            options: &self.options,
            theme,
            slots: &self.slots,
            registered: &self.registered,
            grid_style: styles.grid,
            cursor_style: styles.cursor,
        };
        let view_top = self.state.y;
        let view_bottom = view_top.saturating_add(u32::from(area.height));
        let first = body::line_at(&self.lines, view_top).unwrap_or(self.lines.len());
        let mut cursor = None;
        let mut stripe = 0usize;

        for (i, line) in self.lines.iter().enumerate() {
            if let LineKind::Row { .. } = line.kind {
                stripe += 1;
            }
            if i < first {
                continue;
            }
            if line.top >= view_bottom {
                break;
            }
            let skip = view_top.saturating_sub(line.top) as u16;
            let y = area.y + line.top.saturating_sub(view_top) as u16;
            let height = line.height.saturating_sub(skip).min(area.bottom() - y);
            let is_cursor = i == self.cursor_line;
            let mut style = styles.base;

            match &line.kind {
                LineKind::Row { id, depth } => {
                    let Some(data) = tree.get(id) else {
                        continue;
                    };
                    if self.options.variant == TableVariant::Striped && stripe % 2 == 0 {
                        style = style.patch(theme.stripe);
                    }
                    if data.selected {
                        style = style.patch(theme.selected_row);
                    }
                    if drop_row.as_ref() == Some(id) {
                        style = style.patch(theme.drag_target);
                    }
                    let row_line = RowLine {
                        id,
                        row: data,
                        depth: *depth,
                        flavor: row::expansion_flavor(tree, id, &self.options),
                        expanded: row::is_expanded(data, id, &self.expanded),
                        draggable: self.options.reorderable_rows && tree.has_explicit_id(id),
                        reveal_actions: is_cursor || hovered == Some(i),
                        cursor_column: if is_cursor {
                            focused_column.as_ref()
                        } else {
                            None
                        },
                        style,
                    };
                    let editors = RowEditors {
                        cell: self
                            .editor
                            .as_mut()
                            .filter(|e| &e.target.row == id)
                            .map(|e| (e.target.cell, &mut e.input)),
                        tags: self
                            .tag_input
                            .as_mut()
                            .filter(|(r, _)| is_cursor && grid_focused && r == id)
                            .map(|(_, input)| input),
                    };
                    let pos = row::paint_row(y, buf, &row_line, &env, editors, &mut self.hits);
                    cursor = cursor.or(pos);
                }
                LineKind::ExpandContent { id, depth } => {
                    if let Some(content) = tree.get(id).and_then(|r| r.expand_content.as_ref()) {
                        body::paint_expand_content(
                            Rect::new(area.x, y, area.width, height),
                            skip,
                            content,
                            *depth,
                            &env,
                            style,
                            buf,
                        );
                    }
                }
                LineKind::AddSubRow { parent, depth } => {
                    let target = AddRowTarget::SubTask(parent.clone());
                    let add = AddLine {
                        target: &target,
                        depth: *depth,
                        label: &self.options.add_sub_task_label,
                        focused: is_cursor && grid_focused,
                        style,
                    };
                    let draft = self.sub_drafts.get_mut(parent);
                    let pos = body::paint_add_line(y, buf, &add, draft, &env, &mut self.hits);
                    cursor = cursor.or(pos);
                }
                LineKind::AddRow => {
                    let add = AddLine {
                        target: &AddRowTarget::TopLevel,
                        depth: 0,
                        label: &self.options.add_row_placeholder,
                        focused: is_cursor && grid_focused,
                        style,
                    };
                    let draft = self.add_row.as_mut();
                    let pos = body::paint_add_line(y, buf, &add, draft, &env, &mut self.hits);
                    cursor = cursor.or(pos);
                }
            }
        }
        self.cursor_position = cursor;
    }

    fn paint_dropdown(&mut self, bounds: Rect, buf: &mut Buffer, theme: &Theme, tree: &RowTree) {
        let Some(dropdown) = &self.dropdown else {
            return;
        };
        let Some((options, _)) = tree
            .get(&dropdown.target.row)
            .and_then(|r| r.cells.get(dropdown.target.cell))
            .and_then(TableCell::select_options)
        else {
            return;
        };
        let Some(anchor) = self.hits.rect_of(&HitTarget::Cell(dropdown.target.clone())) else {
            return;
        };
        let rects = cell::paint_dropdown(dropdown, options, anchor, bounds, buf, theme);
        for (i, rect) in rects.into_iter().enumerate() {
            self.hits.push(rect, HitTarget::DropdownItem(i));
        }
        self.cursor_position = None;
    }

    fn handle_key(&mut self, key: KeyEvent, tree: &RowTree) -> TableAction {
        if self.dropdown.is_some() {
            return self.dropdown_key(&key);
        }
        if self.editor.is_some() {
            return self.editor_input(InputEvent::Key(key));
        }
        if let Some(action) = self.tags_key(&key, tree) {
            return action;
        }
        if let Some(target) = self.cursor_add_target() {
            if !is_vertical(key.code) {
                return self.draft_input(&target, InputEvent::Key(key));
            }
        }
        self.grid_key(&key, tree)
    }

    fn handle_paste(&mut self, text: String) -> TableAction {
        if self.dropdown.is_some() {
            return TableAction::None;
        }
        if self.editor.is_some() {
            return self.editor_input(InputEvent::Paste(text));
        }
        if let Some((_, input)) = self.tag_input.as_mut() {
            return match input.input(InputEvent::Paste(text)) {
                LineInputAction::Changed => TableAction::Redraw,
                _ => TableAction::None,
            };
        }
        match self.cursor_add_target() {
            Some(target) => self.draft_input(&target, InputEvent::Paste(text)),
            None => TableAction::None,
        }
    }

    fn grid_key(&mut self, key: &KeyEvent, tree: &RowTree) -> TableAction {
        if let Some(command) = command_for(&self.options.bindings, key) {
            return self.run_command(command, tree);
        }
        if let Some(n) = key
            .text_char()
            .and_then(|c| c.to_digit(10))
            .filter(|d| *d > 0)
        {
            return self.invoke_nth_action(n as usize - 1, tree);
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.step_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.step_cursor(-1),
            KeyCode::Left | KeyCode::Char('h') => self.step_column(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step_column(1),
            KeyCode::PageDown => {
                let step = usize::from(self.state.viewport_h.max(1));
                self.move_cursor_to(self.cursor_line.saturating_add(step))
            }
            KeyCode::PageUp => {
                let step = usize::from(self.state.viewport_h.max(1));
                self.move_cursor_to(self.cursor_line.saturating_sub(step))
            }
            KeyCode::Home | KeyCode::Char('g') => self.move_cursor_to(0),
            KeyCode::End | KeyCode::Char('G') => {
                self.move_cursor_to(self.lines.len().saturating_sub(1))
            }
            _ => TableAction::None,
        }
    }

    fn run_command(&mut self, command: Command, tree: &RowTree) -> TableAction {
        let focused = self.focused_row_entry(tree);
        match command {
            Command::SelectAll => {
                if !self.options.selection_column {
                    return TableAction::None;
                }
                TableAction::SelectAllChanged(!self.options.select_all_checked)
            }
            Command::ToggleSelect => match focused {
                Some((row, data)) if self.options.selection_column => {
                    TableAction::SelectionChanged {
                        row,
                        selected: !data.selected,
                    }
                }
                _ => TableAction::None,
            },
            Command::ToggleExpand => match focused {
                Some((row, _)) => self.toggle_expand(&row, tree),
                None => TableAction::None,
            },
            Command::Activate => self.activate_cell(tree),
            Command::ToggleFavorite => match focused {
                Some((row, data)) => match data.favorite {
                    Some(favorite) => TableAction::FavoriteToggled {
                        row,
                        favorite: !favorite,
                    },
                    None => TableAction::None,
                },
                None => TableAction::None,
            },
            Command::ActivateStatus => match focused {
                Some((row, _)) if self.options.status_column => TableAction::StatusActivated(row),
                _ => TableAction::None,
            },
            Command::MoveRowUp => self.move_row(tree, -1),
            Command::MoveRowDown => self.move_row(tree, 1),
            Command::MoveColumnLeft => self.move_column(-1),
            Command::MoveColumnRight => self.move_column(1),
            Command::GrowColumn => self.resize_step(1),
            Command::ShrinkColumn => self.resize_step(-1),
        }
    }

    fn focused_row_entry<'t>(&self, tree: &'t RowTree) -> Option<(RowId, &'t TableRow)> {
        let id = self.focused_row()?.clone();
        let row = tree.get(&id)?;
        Some((id, row))
    }

    fn step_cursor(&mut self, delta: isize) -> TableAction {
        let mut i = self.cursor_line;
        loop {
            let Some(next) = i.checked_add_signed(delta).filter(|n| *n < self.lines.len()) else {
                return TableAction::None;
            };
            i = next;
            if self.lines[i].kind.is_focusable() {
                return self.move_cursor_to(i);
            }
        }
    }

    fn step_column(&mut self, delta: isize) -> TableAction {
        let count = self.registry.live_count();
        let Some(next) = self
            .cursor_column
            .checked_add_signed(delta)
            .filter(|n| *n < count)
        else {
            return TableAction::None;
        };
        self.cursor_column = next;
        TableAction::Redraw
    }

    /// Moves the cursor by user request. Leaving an add line blurs its draft.
    fn move_cursor_to(&mut self, index: usize) -> TableAction {
        let Some(last) = self.lines.len().checked_sub(1) else {
            return TableAction::None;
        };
        let mut index = index.min(last);
        while index > 0 && !self.lines[index].kind.is_focusable() {
            index -= 1;
        }
        if index == self.cursor_line {
            return TableAction::None;
        }
        self.pending_focus = None;
        let leaving = self.cursor_add_target();
        self.set_cursor_line(index);
        if let Some(target) = leaving {
            let blurred = self.blur_draft(&target);
            if !matches!(blurred, TableAction::None | TableAction::Redraw) {
                return blurred;
            }
        }
        TableAction::Redraw
    }

    fn set_cursor_line(&mut self, index: usize) {
        let Some(line) = self.lines.get(index) else {
            return;
        };
        self.state
            .ensure_visible_y(line.top, u32::from(line.height));
        self.cursor_line = index;
        self.cursor_key = Some(line.kind.clone());
        if self
            .tag_input
            .as_ref()
            .is_some_and(|(r, _)| Some(r) != self.focused_row())
        {
            self.tag_input = None;
        }
    }

    fn line_of_row(&self, id: &RowId) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.kind.row_id() == Some(id))
    }

    fn line_of_add(&self, target: &AddRowTarget) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.kind.add_target().as_ref() == Some(target))
    }

    fn focus_row_line(&mut self, id: &RowId) {
        if let Some(i) = self.line_of_row(id) {
            self.set_cursor_line(i);
        }
    }

    fn focus_column(&mut self, column: &ColumnId) {
        if let Some(i) = self
            .registry
            .effective_column_order()
            .iter()
            .position(|c| c == column)
        {
            self.cursor_column = i;
        }
    }

    fn cursor_add_target(&self) -> Option<AddRowTarget> {
        self.focused_line().and_then(LineKind::add_target)
    }

    fn hovered_line(&self) -> Option<usize> {
        let (x, y) = self.hover?;
        self.line_at_screen(x, y)
    }

    fn line_at_screen(&self, x: u16, y: u16) -> Option<usize> {
        if !self.body_area.contains(Position { x, y }) {
            return None;
        }
        body::line_at(
            &self.lines,
            self.state.y + u32::from(y - self.body_area.y),
        )
    }

    fn toggle_expand(&mut self, id: &RowId, tree: &RowTree) -> TableAction {
        let Some(data) = tree.get(id) else {
            return TableAction::None;
        };
        if row::expansion_flavor(tree, id, &self.options).is_none() {
            return TableAction::None;
        }
        let expanded = !row::is_expanded(data, id, &self.expanded);
        if data.expanded.is_none() {
            if expanded {
                self.expanded.insert(id.clone());
            } else {
                self.expanded.remove(id);
            }
            let before = self.cursor_key.clone();
            self.rebuild_lines(tree);
            // The cursor sat inside the collapsed subtree.
            if before.is_some() && self.cursor_key != before {
                self.focus_row_line(id);
            }
        }
        debug!(row = %id, expanded, "row expansion toggled");
        TableAction::ExpandToggled {
            row: id.clone(),
            expanded,
        }
    }

    fn activate_cell(&mut self, tree: &RowTree) -> TableAction {
        let Some((id, data)) = self.focused_row_entry(tree) else {
            return TableAction::None;
        };
        let Some(column) = self.focused_column() else {
            return TableAction::None;
        };
        let index = self.registered.iter().position(|c| *c == column);
        let Some((cell_index, cell)) = row::cell_for_column(data, &column, index) else {
            return TableAction::None;
        };
        let target = CellRef {
            row: id,
            cell: cell_index,
            column,
        };
        self.open_cell(target, cell)
    }

    fn open_cell(&mut self, target: CellRef, cell: &TableCell) -> TableAction {
        match cell.mode() {
            CellMode::Editable { deferred: false } => {
                self.open_editor(target, cell.editable_value().unwrap_or_default());
                TableAction::Redraw
            }
            CellMode::Dropdown => {
                let Some((options, selected)) = cell.select_options() else {
                    return TableAction::None;
                };
                if options.is_empty() {
                    return TableAction::None;
                }
                trace!(row = %target.row, column = %target.column, "dropdown opened");
                self.dropdown = Some(Dropdown::new(target, selected, options.len()));
                TableAction::Redraw
            }
            CellMode::Editable { deferred: true } | CellMode::ReadOnlyText | CellMode::Custom => {
                TableAction::None
            }
        }
    }

    fn open_editor(&mut self, target: CellRef, value: &str) {
        debug!(row = %target.row, column = %target.column, "cell editor opened");
        self.dropdown = None;
        self.editor = Some(CellEditor {
            target,
            input: LineInput::with_text(value),
        });
    }

    fn editor_input(&mut self, event: InputEvent) -> TableAction {
        let Some(editor) = self.editor.as_mut() else {
            return TableAction::None;
        };
        match editor.input.input(event) {
            LineInputAction::None => TableAction::None,
            LineInputAction::Changed => TableAction::CellChanged {
                cell: editor.target.clone(),
                value: editor.input.text().to_string(),
            },
            LineInputAction::Submitted(value) => {
                let cell = editor.target.clone();
                self.editor = None;
                debug!(row = %cell.row, column = %cell.column, "cell committed");
                TableAction::CellCommitted { cell, value }
            }
            LineInputAction::Cancelled => {
                self.editor = None;
                TableAction::Redraw
            }
        }
    }

    /// Blur of the cell editor: the typed value is committed.
    fn commit_editor(&mut self) -> TableAction {
        let Some(editor) = self.editor.take() else {
            return TableAction::None;
        };
        debug!(row = %editor.target.row, column = %editor.target.column, "cell committed on blur");
        TableAction::CellCommitted {
            value: editor.input.text().to_string(),
            cell: editor.target,
        }
    }

    fn dropdown_key(&mut self, key: &KeyEvent) -> TableAction {
        let Some(dropdown) = self.dropdown.as_mut() else {
            return TableAction::None;
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                dropdown.move_by(-1);
                TableAction::Redraw
            }
            KeyCode::Down | KeyCode::Char('j') => {
                dropdown.move_by(1);
                TableAction::Redraw
            }
            KeyCode::Enter => match self.dropdown.take() {
                Some(dropdown) => TableAction::CellSelected {
                    cell: dropdown.target,
                    index: dropdown.highlighted,
                },
                None => TableAction::None,
            },
            KeyCode::Esc => {
                self.dropdown = None;
                TableAction::Redraw
            }
            _ => TableAction::None,
        }
    }

    /// Keys for the tags editor of the cursor row. `None` lets the key fall through to the grid.
    fn tags_key(&mut self, key: &KeyEvent, tree: &RowTree) -> Option<TableAction> {
        if is_vertical(key.code) {
            return None;
        }
        let (row, input) = self.tag_input.as_mut()?;
        let row = row.clone();
        let action = match key.code {
            KeyCode::Esc => {
                input.clear();
                TableAction::TagsEditorClosed(row)
            }
            KeyCode::Enter => {
                let tag = input.text().trim().to_string();
                if tag.is_empty() {
                    TableAction::None
                } else {
                    input.clear();
                    trace!(row = %row, tag = %tag, "tag added");
                    TableAction::TagAdded { row, tag }
                }
            }
            KeyCode::Backspace if input.text().is_empty() => {
                let count = tree
                    .get(&row)
                    .and_then(|r| r.tags.as_ref())
                    .map_or(0, |t| t.tags.len());
                match count.checked_sub(1) {
                    Some(index) => TableAction::TagRemoved { row, index },
                    None => TableAction::None,
                }
            }
            _ => match input.input(InputEvent::Key(key.clone())) {
                LineInputAction::Changed => TableAction::Redraw,
                _ => TableAction::None,
            },
        };
        Some(action)
    }

    fn draft_entry(&mut self, target: &AddRowTarget) -> &mut AddRowDraft {
        let columns = self.registered.len();
        match target {
            AddRowTarget::TopLevel => self
                .add_row
                .get_or_insert_with(|| AddRowDraft::new(AddRowTarget::TopLevel, columns)),
            AddRowTarget::SubTask(parent) => self
                .sub_drafts
                .entry(parent.clone())
                .or_insert_with(|| AddRowDraft::new(target.clone(), columns)),
        }
    }

    fn drop_draft(&mut self, target: &AddRowTarget) {
        match target {
            AddRowTarget::TopLevel => self.add_row = None,
            AddRowTarget::SubTask(parent) => {
                self.sub_drafts.remove(parent);
            }
        }
    }

    /// Definition-order slot indices in display order, for `Tab` traversal.
    fn slot_order(&self) -> Vec<usize> {
        self.registry
            .effective_column_order()
            .iter()
            .filter_map(|id| self.registered.iter().position(|c| c == id))
            .collect()
    }

    fn draft_input(&mut self, target: &AddRowTarget, event: InputEvent) -> TableAction {
        let order = self.slot_order();
        match self.draft_entry(target).input(event, &order) {
            DraftAction::None => TableAction::None,
            DraftAction::Changed => TableAction::Redraw,
            DraftAction::Committed(values) => Self::added(target, values),
            DraftAction::Blurred(outcome) => self.apply_blur(target, outcome),
        }
    }

    fn blur_draft(&mut self, target: &AddRowTarget) -> TableAction {
        let outcome = match target {
            AddRowTarget::TopLevel => self.add_row.as_mut().map(AddRowDraft::blur),
            AddRowTarget::SubTask(parent) => self.sub_drafts.get_mut(parent).map(AddRowDraft::blur),
        };
        match outcome {
            Some(outcome) => self.apply_blur(target, outcome),
            None => TableAction::None,
        }
    }

    fn apply_blur(&mut self, target: &AddRowTarget, outcome: BlurOutcome) -> TableAction {
        match outcome {
            BlurOutcome::Committed(values) => Self::added(target, values),
            BlurOutcome::Cancelled => {
                self.drop_draft(target);
                match target {
                    AddRowTarget::SubTask(parent) => {
                        debug!(parent = %parent, "add sub-task cancelled");
                        TableAction::AddSubTaskCancelled(parent.clone())
                    }
                    AddRowTarget::TopLevel => TableAction::Redraw,
                }
            }
            BlurOutcome::Kept => TableAction::None,
        }
    }

    fn added(target: &AddRowTarget, values: Vec<String>) -> TableAction {
        match target {
            AddRowTarget::TopLevel => TableAction::RowAdded(values),
            AddRowTarget::SubTask(parent) => TableAction::SubTaskAdded {
                parent: parent.clone(),
                values,
            },
        }
    }

    fn invoke_nth_action(&mut self, n: usize, tree: &RowTree) -> TableAction {
        let Some((id, data)) = self.focused_row_entry(tree) else {
            return TableAction::None;
        };
        let flavor = row::expansion_flavor(tree, &id, &self.options);
        match row::resolved_actions(data, flavor, &self.options).get(n) {
            Some(action) => self.invoke_action(&id, action.kind, tree),
            None => TableAction::None,
        }
    }

    fn invoke_action(&mut self, id: &RowId, kind: ActionKind, tree: &RowTree) -> TableAction {
        let Some(data) = tree.get(id) else {
            return TableAction::None;
        };
        match kind {
            ActionKind::AddSubTask => {
                if data.expanded.is_none() && self.expanded.insert(id.clone()) {
                    self.rebuild_lines(tree);
                }
                self.pending_focus = Some(AddRowTarget::SubTask(id.clone()));
                debug!(row = %id, "add sub-task requested");
                TableAction::AddSubTaskRequested(id.clone())
            }
            ActionKind::Caller(index) => {
                let Some(action) = data.actions.get(index) else {
                    return TableAction::None;
                };
                if action.activates_edit {
                    self.open_edit_on_action(id, data);
                }
                TableAction::RowActionInvoked {
                    row: id.clone(),
                    index,
                }
            }
        }
    }

    fn open_edit_on_action(&mut self, id: &RowId, data: &TableRow) {
        let Some(cell_index) = row::edit_on_action_cell(data) else {
            return;
        };
        let Some(cell) = data.cells.get(cell_index) else {
            return;
        };
        let Some(column) = cell
            .column_id
            .clone()
            .or_else(|| self.registered.get(cell_index).cloned())
        else {
            return;
        };
        self.focus_row_line(id);
        self.focus_column(&column);
        let target = CellRef {
            row: id.clone(),
            cell: cell_index,
            column,
        };
        self.open_editor(target, cell.editable_value().unwrap_or_default());
    }

    fn move_row(&mut self, tree: &RowTree, delta: isize) -> TableAction {
        if !self.options.reorderable_rows {
            return TableAction::None;
        }
        let Some(id) = self.focused_row().cloned() else {
            return TableAction::None;
        };
        if !tree.has_explicit_id(&id) {
            return TableAction::None;
        }
        let siblings = self.registry.effective_row_order(tree.siblings(&id));
        let Some(over) = siblings
            .iter()
            .position(|s| *s == id)
            .and_then(|pos| pos.checked_add_signed(delta))
            .and_then(|pos| siblings.get(pos))
            .cloned()
        else {
            return TableAction::None;
        };
        self.reorder_rows(tree, &id, &over)
    }

    fn reorder_rows(&mut self, tree: &RowTree, dragged: &RowId, over: &RowId) -> TableAction {
        if tree.parent(dragged) != tree.parent(over) {
            trace!(%dragged, %over, "ignoring row drop across parents");
            return TableAction::None;
        }
        let drag = DragId::Row(dragged.clone());
        match self.registry.handle_reorder(&drag, &DragId::Row(over.clone())) {
            Some(Reordered::Rows(order)) => {
                self.rebuild_lines(tree);
                TableAction::RowOrderChanged(order)
            }
            _ => TableAction::None,
        }
    }

    fn move_column(&mut self, delta: isize) -> TableAction {
        if !self.options.reorderable_columns {
            return TableAction::None;
        }
        let order = self.registry.effective_column_order();
        let Some(id) = order.get(self.cursor_column).cloned() else {
            return TableAction::None;
        };
        let Some(over) = self
            .cursor_column
            .checked_add_signed(delta)
            .and_then(|i| order.get(i))
            .cloned()
        else {
            return TableAction::None;
        };
        self.reorder_columns(&id, &over)
    }

    fn reorder_columns(&mut self, dragged: &ColumnId, over: &ColumnId) -> TableAction {
        let drag = DragId::Column(dragged.clone());
        match self
            .registry
            .handle_reorder(&drag, &DragId::Column(over.clone()))
        {
            Some(Reordered::Columns(order)) => {
                self.focus_column(dragged);
                TableAction::ColumnOrderChanged(order)
            }
            _ => TableAction::None,
        }
    }

    /// Applies a drop reported by an external drag source using prefixed ids
    /// (`column:<id>` / `row:<id>`). Cross-namespace drops are ignored.
    pub fn handle_drop(
        &mut self,
        dragged: &str,
        over: &str,
        tree: &RowTree,
    ) -> Result<TableAction, ParseDragIdError> {
        let dragged: DragId = dragged.parse()?;
        let over: DragId = over.parse()?;
        Ok(match (&dragged, &over) {
            (DragId::Column(a), DragId::Column(b)) => self.reorder_columns(a, b),
            (DragId::Row(a), DragId::Row(b)) => self.reorder_rows(tree, a, b),
            _ => {
                trace!(%dragged, %over, "ignoring cross-namespace drop");
                TableAction::None
            }
        })
    }

    /// One-cell resize of the focused column, run through the same clamping as a drag.
    fn resize_step(&mut self, delta: i32) -> TableAction {
        if !self.options.resizable {
            return TableAction::None;
        }
        let Some(column) = self.focused_column() else {
            return TableAction::None;
        };
        let before = self.registry.width(&column);
        if !self.resizer.begin(&self.registry, &column, 1) {
            return TableAction::None;
        }
        let live = self.registry.container_width();
        let width = self
            .resizer
            .drag_to(&mut self.registry, (1 + delta) as u16, live);
        self.resizer.end();
        match width {
            Some(width) if Some(width) != before => TableAction::ColumnResized { column, width },
            _ => TableAction::None,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, tree: &RowTree) -> TableAction {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.mouse_down(mouse.x, mouse.y, tree),
            MouseEventKind::Drag(MouseButton::Left) => self.mouse_drag(mouse.x, mouse.y),
            MouseEventKind::Up(MouseButton::Left) => self.mouse_up(tree),
            MouseEventKind::Moved => {
                let before = self.hovered_line();
                self.hover = Some((mouse.x, mouse.y));
                if self.hovered_line() != before {
                    TableAction::Redraw
                } else {
                    TableAction::None
                }
            }
            MouseEventKind::ScrollUp => self.scroll_by(-SCROLL_STEP),
            MouseEventKind::ScrollDown => self.scroll_by(SCROLL_STEP),
            _ => TableAction::None,
        }
    }

    fn scroll_by(&mut self, delta: i32) -> TableAction {
        let before = self.state.y;
        self.state.scroll_y_by(delta);
        if self.state.y != before {
            TableAction::Redraw
        } else {
            TableAction::None
        }
    }

    fn mouse_down(&mut self, x: u16, y: u16, tree: &RowTree) -> TableAction {
        let target = self.hits.at(x, y).cloned();

        // Overlays swallow the click that closes them.
        if let Some(dropdown) = self.dropdown.take() {
            return match target {
                Some(HitTarget::DropdownItem(index)) => TableAction::CellSelected {
                    cell: dropdown.target,
                    index,
                },
                _ => TableAction::Redraw,
            };
        }
        if let Some(editor) = &self.editor {
            if matches!(&target, Some(HitTarget::Cell(cell)) if *cell == editor.target) {
                return TableAction::None;
            }
            return self.commit_editor();
        }
        if let Some(current) = self.cursor_add_target() {
            let stays = matches!(
                &target,
                Some(HitTarget::AddRowSlot { target: t, .. }) if *t == current
            );
            if !stays {
                let blurred = self.blur_draft(&current);
                if !matches!(blurred, TableAction::None | TableAction::Redraw) {
                    return blurred;
                }
            }
        }

        let Some(target) = target else {
            return TableAction::None;
        };
        match target {
            HitTarget::SelectAll => self.run_command(Command::SelectAll, tree),
            HitTarget::ColumnTitle(column) => {
                self.focus_column(&column);
                if self.options.reorderable_columns {
                    self.reorder = Some(ReorderDrag {
                        dragged: DragId::Column(column),
                        over: None,
                    });
                }
                TableAction::Redraw
            }
            HitTarget::ResizeHandle(column) => {
                if self.options.resizable && self.resizer.begin(&self.registry, &column, x) {
                    TableAction::Redraw
                } else {
                    TableAction::None
                }
            }
            HitTarget::RowDragHandle(row) => {
                self.focus_row_line(&row);
                self.reorder = Some(ReorderDrag {
                    dragged: DragId::Row(row),
                    over: None,
                });
                TableAction::Redraw
            }
            HitTarget::RowSelect(row) => {
                self.focus_row_line(&row);
                match tree.get(&row) {
                    Some(data) => TableAction::SelectionChanged {
                        selected: !data.selected,
                        row,
                    },
                    None => TableAction::None,
                }
            }
            HitTarget::Chevron(row) => {
                self.focus_row_line(&row);
                self.toggle_expand(&row, tree)
            }
            HitTarget::Favorite(row) => {
                self.focus_row_line(&row);
                match tree.get(&row).and_then(|r| r.favorite) {
                    Some(favorite) => TableAction::FavoriteToggled {
                        row,
                        favorite: !favorite,
                    },
                    None => TableAction::None,
                }
            }
            HitTarget::Status(row) => {
                self.focus_row_line(&row);
                TableAction::StatusActivated(row)
            }
            HitTarget::RowAction { row, action } => {
                self.focus_row_line(&row);
                self.invoke_action(&row, action, tree)
            }
            HitTarget::Cell(cell) => {
                self.focus_row_line(&cell.row);
                self.focus_column(&cell.column);
                let data = tree.get(&cell.row).and_then(|r| r.cells.get(cell.cell));
                match data.map(|c| self.open_cell(cell, c)) {
                    Some(TableAction::None) | None => TableAction::Redraw,
                    Some(action) => action,
                }
            }
            HitTarget::Tag { row, index } => TableAction::TagRemoved { row, index },
            HitTarget::TagEditor(row) => {
                self.focus_row_line(&row);
                TableAction::Redraw
            }
            HitTarget::AddRowSlot { target, slot } => {
                if let Some(i) = self.line_of_add(&target) {
                    self.set_cursor_line(i);
                }
                self.draft_entry(&target).focus(slot);
                TableAction::Redraw
            }
            HitTarget::DropdownItem(_) => TableAction::None,
        }
    }

    fn mouse_drag(&mut self, x: u16, y: u16) -> TableAction {
        if let Some(column) = self.resizer.active_column().cloned() {
            let before = self.registry.width(&column);
            // Applied before returning so the next frame draws the edge under the pointer.
            let live = self.registry.container_width();
            return match self.resizer.drag_to(&mut self.registry, x, live) {
                Some(width) if Some(width) != before => {
                    TableAction::ColumnResized { column, width }
                }
                _ => TableAction::None,
            };
        }

        let Some(dragged) = self.reorder.as_ref().map(|d| d.dragged.clone()) else {
            return TableAction::None;
        };
        let over = match dragged {
            DragId::Column(_) => match self.hits.at(x, y) {
                Some(HitTarget::ColumnTitle(c) | HitTarget::ResizeHandle(c)) => {
                    Some(DragId::Column(c.clone()))
                }
                _ => None,
            },
            DragId::Row(_) => self
                .line_at_screen(x, y)
                .and_then(|i| self.lines[i].kind.row_id())
                .map(|id| DragId::Row(id.clone())),
        };
        match self.reorder.as_mut() {
            Some(drag) if drag.over != over => {
                drag.over = over;
                TableAction::Redraw
            }
            _ => TableAction::None,
        }
    }

    fn mouse_up(&mut self, tree: &RowTree) -> TableAction {
        if self.resizer.is_dragging() {
            self.resizer.end();
            return TableAction::Redraw;
        }
        let Some(drag) = self.reorder.take() else {
            return TableAction::None;
        };
        let action = match (&drag.dragged, &drag.over) {
            (DragId::Column(a), Some(DragId::Column(b))) => self.reorder_columns(a, b),
            (DragId::Row(a), Some(DragId::Row(b))) => self.reorder_rows(tree, a, b),
            _ => TableAction::None,
        };
        if action.is_none() {
            TableAction::Redraw
        } else {
            action
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyModifiers;
    use crate::table::tree::RowAction;
    use crate::table::tree::TagsConfig;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code))
    }

    fn alt(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code).with_modifiers(KeyModifiers::alt()))
    }

    fn ch(c: char) -> InputEvent {
        key(KeyCode::Char(c))
    }

    fn mouse(ev: MouseEvent) -> InputEvent {
        InputEvent::Mouse(ev)
    }

    fn type_str(view: &mut TableView, tree: &RowTree, columns: &[TableColumn], s: &str) {
        for c in s.chars() {
            view.handle_event(ch(c), tree, columns);
        }
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn draw(
        view: &mut TableView,
        tree: &RowTree,
        columns: &[TableColumn],
        width: u16,
        height: u16,
    ) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf, &Theme::default(), tree, columns);
        buf
    }

    fn contact_columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("Name", 80).id("name").default_width(140),
            TableColumn::new("Email", 100).id("email").default_width(180),
            TableColumn::new("Status", 60).id("status").default_width(100),
        ]
    }

    fn three_columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("Name", 10).id("name"),
            TableColumn::new("Email", 10).id("email"),
            TableColumn::new("Status", 10).id("status"),
        ]
    }

    fn has_content_line(view: &TableView, id: &str) -> bool {
        view.lines().iter().any(|l| {
            l.kind
                == LineKind::ExpandContent {
                    id: id.into(),
                    depth: 0,
                }
        })
    }

    #[test]
    fn fits_container_then_clamps_the_dragged_edge() {
        let options = TableOptions {
            selection_column: true,
            selection_column_width: 48,
            resizable: true,
            show_scrollbar: false,
            addable: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        tree.push(TableRow::new(["Jean", "jean@example.com", "Actif"]).id("r1"));
        let columns = contact_columns();

        draw(&mut view, &tree, &columns, 600, 4);
        let widths: Vec<u16> = view
            .registry()
            .column_widths()
            .into_iter()
            .map(|(_, w)| w)
            .collect();
        assert_eq!(widths, vec![392, 100, 60]);

        let edge = 48 + 392 - 1;
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_down(edge, 0)), &tree, &columns),
            TableAction::Redraw
        );
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_drag(edge - 50, 0)), &tree, &columns),
            TableAction::ColumnResized {
                column: "name".into(),
                width: 342
            }
        );
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_drag(edge + 50, 0)), &tree, &columns),
            TableAction::ColumnResized {
                column: "name".into(),
                width: 392
            }
        );
        view.handle_event(mouse(MouseEvent::left_up(edge + 50, 0)), &tree, &columns);
        assert!(view.registry().is_manually_resized());
        assert_eq!(view.registry().total_width() + 48, 600);

        // A wider container no longer refits once the user has resized.
        draw(&mut view, &tree, &columns, 700, 4);
        assert_eq!(view.registry().width(&"name".into()), Some(392));
    }

    #[test]
    fn renders_header_grid_and_first_cell() {
        let mut view = TableView::new();
        let mut tree = RowTree::new();
        tree.push(TableRow::new(["Pen", "3"]));
        let columns = vec![
            TableColumn::new("Name", 10).id("name"),
            TableColumn::new("Qty", 6).id("qty"),
        ];
        let buf = draw(&mut view, &tree, &columns, 30, 3);
        assert_eq!(row_text(&buf, 0), format!("Name{}│Qty  │ ", " ".repeat(18)));
        assert_eq!(row_text(&buf, 1), format!("Pen{}│3    │ ", " ".repeat(19)));
        assert_eq!(row_text(&buf, 2), " ".repeat(30));
    }

    #[test]
    fn expansion_follows_flavor_and_control() {
        let options = TableOptions {
            status_column: true,
            expandable: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        tree.push(
            TableRow::new(["A"])
                .id("a")
                .expand_content("details")
                .sub_tasks(true, false),
        );
        tree.push(TableRow::new(["B"]).id("b").expand_content("notes"));
        tree.push(
            TableRow::new(["C"])
                .id("c")
                .expand_content("fixed")
                .expanded(false),
        );
        let columns = vec![TableColumn::new("Title", 10)];

        assert_eq!(
            view.handle_event(ch('o'), &tree, &columns),
            TableAction::ExpandToggled {
                row: "a".into(),
                expanded: true
            }
        );
        assert!(!has_content_line(&view, "a"));

        view.handle_event(key(KeyCode::Down), &tree, &columns);
        assert_eq!(
            view.handle_event(ch('o'), &tree, &columns),
            TableAction::ExpandToggled {
                row: "b".into(),
                expanded: true
            }
        );
        assert!(has_content_line(&view, "b"));

        // The content line is skipped by the cursor.
        view.handle_event(key(KeyCode::Down), &tree, &columns);
        assert_eq!(view.focused_row(), Some(&"c".into()));
        assert_eq!(
            view.handle_event(ch('o'), &tree, &columns),
            TableAction::ExpandToggled {
                row: "c".into(),
                expanded: true
            }
        );
        assert!(!has_content_line(&view, "c"));
    }

    #[test]
    fn add_row_commits_values_in_column_order() {
        let options = TableOptions {
            addable: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        tree.push(TableRow::new(["Martin", "m@example.com", "Inactif"]).id("r1"));
        let columns = contact_columns();

        assert_eq!(
            view.handle_event(key(KeyCode::End), &tree, &columns),
            TableAction::Redraw
        );
        assert_eq!(view.focused_line(), Some(&LineKind::AddRow));
        type_str(&mut view, &tree, &columns, "Dupont");
        view.handle_event(key(KeyCode::Tab), &tree, &columns);
        view.handle_event(key(KeyCode::Tab), &tree, &columns);
        type_str(&mut view, &tree, &columns, "Actif");
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::RowAdded(vec![
                "Dupont".to_string(),
                String::new(),
                "Actif".to_string()
            ])
        );
        assert_eq!(
            view.draft_values(&AddRowTarget::TopLevel),
            Some(vec![String::new(); 3])
        );

        // A blank first value blocks the commit and keeps what was typed elsewhere.
        view.handle_event(key(KeyCode::Tab), &tree, &columns);
        type_str(&mut view, &tree, &columns, "x");
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::None
        );
        assert_eq!(
            view.draft_values(&AddRowTarget::TopLevel),
            Some(vec![String::new(), "x".to_string(), String::new()])
        );

        // Leaving with a blank first value cancels silently.
        assert_eq!(
            view.handle_event(key(KeyCode::Up), &tree, &columns),
            TableAction::Redraw
        );
        assert_eq!(view.draft_values(&AddRowTarget::TopLevel), None);
    }

    #[test]
    fn sub_task_levels_step_right_by_the_indent_width() {
        let options = TableOptions {
            status_column: true,
            show_scrollbar: false,
            indent_width: 3,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        let top = tree.push(
            TableRow::new(["Top"])
                .id("top")
                .expanded(true)
                .adding_sub_task(true),
        );
        let mid = tree
            .push_child(
                &top,
                TableRow::new(["Mid"])
                    .id("mid")
                    .expanded(true)
                    .adding_sub_task(true),
            )
            .unwrap();
        tree.push_child(&mid, TableRow::new(["Leaf"]).id("leaf"));
        let columns = vec![TableColumn::new("Task", 30)];
        let buf = draw(&mut view, &tree, &columns, 40, 6);

        let x_of = |y: u16, symbol: &str| {
            (0..buf.area.width).find(|x| buf[(*x, y)].symbol() == symbol)
        };
        // Lines: top, mid, leaf, add under mid (depth 2), add under top (depth 1).
        let top_x = x_of(1, "T").unwrap();
        let mid_x = x_of(2, "M").unwrap();
        let leaf_x = x_of(3, "L").unwrap();
        assert_eq!(mid_x, top_x + 3);
        assert_eq!(leaf_x, mid_x + 3);

        let add_depth2 = x_of(4, "A").unwrap();
        let add_depth1 = x_of(5, "A").unwrap();
        assert_eq!(add_depth2, add_depth1 + 3);
        assert!(row_text(&buf, 5).contains("Add sub-task"));
    }

    #[test]
    fn add_sub_task_request_commit_and_cancel() {
        let options = TableOptions {
            status_column: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let columns = vec![TableColumn::new("Title", 10)];
        let mut tree = RowTree::new();
        tree.push(TableRow::new(["Parent"]).id("p").sub_tasks(true, true));

        assert_eq!(
            view.handle_event(ch('1'), &tree, &columns),
            TableAction::AddSubTaskRequested("p".into())
        );

        // The caller now shows the add-sub-task line; it takes the focus.
        let mut adding = RowTree::new();
        adding.push(
            TableRow::new(["Parent"])
                .id("p")
                .sub_tasks(true, true)
                .adding_sub_task(true),
        );
        type_str(&mut view, &adding, &columns, "Child");
        assert_eq!(
            view.focused_line(),
            Some(&LineKind::AddSubRow {
                parent: "p".into(),
                depth: 1
            })
        );
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &adding, &columns),
            TableAction::SubTaskAdded {
                parent: "p".into(),
                values: vec!["Child".to_string()]
            }
        );
        assert_eq!(
            view.handle_event(key(KeyCode::Up), &adding, &columns),
            TableAction::AddSubTaskCancelled("p".into())
        );
        assert_eq!(view.focused_row(), Some(&"p".into()));
    }

    #[test]
    fn column_drag_reports_new_order() {
        let options = TableOptions {
            reorderable_columns: true,
            show_scrollbar: false,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let tree = RowTree::new();
        let columns = three_columns();
        draw(&mut view, &tree, &columns, 30, 3);

        view.handle_event(mouse(MouseEvent::left_down(22, 0)), &tree, &columns);
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_drag(2, 0)), &tree, &columns),
            TableAction::Redraw
        );
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_up(2, 0)), &tree, &columns),
            TableAction::ColumnOrderChanged(vec![
                "status".into(),
                "name".into(),
                "email".into()
            ])
        );
        assert_eq!(view.focused_column(), Some("status".into()));
    }

    #[test]
    fn prefixed_drops_route_to_their_order() {
        let options = TableOptions {
            reorderable_columns: true,
            reorderable_rows: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        for id in ["a", "b"] {
            tree.push(TableRow::new([id]).id(id));
        }
        let columns = three_columns();
        draw(&mut view, &tree, &columns, 40, 5);

        assert_eq!(
            view.handle_drop("column:status", "column:name", &tree),
            Ok(TableAction::ColumnOrderChanged(vec![
                ColumnId::new("status"),
                ColumnId::new("name"),
                ColumnId::new("email"),
            ]))
        );
        assert_eq!(
            view.handle_drop("row:b", "row:a", &tree),
            Ok(TableAction::RowOrderChanged(vec!["b".into(), "a".into()]))
        );
        assert_eq!(
            view.handle_drop("row:a", "column:name", &tree),
            Ok(TableAction::None)
        );
        assert_eq!(
            view.handle_drop("cell:1", "row:a", &tree),
            Err(ParseDragIdError::UnknownNamespace("cell:1".to_string()))
        );
    }

    #[test]
    fn controlled_column_order_is_reported_not_applied() {
        let options = TableOptions {
            reorderable_columns: true,
            column_order: Some(vec!["name".into(), "email".into(), "status".into()]),
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let tree = RowTree::new();
        let columns = three_columns();

        assert_eq!(
            view.handle_event(alt(KeyCode::Right), &tree, &columns),
            TableAction::ColumnOrderChanged(vec![
                "email".into(),
                "name".into(),
                "status".into()
            ])
        );
        assert_eq!(
            view.registry().effective_column_order(),
            vec![
                ColumnId::new("name"),
                ColumnId::new("email"),
                ColumnId::new("status")
            ]
        );
    }

    #[test]
    fn row_moves_keep_the_cursor_on_the_moved_row() {
        let options = TableOptions {
            reorderable_rows: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        for id in ["a", "b", "c"] {
            tree.push(TableRow::new([id]).id(id));
        }
        let columns = vec![TableColumn::new("Title", 10)];

        assert_eq!(
            view.handle_event(alt(KeyCode::Down), &tree, &columns),
            TableAction::RowOrderChanged(vec!["b".into(), "a".into(), "c".into()])
        );
        assert_eq!(view.focused_row(), Some(&"a".into()));
        assert_eq!(
            view.lines()[1].kind,
            LineKind::Row {
                id: "a".into(),
                depth: 0
            }
        );
        // Already last among its siblings once moved twice.
        view.handle_event(alt(KeyCode::Down), &tree, &columns);
        assert_eq!(
            view.handle_event(alt(KeyCode::Down), &tree, &columns),
            TableAction::None
        );
    }

    #[test]
    fn deleted_rows_drop_out_of_the_reported_order() {
        let options = TableOptions {
            reorderable_rows: true,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let columns = vec![TableColumn::new("Title", 10)];
        let mut tree = RowTree::new();
        for id in ["a", "b", "c"] {
            tree.push(TableRow::new([id]).id(id));
        }
        draw(&mut view, &tree, &columns, 20, 5);

        let mut tree = RowTree::new();
        for id in ["a", "c"] {
            tree.push(TableRow::new([id]).id(id));
        }
        assert_eq!(
            view.handle_event(alt(KeyCode::Down), &tree, &columns),
            TableAction::RowOrderChanged(vec!["c".into(), "a".into()])
        );
        assert_eq!(view.registry().row_order(), ["c", "a"].map(RowId::new).as_slice());
    }

    #[test]
    fn row_drag_across_parents_is_ignored() {
        let options = TableOptions {
            reorderable_rows: true,
            selection_column: true,
            status_column: true,
            show_scrollbar: false,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        let p = tree.push(TableRow::new(["P"]).id("p").expanded(true));
        tree.push_child(&p, TableRow::new(["P1"]).id("p1"));
        tree.push(TableRow::new(["Q"]).id("q"));
        let columns = vec![TableColumn::new("Title", 10)];
        draw(&mut view, &tree, &columns, 30, 5);

        // Lines: p at y=1, p1 at y=2, q at y=3; the drag handle is at x=0.
        view.handle_event(mouse(MouseEvent::left_down(0, 3)), &tree, &columns);
        view.handle_event(mouse(MouseEvent::left_drag(10, 2)), &tree, &columns);
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_up(10, 2)), &tree, &columns),
            TableAction::Redraw
        );

        view.handle_event(mouse(MouseEvent::left_down(0, 3)), &tree, &columns);
        view.handle_event(mouse(MouseEvent::left_drag(10, 1)), &tree, &columns);
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_up(10, 1)), &tree, &columns),
            TableAction::RowOrderChanged(vec!["q".into(), "p".into(), "p1".into()])
        );
    }

    #[test]
    fn selection_is_reported_not_stored() {
        let options = TableOptions {
            selection_column: true,
            show_scrollbar: false,
            ..TableOptions::default()
        };
        let mut view = TableView::with_options(options);
        let mut tree = RowTree::new();
        tree.push(TableRow::new(["A"]).id("a"));
        tree.push(TableRow::new(["B"]).id("b").selected(true));
        let columns = vec![TableColumn::new("Title", 10)];
        draw(&mut view, &tree, &columns, 30, 4);

        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_down(2, 0)), &tree, &columns),
            TableAction::SelectAllChanged(true)
        );
        assert_eq!(
            view.handle_event(mouse(MouseEvent::left_down(2, 2)), &tree, &columns),
            TableAction::SelectionChanged {
                row: "b".into(),
                selected: false
            }
        );
        assert_eq!(view.focused_row(), Some(&"b".into()));
        assert_eq!(
            view.handle_event(ch(' '), &tree, &columns),
            TableAction::SelectionChanged {
                row: "b".into(),
                selected: false
            }
        );
    }

    #[test]
    fn editable_cell_reports_changes_then_commit() {
        let mut view = TableView::new();
        let mut tree = RowTree::new();
        tree.push(TableRow::new([TableCell::editable("Jean")]).id("r1"));
        let columns = vec![TableColumn::new("Name", 10).id("name")];
        let cell = CellRef {
            row: "r1".into(),
            cell: 0,
            column: "name".into(),
        };

        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::Redraw
        );
        assert!(view.is_editing());
        assert_eq!(
            view.handle_event(ch('!'), &tree, &columns),
            TableAction::CellChanged {
                cell: cell.clone(),
                value: "Jean!".to_string()
            }
        );
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::CellCommitted {
                cell,
                value: "Jean!".to_string()
            }
        );
        assert!(!view.is_editing());
    }

    #[test]
    fn row_action_opens_the_deferred_editor() {
        let mut view = TableView::new();
        let mut tree = RowTree::new();
        tree.push(
            TableRow::new([
                TableCell::text("Task"),
                TableCell::editable("Note").edit_on_action(),
            ])
            .id("r1")
            .action(RowAction::new("✎", "Edit note").activates_edit()),
        );
        let columns = vec![
            TableColumn::new("Title", 10).id("title"),
            TableColumn::new("Note", 10).id("note"),
        ];

        // Enter on the deferred cell itself does nothing.
        view.handle_event(key(KeyCode::Right), &tree, &columns);
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::None
        );
        view.handle_event(key(KeyCode::Left), &tree, &columns);

        assert_eq!(
            view.handle_event(ch('1'), &tree, &columns),
            TableAction::RowActionInvoked {
                row: "r1".into(),
                index: 0
            }
        );
        assert!(view.is_editing());
        assert_eq!(view.focused_column(), Some("note".into()));
        assert_eq!(
            view.handle_event(key(KeyCode::Esc), &tree, &columns),
            TableAction::Redraw
        );
        assert!(!view.is_editing());
    }

    #[test]
    fn dropdown_selects_with_keys() {
        let mut view = TableView::new();
        let mut tree = RowTree::new();
        tree.push(TableRow::new([TableCell::select(["Actif", "Inactif"], Some(0))]).id("r1"));
        let columns = vec![TableColumn::new("Status", 10).id("status")];

        view.handle_event(key(KeyCode::Enter), &tree, &columns);
        view.handle_event(key(KeyCode::Down), &tree, &columns);
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::CellSelected {
                cell: CellRef {
                    row: "r1".into(),
                    cell: 0,
                    column: "status".into()
                },
                index: 1
            }
        );
        assert!(!view.is_editing());
    }

    #[test]
    fn tags_editor_adds_removes_and_closes() {
        let mut view = TableView::new();
        let mut tree = RowTree::new();
        tree.push(
            TableRow::new(["Task"])
                .id("r1")
                .tags(TagsConfig::new(["ux"]), true),
        );
        let columns = vec![TableColumn::new("Title", 20)];

        type_str(&mut view, &tree, &columns, "api");
        assert_eq!(
            view.handle_event(key(KeyCode::Enter), &tree, &columns),
            TableAction::TagAdded {
                row: "r1".into(),
                tag: "api".to_string()
            }
        );
        assert_eq!(
            view.handle_event(key(KeyCode::Backspace), &tree, &columns),
            TableAction::TagRemoved {
                row: "r1".into(),
                index: 0
            }
        );
        assert_eq!(
            view.handle_event(key(KeyCode::Esc), &tree, &columns),
            TableAction::TagsEditorClosed("r1".into())
        );
    }
}
