use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyModifiers;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui_datatable::crossterm_input;
use ratatui_datatable::table::CellContent;
use ratatui_datatable::table::CellRef;
use ratatui_datatable::table::RowAction;
use ratatui_datatable::table::RowId;
use ratatui_datatable::table::RowTree;
use ratatui_datatable::table::SortIndicator;
use ratatui_datatable::table::TableAction;
use ratatui_datatable::table::TableCell;
use ratatui_datatable::table::TableColumn;
use ratatui_datatable::table::TableOptions;
use ratatui_datatable::table::TableRow;
use ratatui_datatable::table::TableVariant;
use ratatui_datatable::table::TableView;
use ratatui_datatable::table::TagsConfig;
use ratatui_datatable::theme::Theme;
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STATUSES: [&str; 3] = ["○", "◐", "●"];

struct App {
    rows: RowTree,
    columns: Vec<TableColumn>,
    next_id: usize,
    message: String,
}

fn main() -> io::Result<()> {
    // The table logs through `tracing`; run with `RUST_LOG=debug ... 2>table.log` to see it.
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .with_ansi(false)
            .init();
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let theme = Theme::default();
    let mut view = TableView::with_options(TableOptions {
        variant: TableVariant::Striped,
        resizable: true,
        fill_column: true,
        expandable: true,
        addable: true,
        selection_column: true,
        status_column: true,
        reorderable_columns: true,
        reorderable_rows: true,
        ..TableOptions::default()
    });
    let mut app = App::new();

    let res = run(&mut terminal, &theme, &mut view, &mut app);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res
}

fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    theme: &Theme,
    view: &mut TableView,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| {
            let area = f.area();
            let block = Block::default()
                .title("Tasks (↑↓/jk, ←→/hl, 1-9 actions, drag headers and ⠿, ctrl+q quits)")
                .borders(Borders::ALL);
            let inner = block.inner(area);
            f.render_widget(block, area);

            let table_area = Rect::new(
                inner.x,
                inner.y,
                inner.width,
                inner.height.saturating_sub(1),
            );
            let status_area = Rect::new(inner.x, inner.y + table_area.height, inner.width, 1);

            let buf = f.buffer_mut();
            view.render(table_area, buf, theme, &app.rows, &app.columns);
            render_status(status_area, buf, theme, view, app);

            if let Some((x, y)) = view.cursor_position() {
                f.set_cursor_position((x, y));
            }
        })?;

        if !crossterm::event::poll(Duration::from_millis(50))? {
            continue;
        }
        let event = crossterm::event::read()?;
        if let Event::Key(key) = &event
            && key.code == KeyCode::Char('q')
            && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            return Ok(());
        }
        let Some(ev) = crossterm_input::input_event_from_crossterm(event) else {
            continue;
        };
        let action = view.handle_event(ev, &app.rows, &app.columns);
        app.apply(view, action);
    }
}

fn render_status(
    area: Rect,
    buf: &mut ratatui::buffer::Buffer,
    theme: &Theme,
    view: &TableView,
    app: &App,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let mut text = if app.message.is_empty() {
        view.options()
            .bindings
            .help_items()
            .iter()
            .map(|b| b.help())
            .collect::<Vec<_>>()
            .join(" • ")
    } else {
        app.message.clone()
    };
    if let Some(id) = view.focused_row()
        && let Some(path) = app.rows.path(id)
    {
        let level = app.rows.depth(id) + 1;
        text = format!("row {path} (level {level})  {text}");
    }
    if let Some(pct) = view.state.percent_y() {
        text = format!("{pct:>3}%  {text}");
    }
    let span = Span::styled(text, theme.text_muted);
    buf.set_span(area.x, area.y, &span, area.width);
}

impl App {
    fn new() -> Self {
        let columns = vec![
            TableColumn::new("Task", 24).id("task"),
            TableColumn::new("Owner", 14).id("owner").default_width(18),
            TableColumn::new("State", 12)
                .id("state")
                .sort(SortIndicator::Ascending),
        ];

        let mut rows = RowTree::new();
        let launch = rows.push(
            task_row("launch", "Prepare launch", "Jean Dupont", 1)
                .favorite(true)
                .sub_tasks(true, true)
                .action(RowAction::new("✎", "Rename owner").activates_edit()),
        );
        rows.push_child(&launch, task_row("copy", "Write release notes", "Marie", 2));
        rows.push_child(&launch, task_row("qa", "Smoke test build", "Paul", 0));
        rows.push(
            task_row("docs", "Update the user guide", "Marie", 0)
                .favorite(false)
                .expand_content("Chapters 3 and 4 still describe the old import dialog.\nScreenshots need a refresh."),
        );
        rows.push(
            task_row("triage", "Triage incoming bugs", "Paul", 1)
                .tags(TagsConfig::new(["support", "weekly"]), true),
        );
        for i in 0..20 {
            rows.push(task_row(
                &format!("backlog-{i}"),
                &format!("Backlog item #{i}"),
                "",
                0,
            ));
        }

        Self {
            rows,
            columns,
            next_id: 0,
            message: String::new(),
        }
    }

    fn apply(&mut self, view: &mut TableView, action: TableAction) {
        match &action {
            TableAction::None | TableAction::Redraw => return,
            TableAction::SelectAllChanged(checked) => {
                for id in self.rows.iter_ids() {
                    if let Some(row) = self.rows.get_mut(&id) {
                        row.selected = *checked;
                    }
                }
                view.set_select_all_checked(*checked);
            }
            TableAction::SelectionChanged { row, selected } => {
                if let Some(r) = self.rows.get_mut(row) {
                    r.selected = *selected;
                }
                let all = self
                    .rows
                    .iter_ids()
                    .iter()
                    .all(|id| self.rows.get(id).is_some_and(|r| r.selected));
                view.set_select_all_checked(all);
            }
            TableAction::StatusActivated(row) => {
                if let Some(r) = self.rows.get_mut(row) {
                    let current = r.status.as_ref().map(|s| s.to_string()).unwrap_or_default();
                    let next = STATUSES
                        .iter()
                        .position(|s| *s == current)
                        .map_or(0, |i| (i + 1) % STATUSES.len());
                    r.status = Some(STATUSES[next].into());
                }
            }
            TableAction::FavoriteToggled { row, favorite } => {
                if let Some(r) = self.rows.get_mut(row) {
                    r.favorite = Some(*favorite);
                }
            }
            TableAction::AddSubTaskRequested(row) => {
                if let Some(r) = self.rows.get_mut(row) {
                    r.adding_sub_task = true;
                }
            }
            TableAction::AddSubTaskCancelled(row) => {
                if let Some(r) = self.rows.get_mut(row) {
                    r.adding_sub_task = false;
                }
            }
            TableAction::RowAdded(values) => {
                let id = self.fresh_id();
                self.rows.push(row_from_values(id, values));
            }
            TableAction::SubTaskAdded { parent, values } => {
                let id = self.fresh_id();
                if let Some(r) = self.rows.get_mut(parent) {
                    r.has_sub_tasks = true;
                }
                self.rows.push_child(parent, row_from_values(id, values));
            }
            TableAction::CellChanged { cell, value } | TableAction::CellCommitted { cell, value } => {
                if let Some(CellContent::Editable { value: v, .. }) = self.content_mut(cell) {
                    v.clone_from(value);
                }
            }
            TableAction::CellSelected { cell, index } => {
                if let Some(CellContent::Select { selected, .. }) = self.content_mut(cell) {
                    *selected = Some(*index);
                }
            }
            TableAction::TagAdded { row, tag } => {
                if let Some(tags) = self.rows.get_mut(row).and_then(|r| r.tags.as_mut()) {
                    tags.tags.push(tag.clone());
                }
            }
            TableAction::TagRemoved { row, index } => {
                if let Some(tags) = self.rows.get_mut(row).and_then(|r| r.tags.as_mut())
                    && *index < tags.tags.len()
                {
                    tags.tags.remove(*index);
                }
            }
            TableAction::TagsEditorClosed(row) => {
                if let Some(r) = self.rows.get_mut(row) {
                    r.show_tags_editor = false;
                }
            }
            TableAction::ExpandToggled { .. }
            | TableAction::RowActionInvoked { .. }
            | TableAction::ColumnResized { .. }
            | TableAction::ColumnOrderChanged(_)
            | TableAction::RowOrderChanged(_) => {}
        }
        self.message = describe(&action);
    }

    fn content_mut(&mut self, cell: &CellRef) -> Option<&mut CellContent> {
        self.rows
            .get_mut(&cell.row)
            .and_then(|r| r.cells.get_mut(cell.cell))
            .map(|c| &mut c.content)
    }

    fn fresh_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId::new(format!("new-{}", self.next_id))
    }
}

fn task_row(id: &str, title: &str, owner: &str, status: usize) -> TableRow {
    TableRow::new([
        TableCell::editable(title),
        TableCell::editable(owner).placeholder("unassigned").edit_on_action(),
        TableCell::select(["Todo", "Doing", "Done"], Some(status)),
    ])
    .id(id)
    .status(STATUSES[status.min(STATUSES.len() - 1)])
}

fn row_from_values(id: RowId, values: &[String]) -> TableRow {
    let get = |i: usize| values.get(i).map(String::as_str).unwrap_or("");
    let state = ["Todo", "Doing", "Done"]
        .iter()
        .position(|s| s.eq_ignore_ascii_case(get(2).trim()))
        .unwrap_or(0);
    TableRow::new([
        TableCell::editable(get(0)),
        TableCell::editable(get(1)).placeholder("unassigned"),
        TableCell::select(["Todo", "Doing", "Done"], Some(state)),
    ])
    .id(id)
    .status(STATUSES[0])
    .favorite(false)
}

fn describe(action: &TableAction) -> String {
    match action {
        TableAction::RowActionInvoked { row, index } => format!("action #{index} on {row}"),
        TableAction::ColumnResized { column, width } => format!("{column} is now {width} wide"),
        TableAction::ColumnOrderChanged(order) => format!(
            "columns: {}",
            order.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
        ),
        TableAction::RowOrderChanged(order) => format!("{} rows reordered", order.len()),
        TableAction::RowAdded(values) => format!("added {values:?}"),
        TableAction::SubTaskAdded { parent, values } => format!("added {values:?} under {parent}"),
        other => format!("{other:?}"),
    }
}
