//! Caller-owned rows and the arena that nests them.
//!
//! Rows are identified by [`RowId`]. Each node keeps its parent and its ordered children, so
//! sub-task trees of any depth need no recursion through nested vectors. Display paths such as
//! `"0/2/1"` are derived on demand and never used as identity.

use crate::table::cell::TableCell;
use crate::table::ids::RowId;
use ratatui::text::Line;
use ratatui::text::Text;
use std::collections::HashMap;
use tracing::warn;

/// A button in the hover-revealed action cluster of a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAction {
    pub icon: String,
    pub label: String,
    /// Firing this action opens the editor of the row's `edit_on_action` cell.
    pub activates_edit: bool,
}

impl RowAction {
    pub fn new(icon: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            label: label.into(),
            activates_edit: false,
        }
    }

    pub fn activates_edit(mut self) -> Self {
        self.activates_edit = true;
        self
    }
}

/// Tags drawn after the first cell's content, with an optional inline editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagsConfig {
    pub tags: Vec<String>,
    pub placeholder: String,
}

impl TagsConfig {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            placeholder: "tag…".to_string(),
        }
    }
}

/// One row as described by the caller for the current frame.
///
/// The table never stores these flags; it reads them and reports requested changes back as
/// [`crate::table::TableAction`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    /// Required for the row to take part in drag reordering.
    pub id: Option<RowId>,
    pub cells: Vec<TableCell>,
    pub selected: bool,
    pub status: Option<Line<'static>>,
    pub favorite: Option<bool>,
    /// Controlled expansion. `None` lets the table toggle the row locally.
    pub expanded: Option<bool>,
    pub expand_content: Option<Text<'static>>,
    pub has_sub_tasks: bool,
    pub can_add_sub_task: bool,
    /// The caller is showing an add-sub-task line under this row.
    pub adding_sub_task: bool,
    pub actions: Vec<RowAction>,
    pub tags: Option<TagsConfig>,
    pub show_tags_editor: bool,
}

impl TableRow {
    pub fn new<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<TableCell>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<RowId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn status(mut self, status: impl Into<Line<'static>>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = Some(expanded);
        self
    }

    pub fn expand_content(mut self, content: impl Into<Text<'static>>) -> Self {
        self.expand_content = Some(content.into());
        self
    }

    pub fn sub_tasks(mut self, has_sub_tasks: bool, can_add: bool) -> Self {
        self.has_sub_tasks = has_sub_tasks;
        self.can_add_sub_task = can_add;
        self
    }

    pub fn adding_sub_task(mut self, adding: bool) -> Self {
        self.adding_sub_task = adding;
        self
    }

    pub fn action(mut self, action: RowAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn tags(mut self, tags: TagsConfig, show_editor: bool) -> Self {
        self.tags = Some(tags);
        self.show_tags_editor = show_editor;
        self
    }
}

#[derive(Clone, Debug)]
struct RowNode {
    row: TableRow,
    explicit_id: bool,
    parent: Option<RowId>,
    children: Vec<RowId>,
}

/// Arena of rows keyed by id, with parent links and ordered children.
#[derive(Clone, Debug, Default)]
pub struct RowTree {
    nodes: HashMap<RowId, RowNode>,
    roots: Vec<RowId>,
    next_auto: usize,
}

impl RowTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a top-level row and returns its id (the explicit one, or a generated one).
    pub fn push(&mut self, row: TableRow) -> RowId {
        self.insert(None, row)
    }

    /// Adds `row` as the last child of `parent`. Returns `None` if `parent` is unknown.
    pub fn push_child(&mut self, parent: &RowId, row: TableRow) -> Option<RowId> {
        if !self.nodes.contains_key(parent) {
            warn!(parent = %parent, "dropping sub-task row for unknown parent");
            return None;
        }
        Some(self.insert(Some(parent.clone()), row))
    }

    pub fn get(&self, id: &RowId) -> Option<&TableRow> {
        self.nodes.get(id).map(|n| &n.row)
    }

    /// Mutable access for applying reported actions. The id and position are fixed.
    pub fn get_mut(&mut self, id: &RowId) -> Option<&mut TableRow> {
        self.nodes.get_mut(id).map(|n| &mut n.row)
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn roots(&self) -> &[RowId] {
        &self.roots
    }

    pub fn children(&self, id: &RowId) -> &[RowId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: &RowId) -> Option<&RowId> {
        self.nodes.get(id).and_then(|n| n.parent.as_ref())
    }

    /// Rows sharing `id`'s parent (top-level rows for roots), including `id`.
    pub fn siblings(&self, id: &RowId) -> &[RowId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        }
    }

    pub fn has_explicit_id(&self, id: &RowId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.explicit_id)
    }

    pub fn depth(&self, id: &RowId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// Structural position from the root, e.g. `"0/2/1"`. For display only.
    pub fn path(&self, id: &RowId) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        let mut parts = Vec::new();
        let mut cur = id.clone();
        loop {
            let siblings = self.siblings(&cur);
            let index = siblings.iter().position(|s| *s == cur)?;
            parts.push(index.to_string());
            match self.parent(&cur) {
                Some(p) => cur = p.clone(),
                None => break,
            }
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    /// All ids in structural depth-first order.
    pub fn iter_ids(&self) -> Vec<RowId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&RowId> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id.clone());
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    fn insert(&mut self, parent: Option<RowId>, row: TableRow) -> RowId {
        let explicit_id = row.id.is_some();
        let id = match &row.id {
            Some(id) => id.clone(),
            None => loop {
                let id = RowId::new(format!("#auto-{}", self.next_auto));
                self.next_auto += 1;
                if !self.nodes.contains_key(&id) {
                    break id;
                }
            },
        };

        if let Some(node) = self.nodes.get_mut(&id) {
            warn!(row = %id, "duplicate row id; replacing row content in place");
            node.row = row;
            return id;
        }

        match &parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    node.children.push(id.clone());
                }
            }
            None => self.roots.push(id.clone()),
        }
        self.nodes.insert(
            id.clone(),
            RowNode {
                row,
                explicit_id,
                parent,
                children: Vec::new(),
            },
        );
        id
    }
}
