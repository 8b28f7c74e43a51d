//! Column geometry and display order for one table instance.
//!
//! [`LayoutRegistry`] is the single source of truth the header and body read from: which
//! columns exist, how wide they are, and in which order columns and rows are displayed. It is
//! owned by exactly one [`crate::table::TableView`]; nested tables need their own.

use crate::table::ids::ColumnId;
use crate::table::ids::DragId;
use crate::table::ids::RowId;
use crate::table::options::TableOptions;
use crate::table::reorder::array_move;
use tracing::debug;
use tracing::trace;

/// Registered geometry of one column, in terminal cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnGeometry {
    pub id: ColumnId,
    pub min_width: u16,
    pub default_width: Option<u16>,
    pub max_width: Option<u16>,
    pub width: u16,
}

impl ColumnGeometry {
    /// Clamps `width` into `[min_width, max_width]`. The minimum wins if the bounds cross.
    pub fn clamp(&self, width: u16) -> u16 {
        let width = match self.max_width {
            Some(max) => width.min(max),
            None => width,
        };
        width.max(self.min_width)
    }

    fn seed_width(&self) -> u16 {
        self.clamp(self.default_width.unwrap_or(self.min_width))
    }
}

/// Table-level feature flags the registry needs to make layout decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutFeatures {
    pub reorderable_columns: bool,
    pub reorderable_rows: bool,
    pub selection_width: u16,
}

impl From<&TableOptions> for LayoutFeatures {
    fn from(options: &TableOptions) -> Self {
        Self {
            reorderable_columns: options.reorderable_columns,
            reorderable_rows: options.reorderable_rows,
            selection_width: options.selection_width(),
        }
    }
}

/// Result of a successful [`LayoutRegistry::handle_reorder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reordered {
    Columns(Vec<ColumnId>),
    Rows(Vec<RowId>),
}

#[derive(Clone, Debug, Default)]
pub struct LayoutRegistry {
    features: LayoutFeatures,
    /// Every column ever registered, in first-registration order.
    columns: Vec<ColumnGeometry>,
    /// Columns registered during the latest pass, in registration order.
    live: Vec<ColumnId>,
    pass: Vec<ColumnId>,
    column_order: Vec<ColumnId>,
    controlled_column_order: Option<Vec<ColumnId>>,
    row_order: Vec<RowId>,
    controlled_row_order: Option<Vec<RowId>>,
    container_width: Option<u16>,
    manually_resized: bool,
}

impl LayoutRegistry {
    pub fn new(features: LayoutFeatures) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }

    pub fn features(&self) -> LayoutFeatures {
        self.features
    }

    pub fn set_features(&mut self, features: LayoutFeatures) {
        self.features = features;
    }

    /// Installs (or clears) the caller-controlled orders.
    pub fn set_controlled_orders(
        &mut self,
        columns: Option<Vec<ColumnId>>,
        rows: Option<Vec<RowId>>,
    ) {
        self.controlled_column_order = columns;
        self.controlled_row_order = rows;
    }

    /// Starts a registration pass. Auto ids are handed out by position within the pass.
    pub fn begin_pass(&mut self) {
        self.pass.clear();
    }

    /// Ends a registration pass; the columns registered since [`Self::begin_pass`] become the
    /// live set. Geometry of columns that dropped out is kept in case they come back.
    pub fn end_pass(&mut self) {
        if self.pass != self.live {
            trace!(columns = self.pass.len(), "live column set changed");
            self.live = std::mem::take(&mut self.pass);
        } else {
            self.pass.clear();
        }
    }

    /// Registers a column and returns its stable id.
    ///
    /// The first registration seeds the width from `default_width` (or `min_width`), clamped
    /// to `max_width`. Later registrations keep the current width and only refresh the bounds.
    pub fn register_column(
        &mut self,
        min_width: u16,
        default_width: Option<u16>,
        max_width: Option<u16>,
        explicit_id: Option<ColumnId>,
    ) -> ColumnId {
        let id = explicit_id.unwrap_or_else(|| ColumnId::auto(self.pass.len()));
        if !self.pass.contains(&id) {
            self.pass.push(id.clone());
        }

        match self.columns.iter_mut().find(|c| c.id == id) {
            Some(col) => {
                if col.min_width != min_width
                    || col.default_width != default_width
                    || col.max_width != max_width
                {
                    col.min_width = min_width;
                    col.default_width = default_width;
                    col.max_width = max_width;
                    col.width = col.clamp(col.width);
                    trace!(column = %id, width = col.width, "column bounds updated");
                }
            }
            None => {
                let mut col = ColumnGeometry {
                    id: id.clone(),
                    min_width,
                    default_width,
                    max_width,
                    width: 0,
                };
                col.width = col.seed_width();
                trace!(column = %id, width = col.width, "column registered");
                self.columns.push(col);
                if self.features.reorderable_columns
                    && self.controlled_column_order.is_none()
                    && !self.column_order.contains(&id)
                {
                    self.column_order.push(id.clone());
                }
            }
        }
        id
    }

    pub fn column(&self, id: &ColumnId) -> Option<&ColumnGeometry> {
        self.columns.iter().find(|c| &c.id == id)
    }

    /// Geometry of every column ever registered, live or not.
    pub fn columns(&self) -> &[ColumnGeometry] {
        &self.columns
    }

    pub fn width(&self, id: &ColumnId) -> Option<u16> {
        self.column(id).map(|c| c.width)
    }

    /// Number of columns registered in the latest pass.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, id: &ColumnId) -> bool {
        self.live.contains(id)
    }

    /// Live columns in registration order.
    pub fn registration_order(&self) -> &[ColumnId] {
        &self.live
    }

    /// Live columns in display order.
    ///
    /// With column reordering on and a non-empty order available, the order wins; unknown ids
    /// are skipped and live columns missing from it are appended. Otherwise registration order.
    pub fn effective_column_order(&self) -> Vec<ColumnId> {
        let order = self.column_order_source();
        if !self.features.reorderable_columns || order.is_empty() {
            return self.live.clone();
        }
        let mut out: Vec<ColumnId> = order
            .iter()
            .filter(|id| self.live.contains(id))
            .cloned()
            .collect();
        for id in &self.live {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        out
    }

    /// `(id, width)` of every live column in display order.
    pub fn column_widths(&self) -> Vec<(ColumnId, u16)> {
        self.effective_column_order()
            .into_iter()
            .filter_map(|id| {
                let w = self.width(&id)?;
                Some((id, w))
            })
            .collect()
    }

    /// Sum of all live column widths, excluding the selection slot.
    pub fn total_width(&self) -> u32 {
        self.live
            .iter()
            .filter_map(|id| self.width(id))
            .map(u32::from)
            .sum()
    }

    /// Sum of the live column widths other than `id`.
    pub fn sum_other_widths(&self, id: &ColumnId) -> u32 {
        self.live
            .iter()
            .filter(|other| *other != id)
            .filter_map(|other| self.width(other))
            .map(u32::from)
            .sum()
    }

    /// Width left for the fill column inside `container`.
    pub fn fill_width(&self, container: u16) -> u16 {
        let used = self.total_width() + u32::from(self.features.selection_width);
        u32::from(container).saturating_sub(used) as u16
    }

    pub fn container_width(&self) -> Option<u16> {
        self.container_width
    }

    pub fn is_manually_resized(&self) -> bool {
        self.manually_resized
    }

    /// Sets one column's width, clamped to its bounds, and disables auto-fit for good.
    ///
    /// Returns the applied width, or `None` for an unknown column.
    pub fn set_column_width(&mut self, id: &ColumnId, width: u16) -> Option<u16> {
        let Some(col) = self.columns.iter_mut().find(|c| &c.id == id) else {
            trace!(column = %id, "ignoring width update for unknown column");
            return None;
        };
        col.width = col.clamp(width);
        self.manually_resized = true;
        Some(col.width)
    }

    /// Batched [`Self::set_column_width`].
    pub fn set_column_widths<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (ColumnId, u16)>,
    {
        for (id, width) in updates {
            self.set_column_width(&id, width);
        }
    }

    /// Records the measured container width and, until the first manual resize, refits.
    pub fn observe_container_width(&mut self, width: u16) {
        if self.container_width != Some(width) {
            trace!(width, "container width changed");
        }
        self.container_width = Some(width);
        if !self.manually_resized {
            self.auto_fit(width);
        }
    }

    /// Fits the live columns to `container`: every column but the first sits at its minimum
    /// and the first absorbs the rest, never going below its own minimum.
    ///
    /// A no-op once the user has resized a column manually. Idempotent for a given width.
    pub fn auto_fit(&mut self, container: u16) {
        if self.manually_resized {
            return;
        }
        let order = self.effective_column_order();
        let Some((first, others)) = order.split_first() else {
            return;
        };

        let available = u32::from(container).saturating_sub(u32::from(self.features.selection_width));
        let mut others_min = 0u32;
        for id in others {
            if let Some(col) = self.columns.iter_mut().find(|c| &c.id == id) {
                col.width = col.clamp(col.min_width);
                others_min += u32::from(col.width);
            }
        }
        if let Some(col) = self.columns.iter_mut().find(|c| &c.id == first) {
            let rest = available.saturating_sub(others_min).min(u32::from(u16::MAX)) as u16;
            col.width = col.clamp(rest);
        }
    }

    /// Appends an explicit row id to the internal row order the first time it is seen.
    pub fn register_row(&mut self, id: &RowId) {
        if self.features.reorderable_rows
            && self.controlled_row_order.is_none()
            && !self.row_order.contains(id)
        {
            self.row_order.push(id.clone());
        }
    }

    /// Drops internal row-order entries for which `keep` returns false.
    ///
    /// Called once the caller's rows are registered so deleted rows are never reported back in
    /// a new order. A controlled row order belongs to the caller and is left alone.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&RowId) -> bool) {
        let before = self.row_order.len();
        self.row_order.retain(|id| keep(id));
        let dropped = before - self.row_order.len();
        if dropped > 0 {
            trace!(dropped, "forgot rows no longer in the tree");
        }
    }

    /// Orders one sibling group for display.
    ///
    /// With row reordering on and an order available, siblings known to the order are sorted
    /// by it and the rest follow in structural order. Otherwise `siblings` is returned as is.
    pub fn effective_row_order(&self, siblings: &[RowId]) -> Vec<RowId> {
        let order = self.row_order_source();
        if !self.features.reorderable_rows || order.is_empty() {
            return siblings.to_vec();
        }
        let mut known: Vec<(usize, &RowId)> = siblings
            .iter()
            .filter_map(|id| order.iter().position(|o| o == id).map(|pos| (pos, id)))
            .collect();
        known.sort_by_key(|(pos, _)| *pos);
        let mut out: Vec<RowId> = known.into_iter().map(|(_, id)| id.clone()).collect();
        for id in siblings {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        out
    }

    pub fn row_order(&self) -> &[RowId] {
        self.row_order_source()
    }

    /// Applies a drag of `dragged` onto `over`.
    ///
    /// Both ids must live in the same namespace and the matching reorder feature must be on.
    /// Internally owned orders are updated in place; controlled orders are left untouched and
    /// the new order is only reported. Identical ids, unknown ids and cross-namespace drags
    /// return `None`.
    pub fn handle_reorder(&mut self, dragged: &DragId, over: &DragId) -> Option<Reordered> {
        match (dragged, over) {
            (DragId::Column(a), DragId::Column(b)) => {
                if !self.features.reorderable_columns {
                    return None;
                }
                let next = array_move(&self.effective_column_order(), a, b)?;
                debug!(dragged = %a, over = %b, "columns reordered");
                if self.controlled_column_order.is_none() {
                    self.column_order = next.clone();
                }
                Some(Reordered::Columns(next))
            }
            (DragId::Row(a), DragId::Row(b)) => {
                if !self.features.reorderable_rows {
                    return None;
                }
                let next = array_move(self.row_order_source(), a, b)?;
                debug!(dragged = %a, over = %b, "rows reordered");
                if self.controlled_row_order.is_none() {
                    self.row_order = next.clone();
                }
                Some(Reordered::Rows(next))
            }
            _ => {
                trace!(%dragged, %over, "ignoring cross-namespace drag");
                None
            }
        }
    }

    fn column_order_source(&self) -> &[ColumnId] {
        self.controlled_column_order
            .as_deref()
            .unwrap_or(&self.column_order)
    }

    fn row_order_source(&self) -> &[RowId] {
        self.controlled_row_order.as_deref().unwrap_or(&self.row_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registry(selection_width: u16) -> LayoutRegistry {
        LayoutRegistry::new(LayoutFeatures {
            reorderable_columns: true,
            reorderable_rows: true,
            selection_width,
        })
    }

    fn register_all(reg: &mut LayoutRegistry, cols: &[(&str, u16, Option<u16>, Option<u16>)]) {
        reg.begin_pass();
        for (id, min, def, max) in cols {
            reg.register_column(*min, *def, *max, Some(ColumnId::new(*id)));
        }
        reg.end_pass();
    }

    fn widths(reg: &LayoutRegistry) -> Vec<u16> {
        reg.column_widths().into_iter().map(|(_, w)| w).collect()
    }

    #[test]
    fn seeds_width_from_default_clamped_to_max() {
        let mut reg = registry(0);
        register_all(
            &mut reg,
            &[("a", 10, Some(30), Some(20)), ("b", 10, None, None), ("c", 10, Some(5), None)],
        );
        assert_eq!(widths(&reg), vec![20, 10, 10]);
    }

    #[test]
    fn re_registration_keeps_current_width() {
        let mut reg = registry(0);
        register_all(&mut reg, &[("a", 10, Some(30), None)]);
        reg.set_column_width(&ColumnId::new("a"), 25);
        register_all(&mut reg, &[("a", 10, Some(30), None)]);
        assert_eq!(reg.width(&ColumnId::new("a")), Some(25));
        assert_eq!(reg.registration_order().len(), 1);

        register_all(&mut reg, &[("a", 26, Some(30), None)]);
        assert_eq!(reg.width(&ColumnId::new("a")), Some(26));
    }

    #[test]
    fn auto_ids_are_stable_across_passes() {
        let mut reg = registry(0);
        reg.begin_pass();
        let a = reg.register_column(5, None, None, None);
        let b = reg.register_column(5, None, None, None);
        reg.end_pass();
        reg.begin_pass();
        let a2 = reg.register_column(5, None, None, None);
        let b2 = reg.register_column(5, None, None, None);
        reg.end_pass();
        assert_eq!((a, b), (a2, b2));
        assert_eq!(reg.live_count(), 2);
    }

    #[test]
    fn auto_fit_gives_slack_to_first_column() {
        let mut reg = registry(0);
        register_all(
            &mut reg,
            &[("c1", 80, None, None), ("c2", 100, None, None), ("c3", 60, None, None)],
        );
        reg.observe_container_width(500);
        assert_eq!(widths(&reg), vec![340, 100, 60]);
        reg.observe_container_width(500);
        assert_eq!(widths(&reg), vec![340, 100, 60]);
    }

    #[test]
    fn auto_fit_respects_minimums_when_narrow() {
        let mut reg = registry(48);
        register_all(
            &mut reg,
            &[("c1", 80, None, None), ("c2", 100, None, None), ("c3", 60, None, None)],
        );
        reg.observe_container_width(200);
        assert_eq!(widths(&reg), vec![80, 100, 60]);
    }

    #[test]
    fn auto_fit_subtracts_selection_column() {
        let mut reg = registry(48);
        register_all(
            &mut reg,
            &[
                ("name", 80, Some(140), None),
                ("email", 100, Some(180), None),
                ("status", 60, Some(100), None),
            ],
        );
        reg.observe_container_width(600);
        assert_eq!(widths(&reg), vec![392, 100, 60]);
        assert_eq!(reg.total_width() + 48, 600);
    }

    #[test]
    fn manual_resize_disables_auto_fit() {
        let mut reg = registry(0);
        register_all(&mut reg, &[("a", 10, None, None), ("b", 10, None, None)]);
        reg.observe_container_width(100);
        assert_eq!(widths(&reg), vec![90, 10]);
        reg.set_column_width(&ColumnId::new("b"), 20);
        reg.observe_container_width(200);
        assert_eq!(widths(&reg), vec![90, 20]);
        assert!(reg.is_manually_resized());
        assert_eq!(reg.fill_width(200), 90);
    }

    #[test]
    fn columns_missing_from_a_pass_are_no_longer_live() {
        let mut reg = registry(0);
        register_all(&mut reg, &[("a", 10, None, None), ("b", 10, None, None)]);
        register_all(&mut reg, &[("b", 10, None, None)]);
        assert!(!reg.is_live(&ColumnId::new("a")));
        assert!(reg.is_live(&ColumnId::new("b")));
        assert_eq!(reg.effective_column_order(), vec![ColumnId::new("b")]);
    }

    #[test]
    fn width_updates_clamp_and_ignore_unknown_ids() {
        let mut reg = registry(0);
        register_all(&mut reg, &[("a", 10, None, Some(40))]);
        assert_eq!(reg.set_column_width(&ColumnId::new("a"), 2), Some(10));
        assert_eq!(reg.set_column_width(&ColumnId::new("a"), 99), Some(40));
        assert_eq!(reg.set_column_width(&ColumnId::new("zz"), 20), None);
        reg.set_column_widths([(ColumnId::new("a"), 25), (ColumnId::new("zz"), 1)]);
        assert_eq!(reg.width(&ColumnId::new("a")), Some(25));
    }

    #[test]
    fn reorders_internal_column_order() {
        let mut reg = registry(0);
        register_all(
            &mut reg,
            &[
                ("c1", 5, None, None),
                ("c2", 5, None, None),
                ("c3", 5, None, None),
                ("c4", 5, None, None),
            ],
        );
        let out = reg.handle_reorder(
            &DragId::Column(ColumnId::new("c4")),
            &DragId::Column(ColumnId::new("c2")),
        );
        let expected: Vec<ColumnId> = ["c1", "c4", "c2", "c3"].map(ColumnId::new).to_vec();
        assert_eq!(out, Some(Reordered::Columns(expected.clone())));
        assert_eq!(reg.effective_column_order(), expected);
    }

    #[test]
    fn controlled_order_is_reported_not_applied() {
        let mut reg = registry(0);
        let controlled: Vec<ColumnId> = ["b", "a"].map(ColumnId::new).to_vec();
        reg.set_controlled_orders(Some(controlled.clone()), None);
        register_all(&mut reg, &[("a", 5, None, None), ("b", 5, None, None)]);
        assert_eq!(reg.effective_column_order(), controlled);

        let out = reg.handle_reorder(
            &DragId::Column(ColumnId::new("a")),
            &DragId::Column(ColumnId::new("b")),
        );
        assert_eq!(
            out,
            Some(Reordered::Columns(["a", "b"].map(ColumnId::new).to_vec()))
        );
        assert_eq!(reg.effective_column_order(), controlled);
    }

    #[test]
    fn cross_namespace_and_identical_drags_are_no_ops() {
        let mut reg = registry(0);
        register_all(&mut reg, &[("a", 5, None, None), ("b", 5, None, None)]);
        reg.register_row(&RowId::new("a"));
        let col = DragId::Column(ColumnId::new("a"));
        let row = DragId::Row(RowId::new("a"));
        assert_eq!(reg.handle_reorder(&col, &row), None);
        assert_eq!(reg.handle_reorder(&col, &col), None);
    }

    #[test]
    fn row_order_sorts_sibling_groups() {
        let mut reg = registry(0);
        for id in ["r1", "r2", "r3"] {
            reg.register_row(&RowId::new(id));
        }
        reg.handle_reorder(
            &DragId::Row(RowId::new("r3")),
            &DragId::Row(RowId::new("r1")),
        );
        let siblings: Vec<RowId> = ["r1", "r2", "r3", "new"].map(RowId::new).to_vec();
        assert_eq!(
            reg.effective_row_order(&siblings),
            ["r3", "r1", "r2", "new"].map(RowId::new).to_vec()
        );
    }

    #[test]
    fn forgotten_rows_leave_the_reported_order() {
        let mut reg = registry(0);
        for id in ["a", "b", "c"] {
            reg.register_row(&RowId::new(id));
        }
        reg.retain_rows(|id| id.as_str() != "b");
        assert_eq!(reg.row_order(), ["a", "c"].map(RowId::new).as_slice());
        let out = reg.handle_reorder(
            &DragId::Row(RowId::new("a")),
            &DragId::Row(RowId::new("c")),
        );
        assert_eq!(out, Some(Reordered::Rows(["c", "a"].map(RowId::new).to_vec())));
    }

    #[test]
    fn rows_keep_structural_order_without_reordering() {
        let reg = LayoutRegistry::new(LayoutFeatures::default());
        let siblings: Vec<RowId> = ["b", "a"].map(RowId::new).to_vec();
        assert_eq!(reg.effective_row_order(&siblings), siblings);
    }

    proptest! {
        #[test]
        fn auto_fit_is_idempotent_and_respects_minimums(
            mins in proptest::collection::vec(1u16..200, 1..6),
            container in 0u16..1200,
            selection in prop_oneof![Just(0u16), Just(48u16)],
        ) {
            let mut reg = registry(selection);
            reg.begin_pass();
            for (i, min) in mins.iter().enumerate() {
                reg.register_column(*min, None, None, Some(ColumnId::new(format!("c{i}"))));
            }
            reg.end_pass();
            reg.observe_container_width(container);
            let first = widths(&reg);
            reg.observe_container_width(container);
            prop_assert_eq!(&first, &widths(&reg));
            for (w, min) in first.iter().zip(&mins) {
                prop_assert!(w >= min);
            }
            let sum_min: u32 = mins.iter().map(|m| u32::from(*m)).sum();
            if sum_min + u32::from(selection) <= u32::from(container) {
                prop_assert_eq!(reg.total_width() + u32::from(selection), u32::from(container));
            }
        }
    }
}
