//! Drag-resize of one column: `Idle -> Dragging -> Idle`.
//!
//! Widths are written to the registry inside [`ColumnResizer::drag_to`], before the event
//! handler returns, so the next frame always draws the edge under the pointer.

use crate::table::ids::ColumnId;
use crate::table::layout::LayoutRegistry;
use tracing::debug;

/// Everything recorded when a drag starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResizeSession {
    pub column: ColumnId,
    pub start_x: u16,
    pub start_width: u16,
    pub min_width: u16,
    pub max_width: Option<u16>,
    /// Sum of every other live column's width at drag start.
    pub others_width: u32,
    /// Container width at drag start; `u16::MAX` when it was never measured.
    pub container_width: u16,
    pub selection_width: u16,
}

impl ResizeSession {
    /// Width for a pointer at `pointer_x`.
    ///
    /// `live_container` falls back to the width recorded at drag start when missing or smaller
    /// than the column's own minimum. The column may not grow past what keeps the row inside the
    /// container, nor past its registered maximum, and never drops below its minimum.
    pub fn width_at(&self, pointer_x: u16, live_container: Option<u16>) -> u16 {
        let delta = i64::from(pointer_x) - i64::from(self.start_x);
        let requested = (i64::from(self.start_width) + delta).max(0);

        let container = match live_container {
            Some(w) if w >= self.min_width => w,
            _ => self.container_width,
        };
        let container_max = (i64::from(container)
            - i64::from(self.others_width)
            - i64::from(self.selection_width))
        .max(0);
        let effective_max = match self.max_width {
            Some(max) => container_max.min(i64::from(max)),
            None => container_max,
        };

        requested
            .min(effective_max)
            .max(i64::from(self.min_width))
            .min(i64::from(u16::MAX)) as u16
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResizeState {
    #[default]
    Idle,
    Dragging(ResizeSession),
}

#[derive(Clone, Debug, Default)]
pub struct ColumnResizer {
    state: ResizeState,
}

impl ColumnResizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging(_))
    }

    pub fn active_column(&self) -> Option<&ColumnId> {
        match &self.state {
            ResizeState::Dragging(s) => Some(&s.column),
            ResizeState::Idle => None,
        }
    }

    /// Starts dragging `column` from `pointer_x`. Unknown columns leave the resizer idle.
    pub fn begin(&mut self, registry: &LayoutRegistry, column: &ColumnId, pointer_x: u16) -> bool {
        let Some(geometry) = registry.column(column) else {
            return false;
        };
        let session = ResizeSession {
            column: column.clone(),
            start_x: pointer_x,
            start_width: geometry.width,
            min_width: geometry.min_width,
            max_width: geometry.max_width,
            others_width: registry.sum_other_widths(column),
            container_width: registry.container_width().unwrap_or(u16::MAX),
            selection_width: registry.features().selection_width,
        };
        debug!(column = %column, width = geometry.width, "resize started");
        self.state = ResizeState::Dragging(session);
        true
    }

    /// Applies the width for `pointer_x` to the registry and returns it.
    pub fn drag_to(
        &mut self,
        registry: &mut LayoutRegistry,
        pointer_x: u16,
        live_container: Option<u16>,
    ) -> Option<u16> {
        let ResizeState::Dragging(session) = &self.state else {
            return None;
        };
        let width = session.width_at(pointer_x, live_container);
        registry.set_column_width(&session.column, width)
    }

    /// Ends the drag and returns the column that was being resized.
    pub fn end(&mut self) -> Option<ColumnId> {
        match std::mem::take(&mut self.state) {
            ResizeState::Dragging(session) => {
                debug!(column = %session.column, "resize finished");
                Some(session.column)
            }
            ResizeState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::layout::LayoutFeatures;
    use proptest::prelude::*;

    fn scenario_registry() -> LayoutRegistry {
        let mut reg = LayoutRegistry::new(LayoutFeatures {
            selection_width: 48,
            ..LayoutFeatures::default()
        });
        reg.begin_pass();
        reg.register_column(80, Some(140), None, Some(ColumnId::new("name")));
        reg.register_column(100, Some(180), None, Some(ColumnId::new("email")));
        reg.register_column(60, Some(100), None, Some(ColumnId::new("status")));
        reg.end_pass();
        reg
    }

    #[test]
    fn drag_is_clamped_to_container_slack() {
        let mut reg = scenario_registry();
        reg.observe_container_width(600);
        let name = ColumnId::new("name");
        // Give the row some slack first: shrink the first column to its default.
        reg.set_column_width(&name, 140);
        assert_eq!(reg.total_width() + 48, 348);

        let mut r = ColumnResizer::new();
        assert!(r.begin(&reg, &name, 100));
        assert_eq!(r.drag_to(&mut reg, 150, Some(600)), Some(190));
        // 600 - 160 others - 48 selection leaves at most 392.
        assert_eq!(r.drag_to(&mut reg, 500, Some(600)), Some(392));
        assert_eq!(reg.total_width() + 48, 600);
        assert_eq!(r.end(), Some(name));
        assert!(!r.is_dragging());
    }

    #[test]
    fn auto_fitted_row_has_no_slack_to_grow() {
        let mut reg = scenario_registry();
        reg.observe_container_width(600);
        let name = ColumnId::new("name");
        let before = reg.width(&name);
        let mut r = ColumnResizer::new();
        r.begin(&reg, &name, 10);
        assert_eq!(r.drag_to(&mut reg, 60, Some(600)), before);
    }

    #[test]
    fn never_drops_below_minimum() {
        let mut reg = scenario_registry();
        reg.observe_container_width(600);
        let email = ColumnId::new("email");
        let mut r = ColumnResizer::new();
        r.begin(&reg, &email, 300);
        assert_eq!(r.drag_to(&mut reg, 0, Some(600)), Some(100));
    }

    #[test]
    fn implausible_live_width_falls_back_to_start_width() {
        let session = ResizeSession {
            column: ColumnId::new("a"),
            start_x: 10,
            start_width: 20,
            min_width: 10,
            max_width: Some(35),
            others_width: 30,
            container_width: 100,
            selection_width: 0,
        };
        assert_eq!(session.width_at(40, Some(3)), 35);
        assert_eq!(session.width_at(40, None), 35);
        assert_eq!(session.width_at(40, Some(60)), 30);
    }

    #[test]
    fn drag_without_session_is_ignored() {
        let mut reg = scenario_registry();
        let mut r = ColumnResizer::new();
        assert_eq!(r.drag_to(&mut reg, 10, None), None);
        assert_eq!(r.end(), None);
        assert!(!r.begin(&reg, &ColumnId::new("missing"), 0));
    }

    proptest! {
        #[test]
        fn every_step_respects_bounds(
            container in 250u16..900,
            moves in proptest::collection::vec(0u16..1000, 1..20),
            max in proptest::option::of(90u16..400),
        ) {
            let mut reg = LayoutRegistry::new(LayoutFeatures {
                selection_width: 48,
                ..LayoutFeatures::default()
            });
            reg.begin_pass();
            reg.register_column(80, None, max, Some(ColumnId::new("a")));
            reg.register_column(60, None, None, Some(ColumnId::new("b")));
            reg.end_pass();
            reg.observe_container_width(container);
            reg.set_column_width(&ColumnId::new("a"), 80);

            let mut r = ColumnResizer::new();
            r.begin(&reg, &ColumnId::new("a"), 500);
            for x in moves {
                let w = r.drag_to(&mut reg, x, Some(container)).unwrap_or(0);
                prop_assert!(w >= 80);
                if let Some(max) = max {
                    prop_assert!(w <= max.max(80));
                }
                prop_assert!(reg.total_width() + 48 <= u32::from(container));
            }
        }
    }
}
