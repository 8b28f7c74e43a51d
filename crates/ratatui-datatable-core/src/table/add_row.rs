//! Draft row behind the add-row and add-sub-task lines.
//!
//! The draft holds one [`LineInput`] per column, in column definition order. Only the first
//! value gates a commit; the others may stay blank.

use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::line_input::LineInput;
use crate::line_input::LineInputAction;
use crate::table::ids::RowId;
use tracing::debug;

/// Where a committed draft goes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddRowTarget {
    TopLevel,
    SubTask(RowId),
}

/// Outcome of the draft line losing focus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlurOutcome {
    /// A later slot held text and the first slot was filled in.
    Committed(Vec<String>),
    /// The first slot was blank; the draft should be discarded.
    Cancelled,
    /// Nothing to commit yet; the draft stays as typed.
    Kept,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftAction {
    None,
    Changed,
    Committed(Vec<String>),
    Blurred(BlurOutcome),
}

#[derive(Clone, Debug)]
pub struct AddRowDraft {
    target: AddRowTarget,
    slots: Vec<LineInput>,
    focused: usize,
}

impl AddRowDraft {
    pub fn new(target: AddRowTarget, columns: usize) -> Self {
        let mut draft = Self {
            target,
            slots: Vec::new(),
            focused: 0,
        };
        draft.sync_columns(columns);
        draft
    }

    pub fn target(&self) -> &AddRowTarget {
        &self.target
    }

    /// Grows or shrinks the slot list to `columns`, keeping the values that still fit.
    pub fn sync_columns(&mut self, columns: usize) {
        if self.slots.len() != columns {
            self.slots.resize_with(columns, LineInput::new);
            self.focused = self.focused.min(columns.saturating_sub(1));
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn focus(&mut self, slot: usize) {
        if slot < self.slots.len() {
            self.focused = slot;
        }
    }

    pub fn slot(&self, index: usize) -> Option<&LineInput> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut LineInput> {
        self.slots.get_mut(index)
    }

    pub fn set_value(&mut self, slot: usize, value: &str) {
        if let Some(input) = self.slots.get_mut(slot) {
            input.set_text(value);
        }
    }

    pub fn values(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.text().to_string()).collect()
    }

    fn first_is_blank(&self) -> bool {
        self.slots.first().is_none_or(LineInput::is_blank)
    }

    /// Hands out the values and resets the draft, or returns `None` (leaving every slot as
    /// typed) when the first value is blank.
    pub fn commit(&mut self) -> Option<Vec<String>> {
        if self.first_is_blank() {
            debug!(target_row = ?self.target, "add-row commit ignored: first value is blank");
            return None;
        }
        let values = self.values();
        for slot in &mut self.slots {
            slot.clear();
        }
        self.focused = 0;
        debug!(target_row = ?self.target, columns = values.len(), "add-row committed");
        Some(values)
    }

    pub fn blur(&mut self) -> BlurOutcome {
        if self.first_is_blank() {
            return BlurOutcome::Cancelled;
        }
        let later_filled = self.slots.iter().skip(1).any(|s| !s.is_blank());
        if later_filled {
            if let Some(values) = self.commit() {
                return BlurOutcome::Committed(values);
            }
        }
        BlurOutcome::Kept
    }

    /// Routes a key or paste to the focused slot.
    ///
    /// `Tab`/`BackTab` walk `tab_order` (slot indices in display order), `Enter` commits and
    /// `Esc` blurs the line.
    pub fn input(&mut self, event: InputEvent, tab_order: &[usize]) -> DraftAction {
        if let InputEvent::Key(key) = &event {
            match key.code {
                KeyCode::Tab => return self.step_focus(tab_order, 1),
                KeyCode::BackTab => return self.step_focus(tab_order, -1),
                _ => {}
            }
        }
        let Some(slot) = self.slots.get_mut(self.focused) else {
            return DraftAction::None;
        };
        match slot.input(event) {
            LineInputAction::None => DraftAction::None,
            LineInputAction::Changed => DraftAction::Changed,
            LineInputAction::Submitted(_) => match self.commit() {
                Some(values) => DraftAction::Committed(values),
                None => DraftAction::None,
            },
            LineInputAction::Cancelled => DraftAction::Blurred(self.blur()),
        }
    }

    fn step_focus(&mut self, tab_order: &[usize], delta: isize) -> DraftAction {
        let Some(pos) = tab_order.iter().position(|s| *s == self.focused) else {
            self.focused = tab_order.first().copied().unwrap_or(0);
            return DraftAction::Changed;
        };
        let next = pos as isize + delta;
        if next < 0 || next as usize >= tab_order.len() {
            return DraftAction::None;
        }
        self.focused = tab_order[next as usize];
        DraftAction::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyEvent;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code))
    }

    fn type_str(draft: &mut AddRowDraft, s: &str) {
        for c in s.chars() {
            draft.input(key(KeyCode::Char(c)), &[0, 1, 2]);
        }
    }

    #[test]
    fn dupont_commits_with_blank_middle_value() {
        let mut d = AddRowDraft::new(AddRowTarget::TopLevel, 3);
        type_str(&mut d, "Dupont");
        d.input(key(KeyCode::Tab), &[0, 1, 2]);
        d.input(key(KeyCode::Tab), &[0, 1, 2]);
        type_str(&mut d, "Actif");

        let action = d.input(key(KeyCode::Enter), &[0, 1, 2]);
        assert_eq!(
            action,
            DraftAction::Committed(vec!["Dupont".into(), "".into(), "Actif".into()])
        );
        assert_eq!(d.values(), vec!["", "", ""]);
        assert_eq!(d.focused(), 0);
    }

    #[test]
    fn blank_first_value_keeps_other_slots() {
        let mut d = AddRowDraft::new(AddRowTarget::TopLevel, 3);
        d.set_value(0, "   ");
        d.set_value(1, "jean@example.com");
        assert_eq!(d.commit(), None);
        assert_eq!(d.values(), vec!["   ", "jean@example.com", ""]);
    }

    #[test]
    fn blur_rules() {
        let mut d = AddRowDraft::new(AddRowTarget::SubTask(RowId::new("p")), 2);
        d.set_value(1, "x");
        assert_eq!(d.blur(), BlurOutcome::Cancelled);

        let mut d = AddRowDraft::new(AddRowTarget::TopLevel, 2);
        d.set_value(0, "Name");
        assert_eq!(d.blur(), BlurOutcome::Kept);
        assert_eq!(d.values(), vec!["Name", ""]);

        d.set_value(1, "x");
        assert_eq!(
            d.blur(),
            BlurOutcome::Committed(vec!["Name".into(), "x".into()])
        );
        assert_eq!(d.values(), vec!["", ""]);
    }

    #[test]
    fn slots_follow_column_count() {
        let mut d = AddRowDraft::new(AddRowTarget::TopLevel, 3);
        d.set_value(0, "a");
        d.set_value(2, "c");
        d.focus(2);
        d.sync_columns(2);
        assert_eq!(d.values(), vec!["a", ""]);
        assert_eq!(d.focused(), 1);
        d.sync_columns(4);
        assert_eq!(d.len(), 4);
    }

    #[test]
    fn tab_walks_display_order() {
        let mut d = AddRowDraft::new(AddRowTarget::TopLevel, 3);
        let order = [2, 0, 1];
        d.focus(2);
        d.input(key(KeyCode::Tab), &order);
        assert_eq!(d.focused(), 0);
        d.input(key(KeyCode::Tab), &order);
        assert_eq!(d.focused(), 1);
        assert_eq!(d.input(key(KeyCode::Tab), &order), DraftAction::None);
        d.input(key(KeyCode::BackTab), &order);
        assert_eq!(d.focused(), 0);
    }

    #[test]
    fn escape_blurs() {
        let mut d = AddRowDraft::new(AddRowTarget::TopLevel, 1);
        assert_eq!(
            d.input(key(KeyCode::Esc), &[0]),
            DraftAction::Blurred(BlurOutcome::Cancelled)
        );
    }
}
