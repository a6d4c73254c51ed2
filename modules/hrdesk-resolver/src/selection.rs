//! The ordered tuple of current selections.
//!
//! Invariant: once a stage is `Unselected`, every later stage is too.

use crate::error::ResolverError;
use crate::stage::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    values: Vec<Selection>,
}

impl SelectionState {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![Selection::Unselected; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, stage: usize) -> Option<&Selection> {
        self.values.get(stage)
    }

    pub fn values(&self) -> &[Selection] {
        &self.values
    }

    /// Concrete values of stages `0..stage`, or `None` if any of them is unselected.
    pub fn prefix(&self, stage: usize) -> Option<Vec<String>> {
        self.values
            .get(..stage)?
            .iter()
            .map(|s| s.as_value().map(str::to_string))
            .collect()
    }

    /// Set `stage` and reset every later stage.
    ///
    /// `allowed` is the option list currently addressed by this stage and the
    /// present prefix. A concrete value must be a member of it, and cannot be
    /// set while an earlier stage is unselected.
    pub fn set(
        &mut self,
        stage: usize,
        selection: Selection,
        allowed: &[String],
    ) -> Result<(), ResolverError> {
        if stage >= self.values.len() {
            return Err(ResolverError::StageOutOfRange {
                stage,
                len: self.values.len(),
            });
        }

        if let Selection::Value(value) = &selection {
            let has_prefix = self.values[..stage].iter().all(Selection::is_selected);
            if !has_prefix || !allowed.iter().any(|o| o == value) {
                return Err(ResolverError::InvalidSelection {
                    stage,
                    value: value.clone(),
                });
            }
        }

        self.values[stage] = selection;
        self.reset_from(stage + 1);
        Ok(())
    }

    /// Set every stage from `stage` onward to `Unselected`.
    pub fn reset_from(&mut self, stage: usize) {
        for value in self.values.iter_mut().skip(stage) {
            *value = Selection::Unselected;
        }
    }

    /// True iff the last stage holds a concrete value.
    pub fn is_terminal_resolved(&self) -> bool {
        self.values.last().is_some_and(Selection::is_selected)
    }

    /// Checks the no-gap invariant.
    pub fn is_contiguous(&self) -> bool {
        self.values
            .iter()
            .skip_while(|s| s.is_selected())
            .all(|s| !s.is_selected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn filled(values: &[&str], len: usize) -> SelectionState {
        let mut state = SelectionState::new(len);
        for (i, v) in values.iter().enumerate() {
            state.set(i, Selection::from(*v), &opts(&[*v])).unwrap();
        }
        state
    }

    #[test]
    fn new_state_is_all_unselected() {
        let state = SelectionState::new(4);
        assert!(state.values().iter().all(|s| !s.is_selected()));
        assert!(!state.is_terminal_resolved());
        assert_eq!(state.prefix(0), Some(vec![]));
        assert_eq!(state.prefix(1), None);
    }

    #[test]
    fn set_resets_downstream() {
        let mut state = filled(&["인사", "P1", "전체", "전체"], 4);
        assert!(state.is_terminal_resolved());

        state.set(1, Selection::from("P2"), &opts(&["P1", "P2"])).unwrap();

        assert_eq!(state.get(1), Some(&Selection::from("P2")));
        assert_eq!(state.get(2), Some(&Selection::Unselected));
        assert_eq!(state.get(3), Some(&Selection::Unselected));
        assert!(state.is_contiguous());
    }

    #[test]
    fn unselecting_resets_downstream() {
        let mut state = filled(&["인사", "P1", "전체"], 4);
        state.set(0, Selection::Unselected, &[]).unwrap();
        assert_eq!(state, SelectionState::new(4));
    }

    #[test]
    fn value_outside_options_is_rejected() {
        let mut state = SelectionState::new(3);
        let err = state
            .set(0, Selection::from("재무"), &opts(&["인사"]))
            .unwrap_err();
        assert_eq!(
            err,
            ResolverError::InvalidSelection {
                stage: 0,
                value: "재무".into()
            }
        );
        assert_eq!(state, SelectionState::new(3));
    }

    #[test]
    fn gap_is_rejected() {
        let mut state = SelectionState::new(3);
        let err = state.set(1, Selection::from("P1"), &opts(&["P1"])).unwrap_err();
        assert!(matches!(err, ResolverError::InvalidSelection { stage: 1, .. }));
    }

    #[test]
    fn out_of_range_stage() {
        let mut state = SelectionState::new(2);
        assert_eq!(
            state.set(2, Selection::Unselected, &[]),
            Err(ResolverError::StageOutOfRange { stage: 2, len: 2 })
        );
    }

    #[test]
    fn prefix_stops_at_requested_stage() {
        let state = filled(&["인사", "P1"], 4);
        assert_eq!(state.prefix(2), Some(vec!["인사".to_string(), "P1".to_string()]));
        assert_eq!(state.prefix(1), Some(vec!["인사".to_string()]));
        assert_eq!(state.prefix(3), None);
        assert_eq!(state.prefix(5), None);
    }
}
