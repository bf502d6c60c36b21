//! Per-floor-plan speaker selection and speaker mute state.
//!
//! Each floor plan keeps its own selection set; switching plans swaps which set is current
//! without touching the others. Mute belongs to the speaker identity and survives plan
//! switches.

use std::collections::{BTreeSet, HashMap};

use crate::surface::geometry::{Point, ScreenRect};

static EMPTY_SELECTION: BTreeSet<String> = BTreeSet::new();

/// True iff strictly more than half of `selection` is muted. An exact half is not muted.
pub fn is_majority_muted(selection: &BTreeSet<String>, muted: &BTreeSet<String>) -> bool {
    let muted_count = selection.iter().filter(|id| muted.contains(*id)).count();
    muted_count * 2 > selection.len()
}

/// What the last mute toggle changed, so an immediate second toggle can undo it.
#[derive(Debug, Clone)]
struct MuteToggleMemo {
    selection: BTreeSet<String>,
    muted_before: BTreeSet<String>,
    muted_after: bool,
}

#[derive(Debug, Default)]
pub struct SelectionEngine {
    selections: HashMap<usize, BTreeSet<String>>,
    active_plan: usize,
    muted: BTreeSet<String>,
    mute_memo: Option<MuteToggleMemo>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_plan(&self) -> usize {
        self.active_plan
    }

    /// Makes the stored selection of `index` current (empty if it has none yet).
    pub fn switch_plan(&mut self, index: usize) {
        if index != self.active_plan {
            self.active_plan = index;
            self.mute_memo = None;
        }
    }

    /// The selection of the active floor plan.
    pub fn current(&self) -> &BTreeSet<String> {
        self.selections
            .get(&self.active_plan)
            .unwrap_or(&EMPTY_SELECTION)
    }

    fn current_mut(&mut self) -> &mut BTreeSet<String> {
        self.mute_memo = None;
        self.selections.entry(self.active_plan).or_default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.current().contains(id)
    }

    /// Tap on a speaker.
    ///
    /// A tap replaces a single selection of another speaker, removes an already selected
    /// speaker, and otherwise adds to the selection.
    pub fn toggle_press(&mut self, id: &str) {
        let selection = self.current_mut();

        if selection.len() == 1 && !selection.contains(id) {
            selection.clear();
            selection.insert(id.to_string());
        } else if !selection.remove(id) {
            selection.insert(id.to_string());
        }
    }

    /// Long press on a speaker: yields the selection to open the level panel for, but only
    /// when the pressed speaker is part of it.
    pub fn long_press(&self, id: &str) -> Option<Vec<String>> {
        if !self.is_selected(id) {
            return None;
        }
        Some(self.current().iter().cloned().collect())
    }

    /// Replaces the selection with every speaker whose screen position lies in `rect`,
    /// edges included.
    pub fn set_from_rect<'a, I>(&mut self, rect: ScreenRect, speakers_on_screen: I)
    where
        I: IntoIterator<Item = (&'a str, Point)>,
    {
        let inside: BTreeSet<String> = speakers_on_screen
            .into_iter()
            .filter(|(_, p)| rect.contains(*p))
            .map(|(id, _)| id.to_string())
            .collect();
        *self.current_mut() = inside;
    }

    pub fn select_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let selection = self.current_mut();
        selection.extend(ids.into_iter().map(str::to_string));
    }

    pub fn clear(&mut self) {
        self.current_mut().clear();
    }

    pub fn muted(&self) -> &BTreeSet<String> {
        &self.muted
    }

    pub fn is_muted(&self, id: &str) -> bool {
        self.muted.contains(id)
    }

    pub fn is_majority_muted(&self) -> bool {
        is_majority_muted(self.current(), &self.muted)
    }

    /// Mutes the whole selection, or unmutes it when most of it is already muted.
    ///
    /// A second toggle with nothing changed in between restores the mute state from before
    /// the first one.
    ///
    /// # Returns
    ///
    /// The new mute state of every selected speaker, in id order.
    pub fn apply_mute_toggle(&mut self) -> Vec<(String, bool)> {
        let selection = self.current().clone();
        if selection.is_empty() {
            return Vec::new();
        }

        if let Some(memo) = self.mute_memo.take() {
            let unchanged = memo.selection == selection
                && selection
                    .iter()
                    .all(|id| self.muted.contains(id) == memo.muted_after);

            if unchanged {
                for id in &selection {
                    if memo.muted_before.contains(id) {
                        self.muted.insert(id.clone());
                    } else {
                        self.muted.remove(id);
                    }
                }
                return selection
                    .into_iter()
                    .map(|id| {
                        let mute = self.muted.contains(&id);
                        (id, mute)
                    })
                    .collect();
            }
        }

        let mute = !is_majority_muted(&selection, &self.muted);
        let muted_before: BTreeSet<String> = selection
            .iter()
            .filter(|id| self.muted.contains(*id))
            .cloned()
            .collect();

        for id in &selection {
            if mute {
                self.muted.insert(id.clone());
            } else {
                self.muted.remove(id);
            }
        }

        self.mute_memo = Some(MuteToggleMemo {
            selection: selection.clone(),
            muted_before,
            muted_after: mute,
        });

        selection.into_iter().map(|id| (id, mute)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn engine_with(ids: &[&str]) -> SelectionEngine {
        let mut engine = SelectionEngine::new();
        engine.select_all(ids.iter().copied());
        engine
    }

    #[test]
    fn test_tap_toggle_law() {
        let mut engine = SelectionEngine::new();

        engine.toggle_press("A");
        assert_eq!(engine.current(), &set(&["A"]));
        engine.toggle_press("A");
        assert!(engine.current().is_empty());

        let mut engine = engine_with(&["A", "B"]);
        engine.toggle_press("B");
        assert_eq!(engine.current(), &set(&["A"]));
        engine.toggle_press("A");
        assert!(engine.current().is_empty());
    }

    #[test]
    fn test_tap_replaces_single_selection() {
        let mut engine = engine_with(&["A"]);
        engine.toggle_press("B");
        assert_eq!(engine.current(), &set(&["B"]));
    }

    #[test]
    fn test_tap_adds_to_multi_selection() {
        let mut engine = engine_with(&["A", "B"]);
        engine.toggle_press("C");
        assert_eq!(engine.current(), &set(&["A", "B", "C"]));
    }

    #[test]
    fn test_rect_selection_is_edge_inclusive() {
        let mut engine = engine_with(&["stale"]);
        let rect = ScreenRect {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 50.0,
        };
        let on_screen = [
            ("left_edge", Point::new(10.0, 30.0)),
            ("bottom_edge", Point::new(50.0, 60.0)),
            ("corner", Point::new(110.0, 10.0)),
            ("outside", Point::new(9.999, 30.0)),
            ("below", Point::new(50.0, 60.001)),
        ];

        engine.set_from_rect(rect, on_screen);

        assert_eq!(engine.current(), &set(&["bottom_edge", "corner", "left_edge"]));
    }

    #[test]
    fn test_plan_switch_preserves_selection() {
        let mut engine = SelectionEngine::new();
        engine.toggle_press("A");

        engine.switch_plan(1);
        assert!(engine.current().is_empty());
        engine.toggle_press("B");

        engine.switch_plan(0);
        assert_eq!(engine.current(), &set(&["A"]));
        engine.switch_plan(1);
        assert_eq!(engine.current(), &set(&["B"]));
    }

    #[test]
    fn test_mute_survives_plan_switch() {
        let mut engine = engine_with(&["A"]);
        engine.apply_mute_toggle();
        engine.switch_plan(1);

        assert!(engine.is_muted("A"));
    }

    #[test]
    fn test_majority_muted_tie_is_unmuted() {
        let selection = set(&["A", "B", "C", "D"]);
        assert!(!is_majority_muted(&selection, &set(&["A", "B"])));
        assert!(is_majority_muted(&selection, &set(&["A", "B", "C"])));
        assert!(!is_majority_muted(&BTreeSet::new(), &set(&["A"])));
    }

    #[test]
    fn test_mute_toggle_majority_rule() {
        let mut engine = engine_with(&["A", "B", "C"]);
        engine.muted.extend(set(&["A", "B"]));

        let changes = engine.apply_mute_toggle();
        assert_eq!(
            changes,
            vec![
                ("A".to_string(), false),
                ("B".to_string(), false),
                ("C".to_string(), false)
            ]
        );
        assert!(engine.muted().is_empty());
    }

    #[test]
    fn test_mute_toggle_twice_restores_prior_state() {
        let mut engine = engine_with(&["A", "B", "C", "D"]);
        engine.muted.extend(set(&["A", "B", "X"]));
        let before = engine.muted().clone();

        engine.apply_mute_toggle();
        assert_eq!(engine.muted(), &set(&["A", "B", "C", "D", "X"]));

        let changes = engine.apply_mute_toggle();
        assert_eq!(engine.muted(), &before);
        assert_eq!(changes.len(), 4);
        assert!(changes.contains(&("C".to_string(), false)));
        assert!(changes.contains(&("A".to_string(), true)));
    }

    #[test]
    fn test_mute_toggle_after_selection_change_uses_majority() {
        let mut engine = engine_with(&["A", "B"]);
        engine.apply_mute_toggle();
        engine.toggle_press("C");

        // A and B muted, C not: majority muted -> unmute all three.
        engine.apply_mute_toggle();
        assert!(engine.muted().is_empty());
    }

    #[test]
    fn test_mute_toggle_empty_selection_is_noop() {
        let mut engine = SelectionEngine::new();
        assert!(engine.apply_mute_toggle().is_empty());
        assert!(engine.muted().is_empty());
    }

    #[test]
    fn test_long_press() {
        let engine = engine_with(&["B", "A"]);
        assert_eq!(
            engine.long_press("A"),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(engine.long_press("C"), None);
    }

    #[test]
    fn test_clear_only_affects_active_plan() {
        let mut engine = engine_with(&["A"]);
        engine.switch_plan(1);
        engine.select_all(["B", "C"]);
        engine.clear();

        engine.switch_plan(0);
        assert_eq!(engine.current(), &set(&["A"]));
    }
}
