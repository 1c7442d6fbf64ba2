//! Label sessions: one count field and fill state per label, plus change
//! stamps so a viewer knows which labels to redisplay.

use std::sync::Arc;

use hashbrown::HashMap;
use seedfill_geom::Interval;
use seedfill_volume::{AtomicCounts, AtomicFillState};

pub type LabelId = u32;

/// Shared storage of one label. Cloning shares the fields.
#[derive(Clone)]
pub struct LabelFields<const N: usize> {
    pub counts: Arc<AtomicCounts<N>>,
    pub state: Arc<AtomicFillState<N>>,
}

impl<const N: usize> LabelFields<N> {
    fn new(bounds: Interval<N>) -> Self {
        Self {
            counts: Arc::new(AtomicCounts::new(bounds)),
            state: Arc::new(AtomicFillState::new(bounds)),
        }
    }
}

pub struct LabelSet<const N: usize> {
    bounds: Interval<N>,
    labels: HashMap<LabelId, LabelFields<N>>,
    // latest finished change per label
    rev: HashMap<LabelId, u64>,
    // last revision handed to the viewer
    shown: HashMap<LabelId, u64>,
    current: Option<LabelId>,
    next_id: LabelId,
    counter: u64,
}

impl<const N: usize> LabelSet<N> {
    pub fn new(bounds: Interval<N>) -> Self {
        Self {
            bounds,
            labels: HashMap::new(),
            rev: HashMap::new(),
            shown: HashMap::new(),
            current: None,
            next_id: 1,
            counter: 0,
        }
    }

    pub fn bounds(&self) -> Interval<N> {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Creates a fresh label and makes it current.
    pub fn create(&mut self) -> LabelId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.labels.insert(id, LabelFields::new(self.bounds));
        self.current = Some(id);
        id
    }

    pub fn current(&self) -> Option<LabelId> {
        self.current
    }

    /// Returns false if `id` is not a known label.
    pub fn set_current(&mut self, id: Option<LabelId>) -> bool {
        match id {
            Some(id) if !self.labels.contains_key(&id) => false,
            _ => {
                self.current = id;
                true
            }
        }
    }

    pub fn current_or_create(&mut self) -> LabelId {
        match self.current {
            Some(id) => id,
            None => self.create(),
        }
    }

    pub fn fields(&self, id: LabelId) -> Option<LabelFields<N>> {
        self.labels.get(&id).cloned()
    }

    pub fn remove(&mut self, id: LabelId) -> Option<LabelFields<N>> {
        if self.current == Some(id) {
            self.current = None;
        }
        self.rev.remove(&id);
        self.shown.remove(&id);
        self.labels.remove(&id)
    }

    pub fn ids(&self) -> Vec<LabelId> {
        let mut ids: Vec<_> = self.labels.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Records a finished change to `id` and returns its new stamp.
    pub fn bump(&mut self, id: LabelId) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        if self.labels.contains_key(&id) {
            self.rev.insert(id, stamp);
        }
        stamp
    }

    pub fn rev(&self, id: LabelId) -> u64 {
        self.rev.get(&id).copied().unwrap_or(0)
    }

    pub fn shown_rev(&self, id: LabelId) -> u64 {
        self.shown.get(&id).copied().unwrap_or(0)
    }

    pub fn mark_shown(&mut self, id: LabelId, rev: u64) {
        let entry = self.shown.entry(id).or_insert(0);
        *entry = (*entry).max(rev);
    }

    pub fn needs_redisplay(&self, id: LabelId) -> bool {
        self.rev(id) > self.shown_rev(id)
    }

    /// Labels changed since they were last shown, oldest id first.
    pub fn dirty(&self) -> Vec<LabelId> {
        let mut ids: Vec<_> = self
            .rev
            .keys()
            .copied()
            .filter(|id| self.needs_redisplay(*id))
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfill_volume::CountField;

    #[test]
    fn current_label_is_created_on_demand() {
        let mut set = LabelSet::new(Interval::from_dims([4, 4]));
        assert_eq!(set.current(), None);
        let a = set.current_or_create();
        assert_eq!(set.current_or_create(), a);
        let b = set.create();
        assert_ne!(a, b);
        assert_eq!(set.current(), Some(b));
        assert!(set.set_current(Some(a)));
        assert!(!set.set_current(Some(99)));
        assert_eq!(set.ids(), vec![a, b]);
    }

    #[test]
    fn labels_do_not_share_fields() {
        let mut set = LabelSet::new(Interval::from_dims([4, 4]));
        let a = set.create();
        let b = set.create();
        set.fields(a).unwrap().counts.increment(&[1, 1]).unwrap();
        assert_eq!(set.fields(a).unwrap().counts.get(&[1, 1]), 1);
        assert_eq!(set.fields(b).unwrap().counts.get(&[1, 1]), 0);
    }

    #[test]
    fn revisions_track_redisplay() {
        let mut set = LabelSet::new(Interval::from_dims([2, 2]));
        let a = set.create();
        let b = set.create();
        assert!(set.dirty().is_empty());

        let s1 = set.bump(a);
        let s2 = set.bump(b);
        assert!(s2 > s1);
        assert_eq!(set.dirty(), vec![a, b]);

        set.mark_shown(a, s1);
        assert!(!set.needs_redisplay(a));
        // stale marks never move the shown stamp back
        set.mark_shown(b, s2);
        set.mark_shown(b, 0);
        assert!(set.dirty().is_empty());

        set.remove(a);
        assert_eq!(set.rev(a), 0);
        assert_eq!(set.current(), Some(b));
    }
}
