use proptest::prelude::*;
use seedfill_geom::Interval;
use seedfill_runtime::LabelSet;

#[derive(Clone, Debug)]
enum Op {
    Create,
    Bump(usize),
    Show(usize),
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        (0usize..8).prop_map(Op::Bump),
        (0usize..8).prop_map(Op::Show),
        (0usize..8).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn revisions_only_grow_and_dirty_tracks_shown(ops in prop::collection::vec(op(), 1..64)) {
        let mut labels = LabelSet::<2>::new(Interval::from_dims([4, 4]));
        let mut last_stamp = 0u64;
        for op in ops {
            let ids = labels.ids();
            let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
            match op {
                Op::Create => {
                    let id = labels.create();
                    prop_assert_eq!(labels.current(), Some(id));
                    prop_assert!(!labels.needs_redisplay(id));
                }
                Op::Bump(i) => {
                    if let Some(id) = pick(i) {
                        let before = labels.rev(id);
                        let stamp = labels.bump(id);
                        prop_assert!(stamp > last_stamp);
                        last_stamp = stamp;
                        prop_assert!(labels.rev(id) > before);
                        prop_assert!(labels.needs_redisplay(id));
                        prop_assert!(labels.dirty().contains(&id));
                    }
                }
                Op::Show(i) => {
                    if let Some(id) = pick(i) {
                        let shown = labels.shown_rev(id);
                        labels.mark_shown(id, labels.rev(id));
                        prop_assert!(labels.shown_rev(id) >= shown);
                        prop_assert!(!labels.needs_redisplay(id));
                        prop_assert!(!labels.dirty().contains(&id));
                    }
                }
                Op::Remove(i) => {
                    if let Some(id) = pick(i) {
                        prop_assert!(labels.remove(id).is_some());
                        prop_assert!(labels.fields(id).is_none());
                        prop_assert!(!labels.dirty().contains(&id));
                        prop_assert_ne!(labels.current(), Some(id));
                    }
                }
            }
            for id in labels.dirty() {
                prop_assert!(labels.rev(id) > labels.shown_rev(id));
            }
        }
    }
}
