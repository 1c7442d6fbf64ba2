use proptest::prelude::*;
use seedfill_geom::Interval;
use seedfill_volume::{AtomicCounts, CountField, GridLayout, MemorySink, block_grid, write_counts};
use std::collections::HashSet;

fn bounds_strategy() -> impl Strategy<Value = Interval<3>> {
    (-4i64..4, -4i64..4, -4i64..4, 1usize..6, 1usize..6, 1usize..6).prop_map(|(x, y, z, dx, dy, dz)| {
        Interval::new([x, y, z], [x + dx as i64 - 1, y + dy as i64 - 1, z + dz as i64 - 1])
    })
}

proptest! {
    #[test]
    fn index_is_bijective(b in bounds_strategy()) {
        let layout = GridLayout::new(b);
        let mut seen = HashSet::new();
        for p in b.iter() {
            let i = layout.index(&p).unwrap();
            prop_assert!(i < layout.len());
            prop_assert!(seen.insert(i));
            prop_assert_eq!(layout.coord(i), p);
        }
        prop_assert_eq!(seen.len(), b.size());
    }

    #[test]
    fn blocks_partition_bounds(b in bounds_strategy(), bx in 1usize..4, by in 1usize..4, bz in 1usize..4) {
        let mut seen = HashSet::new();
        for block in block_grid(b, [bx, by, bz]) {
            for p in block.iter() {
                prop_assert!(b.contains(&p));
                prop_assert!(seen.insert(p));
            }
        }
        prop_assert_eq!(seen.len(), b.size());
    }

    #[test]
    fn export_matches_counts(b in bounds_strategy(), hits in prop::collection::vec((0usize..216, 1u32..4), 0..20)) {
        let counts = AtomicCounts::new(b);
        let layout = GridLayout::new(b);
        for (i, n) in hits {
            let p = layout.coord(i % layout.len());
            for _ in 0..n {
                counts.increment(&p).unwrap();
            }
        }
        let sink = MemorySink::new();
        write_counts(&counts, &sink, [2, 3, 2]).unwrap();
        let grid = sink.assemble(b).unwrap();
        for p in b.iter() {
            prop_assert_eq!(grid.at(&p), counts.count(&p).unwrap());
        }
    }
}
