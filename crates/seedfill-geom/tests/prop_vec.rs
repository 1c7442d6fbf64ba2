use proptest::prelude::*;
use seedfill_geom::{Interval, VecN, coord_distance};

fn approx_abs_rel(a: f64, b: f64, atol: f64, rtol: f64) -> bool {
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs());
    diff <= atol + rtol * scale
}

fn bounded_f64() -> impl Strategy<Value = f64> {
    -1e6f64..1e6
}

fn arb_vec3() -> impl Strategy<Value = VecN<3>> {
    (bounded_f64(), bounded_f64(), bounded_f64()).prop_map(|(x, y, z)| VecN::new([x, y, z]))
}

fn arb_interval2() -> impl Strategy<Value = Interval<2>> {
    (-20i64..20, -20i64..20, 0i64..6, 0i64..6)
        .prop_map(|(x, y, w, h)| Interval::new([x, y], [x + w, y + h]))
}

proptest! {
    // Addition commutativity: a + b == b + a
    #[test]
    fn vec_add_commutative(a in arb_vec3(), b in arb_vec3()) {
        let l = a + b;
        let r = b + a;
        for d in 0..3 {
            prop_assert!(approx_abs_rel(l[d], r[d], 1e-9, 1e-12));
        }
    }

    // Normalization yields unit length for non-degenerate vectors
    #[test]
    fn normalized_is_unit(a in arb_vec3()) {
        prop_assume!(a.length() > 1e-3);
        prop_assert!(approx_abs_rel(a.normalized().length(), 1.0, 1e-9, 1e-9));
    }

    // Rounding then measuring never drifts more than half a voxel per axis
    #[test]
    fn round_is_nearest(a in arb_vec3()) {
        let c = a.round();
        let back = VecN::from_coord(&c);
        for d in 0..3 {
            prop_assert!((back[d] - a[d]).abs() <= 0.5 + 1e-9);
        }
    }

    // Interval iteration visits exactly size() distinct contained positions
    #[test]
    fn interval_iter_is_exhaustive(b in arb_interval2()) {
        let all: Vec<_> = b.iter().collect();
        prop_assert_eq!(all.len(), b.size());
        for p in &all {
            prop_assert!(b.contains(p));
        }
        let mut sorted = all.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), all.len());
    }

    // Integer distance is symmetric
    #[test]
    fn coord_distance_symmetric(a in prop::array::uniform3(-100i64..100), b in prop::array::uniform3(-100i64..100)) {
        prop_assert_eq!(coord_distance(&a, &b), coord_distance(&b, &a));
    }
}
