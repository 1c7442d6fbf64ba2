use seedfill_geom::{Coord, Interval};
use serde::Deserialize;

/// Expansion connectivity of the ball fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// 4 in 2-D, 6 in 3-D.
    #[default]
    Faces,
    /// 8 in 2-D, 26 in 3-D.
    Full,
    /// L1 ball of the given radius, center excluded.
    Diamond(u32),
}

impl Neighborhood {
    /// Offsets in box order (first axis fastest), center excluded.
    pub fn offsets<const N: usize>(&self) -> Vec<Coord<N>> {
        let r = match *self {
            Neighborhood::Faces | Neighborhood::Full => 1,
            Neighborhood::Diamond(r) => i64::from(r),
        };
        Interval::new([-r; N], [r; N])
            .iter()
            .filter(|o| {
                let l1: i64 = o.iter().map(|v| v.abs()).sum();
                l1 != 0
                    && match *self {
                        Neighborhood::Full => true,
                        _ => l1 <= r,
                    }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_counts() {
        assert_eq!(Neighborhood::Faces.offsets::<2>().len(), 4);
        assert_eq!(Neighborhood::Faces.offsets::<3>().len(), 6);
        assert_eq!(Neighborhood::Full.offsets::<2>().len(), 8);
        assert_eq!(Neighborhood::Full.offsets::<3>().len(), 26);
        assert_eq!(Neighborhood::Diamond(2).offsets::<2>().len(), 12);
        assert_eq!(Neighborhood::Diamond(1).offsets::<3>(), Neighborhood::Faces.offsets::<3>());
    }
}
