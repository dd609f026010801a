use array_init::array_init;

use crate::config::NUM_DIMENSIONS;
use crate::config::TWO_TO_NUM_DIMENSIONS;
use crate::prelude::Float;
use crate::prelude::MVec;

#[derive(Clone, Default, PartialEq)]
pub struct Extent {
    pub min: MVec,
    pub max: MVec,
    pub center: MVec,
}

impl Extent {
    pub fn new(min: MVec, max: MVec) -> Self {
        for d in 0..NUM_DIMENSIONS {
            debug_assert!(min[d] <= max[d]);
        }
        Self {
            min,
            max,
            center: (min + max) * 0.5,
        }
    }

    pub fn cube_from_side_length(side_length: Float) -> Self {
        Self::new(MVec::ZERO, MVec::splat(side_length))
    }

    pub fn from_positions<'a>(positions: impl Iterator<Item = &'a MVec>) -> Option<Self> {
        let mut min: Option<MVec> = None;
        let mut max: Option<MVec> = None;
        for pos in positions {
            min = Some(min.map_or(*pos, |m| m.min(*pos)));
            max = Some(max.map_or(*pos, |m| m.max(*pos)));
        }
        Some(Self::new(min?, max?))
    }

    /// Return an extent with slightly increased size
    /// but the same center
    pub fn pad(self) -> Self {
        const PADDING_FRACTION: Float = 0.01;
        let dist_to_min = self.min - self.center;
        let dist_to_max = self.max - self.center;
        Self {
            min: self.center + dist_to_min * (1.0 + PADDING_FRACTION),
            max: self.center + dist_to_max * (1.0 + PADDING_FRACTION),
            center: self.center,
        }
    }

    pub fn side_lengths(&self) -> MVec {
        self.max - self.min
    }

    pub fn max_side_length(&self) -> Float {
        self.side_lengths().max_element()
    }

    pub fn contains(&self, pos: &MVec) -> bool {
        (0..NUM_DIMENSIONS).all(|d| self.min[d] <= pos[d] && pos[d] <= self.max[d])
    }

    /// Index of the subdivision containing `pos`. Bit d of the index
    /// is set iff the position lies in the upper half along axis d.
    pub fn get_subdivision_index(&self, pos: &MVec) -> usize {
        debug_assert!(self.contains(pos));
        let mut index = 0;
        for d in 0..NUM_DIMENSIONS {
            if pos[d] >= self.center[d] {
                index |= 1 << d;
            }
        }
        index
    }

    pub fn get_subdivisions(&self) -> [Self; TWO_TO_NUM_DIMENSIONS] {
        array_init(|i| {
            let mut min = self.min;
            let mut max = self.max;
            for d in 0..NUM_DIMENSIONS {
                if i & (1 << d) == 0 {
                    max[d] = self.center[d];
                } else {
                    min[d] = self.center[d];
                }
            }
            Self::new(min, max)
        })
    }
}

impl std::fmt::Debug for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Extent({:.3?} {:.3?})", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::Extent;
    use crate::config::NUM_DIMENSIONS;
    use crate::config::TWO_TO_NUM_DIMENSIONS;
    use crate::prelude::MVec;

    #[test]
    fn from_positions() {
        let positions = [MVec::splat(0.0), MVec::splat(1.0), MVec::splat(0.5)];
        let extent = Extent::from_positions(positions.iter()).unwrap();
        assert_eq!(extent.min, MVec::splat(0.0));
        assert_eq!(extent.max, MVec::splat(1.0));
        assert_eq!(extent.center, MVec::splat(0.5));
        assert!(Extent::from_positions([].iter()).is_none());
    }

    #[test]
    fn subdivisions_partition_the_extent() {
        let extent = Extent::cube_from_side_length(1.0);
        let subdivisions = extent.get_subdivisions();
        assert_eq!(subdivisions.len(), TWO_TO_NUM_DIMENSIONS);
        for (i, sub) in subdivisions.iter().enumerate() {
            assert_eq!(extent.get_subdivision_index(&sub.center), i);
            for d in 0..NUM_DIMENSIONS {
                assert_eq!(sub.max[d] - sub.min[d], 0.5);
            }
        }
    }

    #[test]
    fn contains() {
        let extent = Extent::cube_from_side_length(1.0);
        assert!(extent.contains(&MVec::splat(0.5)));
        assert!(extent.contains(&MVec::splat(0.0)));
        assert!(extent.contains(&MVec::splat(1.0)));
        assert!(!extent.contains(&MVec::splat(1.5)));
    }
}
