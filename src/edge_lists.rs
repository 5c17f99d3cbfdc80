use crate::mask::CircularMask;

/// A `(delta_row, delta_col)` offset from the focal cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offset {
    pub di: isize,
    pub dj: isize,
}

/// The trailing/leading coordinate offsets derived from a `CircularMask`,
/// letting a sliding window move one column to the right in O(mask rows)
/// instead of re-scanning the whole window. Grounded directly on the
/// original tool's `trailing_i`/`trailing_j`/`leading_i`/`leading_j` lookup
/// arrays.
#[derive(Clone, Debug)]
pub struct EdgeLists {
    pub trailing: Vec<Offset>,
    pub leading: Vec<Offset>,
}

impl EdgeLists {
    pub fn from_mask(mask: &CircularMask) -> EdgeLists {
        let side = mask.side() as isize;
        let center = mask.center() as isize;
        let min_row = mask.min_row as isize;

        let mut trailing = Vec::with_capacity((side - 2 * min_row).max(0) as usize);
        let mut leading = Vec::with_capacity(trailing.capacity());

        for i in min_row..(side - min_row) {
            for j in 0..side {
                let here = mask.included(i as usize, j as usize);
                let left = j > 0 && mask.included(i as usize, (j - 1) as usize);
                let right = j < side - 1 && mask.included(i as usize, (j + 1) as usize);

                if here && !left {
                    trailing.push(Offset { di: i - center, dj: j - center - 1 });
                }
                if here && !right {
                    leading.push(Offset { di: i - center, dj: j - center });
                }
            }
        }

        EdgeLists { trailing, leading }
    }

    pub fn len(&self) -> usize {
        self.trailing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trailing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_shaped_mask_has_one_entry_per_row() {
        let mask = CircularMask::new(1.0).unwrap();
        let edges = EdgeLists::from_mask(&mask);
        // mask rows 0..=2, all within [min_row, side-min_row)
        assert_eq!(edges.len(), 3);
        assert_eq!(edges.trailing.len(), edges.leading.len());
    }

    #[test]
    fn trailing_and_leading_match_window_membership() {
        // For every mask row, trailing+1 column should be the first included
        // column, and leading should be the last included column.
        for r in [1.0_f64, 1.5, 2.0, 3.0] {
            let mask = CircularMask::new(r).unwrap();
            let edges = EdgeLists::from_mask(&mask);
            let center = mask.center() as isize;
            for k in 0..edges.len() {
                let t = edges.trailing[k];
                let l = edges.leading[k];
                assert_eq!(t.di, l.di, "trailing/leading rows must match for radius {r}");
                // the cell just right of trailing must be included
                let row = (t.di + center) as usize;
                let first_col = (t.dj + center + 1) as usize;
                assert!(mask.included(row, first_col));
                let last_col = (l.dj + center) as usize;
                assert!(mask.included(row, last_col));
            }
        }
    }

    #[test]
    fn single_cell_mask_has_one_edge_entry() {
        let mask = CircularMask::new(0.0).unwrap();
        let edges = EdgeLists::from_mask(&mask);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges.trailing[0], Offset { di: 0, dj: -1 });
        assert_eq!(edges.leading[0], Offset { di: 0, dj: 0 });
    }
}
