use rand::Rng;
use serde::{Deserialize, Serialize};

/// Orientation of a shared edge as seen from the piece that owns the entry
/// (the piece to the left of a vertical edge, above a horizontal edge).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabSide {
    Tab,
    Blank,
}

impl TabSide {
    pub fn sign(self) -> i8 {
        match self {
            TabSide::Tab => 1,
            TabSide::Blank => -1,
        }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            TabSide::Tab
        } else {
            TabSide::Blank
        }
    }
}

/// Per-side signs of one piece: +1 protrudes, -1 is indented, 0 is a border.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSigns {
    pub top: i8,
    pub right: i8,
    pub bottom: i8,
    pub left: i8,
}

impl EdgeSigns {
    pub const FLAT: EdgeSigns = EdgeSigns {
        top: 0,
        right: 0,
        bottom: 0,
        left: 0,
    };
}

/// Random orientation of every internal edge of a rows x cols grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabMap {
    rows: u32,
    cols: u32,
    /// `rows` rows of `cols - 1` entries, between (r, c) and (r, c + 1).
    vertical: Vec<Vec<TabSide>>,
    /// `rows - 1` rows of `cols` entries, between (r, c) and (r + 1, c).
    horizontal: Vec<Vec<TabSide>>,
}

impl TabMap {
    pub fn generate<R: Rng + ?Sized>(rows: u32, cols: u32, rng: &mut R) -> Self {
        let mut vertical = Vec::with_capacity(rows as usize);
        for _ in 0..rows {
            let row = (0..cols.saturating_sub(1))
                .map(|_| TabSide::random(rng))
                .collect();
            vertical.push(row);
        }
        let mut horizontal = Vec::with_capacity(rows.saturating_sub(1) as usize);
        for _ in 0..rows.saturating_sub(1) {
            let row = (0..cols).map(|_| TabSide::random(rng)).collect();
            horizontal.push(row);
        }
        Self {
            rows,
            cols,
            vertical,
            horizontal,
        }
    }

    pub fn vertical_count(&self) -> usize {
        self.vertical.iter().map(Vec::len).sum()
    }

    pub fn horizontal_count(&self) -> usize {
        self.horizontal.iter().map(Vec::len).sum()
    }

    /// Signs for the piece at (row, col). The top and left sides receive the
    /// negated entry so neighbors always encode a tab against a blank.
    pub fn signs_for(&self, row: u32, col: u32) -> EdgeSigns {
        let (r, c) = (row as usize, col as usize);
        let mut signs = EdgeSigns::FLAT;
        if row > 0 {
            signs.top = -self.horizontal[r - 1][c].sign();
        }
        if col + 1 < self.cols {
            signs.right = self.vertical[r][c].sign();
        }
        if row + 1 < self.rows {
            signs.bottom = self.horizontal[r][c].sign();
        }
        if col > 0 {
            signs.left = -self.vertical[r][c - 1].sign();
        }
        signs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn edge_counts_match_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        let map = TabMap::generate(3, 5, &mut rng);
        assert_eq!(map.vertical_count(), 3 * 4);
        assert_eq!(map.horizontal_count(), 2 * 5);
    }

    #[test]
    fn neighbors_are_complementary_and_borders_flat() {
        let mut rng = StdRng::seed_from_u64(11);
        let (rows, cols) = (6, 7);
        let map = TabMap::generate(rows, cols, &mut rng);
        for row in 0..rows {
            for col in 0..cols {
                let signs = map.signs_for(row, col);
                if col + 1 < cols {
                    let right = map.signs_for(row, col + 1);
                    assert_eq!(signs.right, -right.left);
                    assert_ne!(signs.right, 0);
                } else {
                    assert_eq!(signs.right, 0);
                }
                if row + 1 < rows {
                    let below = map.signs_for(row + 1, col);
                    assert_eq!(signs.bottom, -below.top);
                    assert_ne!(signs.bottom, 0);
                } else {
                    assert_eq!(signs.bottom, 0);
                }
                if row == 0 {
                    assert_eq!(signs.top, 0);
                }
                if col == 0 {
                    assert_eq!(signs.left, 0);
                }
            }
        }
    }

    #[test]
    fn single_piece_is_flat() {
        let mut rng = StdRng::seed_from_u64(1);
        let map = TabMap::generate(1, 1, &mut rng);
        assert_eq!(map.signs_for(0, 0), EdgeSigns::FLAT);
    }

    #[test]
    fn both_orientations_appear() {
        let mut rng = StdRng::seed_from_u64(3);
        let map = TabMap::generate(8, 8, &mut rng);
        let tabs = (0..8)
            .flat_map(|row| (0..8).map(move |col| (row, col)))
            .map(|(row, col)| map.signs_for(row, col).right)
            .filter(|sign| *sign == 1)
            .count();
        assert!(tabs > 0 && tabs < 56);
    }
}
