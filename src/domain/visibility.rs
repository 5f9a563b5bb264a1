//! Fog of war. A cell's revealed flag only ever goes from false to true.

#[derive(Clone, Debug)]
pub struct VisibilityTracker {
    revealed: Vec<Vec<bool>>,
    width: usize,
    height: usize,
    surface_level: usize,
}

impl VisibilityTracker {
    /// Every row down to and including the surface row starts revealed.
    pub fn new(width: usize, height: usize, surface_level: usize) -> Self {
        let revealed = (0..height)
            .map(|y| vec![y <= surface_level; width])
            .collect();
        VisibilityTracker { revealed, width, height, surface_level }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    /// Out-of-bounds cells are never revealed. Sky rows always are.
    pub fn is_revealed(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some((ux, uy)) => uy <= self.surface_level || self.revealed[uy][ux],
            None => false,
        }
    }

    /// Idempotent; out-of-bounds is a no-op.
    pub fn reveal(&mut self, x: i32, y: i32) {
        if let Some((ux, uy)) = self.index(x, y) {
            self.revealed[uy][ux] = true;
        }
    }

    pub fn reveal_neighbors4(&mut self, x: i32, y: i32) {
        for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
            self.reveal(x + dx, y + dy);
        }
    }

    /// Reveal the square of Chebyshev radius `r` around `(x, y)`.
    pub fn reveal_around(&mut self, x: i32, y: i32, r: i32) {
        for dy in -r..=r {
            for dx in -r..=r {
                self.reveal(x + dx, y + dy);
            }
        }
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().flatten().filter(|&&v| v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_to_surface_start_revealed() {
        let v = VisibilityTracker::new(4, 8, 3);
        for y in 0..=3 {
            for x in 0..4 {
                assert!(v.is_revealed(x, y), "({x},{y})");
            }
        }
        assert!(!v.is_revealed(0, 4));
        assert_eq!(v.revealed_count(), 16);
    }

    #[test]
    fn reveal_is_monotonic_and_idempotent() {
        let mut v = VisibilityTracker::new(3, 6, 1);
        v.reveal(1, 4);
        v.reveal(1, 4);
        assert!(v.is_revealed(1, 4));
        assert_eq!(v.revealed_count(), 7);
    }

    #[test]
    fn out_of_bounds_ignored() {
        let mut v = VisibilityTracker::new(3, 3, 0);
        v.reveal(-1, 1);
        v.reveal(3, 1);
        assert!(!v.is_revealed(-1, 1));
        assert_eq!(v.revealed_count(), 3);
    }

    #[test]
    fn neighbors4_excludes_diagonals() {
        let mut v = VisibilityTracker::new(5, 8, 0);
        v.reveal_neighbors4(2, 4);
        assert!(v.is_revealed(2, 3));
        assert!(v.is_revealed(2, 5));
        assert!(v.is_revealed(1, 4));
        assert!(v.is_revealed(3, 4));
        assert!(!v.is_revealed(2, 4));
        assert!(!v.is_revealed(1, 3));
    }

    #[test]
    fn reveal_around_covers_square() {
        let mut v = VisibilityTracker::new(6, 8, 0);
        v.reveal_around(2, 4, 1);
        for y in 3..=5 {
            for x in 1..=3 {
                assert!(v.is_revealed(x, y));
            }
        }
        assert!(!v.is_revealed(4, 4));
    }
}
