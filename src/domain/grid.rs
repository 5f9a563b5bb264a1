//! TileGrid: the authoritative, mutable tile layer of the world.
//!
//! Coordinates are `(x, y)` in tiles, `y` growing downward. Reads outside
//! the grid report a solid wall, so the world edges and the void beyond
//! the bottom row behave like Bedrock for collision.

use thiserror::Error;

use super::terrain::Terrain;
use super::tile::Tile;

/// Pixel edge length of one tile.
pub const TILE_SIZE: i32 = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("generated terrain is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    DimensionMismatch {
        expected_w: usize,
        expected_h: usize,
        actual_w: usize,
        actual_h: usize,
    },
    #[error("world {width}x{height} cannot hold a surface at row {surface_level}")]
    TooSmall {
        width: usize,
        height: usize,
        surface_level: usize,
    },
}

// ══════════════════════════════════════════════════════════════
// Axis-aligned boxes
// ══════════════════════════════════════════════════════════════

/// Integer pixel rectangle. `right()` and `bottom()` are exclusive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Aabb {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Aabb {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Aabb { x, y, w, h }
    }

    /// Pixel box covering tile `(tx, ty)`.
    pub fn tile_rect(tx: i32, ty: i32) -> Self {
        Aabb::new(tx * TILE_SIZE, ty * TILE_SIZE, TILE_SIZE, TILE_SIZE)
    }

    #[inline] pub fn left(&self) -> i32 { self.x }
    #[inline] pub fn right(&self) -> i32 { self.x + self.w }
    #[inline] pub fn top(&self) -> i32 { self.y }
    #[inline] pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Strict overlap: touching edges do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Tile containing the box centre.
    pub fn center_tile(&self) -> (i32, i32) {
        let (cx, cy) = self.center();
        (cx.div_euclid(TILE_SIZE), cy.div_euclid(TILE_SIZE))
    }
}

/// Inclusive tile range produced by the broad phase.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileRange {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
}

impl TileRange {
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let (x0, x1) = (self.x0, self.x1);
        (self.y0..=self.y1).flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
    }
}

// ══════════════════════════════════════════════════════════════
// TileGrid
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct TileGrid {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
}

impl TileGrid {
    /// Adopt generated terrain, failing fast when its shape is not the
    /// one the world was configured for.
    pub fn from_terrain(terrain: Terrain, expected_w: usize, expected_h: usize) -> Result<Self, WorldError> {
        let actual_h = terrain.tiles.len();
        let actual_w = terrain.tiles.first().map_or(0, |r| r.len());
        let ragged = terrain.tiles.iter().any(|r| r.len() != actual_w);
        if ragged || actual_w != expected_w || actual_h != expected_h {
            return Err(WorldError::DimensionMismatch {
                expected_w,
                expected_h,
                actual_w,
                actual_h,
            });
        }
        Ok(TileGrid { tiles: terrain.tiles, width: actual_w, height: actual_h })
    }

    #[inline] pub fn width(&self) -> usize { self.width }
    #[inline] pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Tile at `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn tile_at(&self, x: i32, y: i32) -> Option<Tile> {
        if self.in_bounds(x, y) {
            Some(self.tiles[y as usize][x as usize])
        } else {
            None
        }
    }

    /// Out of bounds counts as solid.
    #[inline]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).map_or(true, Tile::is_solid)
    }

    /// Broad phase: every tile that could touch `aabb`, padded by one tile
    /// on each side. Not clamped, so out-of-bounds cells show up and act
    /// as walls when tested with `is_solid`.
    pub fn tiles_overlapping(&self, aabb: &Aabb) -> TileRange {
        TileRange {
            x0: aabb.left().div_euclid(TILE_SIZE) - 1,
            x1: aabb.right().div_euclid(TILE_SIZE) + 1,
            y0: aabb.top().div_euclid(TILE_SIZE) - 1,
            y1: aabb.bottom().div_euclid(TILE_SIZE) + 1,
        }
    }

    /// Does `aabb` overlap any solid tile?
    pub fn overlaps_solid(&self, aabb: &Aabb) -> bool {
        self.tiles_overlapping(aabb)
            .cells()
            .any(|(tx, ty)| self.is_solid(tx, ty) && aabb.intersects(&Aabb::tile_rect(tx, ty)))
    }

    /// Clear a removable tile, returning what was there.
    /// Bedrock, Empty and out-of-bounds cells are left untouched.
    pub fn remove_tile(&mut self, x: i32, y: i32) -> Option<Tile> {
        let tile = self.tile_at(x, y)?;
        if !tile.is_removable() {
            return None;
        }
        self.tiles[y as usize][x as usize] = Tile::Empty;
        Some(tile)
    }

    /// First solid row in column `x`, scanning from the top.
    pub fn surface_row(&self, x: i32) -> Option<i32> {
        if x < 0 || x as usize >= self.width {
            return None;
        }
        (0..self.height as i32).find(|&y| self.is_solid(x, y))
    }
}

#[cfg(test)]
impl TileGrid {
    /// Build a grid from a diagram, one string per row.
    ///
    /// `.` empty, `g` grass, `d` dirt, `#` stone, `c` coal, `o` copper,
    /// `i` iron, `$` gold, `e` emerald, `*` diamond, `B` bedrock.
    pub fn from_diagram(rows: &[&str]) -> Self {
        let tiles: Vec<Vec<Tile>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| match ch {
                        'g' => Tile::Grass,
                        'd' => Tile::Dirt,
                        '#' => Tile::Stone,
                        'c' => Tile::Coal,
                        'o' => Tile::Copper,
                        'i' => Tile::Iron,
                        '$' => Tile::Gold,
                        'e' => Tile::Emerald,
                        '*' => Tile::Diamond,
                        'B' => Tile::Bedrock,
                        _ => Tile::Empty,
                    })
                    .collect()
            })
            .collect();
        let height = tiles.len();
        let width = tiles[0].len();
        TileGrid { tiles, width, height }
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        if self.in_bounds(x, y) {
            self.tiles[y as usize][x as usize] = tile;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terrain(w: usize, h: usize) -> Terrain {
        Terrain {
            width: w,
            height: h,
            surface_level: 0,
            tiles: vec![vec![Tile::Empty; w]; h],
            dirt_depths: vec![0; w],
        }
    }

    #[test]
    fn dimension_mismatch_fails_fast() {
        let err = TileGrid::from_terrain(terrain(4, 3), 5, 3).unwrap_err();
        assert_eq!(
            err,
            WorldError::DimensionMismatch { expected_w: 5, expected_h: 3, actual_w: 4, actual_h: 3 }
        );
    }

    #[test]
    fn matching_dimensions_accepted() {
        let grid = TileGrid::from_terrain(terrain(4, 3), 4, 3).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 3));
    }

    #[test]
    fn out_of_bounds_is_solid() {
        let grid = TileGrid::from_diagram(&["..", ".."]);
        assert!(!grid.is_solid(0, 0));
        assert!(grid.is_solid(-1, 0));
        assert!(grid.is_solid(2, 0));
        assert!(grid.is_solid(0, -1));
        assert!(grid.is_solid(0, 2));
    }

    #[test]
    fn overlapping_range_pads_one_tile() {
        let grid = TileGrid::from_diagram(&["...."]);
        let r = grid.tiles_overlapping(&Aabb::new(32, 32, 16, 32));
        assert_eq!(r, TileRange { x0: 0, x1: 2, y0: 0, y1: 3 });
    }

    #[test]
    fn overlapping_range_not_clamped() {
        let grid = TileGrid::from_diagram(&["...."]);
        let r = grid.tiles_overlapping(&Aabb::new(0, 0, 16, 32));
        assert_eq!((r.x0, r.y0), (-1, -1));
        assert!(r.cells().any(|(x, y)| x == -1 && y == 0));
    }

    #[test]
    fn remove_tile_skips_bedrock_and_empty() {
        let mut grid = TileGrid::from_diagram(&["#.", "BB"]);
        assert_eq!(grid.remove_tile(0, 1), None);
        assert_eq!(grid.tile_at(0, 1), Some(Tile::Bedrock));
        assert_eq!(grid.remove_tile(1, 0), None);
        assert_eq!(grid.remove_tile(9, 9), None);
        assert_eq!(grid.remove_tile(0, 0), Some(Tile::Stone));
        assert_eq!(grid.tile_at(0, 0), Some(Tile::Empty));
    }

    #[test]
    fn overlap_uses_strict_edges() {
        let grid = TileGrid::from_diagram(&["..", "##"]);
        // Feet exactly on the floor's top edge: touching, not overlapping.
        assert!(!grid.overlaps_solid(&Aabb::new(8, 0, 16, 32)));
        assert!(grid.overlaps_solid(&Aabb::new(8, 1, 16, 32)));
    }

    #[test]
    fn surface_row_finds_first_solid() {
        let grid = TileGrid::from_diagram(&["..", ".g", "dd"]);
        assert_eq!(grid.surface_row(0), Some(2));
        assert_eq!(grid.surface_row(1), Some(1));
        assert_eq!(grid.surface_row(5), None);
    }

    #[test]
    fn center_tile_floors_negative() {
        let b = Aabb::new(-20, 0, 16, 32);
        assert_eq!(b.center_tile(), (-1, 0));
    }
}
