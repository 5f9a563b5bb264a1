//! Procedural terrain.
//!
//! Column layout, top to bottom:
//!
//! ```text
//!   rows < surface            Empty (sky)
//!   row == surface            Grass
//!   next `depth[x]` rows      Dirt
//!   down to height - 2        Stone, or an ore picked by normalized depth
//!   row == height - 1         Bedrock
//! ```
//!
//! `depth[x]` comes from a bounded random walk smoothed with a 3-point
//! average, so neighbouring columns never differ by more than one row.
//! Output is a pure function of the seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tile::Tile;

pub const DIRT_DEPTH_MIN: i32 = 8;
pub const DIRT_DEPTH_MAX: i32 = 15;

/// Cumulative step thresholds for the depth walk: -1, 0, +1.
const WALK_DOWN_P: f32 = 0.25;
const WALK_STAY_P: f32 = 0.50;

#[derive(Clone, Copy, Debug)]
enum OreCurve {
    /// Probability used as-is once the depth threshold is met.
    Flat,
    /// Probability scaled by `(1 - nd)^2`, common near the top.
    Shallow,
}

/// Ore rules in the order they are tested. The first hit wins, which
/// makes the later entries rarer than their raw probability suggests.
const ORE_TABLE: [(Tile, f32, f32, OreCurve); 6] = [
    // tile,          min nd, p,     curve
    (Tile::Diamond,   0.75,   0.006, OreCurve::Flat),
    (Tile::Emerald,   0.60,   0.010, OreCurve::Flat),
    (Tile::Gold,      0.45,   0.015, OreCurve::Flat),
    (Tile::Iron,      0.20,   0.030, OreCurve::Flat),
    (Tile::Copper,    0.0,    0.060, OreCurve::Shallow),
    (Tile::Coal,      0.0,    0.090, OreCurve::Shallow),
];

/// Generated world, before it becomes a `TileGrid`.
#[derive(Clone, Debug)]
pub struct Terrain {
    pub width: usize,
    pub height: usize,
    pub surface_level: usize,
    /// `tiles[y][x]`
    pub tiles: Vec<Vec<Tile>>,
    /// Smoothed dirt rows per column.
    pub dirt_depths: Vec<i32>,
}

#[derive(Clone, Copy, Debug)]
pub struct TerrainGenerator {
    pub width: usize,
    pub height: usize,
    pub surface_level: usize,
}

impl TerrainGenerator {
    pub fn new(width: usize, height: usize, surface_level: usize) -> Self {
        TerrainGenerator { width, height, surface_level }
    }

    pub fn generate(&self, seed: u64) -> Terrain {
        let mut rng = StdRng::seed_from_u64(seed);
        let (w, h) = (self.width, self.height);
        let surface = self.surface_level as i32;
        let bedrock_row = h as i32 - 1;

        let dirt_depths = smooth(&depth_walk(&mut rng, w));
        let mut tiles = vec![vec![Tile::Empty; w]; h];

        for x in 0..w {
            if surface < bedrock_row {
                tiles[surface as usize][x] = Tile::Grass;
            }

            let stone_start = surface + 1 + dirt_depths[x];
            for y in (surface + 1)..stone_start.min(bedrock_row) {
                tiles[y as usize][x] = Tile::Dirt;
            }

            let span = (bedrock_row - stone_start) as f32;
            for y in stone_start.max(surface + 1)..bedrock_row {
                let nd = if span > 0.0 { (y - stone_start) as f32 / span } else { 0.0 };
                tiles[y as usize][x] = pick_stone(&mut rng, nd);
            }

            if h > 0 {
                tiles[bedrock_row as usize][x] = Tile::Bedrock;
            }
        }

        log::debug!("terrain generated: {w}x{h}, seed {seed}");

        Terrain { width: w, height: h, surface_level: self.surface_level, tiles, dirt_depths }
    }
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn depth_walk(rng: &mut StdRng, width: usize) -> Vec<i32> {
    let mut depths = Vec::with_capacity(width);
    if width == 0 {
        return depths;
    }
    let mut d = rng.gen_range(DIRT_DEPTH_MIN..=DIRT_DEPTH_MAX);
    depths.push(d);
    for _ in 1..width {
        let r: f32 = rng.gen();
        let step = if r < WALK_DOWN_P {
            -1
        } else if r < WALK_DOWN_P + WALK_STAY_P {
            0
        } else {
            1
        };
        d = (d + step).clamp(DIRT_DEPTH_MIN, DIRT_DEPTH_MAX);
        depths.push(d);
    }
    depths
}

/// 3-point moving average with edge replication, rounded.
fn smooth(raw: &[i32]) -> Vec<i32> {
    let n = raw.len();
    (0..n)
        .map(|i| {
            let prev = raw[i.saturating_sub(1)];
            let next = raw[(i + 1).min(n - 1)];
            ((prev + raw[i] + next) as f32 / 3.0).round() as i32
        })
        .collect()
}

fn pick_stone(rng: &mut StdRng, nd: f32) -> Tile {
    for (tile, min_nd, p, curve) in ORE_TABLE {
        if nd < min_nd {
            continue;
        }
        let chance = match curve {
            OreCurve::Flat => p,
            OreCurve::Shallow => p * (1.0 - nd).powi(2),
        };
        if rng.gen::<f32>() < chance {
            return tile;
        }
    }
    Tile::Stone
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_terrain(seed: u64) -> Terrain {
        TerrainGenerator::new(100, 100, 10).generate(seed)
    }

    #[test]
    fn same_seed_same_world() {
        let a = default_terrain(42);
        let b = default_terrain(42);
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.dirt_depths, b.dirt_depths);
    }

    #[test]
    fn bottom_row_is_bedrock() {
        let t = default_terrain(7);
        assert!(t.tiles[99].iter().all(|&tile| tile == Tile::Bedrock));
        let bedrock_elsewhere = t.tiles[..99].iter().flatten().any(|&tile| tile == Tile::Bedrock);
        assert!(!bedrock_elsewhere);
    }

    #[test]
    fn sky_and_grass_rows() {
        let t = default_terrain(3);
        for y in 0..10 {
            assert!(t.tiles[y].iter().all(|&tile| tile == Tile::Empty));
        }
        assert!(t.tiles[10].iter().all(|&tile| tile == Tile::Grass));
    }

    #[test]
    fn dirt_depth_is_smooth_and_bounded() {
        for seed in 0..20 {
            let t = default_terrain(seed);
            assert_eq!(t.dirt_depths.len(), 100);
            for &d in &t.dirt_depths {
                assert!((DIRT_DEPTH_MIN..=DIRT_DEPTH_MAX).contains(&d), "seed {seed}: {d}");
            }
            for pair in t.dirt_depths.windows(2) {
                assert!((pair[0] - pair[1]).abs() <= 1, "seed {seed}: {pair:?}");
            }
        }
    }

    #[test]
    fn columns_follow_depth_profile() {
        let t = default_terrain(11);
        for x in 0..100 {
            let stone_start = 11 + t.dirt_depths[x] as usize;
            for y in 11..stone_start {
                assert_eq!(t.tiles[y][x], Tile::Dirt, "({x},{y})");
            }
            for y in stone_start..99 {
                let tile = t.tiles[y][x];
                assert!(tile.class() == Some(crate::domain::tile::TileClass::Hard), "({x},{y}) {tile:?}");
            }
        }
    }

    #[test]
    fn deep_ores_respect_depth_thresholds() {
        for seed in 0..5 {
            let t = default_terrain(seed);
            for x in 0..100 {
                let stone_start = 11 + t.dirt_depths[x];
                let span = (99 - stone_start) as f32;
                for y in stone_start..99 {
                    let nd = (y - stone_start) as f32 / span;
                    match t.tiles[y as usize][x] {
                        Tile::Diamond => assert!(nd >= 0.75),
                        Tile::Emerald => assert!(nd >= 0.60),
                        Tile::Gold => assert!(nd >= 0.45),
                        Tile::Iron => assert!(nd >= 0.20),
                        _ => {}
                    }
                }
            }
        }
    }

    #[test]
    fn ores_do_appear() {
        let t = default_terrain(99);
        let ores = t.tiles.iter().flatten()
            .filter(|&&tile| matches!(tile, Tile::Coal | Tile::Copper))
            .count();
        assert!(ores > 0);
    }

    #[test]
    fn smoothing_replicates_edges() {
        assert_eq!(smooth(&[8, 9, 12]), vec![8, 10, 11]);
        assert_eq!(smooth(&[10]), vec![10]);
    }

    #[test]
    fn tiny_world_does_not_panic() {
        let t = TerrainGenerator::new(3, 4, 1).generate(1);
        assert_eq!(t.tiles[3], vec![Tile::Bedrock; 3]);
        assert_eq!(t.tiles[1], vec![Tile::Grass; 3]);
    }
}
