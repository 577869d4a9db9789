/// Blast propagation — the bomb's cross-shaped explosion.
///
/// Rays are cast independently in the four cardinal directions, one tile
/// per step, up to the blast radius. Per-step rules:
///
/// ┌──────────────────────┬────────────┬───────────────────────────────┐
/// │ Tile at the cell      │ Blast cell?│ Effect                        │
/// ├──────────────────────┼────────────┼───────────────────────────────┤
/// │ Concrete / Edge       │ no         │ ray stops                     │
/// │ BrickTwo              │ yes        │ downgrade to BrickOne (new    │
/// │                       │            │ hidden-bomb roll), ray stops  │
/// │ BrickOne, hidden bomb │ yes        │ wall removed, chain bomb      │
/// │                       │            │ registered, ray stops         │
/// │ BrickOne              │ yes        │ wall removed, ray stops       │
/// │ ItemBrick             │ yes        │ wall removed, item revealed,  │
/// │                       │            │ ray continues                 │
/// │ Open                  │ yes        │ ray continues                 │
/// └──────────────────────┴────────────┴───────────────────────────────┘
///
/// The origin cell is always part of the blast. Chain bombs carry a
/// reduced radius (`max(radius - 1, 1)`) and live in the level-wide
/// registry, not the triggering player's list.

use rand::rngs::StdRng;
use rand::Rng;

use super::entity::ItemKind;
use super::physics::{tile_at, Vec2};
use super::tile::{Tile, TileKind};

const DIRS: [Vec2; 4] = [
    Vec2 { x: 1, y: 0 },
    Vec2 { x: -1, y: 0 },
    Vec2 { x: 0, y: 1 },
    Vec2 { x: 0, y: -1 },
];

/// Everything one explosion did to the grid.
#[derive(Debug, Default)]
pub struct BlastResult {
    /// Cells affected by the blast, origin first.
    pub cells: Vec<Vec2>,
    /// Cells where a buried bomb was uncovered — a chain bomb must be
    /// armed at each.
    pub chain_origins: Vec<Vec2>,
    /// Items uncovered from ItemBrick walls.
    pub revealed_items: Vec<(Vec2, ItemKind)>,
    /// Walls downgraded BrickTwo → BrickOne.
    pub downgraded: Vec<Vec2>,
    /// Walls removed outright.
    pub destroyed: Vec<Vec2>,
}

/// Reduced radius for a chain bomb uncovered by a parent of `radius`.
pub fn chain_radius(radius: u32) -> u32 {
    radius.saturating_sub(1).max(1)
}

/// Compute the blast of a bomb at `origin` and apply every wall mutation
/// to the grid. Each direction stops at the first tile the table above
/// marks as terminal, so a ray never reaches past an indestructible wall
/// and never destroys two stacked bricks in one explosion.
pub fn propagate(
    tiles: &mut [Vec<Tile>],
    width: usize,
    height: usize,
    origin: Vec2,
    radius: u32,
    hidden_bomb_chance: f64,
    rng: &mut StdRng,
) -> BlastResult {
    debug_assert!(radius >= 1, "blast radius must be positive");

    let mut result = BlastResult::default();
    result.cells.push(origin);

    for dir in DIRS {
        for step in 1..=radius as i32 {
            let cell = Vec2::new(origin.x + dir.x * step, origin.y + dir.y * step);
            let tile = tile_at(tiles, width, height, cell);

            match tile.kind {
                TileKind::Concrete | TileKind::Edge => break,

                TileKind::BrickTwo => {
                    let spot = &mut tiles[cell.y as usize][cell.x as usize];
                    spot.kind = TileKind::BrickOne;
                    spot.hidden_bomb = rng.gen_bool(hidden_bomb_chance);
                    result.cells.push(cell);
                    result.downgraded.push(cell);
                    break;
                }

                TileKind::BrickOne => {
                    let spot = &mut tiles[cell.y as usize][cell.x as usize];
                    let buried = spot.hidden_bomb;
                    spot.kind = TileKind::Open;
                    spot.hidden_bomb = false;
                    result.cells.push(cell);
                    result.destroyed.push(cell);
                    if buried {
                        result.chain_origins.push(cell);
                    }
                    break;
                }

                TileKind::ItemBrick => {
                    let spot = &mut tiles[cell.y as usize][cell.x as usize];
                    let item = spot.hidden_item.take().unwrap_or(ItemKind::ExtraTime);
                    spot.kind = TileKind::Open;
                    result.cells.push(cell);
                    result.destroyed.push(cell);
                    result.revealed_items.push((cell, item));
                    // Item walls don't absorb the blast
                }

                TileKind::Open => {
                    result.cells.push(cell);
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn grid_from(rows: &[&str]) -> (Vec<Vec<Tile>>, usize, usize) {
        let h = rows.len();
        let w = rows[0].len();
        let mut tiles = vec![vec![Tile::default(); w]; h];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                tiles[y][x] = Tile::new(match ch {
                    'X' => TileKind::Concrete,
                    '#' => TileKind::Edge,
                    '1' => TileKind::BrickOne,
                    '2' => TileKind::BrickTwo,
                    'I' => TileKind::ItemBrick,
                    _ => TileKind::Open,
                });
            }
        }
        (tiles, w, h)
    }

    #[test]
    fn blast_contained_by_radius() {
        let (mut tiles, w, h) = grid_from(&[
            "         ",
            "         ",
            "         ",
        ]);
        let r = propagate(&mut tiles, w, h, Vec2::new(4, 1), 2, 0.0, &mut rng());

        // Origin + up to radius cells per direction
        assert!(r.cells.len() <= 4 * 2 + 1);
        for c in &r.cells {
            assert!((c.x - 4).abs() + (c.y - 1).abs() <= 2);
            // Cross shape only
            assert!(c.x == 4 || c.y == 1);
        }
    }

    #[test]
    fn ray_stops_at_concrete() {
        let (mut tiles, w, h) = grid_from(&["  X   "]);
        let r = propagate(&mut tiles, w, h, Vec2::new(1, 0), 3, 0.0, &mut rng());

        // Right ray blocked immediately by the wall at x=2
        assert!(!r.cells.contains(&Vec2::new(2, 0)));
        assert!(!r.cells.contains(&Vec2::new(3, 0)));
        // Wall untouched
        assert_eq!(tiles[0][2].kind, TileKind::Concrete);
    }

    #[test]
    fn adjacent_concrete_limits_ray_to_origin() {
        let (mut tiles, w, h) = grid_from(&["X X"]);
        let r = propagate(&mut tiles, w, h, Vec2::new(1, 0), 2, 0.0, &mut rng());
        let on_row: Vec<_> = r.cells.iter().filter(|c| c.y == 0).collect();
        assert_eq!(on_row.len(), 1); // just the origin
    }

    #[test]
    fn brick_two_downgrades_and_stops_ray() {
        let (mut tiles, w, h) = grid_from(&[" 2  "]);
        let r = propagate(&mut tiles, w, h, Vec2::new(0, 0), 3, 0.0, &mut rng());

        assert_eq!(tiles[0][1].kind, TileKind::BrickOne);
        assert!(r.cells.contains(&Vec2::new(1, 0)));
        assert!(!r.cells.contains(&Vec2::new(2, 0))); // nothing past the brick
        assert_eq!(r.downgraded, vec![Vec2::new(1, 0)]);
    }

    #[test]
    fn downgrade_is_monotone() {
        let (mut tiles, w, h) = grid_from(&[" 2"]);
        propagate(&mut tiles, w, h, Vec2::new(0, 0), 1, 0.0, &mut rng());
        assert_eq!(tiles[0][1].kind, TileKind::BrickOne);
        propagate(&mut tiles, w, h, Vec2::new(0, 0), 1, 0.0, &mut rng());
        assert_eq!(tiles[0][1].kind, TileKind::Open);
    }

    #[test]
    fn brick_one_destroyed_stops_ray() {
        let (mut tiles, w, h) = grid_from(&[" 11"]);
        let r = propagate(&mut tiles, w, h, Vec2::new(0, 0), 2, 0.0, &mut rng());

        assert_eq!(tiles[0][1].kind, TileKind::Open);
        assert_eq!(tiles[0][2].kind, TileKind::BrickOne); // shielded by the first
        assert_eq!(r.destroyed, vec![Vec2::new(1, 0)]);
        assert!(r.chain_origins.is_empty());
    }

    #[test]
    fn buried_bomb_becomes_chain_origin() {
        let (mut tiles, w, h) = grid_from(&[" 1 "]);
        tiles[0][1].hidden_bomb = true;
        let r = propagate(&mut tiles, w, h, Vec2::new(0, 0), 2, 0.0, &mut rng());

        assert_eq!(r.chain_origins, vec![Vec2::new(1, 0)]);
        assert_eq!(tiles[0][1].kind, TileKind::Open);
        assert!(!tiles[0][1].hidden_bomb);
    }

    #[test]
    fn item_brick_reveals_and_ray_continues() {
        let (mut tiles, w, h) = grid_from(&[" I1"]);
        tiles[0][1].hidden_item = Some(ItemKind::Skate);
        let r = propagate(&mut tiles, w, h, Vec2::new(0, 0), 2, 0.0, &mut rng());

        assert_eq!(r.revealed_items, vec![(Vec2::new(1, 0), ItemKind::Skate)]);
        assert_eq!(tiles[0][1].kind, TileKind::Open);
        // Ray kept going and took the brick behind
        assert_eq!(tiles[0][2].kind, TileKind::Open);
    }

    #[test]
    fn chain_radius_is_reduced_but_positive() {
        assert_eq!(chain_radius(3), 2);
        assert_eq!(chain_radius(1), 1);
    }
}
