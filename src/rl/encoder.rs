/// Observation encoding — level state as fixed-size numeric vectors.
///
/// The grid channel flattens the world-frame map into composite cell
/// ids (tile category overlaid with whoever stands there), zero-padded
/// to `MAX_GRID_CELLS` so every map size produces the same observation
/// length. Auxiliary channels carry entity coordinates in world cells;
/// fixed-size slots are padded with the `(0, 0)` sentinel — the border
/// row, which can never hold an entity.

use crate::domain::physics::Vec2;
use crate::domain::tile::TileKind;
use crate::sim::level::Level;

/// Fixed length of the flattened grid channel (13 x 32, the standard
/// map size; larger maps are rejected by `fits`, smaller ones padded).
pub const MAX_GRID_CELLS: usize = 416;

/// Fixed number of enemy coordinate slots.
pub const ENEMY_SLOTS: usize = 3;

/// Sentinel coordinate for empty entity slots.
pub const SENTINEL: [i32; 2] = [0, 0];

// Composite cell ids. Entities override terrain; overlaps get their own
// ids so a policy can tell "player standing on a bomb" from either.
pub const ID_OPEN: u8 = 0;
pub const ID_CONCRETE: u8 = 1;
pub const ID_BRICK_ONE: u8 = 2;
pub const ID_BRICK_TWO: u8 = 3;
pub const ID_PLAYER: u8 = 4;
pub const ID_ITEM: u8 = 5;
pub const ID_ENEMY: u8 = 6;
pub const ID_EDGE: u8 = 9;
pub const ID_BOMB: u8 = 10;
pub const ID_PLAYER_BOMB: u8 = 11;
pub const ID_EXPLOSION: u8 = 12;
pub const ID_EXPLOSION_PLAYER: u8 = 13;
pub const ID_PLAYER_BOMB_EXPLOSION: u8 = 14;
pub const ID_PLAYER_ENEMY: u8 = 15;

/// One complete observation. Coordinates are world cells — camera
/// scroll never leaks in here.
#[derive(Clone, Debug)]
pub struct Observation {
    /// Flattened composite grid, row-major, zero-padded.
    pub grid: Vec<u8>,
    pub player_cell: [i32; 2],
    pub gateway_cell: [i32; 2],
    pub enemy_count: u32,
    /// Live enemies first (spawn order), then sentinel pairs.
    pub enemy_cells: [[i32; 2]; ENEMY_SLOTS],
    pub bomb_present: bool,
    /// First bomb's cell, sentinel when no bomb is in the map.
    pub bomb_cell: [i32; 2],
    pub explosion_present: bool,
    /// Blast cells of every lingering explosion.
    pub explosion_cells: Vec<[i32; 2]>,
    /// Can the player place a bomb right now?
    pub can_bomb: bool,
    pub player_idle: bool,
}

/// Does this level fit the fixed grid channel?
pub fn fits(level: &Level) -> bool {
    level.width * level.height <= MAX_GRID_CELLS
}

pub fn encode(level: &Level) -> Observation {
    let mut grid = vec![ID_OPEN; MAX_GRID_CELLS];
    let width = level.width;

    for (y, row) in level.tiles.iter().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            let index = y * width + x;
            if index >= MAX_GRID_CELLS {
                break;
            }
            grid[index] = match tile.kind {
                TileKind::Open => ID_OPEN,
                TileKind::Concrete => ID_CONCRETE,
                TileKind::BrickOne => ID_BRICK_ONE,
                TileKind::BrickTwo => ID_BRICK_TWO,
                // Concealed items read as plain bricks until destroyed
                TileKind::ItemBrick => ID_BRICK_ONE,
                TileKind::Edge => ID_EDGE,
            };
        }
    }

    let mut set = |cell: Vec2, id: u8| {
        if cell.x < 0 || cell.y < 0 {
            return;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x >= width || y >= level.height {
            return;
        }
        let index = y * width + x;
        if index < MAX_GRID_CELLS {
            grid[index] = id;
        }
    };

    for (cell, _) in level.item_world_cells() {
        set(cell, ID_ITEM);
    }
    for cell in level.bomb_world_cells() {
        set(cell, ID_BOMB);
    }
    let explosion_world = level.explosion_world_cells();
    for &cell in &explosion_world {
        set(cell, ID_EXPLOSION);
    }

    let enemy_world = level.enemy_world_cells();
    for &cell in &enemy_world {
        set(cell, ID_ENEMY);
    }

    // Player last: composite ids by what already occupies the cell
    let player = level.player_world_cell();
    let bombs = level.bomb_world_cells();
    let on_bomb = bombs.contains(&player);
    let on_explosion = explosion_world.contains(&player);
    let on_enemy = enemy_world.contains(&player);
    let player_id = match (on_bomb, on_explosion, on_enemy) {
        (true, true, _) => ID_PLAYER_BOMB_EXPLOSION,
        (true, false, _) => ID_PLAYER_BOMB,
        (false, true, _) => ID_EXPLOSION_PLAYER,
        (false, false, true) => ID_PLAYER_ENEMY,
        (false, false, false) => ID_PLAYER,
    };
    set(player, player_id);

    let mut enemy_cells = [SENTINEL; ENEMY_SLOTS];
    for (slot, cell) in enemy_world.iter().take(ENEMY_SLOTS).enumerate() {
        enemy_cells[slot] = [cell.x, cell.y];
    }

    let bomb_cell = bombs.first().map_or(SENTINEL, |c| [c.x, c.y]);

    Observation {
        grid,
        player_cell: [player.x, player.y],
        gateway_cell: [level.gateway_cell.x, level.gateway_cell.y],
        enemy_count: level.enemy_count() as u32,
        enemy_cells,
        bomb_present: !bombs.is_empty(),
        bomb_cell,
        explosion_present: !explosion_world.is_empty(),
        explosion_cells: explosion_world.iter().map(|c| [c.x, c.y]).collect(),
        can_bomb: level.can_place_bomb(),
        player_idle: level.player_idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::FrameInput;
    use crate::sim::level::Level;
    use crate::sim::map;

    fn def_from(rows: &[&str]) -> map::LevelDef {
        let token_rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        ' ' => String::new(),
                        '1' => "D_1".to_string(),
                        '2' => "D_2".to_string(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        map::parse_tokens("test", &token_rows).unwrap()
    }

    fn test_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.rules.hidden_bomb_chance = 0.0;
        config.rules.enemy_count = 0;
        config
    }

    fn test_level() -> Level {
        let def = def_from(&[
            "########",
            "#P E  G#",
            "#1 2   #",
            "########",
        ]);
        Level::new(&def, &test_config(), 1).unwrap()
    }

    #[test]
    fn grid_is_fixed_length_and_padded() {
        let level = test_level();
        let obs = encode(&level);
        assert_eq!(obs.grid.len(), MAX_GRID_CELLS);
        // Cells past the 8x4 map stay zero
        assert!(obs.grid[8 * 4..].iter().all(|&c| c == ID_OPEN));
    }

    #[test]
    fn terrain_and_entities_compose() {
        let level = test_level();
        let obs = encode(&level);
        let at = |x: usize, y: usize| obs.grid[y * 8 + x];

        assert_eq!(at(0, 0), ID_EDGE);
        assert_eq!(at(1, 1), ID_PLAYER);
        assert_eq!(at(3, 1), ID_ENEMY);
        assert_eq!(at(1, 2), ID_BRICK_ONE);
        assert_eq!(at(3, 2), ID_BRICK_TWO);
        assert_eq!(at(2, 1), ID_OPEN);
    }

    #[test]
    fn enemy_slots_pad_with_sentinels() {
        let level = test_level();
        let obs = encode(&level);

        // 1 live enemy: one real pair, then sentinel pairs.
        assert_eq!(obs.enemy_count, 1);
        assert_eq!(obs.enemy_cells[0], [3, 1]);
        assert_eq!(obs.enemy_cells[1], SENTINEL);
        assert_eq!(obs.enemy_cells[2], SENTINEL);
    }

    #[test]
    fn bomb_and_composite_player_ids() {
        let mut level = test_level();
        level.player.invincible_timer = u32::MAX;
        level.tick(FrameInput { movement: None, place_bomb: true });

        let obs = encode(&level);
        // Player stands on their own bomb
        assert_eq!(obs.grid[1 * 8 + 1], ID_PLAYER_BOMB);
        assert!(obs.bomb_present);
        assert_eq!(obs.bomb_cell, [1, 1]);
        assert!(!obs.can_bomb); // limit 1, one bomb armed
    }

    #[test]
    fn explosion_cells_appear_after_fuse() {
        let mut level = test_level();
        level.player.invincible_timer = u32::MAX;
        level.tick(FrameInput { movement: None, place_bomb: true });
        for _ in 0..GameConfig::default().timing.fuse_ticks {
            level.tick(FrameInput::IDLE);
        }

        let obs = encode(&level);
        assert!(obs.explosion_present);
        assert!(obs.explosion_cells.contains(&[1, 1]));
        // The lingering bomb still occupies the cell with the player
        // and its explosion
        assert_eq!(obs.grid[1 * 8 + 1], ID_PLAYER_BOMB_EXPLOSION);
    }

    #[test]
    fn observation_is_scroll_invariant() {
        let level = test_level();
        let before = encode(&level);

        let mut level = test_level();
        // Force a camera offset without moving anything in world space
        level.camera.total_shift = crate::domain::physics::Vec2::new(-96, 0);
        let mut shifted = level;
        for enemy in &mut shifted.enemies {
            enemy.rect.translate(crate::domain::physics::Vec2::new(-96, 0));
        }
        shifted.player.rect.translate(crate::domain::physics::Vec2::new(-96, 0));

        let after = encode(&shifted);
        assert_eq!(before.grid, after.grid);
        assert_eq!(before.player_cell, after.player_cell);
        assert_eq!(before.enemy_cells, after.enemy_cells);
    }
}
