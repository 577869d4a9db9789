/// Level orchestrator: the complete state of a running level.
///
/// ## Ownership
///
/// The Level is the sole ownership root. It owns the tile grid, the
/// player (who owns the bombs they placed), the enemies, loose items,
/// the gateway, and the level-wide chain-bomb registry (bombs uncovered
/// from walls, which no player owns). Entities never hold references
/// back to the Level.
///
/// ## Tick order (fixed — every sub-step runs every tick)
///
///   1. apply input to the player (direction, bomb placement)
///   2. resolve player movement + camera shift
///   3. advance bombs: fuse, blast propagation, chain spawns, removal
///   4. recompute contact flags (enemy, explosion, item, gateway)
///   5. advance enemies: stagger deaths, patrol movement with bounce
///   6. spawn the gateway once the last enemy is gone
///
/// Win/lose is latched but never acted on here — the game loop or the
/// RL adapter reads `final_state()` and stops calling `tick`.
///
/// ## Camera
///
/// Entities live in screen space; the grid lives in world cells. When
/// the player pushes past the viewport's inset scroll boundary, their
/// screen motion is frozen and everything else translates the other
/// way. `camera.total_shift` accumulates those translations, so
///
///   world_px(entity) = entity.rect - camera.total_shift
///
/// holds regardless of how many scroll events occurred.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::{GameConfig, RulesConfig, TimingConfig};
use crate::domain::ai;
use crate::domain::blast;
use crate::domain::entity::{
    Bomb, BombTick, Enemy, Explosion, FrameInput, Gateway, Item, ItemKind, Player,
};
use crate::domain::pathfind;
use crate::domain::physics::{self, Rect, Vec2};
use crate::domain::tile::{Tile, TileKind};

use super::event::GameEvent;
use super::map::LevelDef;

/// Retry budget for random entity placement.
const PLACEMENT_ATTEMPTS: u32 = 64;

/// Random spawns keep at least this path-free distance from the player.
const SPAWN_CLEARANCE: i32 = 4;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no free cell found for {entity} after {attempts} attempts")]
    Placement { entity: &'static str, attempts: u32 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FinalState {
    Running,
    Win,
    Lose,
}

// ══════════════════════════════════════════════════════════════
// Camera
// ══════════════════════════════════════════════════════════════

/// Scroll state. `shift` is the translation applied to non-player
/// entities this tick; `total_shift` is the running sum since load.
/// Scrolling is clamped to the world: a map that fits the viewport
/// never scrolls, and a wide map stops panning at its far edge.
#[derive(Clone, Debug)]
pub struct Camera {
    pub shift: Vec2,
    pub total_shift: Vec2,
    view_px: Vec2,
    world_px: Vec2,
    margin_px: i32,
}

impl Camera {
    fn new(rules: &RulesConfig, width: usize, height: usize) -> Self {
        Camera {
            shift: Vec2::ZERO,
            total_shift: Vec2::ZERO,
            view_px: Vec2::new(
                rules.view_cols as i32 * physics::TILE_SIZE,
                rules.view_rows as i32 * physics::TILE_SIZE,
            ),
            world_px: Vec2::new(
                width as i32 * physics::TILE_SIZE,
                height as i32 * physics::TILE_SIZE,
            ),
            margin_px: rules.camera_margin as i32 * physics::TILE_SIZE,
        }
    }

    /// If this tick's movement pushed the player past the scroll
    /// boundary, take the overshoot back out of the player's screen
    /// rect and return it as the level shift. The clamp-back applies
    /// only as far as the world can still scroll, so the scrollable
    /// range of `total_shift` stays within [view - world, 0].
    fn scroll(&mut self, rect: &mut Rect, moved: Vec2) -> Vec2 {
        let mut shift = Vec2::ZERO;

        let left = self.margin_px;
        let right = self.view_px.x - self.margin_px - rect.w;
        let top = self.margin_px;
        let bottom = self.view_px.y - self.margin_px - rect.h;
        let min_shift_x = (self.view_px.x - self.world_px.x).min(0);
        let min_shift_y = (self.view_px.y - self.world_px.y).min(0);

        if moved.x < 0 && rect.x < left {
            let desired = (rect.x - moved.x).min(left) - rect.x;
            shift.x = desired.min(-self.total_shift.x).max(0);
        } else if moved.x > 0 && rect.x > right {
            let desired = (rect.x - moved.x).max(right) - rect.x;
            shift.x = desired.max(min_shift_x - self.total_shift.x).min(0);
        }

        if moved.y < 0 && rect.y < top {
            let desired = (rect.y - moved.y).min(top) - rect.y;
            shift.y = desired.min(-self.total_shift.y).max(0);
        } else if moved.y > 0 && rect.y > bottom {
            let desired = (rect.y - moved.y).max(bottom) - rect.y;
            shift.y = desired.max(min_shift_y - self.total_shift.y).min(0);
        }

        rect.translate(shift);
        self.shift = shift;
        self.total_shift = self.total_shift + shift;
        shift
    }
}

// ══════════════════════════════════════════════════════════════
// Level
// ══════════════════════════════════════════════════════════════

pub struct Level {
    // ── Grid ──
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub gateway: Option<Gateway>,
    /// World cell the gateway will appear at, fixed at load time.
    pub gateway_cell: Vec2,
    /// Bombs uncovered from walls — owned by the level, not the player.
    pub chain_bombs: Vec<Bomb>,

    // ── Camera ──
    pub camera: Camera,

    // ── Per-tick contact flags (recomputed every tick) ──
    pub player_hit_enemy: bool,
    pub player_hit_explosion: bool,
    pub player_hit_item: Option<ItemKind>,
    pub player_hit_gateway: bool,
    pub hit_wall_h: bool,
    pub hit_wall_v: bool,
    /// A blast landed on an enemy this tick.
    pub enemy_damage: bool,
    pub player_idle: bool,
    /// Player's world cell left the grid — the episode should truncate.
    pub out_of_bounds: bool,

    // ── Latched outcome ──
    won: bool,

    // ── Pending side effects for the game loop ──
    extra_time_secs: u32,

    // ── Meta ──
    pub tick: u64,
    rules: RulesConfig,
    timing: TimingConfig,
    rng: StdRng,
}

impl Level {
    /// Build a level from a parsed map. Hidden bombs and items are
    /// rolled here from the seeded RNG; entities without map markers
    /// get random placements (a bounded search — exhaustion is an
    /// error, never a silently conflicting spawn).
    pub fn new(def: &LevelDef, config: &GameConfig, seed: u64) -> Result<Level, LevelError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut tiles: Vec<Vec<Tile>> = def
            .tiles
            .iter()
            .map(|row| row.iter().map(|&kind| Tile::new(kind)).collect())
            .collect();
        for row in tiles.iter_mut() {
            for tile in row.iter_mut() {
                match tile.kind {
                    TileKind::BrickOne => {
                        tile.hidden_bomb = rng.gen_bool(config.rules.hidden_bomb_chance);
                    }
                    TileKind::ItemBrick => {
                        tile.hidden_item = Some(roll_item(&mut rng));
                    }
                    _ => {}
                }
            }
        }

        let mut player = Player::new(def.player_spawn);
        player.base_speed = config.rules.player_speed;
        player.skate_boost = config.rules.skate_boost;
        player.bomb_limit = config.rules.bomb_limit;
        player.bomb_radius = config.rules.bomb_radius.max(1);

        let mut taken = vec![def.player_spawn];

        let enemy_cells = if !def.enemy_spawns.is_empty() {
            def.enemy_spawns.clone()
        } else {
            let mut cells = vec![];
            for _ in 0..config.rules.enemy_count {
                let cell = random_open_cell(
                    &tiles, def.width, def.height,
                    def.player_spawn, &taken, &mut rng, "enemy",
                )?;
                taken.push(cell);
                cells.push(cell);
            }
            cells
        };
        let enemies = enemy_cells
            .iter()
            .map(|&cell| {
                Enemy::new(cell, config.rules.enemy_life, config.timing.enemy_cycle_ticks)
            })
            .collect();
        taken.extend_from_slice(&enemy_cells);

        let gateway_cell = match def.gateway_cell {
            Some(cell) => cell,
            None => random_open_cell(
                &tiles, def.width, def.height,
                def.player_spawn, &taken, &mut rng, "gateway",
            )?,
        };

        Ok(Level {
            tiles,
            width: def.width,
            height: def.height,
            player,
            enemies,
            items: vec![],
            gateway: None,
            gateway_cell,
            chain_bombs: vec![],
            camera: Camera::new(&config.rules, def.width, def.height),
            player_hit_enemy: false,
            player_hit_explosion: false,
            player_hit_item: None,
            player_hit_gateway: false,
            hit_wall_h: false,
            hit_wall_v: false,
            enemy_damage: false,
            player_idle: false,
            out_of_bounds: false,
            won: false,
            extra_time_secs: 0,
            tick: 0,
            rules: config.rules.clone(),
            timing: config.timing.clone(),
            rng,
        })
    }

    // ── Main entry point ──

    pub fn tick(&mut self, input: FrameInput) -> Vec<GameEvent> {
        self.tick += 1;
        self.clear_flags();

        let mut events = Vec::new();
        self.resolve_player_input(input, &mut events);
        self.resolve_player_movement(&mut events);
        self.resolve_bombs(&mut events);
        self.resolve_contacts(&mut events);
        self.resolve_enemies(&mut events);
        self.resolve_gateway(&mut events);

        events
    }

    /// Terminal outcome, latched once reached. The caller decides when
    /// to stop ticking; the orchestrator never halts itself.
    pub fn final_state(&self) -> FinalState {
        if !self.player.alive {
            FinalState::Lose
        } else if self.won {
            FinalState::Win
        } else {
            FinalState::Running
        }
    }

    fn clear_flags(&mut self) {
        self.player_hit_enemy = false;
        self.player_hit_explosion = false;
        self.player_hit_item = None;
        self.player_hit_gateway = false;
        self.hit_wall_h = false;
        self.hit_wall_v = false;
        self.enemy_damage = false;
        self.player_idle = false;
        self.camera.shift = Vec2::ZERO;
    }

    // ── 1. Input ──

    fn resolve_player_input(&mut self, input: FrameInput, events: &mut Vec<GameEvent>) {
        self.player.tick_effects();

        self.player.dir = match input.movement {
            Some(dir) if self.player.alive => dir.delta(),
            _ => Vec2::ZERO,
        };
        self.player_idle = input.movement.is_none();

        if input.place_bomb && self.player.alive && self.player.can_place_bomb() {
            let cell = self.player.rect.world_cell(self.camera.total_shift);
            let occupied = self
                .all_bombs()
                .any(|b| !b.exploded && b.rect.world_cell(self.camera.total_shift) == cell);
            if !occupied {
                self.player.bombs.push(Bomb::new(
                    cell,
                    self.player.bomb_radius,
                    self.timing.fuse_ticks,
                    self.timing.linger_ticks,
                    self.camera.total_shift,
                ));
                events.push(GameEvent::BombPlaced { cell });
            }
        }
        debug_assert!(
            self.player.armed_bombs() <= self.player.bomb_limit,
            "bomb list exceeds the owner's limit"
        );
    }

    // ── 2. Movement + camera ──

    fn resolve_player_movement(&mut self, _events: &mut Vec<GameEvent>) {
        if !self.player.alive {
            return;
        }
        let speed = self.player.speed();
        let delta = Vec2::new(self.player.dir.x * speed, self.player.dir.y * speed);
        if delta == Vec2::ZERO {
            return;
        }

        let outcome = physics::move_and_collide(
            &mut self.player.rect,
            delta,
            &self.tiles,
            self.width,
            self.height,
            self.camera.total_shift,
        );
        self.hit_wall_h = outcome.hit_wall_h;
        self.hit_wall_v = outcome.hit_wall_v;

        let shift = self.camera.scroll(&mut self.player.rect, outcome.moved);
        if shift != Vec2::ZERO {
            self.apply_shift(shift);
        }
    }

    /// Translate every non-player entity by the camera shift. Tiles
    /// need no touch-up: their screen rects are derived from
    /// `total_shift`, which the camera already advanced.
    fn apply_shift(&mut self, shift: Vec2) {
        for enemy in &mut self.enemies {
            enemy.rect.translate(shift);
        }
        for item in &mut self.items {
            item.rect.translate(shift);
        }
        if let Some(gateway) = &mut self.gateway {
            gateway.rect.translate(shift);
        }
        for bomb in self.player.bombs.iter_mut().chain(self.chain_bombs.iter_mut()) {
            bomb.rect.translate(shift);
            for explosion in &mut bomb.explosions {
                explosion.rect.translate(shift);
            }
        }
    }

    // ── 3. Bombs ──

    fn resolve_bombs(&mut self, events: &mut Vec<GameEvent>) {
        // Lists are taken out so blast propagation can borrow the level
        // mutably while the bombs advance.
        let mut player_bombs = std::mem::take(&mut self.player.bombs);
        let mut chain_bombs = std::mem::take(&mut self.chain_bombs);
        let mut new_chains = vec![];

        for bomb in player_bombs.iter_mut().chain(chain_bombs.iter_mut()) {
            if bomb.tick() == BombTick::JustExploded {
                self.detonate(bomb, &mut new_chains, events);
            }
        }

        player_bombs.retain(|b| !b.ended);
        chain_bombs.retain(|b| !b.ended);
        chain_bombs.append(&mut new_chains);

        self.player.bombs = player_bombs;
        self.chain_bombs = chain_bombs;
    }

    /// Fuse expiry: compute the blast, mutate the grid, materialize
    /// explosions, and arm any uncovered chain bombs.
    fn detonate(&mut self, bomb: &mut Bomb, new_chains: &mut Vec<Bomb>, events: &mut Vec<GameEvent>) {
        let shift = self.camera.total_shift;
        let origin = bomb.rect.world_cell(shift);

        let result = blast::propagate(
            &mut self.tiles,
            self.width,
            self.height,
            origin,
            bomb.radius,
            self.rules.hidden_bomb_chance,
            &mut self.rng,
        );

        events.push(GameEvent::BombExploded { cell: origin });
        for &cell in &result.destroyed {
            events.push(GameEvent::WallDestroyed { cell });
        }
        for &cell in &result.downgraded {
            events.push(GameEvent::WallDowngraded { cell });
        }
        for &(cell, kind) in &result.revealed_items {
            self.items.push(Item { rect: Rect::at_cell(cell, shift), kind });
            events.push(GameEvent::ItemRevealed { cell, kind });
        }
        for &cell in &result.chain_origins {
            new_chains.push(Bomb::new(
                cell,
                blast::chain_radius(bomb.radius),
                self.timing.fuse_ticks,
                self.timing.linger_ticks,
                shift,
            ));
            events.push(GameEvent::ChainBombArmed { cell });
        }

        bomb.explosions = result
            .cells
            .iter()
            .map(|&cell| Explosion { rect: Rect::at_cell(cell, shift) })
            .collect();
        bomb.blast_cells = result.cells;
    }

    // ── 4. Contact flags ──

    fn resolve_contacts(&mut self, events: &mut Vec<GameEvent>) {
        let blast_rects: Vec<Rect> = self.explosion_rects();

        if self.player.alive {
            let prect = self.player.rect;

            if !self.player.is_invincible() {
                if self.enemies.iter().any(|e| e.rect.intersects(&prect)) {
                    self.player_hit_enemy = true;
                }
                if blast_rects.iter().any(|r| r.intersects(&prect)) {
                    self.player_hit_explosion = true;
                }
            }

            if let Some(i) = self.items.iter().position(|it| it.rect.intersects(&prect)) {
                let item = self.items.remove(i);
                self.apply_item(item.kind, events);
            }

            if let Some(gateway) = &self.gateway {
                if gateway.rect.intersects(&prect) {
                    self.player_hit_gateway = true;
                    self.won = true;
                    events.push(GameEvent::GatewayReached);
                }
            }

            if self.player_hit_enemy || self.player_hit_explosion {
                self.player.alive = false;
                events.push(GameEvent::PlayerKilled);
            }
        }

        let stagger = self.timing.enemy_stagger_ticks;
        for enemy in &mut self.enemies {
            if enemy.is_staggered() {
                continue;
            }
            if blast_rects.iter().any(|r| r.intersects(&enemy.rect)) {
                enemy.stagger(stagger);
                self.enemy_damage = true;
                events.push(GameEvent::EnemyStaggered {
                    cell: enemy.rect.world_cell(self.camera.total_shift),
                });
            }
        }

        let cell = self.player.rect.world_cell(self.camera.total_shift);
        self.out_of_bounds = cell.x < 0
            || cell.y < 0
            || cell.x as usize >= self.width
            || cell.y as usize >= self.height;
    }

    fn apply_item(&mut self, kind: ItemKind, events: &mut Vec<GameEvent>) {
        match kind {
            ItemKind::Skate => self.player.skate_timer = self.timing.item_duration_ticks,
            ItemKind::Invincible => {
                self.player.invincible_timer = self.timing.item_duration_ticks
            }
            ItemKind::ExtraTime => self.extra_time_secs += self.timing.extra_time_secs,
        }
        self.player_hit_item = Some(kind);
        events.push(GameEvent::ItemPicked { kind });
    }

    // ── 5. Enemies ──

    fn resolve_enemies(&mut self, events: &mut Vec<GameEvent>) {
        let shift = self.camera.total_shift;

        // Stagger countdown; death once life and pause are both spent
        let mut i = 0;
        while i < self.enemies.len() {
            if self.enemies[i].pause > 0 {
                self.enemies[i].pause -= 1;
                if self.enemies[i].is_dead() {
                    let cell = self.enemies[i].rect.world_cell(shift);
                    self.enemies.remove(i);
                    events.push(GameEvent::EnemyKilled { cell });
                    continue;
                }
            }
            i += 1;
        }

        // Patrol movement: bounce on contact, no clamping
        for enemy in &mut self.enemies {
            let aligned = enemy.rect.is_cell_aligned(shift);
            ai::tick_cycle(enemy, self.timing.enemy_cycle_ticks, aligned);

            let delta = ai::steer(enemy, self.rules.enemy_speed);
            if delta == Vec2::ZERO {
                continue;
            }
            let mut tentative = enemy.rect;
            tentative.translate(delta);
            if physics::is_blocked(&tentative, &self.tiles, self.width, self.height, shift) {
                enemy.reverse();
            } else {
                enemy.rect = tentative;
            }
        }
    }

    // ── 6. Gateway ──

    fn resolve_gateway(&mut self, events: &mut Vec<GameEvent>) {
        if self.enemies.is_empty() && self.gateway.is_none() {
            let rect = Rect::at_cell(self.gateway_cell, self.camera.total_shift);
            self.gateway = Some(Gateway { rect });
            events.push(GameEvent::GatewaySpawned { cell: self.gateway_cell });
        }
    }

    // ══════════════════════════════════════════════════════════
    // Queries (used by the RL encoder, reward shaping, and the UI)
    // ══════════════════════════════════════════════════════════

    pub fn all_bombs(&self) -> impl Iterator<Item = &Bomb> {
        self.player.bombs.iter().chain(self.chain_bombs.iter())
    }

    fn explosion_rects(&self) -> Vec<Rect> {
        self.all_bombs()
            .flat_map(|b| b.explosions.iter().map(|e| e.rect))
            .collect()
    }

    pub fn player_world_cell(&self) -> Vec2 {
        self.player.rect.world_cell(self.camera.total_shift)
    }

    /// Live enemy world cells, in spawn order.
    pub fn enemy_world_cells(&self) -> Vec<Vec2> {
        self.enemies
            .iter()
            .map(|e| e.rect.world_cell(self.camera.total_shift))
            .collect()
    }

    pub fn item_world_cells(&self) -> Vec<(Vec2, ItemKind)> {
        self.items
            .iter()
            .map(|i| (i.rect.world_cell(self.camera.total_shift), i.kind))
            .collect()
    }

    pub fn bomb_world_cells(&self) -> Vec<Vec2> {
        self.all_bombs()
            .map(|b| b.rect.world_cell(self.camera.total_shift))
            .collect()
    }

    /// Blast cells of every currently lingering explosion.
    pub fn explosion_world_cells(&self) -> Vec<Vec2> {
        self.all_bombs()
            .filter(|b| b.exploded)
            .flat_map(|b| b.blast_cells.iter().copied())
            .collect()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn can_place_bomb(&self) -> bool {
        self.player.alive && self.player.can_place_bomb()
    }

    /// Is the player's cell inside the cross any armed bomb will cover?
    pub fn player_in_bomb_range(&self) -> bool {
        let player = self.player_world_cell();
        self.all_bombs().filter(|b| !b.exploded).any(|b| {
            let cell = b.rect.world_cell(self.camera.total_shift);
            let reach = b.radius as i32;
            (cell.x == player.x && (cell.y - player.y).abs() <= reach)
                || (cell.y == player.y && (cell.x - player.x).abs() <= reach)
        })
    }

    /// Manhattan distance (in cells) to the nearest bomb, armed or not.
    pub fn nearest_bomb_distance(&self) -> Option<i32> {
        let player = self.player_world_cell();
        self.bomb_world_cells()
            .iter()
            .map(|c| c.manhattan(player))
            .min()
    }

    /// Walkable path distances from the player to each live enemy.
    /// Unreachable enemies are skipped.
    pub fn enemy_path_distances(&self) -> Vec<u32> {
        let from = self.player_world_cell();
        self.enemy_world_cells()
            .iter()
            .filter_map(|&to| {
                pathfind::distance(&self.tiles, self.width, self.height, from, to)
            })
            .collect()
    }

    /// Seconds of ExtraTime collected since the last call. The game
    /// loop owns the level countdown, so it consumes this.
    pub fn take_extra_time(&mut self) -> u32 {
        std::mem::take(&mut self.extra_time_secs)
    }
}

// ── Random placement ──

fn roll_item(rng: &mut StdRng) -> ItemKind {
    match rng.gen_range(0..3) {
        0 => ItemKind::ExtraTime,
        1 => ItemKind::Skate,
        _ => ItemKind::Invincible,
    }
}

/// Draw a random open cell away from the player and any taken cell.
/// Exhausting the retry budget is a visible error — a conflicting
/// placement is never silently accepted.
fn random_open_cell(
    tiles: &[Vec<Tile>],
    width: usize,
    height: usize,
    player_spawn: Vec2,
    taken: &[Vec2],
    rng: &mut StdRng,
    entity: &'static str,
) -> Result<Vec2, LevelError> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let cell = Vec2::new(
            rng.gen_range(0..width as i32),
            rng.gen_range(0..height as i32),
        );
        if !physics::tile_at(tiles, width, height, cell).kind.is_passable() {
            continue;
        }
        if cell.manhattan(player_spawn) < SPAWN_CLEARANCE {
            continue;
        }
        if taken.contains(&cell) {
            continue;
        }
        return Ok(cell);
    }
    Err(LevelError::Placement { entity, attempts: PLACEMENT_ATTEMPTS })
}

// ══════════════════════════════════════════════════════════════
// Scenario tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::map::{self, LevelDef};

    /// Compact test maps: same single-character shorthand as the
    /// embedded levels.
    fn def_from(rows: &[&str]) -> LevelDef {
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

    /// Short timers so scenarios stay small: 2-tick fuse, 3-tick
    /// linger, 2-tick stagger. Deterministic: no hidden bombs.
    fn test_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.timing.fuse_ticks = 2;
        config.timing.linger_ticks = 3;
        config.timing.enemy_stagger_ticks = 2;
        config.rules.hidden_bomb_chance = 0.0;
        config.rules.enemy_count = 0;
        config
    }

    fn place_bomb() -> FrameInput {
        FrameInput { movement: None, place_bomb: true }
    }

    #[test]
    fn bomb_limit_never_exceeded() {
        let def = def_from(&[
            "#######",
            "#P   G#",
            "#######",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        level.player.bomb_limit = 2;

        for _ in 0..20 {
            level.tick(place_bomb());
            assert!(level.player.armed_bombs() <= 2);
        }
    }

    #[test]
    fn bomb_placement_rejected_at_limit() {
        let def = def_from(&[
            "#######",
            "#P   G#",
            "#######",
        ]);
        let mut config = test_config();
        config.timing.fuse_ticks = 50;
        config.timing.linger_ticks = 60;
        let mut level = Level::new(&def, &config, 1).unwrap();

        level.tick(place_bomb());
        assert_eq!(level.player.bombs.len(), 1);
        level.tick(place_bomb());
        assert_eq!(level.player.bombs.len(), 1); // limit 1 holds
    }

    #[test]
    fn chain_reaction_destroys_both_walls() {
        let def = def_from(&[
            "#######",
            "#P11 G#",
            "#######",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        level.player.bomb_radius = 2;
        level.tiles[1][2].hidden_bomb = true;

        // Tick 1: placed (fuse 2→1). Tick 2: parent explodes.
        level.tick(place_bomb());
        level.tick(FrameInput::IDLE);

        assert_eq!(level.tiles[1][2].kind, TileKind::Open, "first wall destroyed");
        assert_eq!(level.tiles[1][3].kind, TileKind::BrickOne, "second wall shielded");
        assert_eq!(level.chain_bombs.len(), 1, "buried bomb materialized");
        let chain_cell = level.chain_bombs[0].rect.world_cell(level.camera.total_shift);
        assert_eq!(chain_cell, Vec2::new(2, 1));

        // Chain bomb runs its own fuse: explodes two ticks later.
        level.tick(FrameInput::IDLE);
        level.tick(FrameInput::IDLE);
        assert_eq!(level.tiles[1][3].kind, TileKind::Open, "chain blast took the second wall");

        // Both bombs are eventually garbage collected from both lists.
        for _ in 0..4 {
            level.tick(FrameInput::IDLE);
        }
        assert!(level.player.bombs.is_empty());
        assert!(level.chain_bombs.is_empty());
    }

    #[test]
    fn enemy_defeat_spawns_gateway() {
        let def = def_from(&[
            "#######",
            "#P E G#",
            "#######",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        level.player.bomb_radius = 2;
        level.player.invincible_timer = u32::MAX;

        assert_eq!(level.enemy_count(), 1);
        assert!(level.gateway.is_none());

        level.tick(place_bomb());

        // Run until the blast lands, the stagger elapses, and the enemy
        // is removed. stagger=2 → removal two ticks after the hit.
        let mut killed_at = None;
        for t in 2..=8 {
            level.tick(FrameInput::IDLE);
            if level.enemy_count() == 0 && killed_at.is_none() {
                killed_at = Some(t);
                break;
            }
        }
        let killed_at = killed_at.expect("enemy should die from the blast");

        // Gateway appears in the same tick's spawn step, at its
        // pre-configured cell.
        let gateway = level.gateway.as_ref().expect("gateway spawned");
        assert_eq!(
            gateway.rect.world_cell(level.camera.total_shift),
            Vec2::new(5, 1)
        );
        assert!(killed_at > 2, "death must wait out the stagger pause");
    }

    #[test]
    fn explosion_kills_player() {
        let def = def_from(&[
            "#####",
            "#P G#",
            "#####",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();

        level.tick(place_bomb());
        assert_eq!(level.final_state(), FinalState::Running);
        level.tick(FrameInput::IDLE); // fuse expires on top of the player

        assert!(level.player_hit_explosion);
        assert_eq!(level.final_state(), FinalState::Lose);
    }

    #[test]
    fn invincible_player_survives_blast() {
        let def = def_from(&[
            "#####",
            "#P G#",
            "#####",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        level.player.invincible_timer = u32::MAX;

        level.tick(place_bomb());
        level.tick(FrameInput::IDLE);

        assert!(!level.player_hit_explosion);
        assert_eq!(level.final_state(), FinalState::Running);
    }

    #[test]
    fn coordinate_duality_under_scroll() {
        // 40-column corridor, 24-column viewport: running right must
        // scroll. World position stays spawn + applied displacement.
        let mut rows = vec![String::new(); 3];
        rows[0] = "#".repeat(40);
        rows[1] = format!("#P{}G#", " ".repeat(36));
        rows[2] = "#".repeat(40);
        let row_refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let def = def_from(&row_refs);

        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        let speed = level.player.speed();
        let start_world_x = level.player.rect.x - level.camera.total_shift.x;

        let right = FrameInput { movement: Some(crate::domain::entity::Direction::Right), place_bomb: false };
        for _ in 0..400 {
            level.tick(right);
        }

        // Scrolling definitely happened…
        assert!(level.camera.total_shift.x < 0);
        // …and the world frame never noticed.
        let world_x = level.player.rect.x - level.camera.total_shift.x;
        assert_eq!(world_x, start_world_x + 400 * speed);

        // Other entities keep their world positions through the scroll.
        let gateway = level.gateway.as_ref().unwrap();
        assert_eq!(
            gateway.rect.world_cell(level.camera.total_shift),
            Vec2::new(38, 1)
        );
    }

    #[test]
    fn wall_collision_sets_flag_and_stops_player() {
        let def = def_from(&[
            "#####",
            "#P G#",
            "#####",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();

        let left = FrameInput { movement: Some(crate::domain::entity::Direction::Left), place_bomb: false };
        level.tick(left);
        assert!(level.hit_wall_h);
        assert_eq!(level.player_world_cell(), Vec2::new(1, 1));
    }

    #[test]
    fn item_pickup_applies_timed_effect() {
        let def = def_from(&[
            "#####",
            "#P G#",
            "#####",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        let shift = level.camera.total_shift;
        level.items.push(Item {
            rect: Rect::at_cell(Vec2::new(1, 1), shift),
            kind: ItemKind::Skate,
        });

        level.tick(FrameInput::IDLE);

        assert_eq!(level.player_hit_item, Some(ItemKind::Skate));
        assert!(level.items.is_empty());
        assert!(level.player.skate_timer > 0);
        assert_eq!(level.player.speed(), level.player.base_speed * level.player.skate_boost);
    }

    #[test]
    fn extra_time_is_handed_to_the_caller() {
        let def = def_from(&[
            "#####",
            "#P G#",
            "#####",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        let shift = level.camera.total_shift;
        level.items.push(Item {
            rect: Rect::at_cell(Vec2::new(1, 1), shift),
            kind: ItemKind::ExtraTime,
        });

        level.tick(FrameInput::IDLE);
        assert_eq!(level.take_extra_time(), 30);
        assert_eq!(level.take_extra_time(), 0); // consumed
    }

    #[test]
    fn gateway_touch_wins() {
        let def = def_from(&[
            "#####",
            "#PG #",
            "#####",
        ]);
        let mut level = Level::new(&def, &test_config(), 1).unwrap();
        // No enemies: the gateway spawns on the first tick, one cell to
        // the player's right.
        level.tick(FrameInput::IDLE);
        assert!(level.gateway.is_some());

        let right = FrameInput { movement: Some(crate::domain::entity::Direction::Right), place_bomb: false };
        let mut state = level.final_state();
        for _ in 0..40 {
            level.tick(right);
            state = level.final_state();
            if state != FinalState::Running {
                break;
            }
        }
        assert_eq!(state, FinalState::Win);
        assert!(level.player_hit_gateway);
    }

    #[test]
    fn placement_exhaustion_is_an_error() {
        // No open cell outside the player's clearance radius.
        let def = def_from(&[
            "#####",
            "#P  #",
            "#####",
        ]);
        let mut config = test_config();
        config.rules.enemy_count = 1; // forces a random enemy placement
        let err = match Level::new(&def, &config, 1) {
            Err(err) => err,
            Ok(_) => panic!("placement should have failed"),
        };
        assert!(matches!(err, LevelError::Placement { entity: "enemy", .. }));
    }

    #[test]
    fn enemy_bounces_off_walls() {
        let def = def_from(&[
            "######",
            "#PE G#",
            "######",
        ]);
        let mut config = test_config();
        config.timing.enemy_cycle_ticks = 10_000; // keep it horizontal
        let mut level = Level::new(&def, &config, 1).unwrap();
        level.player.invincible_timer = u32::MAX;

        let initial_dir = level.enemies[0].dir;
        let mut reversed = false;
        for _ in 0..200 {
            level.tick(FrameInput::IDLE);
            if level.enemies[0].dir != initial_dir {
                reversed = true;
                break;
            }
        }
        assert!(reversed, "enemy should bounce off the wall and reverse");
    }
}
