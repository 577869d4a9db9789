/// Entities: Player, Enemy, Bomb, Explosion, Item, Gateway.
///
/// Plain structs, no shared base type. Every entity carries a screen-space
/// rect; world positions are derived through the camera's shift accumulator
/// (see physics module docs). The Level owns every collection; bombs own
/// their explosions; the player owns the bombs it placed.

use super::physics::{Rect, Vec2};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0, -1),
            Direction::Down => Vec2::new(0, 1),
            Direction::Left => Vec2::new(-1, 0),
            Direction::Right => Vec2::new(1, 0),
        }
    }
}

/// Frame input: movement is continuous (held key), bomb placement is
/// edge-triggered (fresh press). Both can fire in one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<Direction>,
    pub place_bomb: bool,
}

impl FrameInput {
    pub const IDLE: FrameInput = FrameInput { movement: None, place_bomb: false };
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ItemKind {
    ExtraTime,
    Skate,
    Invincible,
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct Player {
    pub rect: Rect,
    pub spawn_cell: Vec2,
    pub dir: Vec2,             // unit direction of the current tick
    pub base_speed: i32,
    pub skate_boost: i32,
    pub skate_timer: u32,      // ticks of speed boost remaining
    pub invincible_timer: u32, // ticks of invincibility remaining
    pub bomb_limit: usize,
    pub bomb_radius: u32,
    pub bombs: Vec<Bomb>,
    pub alive: bool,
}

impl Player {
    pub fn new(cell: Vec2) -> Self {
        Player {
            rect: Rect::actor_at_cell(cell, Vec2::ZERO),
            spawn_cell: cell,
            dir: Vec2::ZERO,
            base_speed: 2,
            skate_boost: 2,
            skate_timer: 0,
            invincible_timer: 0,
            bomb_limit: 1,
            bomb_radius: 2,
            bombs: vec![],
            alive: true,
        }
    }

    /// Effective speed: skate multiplies the base while its timer runs.
    pub fn speed(&self) -> i32 {
        if self.skate_timer > 0 {
            self.base_speed * self.skate_boost
        } else {
            self.base_speed
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_timer > 0
    }

    /// Bombs placed and not yet exploded. This is what the bomb limit
    /// bounds: lingering explosions don't block the next placement.
    pub fn armed_bombs(&self) -> usize {
        self.bombs.iter().filter(|b| !b.exploded).count()
    }

    pub fn can_place_bomb(&self) -> bool {
        self.armed_bombs() < self.bomb_limit
    }

    /// Advance power-up timers one tick.
    pub fn tick_effects(&mut self) {
        if self.skate_timer > 0 {
            self.skate_timer -= 1;
        }
        if self.invincible_timer > 0 {
            self.invincible_timer -= 1;
        }
    }
}

// ── Bomb ──

/// What a bomb did during one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BombTick {
    Armed,        // fuse still counting
    JustExploded, // fuse expired this tick — blast must be computed now
    Lingering,    // explosions on screen
    JustEnded,    // linger expired this tick — remove bomb + explosions
    Done,
}

/// Bomb lifecycle: armed → exploded → ended. The two counters split the
/// configured linger duration: `fuse_remaining` ticks until the blast,
/// then `after_remaining = linger - fuse` ticks of explosions. Total
/// lifetime from placement to removal is exactly the linger duration.
#[derive(Clone, Debug)]
pub struct Bomb {
    pub rect: Rect,
    pub radius: u32,
    pub fuse_remaining: u32,
    pub after_remaining: u32,
    pub exploded: bool,
    pub ended: bool,
    pub blast_cells: Vec<Vec2>, // world cells, filled at fuse expiry
    pub explosions: Vec<Explosion>,
}

impl Bomb {
    /// `radius` must be >= 1 and `linger >= fuse`; both are enforced by
    /// config sanitation, so violations here are programming errors.
    pub fn new(cell: Vec2, radius: u32, fuse: u32, linger: u32, total_shift: Vec2) -> Self {
        debug_assert!(radius >= 1, "bomb radius must be positive");
        debug_assert!(linger >= fuse, "bomb must linger at least as long as its fuse");
        Bomb {
            rect: Rect::at_cell(cell, total_shift),
            radius: radius.max(1),
            fuse_remaining: fuse,
            after_remaining: linger.saturating_sub(fuse),
            exploded: false,
            ended: false,
            blast_cells: vec![],
            explosions: vec![],
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> BombTick {
        if !self.exploded {
            self.fuse_remaining = self.fuse_remaining.saturating_sub(1);
            if self.fuse_remaining == 0 {
                self.exploded = true;
                if self.after_remaining == 0 {
                    self.ended = true;
                }
                return BombTick::JustExploded;
            }
            return BombTick::Armed;
        }
        if !self.ended {
            self.after_remaining -= 1;
            if self.after_remaining == 0 {
                self.ended = true;
                return BombTick::JustEnded;
            }
            return BombTick::Lingering;
        }
        BombTick::Done
    }
}

/// A single blast-affected cell. No state beyond position: its lifetime
/// is its parent bomb's linger window.
#[derive(Clone, Copy, Debug)]
pub struct Explosion {
    pub rect: Rect,
}

// ── Enemy ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Patrol-and-bounce enemy. Travels along one axis at a time, reversing
/// on wall contact; the preferred axis flips on a cycle timer when the
/// enemy is grid-aligned. A blast hit does not kill outright: it
/// decrements `life` and starts the `pause` stagger, and the enemy is
/// removed only once life is zero and the pause has elapsed.
#[derive(Clone, Debug)]
pub struct Enemy {
    pub rect: Rect,
    pub dir: i32, // +1 or -1 along the current axis
    pub axis: Axis,
    pub cycle_timer: u32,
    pub life: u32,
    pub pause: u32,
}

impl Enemy {
    pub fn new(cell: Vec2, life: u32, cycle_ticks: u32) -> Self {
        Enemy {
            rect: Rect::actor_at_cell(cell, Vec2::ZERO),
            dir: -1,
            axis: Axis::Horizontal,
            cycle_timer: cycle_ticks,
            life: life.max(1),
            pause: 0,
        }
    }

    /// Blast hit: lose one life and stop moving for the stagger window.
    /// Already-staggered enemies ignore further hits.
    pub fn stagger(&mut self, pause_ticks: u32) {
        if self.pause > 0 {
            return;
        }
        self.life = self.life.saturating_sub(1);
        self.pause = pause_ticks;
    }

    pub fn is_staggered(&self) -> bool {
        self.pause > 0
    }

    /// Out of life and done staggering — remove from the level.
    pub fn is_dead(&self) -> bool {
        self.life == 0 && self.pause == 0
    }

    pub fn reverse(&mut self) {
        self.dir = -self.dir;
    }
}

// ── Item / Gateway ──

#[derive(Clone, Copy, Debug)]
pub struct Item {
    pub rect: Rect,
    pub kind: ItemKind,
}

/// Level exit. Spawned only once every enemy is defeated; touching it
/// ends the level in a win.
#[derive(Clone, Copy, Debug)]
pub struct Gateway {
    pub rect: Rect,
}
