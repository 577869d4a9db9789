/// Enemy steering — patrol and bounce.
///
/// Enemies travel along one axis at a time. The movement contract:
///   - keep moving `dir` (±1) along the current axis;
///   - on wall contact, reverse (`Enemy::reverse`) — no clamping;
///   - a cycle timer periodically flips the preferred axis, but the flip
///     only lands when the enemy is grid-aligned, so it never wedges
///     itself half inside a corridor.
///
/// The simulation applies the returned delta and handles the collision
/// check; this module only decides intent.

use super::entity::{Axis, Enemy};
use super::physics::Vec2;

/// Tentative displacement for this tick. Staggered enemies hold still.
pub fn steer(enemy: &Enemy, speed: i32) -> Vec2 {
    if enemy.is_staggered() {
        return Vec2::ZERO;
    }
    match enemy.axis {
        Axis::Horizontal => Vec2::new(enemy.dir * speed, 0),
        Axis::Vertical => Vec2::new(0, enemy.dir * speed),
    }
}

/// Advance the axis-preference cycle. When the timer elapses and the
/// enemy sits exactly on a cell, the patrol axis flips; otherwise the
/// flip waits for the next aligned tick.
pub fn tick_cycle(enemy: &mut Enemy, cycle_ticks: u32, aligned: bool) {
    if enemy.cycle_timer > 0 {
        enemy.cycle_timer -= 1;
        return;
    }
    if !aligned {
        return;
    }
    enemy.axis = match enemy.axis {
        Axis::Horizontal => Axis::Vertical,
        Axis::Vertical => Axis::Horizontal,
    };
    enemy.cycle_timer = cycle_ticks;
}
