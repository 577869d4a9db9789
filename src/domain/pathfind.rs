/// Grid pathfinding — BFS shortest-path distances over passable cells.
///
/// Used for reward shaping: screen-space pixel distance is meaningless
/// once the camera has scrolled and ignores walls anyway, so enemy
/// proximity is measured in world-cell path steps.

use std::collections::VecDeque;

use super::physics::{tile_at, Vec2};
use super::tile::Tile;

/// Cap on explored cells so a huge open map can't make one reward
/// computation unbounded.
const BFS_MAX_VISITS: usize = 2048;

const DIRS: [Vec2; 4] = [
    Vec2 { x: 1, y: 0 },
    Vec2 { x: -1, y: 0 },
    Vec2 { x: 0, y: 1 },
    Vec2 { x: 0, y: -1 },
];

/// Shortest walkable distance from `from` to `to` in cells.
/// Returns None when unreachable (or either endpoint is solid).
pub fn distance(
    tiles: &[Vec<Tile>],
    width: usize,
    height: usize,
    from: Vec2,
    to: Vec2,
) -> Option<u32> {
    if !tile_at(tiles, width, height, from).kind.is_passable()
        || !tile_at(tiles, width, height, to).kind.is_passable()
    {
        return None;
    }
    if from == to {
        return Some(0);
    }

    let mut visited = vec![vec![false; width]; height];
    visited[from.y as usize][from.x as usize] = true;

    let mut queue: VecDeque<(Vec2, u32)> = VecDeque::with_capacity(256);
    queue.push_back((from, 0));

    let mut visits = 0;
    while let Some((cell, dist)) = queue.pop_front() {
        visits += 1;
        if visits > BFS_MAX_VISITS {
            break;
        }
        for dir in DIRS {
            let next = cell + dir;
            if next.x < 0 || next.y < 0
                || next.x as usize >= width || next.y as usize >= height
            {
                continue;
            }
            if visited[next.y as usize][next.x as usize] {
                continue;
            }
            if !tile_at(tiles, width, height, next).kind.is_passable() {
                continue;
            }
            if next == to {
                return Some(dist + 1);
            }
            visited[next.y as usize][next.x as usize] = true;
            queue.push_back((next, dist + 1));
        }
    }

    None
}
