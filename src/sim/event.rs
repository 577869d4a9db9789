/// Events emitted during a simulation tick.
/// The presentation layer consumes these for HUD messages and effects.

use crate::domain::entity::ItemKind;
use crate::domain::physics::Vec2;

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    BombPlaced { cell: Vec2 },
    BombExploded { cell: Vec2 },
    ChainBombArmed { cell: Vec2 },
    WallDestroyed { cell: Vec2 },
    WallDowngraded { cell: Vec2 },
    ItemRevealed { cell: Vec2, kind: ItemKind },
    ItemPicked { kind: ItemKind },
    EnemyStaggered { cell: Vec2 },
    EnemyKilled { cell: Vec2 },
    GatewaySpawned { cell: Vec2 },
    GatewayReached,
    PlayerKilled,
}
