/// Tile categories and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::entity::ItemKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Open,
    Concrete,  // indestructible wall
    BrickOne,  // destroyable, one blast; may conceal a bomb
    BrickTwo,  // destroyable, two blasts (downgrades to BrickOne)
    ItemBrick, // destroyable, one blast; conceals an item, never a bomb
    Edge,      // map border, indestructible
}

impl TileKind {
    /// Does this tile block entity movement?
    pub fn is_solid(self) -> bool {
        !matches!(self, TileKind::Open)
    }

    /// Can a blast remove or downgrade this tile?
    pub fn is_destroyable(self) -> bool {
        matches!(self, TileKind::BrickOne | TileKind::BrickTwo | TileKind::ItemBrick)
    }

    /// Does a blast ray terminate here without affecting the tile?
    pub fn blocks_blast(self) -> bool {
        matches!(self, TileKind::Concrete | TileKind::Edge)
    }

    /// Can an entity occupy this cell?
    pub fn is_passable(self) -> bool {
        !self.is_solid()
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Open
    }
}

/// One cell of the level grid. The hidden payload is rolled at load time
/// (and again when a BrickTwo downgrades) and is only observable once the
/// wall is destroyed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tile {
    pub kind: TileKind,
    pub hidden_bomb: bool,
    pub hidden_item: Option<ItemKind>,
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Tile { kind, hidden_bomb: false, hidden_item: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_is_passable() {
        assert!(TileKind::Open.is_passable());
        for kind in [
            TileKind::Concrete,
            TileKind::BrickOne,
            TileKind::BrickTwo,
            TileKind::ItemBrick,
            TileKind::Edge,
        ] {
            assert!(kind.is_solid(), "{kind:?} should be solid");
        }
    }

    #[test]
    fn blast_blockers_are_not_destroyable() {
        assert!(TileKind::Concrete.blocks_blast());
        assert!(TileKind::Edge.blocks_blast());
        assert!(!TileKind::Concrete.is_destroyable());
        assert!(!TileKind::Edge.is_destroyable());
        assert!(!TileKind::BrickOne.blocks_blast());
    }
}
