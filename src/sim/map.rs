/// Map loader.
///
/// ## Sources (priority order):
///   1. `maps/` directory (individual `.csv` files)
///   2. Built-in embedded maps
///
/// ## CSV format
///   One row per line, one token per comma-separated cell. Rows must all
///   have the same column count. A UTF-8 BOM on the first cell is
///   tolerated (spreadsheet exports add one).
///
/// ## Token table
///   `X`   = concrete wall (indestructible)
///   `#`   = map edge (indestructible border)
///   `D_1` = brick, destroyed by one blast (may conceal a bomb)
///   `D_2` = brick, takes two blasts
///   `I`   = brick concealing an item
///   `P`   = player spawn (cell is open space)
///   `E`   = enemy spawn (cell is open space)
///   `G`   = gateway location (cell is open space)
///   blank = open space
///
/// Unknown tokens, ragged rows, and missing/duplicate player spawns are
/// fatal configuration errors — no silent fallback.

use std::path::Path;

use thiserror::Error;

use crate::domain::physics::Vec2;
use crate::domain::tile::TileKind;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("unknown map token {token:?} at row {row}, column {col}")]
    UnknownToken { token: String, row: usize, col: usize },

    #[error("map is not rectangular: row {row} has {found} columns, expected {expected}")]
    NotRectangular { row: usize, found: usize, expected: usize },

    #[error("map has no player spawn marker")]
    MissingPlayerSpawn,

    #[error("map defines more than one player spawn (rows {first} and {second})")]
    DuplicatePlayerSpawn { first: usize, second: usize },

    #[error("map {0:?} is empty")]
    Empty(String),

    #[error("could not read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A parsed, validated level layout. Spawn markers are extracted — their
/// cells are plain open space in `tiles`.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Vec<TileKind>>,
    pub player_spawn: Vec2,
    pub enemy_spawns: Vec<Vec2>,
    pub gateway_cell: Option<Vec2>,
}

// ══════════════════════════════════════════════════════════════
// Token parsing
// ══════════════════════════════════════════════════════════════

/// Parse a grid of textual tokens into a LevelDef.
pub fn parse_tokens(name: &str, rows: &[Vec<String>]) -> Result<LevelDef, MapError> {
    if rows.is_empty() || rows[0].is_empty() {
        return Err(MapError::Empty(name.to_string()));
    }

    let width = rows[0].len();
    let height = rows.len();

    let mut tiles = vec![vec![TileKind::Open; width]; height];
    let mut player_spawn: Option<(Vec2, usize)> = None;
    let mut enemy_spawns = vec![];
    let mut gateway_cell = None;

    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(MapError::NotRectangular { row: y, found: row.len(), expected: width });
        }
        for (x, raw) in row.iter().enumerate() {
            let token = raw.trim_start_matches('\u{feff}').trim();
            let cell = Vec2::new(x as i32, y as i32);
            tiles[y][x] = match token {
                "" => TileKind::Open,
                "X" => TileKind::Concrete,
                "#" => TileKind::Edge,
                "D_1" => TileKind::BrickOne,
                "D_2" => TileKind::BrickTwo,
                "I" => TileKind::ItemBrick,
                "P" => {
                    if let Some((_, first)) = player_spawn {
                        return Err(MapError::DuplicatePlayerSpawn { first, second: y });
                    }
                    player_spawn = Some((cell, y));
                    TileKind::Open
                }
                "E" => {
                    enemy_spawns.push(cell);
                    TileKind::Open
                }
                "G" => {
                    gateway_cell = Some(cell);
                    TileKind::Open
                }
                other => {
                    return Err(MapError::UnknownToken {
                        token: other.to_string(),
                        row: y,
                        col: x,
                    });
                }
            };
        }
    }

    let (player_spawn, _) = player_spawn.ok_or(MapError::MissingPlayerSpawn)?;

    Ok(LevelDef {
        name: name.to_string(),
        width,
        height,
        tiles,
        player_spawn,
        enemy_spawns,
        gateway_cell,
    })
}

/// Parse CSV content (one token per comma-separated cell).
pub fn parse_csv(name: &str, content: &str) -> Result<LevelDef, MapError> {
    let mut rows: Vec<Vec<String>> = content
        .lines()
        .map(|line| line.split(',').map(|t| t.to_string()).collect())
        .collect();

    // Drop trailing blank lines (a final newline produces one)
    while rows.last().map_or(false, |r| r.iter().all(|t| t.trim().is_empty())) {
        rows.pop();
    }

    parse_tokens(name, &rows)
}

// ══════════════════════════════════════════════════════════════
// Directory loading
// ══════════════════════════════════════════════════════════════

/// Load every `.csv` map from a directory, sorted by filename.
/// Any malformed map aborts the load — configuration errors are fatal.
pub fn load_dir(dir: &Path) -> Result<Vec<LevelDef>, MapError> {
    let mut paths: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |e| e == "csv"))
            .collect(),
        Err(_) => return Ok(vec![]),
    };
    paths.sort();

    let mut maps = vec![];
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        maps.push(parse_csv(&name, &content)?);
    }
    Ok(maps)
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback maps
// ══════════════════════════════════════════════════════════════

/// Built-in maps used when the maps directory is missing or empty.
/// Compact layout, one character per cell: `1`/`2` are the brick tiers
/// (`D_1`/`D_2` in the CSV token table), everything else as in the table.
pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Compound 1", &[
            "################################",
            "#P 1 2 1 1 2 1 2 1 2 1 1 2 1 E #",
            "# X X X X X X X X X X X X X X  #",
            "#1 2 1 I 2 1 2 1 2 1 2 I 1 2   #",
            "# X X X X X X X X X X X X X X  #",
            "#  1 2  1 I 1  E 2 1 2 1 2 1   #",
            "# X X X X X X X X X X X X X X  #",
            "# 2 1 2 1 2 1 2  1 2 1 E  1 2  #",
            "# X X X X X X X X X X X X X X  #",
            "#1 2 I 1 2 1 2 1 2 1 1 2  2 1  #",
            "# X X X X X X X X X X X X X X  #",
            "#E 1 2 1 2 1 2 1 1 2 1 2 1   G #",
            "################################",
        ]),
        make_embedded("Compound 2", &[
            "########################",
            "#P 1 2   1 2 1    2 1 E#",
            "# X X X X X X X X X X  #",
            "# 2 I 1 2 1 G 1 2 1 2  #",
            "# X X X X X X X X X X  #",
            "#E 1 2 1  2 1 2  1 2 I #",
            "# X X X X X X X X X X  #",
            "# 1 2 1 2 1 2 1   1   E#",
            "########################",
        ]),
    ]
}

/// Expand a compact single-character layout into the token grid.
/// Every row must have the same character count.
fn make_embedded(name: &str, rows: &[&str]) -> LevelDef {
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

    parse_tokens(name, &token_rows).expect("embedded map is valid")
}
