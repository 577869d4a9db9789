/// Presentation layer: glyph-per-cell terminal renderer.
///
/// The viewport is small (24 x 14 cells), so each frame is rebuilt into
/// a glyph grid and emitted in one batched, buffered write — no diffing
/// needed at this size. The simulation works in pixels; the renderer
/// quantizes every entity to the view cell under its center.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::domain::entity::ItemKind;
use crate::domain::physics::{Vec2, TILE_SIZE};
use crate::domain::tile::TileKind;
use crate::sim::level::{FinalState, Level};

/// Per-frame HUD values owned by the game loop.
pub struct Hud {
    pub level_name: String,
    pub time_remaining: u32,
    pub skate_secs: u32,
    pub invincible_secs: u32,
}

#[derive(Clone, Copy, PartialEq)]
struct Glyph {
    ch: char,
    fg: Color,
}

const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White };

pub struct Renderer {
    view_cols: usize,
    view_rows: usize,
    cells: Vec<Glyph>,
}

impl Renderer {
    pub fn new(view_cols: usize, view_rows: usize) -> Self {
        Renderer {
            view_cols,
            view_rows,
            cells: vec![BLANK; view_cols * view_rows],
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(io::stdout(), Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    // ── Frame rendering ──

    pub fn render(&mut self, level: &Level, hud: &Hud) -> io::Result<()> {
        self.compose(level);

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        queue!(out, Clear(ClearType::All))?;

        for vy in 0..self.view_rows {
            queue!(out, MoveTo(0, vy as u16))?;
            for vx in 0..self.view_cols {
                let glyph = self.cells[vy * self.view_cols + vx];
                queue!(out, SetForegroundColor(glyph.fg), Print(glyph.ch))?;
            }
        }

        let mut status = format!(
            " {}  time {:>3}  enemies {}  bombs {}",
            hud.level_name,
            hud.time_remaining,
            level.enemy_count(),
            level.all_bombs().count(),
        );
        if hud.skate_secs > 0 {
            status.push_str(&format!("  skate {}s", hud.skate_secs));
        }
        if hud.invincible_secs > 0 {
            status.push_str(&format!("  shield {}s", hud.invincible_secs));
        }
        queue!(
            out,
            MoveTo(0, self.view_rows as u16),
            ResetColor,
            Print(status)
        )?;

        out.flush()
    }

    /// End-of-level screen: outcome and cause.
    pub fn render_end_screen(
        &mut self,
        state: FinalState,
        cause: &str,
        enemies_alive: usize,
    ) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        queue!(out, Clear(ClearType::All))?;

        let (headline, color) = match state {
            FinalState::Win => ("LEVEL CLEAR", Color::Green),
            FinalState::Lose => ("GAME OVER", Color::Red),
            FinalState::Running => ("PAUSED", Color::White),
        };
        let cx = (self.view_cols / 2).saturating_sub(headline.len() / 2) as u16;
        let cy = (self.view_rows / 2) as u16;

        queue!(
            out,
            MoveTo(cx, cy.saturating_sub(1)),
            SetForegroundColor(color),
            Print(headline),
            MoveTo(2, cy + 1),
            ResetColor,
            Print(cause),
            MoveTo(2, cy + 2),
            Print(format!("enemies remaining: {enemies_alive}")),
            MoveTo(2, cy + 4),
            Print("[enter] play again   [esc] quit"),
        )?;
        out.flush()
    }

    // ── Frame composition ──

    fn compose(&mut self, level: &Level) {
        self.cells.fill(BLANK);
        let shift = level.camera.total_shift;

        // Terrain under the viewport
        for vy in 0..self.view_rows {
            for vx in 0..self.view_cols {
                let center = Vec2::new(
                    vx as i32 * TILE_SIZE + TILE_SIZE / 2 - shift.x,
                    vy as i32 * TILE_SIZE + TILE_SIZE / 2 - shift.y,
                );
                let cell = Vec2::new(
                    center.x.div_euclid(TILE_SIZE),
                    center.y.div_euclid(TILE_SIZE),
                );
                let glyph = if cell.x < 0
                    || cell.y < 0
                    || cell.x as usize >= level.width
                    || cell.y as usize >= level.height
                {
                    BLANK
                } else {
                    match level.tiles[cell.y as usize][cell.x as usize].kind {
                        TileKind::Open => BLANK,
                        TileKind::Concrete => Glyph { ch: '█', fg: Color::Grey },
                        TileKind::BrickOne => Glyph { ch: '▒', fg: Color::DarkYellow },
                        TileKind::BrickTwo => Glyph { ch: '▓', fg: Color::DarkYellow },
                        TileKind::ItemBrick => Glyph { ch: '▒', fg: Color::DarkYellow },
                        TileKind::Edge => Glyph { ch: '█', fg: Color::DarkGrey },
                    }
                };
                self.cells[vy * self.view_cols + vx] = glyph;
            }
        }

        // Entities, lowest priority first
        for item in &level.items {
            let glyph = match item.kind {
                ItemKind::ExtraTime => Glyph { ch: '+', fg: Color::Yellow },
                ItemKind::Skate => Glyph { ch: '>', fg: Color::Cyan },
                ItemKind::Invincible => Glyph { ch: '$', fg: Color::Magenta },
            };
            self.overlay(item.rect.center(), glyph);
        }
        if let Some(gateway) = &level.gateway {
            self.overlay(gateway.rect.center(), Glyph { ch: 'O', fg: Color::Green });
        }
        for enemy in &level.enemies {
            let fg = if enemy.is_staggered() { Color::DarkRed } else { Color::Red };
            self.overlay(enemy.rect.center(), Glyph { ch: 'M', fg });
        }
        for bomb in level.all_bombs() {
            if !bomb.exploded {
                self.overlay(bomb.rect.center(), Glyph { ch: 'o', fg: Color::White });
            }
            for explosion in &bomb.explosions {
                self.overlay(explosion.rect.center(), Glyph { ch: '*', fg: Color::Yellow });
            }
        }
        if level.player.alive {
            let fg = if level.player.is_invincible() { Color::Magenta } else { Color::Cyan };
            self.overlay(level.player.rect.center(), Glyph { ch: '@', fg });
        }
    }

    /// Place a glyph at the view cell under a screen-space point.
    fn overlay(&mut self, screen_px: Vec2, glyph: Glyph) {
        let vx = screen_px.x.div_euclid(TILE_SIZE);
        let vy = screen_px.y.div_euclid(TILE_SIZE);
        if vx < 0 || vy < 0 {
            return;
        }
        let (vx, vy) = (vx as usize, vy as usize);
        if vx < self.view_cols && vy < self.view_rows {
            self.cells[vy * self.view_cols + vx] = glyph;
        }
    }
}
