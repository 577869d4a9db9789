/// Entry point and play-mode game loop.
///
/// The loop owns what the simulation core deliberately doesn't: tick
/// timing, the level countdown timer (extended by ExtraTime pickups),
/// reading the keyboard into a FrameInput, and reacting to the win/lose
/// outcome with an end screen.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::KeyCode;

use gridbomber::config::GameConfig;
use gridbomber::domain::entity::{Direction, FrameInput};
use gridbomber::sim::level::{FinalState, Level};
use gridbomber::sim::map::{self, LevelDef};
use gridbomber::ui::input::InputState;
use gridbomber::ui::renderer::{Hud, Renderer};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let maps = match load_maps(&config) {
        Ok(maps) => maps,
        Err(e) => {
            eprintln!("Map load failed: {e}");
            std::process::exit(1);
        }
    };

    // Optional 1-based map index argument
    let map_index = std::env::args()
        .nth(1)
        .and_then(|a| a.parse::<usize>().ok())
        .unwrap_or(1)
        .saturating_sub(1)
        .min(maps.len() - 1);
    let def = maps[map_index].clone();

    let mut renderer = Renderer::new(config.rules.view_cols, config.rules.view_rows);
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&def, &config, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Grid Bomber!");
}

/// Maps directory first, embedded maps as fallback. Malformed map
/// files are fatal — a broken map should never silently degrade.
fn load_maps(config: &GameConfig) -> Result<Vec<LevelDef>, map::MapError> {
    let from_dir = map::load_dir(&config.maps_dir)?;
    if from_dir.is_empty() {
        Ok(map::embedded_levels())
    } else {
        Ok(from_dir)
    }
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_BOMB: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];

/// One direction per tick; simultaneous keys resolve by the fixed
/// priority Up > Down > Left > Right.
fn detect_movement(kb: &InputState) -> Option<Direction> {
    if kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) {
        Some(Direction::Up)
    } else if kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) {
        Some(Direction::Down)
    } else if kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) {
        Some(Direction::Left)
    } else if kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) {
        Some(Direction::Right)
    } else {
        None
    }
}

fn game_loop(
    def: &LevelDef,
    config: &GameConfig,
    renderer: &mut Renderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut level = Level::new(def, config, wall_clock_seed())?;
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let ticks_per_sec = (1000 / config.timing.tick_rate_ms.max(1)).max(1) as u32;

    let mut time_remaining = config.timing.level_time_secs;
    let mut second_ticks = 0u32;
    let mut ended: Option<(FinalState, String)> = None;
    let mut pending_bomb = false;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(&[KeyCode::Esc]) {
            break;
        }

        if let Some((state, cause)) = &ended {
            renderer.render_end_screen(*state, cause, level.enemy_count())?;
            if kb.any_pressed(KEYS_CONFIRM) || kb.any_pressed(KEYS_RESTART) {
                level = Level::new(def, config, wall_clock_seed())?;
                time_remaining = config.timing.level_time_secs;
                second_ticks = 0;
                ended = None;
            }
            std::thread::sleep(FRAME_SLEEP);
            continue;
        }

        if kb.any_pressed(KEYS_RESTART) {
            level = Level::new(def, config, wall_clock_seed())?;
            time_remaining = config.timing.level_time_secs;
            second_ticks = 0;
        }

        // Bomb placement is edge-triggered: remember the press until the
        // next simulation tick consumes it.
        if kb.any_pressed(KEYS_BOMB) {
            pending_bomb = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput {
                movement: detect_movement(&kb),
                place_bomb: std::mem::take(&mut pending_bomb),
            };
            level.tick(input);

            // Level countdown, fed by ExtraTime pickups
            time_remaining += level.take_extra_time();
            second_ticks += 1;
            if second_ticks >= ticks_per_sec {
                second_ticks = 0;
                time_remaining = time_remaining.saturating_sub(1);
            }

            match level.final_state() {
                FinalState::Win => {
                    ended = Some((FinalState::Win, "you reached the gateway".into()));
                }
                FinalState::Lose => {
                    let cause = if level.player_hit_explosion {
                        "caught in an explosion"
                    } else {
                        "caught by an enemy"
                    };
                    ended = Some((FinalState::Lose, cause.into()));
                }
                FinalState::Running if time_remaining == 0 => {
                    ended = Some((FinalState::Lose, "you ran out of time".into()));
                }
                FinalState::Running => {}
            }

            last_tick = Instant::now();
        }

        let hud = Hud {
            level_name: def.name.clone(),
            time_remaining,
            skate_secs: level.player.skate_timer / ticks_per_sec,
            invincible_secs: level.player.invincible_timer / ticks_per_sec,
        };
        renderer.render(&level, &hud)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
