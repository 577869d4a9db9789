/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Tables:
///   [timing]  — tick rate and every duration expressed in ticks
///   [rules]   — player/enemy stats, bomb stats, viewport geometry
///   [reward]  — RL reward shaping coefficients (tuning surface, not code)
///   [general] — maps directory

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub reward: RewardConfig,
    pub maps_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub fuse_ticks: u32,          // placement → explosion
    pub linger_ticks: u32,        // placement → removal (>= fuse_ticks)
    pub enemy_stagger_ticks: u32, // pause between blast hit and death
    pub enemy_cycle_ticks: u32,   // axis-preference flip period
    pub item_duration_ticks: u32, // skate / invincibility effect length
    pub level_time_secs: u32,     // play-mode countdown
    pub extra_time_secs: u32,     // granted per ExtraTime item
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub player_speed: i32,       // px per tick
    pub skate_boost: i32,        // speed multiplier while skate is active
    pub enemy_speed: i32,
    pub bomb_limit: usize,       // max simultaneously un-exploded bombs
    pub bomb_radius: u32,        // blast reach in tiles
    pub enemy_count: usize,      // random placement count when map has no E markers
    pub enemy_life: u32,         // blast hits to kill
    pub hidden_bomb_chance: f64, // probability a brick conceals a bomb
    pub view_cols: usize,
    pub view_rows: usize,
    pub camera_margin: usize,    // scroll boundary inset, in tiles
}

/// RL reward shaping coefficients. All penalties are stored positive and
/// subtracted by the environment.
#[derive(Clone, Debug)]
pub struct RewardConfig {
    pub bomb_active_bonus: f32,     // per step while a bomb ticks in the map
    pub idle_penalty: f32,          // per Wait action
    pub wall_penalty: f32,          // per wall-collision tick
    pub bomb_adjacent_penalty: f32, // manhattan distance to a bomb <= 1
    pub bomb_close_penalty: f32,    // manhattan distance to a bomb == 2
    pub enemy_far_bonus: f32,       // path distance to nearest enemy == 4
    pub enemy_mid_bonus: f32,       // == 3
    pub enemy_near_bonus: f32,      // == 2
    pub enemy_contact_penalty: f32, // <= 1
    pub kill_bonus: f32,            // blast landed on an enemy this step
    pub win_bonus: f32,
    pub lose_penalty: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    reward: TomlReward,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_fuse")]
    fuse_ticks: u32,
    #[serde(default = "default_linger")]
    linger_ticks: u32,
    #[serde(default = "default_stagger")]
    enemy_stagger_ticks: u32,
    #[serde(default = "default_cycle")]
    enemy_cycle_ticks: u32,
    #[serde(default = "default_item_duration")]
    item_duration_ticks: u32,
    #[serde(default = "default_level_time")]
    level_time_secs: u32,
    #[serde(default = "default_extra_time")]
    extra_time_secs: u32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_player_speed")]
    player_speed: i32,
    #[serde(default = "default_skate_boost")]
    skate_boost: i32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: i32,
    #[serde(default = "default_bomb_limit")]
    bomb_limit: usize,
    #[serde(default = "default_bomb_radius")]
    bomb_radius: u32,
    #[serde(default = "default_enemy_count")]
    enemy_count: usize,
    #[serde(default = "default_enemy_life")]
    enemy_life: u32,
    #[serde(default = "default_hidden_bomb_chance")]
    hidden_bomb_chance: f64,
    #[serde(default = "default_view_cols")]
    view_cols: usize,
    #[serde(default = "default_view_rows")]
    view_rows: usize,
    #[serde(default = "default_camera_margin")]
    camera_margin: usize,
}

#[derive(Deserialize, Debug)]
struct TomlReward {
    #[serde(default = "default_bomb_active_bonus")]
    bomb_active_bonus: f32,
    #[serde(default = "default_idle_penalty")]
    idle_penalty: f32,
    #[serde(default = "default_wall_penalty")]
    wall_penalty: f32,
    #[serde(default = "default_bomb_adjacent_penalty")]
    bomb_adjacent_penalty: f32,
    #[serde(default = "default_bomb_close_penalty")]
    bomb_close_penalty: f32,
    #[serde(default = "default_enemy_far_bonus")]
    enemy_far_bonus: f32,
    #[serde(default = "default_enemy_mid_bonus")]
    enemy_mid_bonus: f32,
    #[serde(default = "default_enemy_near_bonus")]
    enemy_near_bonus: f32,
    #[serde(default = "default_enemy_contact_penalty")]
    enemy_contact_penalty: f32,
    #[serde(default = "default_kill_bonus")]
    kill_bonus: f32,
    #[serde(default = "default_win_bonus")]
    win_bonus: f32,
    #[serde(default = "default_lose_penalty")]
    lose_penalty: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_maps_dir")]
    maps_dir: String,
}

// ── Defaults ──
// Timing defaults assume the 50 ms tick (20 ticks per second): the classic
// 3 s fuse and 1 s explosion linger become 60 and 80 ticks.

fn default_tick_rate() -> u64 { 50 }
fn default_fuse() -> u32 { 60 }
fn default_linger() -> u32 { 80 }
fn default_stagger() -> u32 { 40 }
fn default_cycle() -> u32 { 150 }
fn default_item_duration() -> u32 { 300 }
fn default_level_time() -> u32 { 300 }
fn default_extra_time() -> u32 { 30 }

fn default_player_speed() -> i32 { 2 }
fn default_skate_boost() -> i32 { 2 }
fn default_enemy_speed() -> i32 { 1 }
fn default_bomb_limit() -> usize { 1 }
fn default_bomb_radius() -> u32 { 2 }
fn default_enemy_count() -> usize { 3 }
fn default_enemy_life() -> u32 { 1 }
fn default_hidden_bomb_chance() -> f64 { 0.25 }
fn default_view_cols() -> usize { 24 }
fn default_view_rows() -> usize { 14 }
fn default_camera_margin() -> usize { 2 }

fn default_bomb_active_bonus() -> f32 { 0.05 }
fn default_idle_penalty() -> f32 { 0.5 }
fn default_wall_penalty() -> f32 { 0.001 }
fn default_bomb_adjacent_penalty() -> f32 { 0.05 }
fn default_bomb_close_penalty() -> f32 { 0.025 }
fn default_enemy_far_bonus() -> f32 { 0.0125 }
fn default_enemy_mid_bonus() -> f32 { 0.025 }
fn default_enemy_near_bonus() -> f32 { 0.05 }
fn default_enemy_contact_penalty() -> f32 { 0.05 }
fn default_kill_bonus() -> f32 { 10.0 }
fn default_win_bonus() -> f32 { 1.0 }
fn default_lose_penalty() -> f32 { 0.2 }

fn default_maps_dir() -> String { "maps".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            fuse_ticks: default_fuse(),
            linger_ticks: default_linger(),
            enemy_stagger_ticks: default_stagger(),
            enemy_cycle_ticks: default_cycle(),
            item_duration_ticks: default_item_duration(),
            level_time_secs: default_level_time(),
            extra_time_secs: default_extra_time(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            player_speed: default_player_speed(),
            skate_boost: default_skate_boost(),
            enemy_speed: default_enemy_speed(),
            bomb_limit: default_bomb_limit(),
            bomb_radius: default_bomb_radius(),
            enemy_count: default_enemy_count(),
            enemy_life: default_enemy_life(),
            hidden_bomb_chance: default_hidden_bomb_chance(),
            view_cols: default_view_cols(),
            view_rows: default_view_rows(),
            camera_margin: default_camera_margin(),
        }
    }
}

impl Default for TomlReward {
    fn default() -> Self {
        TomlReward {
            bomb_active_bonus: default_bomb_active_bonus(),
            idle_penalty: default_idle_penalty(),
            wall_penalty: default_wall_penalty(),
            bomb_adjacent_penalty: default_bomb_adjacent_penalty(),
            bomb_close_penalty: default_bomb_close_penalty(),
            enemy_far_bonus: default_enemy_far_bonus(),
            enemy_mid_bonus: default_enemy_mid_bonus(),
            enemy_near_bonus: default_enemy_near_bonus(),
            enemy_contact_penalty: default_enemy_contact_penalty(),
            kill_bonus: default_kill_bonus(),
            win_bonus: default_win_bonus(),
            lose_penalty: default_lose_penalty(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            maps_dir: default_maps_dir(),
        }
    }
}

// ── Conversion ──

impl TomlConfig {
    fn into_config(self, maps_dir: PathBuf) -> GameConfig {
        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: self.timing.tick_rate_ms,
                fuse_ticks: self.timing.fuse_ticks,
                linger_ticks: self.timing.linger_ticks,
                enemy_stagger_ticks: self.timing.enemy_stagger_ticks,
                enemy_cycle_ticks: self.timing.enemy_cycle_ticks,
                item_duration_ticks: self.timing.item_duration_ticks,
                level_time_secs: self.timing.level_time_secs,
                extra_time_secs: self.timing.extra_time_secs,
            },
            rules: RulesConfig {
                player_speed: self.rules.player_speed,
                skate_boost: self.rules.skate_boost,
                enemy_speed: self.rules.enemy_speed,
                bomb_limit: self.rules.bomb_limit,
                bomb_radius: self.rules.bomb_radius,
                enemy_count: self.rules.enemy_count,
                enemy_life: self.rules.enemy_life,
                hidden_bomb_chance: self.rules.hidden_bomb_chance,
                view_cols: self.rules.view_cols,
                view_rows: self.rules.view_rows,
                camera_margin: self.rules.camera_margin,
            },
            reward: RewardConfig {
                bomb_active_bonus: self.reward.bomb_active_bonus,
                idle_penalty: self.reward.idle_penalty,
                wall_penalty: self.reward.wall_penalty,
                bomb_adjacent_penalty: self.reward.bomb_adjacent_penalty,
                bomb_close_penalty: self.reward.bomb_close_penalty,
                enemy_far_bonus: self.reward.enemy_far_bonus,
                enemy_mid_bonus: self.reward.enemy_mid_bonus,
                enemy_near_bonus: self.reward.enemy_near_bonus,
                enemy_contact_penalty: self.reward.enemy_contact_penalty,
                kill_bonus: self.reward.kill_bonus,
                win_bonus: self.reward.win_bonus,
                lose_penalty: self.reward.lose_penalty,
            },
            maps_dir,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve maps directory
        let maps_dir_str = toml_cfg.general.maps_dir.clone();
        let maps_dir = if PathBuf::from(&maps_dir_str).is_absolute() {
            PathBuf::from(&maps_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(&maps_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(&maps_dir_str))
        };

        let mut config = toml_cfg.into_config(maps_dir);
        config.sanitize();
        config
    }

    /// Clamp values that would break simulation invariants.
    /// A bomb must linger at least as long as its fuse and the blast
    /// radius must be positive.
    pub fn sanitize(&mut self) {
        if self.timing.linger_ticks < self.timing.fuse_ticks {
            eprintln!(
                "Warning: linger_ticks < fuse_ticks ({} < {}), clamping",
                self.timing.linger_ticks, self.timing.fuse_ticks
            );
            self.timing.linger_ticks = self.timing.fuse_ticks;
        }
        if self.rules.bomb_radius == 0 {
            eprintln!("Warning: bomb_radius must be >= 1, using 1");
            self.rules.bomb_radius = 1;
        }
        if self.rules.player_speed <= 0 {
            self.rules.player_speed = default_player_speed();
        }
        if self.rules.enemy_speed <= 0 {
            self.rules.enemy_speed = default_enemy_speed();
        }
        self.rules.hidden_bomb_chance = self.rules.hidden_bomb_chance.clamp(0.0, 1.0);
    }
}

impl Default for GameConfig {
    /// All-default config without touching the filesystem.
    fn default() -> Self {
        TomlConfig::default().into_config(PathBuf::from(default_maps_dir()))
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds data
        // relative to the real location.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
