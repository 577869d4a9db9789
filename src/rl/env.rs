/// RL environment — a gym-style reset/step interface over the level
/// simulation.
///
/// One `step` is exactly one simulation tick through the same input
/// contract the human player uses. The environment owns the episode
/// budget: hitting it truncates the episode (and resets the internal
/// counter) without terminating the underlying level. Reward shaping is
/// driven entirely by `RewardConfig` — coefficients are configuration,
/// not behavior baked into code.

use crate::config::GameConfig;
use crate::domain::entity::{Direction, FrameInput};
use crate::sim::level::{FinalState, Level, LevelError};
use crate::sim::map::LevelDef;

use super::encoder::{self, Observation};

/// Environment configuration.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// Steps per episode before truncation.
    pub max_episode_len: u32,
    /// Base RNG seed; each episode offsets it so layouts with random
    /// rolls differ between episodes but stay reproducible.
    pub seed: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_episode_len: 3000,
            seed: 0,
        }
    }
}

/// Discrete action space, ids 0–5.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Wait,
    Bomb,
}

impl Action {
    pub const COUNT: usize = 6;

    pub fn from_index(index: usize) -> Option<Action> {
        match index {
            0 => Some(Action::Up),
            1 => Some(Action::Down),
            2 => Some(Action::Left),
            3 => Some(Action::Right),
            4 => Some(Action::Wait),
            5 => Some(Action::Bomb),
            _ => None,
        }
    }

    /// The same input contract the human play loop produces.
    pub fn to_input(self) -> FrameInput {
        match self {
            Action::Up => FrameInput { movement: Some(Direction::Up), place_bomb: false },
            Action::Down => FrameInput { movement: Some(Direction::Down), place_bomb: false },
            Action::Left => FrameInput { movement: Some(Direction::Left), place_bomb: false },
            Action::Right => FrameInput { movement: Some(Direction::Right), place_bomb: false },
            Action::Wait => FrameInput::IDLE,
            Action::Bomb => FrameInput { movement: None, place_bomb: true },
        }
    }
}

/// Additional information from a step.
#[derive(Clone, Debug, Default)]
pub struct StepInfo {
    pub tick: u64,
    pub enemies_remaining: usize,
    pub player_cell: [i32; 2],
    pub out_of_bounds: bool,
}

/// Step result: observation, shaped reward, termination markers.
#[derive(Clone, Debug)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

pub struct BomberEnv {
    def: LevelDef,
    game_config: GameConfig,
    config: EnvConfig,
    level: Level,
    steps: u32,
    episodes: u64,
}

impl BomberEnv {
    pub fn new(
        def: LevelDef,
        game_config: GameConfig,
        config: EnvConfig,
    ) -> Result<Self, LevelError> {
        let level = Level::new(&def, &game_config, config.seed)?;
        debug_assert!(
            encoder::fits(&level),
            "map larger than the fixed observation grid"
        );
        Ok(Self {
            def,
            game_config,
            config,
            level,
            steps: 0,
            episodes: 0,
        })
    }

    /// Rebuild a fresh level from the stored map and return the initial
    /// observation.
    pub fn reset(&mut self) -> Result<(Observation, StepInfo), LevelError> {
        self.episodes += 1;
        self.level = Level::new(
            &self.def,
            &self.game_config,
            self.config.seed.wrapping_add(self.episodes),
        )?;
        self.steps = 0;
        Ok((encoder::encode(&self.level), self.info()))
    }

    /// Advance exactly one simulation tick.
    pub fn step(&mut self, action: Action) -> StepResult {
        self.steps += 1;

        self.level.tick(action.to_input());
        let state = self.level.final_state();
        let reward = self.compute_reward(action, state);
        let terminated = state != FinalState::Running;

        let mut truncated = self.level.out_of_bounds;
        if self.steps > self.config.max_episode_len {
            truncated = true;
            self.steps = 0;
        }

        StepResult {
            observation: encoder::encode(&self.level),
            reward,
            terminated,
            truncated,
            info: self.info(),
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    fn info(&self) -> StepInfo {
        let player = self.level.player_world_cell();
        StepInfo {
            tick: self.level.tick,
            enemies_remaining: self.level.enemy_count(),
            player_cell: [player.x, player.y],
            out_of_bounds: self.level.out_of_bounds,
        }
    }

    /// Dense shaped reward; every coefficient comes from RewardConfig.
    fn compute_reward(&self, action: Action, state: FinalState) -> f32 {
        let rc = &self.game_config.reward;
        let level = &self.level;
        let mut reward = 0.0;

        // A ticking bomb is progress toward opening the map
        if level.all_bombs().next().is_some() {
            reward += rc.bomb_active_bonus;
        }

        if action == Action::Wait {
            reward -= rc.idle_penalty;
        }
        if level.hit_wall_h || level.hit_wall_v {
            reward -= rc.wall_penalty;
        }

        // Standing near a bomb is a risk regardless of intent
        if let Some(dist) = level.nearest_bomb_distance() {
            if dist <= 1 {
                reward -= rc.bomb_adjacent_penalty;
            } else if dist == 2 {
                reward -= rc.bomb_close_penalty;
            }
        }

        // Hunt shaping: pull toward enemies, but only while safe —
        // rewarding approach while inside a blast range teaches suicide
        if !level.player_in_bomb_range() {
            if let Some(&dist) = level.enemy_path_distances().iter().min() {
                match dist {
                    0 | 1 => reward -= rc.enemy_contact_penalty,
                    2 => reward += rc.enemy_near_bonus,
                    3 => reward += rc.enemy_mid_bonus,
                    4 => reward += rc.enemy_far_bonus,
                    _ => {}
                }
            }
        }

        if level.enemy_damage {
            reward += rc.kill_bonus;
        }

        match state {
            FinalState::Win => reward += rc.win_bonus,
            FinalState::Lose => reward -= rc.lose_penalty,
            FinalState::Running => {}
        }

        reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::map;

    fn def_from(rows: &[&str]) -> map::LevelDef {
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

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.rules.hidden_bomb_chance = 0.0;
        config.rules.enemy_count = 0;
        config
    }

    fn quiet_env(max_episode_len: u32) -> BomberEnv {
        let def = def_from(&[
            "#######",
            "#P   G#",
            "#######",
        ]);
        let config = EnvConfig { max_episode_len, seed: 3 };
        BomberEnv::new(def, quiet_config(), config).unwrap()
    }

    #[test]
    fn action_index_round_trip() {
        for index in 0..Action::COUNT {
            let action = Action::from_index(index).unwrap();
            let input = action.to_input();
            match action {
                Action::Wait => assert!(input.movement.is_none() && !input.place_bomb),
                Action::Bomb => assert!(input.movement.is_none() && input.place_bomb),
                _ => assert!(input.movement.is_some() && !input.place_bomb),
            }
        }
        assert!(Action::from_index(6).is_none());
    }

    #[test]
    fn truncates_after_budget_and_resets_counter() {
        let mut env = quiet_env(5);

        // Exactly max_episode_len steps: never truncated
        for _ in 0..5 {
            let result = env.step(Action::Wait);
            assert!(!result.truncated);
            assert!(!result.terminated);
        }
        // Step max+1 truncates…
        let result = env.step(Action::Wait);
        assert!(result.truncated);
        // …and the counter restarted: the next budget runs in full
        for _ in 0..5 {
            let result = env.step(Action::Wait);
            assert!(!result.truncated);
        }
        assert!(env.step(Action::Wait).truncated);
    }

    #[test]
    fn reset_rebuilds_the_level() {
        let mut env = quiet_env(100);
        env.step(Action::Bomb);
        env.step(Action::Right);
        assert!(env.level().tick > 0);

        let (observation, info) = env.reset().unwrap();
        assert_eq!(env.level().tick, 0);
        assert_eq!(info.tick, 0);
        assert_eq!(observation.player_cell, [1, 1]);
        assert!(!observation.bomb_present);
    }

    #[test]
    fn wait_costs_the_idle_penalty() {
        let mut env = quiet_env(100);
        let rc = env.game_config.reward.clone();
        let result = env.step(Action::Wait);
        // No bombs, no enemies, no walls hit: idle penalty only
        assert!((result.reward + rc.idle_penalty).abs() < 1e-6);
    }

    #[test]
    fn losing_applies_the_terminal_penalty() {
        let def = def_from(&[
            "#####",
            "#P G#",
            "#####",
        ]);
        let mut config = quiet_config();
        config.timing.fuse_ticks = 2;
        config.timing.linger_ticks = 3;
        let mut env = BomberEnv::new(def, config, EnvConfig::default()).unwrap();

        env.step(Action::Bomb);
        let result = env.step(Action::Wait);
        assert!(result.terminated);
        assert!(result.reward < 0.0);
        assert_eq!(env.level().final_state(), FinalState::Lose);
    }

    #[test]
    fn winning_terminates_with_bonus() {
        let def = def_from(&[
            "#####",
            "#PG #",
            "#####",
        ]);
        let mut env = BomberEnv::new(def, quiet_config(), EnvConfig::default()).unwrap();

        let mut last = env.step(Action::Wait);
        for _ in 0..40 {
            if last.terminated {
                break;
            }
            last = env.step(Action::Right);
        }
        assert!(last.terminated);
        assert_eq!(env.level().final_state(), FinalState::Win);
        assert!(last.reward > 0.0);
    }

    #[test]
    fn info_tracks_enemies() {
        let def = def_from(&[
            "##########",
            "#P   E  G#",
            "##########",
        ]);
        let mut env = BomberEnv::new(def, quiet_config(), EnvConfig::default()).unwrap();
        let result = env.step(Action::Wait);
        assert_eq!(result.info.enemies_remaining, 1);
    }
}
