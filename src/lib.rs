/// Grid Bomber: the simulation core, configuration, and RL environment.
///
/// The binary (`main.rs`) adds the terminal presentation on top; training
/// harnesses link against this library and drive `rl::env::BomberEnv`.

pub mod config;
pub mod domain;
pub mod rl;
pub mod sim;
pub mod ui;
