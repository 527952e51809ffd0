//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - dt clamped per tick
//! - No rendering, audio or storage dependencies (side effects go out as `GameEvent`s)

pub mod combat;
pub mod director;
pub mod entities;
pub mod levels;
pub mod state;
pub mod tick;
pub mod typing;

pub use entities::{
    BeamColor, Boss, BossAdvance, Bullet, Enemy, EnemyKind, EntityId, Particle, Powerup,
    PowerupKind, Typable,
};
pub use levels::{LAST_LEVEL_INDEX, LevelConfig, level_config, levels};
pub use state::{
    GameEvent, GameMode, GameState, LockTarget, Player, PowerTimers, RunStats, ShipId,
    SpawnAccumulators, WavePhase,
};
pub use tick::{tick, toggle_pause};
pub use typing::{TypeOutcome, handle_typed};
