//! TypeR 198X - An arcade typing shmup
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, typing, spawning, combat)
//! - `run`: Run/save controller (new run, continue, restart, autosave)
//! - `persistence`: Save snapshot shape and storage ports
//! - `platform`: Input normalization and presentation sink
//! - `audio`: Audio cue sink (Web Audio on wasm)
//! - `settings`: Player preferences

pub mod audio;
pub mod persistence;
pub mod platform;
pub mod run;
pub mod settings;
pub mod sim;

pub use audio::{AudioCue, AudioSink, NullAudio};
pub use persistence::{MemoryStore, SaveSnapshot, SaveStore};
pub use run::RunController;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Largest simulation step per frame (seconds); bounds hitches and tab switches
    pub const MAX_DT: f32 = 0.05;

    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 1280.0;
    pub const FIELD_HEIGHT: f32 = 720.0;

    /// Player ship position (fixed during play)
    pub const PLAYER_X: f32 = 160.0;
    pub const PLAYER_Y: f32 = 360.0;
    /// Enemies past `PLAYER_X + ENEMY_IMPACT_OFFSET` hit the ship
    pub const ENEMY_IMPACT_OFFSET: f32 = 35.0;
    /// Powerups past `PLAYER_X + POWERUP_MISS_OFFSET` are lost
    pub const POWERUP_MISS_OFFSET: f32 = 60.0;

    /// Player health
    pub const START_MAX_HP: f32 = 100.0;
    pub const MAX_HP_PER_LEVEL: f32 = 10.0;
    pub const MAX_HP_CAP: f32 = 200.0;
    /// Shield seconds lost per point of damage absorbed
    pub const SHIELD_DAMAGE_FACTOR: f32 = 0.1;

    /// Seconds granted by a powerup pickup
    pub const POWER_DURATION: f32 = 9.0;

    /// Scoring
    pub const SCORE_LETTER: u64 = 55;
    pub const SCORE_WORD_BASE: u64 = 75;
    pub const SCORE_PER_CHAR: u64 = 10;
    pub const SCORE_POWERUP: u64 = 120;
    pub const MISS_PENALTY: u64 = 15;
    pub const BOSS_BONUS_BASE: u64 = 2500;
    pub const BOSS_BONUS_PER_LEVEL: u64 = 450;

    /// Combo brackets for the score multiplier
    pub const COMBO_TIER_2: u32 = 15;
    pub const COMBO_TIER_3: u32 = 30;

    /// Lock release chance on a miss in late levels
    pub const LOCK_RELEASE_MIN_LEVEL: u32 = 6;
    pub const LOCK_RELEASE_CHANCE: f64 = 0.35;

    /// Boss hazard pulses
    pub const HAZARD_MIN_LEVEL: u32 = 4;
    pub const HAZARD_COMBO_IMMUNITY: u32 = 4;
    pub const HAZARD_CHANCE: f64 = 0.55;
    pub const HAZARD_DAMAGE: f32 = 6.0;

    /// Boss finale (scripted explosions before the level transition)
    pub const FINALE_DURATION: f32 = 6.0;
    pub const FINALE_BURST_INTERVAL: f32 = 0.5;

    /// Boss anchor
    pub const BOSS_X: f32 = 980.0;
    pub const BOSS_Y: f32 = 240.0;

    /// Number of levels
    pub const LEVEL_COUNT: usize = 10;

    /// Minimum time between throttled saves (milliseconds)
    pub const SAVE_THROTTLE_MS: f64 = 1500.0;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
