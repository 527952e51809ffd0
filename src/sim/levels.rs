//! Level table
//!
//! Ten levels derived once from linear difficulty curves. Index 0 is level 1.

use std::sync::LazyLock;

use crate::consts::LEVEL_COUNT;
use crate::lerp;

pub const WORDS_EASY: &[&str] = &[
    "neon", "arcade", "laser", "shift", "type", "pilot", "score", "combo", "spark", "wave", "nova",
    "drift", "glow", "bolt", "trail", "vita", "kana", "pixel", "grid", "chrome", "vapor", "retro",
    "japan", "tokyo", "speed", "boost", "hype", "dash", "flame",
];

pub const WORDS_MED: &[&str] = &[
    "afterburn", "synthesis", "hologram", "cyberline", "starlight", "turbowave", "polychrome",
    "flicker", "overdrive", "nighttrain", "skybridge", "magnetic", "chromatic", "vectorized",
    "hyperjump", "nanoforge", "rainmaker", "phasegate", "sideload", "monorail",
];

pub const WORDS_HARD: &[&str] = &[
    "interference", "electrostatic", "parallaxing", "synchronizer", "microprocessor",
    "hyperspectral", "transcontinental", "neuroplastic", "deterministic", "antigravity",
    "spectrograph", "electromancer", "autocorrelation", "metachronistic",
];

const BOSS_NAMES: [&str; LEVEL_COUNT] = [
    "SIGNAL WRAITH",
    "VECTOR OGRE",
    "PLASMA SHOGUN",
    "HOLO TITAN",
    "CHROME MONOLITH",
    "SYNC LEVIATHAN",
    "STATIC EMPRESS",
    "LOGIC DRAGON",
    "NIGHT ENGINE",
    "FINAL ELECTROMANCER",
];

const BOSS_SEGMENTS: [&[&str]; LEVEL_COUNT] = [
    &["neon", "express", "boss"],
    &["turbo", "arcade", "guardian"],
    &["hyper", "vector", "shogun"],
    &["plasma", "hologram", "sentinel"],
    &["chromatic", "overdrive", "monolith"],
    &["afterburn", "synchronizer", "leviathan"],
    &["electrostatic", "interference", "stormcaller"],
    &["microprocessor", "deterministic", "starforged"],
    &["hyperspectral", "transcontinental", "nightengine"],
    &["metachronistic", "autocorrelation", "electromancer"],
];

/// Boss encounter for a level
#[derive(Debug, Clone)]
pub struct BossDescriptor {
    pub name: &'static str,
    pub segments: &'static [&'static str],
    /// Minions per second during the fight
    pub minion_rate: f32,
    /// Hazard pulses per second during the fight
    pub hazard_rate: f32,
}

/// Static configuration for one level
#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// 1-based level number
    pub level: u32,
    /// Enemy speed (px/s)
    pub base_speed: f32,
    /// Enemies per second
    pub spawn_rate: f32,
    pub max_enemies: usize,
    pub word_min: usize,
    pub word_max: usize,
    /// Chance an enemy is a single letter
    pub letter_ratio: f32,
    /// Seconds of wave before the boss arrives
    pub duration: f32,
    /// Seconds between powerup spawn attempts
    pub powerup_interval: f32,
    pub boss: BossDescriptor,
}

impl LevelConfig {
    fn build(index: usize) -> Self {
        let t = index as f32 / (LEVEL_COUNT - 1) as f32;
        Self {
            level: index as u32 + 1,
            base_speed: lerp(95.0, 210.0, t),
            spawn_rate: lerp(0.75, 1.8, t),
            max_enemies: lerp(6.0, 14.0, t).round() as usize,
            word_min: lerp(3.0, 7.0, t).round() as usize,
            word_max: lerp(5.0, 12.0, t).round() as usize,
            letter_ratio: lerp(0.78, 0.25, t),
            duration: lerp(26.0, 38.0, t).round(),
            powerup_interval: lerp(8.8, 6.4, t),
            boss: BossDescriptor {
                name: BOSS_NAMES[index],
                segments: BOSS_SEGMENTS[index],
                minion_rate: lerp(0.35, 0.75, t),
                hazard_rate: lerp(0.0, 0.55, t),
            },
        }
    }

    /// Word pool for this level's difficulty tier
    pub fn word_pool(&self) -> &'static [&'static str] {
        match self.level {
            0..=3 => WORDS_EASY,
            4..=6 => WORDS_MED,
            _ => WORDS_HARD,
        }
    }

    /// Chance a word kill drops a bonus powerup
    pub fn drop_chance(&self) -> f64 {
        lerp(0.08, 0.18, (self.level - 1) as f32 / 9.0) as f64
    }

    /// Chance a powerup spawn attempt succeeds
    pub fn powerup_chance(&self) -> f64 {
        if self.level <= 2 { 0.55 } else { 0.72 }
    }
}

static LEVELS: LazyLock<Vec<LevelConfig>> =
    LazyLock::new(|| (0..LEVEL_COUNT).map(LevelConfig::build).collect());

/// All levels, in order
pub fn levels() -> &'static [LevelConfig] {
    &LEVELS
}

/// Config for a 0-based level index (clamped to the last level)
pub fn level_config(index: usize) -> &'static LevelConfig {
    &LEVELS[index.min(LEVEL_COUNT - 1)]
}

/// Index of the final level
pub const LAST_LEVEL_INDEX: usize = LEVEL_COUNT - 1;
