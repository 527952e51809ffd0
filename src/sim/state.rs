//! Game state and core simulation types
//!
//! Everything the frame loop mutates lives on `GameState`. The persisted
//! projection of it is `persistence::RunSnapshot`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entities::{Boss, Bullet, Enemy, EntityId, Particle, Powerup};
use super::levels::{LevelConfig, level_config};
use crate::audio::AudioCue;
use crate::consts::*;

/// Top-level mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Menu,
    Playing,
    Paused,
    LevelComplete,
    GameOver,
    Victory,
}

impl GameMode {
    /// Run is over for good (no further ticks until a new run/retry)
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameMode::GameOver | GameMode::Victory)
    }
}

/// Wave sub-state while playing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WavePhase {
    /// Ordinary spawning before the boss
    Wave,
    /// Boss on screen, all input goes to it
    BossFight,
    /// Boss beaten, scripted explosions before the level transition
    Finale {
        /// Seconds until the transition fires
        remaining: f32,
        /// Seconds until the next explosion burst
        burst_timer: f32,
    },
}

/// The single non-boss entity receiving typed input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    Enemy(EntityId),
    Powerup(EntityId),
}

/// Cosmetic ship choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipId {
    LittleDarkOne,
    Sofrito,
    Honeybee,
    /// Unknown ids load as the default ship
    #[default]
    #[serde(other)]
    Coconut,
}

impl ShipId {
    pub const ALL: [ShipId; 4] = [
        ShipId::Coconut,
        ShipId::LittleDarkOne,
        ShipId::Sofrito,
        ShipId::Honeybee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipId::Coconut => "coconut",
            ShipId::LittleDarkOne => "little-dark-one",
            ShipId::Sofrito => "sofrito",
            ShipId::Honeybee => "honeybee",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShipId::Coconut => "The S.S. Coconut",
            ShipId::LittleDarkOne => "The S.S. Little Dark One",
            ShipId::Sofrito => "The S.S. Sofrito",
            ShipId::Honeybee => "The S.S. HoneyBee",
        }
    }

    /// Parse an id, falling back to the default ship
    pub fn from_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|ship| ship.as_str() == id)
            .unwrap_or_default()
    }
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Seconds of shield remaining
    pub shield: f32,
    pub ship: ShipId,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, PLAYER_Y),
            hp: START_MAX_HP,
            max_hp: START_MAX_HP,
            shield: 0.0,
            ship: ShipId::default(),
        }
    }
}

/// Score and keystroke counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub score: u64,
    /// Consecutive correct keystrokes since the last miss
    pub combo: u32,
    pub correct: u32,
    pub total: u32,
}

impl RunStats {
    /// Accuracy in percent, 100 before any keystroke
    pub fn accuracy_pct(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Seconds remaining on each timed power
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerTimers {
    pub spread: f32,
    pub pierce: f32,
    pub rapid: f32,
    pub multiplier: f32,
}

impl PowerTimers {
    pub fn tick(&mut self, dt: f32) {
        self.spread = (self.spread - dt).max(0.0);
        self.pierce = (self.pierce - dt).max(0.0);
        self.rapid = (self.rapid - dt).max(0.0);
        self.multiplier = (self.multiplier - dt).max(0.0);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Fractional spawn accumulators; each emits one spawn per whole unit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnAccumulators {
    pub spawn: f32,
    pub power: f32,
    pub minion: f32,
    pub hazard: f32,
}

/// Side effects requested by the core, drained by the run controller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(AudioCue),
    ModeChanged(GameMode),
    BossIncoming { name: &'static str },
    BossDefeated { level: u32, bonus: u64 },
    LevelCleared { level: u32 },
    GameOver { score: u64 },
    Victory { score: u64 },
}

/// Maximum particles kept alive
pub const MAX_PARTICLES: usize = 256;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub mode: GameMode,
    /// Current level (0-based)
    pub level_index: usize,
    /// Seconds spent in the current level
    pub level_t: f32,
    pub phase: WavePhase,
    pub player: Player,
    pub stats: RunStats,
    pub power: PowerTimers,
    pub acc: SpawnAccumulators,
    /// Live enemies (wave and minions)
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<Powerup>,
    pub boss: Option<Boss>,
    pub lock: Option<LockTarget>,
    /// Beams and particles (not gameplay-affecting)
    pub bullets: Vec<Bullet>,
    pub particles: Vec<Particle>,
    pub screen_shake: f32,
    pub flash: f32,
    /// Highest level the player may start from (1..=10)
    pub last_unlocked_level: u32,
    /// Pending side effects
    pub events: Vec<GameEvent>,
    rng: Pcg32,
    next_id: EntityId,
}

impl GameState {
    /// Create a state parked in the menu
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            mode: GameMode::Menu,
            level_index: 0,
            level_t: 0.0,
            phase: WavePhase::Wave,
            player: Player::default(),
            stats: RunStats::default(),
            power: PowerTimers::default(),
            acc: SpawnAccumulators::default(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            boss: None,
            lock: None,
            bullets: Vec::new(),
            particles: Vec::new(),
            screen_shake: 0.0,
            flash: 0.0,
            last_unlocked_level: 1,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Config of the current level
    pub fn level(&self) -> &'static LevelConfig {
        level_config(self.level_index)
    }

    /// Current score multiplier, derived from combo and the MULTI timer
    pub fn multiplier(&self) -> u32 {
        super::combat::combo_multiplier(self.stats.combo, self.power.multiplier > 0.0)
    }

    pub fn in_boss_phase(&self) -> bool {
        !matches!(self.phase, WavePhase::Wave)
    }

    pub fn in_finale(&self) -> bool {
        matches!(self.phase, WavePhase::Finale { .. })
    }

    /// Switch mode, recording the transition once
    pub fn set_mode(&mut self, mode: GameMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.events.push(GameEvent::ModeChanged(mode));
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: AudioCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Screen shake keeps the strongest pending request
    pub fn request_shake(&mut self, amount: f32) {
        self.screen_shake = self.screen_shake.max(amount);
    }

    pub fn request_flash(&mut self, amount: f32) {
        self.flash = self.flash.max(amount);
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn powerup_mut(&mut self, id: EntityId) -> Option<&mut Powerup> {
        self.powerups.iter_mut().find(|p| p.id == id)
    }

    /// Whether the current lock still points at a live entity
    pub fn lock_is_live(&self) -> bool {
        match self.lock {
            Some(LockTarget::Enemy(id)) => self.enemies.iter().any(|e| e.id == id && e.alive),
            Some(LockTarget::Powerup(id)) => self.powerups.iter().any(|p| p.id == id && p.alive),
            None => false,
        }
    }

    /// Drop the lock and clear the referent's flag
    pub fn release_lock(&mut self) {
        match self.lock.take() {
            Some(LockTarget::Enemy(id)) => {
                if let Some(enemy) = self.enemy_mut(id) {
                    enemy.locked = false;
                }
            }
            Some(LockTarget::Powerup(id)) => {
                if let Some(powerup) = self.powerup_mut(id) {
                    powerup.locked = false;
                }
            }
            None => {}
        }
    }

    /// Clear the field and level timers for a fresh start of `level_index`
    pub fn begin_level(&mut self, level_index: usize) {
        self.level_index = level_index.min(super::levels::LAST_LEVEL_INDEX);
        self.level_t = 0.0;
        self.phase = WavePhase::Wave;
        self.acc = SpawnAccumulators::default();
        self.enemies.clear();
        self.powerups.clear();
        self.bullets.clear();
        self.particles.clear();
        self.boss = None;
        self.lock = None;
        self.screen_shake = 0.0;
        self.flash = 0.0;
    }
}
