//! Persisted save shape
//!
//! JSON keys are camelCase. Every struct is `#[serde(default)]`, so a partial
//! or older save merges over the defaults instead of failing to load.
//! Counters clamp out-of-range numbers, and a `run` that still can't be read
//! is dropped on its own so the profile survives.

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{GameState, PowerTimers, ShipId};

/// Everything kept between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveSnapshot {
    pub player_name: String,
    pub selected_ship: ShipId,
    #[serde(deserialize_with = "lenient_u64")]
    pub high_score: u64,
    /// Highest level (1-based) the player may start from
    #[serde(deserialize_with = "lenient_u32")]
    pub last_unlocked_level: u32,
    pub settings: Settings,
    /// Run in progress, `None` when there's nothing to continue
    #[serde(deserialize_with = "lenient_run")]
    pub run: Option<RunSnapshot>,
}

impl Default for SaveSnapshot {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            selected_ship: ShipId::default(),
            high_score: 0,
            last_unlocked_level: 1,
            settings: Settings::default(),
            run: None,
        }
    }
}

impl SaveSnapshot {
    /// Parse a stored save, merging missing fields over defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Score counters as stored; `mult` is informational only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    #[serde(deserialize_with = "lenient_u64")]
    pub score: u64,
    #[serde(deserialize_with = "lenient_u32")]
    pub combo: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub mult: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub correct: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub total: u32,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            score: 0,
            combo: 0,
            mult: 1,
            correct: 0,
            total: 0,
        }
    }
}

/// Projection of an in-progress run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunSnapshot {
    #[serde(deserialize_with = "lenient_usize")]
    pub level_index: usize,
    #[serde(alias = "levelT")]
    pub level_elapsed_t: f32,
    pub in_boss: bool,
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub power: PowerTimers,
    pub stats: StatsSnapshot,
    pub spawn_acc: f32,
    pub power_acc: f32,
    pub minion_acc: f32,
    pub hazard_acc: f32,
    pub ship_id: ShipId,
}

impl Default for RunSnapshot {
    fn default() -> Self {
        Self {
            level_index: 0,
            level_elapsed_t: 0.0,
            in_boss: false,
            hp: START_MAX_HP,
            max_hp: START_MAX_HP,
            shield: 0.0,
            power: PowerTimers::default(),
            stats: StatsSnapshot::default(),
            spawn_acc: 0.0,
            power_acc: 0.0,
            minion_acc: 0.0,
            hazard_acc: 0.0,
            ship_id: ShipId::default(),
        }
    }
}

/// Any JSON number, clamped to `0..` (fractions truncate, huge values saturate)
fn non_negative<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(if value.is_finite() { value.max(0.0) } else { 0.0 })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    non_negative(deserializer).map(|v| v as u64)
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    non_negative(deserializer).map(|v| v as u32)
}

fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    non_negative(deserializer).map(|v| v as usize)
}

fn lenient_run<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RunSnapshot>, D::Error> {
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match RunSnapshot::deserialize(value) {
        Ok(run) => Ok(Some(run)),
        Err(err) => {
            log::warn!("Dropping unreadable saved run: {err}");
            Ok(None)
        }
    }
}

impl RunSnapshot {
    /// Capture the persisted parts of a live run
    pub fn capture(state: &GameState) -> Self {
        Self {
            level_index: state.level_index,
            level_elapsed_t: state.level_t,
            in_boss: state.in_boss_phase(),
            hp: state.player.hp,
            max_hp: state.player.max_hp,
            shield: state.player.shield,
            power: state.power,
            stats: StatsSnapshot {
                score: state.stats.score,
                combo: state.stats.combo,
                mult: state.multiplier(),
                correct: state.stats.correct,
                total: state.stats.total,
            },
            spawn_acc: state.acc.spawn,
            power_acc: state.acc.power,
            minion_acc: state.acc.minion,
            hazard_acc: state.acc.hazard,
            ship_id: state.player.ship,
        }
    }

    /// Fresh start of `level_index` keeping only the ship and max hp
    pub fn seed(level_index: usize, max_hp: f32, ship_id: ShipId) -> Self {
        Self {
            level_index,
            hp: max_hp,
            max_hp,
            ship_id,
            ..Self::default()
        }
    }
}
