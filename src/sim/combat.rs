//! Combat resolution
//!
//! Damage, scoring, powerup effects and the boss-defeat sequence. Also owns
//! the visual effect requests (beams, sparks, explosions) that accompany them.

use glam::Vec2;
use rand::Rng;

use super::entities::{BeamColor, Bullet, EntityId, Particle, PowerupKind};
use super::levels::LAST_LEVEL_INDEX;
use super::state::{GameEvent, GameMode, GameState, MAX_PARTICLES, WavePhase};
use crate::audio::AudioCue;
use crate::consts::*;

/// Score multiplier for a combo, doubled while MULTI is active.
/// A broken combo (0) is always 1 until the next correct key.
pub fn combo_multiplier(combo: u32, multi_active: bool) -> u32 {
    let base = if combo >= COMBO_TIER_3 {
        3
    } else if combo >= COMBO_TIER_2 {
        2
    } else {
        1
    };
    if multi_active && combo > 0 {
        base * 2
    } else {
        base
    }
}

/// Pre-multiplier score for destroying an enemy with `len` characters
pub fn enemy_base_score(len: usize) -> u64 {
    if len <= 1 {
        SCORE_LETTER
    } else {
        SCORE_WORD_BASE + SCORE_PER_CHAR * len as u64
    }
}

/// Bonus for beating the boss of `level` (1-based)
pub fn boss_bonus(level: u32) -> u64 {
    BOSS_BONUS_BASE + BOSS_BONUS_PER_LEVEL * level as u64
}

/// New unlock watermark after clearing `completed_level`; never lowers it
pub fn raise_unlock_watermark(current: u32, completed_level: u32) -> u32 {
    current.max((completed_level + 1).min(LEVEL_COUNT as u32))
}

/// Apply damage to the player; the shield soaks it first
pub fn take_damage(state: &mut GameState, amount: f32) {
    if state.mode.is_terminal() {
        return;
    }

    if state.player.shield > 0.0 {
        state.player.shield = (state.player.shield - amount * SHIELD_DAMAGE_FACTOR).max(0.0);
        state.request_shake(4.0);
        return;
    }

    state.player.hp = (state.player.hp - amount).max(0.0);
    state.request_shake(8.0);
    state.request_flash(0.14);

    if state.player.hp <= 0.0 {
        game_over(state);
    }
}

fn game_over(state: &mut GameState) {
    state.release_lock();
    log::info!(
        "Game over on level {} (score {})",
        state.level().level,
        state.stats.score
    );
    let score = state.stats.score;
    state.emit(GameEvent::GameOver { score });
    state.set_mode(GameMode::GameOver);
}

/// Destroy a fully typed enemy and award its score
pub fn kill_enemy(state: &mut GameState, id: EntityId) {
    let mult = state.multiplier() as u64;
    let Some(enemy) = state.enemy_mut(id) else {
        return;
    };
    enemy.alive = false;
    enemy.locked = false;
    let len = enemy.text.chars().count();
    let pos = enemy.pos;

    state.stats.score += enemy_base_score(len) * mult;

    add_explosion(state, pos, 14.0 + len as f32 * 2.0);
    state.sound(AudioCue::Explosion);
    state.request_shake(4.0);

    if len >= 4 {
        let chance = state.level().drop_chance();
        if state.rng().random_bool(chance) {
            super::director::spawn_powerup(state);
        }
    }
}

/// Collect a fully typed powerup: flat score plus a refreshed timer
pub fn collect_powerup(state: &mut GameState, id: EntityId) {
    let mult = state.multiplier() as u64;
    let Some(powerup) = state.powerup_mut(id) else {
        return;
    };
    powerup.alive = false;
    powerup.locked = false;
    let kind = powerup.kind;
    let pos = powerup.pos;

    state.sound(AudioCue::Powerup);
    add_explosion(state, pos, 22.0);
    state.stats.score += SCORE_POWERUP * mult;

    // Refresh, never stack
    let timer = match kind {
        PowerupKind::Spread => &mut state.power.spread,
        PowerupKind::Pierce => &mut state.power.pierce,
        PowerupKind::Rapid => &mut state.power.rapid,
        PowerupKind::Shield => &mut state.player.shield,
        PowerupKind::Multi => &mut state.power.multiplier,
    };
    *timer = timer.max(POWER_DURATION);
}

/// Final boss segment typed: bonus, unlock, then the finale
pub fn defeat_boss(state: &mut GameState) {
    let completed = state.level().level;
    let bonus = boss_bonus(completed);

    state.stats.score += bonus;
    state.last_unlocked_level = raise_unlock_watermark(state.last_unlocked_level, completed);

    let boss_pos = match state.boss.as_mut() {
        Some(boss) => {
            boss.alive = false;
            boss.pos
        }
        None => Vec2::new(BOSS_X, BOSS_Y),
    };

    // Minions and stray powerups go down with the boss
    state.lock = None;
    state.enemies.clear();
    state.powerups.clear();

    state.sound(AudioCue::BigExplosion);
    state.request_shake(10.0);
    add_explosion(state, boss_pos - Vec2::new(150.0, 0.0), 40.0);

    log::info!("Boss of level {} defeated (+{})", completed, bonus);
    state.emit(GameEvent::BossDefeated {
        level: completed,
        bonus,
    });
    state.phase = WavePhase::Finale {
        remaining: FINALE_DURATION,
        burst_timer: FINALE_BURST_INTERVAL,
    };
}

/// Advance the finale; fires the level transition when it runs out
pub fn step_finale(state: &mut GameState, dt: f32) {
    let WavePhase::Finale {
        remaining,
        burst_timer,
    } = state.phase
    else {
        return;
    };

    let remaining = remaining - dt;
    let mut burst_timer = burst_timer - dt;
    let mut bursts = 0;
    while burst_timer <= 0.0 {
        burst_timer += FINALE_BURST_INTERVAL;
        bursts += 1;
    }
    state.phase = WavePhase::Finale {
        remaining,
        burst_timer,
    };

    let center = state
        .boss
        .as_ref()
        .map(|b| b.pos)
        .unwrap_or(Vec2::new(BOSS_X, BOSS_Y));
    for _ in 0..bursts {
        let offset = Vec2::new(
            state.rng().random_range(-160.0..40.0),
            state.rng().random_range(-90.0..90.0),
        );
        add_explosion(state, center + offset, 28.0);
        state.sound(AudioCue::Explosion);
        state.request_shake(6.0);
    }

    if remaining <= 0.0 {
        finish_level(state);
    }
}

fn finish_level(state: &mut GameState) {
    state.boss = None;
    state.phase = WavePhase::Wave;
    let level = state.level().level;
    let score = state.stats.score;

    if state.level_index >= LAST_LEVEL_INDEX {
        log::info!("Victory! Final score {}", score);
        state.emit(GameEvent::Victory { score });
        state.set_mode(GameMode::Victory);
        return;
    }

    let (max_hp, hp) = cleared_level_hp(state.player.max_hp, state.player.hp);
    state.player.max_hp = max_hp;
    state.player.hp = hp;
    log::info!("Level {} cleared", level);
    state.emit(GameEvent::LevelCleared { level });
    state.set_mode(GameMode::LevelComplete);
}

/// `(max_hp, hp)` after clearing a level
pub fn cleared_level_hp(max_hp: f32, hp: f32) -> (f32, f32) {
    let max_hp = (max_hp + MAX_HP_PER_LEVEL).min(MAX_HP_CAP);
    (max_hp, (hp + MAX_HP_PER_LEVEL).min(max_hp))
}

// === Effects ===

/// Fire a beam from the ship at `target` (extra beams while SPREAD is active)
pub fn fire_laser(state: &mut GameState, target: Vec2, color: BeamColor) {
    let from = state.player.pos + Vec2::new(20.0, 0.0);
    state.bullets.push(Bullet::new(from, target, 3.0, color));

    if state.power.spread > 0.0 {
        for (lo, hi) in [(-80.0, -20.0), (20.0, 80.0)] {
            let dx = state.rng().random_range(-20.0..20.0);
            let dy = state.rng().random_range(lo..hi);
            let to = target + Vec2::new(dx, dy);
            state.bullets.push(Bullet::new(from, to, 2.0, BeamColor::Magenta));
        }
    }
}

/// Beam colour reflects the strongest active power
pub fn beam_color(state: &GameState) -> BeamColor {
    if state.power.multiplier > 0.0 {
        BeamColor::Lime
    } else if state.power.spread > 0.0 {
        BeamColor::Magenta
    } else {
        BeamColor::Cyan
    }
}

pub fn add_sparks(state: &mut GameState, pos: Vec2, count: usize) {
    for _ in 0..count {
        let rng = state.rng();
        let particle = Particle {
            pos,
            vel: Vec2::new(rng.random_range(-120.0..120.0), rng.random_range(-120.0..120.0)),
            life: rng.random_range(0.12..0.26),
            t: 0.0,
            size: rng.random_range(1.0..2.8),
            hue: [185, 310, 95][rng.random_range(0..3)],
        };
        state.particles.push(particle);
    }
    cap_particles(state);
}

pub fn add_explosion(state: &mut GameState, pos: Vec2, size: f32) {
    let count = (size * 1.2) as usize;
    for _ in 0..count {
        let rng = state.rng();
        let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
        let r: f32 = rng.random_range(0.0..size.max(1.0));
        let dir = Vec2::new(angle.cos(), angle.sin());
        let particle = Particle {
            pos: pos + dir * r * 0.2,
            vel: dir * rng.random_range(80.0..320.0),
            life: rng.random_range(0.18..0.5),
            t: 0.0,
            size: rng.random_range(1.2..4.5),
            hue: [185, 310, 95, 40][rng.random_range(0..4)],
        };
        state.particles.push(particle);
    }
    cap_particles(state);
}

fn cap_particles(state: &mut GameState) {
    if state.particles.len() > MAX_PARTICLES {
        let excess = state.particles.len() - MAX_PARTICLES;
        state.particles.drain(..excess);
    }
}
