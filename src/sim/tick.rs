//! Frame tick
//!
//! One variable-dt step per animation frame, clamped to `MAX_DT`. Typing is
//! handled separately and synchronously by `typing::handle_typed`.

use glam::Vec2;

use super::combat;
use super::director;
use super::state::{GameMode, GameState};
use crate::consts::*;

/// Advance the game by `dt` seconds (no-op unless playing)
pub fn tick(state: &mut GameState, dt: f32) {
    if state.mode != GameMode::Playing {
        return;
    }
    let dt = dt.clamp(0.0, MAX_DT);

    state.level_t += dt;
    state.flash = (state.flash - dt * 3.0).max(0.0);
    state.screen_shake = (state.screen_shake - dt * 12.0).max(0.0);

    state.power.tick(dt);
    state.player.shield = (state.player.shield - dt).max(0.0);

    director::step_director(state, dt);
    combat::step_finale(state, dt);

    update_entities(state, dt);
}

/// Pause toggle (only between playing and paused)
pub fn toggle_pause(state: &mut GameState) {
    match state.mode {
        GameMode::Playing => state.set_mode(GameMode::Paused),
        GameMode::Paused => state.set_mode(GameMode::Playing),
        _ => {}
    }
}

fn update_entities(state: &mut GameState, dt: f32) {
    let player_x = state.player.pos.x;

    // Enemies that reach the ship hit it
    let mut impacts: Vec<(f32, f32)> = Vec::new();
    for enemy in state.enemies.iter_mut().filter(|e| e.alive) {
        enemy.update(dt);
        if enemy.pos.x < player_x + ENEMY_IMPACT_OFFSET {
            enemy.alive = false;
            enemy.locked = false;
            let damage = 12.0 + (enemy.text.len() as f32 * 2.0).min(12.0);
            impacts.push((damage, enemy.pos.y));
        }
    }
    for (damage, y) in impacts {
        combat::take_damage(state, damage);
        combat::add_explosion(state, Vec2::new(player_x + 40.0, y), 18.0);
    }

    // Missed powerups just fade out
    for powerup in state.powerups.iter_mut().filter(|p| p.alive) {
        powerup.update(dt);
        if powerup.pos.x < player_x + POWERUP_MISS_OFFSET {
            powerup.alive = false;
            powerup.locked = false;
        }
    }

    if let Some(boss) = state.boss.as_mut() {
        boss.update(dt);
    }

    for bullet in &mut state.bullets {
        bullet.update(dt);
    }
    state.bullets.retain(|b| b.is_alive());

    for particle in &mut state.particles {
        particle.update(dt);
    }
    state.particles.retain(|p| p.is_alive());

    state.enemies.retain(|e| e.alive);
    state.powerups.retain(|p| p.alive);

    if state.lock.is_some() && !state.lock_is_live() {
        state.lock = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::{Enemy, EnemyKind};
    use crate::sim::state::{GameEvent, LockTarget, WavePhase};
    use crate::sim::typing::{TypeOutcome, handle_typed};

    fn playing_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.begin_level(0);
        state.set_mode(GameMode::Playing);
        state.drain_events();
        state
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = playing_state(1);
        tick(&mut state, 2.0);
        assert!((state.level_t - MAX_DT).abs() < 1e-6);
        tick(&mut state, -1.0);
        assert!((state.level_t - MAX_DT).abs() < 1e-6);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = playing_state(1);
        toggle_pause(&mut state);
        assert_eq!(state.mode, GameMode::Paused);

        tick(&mut state, 0.016);
        assert_eq!(state.level_t, 0.0);

        toggle_pause(&mut state);
        assert_eq!(state.mode, GameMode::Playing);
        tick(&mut state, 0.016);
        assert!(state.level_t > 0.0);
    }

    #[test]
    fn test_timers_count_down() {
        let mut state = playing_state(1);
        state.power.spread = 1.0;
        state.player.shield = 0.02;
        tick(&mut state, 0.04);
        assert!((state.power.spread - 0.96).abs() < 1e-5);
        assert_eq!(state.player.shield, 0.0);
    }

    #[test]
    fn test_enemy_reaching_ship_deals_damage_and_drops_lock() {
        let mut state = playing_state(1);
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyKind::Wave,
            "laser",
            Vec2::new(PLAYER_X + ENEMY_IMPACT_OFFSET + 1.0, 300.0),
            100.0,
        ));
        handle_typed(&mut state, 'l');
        assert_eq!(state.lock, Some(LockTarget::Enemy(id)));

        tick(&mut state, 0.02);
        assert!(state.enemies.is_empty());
        assert!(state.lock.is_none());
        assert_eq!(state.player.hp, START_MAX_HP - 22.0);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = playing_state(99999);
        let mut state2 = playing_state(99999);

        for _ in 0..600 {
            tick(&mut state1, 1.0 / 60.0);
            tick(&mut state2, 1.0 / 60.0);
        }

        let texts1: Vec<_> = state1.enemies.iter().map(|e| e.text.clone()).collect();
        let texts2: Vec<_> = state2.enemies.iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts1, texts2);
        assert_eq!(state1.player.hp, state2.player.hp);
        assert!((state1.level_t - state2.level_t).abs() < 1e-6);
    }

    #[test]
    fn test_full_level_flow() {
        let mut state = playing_state(7);
        state.player.hp = 10_000.0;
        state.player.max_hp = 10_000.0;

        // Wave until the boss arrives
        let mut frames = 0;
        while state.phase == WavePhase::Wave {
            tick(&mut state, 1.0 / 30.0);
            frames += 1;
            assert!(frames < 10_000);
        }
        assert_eq!(state.phase, WavePhase::BossFight);
        assert!(state.level_t >= state.level().duration);

        // Type the boss down; finale holds off the transition
        let words: Vec<String> = state
            .boss
            .as_ref()
            .map(|b| b.segments.clone())
            .unwrap_or_default();
        let mut outcome = TypeOutcome::Ignored;
        for ch in words.concat().chars() {
            outcome = handle_typed(&mut state, ch);
        }
        assert_eq!(outcome, TypeOutcome::BossDefeated);
        assert!(state.in_finale());

        tick(&mut state, 1.0 / 30.0);
        assert_eq!(state.mode, GameMode::Playing);
        assert!(state.enemies.is_empty());

        let mut frames = 0;
        while state.mode == GameMode::Playing {
            tick(&mut state, MAX_DT);
            frames += 1;
            assert!(frames < 200);
        }
        assert_eq!(state.mode, GameMode::LevelComplete);
        assert!(frames as f32 * MAX_DT >= FINALE_DURATION - 0.1);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::LevelCleared { level: 1 }))
        );
    }
}
