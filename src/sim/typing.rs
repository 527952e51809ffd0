//! Typing / targeting engine
//!
//! Resolves one normalized character (lowercase letter or space) into lock
//! acquisition, progress, a kill/collect, or a miss.

use glam::Vec2;
use rand::Rng;

use super::combat;
use super::entities::{BossAdvance, Typable};
use super::state::{GameMode, GameState, LockTarget, WavePhase};
use crate::audio::AudioCue;
use crate::consts::*;

/// What a single keystroke did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    /// Correct key; target still has characters left
    Hit,
    /// Enemy destroyed
    Killed,
    /// Powerup collected
    Collected,
    /// Boss segment finished, more remain
    BossSegmentCleared,
    /// Final boss segment finished; finale starts
    BossDefeated,
    /// Wrong key. `had_target` is false for a miss with nothing to lock onto
    Miss { had_target: bool },
    /// No gameplay effect (not playing, or during the finale)
    Ignored,
}

/// Feed one typed character into the simulation
pub fn handle_typed(state: &mut GameState, ch: char) -> TypeOutcome {
    if state.mode != GameMode::Playing {
        return TypeOutcome::Ignored;
    }
    state.stats.total += 1;

    match state.phase {
        WavePhase::Finale { .. } => return TypeOutcome::Ignored,
        WavePhase::BossFight => return type_at_boss(state, ch),
        WavePhase::Wave => {}
    }

    if let Some(target) = state.lock {
        if state.lock_is_live() {
            return if expected_char(state, target) == Some(ch) {
                correct_key(state, target)
            } else {
                wrong_key(state, true)
            };
        }
        state.release_lock();
    }

    match acquire(state, ch) {
        Some(target) => correct_key(state, target),
        None => wrong_key(state, false),
    }
}

fn expected_char(state: &GameState, target: LockTarget) -> Option<char> {
    match target {
        LockTarget::Enemy(id) => state
            .enemies
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.next_char()),
        LockTarget::Powerup(id) => state
            .powerups
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.next_char()),
    }
}

/// Pick the leftmost live powerup starting with `ch`, else the leftmost enemy
fn acquire(state: &mut GameState, ch: char) -> Option<LockTarget> {
    let powerup = state
        .powerups
        .iter_mut()
        .filter(|p| p.alive && p.next_char() == Some(ch))
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
    if let Some(p) = powerup {
        p.locked = true;
        let target = LockTarget::Powerup(p.id);
        state.lock = Some(target);
        return Some(target);
    }

    let enemy = state
        .enemies
        .iter_mut()
        .filter(|e| e.alive && e.next_char() == Some(ch))
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
    if let Some(e) = enemy {
        e.locked = true;
        let target = LockTarget::Enemy(e.id);
        state.lock = Some(target);
        return Some(target);
    }

    None
}

fn correct_key(state: &mut GameState, target: LockTarget) -> TypeOutcome {
    state.stats.correct += 1;
    state.stats.combo += 1;
    let color = combat::beam_color(state);

    let (pos, complete) = match target {
        LockTarget::Enemy(id) => match state.enemy_mut(id) {
            Some(enemy) => {
                enemy.progress += 1;
                enemy.flash = 0.18;
                (enemy.pos, enemy.is_complete())
            }
            None => return TypeOutcome::Ignored,
        },
        LockTarget::Powerup(id) => match state.powerup_mut(id) {
            Some(powerup) => {
                powerup.progress += 1;
                (powerup.pos, powerup.is_complete())
            }
            None => return TypeOutcome::Ignored,
        },
    };

    combat::fire_laser(state, pos, color);
    state.sound(AudioCue::Laser);

    if complete {
        state.lock = None;
        return match target {
            LockTarget::Enemy(id) => {
                combat::kill_enemy(state, id);
                TypeOutcome::Killed
            }
            LockTarget::Powerup(id) => {
                combat::collect_powerup(state, id);
                TypeOutcome::Collected
            }
        };
    }

    if matches!(target, LockTarget::Enemy(_)) {
        state.sound(AudioCue::Hit);
    }
    combat::add_sparks(state, pos, 6);
    TypeOutcome::Hit
}

fn type_at_boss(state: &mut GameState, ch: char) -> TypeOutcome {
    let Some(boss) = state.boss.as_mut() else {
        return TypeOutcome::Ignored;
    };
    if boss.next_char() != Some(ch) {
        return wrong_key(state, true);
    }

    let advance = boss.advance();
    let boss_pos = boss.pos;
    state.stats.correct += 1;
    state.stats.combo += 1;

    let color = combat::beam_color(state);
    combat::fire_laser(state, boss_pos + Vec2::new(-140.0, 10.0), color);
    state.sound(AudioCue::Laser);
    state.sound(AudioCue::Hit);
    let jitter = state.rng().random_range(-40.0..40.0);
    combat::add_sparks(state, boss_pos + Vec2::new(-180.0, jitter), 10);

    match advance {
        BossAdvance::Progress => TypeOutcome::Hit,
        BossAdvance::SegmentCleared => TypeOutcome::BossSegmentCleared,
        BossAdvance::Defeated => {
            combat::defeat_boss(state);
            TypeOutcome::BossDefeated
        }
    }
}

/// Every miss breaks the combo. Only a miss with no target costs score; late
/// levels may also shake loose an enemy lock.
fn wrong_key(state: &mut GameState, had_target: bool) -> TypeOutcome {
    state.stats.combo = 0;
    state.sound(AudioCue::Error);
    state.request_flash(0.08);

    if !had_target {
        state.stats.score = state.stats.score.saturating_sub(MISS_PENALTY);
    }

    if matches!(state.lock, Some(LockTarget::Enemy(_)))
        && state.level().level >= LOCK_RELEASE_MIN_LEVEL
        && state.rng().random_bool(LOCK_RELEASE_CHANCE)
    {
        state.release_lock();
    }

    TypeOutcome::Miss { had_target }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::{Boss, Enemy, EnemyKind, EntityId, Powerup, PowerupKind};
    use proptest::prelude::*;

    fn playing_state(level_index: usize) -> GameState {
        let mut state = GameState::new(2024);
        state.begin_level(level_index);
        state.set_mode(GameMode::Playing);
        state.drain_events();
        state
    }

    fn push_enemy(state: &mut GameState, text: &str, x: f32) -> EntityId {
        let id = state.next_entity_id();
        state
            .enemies
            .push(Enemy::new(id, EnemyKind::Wave, text, Vec2::new(x, 300.0), 100.0));
        id
    }

    fn push_powerup(state: &mut GameState, kind: PowerupKind, x: f32) -> EntityId {
        let id = state.next_entity_id();
        state
            .powerups
            .push(Powerup::new(id, kind, Vec2::new(x, 300.0), 70.0, 0.0));
        id
    }

    fn assert_lock_invariant(state: &GameState) {
        let locked_enemies = state.enemies.iter().filter(|e| e.locked).count();
        let locked_powerups = state.powerups.iter().filter(|p| p.locked).count();
        assert!(locked_enemies + locked_powerups <= 1);
        match state.lock {
            Some(LockTarget::Enemy(id)) => {
                assert!(state.enemies.iter().any(|e| e.id == id && e.locked));
            }
            Some(LockTarget::Powerup(id)) => {
                assert!(state.powerups.iter().any(|p| p.id == id && p.locked));
            }
            None => assert_eq!(locked_enemies + locked_powerups, 0),
        }
    }

    #[test]
    fn test_first_char_acquires_lock() {
        let mut state = playing_state(0);
        let id = push_enemy(&mut state, "laser", 500.0);

        assert_eq!(handle_typed(&mut state, 'l'), TypeOutcome::Hit);
        assert_eq!(state.lock, Some(LockTarget::Enemy(id)));
        assert_eq!(state.enemies[0].progress, 1);
        assert!(state.enemies[0].locked);
        assert_eq!(state.stats.combo, 1);
        assert_eq!(state.stats.correct, 1);
    }

    #[test]
    fn test_typing_full_word_kills_and_releases_lock() {
        let mut state = playing_state(0);
        push_enemy(&mut state, "neon", 500.0);
        for ch in "neo".chars() {
            assert_eq!(handle_typed(&mut state, ch), TypeOutcome::Hit);
        }
        assert_eq!(handle_typed(&mut state, 'n'), TypeOutcome::Killed);
        assert!(state.lock.is_none());
        assert!(!state.enemies[0].alive);
        assert_eq!(state.stats.score, 75 + 40);
        assert_lock_invariant(&state);
    }

    #[test]
    fn test_closest_enemy_wins() {
        let mut state = playing_state(0);
        push_enemy(&mut state, "spark", 900.0);
        let near = push_enemy(&mut state, "speed", 400.0);
        handle_typed(&mut state, 's');
        assert_eq!(state.lock, Some(LockTarget::Enemy(near)));
        assert_lock_invariant(&state);
    }

    #[test]
    fn test_powerups_take_priority() {
        let mut state = playing_state(0);
        push_enemy(&mut state, "spark", 300.0);
        let pu = push_powerup(&mut state, PowerupKind::Spread, 1000.0);
        handle_typed(&mut state, 's');
        assert_eq!(state.lock, Some(LockTarget::Powerup(pu)));
        assert!(!state.enemies[0].locked);

        for ch in "pread".chars() {
            handle_typed(&mut state, ch);
        }
        assert!(!state.powerups[0].alive);
        assert_eq!(state.power.spread, POWER_DURATION);
        assert!(state.lock.is_none());
    }

    #[test]
    fn test_no_target_miss_penalty_floors_at_zero() {
        let mut state = playing_state(0);
        state.stats.score = 10;
        state.stats.combo = 5;
        assert_eq!(
            handle_typed(&mut state, 'q'),
            TypeOutcome::Miss { had_target: false }
        );
        assert_eq!(state.stats.score, 0);
        assert_eq!(state.stats.combo, 0);
        assert_eq!(state.multiplier(), 1);
    }

    #[test]
    fn test_miss_drops_multiplier_while_multi_active() {
        let mut state = playing_state(0);
        push_enemy(&mut state, "laser", 500.0);
        state.power.multiplier = 5.0;
        handle_typed(&mut state, 'l');
        assert_eq!(state.multiplier(), 2);

        handle_typed(&mut state, 'z');
        assert_eq!(state.stats.combo, 0);
        assert_eq!(state.multiplier(), 1);

        handle_typed(&mut state, 'a');
        assert_eq!(state.multiplier(), 2);
    }

    #[test]
    fn test_locked_miss_keeps_score_and_lock() {
        let mut state = playing_state(0);
        let id = push_enemy(&mut state, "laser", 500.0);
        handle_typed(&mut state, 'l');
        state.stats.score = 200;

        assert_eq!(
            handle_typed(&mut state, 'z'),
            TypeOutcome::Miss { had_target: true }
        );
        assert_eq!(state.stats.score, 200);
        assert_eq!(state.stats.combo, 0);
        assert_eq!(state.lock, Some(LockTarget::Enemy(id)));
        assert_eq!(state.stats.total, 2);
        assert_eq!(state.stats.correct, 1);
    }

    #[test]
    fn test_early_levels_never_drop_lock() {
        let mut state = playing_state(4);
        let id = push_enemy(&mut state, "laser", 500.0);
        handle_typed(&mut state, 'l');
        for _ in 0..200 {
            handle_typed(&mut state, 'z');
            assert_eq!(state.lock, Some(LockTarget::Enemy(id)));
        }
    }

    #[test]
    fn test_late_levels_sometimes_drop_lock() {
        let mut state = playing_state(5);
        let mut drops = 0;
        let trials = 400;
        for _ in 0..trials {
            state.enemies.clear();
            state.lock = None;
            push_enemy(&mut state, "laser", 500.0);
            handle_typed(&mut state, 'l');
            handle_typed(&mut state, 'z');
            if state.lock.is_none() {
                drops += 1;
                assert!(!state.enemies[0].locked);
            }
            assert_lock_invariant(&state);
        }
        assert!(drops > trials / 6, "drops = {drops}");
        assert!(drops < trials / 2, "drops = {drops}");
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let mut state = playing_state(0);
        let first = push_enemy(&mut state, "laser", 500.0);
        handle_typed(&mut state, 'l');
        if let Some(enemy) = state.enemy_mut(first) {
            enemy.alive = false;
        }
        let second = push_enemy(&mut state, "glow", 700.0);

        assert_eq!(handle_typed(&mut state, 'g'), TypeOutcome::Hit);
        assert_eq!(state.lock, Some(LockTarget::Enemy(second)));
        assert!(!state.enemies[0].locked);
    }

    #[test]
    fn test_boss_mode_ignores_free_entities() {
        let mut state = playing_state(0);
        push_enemy(&mut state, "b", 500.0);
        state.boss = Some(Boss::new("SIGNAL WRAITH", &["neon", "express", "boss"]));
        state.phase = WavePhase::BossFight;

        assert_eq!(
            handle_typed(&mut state, 'b'),
            TypeOutcome::Miss { had_target: true }
        );
        assert!(state.lock.is_none());
        assert_eq!(state.enemies[0].progress, 0);
    }

    #[test]
    fn test_boss_full_sequence_enters_finale() {
        let mut state = playing_state(0);
        state.boss = Some(Boss::new("SIGNAL WRAITH", &["neon", "express", "boss"]));
        state.phase = WavePhase::BossFight;

        let mut segments_cleared = 0;
        let mut last_outcome = TypeOutcome::Ignored;
        for ch in "neonexpressboss".chars() {
            last_outcome = handle_typed(&mut state, ch);
            if last_outcome == TypeOutcome::BossSegmentCleared {
                segments_cleared += 1;
            }
        }
        assert_eq!(segments_cleared, 2);
        assert_eq!(last_outcome, TypeOutcome::BossDefeated);
        assert_eq!(state.stats.score, 2500 + 450);
        assert_eq!(state.last_unlocked_level, 2);
        assert!(state.in_finale());
        assert_eq!(state.mode, GameMode::Playing);

        // Finale swallows input but still counts it
        let total = state.stats.total;
        assert_eq!(handle_typed(&mut state, 'a'), TypeOutcome::Ignored);
        assert_eq!(state.stats.total, total + 1);
        assert_eq!(state.stats.combo, 15);
    }

    #[test]
    fn test_not_playing_is_ignored() {
        let mut state = playing_state(0);
        state.set_mode(GameMode::Paused);
        assert_eq!(handle_typed(&mut state, 'a'), TypeOutcome::Ignored);
        assert_eq!(state.stats.total, 0);
    }

    proptest! {
        #[test]
        fn prop_typing_invariants(
            keys in proptest::collection::vec(proptest::sample::select(
                "abcdefghijklmnopqrstuvwxyz ".chars().collect::<Vec<_>>()), 1..200),
            level_index in 0usize..10,
        ) {
            let mut state = playing_state(level_index);
            for (i, word) in ["laser", "neon", "a", "glow", "spark"].iter().enumerate() {
                push_enemy(&mut state, word, 400.0 + i as f32 * 90.0);
            }
            push_powerup(&mut state, PowerupKind::Multi, 800.0);

            for ch in keys {
                let outcome = handle_typed(&mut state, ch);
                if matches!(outcome, TypeOutcome::Miss { .. }) {
                    prop_assert_eq!(state.stats.combo, 0);
                    prop_assert_eq!(state.multiplier(), 1);
                }
                assert_lock_invariant(&state);
                prop_assert!(state.stats.correct <= state.stats.total);
            }
        }

        #[test]
        fn prop_boss_progress_is_monotonic(
            keys in proptest::collection::vec(proptest::sample::select(
                "neoxprsb".chars().collect::<Vec<_>>()), 1..120),
        ) {
            let mut state = playing_state(0);
            state.boss = Some(Boss::new("SIGNAL WRAITH", &["neon", "express", "boss"]));
            state.phase = WavePhase::BossFight;

            let mut last_segment = 0;
            let mut last_hp = 1.0f32;
            for ch in keys {
                handle_typed(&mut state, ch);
                let Some(boss) = state.boss.as_ref() else { break };
                prop_assert!(boss.segment_index >= last_segment);
                prop_assert!(boss.hp_frac() <= last_hp);
                last_segment = boss.segment_index;
                last_hp = boss.hp_frac();
            }
        }
    }
}
