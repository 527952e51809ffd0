//! Spawner / director
//!
//! Spawning runs on fractional accumulators (`rate * dt`, one spawn per whole
//! unit) so spawn rates don't depend on frame rate. A slow frame may emit
//! several spawns at once.

use glam::Vec2;
use rand::Rng;

use super::combat;
use super::entities::{Boss, Enemy, EnemyKind, Powerup, PowerupKind};
use super::levels::LevelConfig;
use super::state::{GameEvent, GameState, WavePhase};
use crate::audio::AudioCue;
use crate::consts::*;

/// Re-rolls allowed to find a word inside the level's length window
const WORD_RETRIES: usize = 6;
/// Filler for words shorter than the window
const PAD_CHAR: char = 'x';
/// RAPID makes enemies come a little faster
const RAPID_SPAWN_BOOST: f32 = 1.10;

fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    (b'a' + rng.random_range(0..26u8)) as char
}

/// Text for a new enemy: a single letter or a word from the level's pool
pub fn make_enemy_text<R: Rng + ?Sized>(cfg: &LevelConfig, rng: &mut R) -> String {
    if rng.random_bool(cfg.letter_ratio as f64) {
        return random_letter(rng).to_string();
    }

    let pool = cfg.word_pool();
    let fits = |w: &str| (cfg.word_min..=cfg.word_max).contains(&w.len());
    let mut word = pool[rng.random_range(0..pool.len())];
    for _ in 0..WORD_RETRIES {
        if fits(word) {
            break;
        }
        word = pool[rng.random_range(0..pool.len())];
    }

    let mut text: String = word.chars().take(cfg.word_max).collect();
    while text.len() < cfg.word_min {
        text.push(PAD_CHAR);
    }
    text
}

/// Spawn a wave enemy off the right edge; no-op at the level's cap
pub fn spawn_enemy(state: &mut GameState) -> bool {
    let cfg = state.level();
    let alive = state.enemies.iter().filter(|e| e.alive).count();
    if alive >= cfg.max_enemies {
        return false;
    }

    let text = make_enemy_text(cfg, state.rng());
    let rng = state.rng();
    let pos = Vec2::new(
        FIELD_WIDTH + rng.random_range(20.0..260.0),
        rng.random_range(170.0..FIELD_HEIGHT - 140.0),
    );
    let letter_boost: f32 = if text.len() <= 1 {
        rng.random_range(1.0..1.25)
    } else {
        1.0
    };
    let jitter: f32 = rng.random_range(0.85..1.18);
    let speed = cfg.base_speed * jitter * letter_boost;

    let id = state.next_entity_id();
    state
        .enemies
        .push(Enemy::new(id, EnemyKind::Wave, &text, pos, speed));
    true
}

/// Roll for a powerup (less likely in early levels)
pub fn spawn_powerup(state: &mut GameState) -> bool {
    let cfg = state.level();
    let rng = state.rng();
    if !rng.random_bool(cfg.powerup_chance()) {
        return false;
    }

    let kind = PowerupKind::ALL[rng.random_range(0..PowerupKind::ALL.len())];
    let pos = Vec2::new(
        FIELD_WIDTH + rng.random_range(80.0..380.0),
        rng.random_range(210.0..FIELD_HEIGHT - 220.0),
    );
    let float_t = rng.random_range(0.0..std::f32::consts::TAU);
    let speed = cfg.base_speed * 0.70;

    let id = state.next_entity_id();
    state
        .powerups
        .push(Powerup::new(id, kind, pos, speed, float_t));
    true
}

fn spawn_minion(state: &mut GameState) {
    let cfg = state.level();
    let rng = state.rng();
    let text = random_letter(rng).to_string();
    let pos = Vec2::new(
        FIELD_WIDTH + rng.random_range(0.0..220.0),
        rng.random_range(150.0..FIELD_HEIGHT - 160.0),
    );
    let id = state.next_entity_id();
    state.enemies.push(Enemy::new(
        id,
        EnemyKind::Minion,
        &text,
        pos,
        cfg.base_speed * 1.2,
    ));
}

/// Clear the field and bring in the level's boss (once per level)
pub fn begin_boss_fight(state: &mut GameState) {
    if state.in_boss_phase() {
        return;
    }
    let boss = &state.level().boss;

    state.phase = WavePhase::BossFight;
    state.lock = None;
    state.enemies.clear();
    state.powerups.clear();
    state.boss = Some(Boss::new(boss.name, boss.segments));

    log::info!("Boss incoming: {}", boss.name);
    state.emit(GameEvent::BossIncoming { name: boss.name });
    state.sound(AudioCue::BossSiren);
}

/// Per-frame spawning and the wave to boss gate
pub fn step_director(state: &mut GameState, dt: f32) {
    let cfg = state.level();

    match state.phase {
        WavePhase::Wave => {
            let boost = if state.power.rapid > 0.0 {
                RAPID_SPAWN_BOOST
            } else {
                1.0
            };
            state.acc.spawn += dt * cfg.spawn_rate * boost;
            while state.acc.spawn >= 1.0 {
                state.acc.spawn -= 1.0;
                spawn_enemy(state);
            }

            state.acc.power += dt;
            if state.acc.power >= cfg.powerup_interval {
                state.acc.power = 0.0;
                spawn_powerup(state);
            }

            if state.level_t >= cfg.duration {
                begin_boss_fight(state);
            }
        }

        WavePhase::BossFight => {
            state.acc.minion += dt * cfg.boss.minion_rate;
            while state.acc.minion >= 1.0 {
                state.acc.minion -= 1.0;
                spawn_minion(state);
            }

            // Hazard pulses only bite players without a combo going
            state.acc.hazard += dt * cfg.boss.hazard_rate;
            if cfg.level >= HAZARD_MIN_LEVEL && state.acc.hazard >= 1.0 {
                state.acc.hazard = 0.0;
                if state.stats.combo < HAZARD_COMBO_IMMUNITY
                    && state.rng().random_bool(HAZARD_CHANCE)
                {
                    combat::take_damage(state, HAZARD_DAMAGE);
                }
            }
        }

        WavePhase::Finale { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::{level_config, levels};
    use crate::sim::state::GameMode;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn playing_state(level_index: usize) -> GameState {
        let mut state = GameState::new(99);
        state.begin_level(level_index);
        state.set_mode(GameMode::Playing);
        state.drain_events();
        state
    }

    #[test]
    fn test_level_one_favors_letters() {
        let mut rng = Pcg32::seed_from_u64(1);
        let cfg = level_config(0);
        let samples = 1000;
        let letters = (0..samples)
            .filter(|_| make_enemy_text(cfg, &mut rng).len() == 1)
            .count();
        assert!(letters * 100 > samples * 70, "letters = {letters}");
    }

    #[test]
    fn test_words_fit_length_window() {
        let mut rng = Pcg32::seed_from_u64(5);
        for cfg in levels() {
            for _ in 0..300 {
                let text = make_enemy_text(cfg, &mut rng);
                assert!(text.chars().all(|c| c.is_ascii_lowercase()));
                if text.len() > 1 {
                    assert!(text.len() >= cfg.word_min, "{text} too short for {}", cfg.level);
                    assert!(text.len() <= cfg.word_max, "{text} too long for {}", cfg.level);
                }
            }
        }
    }

    #[test]
    fn test_slow_frame_spawns_several() {
        let mut state = playing_state(0);
        // 0.75/s for 3.9s = 2.925 -> two spawns, remainder carried
        step_director(&mut state, 3.9);
        assert_eq!(state.enemies.len(), 2);
        assert!((state.acc.spawn - 0.925).abs() < 1e-4);
    }

    #[test]
    fn test_enemy_cap_rejects_spawn() {
        let mut state = playing_state(0);
        let cap = state.level().max_enemies;
        for _ in 0..cap {
            assert!(spawn_enemy(&mut state));
        }
        assert!(!spawn_enemy(&mut state));
        assert_eq!(state.enemies.len(), cap);
        for enemy in &state.enemies {
            assert!(enemy.pos.x > FIELD_WIDTH);
        }
    }

    #[test]
    fn test_boss_gate_fires_once() {
        let mut state = playing_state(0);
        state.level_t = state.level().duration;
        step_director(&mut state, 0.016);
        assert_eq!(state.phase, WavePhase::BossFight);
        assert!(state.enemies.is_empty() || state.enemies.iter().all(|e| e.kind == EnemyKind::Minion));

        if let Some(boss) = state.boss.as_mut() {
            boss.advance();
        }
        begin_boss_fight(&mut state);
        step_director(&mut state, 0.016);
        assert_eq!(state.boss.as_ref().map(|b| b.progress), Some(1));

        let incoming = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::BossIncoming { .. }))
            .count();
        assert_eq!(incoming, 1);
    }

    #[test]
    fn test_boss_fight_spawns_letter_minions() {
        let mut state = playing_state(0);
        begin_boss_fight(&mut state);
        // minion rate 0.35/s
        step_director(&mut state, 6.0);
        assert_eq!(state.enemies.len(), 2);
        for minion in &state.enemies {
            assert_eq!(minion.kind, EnemyKind::Minion);
            assert_eq!(minion.text.len(), 1);
        }
    }

    #[test]
    fn test_combo_grants_hazard_immunity() {
        let mut state = playing_state(3);
        begin_boss_fight(&mut state);
        state.stats.combo = 10;
        for _ in 0..50 {
            state.acc.hazard = 1.0;
            step_director(&mut state, 0.0);
            assert_eq!(state.acc.hazard, 0.0);
        }
        assert_eq!(state.player.hp, START_MAX_HP);

        state.stats.combo = 0;
        for _ in 0..50 {
            state.acc.hazard = 1.0;
            step_director(&mut state, 0.0);
        }
        assert!(state.player.hp < START_MAX_HP);
    }

    #[test]
    fn test_no_hazards_before_level_four() {
        let mut state = playing_state(2);
        begin_boss_fight(&mut state);
        for _ in 0..50 {
            state.acc.hazard = 1.0;
            step_director(&mut state, 0.0);
        }
        assert_eq!(state.player.hp, START_MAX_HP);
    }

    #[test]
    fn test_finale_blocks_spawns() {
        let mut state = playing_state(0);
        state.phase = WavePhase::Finale {
            remaining: FINALE_DURATION,
            burst_timer: FINALE_BURST_INTERVAL,
        };
        step_director(&mut state, 5.0);
        assert!(state.enemies.is_empty());
        assert!(state.powerups.is_empty());
    }
}
