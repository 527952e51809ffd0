//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (browser key names to core input)
//! - Presentation (what gets drawn each frame)
//!
//! Storage lives in `persistence`, audio in `audio`.

use glam::Vec2;

use crate::sim::{BeamColor, Bullet, EnemyKind, GameState, Particle, Player, PowerupKind, Typable};

/// Normalized input delivered to the run controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// One printable character, lowercased (space included)
    Char(char),
    TogglePause,
}

/// One `keydown` as the browser reports it
#[derive(Debug, Clone, Copy)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    /// Auto-repeat from a held key
    pub repeat: bool,
    /// Ctrl, Alt or Meta held
    pub modified: bool,
}

impl KeyPress<'_> {
    /// Held-key repeats and shortcuts never reach the game
    pub fn is_game_key(&self) -> bool {
        !self.repeat && !self.modified
    }
}

/// Map a `KeyboardEvent.key` value to an input event.
///
/// Named keys ("Shift", "ArrowLeft", ...) and anything non-printable are
/// dropped here so the core only ever sees single characters.
pub fn normalize_key(key: &str) -> Option<InputEvent> {
    if key == "Escape" {
        return Some(InputEvent::TogglePause);
    }
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() || c.is_control() {
        return None;
    }
    Some(InputEvent::Char(c.to_ascii_lowercase()))
}

/// What kind of typable thing is being drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Enemy,
    Minion,
    Powerup(PowerupKind),
}

/// Per-entity draw data
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub text: &'a str,
    /// Characters already typed
    pub progress: usize,
    pub locked: bool,
    /// Hit flash (0..1)
    pub flash: f32,
}

/// Boss draw data
#[derive(Debug, Clone, Copy)]
pub struct BossView<'a> {
    pub name: &'a str,
    pub pos: Vec2,
    /// Current segment, empty once beaten
    pub segment: &'a str,
    pub progress: usize,
    pub hp_frac: f32,
    pub flash: f32,
}

/// Receiver for per-frame draw calls. Nothing returned feeds back into gameplay.
pub trait PresentationSink {
    fn draw_entity(&mut self, entity: &EntityView<'_>);
    fn draw_beam(&mut self, from: Vec2, to: Vec2, width: f32, color: BeamColor, alpha: f32);
    fn draw_boss(&mut self, boss: &BossView<'_>);
    fn draw_player(&mut self, _player: &Player) {}
    fn draw_particle(&mut self, _particle: &Particle) {}
    fn request_screen_shake(&mut self, intensity: f32);
    fn request_flash(&mut self, intensity: f32);
}

/// Walk the state once, back to front
pub fn present(state: &GameState, sink: &mut dyn PresentationSink) {
    if state.screen_shake > 0.0 {
        sink.request_screen_shake(state.screen_shake);
    }
    if state.flash > 0.0 {
        sink.request_flash(state.flash);
    }

    for particle in &state.particles {
        sink.draw_particle(particle);
    }

    for powerup in state.powerups.iter().filter(|p| p.alive) {
        sink.draw_entity(&EntityView {
            kind: EntityKind::Powerup(powerup.kind),
            pos: powerup.pos,
            text: powerup.text(),
            progress: powerup.progress(),
            locked: powerup.locked,
            flash: 0.0,
        });
    }

    for enemy in state.enemies.iter().filter(|e| e.alive) {
        let kind = match enemy.kind {
            EnemyKind::Wave => EntityKind::Enemy,
            EnemyKind::Minion => EntityKind::Minion,
        };
        sink.draw_entity(&EntityView {
            kind,
            pos: enemy.pos,
            text: enemy.text(),
            progress: enemy.progress(),
            locked: enemy.locked,
            flash: enemy.flash,
        });
    }

    if let Some(boss) = state.boss.as_ref().filter(|b| b.alive) {
        sink.draw_boss(&BossView {
            name: &boss.name,
            pos: boss.pos,
            segment: boss.segment().unwrap_or(""),
            progress: boss.progress,
            hp_frac: boss.hp_frac(),
            flash: boss.flash,
        });
    }

    for bullet in &state.bullets {
        draw_bullet(sink, bullet);
    }

    sink.draw_player(&state.player);
}

fn draw_bullet(sink: &mut dyn PresentationSink, bullet: &Bullet) {
    let alpha = (1.0 - bullet.t / bullet.life).clamp(0.0, 1.0);
    sink.draw_beam(bullet.from, bullet.to, bullet.width, bullet.color, alpha);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Enemy, GameMode, Powerup};

    #[derive(Default)]
    struct CountingSink {
        entities: Vec<(EntityKind, String, usize, bool)>,
        bosses: usize,
        beams: usize,
        shakes: usize,
        flashes: usize,
    }

    impl PresentationSink for CountingSink {
        fn draw_entity(&mut self, entity: &EntityView<'_>) {
            self.entities.push((
                entity.kind,
                entity.text.to_string(),
                entity.progress,
                entity.locked,
            ));
        }
        fn draw_beam(&mut self, _from: Vec2, _to: Vec2, _width: f32, _color: BeamColor, _alpha: f32) {
            self.beams += 1;
        }
        fn draw_boss(&mut self, _boss: &BossView<'_>) {
            self.bosses += 1;
        }
        fn request_screen_shake(&mut self, _intensity: f32) {
            self.shakes += 1;
        }
        fn request_flash(&mut self, _intensity: f32) {
            self.flashes += 1;
        }
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("A"), Some(InputEvent::Char('a')));
        assert_eq!(normalize_key("z"), Some(InputEvent::Char('z')));
        assert_eq!(normalize_key(" "), Some(InputEvent::Char(' ')));
        assert_eq!(normalize_key("Escape"), Some(InputEvent::TogglePause));
        assert_eq!(normalize_key("Shift"), None);
        assert_eq!(normalize_key("ArrowLeft"), None);
        assert_eq!(normalize_key(""), None);
        assert_eq!(normalize_key("\n"), None);
    }

    #[test]
    fn test_repeats_and_shortcuts_are_dropped() {
        let press = |repeat, modified| KeyPress {
            key: "a",
            repeat,
            modified,
        };
        assert!(press(false, false).is_game_key());
        assert!(!press(true, false).is_game_key());
        assert!(!press(false, true).is_game_key());
    }

    #[test]
    fn test_present_walks_live_entities() {
        let mut state = GameState::new(1);
        state.begin_level(0);
        state.set_mode(GameMode::Playing);
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(id, EnemyKind::Wave, "neon", Vec2::new(600.0, 300.0), 90.0);
        enemy.progress = 2;
        enemy.locked = true;
        state.enemies.push(enemy);
        let id = state.next_entity_id();
        let mut dead = Enemy::new(id, EnemyKind::Minion, "q", Vec2::new(700.0, 300.0), 90.0);
        dead.alive = false;
        state.enemies.push(dead);
        let id = state.next_entity_id();
        state.powerups.push(Powerup::new(
            id,
            PowerupKind::Shield,
            Vec2::new(800.0, 300.0),
            60.0,
            0.0,
        ));
        state.request_shake(4.0);

        let mut sink = CountingSink::default();
        present(&state, &mut sink);

        assert_eq!(sink.entities.len(), 2);
        assert_eq!(
            sink.entities[0],
            (EntityKind::Powerup(PowerupKind::Shield), "shield".to_string(), 0, false)
        );
        assert_eq!(sink.entities[1], (EntityKind::Enemy, "neon".to_string(), 2, true));
        assert_eq!(sink.bosses, 0);
        assert_eq!(sink.beams, 0);
        assert_eq!(sink.shakes, 1);
        assert_eq!(sink.flashes, 0);
    }
}
