//! Entity models
//!
//! Passive data holders with per-frame `update` and completion predicates.
//! Gameplay decisions live in `typing`, `director` and `combat`.

use glam::Vec2;

use crate::consts::{BOSS_X, BOSS_Y};

/// Stable entity handle, allocated by `GameState::next_entity_id`
pub type EntityId = u32;

/// Anything the player destroys or collects by typing its text
pub trait Typable {
    fn text(&self) -> &str;
    fn progress(&self) -> usize;

    /// Next expected character, `None` once fully typed
    fn next_char(&self) -> Option<char> {
        self.text().chars().nth(self.progress())
    }

    /// Untyped tail of the text
    fn remaining(&self) -> &str {
        self.text().get(self.progress()..).unwrap_or("")
    }

    fn is_complete(&self) -> bool {
        self.progress() >= self.text().chars().count()
    }
}

/// Where an enemy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    /// Ordinary wave enemy
    Wave,
    /// Single-letter minion summoned during a boss fight
    Minion,
}

/// An oncoming enemy carrying a letter or word
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub text: String,
    /// Characters typed so far
    pub progress: usize,
    pub pos: Vec2,
    /// Leftward speed (px/s)
    pub speed: f32,
    pub alive: bool,
    pub locked: bool,
    /// Hit flash (visual only)
    pub flash: f32,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, text: &str, pos: Vec2, speed: f32) -> Self {
        Self {
            id,
            kind,
            text: text.to_lowercase(),
            progress: 0,
            pos,
            speed,
            alive: true,
            locked: false,
            flash: 0.0,
        }
    }

    /// Render radius, grows with text length
    pub fn radius(&self) -> f32 {
        18.0 + (self.text.len() as f32 * 6.0).min(42.0)
    }

    pub fn is_letter(&self) -> bool {
        self.text.chars().count() <= 1
    }

    pub fn update(&mut self, dt: f32) {
        self.pos.x -= self.speed * dt;
        self.flash = (self.flash - dt * 5.0).max(0.0);
    }
}

impl Typable for Enemy {
    fn text(&self) -> &str {
        &self.text
    }

    fn progress(&self) -> usize {
        self.progress
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerupKind {
    Spread,
    Pierce,
    Rapid,
    Shield,
    Multi,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 5] = [
        PowerupKind::Spread,
        PowerupKind::Pierce,
        PowerupKind::Rapid,
        PowerupKind::Shield,
        PowerupKind::Multi,
    ];

    /// Text the player types to collect it
    pub fn label(&self) -> &'static str {
        match self {
            PowerupKind::Spread => "spread",
            PowerupKind::Pierce => "pierce",
            PowerupKind::Rapid => "rapid",
            PowerupKind::Shield => "shield",
            PowerupKind::Multi => "x2",
        }
    }
}

/// A drifting powerup capsule
#[derive(Debug, Clone)]
pub struct Powerup {
    pub id: EntityId,
    pub kind: PowerupKind,
    pub label: String,
    pub progress: usize,
    pub pos: Vec2,
    pub speed: f32,
    pub alive: bool,
    pub locked: bool,
    /// Bob phase
    pub float_t: f32,
}

impl Powerup {
    pub fn new(id: EntityId, kind: PowerupKind, pos: Vec2, speed: f32, float_t: f32) -> Self {
        Self {
            id,
            kind,
            label: kind.label().to_string(),
            progress: 0,
            pos,
            speed,
            alive: true,
            locked: false,
            float_t,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos.x -= self.speed * dt;
        self.float_t += dt * 2.1;
        self.pos.y += self.float_t.sin() * dt * 10.0;
    }
}

impl Typable for Powerup {
    fn text(&self) -> &str {
        &self.label
    }

    fn progress(&self) -> usize {
        self.progress
    }
}

/// Result of feeding one correct character to a boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossAdvance {
    /// Still inside the current segment
    Progress,
    /// Current segment finished, more remain
    SegmentCleared,
    /// Final segment finished
    Defeated,
}

/// A multi-segment boss
///
/// HP is never stored: `hp_frac` is derived from typed characters so the bar
/// can't drift from the typing state.
#[derive(Debug, Clone)]
pub struct Boss {
    pub name: String,
    pub segments: Vec<String>,
    /// Only ever increases
    pub segment_index: usize,
    /// Characters typed in the current segment
    pub progress: usize,
    pub pos: Vec2,
    pub phase_t: f32,
    pub flash: f32,
    pub alive: bool,
}

impl Boss {
    pub fn new(name: &str, segments: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            segments: segments.iter().map(|s| s.to_lowercase()).collect(),
            segment_index: 0,
            progress: 0,
            pos: Vec2::new(BOSS_X, BOSS_Y),
            phase_t: 0.0,
            flash: 0.0,
            alive: true,
        }
    }

    pub fn segment(&self) -> Option<&str> {
        self.segments.get(self.segment_index).map(String::as_str)
    }

    pub fn next_char(&self) -> Option<char> {
        self.segment().and_then(|s| s.chars().nth(self.progress))
    }

    pub fn remaining(&self) -> &str {
        self.segment()
            .and_then(|s| s.get(self.progress..))
            .unwrap_or("")
    }

    pub fn is_done(&self) -> bool {
        self.segment_index >= self.segments.len()
    }

    pub fn total_chars(&self) -> usize {
        self.segments.iter().map(|s| s.chars().count()).sum()
    }

    pub fn chars_done(&self) -> usize {
        let cleared: usize = self
            .segments
            .iter()
            .take(self.segment_index)
            .map(|s| s.chars().count())
            .sum();
        cleared + self.progress
    }

    /// Remaining health in [0, 1]
    pub fn hp_frac(&self) -> f32 {
        let total = self.total_chars();
        if total == 0 {
            return 0.0;
        }
        1.0 - self.chars_done() as f32 / total as f32
    }

    pub fn update(&mut self, dt: f32) {
        self.phase_t += dt;
        self.pos.y = BOSS_Y + (self.phase_t * 0.8).sin() * 60.0;
        self.flash = (self.flash - dt * 5.0).max(0.0);
    }

    /// Consume one correct character
    pub fn advance(&mut self) -> BossAdvance {
        let Some(len) = self.segment().map(|s| s.chars().count()) else {
            return BossAdvance::Defeated;
        };
        self.progress += 1;
        self.flash = 0.25;
        if self.progress < len {
            return BossAdvance::Progress;
        }
        self.segment_index += 1;
        self.progress = 0;
        if self.is_done() {
            BossAdvance::Defeated
        } else {
            BossAdvance::SegmentCleared
        }
    }
}

/// Laser beam colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamColor {
    Cyan,
    Magenta,
    Lime,
}

/// A short-lived laser beam (visual only)
#[derive(Debug, Clone)]
pub struct Bullet {
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub color: BeamColor,
    pub life: f32,
    pub t: f32,
}

impl Bullet {
    /// Beam lifetime in seconds
    pub const LIFE: f32 = 0.08;

    pub fn new(from: Vec2, to: Vec2, width: f32, color: BeamColor) -> Self {
        Self {
            from,
            to,
            width,
            color,
            life: Self::LIFE,
            t: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.t += dt;
    }

    pub fn is_alive(&self) -> bool {
        self.t < self.life
    }
}

/// A spark or explosion fragment (visual only)
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub t: f32,
    pub size: f32,
    /// Hue in degrees
    pub hue: u16,
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.t += dt;
        self.pos += self.vel * dt;
        self.vel *= 1.0 - dt * 2.2;
    }

    pub fn is_alive(&self) -> bool {
        self.t < self.life
    }

    pub fn alpha(&self) -> f32 {
        (1.0 - self.t / self.life).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_typing_accessors() {
        let mut enemy = Enemy::new(1, EnemyKind::Wave, "Laser", Vec2::new(500.0, 300.0), 100.0);
        assert_eq!(enemy.text, "laser");
        assert_eq!(enemy.next_char(), Some('l'));
        enemy.progress = 3;
        assert_eq!(enemy.remaining(), "er");
        assert!(!enemy.is_complete());
        enemy.progress = 5;
        assert_eq!(enemy.next_char(), None);
        assert!(enemy.is_complete());
    }

    #[test]
    fn test_enemy_moves_left() {
        let mut enemy = Enemy::new(1, EnemyKind::Wave, "a", Vec2::new(500.0, 300.0), 100.0);
        enemy.flash = 0.18;
        enemy.update(0.5);
        assert!((enemy.pos.x - 450.0).abs() < 1e-4);
        assert_eq!(enemy.flash, 0.0);
    }

    #[test]
    fn test_powerup_labels() {
        assert_eq!(PowerupKind::Multi.label(), "x2");
        let p = Powerup::new(7, PowerupKind::Shield, Vec2::new(900.0, 300.0), 70.0, 0.0);
        assert_eq!(p.next_char(), Some('s'));
        assert_eq!(p.remaining(), "shield");
    }

    #[test]
    fn test_boss_segments_advance() {
        let mut boss = Boss::new("SIGNAL WRAITH", &["neon", "express", "boss"]);
        assert_eq!(boss.total_chars(), 15);
        assert_eq!(boss.hp_frac(), 1.0);

        for _ in 0..3 {
            assert_eq!(boss.advance(), BossAdvance::Progress);
        }
        assert_eq!(boss.advance(), BossAdvance::SegmentCleared);
        assert_eq!(boss.segment_index, 1);
        assert_eq!(boss.progress, 0);
        assert_eq!(boss.segment(), Some("express"));

        for _ in 0..7 {
            boss.advance();
        }
        assert_eq!(boss.segment(), Some("boss"));
        for _ in 0..3 {
            boss.advance();
        }
        assert_eq!(boss.advance(), BossAdvance::Defeated);
        assert!(boss.is_done());
        assert_eq!(boss.hp_frac(), 0.0);
        assert_eq!(boss.next_char(), None);
        assert_eq!(boss.remaining(), "");
    }

    #[test]
    fn test_boss_hp_frac_never_increases() {
        let mut boss = Boss::new("VECTOR OGRE", &["turbo", "arcade", "guardian"]);
        let mut last = boss.hp_frac();
        let mut last_segment = boss.segment_index;
        while !boss.is_done() {
            boss.advance();
            assert!(boss.hp_frac() <= last);
            assert!(boss.segment_index >= last_segment);
            last = boss.hp_frac();
            last_segment = boss.segment_index;
        }
    }

    #[test]
    fn test_visual_entities_expire() {
        let mut beam = Bullet::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 3.0, BeamColor::Cyan);
        beam.update(0.05);
        assert!(beam.is_alive());
        beam.update(0.05);
        assert!(!beam.is_alive());

        let mut spark = Particle {
            pos: Vec2::ZERO,
            vel: Vec2::new(100.0, 0.0),
            life: 0.2,
            t: 0.0,
            size: 2.0,
            hue: 185,
        };
        spark.update(0.1);
        assert!(spark.pos.x > 0.0);
        assert!(spark.alpha() < 1.0);
        spark.update(0.15);
        assert!(!spark.is_alive());
    }
}
