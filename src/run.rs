//! Run/save controller
//!
//! Owns the live `GameState` and the persisted `SaveSnapshot`, and turns
//! player intents (new run, continue, restart, pause, ...) into state changes.
//! Events queued by the simulation are drained here: audio cues go to the
//! `AudioSink`, mode changes trigger forced saves.

use crate::audio::{AudioCue, AudioSink};
use crate::consts::*;
use crate::persistence::{RunSnapshot, SaveSnapshot, SaveStore};
use crate::platform::InputEvent;
use crate::sim::combat::cleared_level_hp;
use crate::sim::director::begin_boss_fight;
use crate::sim::{
    GameEvent, GameMode, GameState, LAST_LEVEL_INDEX, ShipId, TypeOutcome, handle_typed, tick,
    toggle_pause,
};

/// Drives runs and keeps the save in sync
pub struct RunController<S: SaveStore> {
    state: GameState,
    save: SaveSnapshot,
    store: S,
    /// Base seed; each run gets `seed + run_count`
    seed: u64,
    runs: u64,
    /// Milliseconds of frame time seen so far
    clock_ms: f64,
    last_save_ms: Option<f64>,
    music_on: bool,
}

impl<S: SaveStore> RunController<S> {
    /// Load the save (defaults if missing or corrupt) and park in the menu
    pub fn new(mut store: S, seed: u64) -> Self {
        let save = store.load_or_default();
        let mut state = GameState::new(seed);
        state.last_unlocked_level = save.last_unlocked_level.clamp(1, LEVEL_COUNT as u32);
        state.player.ship = save.selected_ship;
        log::info!(
            "Profile loaded: high score {}, unlocked {}/{}, run saved: {}",
            save.high_score,
            state.last_unlocked_level,
            LEVEL_COUNT,
            save.run.is_some()
        );
        Self {
            state,
            save,
            store,
            seed,
            runs: 0,
            clock_ms: 0.0,
            last_save_ms: None,
            music_on: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn save(&self) -> &SaveSnapshot {
        &self.save
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_saved_run(&self) -> bool {
        self.save.run.is_some()
    }

    /// Accuracy in percent (100 before any keystroke)
    pub fn accuracy_pct(&self) -> u32 {
        self.state.stats.accuracy_pct()
    }

    // ------------------------------------------------------------------
    // Run control
    // ------------------------------------------------------------------

    /// Fresh run from level 1 with the selected ship
    pub fn new_run(&mut self, audio: &mut dyn AudioSink) {
        self.save.run = None;
        self.state = self.fresh_state();
        log::info!("New run (seed {})", self.state.seed);
        self.start_level(0, None, audio);
    }

    /// Resume the saved run, or start a new one if there is none
    pub fn continue_run(&mut self, audio: &mut dyn AudioSink) {
        let Some(run) = self.save.run.clone() else {
            self.new_run(audio);
            return;
        };

        self.state = self.fresh_state();
        let max_hp = if run.max_hp > 0.0 {
            run.max_hp.min(MAX_HP_CAP)
        } else {
            START_MAX_HP
        };
        let player = &mut self.state.player;
        player.max_hp = max_hp;
        player.hp = if run.hp > 0.0 {
            run.hp.min(max_hp)
        } else {
            max_hp
        };
        player.shield = run.shield.max(0.0);
        player.ship = run.ship_id;

        self.state.stats.score = run.stats.score;
        self.state.stats.combo = run.stats.combo;
        self.state.stats.correct = run.stats.correct;
        self.state.stats.total = run.stats.total.max(run.stats.correct);
        self.state.power = run.power;

        let level_index = run.level_index.min(LAST_LEVEL_INDEX);
        log::info!(
            "Continuing run at level {} (score {})",
            level_index + 1,
            run.stats.score
        );
        self.start_level(level_index, Some(&run), audio);
    }

    /// Replay the current level keeping score and stats
    pub fn restart_level(&mut self, audio: &mut dyn AudioSink) {
        let player = &mut self.state.player;
        player.hp = player.max_hp;
        player.shield = 0.0;
        self.state.power.clear();
        log::info!("Restarting level {}", self.state.level_index + 1);
        self.start_level(self.state.level_index, None, audio);
    }

    /// Move on to the next level (no-op on the last one)
    pub fn advance_level(&mut self, audio: &mut dyn AudioSink) {
        if self.state.level_index >= LAST_LEVEL_INDEX {
            return;
        }
        let next = self.state.level_index + 1;
        log::info!("Advancing to level {}", next + 1);
        self.start_level(next, None, audio);
    }

    /// Save and return to the menu
    pub fn stop_to_menu(&mut self, audio: &mut dyn AudioSink) {
        self.save_run(true);
        self.state.set_mode(GameMode::Menu);
        self.pump(audio);
    }

    pub fn toggle_pause(&mut self, audio: &mut dyn AudioSink) {
        toggle_pause(&mut self.state);
        self.pump(audio);
    }

    /// Window lost focus: pause and save immediately
    pub fn blur(&mut self, audio: &mut dyn AudioSink) {
        if self.state.mode == GameMode::Playing {
            self.state.set_mode(GameMode::Paused);
        }
        self.save_run(true);
        self.pump(audio);
    }

    /// Page is going away: save immediately
    pub fn unload(&mut self) {
        self.save_run(true);
    }

    // ------------------------------------------------------------------
    // Frame + input
    // ------------------------------------------------------------------

    /// One animation frame: tick, throttled autosave, drain events
    pub fn frame(&mut self, dt: f32, audio: &mut dyn AudioSink) {
        self.clock_ms += dt.max(0.0) as f64 * 1000.0;
        tick(&mut self.state, dt);
        if self.state.mode == GameMode::Playing {
            self.save_run(false);
        }
        self.pump(audio);
    }

    /// Feed one normalized input event
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        audio: &mut dyn AudioSink,
    ) -> Option<TypeOutcome> {
        let outcome = match event {
            InputEvent::TogglePause => {
                toggle_pause(&mut self.state);
                None
            }
            InputEvent::Char(_) if self.state.mode != GameMode::Playing => None,
            InputEvent::Char(ch) => Some(handle_typed(&mut self.state, ch)),
        };
        self.pump(audio);
        outcome
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    /// Choose the ship for the next run
    pub fn select_ship(&mut self, ship: ShipId) {
        self.save.selected_ship = ship;
        if matches!(self.state.mode, GameMode::Menu) {
            self.state.player.ship = ship;
        }
        self.store_save();
    }

    /// Set the pilot name (blank names are ignored)
    pub fn set_player_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.save.player_name = name.to_string();
        self.store_save();
    }

    pub fn toggle_mute(&mut self, audio: &mut dyn AudioSink) -> bool {
        let muted = self.save.settings.toggle_mute();
        audio.set_muted(muted);
        self.store_save();
        muted
    }

    pub fn toggle_crt(&mut self) -> bool {
        let crt = self.save.settings.toggle_crt();
        self.store_save();
        crt
    }

    /// Wipe the profile and any saved run
    pub fn reset_save(&mut self, audio: &mut dyn AudioSink) {
        log::info!("Save reset");
        self.save = SaveSnapshot::default();
        self.state.last_unlocked_level = self.save.last_unlocked_level;
        audio.set_muted(self.save.settings.muted);
        self.store_save();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn fresh_state(&mut self) -> GameState {
        self.runs += 1;
        let mut state = GameState::new(self.seed.wrapping_add(self.runs));
        state.last_unlocked_level = self
            .save
            .last_unlocked_level
            .max(self.state.last_unlocked_level);
        state.player.ship = self.save.selected_ship;
        state
    }

    fn start_level(
        &mut self,
        level_index: usize,
        restored: Option<&RunSnapshot>,
        audio: &mut dyn AudioSink,
    ) {
        self.state.begin_level(level_index);

        if let Some(run) = restored {
            self.state.level_t = run.level_elapsed_t.max(0.0);
            self.state.acc.spawn = run.spawn_acc.max(0.0);
            self.state.acc.power = run.power_acc.max(0.0);
            self.state.acc.minion = run.minion_acc.max(0.0);
            self.state.acc.hazard = run.hazard_acc.max(0.0);
            // Boss restarts from its first segment
            if run.in_boss {
                begin_boss_fight(&mut self.state);
            }
        }

        self.state.set_mode(GameMode::Playing);
        self.state.sound(AudioCue::Powerup);
        self.save_run(true);
        self.pump(audio);
    }

    /// Drain queued simulation events
    fn pump(&mut self, audio: &mut dyn AudioSink) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Sound(cue) => audio.play(cue),
                GameEvent::ModeChanged(mode) => {
                    self.on_mode_changed(mode, audio);
                }
                GameEvent::BossIncoming { name } => {
                    log::debug!("Boss warning shown for {name}");
                }
                GameEvent::BossDefeated { level, .. } => {
                    self.sync_unlocks();
                    log::debug!(
                        "Unlock watermark after level {level}: {}",
                        self.save.last_unlocked_level
                    );
                }
                GameEvent::LevelCleared { .. } => {}
                GameEvent::GameOver { score } => self.on_game_over(score),
                GameEvent::Victory { score } => self.on_victory(score),
            }
        }
    }

    fn on_mode_changed(&mut self, mode: GameMode, audio: &mut dyn AudioSink) {
        match mode {
            GameMode::Playing => {
                if !self.music_on {
                    audio.play_music();
                    self.music_on = true;
                }
            }
            GameMode::Menu | GameMode::GameOver | GameMode::Victory => {
                if self.music_on {
                    audio.stop_music();
                    self.music_on = false;
                }
            }
            GameMode::Paused | GameMode::LevelComplete => {}
        }
        if mode != GameMode::Playing {
            self.save_run(true);
        }
    }

    fn on_game_over(&mut self, score: u64) {
        log::debug!("Run ended with accuracy {}%", self.accuracy_pct());
        self.commit_high_score(score);
        // Retry the same level with fresh stats
        self.save.run = Some(RunSnapshot::seed(
            self.state.level_index,
            self.state.player.max_hp,
            self.state.player.ship,
        ));
        self.store_save();
    }

    fn on_victory(&mut self, score: u64) {
        log::debug!("Run won with accuracy {}%", self.accuracy_pct());
        self.commit_high_score(score);
        self.save.run = None;
        self.store_save();
    }

    fn commit_high_score(&mut self, score: u64) {
        if score > self.save.high_score {
            log::info!("New high score: {score}");
            self.save.high_score = score;
        }
    }

    fn sync_unlocks(&mut self) {
        self.save.last_unlocked_level = self
            .save
            .last_unlocked_level
            .max(self.state.last_unlocked_level)
            .min(LEVEL_COUNT as u32);
    }

    /// Write the run unless throttled. Returns whether a write happened.
    fn save_run(&mut self, force: bool) -> bool {
        if !force
            && self
                .last_save_ms
                .is_some_and(|t| self.clock_ms - t < SAVE_THROTTLE_MS)
        {
            return false;
        }
        self.last_save_ms = Some(self.clock_ms);

        let run = match self.state.mode {
            // The boss bonus is already banked, so never resume into the fight
            GameMode::Playing | GameMode::Paused if self.state.in_finale() => {
                if self.state.level_index >= LAST_LEVEL_INDEX {
                    self.commit_high_score(self.state.stats.score);
                    self.sync_unlocks();
                    self.save.run = None;
                    return self.store_save();
                }
                let (max_hp, hp) =
                    cleared_level_hp(self.state.player.max_hp, self.state.player.hp);
                RunSnapshot {
                    max_hp,
                    hp,
                    ..self.next_level_run()
                }
            }
            GameMode::Playing | GameMode::Paused => RunSnapshot::capture(&self.state),
            GameMode::LevelComplete => self.next_level_run(),
            GameMode::Menu | GameMode::GameOver | GameMode::Victory => return false,
        };

        self.sync_unlocks();
        self.save.run = Some(run);
        self.store_save()
    }

    /// Resume point at the start of the next level
    fn next_level_run(&self) -> RunSnapshot {
        RunSnapshot {
            level_index: (self.state.level_index + 1).min(LAST_LEVEL_INDEX),
            level_elapsed_t: 0.0,
            in_boss: false,
            spawn_acc: 0.0,
            power_acc: 0.0,
            minion_acc: 0.0,
            hazard_acc: 0.0,
            ..RunSnapshot::capture(&self.state)
        }
    }

    fn store_save(&mut self) -> bool {
        match self.store.store(&self.save) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to write save: {err}");
                false
            }
        }
    }
}
