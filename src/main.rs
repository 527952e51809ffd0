//! TypeR 198X entry point
//!
//! Handles platform-specific initialization and runs the game loop.
//! On the web: canvas 2D + Web Audio + LocalStorage. Natively: a headless
//! demo run with a scripted typist, saved to a JSON file.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent};

    use typer_198x::audio::WebAudio;
    use typer_198x::consts::*;
    use typer_198x::persistence::LocalStorageStore;
    use typer_198x::platform::{
        BossView, EntityKind, EntityView, InputEvent, KeyPress, PresentationSink, normalize_key,
        present,
    };
    use typer_198x::sim::{BeamColor, GameMode, Particle, Player};
    use typer_198x::{AudioSink, RunController};

    /// Game instance holding all state
    struct Game {
        ctrl: RunController<LocalStorageStore>,
        audio: WebAudio,
        canvas: CanvasSink,
        last_time: f64,
    }

    /// Canvas 2D presentation sink
    struct CanvasSink {
        ctx: CanvasRenderingContext2d,
        shake: f32,
        flash: f32,
        /// Frame counter for shake jitter
        frame: u32,
    }

    impl CanvasSink {
        fn begin(&mut self) {
            self.flash = 0.0;
            self.frame = self.frame.wrapping_add(1);
            let ctx = &self.ctx;
            ctx.set_global_alpha(1.0);
            ctx.set_fill_style_str("#07021a");
            ctx.fill_rect(0.0, 0.0, FIELD_WIDTH as f64, FIELD_HEIGHT as f64);
        }

        fn text(&self, text: &str, x: f64, y: f64, color: &str, font: &str) {
            self.ctx.set_font(font);
            self.ctx.set_fill_style_str(color);
            let _ = self.ctx.fill_text(text, x, y);
        }

        /// Typed part in pink, rest in white
        fn typed_text(&self, text: &str, progress: usize, center: Vec2) {
            let ctx = &self.ctx;
            ctx.set_font("bold 18px monospace");
            let width = ctx
                .measure_text(text)
                .map(|m| m.width())
                .unwrap_or(text.len() as f64 * 11.0);
            let mut x = center.x as f64 - width / 2.0;
            let y = center.y as f64 + 6.0;
            let split = text
                .char_indices()
                .nth(progress)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            let (done, rest) = text.split_at(split);
            ctx.set_fill_style_str("#ff4fd8");
            let _ = ctx.fill_text(done, x, y);
            x += ctx.measure_text(done).map(|m| m.width()).unwrap_or(0.0);
            ctx.set_fill_style_str("#ffffff");
            let _ = ctx.fill_text(rest, x, y);
        }

        fn circle(&self, pos: Vec2, radius: f32, color: &str) {
            let ctx = &self.ctx;
            ctx.begin_path();
            let _ = ctx.arc(pos.x as f64, pos.y as f64, radius as f64, 0.0, TAU);
            ctx.set_fill_style_str(color);
            ctx.fill();
        }

        /// Post-process overlays: hit flash and CRT scanlines
        fn finish(&self, crt: bool) {
            let ctx = &self.ctx;
            ctx.set_global_alpha(1.0);
            if self.flash > 0.0 {
                ctx.set_global_alpha(self.flash.min(0.6) as f64);
                ctx.set_fill_style_str("#ff2050");
                ctx.fill_rect(0.0, 0.0, FIELD_WIDTH as f64, FIELD_HEIGHT as f64);
                ctx.set_global_alpha(1.0);
            }
            if crt {
                ctx.set_global_alpha(0.12);
                ctx.set_fill_style_str("#000000");
                let mut y = 0.0;
                while y < FIELD_HEIGHT as f64 {
                    ctx.fill_rect(0.0, y, FIELD_WIDTH as f64, 1.0);
                    y += 3.0;
                }
                ctx.set_global_alpha(1.0);
            }
        }
    }

    impl PresentationSink for CanvasSink {
        fn draw_entity(&mut self, entity: &EntityView<'_>) {
            let color = match entity.kind {
                EntityKind::Enemy => "#7a2cff",
                EntityKind::Minion => "#ff6a00",
                EntityKind::Powerup(_) => "#00ffa8",
            };
            let radius = if entity.text.len() <= 1 { 16.0 } else { 22.0 };
            self.circle(entity.pos, radius, color);
            if entity.locked {
                self.ctx.set_stroke_style_str("#00e5ff");
                self.ctx.set_line_width(2.0);
                self.ctx.begin_path();
                let _ = self.ctx.arc(
                    entity.pos.x as f64,
                    entity.pos.y as f64,
                    radius as f64 + 8.0,
                    0.0,
                    TAU,
                );
                self.ctx.stroke();
            }
            if entity.flash > 0.0 {
                self.ctx.set_global_alpha(entity.flash as f64);
                self.circle(entity.pos, radius, "#ffffff");
                self.ctx.set_global_alpha(1.0);
            }
            self.typed_text(
                entity.text,
                entity.progress,
                entity.pos - Vec2::new(0.0, radius + 16.0),
            );
        }

        fn draw_beam(&mut self, from: Vec2, to: Vec2, width: f32, color: BeamColor, alpha: f32) {
            let ctx = &self.ctx;
            ctx.set_global_alpha(alpha as f64);
            ctx.set_stroke_style_str(match color {
                BeamColor::Cyan => "#00e5ff",
                BeamColor::Magenta => "#ff4fd8",
                BeamColor::Lime => "#b6ff00",
            });
            ctx.set_line_width(width as f64);
            ctx.begin_path();
            ctx.move_to(from.x as f64, from.y as f64);
            ctx.line_to(to.x as f64, to.y as f64);
            ctx.stroke();
            ctx.set_global_alpha(1.0);
        }

        fn draw_boss(&mut self, boss: &BossView<'_>) {
            self.circle(boss.pos, 90.0, "#3b0a5e");
            if boss.flash > 0.0 {
                self.ctx.set_global_alpha(boss.flash as f64);
                self.circle(boss.pos, 90.0, "#ffffff");
                self.ctx.set_global_alpha(1.0);
            }
            self.text(
                boss.name,
                boss.pos.x as f64 - 90.0,
                boss.pos.y as f64 - 120.0,
                "#ffd400",
                "bold 16px monospace",
            );
            // HP bar
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#330014");
            ctx.fill_rect(boss.pos.x as f64 - 90.0, boss.pos.y as f64 - 110.0, 180.0, 8.0);
            ctx.set_fill_style_str("#ff2050");
            ctx.fill_rect(
                boss.pos.x as f64 - 90.0,
                boss.pos.y as f64 - 110.0,
                180.0 * boss.hp_frac as f64,
                8.0,
            );
            self.typed_text(boss.segment, boss.progress, boss.pos + Vec2::new(0.0, 120.0));
        }

        fn draw_player(&mut self, player: &Player) {
            let color = if player.shield > 0.0 { "#00e5ff" } else { "#e0e0ff" };
            let ctx = &self.ctx;
            ctx.begin_path();
            ctx.move_to(player.pos.x as f64 + 30.0, player.pos.y as f64);
            ctx.line_to(player.pos.x as f64 - 20.0, player.pos.y as f64 - 16.0);
            ctx.line_to(player.pos.x as f64 - 20.0, player.pos.y as f64 + 16.0);
            ctx.close_path();
            ctx.set_fill_style_str(color);
            ctx.fill();
        }

        fn draw_particle(&mut self, particle: &Particle) {
            self.ctx.set_global_alpha(particle.alpha() as f64);
            let color = format!("hsl({}, 100%, 60%)", particle.hue);
            self.circle(particle.pos, particle.size, &color);
            self.ctx.set_global_alpha(1.0);
        }

        fn request_screen_shake(&mut self, intensity: f32) {
            self.shake = self.shake.max(intensity);
        }

        fn request_flash(&mut self, intensity: f32) {
            self.flash = self.flash.max(intensity);
        }
    }

    impl Game {
        fn render(&mut self) {
            let ctx = self.canvas.ctx.clone();
            self.canvas.begin();
            ctx.save();
            // Shake requested during the previous present
            let shake = std::mem::take(&mut self.canvas.shake) as f64;
            if shake > 0.0 {
                let jitter = (self.canvas.frame as f64 * 12.9898).sin() * shake;
                ctx.translate(jitter, -jitter * 0.5).ok();
            }
            present(self.ctrl.state(), &mut self.canvas);
            ctx.restore();

            self.draw_hud();
            self.canvas.finish(self.ctrl.save().settings.crt);
        }

        fn draw_hud(&self) {
            let state = self.ctrl.state();
            let save = self.ctrl.save();
            let c = &self.canvas;
            let font = "16px monospace";
            let name = if save.player_name.is_empty() {
                "(unnamed)"
            } else {
                save.player_name.as_str()
            };

            c.text(
                &format!(
                    "{}  LV {}/{}  SCORE {}  x{}  COMBO {}  ACC {}%",
                    name,
                    state.level_index + 1,
                    LEVEL_COUNT,
                    state.stats.score,
                    state.multiplier(),
                    state.stats.combo,
                    state.stats.accuracy_pct()
                ),
                20.0,
                30.0,
                "#ffffff",
                font,
            );
            c.text(
                &format!(
                    "HP {:.0}/{:.0}  HI {}",
                    state.player.hp, state.player.max_hp, save.high_score
                ),
                20.0,
                54.0,
                "#00ffa8",
                font,
            );

            let banner = match state.mode {
                GameMode::Menu if save.run.is_some() => {
                    Some("ENTER continue  ·  N new run  ·  M mute  ·  C crt")
                }
                GameMode::Menu => Some("ENTER start  ·  M mute  ·  C crt"),
                GameMode::Paused => Some("PAUSED  ·  ESC resume  ·  R restart  ·  Q menu"),
                GameMode::LevelComplete => Some("LEVEL CLEAR  ·  ENTER next level  ·  Q menu"),
                GameMode::GameOver => Some("GAME OVER  ·  ENTER retry  ·  Q menu"),
                GameMode::Victory => Some("VICTORY!  ·  ENTER new run  ·  Q menu"),
                GameMode::Playing => None,
            };
            if let Some(banner) = banner {
                c.text(banner, 340.0, 380.0, "#ffd400", "bold 22px monospace");
            }
        }

        fn on_key(&mut self, key: &str) -> bool {
            let audio = &mut self.audio;
            audio.resume();
            let mode = self.ctrl.state().mode;
            match (mode, key) {
                (GameMode::Playing, _) => match normalize_key(key) {
                    Some(event) => {
                        self.ctrl.handle_input(event, audio);
                        true
                    }
                    None => false,
                },
                (GameMode::Paused, "Escape") => {
                    self.ctrl.handle_input(InputEvent::TogglePause, audio);
                    true
                }
                (GameMode::Paused, "r" | "R") => {
                    self.ctrl.restart_level(audio);
                    true
                }
                (GameMode::Menu, "Enter") | (GameMode::GameOver, "Enter") => {
                    self.ctrl.continue_run(audio);
                    true
                }
                (GameMode::Menu, "n" | "N") | (GameMode::Victory, "Enter") => {
                    self.ctrl.new_run(audio);
                    true
                }
                (GameMode::LevelComplete, "Enter") => {
                    self.ctrl.advance_level(audio);
                    true
                }
                (GameMode::Menu, "m" | "M") => {
                    self.ctrl.toggle_mute(audio);
                    true
                }
                (GameMode::Menu, "c" | "C") => {
                    self.ctrl.toggle_crt();
                    true
                }
                (_, "q" | "Q") => {
                    self.ctrl.stop_to_menu(audio);
                    true
                }
                _ => false,
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("TypeR 198X starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No <canvas id=\"canvas\">");
            return;
        };
        canvas.set_width(FIELD_WIDTH as u32);
        canvas.set_height(FIELD_HEIGHT as u32);

        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("Canvas 2D context unavailable");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let ctrl = RunController::new(LocalStorageStore, seed);
        let mut audio = WebAudio::new();
        audio.set_muted(ctrl.save().settings.muted);

        let game = Rc::new(RefCell::new(Game {
            ctrl,
            audio,
            canvas: CanvasSink {
                ctx,
                shake: 0.0,
                flash: 0.0,
                frame: 0,
            },
            last_time: 0.0,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        request_animation_frame(game);

        log::info!("TypeR 198X running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let press = KeyPress {
                    key: &key,
                    repeat: event.repeat(),
                    modified: event.ctrl_key() || event.meta_key() || event.alt_key(),
                };
                if !press.is_game_key() {
                    return;
                }
                if game.borrow_mut().on_key(press.key) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                let g = &mut *g;
                g.ctrl.blur(&mut g.audio);
                log::info!("Auto-paused (window blur)");
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Tab closing
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().ctrl.unload();
            });
            let _ = window.add_event_listener_with_callback(
                "beforeunload",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let g = &mut *g;

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.ctrl.frame(dt.clamp(0.0, MAX_DT), &mut g.audio);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use typer_198x::audio::RecordingAudio;
    use typer_198x::consts::*;
    use typer_198x::persistence::{FileStore, SaveStore};
    use typer_198x::platform::InputEvent;
    use typer_198x::sim::{GameMode, GameState, LockTarget, Typable};
    use typer_198x::{AudioCue, RunController};

    const FPS: f32 = 60.0;
    /// Keystrokes per second for the scripted typist
    const TYPING_RATE: f32 = 7.0;
    /// Chance a keystroke is fumbled
    const TYPO_CHANCE: f64 = 0.04;
    const RETRIES: u32 = 3;

    /// Next character the typist aims for
    fn pick_char(state: &GameState) -> Option<char> {
        if let Some(boss) = state.boss.as_ref().filter(|b| b.alive) {
            return boss.next_char();
        }
        match state.lock {
            Some(LockTarget::Enemy(id)) => {
                if let Some(enemy) = state.enemies.iter().find(|e| e.id == id && e.alive) {
                    return enemy.next_char();
                }
            }
            Some(LockTarget::Powerup(id)) => {
                if let Some(powerup) = state.powerups.iter().find(|p| p.id == id && p.alive) {
                    return powerup.next_char();
                }
            }
            None => {}
        }

        // Closest on-screen thing
        let enemy = state
            .enemies
            .iter()
            .filter(|e| e.alive && e.pos.x < FIELD_WIDTH)
            .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
            .map(|e| (e.pos.x, e.next_char()));
        let powerup = state
            .powerups
            .iter()
            .filter(|p| p.alive && p.pos.x < FIELD_WIDTH)
            .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
            .map(|p| (p.pos.x, p.next_char()));
        match (enemy, powerup) {
            (Some((ex, ec)), Some((px, pc))) => {
                if px < ex {
                    pc
                } else {
                    ec
                }
            }
            (Some((_, c)), None) | (None, Some((_, c))) => c,
            (None, None) => None,
        }
    }

    pub fn run(seed: u64, seconds: f32) {
        let store = FileStore::in_dir(std::env::temp_dir());
        log::info!("Save file: {}", store.path().display());

        let mut audio = RecordingAudio::default();
        let mut ctrl = RunController::new(store, seed);
        let mut typist = Pcg32::seed_from_u64(seed ^ 0x7e_5e_ed);
        ctrl.set_player_name("HEADLESS");
        ctrl.continue_run(&mut audio);

        let dt = 1.0 / FPS;
        let mut key_budget = 0.0;
        let mut retries = 0;
        let mut t = 0.0;

        while t < seconds {
            t += dt;
            ctrl.frame(dt, &mut audio);

            let mode = ctrl.state().mode;
            match mode {
                GameMode::Playing => {}
                GameMode::LevelComplete => {
                    ctrl.advance_level(&mut audio);
                    continue;
                }
                GameMode::GameOver if retries < RETRIES => {
                    retries += 1;
                    ctrl.continue_run(&mut audio);
                    continue;
                }
                _ => break,
            }

            key_budget += dt * TYPING_RATE;
            while key_budget >= 1.0 {
                key_budget -= 1.0;
                let Some(ch) = pick_char(ctrl.state()) else {
                    break;
                };
                let ch = if typist.random_bool(TYPO_CHANCE) {
                    (b'a' + typist.random_range(0..26u8)) as char
                } else {
                    ch
                };
                ctrl.handle_input(InputEvent::Char(ch), &mut audio);
            }
        }

        ctrl.unload();
        let state = ctrl.state();
        log::info!(
            "Demo finished after {:.1}s: mode {:?}, level {}/{}, score {}, accuracy {}%, hp {:.0}/{:.0}",
            t,
            state.mode,
            state.level_index + 1,
            LEVEL_COUNT,
            state.stats.score,
            ctrl.accuracy_pct(),
            state.player.hp,
            state.player.max_hp
        );
        log::info!(
            "Cues: {} lasers, {} explosions, {} errors, {} boss sirens",
            audio.count(AudioCue::Laser),
            audio.count(AudioCue::Explosion),
            audio.count(AudioCue::Error),
            audio.count(AudioCue::BossSiren)
        );

        let mut store = FileStore::in_dir(std::env::temp_dir());
        match store.load() {
            Ok(Some(save)) => log::info!(
                "Stored: high score {}, unlocked {}/{}, run saved: {}",
                save.high_score,
                save.last_unlocked_level,
                LEVEL_COUNT,
                save.run.is_some()
            ),
            Ok(None) => log::warn!("No save written"),
            Err(err) => log::warn!("Save unreadable: {err}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("TypeR 198X (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(198);
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(120.0);
    headless::run(seed, seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
