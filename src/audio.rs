//! Audio cues
//!
//! The core only names cues; an `AudioSink` decides how they sound. On the web
//! they're synthesized with Web Audio oscillators - no sample files needed.

/// Fire-and-forget sound cues requested by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// A beam fired on a correct key
    Laser,
    /// Enemy or boss took a character
    Hit,
    /// Enemy destroyed
    Explosion,
    /// Boss destroyed
    BigExplosion,
    /// Powerup collected (also plays on level start)
    Powerup,
    /// Wrong key
    Error,
    /// Boss incoming
    BossSiren,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator sweeping `from` -> `to` Hz with a decaying envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    pub from: f32,
    pub to: f32,
    /// Delay after the cue fires (seconds)
    pub start: f64,
    pub length: f64,
    /// Peak gain before the master volume
    pub level: f32,
}

impl Tone {
    const fn new(wave: Wave, from: f32, to: f32, start: f64, length: f64, level: f32) -> Self {
        Self {
            wave,
            from,
            to,
            start,
            length,
            level,
        }
    }
}

const LASER: [Tone; 1] = [Tone::new(Wave::Sawtooth, 1400.0, 520.0, 0.0, 0.12, 0.2)];
const HIT: [Tone; 1] = [Tone::new(Wave::Square, 880.0, 440.0, 0.0, 0.08, 0.14)];
const EXPLOSION: [Tone; 1] = [Tone::new(Wave::Sine, 110.0, 55.0, 0.0, 0.18, 0.35)];
const BIG_EXPLOSION: [Tone; 2] = [
    Tone::new(Wave::Sine, 90.0, 30.0, 0.0, 0.6, 0.6),
    Tone::new(Wave::Sawtooth, 220.0, 40.0, 0.05, 0.5, 0.2),
];
// Rising arpeggio
const POWERUP: [Tone; 3] = [
    Tone::new(Wave::Triangle, 660.0, 660.0, 0.0, 0.12, 0.35),
    Tone::new(Wave::Triangle, 880.0, 880.0, 0.045, 0.12, 0.35),
    Tone::new(Wave::Triangle, 1320.0, 1320.0, 0.09, 0.12, 0.35),
];
const ERROR: [Tone; 1] = [Tone::new(Wave::Square, 180.0, 140.0, 0.0, 0.14, 0.25)];
const BOSS_SIREN: [Tone; 2] = [
    Tone::new(Wave::Sawtooth, 520.0, 980.0, 0.0, 0.24, 0.35),
    Tone::new(Wave::Sawtooth, 980.0, 520.0, 0.24, 0.28, 0.35),
];

impl AudioCue {
    /// Synth recipe for this cue
    pub fn tones(self) -> &'static [Tone] {
        match self {
            AudioCue::Laser => &LASER,
            AudioCue::Hit => &HIT,
            AudioCue::Explosion => &EXPLOSION,
            AudioCue::BigExplosion => &BIG_EXPLOSION,
            AudioCue::Powerup => &POWERUP,
            AudioCue::Error => &ERROR,
            AudioCue::BossSiren => &BOSS_SIREN,
        }
    }
}

/// Receiver for audio requests. Never blocks the simulation.
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
    fn set_muted(&mut self, muted: bool);
    fn play_music(&mut self) {}
    fn stop_music(&mut self) {}
}

/// Silent sink (headless runs, audio unavailable)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}
    fn set_muted(&mut self, _muted: bool) {}
}

/// Sink that remembers what it was asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<AudioCue>,
    pub muted: bool,
    pub music_playing: bool,
}

impl RecordingAudio {
    pub fn count(&self, cue: AudioCue) -> usize {
        self.played.iter().filter(|&&c| c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        if !self.muted {
            self.played.push(cue);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn play_music(&mut self) {
        self.music_playing = true;
    }

    fn stop_music(&mut self) {
        self.music_playing = false;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioCue, AudioSink, Tone, Wave};

    /// Web Audio synthesizer
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
        muted: bool,
        music: Option<(OscillatorNode, GainNode)>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: 0.65,
                muted: false,
                music: None,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some((osc, gain))
        }

        fn sweep(&self, ctx: &AudioContext, tone: &Tone) {
            let Some((osc, gain)) = Self::create_osc(ctx, tone.from, osc_type(tone.wave)) else {
                return;
            };
            let t = ctx.current_time() + tone.start;
            gain.gain()
                .set_value_at_time(self.volume * tone.level, t)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.0001, t + tone.length)
                .ok();
            osc.frequency().set_value_at_time(tone.from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(tone.to, t + tone.length * 0.6)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.length + 0.02).ok();
        }
    }

    fn osc_type(wave: Wave) -> OscillatorType {
        match wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
            Wave::Triangle => OscillatorType::Triangle,
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, cue: AudioCue) {
            if self.muted {
                return;
            }
            let Some(ctx) = self.ctx.clone() else { return };
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in cue.tones() {
                self.sweep(&ctx, tone);
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            if let Some((_, gain)) = &self.music {
                gain.gain()
                    .set_value(if muted { 0.0 } else { self.volume * 0.08 });
            }
        }

        fn play_music(&mut self) {
            self.stop_music();
            let Some(ctx) = &self.ctx else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, 55.0, OscillatorType::Triangle) else {
                return;
            };
            gain.gain()
                .set_value(if self.muted { 0.0 } else { self.volume * 0.08 });
            osc.start().ok();
            self.music = Some((osc, gain));
        }

        fn stop_music(&mut self) {
            if let Some((osc, _)) = self.music.take() {
                osc.stop().ok();
            }
        }
    }
}
