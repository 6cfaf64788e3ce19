//! Audio using the Web Audio API
//!
//! Procedurally generated tones, no sound files. Every [`SoundCue`] maps to a
//! short list of notes; playback is best effort and failures are ignored.

use crate::sim::state::SoundCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Start offset in seconds
    pub delay: f64,
    pub duration: f64,
    pub freq: f32,
    /// Frequency glided to by the end of the note
    pub glide_to: Option<f32>,
    pub wave: Wave,
    /// Peak gain before the master volume
    pub gain: f32,
}

const fn note(delay: f64, duration: f64, freq: f32, wave: Wave, gain: f32) -> Note {
    Note {
        delay,
        duration,
        freq,
        glide_to: None,
        wave,
        gain,
    }
}

const fn glide(duration: f64, from: f32, to: f32, wave: Wave, gain: f32) -> Note {
    Note {
        delay: 0.0,
        duration,
        freq: from,
        glide_to: Some(to),
        wave,
        gain,
    }
}

/// One note per frequency, `step` seconds apart
const fn arpeggio<const N: usize>(
    step: f64,
    duration: f64,
    wave: Wave,
    gain: f32,
    freqs: [f32; N],
) -> [Note; N] {
    let mut notes = [note(0.0, duration, 0.0, wave, gain); N];
    let mut i = 0;
    while i < N {
        notes[i] = note(i as f64 * step, duration, freqs[i], wave, gain);
        i += 1;
    }
    notes
}

const JUMP: [Note; 1] = [glide(0.2, 200.0, 600.0, Wave::Triangle, 0.3)];
const PICKUP: [Note; 3] = arpeggio(0.08, 0.2, Wave::Sine, 0.25, [600.0, 800.0, 1000.0]);
const DEATH: [Note; 1] = [glide(0.5, 300.0, 60.0, Wave::Sawtooth, 0.35)];
const CHECKPOINT: [Note; 2] = arpeggio(0.1, 0.25, Wave::Triangle, 0.3, [500.0, 750.0]);
const BEAT_HIT: [Note; 1] = [note(0.0, 0.1, 880.0, Wave::Sine, 0.3)];
const BEAT_MISS: [Note; 1] = [glide(0.15, 200.0, 120.0, Wave::Square, 0.15)];
const TILE_LOCK: [Note; 2] = arpeggio(0.05, 0.12, Wave::Triangle, 0.3, [300.0, 450.0]);
const SHOOT: [Note; 1] = [glide(0.08, 900.0, 500.0, Wave::Square, 0.1)];
const BOSS_HIT: [Note; 1] = [glide(0.15, 150.0, 60.0, Wave::Sine, 0.5)];
const BOSS_PHASE: [Note; 1] = [glide(0.8, 80.0, 40.0, Wave::Sawtooth, 0.45)];
const WARNING: [Note; 3] = arpeggio(0.2, 0.15, Wave::Square, 0.2, [700.0, 700.0, 700.0]);
const VICTORY: [Note; 5] = arpeggio(0.1, 0.4, Wave::Triangle, 0.3, [400.0, 500.0, 600.0, 800.0, 1000.0]);
const GAME_OVER: [Note; 4] = arpeggio(0.2, 0.4, Wave::Sine, 0.3, [400.0, 350.0, 300.0, 200.0]);

/// Notes played for a cue
pub fn notes(cue: SoundCue) -> &'static [Note] {
    match cue {
        SoundCue::Jump => &JUMP,
        SoundCue::Pickup => &PICKUP,
        SoundCue::Death => &DEATH,
        SoundCue::Checkpoint => &CHECKPOINT,
        SoundCue::BeatHit => &BEAT_HIT,
        SoundCue::BeatMiss => &BEAT_MISS,
        SoundCue::TileLock => &TILE_LOCK,
        SoundCue::Shoot => &SHOOT,
        SoundCue::BossHit => &BOSS_HIT,
        SoundCue::BossPhase => &BOSS_PHASE,
        SoundCue::Warning => &WARNING,
        SoundCue::Victory => &VICTORY,
        SoundCue::GameOver => &GAME_OVER,
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Note, Wave, notes};
    use crate::sim::state::SoundCue;

    impl From<Wave> for OscillatorType {
        fn from(wave: Wave) -> Self {
            match wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Triangle => OscillatorType::Triangle,
                Wave::Sawtooth => OscillatorType::Sawtooth,
            }
        }
    }

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl AudioManager {
        pub fn new(volume: f32) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: volume.clamp(0.0, 1.0),
            }
        }

        pub fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn play(&self, cue: SoundCue) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for note in notes(cue) {
                if self.play_note(ctx, note).is_none() {
                    log::debug!("dropped {:?} note", cue);
                }
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            wave: Wave,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(wave.into());
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_note(&self, ctx: &AudioContext, note: &Note) -> Option<()> {
            let (osc, gain) = self.create_osc(ctx, note.freq, note.wave)?;
            let t = ctx.current_time() + note.delay;
            let end = t + note.duration;

            gain.gain()
                .set_value_at_time(self.volume * note.gain, t)
                .ok()?;
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, end * 0.9 + t * 0.1)
                .ok()?;
            if let Some(target) = note.glide_to {
                osc.frequency().set_value_at_time(note.freq, t).ok()?;
                osc.frequency()
                    .exponential_ramp_to_value_at_time(target, end)
                    .ok()?;
            }

            osc.start_with_when(t).ok()?;
            osc.stop_with_when(end).ok()?;
            Some(())
        }
    }
}
