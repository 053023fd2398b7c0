//! Interactive ADSR envelope demo.
//!
//! Hold SPACE to play a note: the envelope runs Attack → Decay → Sustain
//! while held, and Release when you let go. Press SPACE again while the note
//! is still sounding to hear a retrigger: the voice fades out over 3ms and
//! restarts, with the oscillator phase re-zeroed through the reset hook.
//! K soft-kills the voice (20ms fade), X hard-kills it (instant, may click).
//! Press Q or ESC to quit.

mod common;

use anyhow::Result;
use common::{DemoAudioState, KeyAction, KeyboardConfig, is_quit_key, run_interactive_demo};
use crossterm::{
    ExecutableCommand,
    event::{KeyCode, KeyEvent, KeyEventKind},
};
use std::f64::consts::TAU;
use std::io::{Write, stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use swell::{AdsrEnvelope, EnvStage};

const NOTE_FREQ: f64 = 220.0; // A3
const ATTACK_MS: f64 = 50.0;
const DECAY_MS: f64 = 100.0;
const SUSTAIN_LEVEL: f64 = 0.7;
const RELEASE_MS: f64 = 300.0;
const VELOCITY: f64 = 0.8;

struct AudioState {
    phase: f64,
    phase_incr: f64,
    envelope: AdsrEnvelope,
    // Set by the reset hook when a retrigger fade completes; the audio
    // callback re-zeroes the phase before the new attack becomes audible.
    phase_reset: Arc<AtomicBool>,
    space_pressed: bool,
}

impl AudioState {
    fn new() -> Self {
        let phase_reset = Arc::new(AtomicBool::new(false));
        let flag = phase_reset.clone();
        let envelope =
            AdsrEnvelope::new("demo-amp", true).with_reset_hook(move || {
                flag.store(true, Ordering::Relaxed);
            });

        Self {
            phase: 0.0,
            phase_incr: 0.0,
            envelope,
            phase_reset,
            space_pressed: false,
        }
    }

    fn handle_key_event(&mut self, code: KeyCode, kind: KeyEventKind) {
        match code {
            KeyCode::Char(' ') => {
                if matches!(kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    if !self.space_pressed {
                        self.space_pressed = true;
                        if self.envelope.is_busy() {
                            // Voice steal: fade out, then restart the attack.
                            self.envelope.retrigger(VELOCITY, 1.0);
                        } else {
                            self.envelope.start(VELOCITY, 1.0);
                        }
                    }
                } else if matches!(kind, KeyEventKind::Release) {
                    self.space_pressed = false;
                    self.envelope.release();
                }
            }
            KeyCode::Char('k') | KeyCode::Char('K') => {
                if matches!(kind, KeyEventKind::Press) {
                    self.space_pressed = false;
                    self.envelope.kill(false);
                }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                if matches!(kind, KeyEventKind::Press) {
                    self.space_pressed = false;
                    self.envelope.kill(true);
                }
            }
            _ => {}
        }
    }

    fn is_active(&self) -> bool {
        self.envelope.is_busy()
    }
}

impl DemoAudioState for AudioState {
    fn next_sample(&mut self) -> f64 {
        if self.phase_reset.swap(false, Ordering::Relaxed) {
            self.phase = 0.0;
        }

        let oscillator_sample = (TAU * self.phase).sin();
        self.phase += self.phase_incr;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        let envelope_level = self.envelope.process(SUSTAIN_LEVEL);
        oscillator_sample * envelope_level * 0.3
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.phase_incr = NOTE_FREQ / sample_rate;
        self.envelope.set_sample_rate(sample_rate);
        self.envelope.set_stage_time(EnvStage::Attack, ATTACK_MS);
        self.envelope.set_stage_time(EnvStage::Decay, DECAY_MS);
        self.envelope.set_stage_time(EnvStage::Release, RELEASE_MS);
    }
}

fn draw_ui(is_active: bool) -> Result<()> {
    let mut stdout = stdout();
    stdout.execute(crossterm::terminal::Clear(
        crossterm::terminal::ClearType::All,
    ))?;
    stdout.execute(crossterm::cursor::MoveTo(0, 0))?;
    write!(
        stdout,
        "ADSR Envelope: {} | HOLD SPACE=play  K=soft kill  X=hard kill  Q=quit",
        if is_active { "PLAYING" } else { "IDLE   " }
    )?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    run_interactive_demo(
        AudioState::new(),
        KeyboardConfig::with_enhancements(),
        |_state| draw_ui(false),
        |state, key_event: &KeyEvent| {
            let mut state_guard = state.lock().unwrap();

            if is_quit_key(key_event.code) && matches!(key_event.kind, KeyEventKind::Press) {
                return Ok(KeyAction::Exit);
            }

            state_guard.handle_key_event(key_event.code, key_event.kind);
            let is_active = state_guard.is_active();
            drop(state_guard);

            draw_ui(is_active)?;
            Ok(KeyAction::Continue)
        },
    )?;

    println!("\nGoodbye!");
    Ok(())
}
