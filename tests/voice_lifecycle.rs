//! End-to-end envelope lifecycle through the public API: note on, voice
//! steal, note off, and kill, with both completion hooks observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use swell::{AdsrEnvelope, EnvStage};

const SAMPLE_RATE: f64 = 48000.0;
const SUSTAIN: f64 = 0.6;

fn samples_for(time_ms: f64) -> usize {
    (time_ms * SAMPLE_RATE / 1000.0).ceil() as usize
}

fn configured_env(name: &str) -> AdsrEnvelope {
    let mut env = AdsrEnvelope::new(name, true);
    env.set_sample_rate(SAMPLE_RATE);
    env.set_stage_time(EnvStage::Attack, 5.0);
    env.set_stage_time(EnvStage::Decay, 30.0);
    env.set_stage_time(EnvStage::Release, 60.0);
    env
}

#[test]
fn full_steal_and_release_cycle() {
    let resets = Arc::new(AtomicUsize::new(0));
    let ends = Arc::new(AtomicUsize::new(0));

    let mut env = configured_env("voice-0");
    {
        let resets = resets.clone();
        env.set_reset_hook(move || {
            resets.fetch_add(1, Ordering::SeqCst);
        });
        let ends = ends.clone();
        env.set_end_release_hook(move || {
            ends.fetch_add(1, Ordering::SeqCst);
        });
    }

    // Note on, run well past attack and decay into sustain.
    env.start(1.0, 1.0);
    for _ in 0..samples_for(200.0) {
        env.process(SUSTAIN);
    }
    assert_eq!(env.stage(), EnvStage::Sustain);

    // A new note steals this voice. The output must fade without jumping:
    // every sample during the fade stays within the pre-steal level.
    let pre_steal = env.prev_output();
    env.retrigger(0.5, 1.0);
    let mut fade_samples = 0;
    while env.stage() == EnvStage::ReleasedToRetrigger {
        let out = env.process(SUSTAIN);
        assert!(out >= 0.0 && out <= pre_steal + 1e-9);
        fade_samples += 1;
        assert!(fade_samples <= samples_for(3.0) + 2);
    }
    assert_eq!(resets.load(Ordering::SeqCst), 1);
    assert_eq!(ends.load(Ordering::SeqCst), 0);

    // The restarted attack climbs from zero at the new velocity.
    assert_eq!(env.stage(), EnvStage::Attack);
    let mut peak = 0.0f64;
    for _ in 0..samples_for(200.0) {
        peak = peak.max(env.process(SUSTAIN));
    }
    assert!(peak <= 0.5 + 1e-9);
    assert!(peak > 0.4);

    // Note off: release runs to silence and reports completion exactly once.
    env.release();
    assert!(env.is_released());
    let mut n = 0;
    while env.is_busy() {
        env.process(SUSTAIN);
        n += 1;
        assert!(n <= 2 * samples_for(60.0) + 2);
    }
    assert_eq!(ends.load(Ordering::SeqCst), 1);
    assert_eq!(env.prev_output(), 0.0);

    // Nothing further happens while idle.
    for _ in 0..100 {
        assert_eq!(env.process(SUSTAIN), 0.0);
    }
    assert_eq!(resets.load(Ordering::SeqCst), 1);
    assert_eq!(ends.load(Ordering::SeqCst), 1);
}

#[test]
fn soft_kill_reports_silence_once() {
    let ends = Arc::new(AtomicUsize::new(0));

    let mut env = configured_env("voice-1");
    let counter = ends.clone();
    env.set_end_release_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    env.start(0.9, 1.0);
    for _ in 0..samples_for(100.0) {
        env.process(SUSTAIN);
    }

    env.kill(false);
    let mut n = 0;
    while env.is_busy() {
        env.process(SUSTAIN);
        n += 1;
        assert!(n <= samples_for(20.0) + 2);
    }
    assert_eq!(ends.load(Ordering::SeqCst), 1);

    // Killing an already-idle voice does nothing.
    env.kill(false);
    assert!(!env.is_busy());
    assert_eq!(env.process(SUSTAIN), 0.0);
    assert_eq!(ends.load(Ordering::SeqCst), 1);
}

#[test]
fn hard_kill_silences_next_sample() {
    let mut env = configured_env("voice-2");
    env.start(1.0, 1.0);
    for _ in 0..samples_for(50.0) {
        env.process(SUSTAIN);
    }
    assert!(env.prev_output() > 0.0);

    env.kill(true);
    assert_eq!(env.process(SUSTAIN), 0.0);
    assert!(!env.is_busy());
}
