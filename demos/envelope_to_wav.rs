//! Renders an envelope shape to a WAV file for inspection.
//!
//! Drives the envelope through a note-on, a voice-steal retrigger, and a
//! note-off, writing the raw envelope output (not an oscillator) to
//! `envelope.wav`. Open the file in any audio editor to see the attack ramp,
//! the exponential decay and release, and the short anti-click fade at the
//! retrigger point.

use anyhow::Result;
use swell::{AdsrEnvelope, EnvStage};

const SAMPLE_RATE: f64 = 44100.0;
const SUSTAIN_LEVEL: f64 = 0.7;

fn main() -> Result<()> {
    let mut env = AdsrEnvelope::new("render", true);
    env.set_sample_rate(SAMPLE_RATE);
    env.set_stage_time(EnvStage::Attack, 40.0);
    env.set_stage_time(EnvStage::Decay, 120.0);
    env.set_stage_time(EnvStage::Release, 250.0);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create("envelope.wav", spec)?;

    let ms = |t: f64| (t * SAMPLE_RATE / 1000.0) as usize;

    // Note on, hold long enough to settle into sustain.
    env.start(0.9, 1.0);
    for _ in 0..ms(500.0) {
        writer.write_sample(to_i16(env.process(SUSTAIN_LEVEL)))?;
    }

    // Steal the voice: 3ms fade to zero, then a fresh attack at a new level.
    env.retrigger(1.0, 1.0);
    for _ in 0..ms(400.0) {
        writer.write_sample(to_i16(env.process(SUSTAIN_LEVEL)))?;
    }

    // Note off, run the release out to silence.
    env.release();
    while env.is_busy() {
        writer.write_sample(to_i16(env.process(SUSTAIN_LEVEL)))?;
    }

    writer.finalize()?;
    println!("Wrote envelope.wav");
    Ok(())
}

fn to_i16(value: f64) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
}
