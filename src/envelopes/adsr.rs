//! Click-free ADSR envelope generator for per-voice amplitude control.

use std::fmt;

use super::timing::{
    EARLY_RELEASE_TIME_MS, ENV_VALUE_HIGH, ENV_VALUE_LOW, MAX_ENV_TIME_MS, MIN_ENV_TIME_MS,
    RETRIGGER_RELEASE_TIME_MS, exp_decay_factor, linear_increment,
};

/// Stage of the envelope's lifecycle.
///
/// Besides the four classic ADSR stages and `Idle`, there are two fast
/// fade-out stages used to avoid clicks when a sounding voice is interrupted:
/// [`ReleasedToRetrigger`](EnvStage::ReleasedToRetrigger) ramps to zero before
/// a stolen voice restarts its attack, and
/// [`ReleasedToEndEarly`](EnvStage::ReleasedToEndEarly) ramps to zero before a
/// softly killed voice goes idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStage {
    /// Envelope is not active
    Idle,
    /// Ramping linearly from 0 to peak
    Attack,
    /// Decaying exponentially from peak toward the sustain level
    Decay,
    /// Holding at the sustain level
    Sustain,
    /// Decaying exponentially from the release snapshot to 0
    Release,
    /// Fast fixed-time fade to 0, then restart the attack (voice stealing)
    ReleasedToRetrigger,
    /// Fast fixed-time fade to 0, then go idle (soft kill)
    ReleasedToEndEarly,
}

/// Hook invoked synchronously inside [`AdsrEnvelope::process`] when a ramp
/// completes.
type RampHook = Box<dyn FnMut() + Send>;

/// Per-voice ADSR envelope generator.
///
/// Converts trigger events (note on, note off, voice steal, kill) into a
/// sample-by-sample control signal. Attack is a linear ramp; decay and
/// release are exponential, tuned so the ramp covers -60 dB in the configured
/// time. Interrupting a sounding voice goes through a short fixed-time fade
/// to zero first, so retriggers and soft kills never produce an audible click.
///
/// One call to [`process`](Self::process) advances time by exactly one
/// sample. The call does no allocation and never blocks, so it is safe to
/// drive from a real-time audio callback. Configuration and trigger calls are
/// expected to be serialized with processing by the host (typically through
/// an event queue ahead of the audio callback); the envelope itself holds no
/// locks.
///
/// # Examples
///
/// ```
/// use swell::{AdsrEnvelope, EnvStage};
///
/// let mut env = AdsrEnvelope::new("amp", true);
/// env.set_sample_rate(44100.0);
/// env.set_stage_time(EnvStage::Attack, 5.0);
/// env.set_stage_time(EnvStage::Decay, 50.0);
/// env.set_stage_time(EnvStage::Release, 100.0);
///
/// // Note on at 80% velocity.
/// env.start(0.8, 1.0);
/// for _ in 0..1024 {
///     let _level = env.process(0.7);
/// }
///
/// // Note off: ramps down from wherever the voice was.
/// env.release();
/// while env.is_busy() {
///     env.process(0.7);
/// }
/// ```
pub struct AdsrEnvelope {
    name: String,
    stage: EnvStage,
    env_value: f64,       // raw progress value within the current stage
    level: f64,           // overall depth, usually from velocity
    release_level: f64,   // raw output snapshot when a release-type stage began
    new_start_level: f64, // level to adopt once a retrigger fade completes
    scalar: f64,          // reciprocal of the caller's time scalar (key follow)
    prev_result: f64,     // last output before level scaling
    prev_output: f64,     // last output after level scaling
    released: bool,
    sustain_enabled: bool,
    sample_rate: f64,

    attack_incr: f64,
    decay_incr: f64,
    release_incr: f64,
    early_release_incr: f64,
    retrigger_release_incr: f64,

    reset_hook: Option<RampHook>,
    end_release_hook: Option<RampHook>,
}

impl AdsrEnvelope {
    /// Creates an idle envelope.
    ///
    /// The sample rate defaults to 44.1 kHz and all three stage times default
    /// to instantaneous; call [`set_sample_rate`](Self::set_sample_rate) and
    /// [`set_stage_time`](Self::set_stage_time) before use.
    ///
    /// # Arguments
    ///
    /// * `name` - Identifier used only for diagnostics
    /// * `sustain_enabled` - If true this is a full ADSR envelope. If false
    ///   it is AD-only: decay runs to silence and releases itself, which
    ///   suits percussive voices.
    pub fn new(name: impl Into<String>, sustain_enabled: bool) -> Self {
        let mut env = Self {
            name: name.into(),
            stage: EnvStage::Idle,
            env_value: 0.0,
            level: 0.0,
            release_level: 0.0,
            new_start_level: 0.0,
            scalar: 1.0,
            prev_result: 0.0,
            prev_output: 0.0,
            released: true,
            sustain_enabled,
            sample_rate: 44100.0,
            attack_incr: 0.0,
            decay_incr: 0.0,
            release_incr: 0.0,
            early_release_incr: 0.0,
            retrigger_release_incr: 0.0,
            reset_hook: None,
            end_release_hook: None,
        };
        env.set_sample_rate(44100.0);
        env
    }

    /// Sets the retrigger reset hook at construction time.
    ///
    /// # Examples
    ///
    /// ```
    /// use swell::AdsrEnvelope;
    ///
    /// let env = AdsrEnvelope::new("amp", true)
    ///     .with_reset_hook(|| { /* re-zero the oscillator phase */ });
    /// ```
    pub fn with_reset_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.reset_hook = Some(Box::new(hook));
        self
    }

    /// Sets the hook called when a retrigger fade reaches zero, just before
    /// the new attack begins. Typically used to reset a paired oscillator's
    /// phase so the restarted note is deterministic.
    ///
    /// Boxing the hook allocates: call this off the real-time thread.
    pub fn set_reset_hook(&mut self, hook: impl FnMut() + Send + 'static) {
        self.reset_hook = Some(Box::new(hook));
    }

    /// Removes the retrigger reset hook.
    pub fn clear_reset_hook(&mut self) {
        self.reset_hook = None;
    }

    /// Sets the hook called when a release or soft-kill ramp reaches zero,
    /// i.e. when the voice has gone silent and idle.
    ///
    /// Boxing the hook allocates: call this off the real-time thread.
    pub fn set_end_release_hook(&mut self, hook: impl FnMut() + Send + 'static) {
        self.end_release_hook = Some(Box::new(hook));
    }

    /// Removes the end-of-release hook.
    pub fn clear_end_release_hook(&mut self) {
        self.end_release_hook = None;
    }

    /// Sets the time for a configurable envelope stage.
    ///
    /// Only `Attack`, `Decay` and `Release` have configurable times; any
    /// other stage is ignored. The time is clamped to
    /// [`MIN_ENV_TIME_MS`]..=[`MAX_ENV_TIME_MS`].
    pub fn set_stage_time(&mut self, stage: EnvStage, time_ms: f64) {
        let time_ms = time_ms.clamp(MIN_ENV_TIME_MS, MAX_ENV_TIME_MS);
        match stage {
            EnvStage::Attack => self.attack_incr = linear_increment(time_ms, self.sample_rate),
            EnvStage::Decay => self.decay_incr = exp_decay_factor(time_ms, self.sample_rate),
            EnvStage::Release => self.release_incr = exp_decay_factor(time_ms, self.sample_rate),
            // The remaining stages have no configurable duration.
            _ => {}
        }
    }

    /// Sets the sample rate and recomputes the two fixed fade increments.
    ///
    /// The attack, decay and release increments also depend on the sample
    /// rate; re-apply their times via [`set_stage_time`](Self::set_stage_time)
    /// after changing it.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.early_release_incr = linear_increment(EARLY_RELEASE_TIME_MS, sample_rate);
        self.retrigger_release_incr = linear_increment(RETRIGGER_RELEASE_TIME_MS, sample_rate);
    }

    /// Starts the envelope from silence.
    ///
    /// # Arguments
    ///
    /// * `level` - Overall depth of the envelope, usually from note velocity
    /// * `time_scalar` - Factor applied to the attack/decay/release rates,
    ///   e.g. for key follow; pass 1.0 for none
    pub fn start(&mut self, level: f64, time_scalar: f64) {
        self.stage = EnvStage::Attack;
        self.env_value = 0.0;
        self.level = level;
        self.scalar = 1.0 / time_scalar;
        self.released = false;
    }

    /// Releases the envelope (note off).
    ///
    /// The release ramp restarts from full scale but its output is rescaled
    /// to the last raw output, so the signal continues smoothly from wherever
    /// the voice was - even mid-attack or mid-decay.
    pub fn release(&mut self) {
        self.stage = EnvStage::Release;
        self.release_level = self.prev_result;
        self.env_value = 1.0;
        self.released = true;
    }

    /// Retriggers the envelope for a stolen voice.
    ///
    /// Rather than jumping straight back to attack (which would click), the
    /// envelope first fades to zero over [`RETRIGGER_RELEASE_TIME_MS`]. When
    /// the fade completes, `new_start_level` becomes the level, the reset
    /// hook fires, and the attack begins.
    pub fn retrigger(&mut self, new_start_level: f64, time_scalar: f64) {
        self.env_value = 1.0;
        self.new_start_level = new_start_level;
        self.scalar = 1.0 / time_scalar;
        self.release_level = self.prev_result;
        self.stage = EnvStage::ReleasedToRetrigger;
        self.released = false;
    }

    /// Kills the envelope.
    ///
    /// A hard kill silences the voice on the next sample, which may click -
    /// that is the caller's choice. A soft kill fades to zero over
    /// [`EARLY_RELEASE_TIME_MS`] and then goes idle. Both are no-ops on an
    /// idle envelope.
    pub fn kill(&mut self, hard: bool) {
        if self.stage == EnvStage::Idle {
            return;
        }
        if hard {
            self.release_level = 0.0;
            self.stage = EnvStage::Idle;
            self.env_value = 0.0;
        } else {
            self.release_level = self.prev_result;
            self.stage = EnvStage::ReleasedToEndEarly;
            self.env_value = 1.0;
        }
    }

    /// Returns true if the envelope is doing anything (stage is not `Idle`).
    pub fn is_busy(&self) -> bool {
        self.stage != EnvStage::Idle
    }

    /// Returns true if the envelope has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Returns the previously output (level-scaled) sample.
    pub fn prev_output(&self) -> f64 {
        self.prev_output
    }

    /// Returns the current stage.
    pub fn stage(&self) -> EnvStage {
        self.stage
    }

    /// Returns the diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advances the envelope by exactly one sample and returns the
    /// level-scaled output.
    ///
    /// `sustain_level` is supplied per call rather than stored, so the caller
    /// can smooth it externally if it is being automated; during decay a
    /// change lands gradually (the decay interpolates toward it), while in
    /// sustain it lands immediately.
    ///
    /// This is the real-time path: arithmetic only, plus at most one hook
    /// invocation when a ramp completes.
    ///
    /// # Examples
    ///
    /// ```
    /// use swell::{AdsrEnvelope, EnvStage};
    ///
    /// let mut env = AdsrEnvelope::new("amp", true);
    /// env.set_stage_time(EnvStage::Attack, 10.0);
    /// env.start(1.0, 1.0);
    ///
    /// let first = env.process(0.5);
    /// assert!(first > 0.0 && first < 0.01);
    /// ```
    pub fn process(&mut self, sustain_level: f64) -> f64 {
        let mut result;

        match self.stage {
            EnvStage::Idle => {
                result = self.env_value;
            }
            EnvStage::Attack => {
                self.env_value += self.attack_incr * self.scalar;
                if self.env_value > ENV_VALUE_HIGH || self.attack_incr == 0.0 {
                    self.stage = EnvStage::Decay;
                    self.env_value = 1.0;
                }
                result = self.env_value;
            }
            EnvStage::Decay => {
                self.env_value -= self.decay_incr * self.env_value * self.scalar;
                result = self.env_value * (1.0 - sustain_level) + sustain_level;
                if self.env_value < ENV_VALUE_LOW {
                    if self.sustain_enabled {
                        self.stage = EnvStage::Sustain;
                        self.env_value = 1.0;
                        result = sustain_level;
                    } else {
                        // AD-only mode: decay ran to silence, release ourselves.
                        self.release();
                    }
                }
            }
            EnvStage::Sustain => {
                result = sustain_level;
            }
            EnvStage::Release => {
                self.env_value -= self.release_incr * self.env_value * self.scalar;
                if self.env_value < ENV_VALUE_LOW || self.release_incr == 0.0 {
                    self.stage = EnvStage::Idle;
                    self.env_value = 0.0;
                    if let Some(hook) = self.end_release_hook.as_mut() {
                        hook();
                    }
                }
                result = self.env_value * self.release_level;
            }
            EnvStage::ReleasedToRetrigger => {
                // Fixed-time fade, deliberately not scaled by `scalar`.
                self.env_value -= self.retrigger_release_incr;
                if self.env_value < ENV_VALUE_LOW {
                    self.stage = EnvStage::Attack;
                    self.level = self.new_start_level;
                    self.env_value = 0.0;
                    self.prev_result = 0.0;
                    self.release_level = 0.0;
                    if let Some(hook) = self.reset_hook.as_mut() {
                        hook();
                    }
                }
                result = self.env_value * self.release_level;
            }
            EnvStage::ReleasedToEndEarly => {
                self.env_value -= self.early_release_incr;
                if self.env_value < ENV_VALUE_LOW {
                    self.stage = EnvStage::Idle;
                    self.level = 0.0;
                    self.env_value = 0.0;
                    self.prev_result = 0.0;
                    self.release_level = 0.0;
                    if let Some(hook) = self.end_release_hook.as_mut() {
                        hook();
                    }
                }
                result = self.env_value * self.release_level;
            }
        }

        self.prev_result = result;
        self.prev_output = result * self.level;
        self.prev_output
    }

    #[cfg(test)]
    fn level(&self) -> f64 {
        self.level
    }
}

impl fmt::Debug for AdsrEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsrEnvelope")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("env_value", &self.env_value)
            .field("level", &self.level)
            .field("released", &self.released)
            .field("sustain_enabled", &self.sustain_enabled)
            .field("sample_rate", &self.sample_rate)
            .field("reset_hook", &self.reset_hook.is_some())
            .field("end_release_hook", &self.end_release_hook.is_some())
            .finish()
    }
}
