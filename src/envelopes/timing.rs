//! Timing math for envelope stages.
//!
//! Stage durations are specified in milliseconds and converted into per-sample
//! increments once, when a stage time or the sample rate changes, so the
//! per-sample update is a single multiply-add.

/// Duration of the soft-kill fade, in milliseconds.
pub const EARLY_RELEASE_TIME_MS: f64 = 20.0;

/// Duration of the voice-steal fade before a retriggered attack, in milliseconds.
pub const RETRIGGER_RELEASE_TIME_MS: f64 = 3.0;

/// Shortest configurable stage time: one sample at 44.1 kHz.
pub const MIN_ENV_TIME_MS: f64 = 0.022675736961451;

/// Longest configurable stage time.
pub const MAX_ENV_TIME_MS: f64 = 60_000.0;

/// Value below which a downward ramp counts as finished (-120 dB).
pub const ENV_VALUE_LOW: f64 = 0.000001;

/// Value above which an upward ramp counts as finished.
pub const ENV_VALUE_HIGH: f64 = 0.999;

/// Per-sample increment for a linear ramp covering `time_ms`.
///
/// Adding the result to an accumulator once per sample moves it from 0.0 to
/// 1.0 in `time_ms` milliseconds. A non-positive time returns 0.0, which the
/// state machine treats as an instantaneous stage.
pub fn linear_increment(time_ms: f64, sample_rate: f64) -> f64 {
    if time_ms <= 0.0 {
        0.0
    } else {
        (1.0 / sample_rate) / (time_ms / 1000.0)
    }
}

/// Per-sample decay factor for an exponential ramp covering `time_ms`.
///
/// Repeatedly applying `value -= r * value` from 1.0 brings the value down to
/// the -60 dB point (0.001) in `time_ms` milliseconds, independent of sample
/// rate. A non-positive time returns 0.0 (instantaneous stage); the factor is
/// capped at 1.0 so very short times at low sample rates can't overshoot
/// below zero.
pub fn exp_decay_factor(time_ms: f64, sample_rate: f64) -> f64 {
    if time_ms <= 0.0 {
        return 0.0;
    }

    let r = -(1000.0 * 0.001_f64.ln() / (sample_rate * time_ms)).exp_m1();

    // Written so that a NaN also collapses to 1.0.
    if r < 1.0 { r } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples_for(time_ms: f64, sample_rate: f64) -> usize {
        (time_ms * sample_rate / 1000.0).ceil() as usize
    }

    #[test]
    fn test_zero_or_negative_time_is_instantaneous() {
        assert_eq!(linear_increment(0.0, 44100.0), 0.0);
        assert_eq!(linear_increment(-5.0, 44100.0), 0.0);
        assert_eq!(exp_decay_factor(0.0, 44100.0), 0.0);
        assert_eq!(exp_decay_factor(-5.0, 44100.0), 0.0);
    }

    #[test]
    fn test_linear_ramp_completes_in_time() {
        for &sample_rate in &[44100.0, 96000.0] {
            let incr = linear_increment(10.0, sample_rate);
            let mut value = 0.0;
            for _ in 0..samples_for(10.0, sample_rate) {
                value += incr;
            }
            assert!(
                value >= ENV_VALUE_HIGH,
                "ramp only reached {value} at {sample_rate} Hz"
            );
        }
    }

    #[test]
    fn test_linear_one_sample_minimum() {
        // MIN_ENV_TIME_MS is one sample at 44.1kHz, so a single step finishes it.
        let incr = linear_increment(MIN_ENV_TIME_MS, 44100.0);
        assert!(incr >= ENV_VALUE_HIGH);
    }

    #[test]
    fn test_exp_decay_hits_minus_60db_in_time() {
        // Same millisecond duration must take the same wall-clock time at
        // different sample rates.
        for &sample_rate in &[44100.0, 96000.0] {
            let r = exp_decay_factor(50.0, sample_rate);
            let budget = samples_for(50.0, sample_rate);

            let mut value = 1.0;
            let mut n = 0;
            while value >= 0.001 {
                value -= r * value;
                n += 1;
                assert!(n <= budget + 2, "still at {value} after {n} samples");
            }
            // Shouldn't finish dramatically early either.
            assert!(n + 2 >= budget, "finished in {n} of {budget} samples");
        }
    }

    #[test]
    fn test_exp_factor_capped_at_one() {
        // A sub-sample time would otherwise produce a factor above 1.0 and
        // push the value negative.
        let r = exp_decay_factor(0.001, 8000.0);
        assert!(r <= 1.0);
        assert!(r > 0.0);
    }

    #[test]
    fn test_exp_factor_monotonic_in_time() {
        let fast = exp_decay_factor(5.0, 44100.0);
        let slow = exp_decay_factor(500.0, 44100.0);
        assert!(fast > slow);
    }
}
