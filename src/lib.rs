//! Swell - per-voice envelope generation for real-time synthesis.
//!
//! This library provides the amplitude/modulation envelope for a synthesizer
//! voice: a click-free ADSR state machine driven one sample at a time from
//! the audio callback, with no allocation on the processing path.

pub mod envelopes;

// Re-export commonly used types at the crate root
pub use envelopes::{AdsrEnvelope, EnvStage};
