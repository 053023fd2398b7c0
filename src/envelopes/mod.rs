//! Envelope generators for per-voice amplitude and modulation control.
//!
//! The central type is [`AdsrEnvelope`], a seven-stage ADSR state machine
//! with fast anti-click fades for voice stealing and soft kills. The
//! [`timing`] submodule holds the millisecond-to-increment conversion math
//! and the shared time/threshold constants.

mod adsr;
pub mod timing;

pub use adsr::{AdsrEnvelope, EnvStage};
