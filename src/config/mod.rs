//! # Configuration
//!
//! Settings for synthesis runs, read from the environment.

mod synth;

pub use synth::SynthConfig;
