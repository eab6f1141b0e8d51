//! Pixel compositing and per-interval frame synthesis.

pub(crate) mod composite;
pub(crate) mod synth;
