//! Loopcomp composites independently looping animated images onto a static background and
//! re-encodes the result as one animation.
//!
//! The engine works on an exact integer clock:
//!
//! - Per-frame durations become ticks of a shared rate ([`resolve_global_timebase`],
//!   [`AssetTimebase`])
//! - Asset loops combine into one composite period ([`CompositeClock`])
//! - The instants where any asset changes frame form an [`EventTimeline`]
//! - One frame is synthesized per interval, merging pixel-identical neighbours
//!   ([`CompositeSequence`])
//! - The sequence is written as APNG with exact delays or GIF with quantized delays
//!   ([`encode_sequence`])
//!
//! [`compose_animation`] runs the whole pipeline; [`decode_source`] and [`prepare_source`] turn
//! encoded source images into [`AnimatedAsset`]s.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod assets;
pub(crate) mod compose;
pub(crate) mod config;
pub(crate) mod encode;
pub(crate) mod layout;
pub(crate) mod render;
pub(crate) mod timeline;

pub use crate::foundation::core::{PlacementRect, Rational};
pub use crate::foundation::error::{LoopcompError, LoopcompResult};

pub use crate::assets::decode::{decode_source, normalize_delay};
pub use crate::assets::mask::MaskShape;
pub use crate::assets::prepare::{display_size, prepare_source};
pub use crate::assets::source::{AnimatedAsset, PreparedSource, SourceImage};
pub use crate::compose::{
    AssetPlan, TimelinePlan, compose_animation, compose_sequence, plan_timeline,
};
pub use crate::config::{ComposeOpts, OptimizerOpts, PrepareOpts};
pub use crate::encode::apng::{encode_apng, fit_delay_u16, rationalize_delay};
pub use crate::encode::gif::{encode_gif, quantize_delay_ms};
pub use crate::encode::optimize::optimize_gif;
pub use crate::encode::{EncodedAnimation, OutputFormat, encode_sequence};
pub use crate::layout::{ItemShape, LayoutItem, LayoutManifest, LoadedLayout};
pub use crate::render::composite::{StraightRgba8, blit_over, over_straight, paint_static};
pub use crate::render::synth::{CompositeFrame, CompositeSequence};
pub use crate::timeline::clock::{CompositeClock, GlobalTimebase, resolve_global_timebase};
pub use crate::timeline::events::EventTimeline;
pub use crate::timeline::timebase::AssetTimebase;
