//! End-to-end compositing: timing, synthesis and encoding for one request.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::assets::source::AnimatedAsset;
use crate::config::ComposeOpts;
use crate::encode::{EncodedAnimation, OutputFormat, encode_sequence};
use crate::foundation::core::{PlacementRect, Rational};
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::render::synth::{CompositeSequence, Layer, synthesize_frames};
use crate::timeline::clock::{CompositeClock, GlobalTimebase, resolve_global_timebase};
use crate::timeline::events::EventTimeline;
use crate::timeline::timebase::AssetTimebase;

/// Shared timing for a set of animated assets.
#[derive(Clone, Debug)]
pub(crate) struct Timing {
    pub(crate) global: GlobalTimebase,
    pub(crate) timebases: Vec<AssetTimebase>,
    pub(crate) clock: CompositeClock,
    pub(crate) events: EventTimeline,
}

/// Resolve the tick rate, per-asset ticks, composite period and change instants.
#[tracing::instrument(skip_all, fields(assets = duration_sets.len()))]
pub(crate) fn build_timing(
    duration_sets: &[&[Rational]],
    opts: &ComposeOpts,
) -> LoopcompResult<Timing> {
    let global = resolve_global_timebase(
        duration_sets,
        opts.max_denominator,
        opts.max_tick_denominator,
    );
    let timebases = global
        .durations
        .iter()
        .map(|d| AssetTimebase::compute(d, global.ticks_per_second))
        .collect::<LoopcompResult<Vec<_>>>()?;
    let clock = CompositeClock::new(global.ticks_per_second, &timebases, opts.max_composite_secs)?;
    let events = EventTimeline::build(&timebases, clock.period_ticks(), opts.max_events);

    tracing::debug!(
        ticks_per_second = global.ticks_per_second,
        snapped = global.snapped,
        period_ticks = clock.period_ticks(),
        truncated = clock.truncated(),
        events = events.len(),
        downsampled = events.downsampled(),
        "timing resolved"
    );

    Ok(Timing {
        global,
        timebases,
        clock,
        events,
    })
}

/// Composite looping `assets` over `background` and encode the result as `format`.
///
/// Each asset is drawn into the rectangle registered under its placement id. Assets without
/// frames or without a placement are skipped with a warning. With nothing left to animate the
/// output is the background as a single one-second frame.
#[tracing::instrument(skip_all, fields(assets = assets.len(), %format))]
pub fn compose_animation(
    background: &RgbaImage,
    placements: &BTreeMap<String, PlacementRect>,
    assets: &[AnimatedAsset],
    format: OutputFormat,
    opts: &ComposeOpts,
) -> LoopcompResult<EncodedAnimation> {
    opts.validate()?;
    let seq = compose_sequence(background, placements, assets, opts)?;
    let out = encode_sequence(&seq, format, opts)?;
    tracing::info!(
        frames = out.frame_count,
        bytes = out.bytes.len(),
        mime = out.mime,
        "animation composed"
    );
    Ok(out)
}

/// Composite `assets` over `background` without encoding.
pub fn compose_sequence(
    background: &RgbaImage,
    placements: &BTreeMap<String, PlacementRect>,
    assets: &[AnimatedAsset],
    opts: &ComposeOpts,
) -> LoopcompResult<CompositeSequence> {
    if background.width() == 0 || background.height() == 0 {
        return Err(LoopcompError::validation("background must be non-empty"));
    }

    let mut active: Vec<(&AnimatedAsset, PlacementRect)> = Vec::with_capacity(assets.len());
    for asset in assets {
        if asset.is_empty() {
            tracing::warn!(placement_id = asset.placement_id(), "asset has no frames; skipped");
            continue;
        }
        let Some(&placement) = placements.get(asset.placement_id()) else {
            tracing::warn!(placement_id = asset.placement_id(), "asset has no placement; skipped");
            continue;
        };
        active.push((asset, placement));
    }

    if active.is_empty() {
        tracing::info!("no animated assets; emitting background still");
        return Ok(CompositeSequence::still(background.clone(), Rational::ONE));
    }

    let duration_sets: Vec<&[Rational]> = active.iter().map(|(a, _)| a.durations()).collect();
    let Timing {
        global,
        timebases,
        events,
        ..
    } = build_timing(&duration_sets, opts)?;

    let mut layers: Vec<Layer<'_>> = active
        .iter()
        .zip(timebases)
        .map(|(&(asset, placement), tb)| Layer::new(asset, placement, tb))
        .collect();

    Ok(synthesize_frames(
        background,
        &mut layers,
        &events,
        global.ticks_per_second,
    ))
}

/// Per-asset entry of a [`TimelinePlan`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AssetPlan {
    /// Placement key of the asset.
    pub placement_id: String,
    /// Frames in one loop.
    pub frame_count: usize,
    /// Ticks in one loop.
    pub period_ticks: u64,
}

/// Summary of the timing stages for a set of assets, without rendering.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimelinePlan {
    /// Shared ticks per second.
    pub global_denominator: u64,
    /// `true` when durations were snapped to keep the tick rate bounded.
    pub snapped: bool,
    /// Composite period after the duration guardrail.
    pub period_ticks: u64,
    /// Composite period before the guardrail (saturating).
    pub full_period_ticks: u64,
    /// Composite period in seconds.
    pub period_secs: f64,
    /// `true` when the guardrail shortened the period.
    pub truncated: bool,
    /// Instants on the timeline, endpoints included.
    pub event_count: usize,
    /// Distinct instants before down-sampling.
    pub raw_event_count: usize,
    /// `true` when the event ceiling thinned the timeline.
    pub downsampled: bool,
    /// Assets that took part, in input order.
    pub assets: Vec<AssetPlan>,
}

/// Run the timing stages only and summarize them.
///
/// Assets without frames are left out. With no assets the plan describes the one-second
/// background still.
pub fn plan_timeline(assets: &[AnimatedAsset], opts: &ComposeOpts) -> LoopcompResult<TimelinePlan> {
    opts.validate()?;
    let active: Vec<&AnimatedAsset> = assets.iter().filter(|a| !a.is_empty()).collect();
    if active.is_empty() {
        return Ok(TimelinePlan {
            global_denominator: 1,
            snapped: false,
            period_ticks: 1,
            full_period_ticks: 1,
            period_secs: 1.0,
            truncated: false,
            event_count: 2,
            raw_event_count: 2,
            downsampled: false,
            assets: Vec::new(),
        });
    }

    let duration_sets: Vec<&[Rational]> = active.iter().map(|a| a.durations()).collect();
    let timing = build_timing(&duration_sets, opts)?;
    let assets = active
        .iter()
        .zip(&timing.timebases)
        .map(|(a, tb)| AssetPlan {
            placement_id: a.placement_id().to_owned(),
            frame_count: a.frame_count(),
            period_ticks: tb.period_ticks(),
        })
        .collect();

    Ok(TimelinePlan {
        global_denominator: timing.global.ticks_per_second,
        snapped: timing.global.snapped,
        period_ticks: timing.clock.period_ticks(),
        full_period_ticks: timing.clock.full_period_ticks(),
        period_secs: timing.clock.period_secs().as_f64(),
        truncated: timing.clock.truncated(),
        event_count: timing.events.len(),
        raw_event_count: timing.events.raw_count(),
        downsampled: timing.events.downsampled(),
        assets,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mod.rs"]
mod tests;
