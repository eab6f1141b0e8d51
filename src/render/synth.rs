use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::assets::source::AnimatedAsset;
use crate::foundation::core::{PlacementRect, Rational};
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::render::composite::blit_over;
use crate::timeline::events::EventTimeline;
use crate::timeline::timebase::AssetTimebase;

/// One emitted output image and how long it stays on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeFrame {
    /// Full-canvas straight-alpha RGBA8 image.
    pub image: RgbaImage,
    /// Display time in ticks of the owning sequence's clock.
    pub duration_ticks: u64,
}

/// Ordered composite frames on one tick clock.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeSequence {
    /// Frames in display order; no two neighbours are pixel-identical once merged.
    pub frames: Vec<CompositeFrame>,
    /// Ticks per second for every `duration_ticks`.
    pub ticks_per_second: u64,
}

impl CompositeSequence {
    /// A single still frame shown for `duration`.
    pub fn still(image: RgbaImage, duration: Rational) -> Self {
        Self {
            frames: vec![CompositeFrame {
                image,
                duration_ticks: duration.num().max(1),
            }],
            ticks_per_second: duration.den(),
        }
    }

    /// Canvas size, taken from the first frame.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.image.dimensions())
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Exact display time of frame `index` in seconds.
    pub fn duration_secs(&self, index: usize) -> LoopcompResult<Rational> {
        let frame = self.frames.get(index).ok_or_else(|| {
            LoopcompError::validation(format!("frame index {index} out of range"))
        })?;
        Rational::new(frame.duration_ticks, self.ticks_per_second)
    }

    /// Sum of all frame durations in ticks, saturating.
    pub fn total_ticks(&self) -> u64 {
        self.frames
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.duration_ticks))
    }

    /// Exact total display time in seconds.
    pub fn total_secs(&self) -> LoopcompResult<Rational> {
        Rational::new(self.total_ticks(), self.ticks_per_second)
    }

    /// Fold every frame that is pixel-identical to its predecessor into that predecessor.
    pub fn merge_identical(self) -> Self {
        let mut frames: Vec<CompositeFrame> = Vec::with_capacity(self.frames.len());
        for frame in self.frames {
            push_or_extend(&mut frames, frame.image, frame.duration_ticks);
        }
        Self {
            frames,
            ticks_per_second: self.ticks_per_second,
        }
    }
}

/// An animated asset bound to its placement and its ticks on the shared clock.
pub(crate) struct Layer<'a> {
    asset: &'a AnimatedAsset,
    placement: PlacementRect,
    timebase: AssetTimebase,
    fitted: Vec<Option<RgbaImage>>,
}

impl<'a> Layer<'a> {
    pub(crate) fn new(
        asset: &'a AnimatedAsset,
        placement: PlacementRect,
        timebase: AssetTimebase,
    ) -> Self {
        Self {
            asset,
            placement,
            timebase,
            fitted: vec![None; asset.frame_count()],
        }
    }

    /// Frame active at `tick`, resized to the placement box on first use.
    fn frame_at(&mut self, tick: u64) -> &RgbaImage {
        let asset: &'a AnimatedAsset = self.asset;
        let idx = self.timebase.frame_index_at(tick);
        let frame = &asset.frames()[idx];
        let (w, h) = (self.placement.width, self.placement.height);
        if frame.dimensions() == (w, h) {
            return frame;
        }
        self.fitted[idx].get_or_insert_with(|| imageops::resize(frame, w, h, FilterType::Lanczos3))
    }

    fn paint(&mut self, canvas: &mut RgbaImage, tick: u64) {
        if self.placement.is_empty() || self.asset.is_empty() {
            return;
        }
        let (x, y) = (self.placement.x, self.placement.y);
        let frame = self.frame_at(tick);
        blit_over(canvas, frame, x, y);
    }
}

/// Render one frame per timeline interval and merge pixel-identical neighbours.
///
/// Each interval `(t0, t1)` shows, for every layer, the frame active at `t0`, and lasts
/// `t1 - t0` ticks. An empty result falls back to the background for one second.
#[tracing::instrument(skip_all, fields(layers = layers.len(), instants = timeline.len()))]
pub(crate) fn synthesize_frames(
    background: &RgbaImage,
    layers: &mut [Layer<'_>],
    timeline: &EventTimeline,
    ticks_per_second: u64,
) -> CompositeSequence {
    let mut frames: Vec<CompositeFrame> = Vec::new();
    let mut rendered = 0usize;
    for (t0, t1) in timeline.intervals() {
        let mut canvas = background.clone();
        for layer in layers.iter_mut() {
            layer.paint(&mut canvas, t0);
        }
        push_or_extend(&mut frames, canvas, t1 - t0);
        rendered += 1;
    }

    if frames.is_empty() {
        tracing::warn!("no composite frames produced; emitting background still");
        return CompositeSequence::still(background.clone(), Rational::ONE);
    }

    tracing::debug!(rendered, emitted = frames.len(), "frames synthesized");
    CompositeSequence {
        frames,
        ticks_per_second,
    }
}

fn push_or_extend(frames: &mut Vec<CompositeFrame>, image: RgbaImage, duration_ticks: u64) {
    match frames.last_mut() {
        Some(prev) if prev.image == image => {
            prev.duration_ticks = prev.duration_ticks.saturating_add(duration_ticks);
        }
        _ => frames.push(CompositeFrame {
            image,
            duration_ticks,
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/synth.rs"]
mod tests;
