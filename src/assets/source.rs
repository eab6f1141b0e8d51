use image::RgbaImage;

use crate::foundation::core::Rational;
use crate::foundation::error::{LoopcompError, LoopcompResult};

/// Decoded source image, resolved once at ingestion.
#[derive(Clone, Debug)]
pub enum SourceImage {
    /// Single still image.
    Static(RgbaImage),
    /// Two or more frames with exact per-frame durations in seconds.
    Animated {
        /// Full-canvas RGBA8 frames in display order.
        frames: Vec<RgbaImage>,
        /// One duration per frame.
        durations: Vec<Rational>,
    },
}

impl SourceImage {
    /// Number of frames (`1` for still images).
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Static(_) => 1,
            Self::Animated { frames, .. } => frames.len(),
        }
    }

    /// Return `true` for multi-frame sources.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Animated { .. })
    }
}

/// One animated overlay ready for compositing.
///
/// Frames are expected to be sized to the display box and masked to the display shape already.
/// An asset without frames is legal and is skipped by the compositor.
#[derive(Clone, Debug)]
pub struct AnimatedAsset {
    placement_id: String,
    frames: Vec<RgbaImage>,
    durations: Vec<Rational>,
}

impl AnimatedAsset {
    /// Create an asset, checking that every frame has a duration and a non-empty size.
    pub fn new(
        placement_id: impl Into<String>,
        frames: Vec<RgbaImage>,
        durations: Vec<Rational>,
    ) -> LoopcompResult<Self> {
        let placement_id = placement_id.into();
        if frames.len() != durations.len() {
            return Err(LoopcompError::validation(format!(
                "asset '{placement_id}' has {} frames but {} durations",
                frames.len(),
                durations.len()
            )));
        }
        if let Some(i) = frames.iter().position(|f| f.width() == 0 || f.height() == 0) {
            return Err(LoopcompError::validation(format!(
                "asset '{placement_id}' frame {i} has zero size"
            )));
        }
        Ok(Self {
            placement_id,
            frames,
            durations,
        })
    }

    /// Key correlating this asset with a placement rectangle.
    pub fn placement_id(&self) -> &str {
        &self.placement_id
    }

    /// Frames in display order.
    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    /// Per-frame durations in seconds.
    pub fn durations(&self) -> &[Rational] {
        &self.durations
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Size of the first frame, if any.
    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.dimensions())
    }
}

/// Result of preparing one source for a placement.
#[derive(Clone, Debug)]
pub enum PreparedSource {
    /// Still overlay, painted into the background before timeline work.
    Static {
        /// Placement key.
        placement_id: String,
        /// Sized and masked image.
        image: RgbaImage,
    },
    /// Animated overlay handled by the timeline engine.
    Animated(AnimatedAsset),
}

impl PreparedSource {
    /// Placement key of either variant.
    pub fn placement_id(&self) -> &str {
        match self {
            Self::Static { placement_id, .. } => placement_id,
            Self::Animated(asset) => asset.placement_id(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
