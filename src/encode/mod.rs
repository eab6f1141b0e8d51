//! Output encoders: exact-delay APNG and quantized-delay GIF.

use std::fmt;
use std::str::FromStr;

use crate::config::ComposeOpts;
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::render::synth::CompositeSequence;

pub(crate) mod apng;
pub(crate) mod gif;
pub(crate) mod optimize;

pub(crate) const MIME_PNG: &str = "image/png";
pub(crate) const MIME_APNG: &str = "image/apng";
pub(crate) const MIME_GIF: &str = "image/gif";

/// Output container selected by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Animated PNG with rational per-frame delays.
    #[default]
    Apng,
    /// GIF with centisecond delays and per-frame palettes.
    Gif,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Apng => "png",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Apng => "apng",
            Self::Gif => "gif",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = LoopcompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apng" | "png" => Ok(Self::Apng),
            "gif" => Ok(Self::Gif),
            other => Err(LoopcompError::validation(format!(
                "unknown output format '{other}' (expected 'apng' or 'gif')"
            ))),
        }
    }
}

/// Encoded output bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedAnimation {
    /// Complete file contents.
    pub bytes: Vec<u8>,
    /// MIME type (`image/apng`, `image/png` for a single-frame APNG request, or `image/gif`).
    pub mime: &'static str,
    /// Frames written.
    pub frame_count: usize,
}

/// Encode a composite sequence in `format`.
pub fn encode_sequence(
    seq: &CompositeSequence,
    format: OutputFormat,
    opts: &ComposeOpts,
) -> LoopcompResult<EncodedAnimation> {
    match format {
        OutputFormat::Apng => apng::encode_apng(seq, opts),
        OutputFormat::Gif => gif::encode_gif(seq, opts),
    }
}

/// Shared canvas size; every frame must match the first and be non-empty.
pub(crate) fn canvas_size(seq: &CompositeSequence) -> LoopcompResult<(u32, u32)> {
    let Some((width, height)) = seq.dimensions() else {
        return Err(LoopcompError::encode("no frames to encode"));
    };
    if width == 0 || height == 0 {
        return Err(LoopcompError::validation("canvas must be non-empty"));
    }
    if let Some(i) = seq
        .frames
        .iter()
        .position(|f| f.image.dimensions() != (width, height))
    {
        return Err(LoopcompError::validation(format!(
            "frame {i} is {:?}, expected {width}x{height}",
            seq.frames[i].image.dimensions()
        )));
    }
    if seq.ticks_per_second == 0 {
        return Err(LoopcompError::validation("ticks_per_second must be > 0"));
    }
    Ok((width, height))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mod.rs"]
mod tests;
