use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::foundation::error::{LoopcompError, LoopcompResult};

/// Guardrails and encoder policy for one compositing call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeOpts {
    /// Upper bound on distinct timeline instants before down-sampling.
    pub max_events: usize,
    /// Upper bound on the composite period in seconds before truncation.
    pub max_composite_secs: f64,
    /// Bound on per-frame duration denominators (also the APNG delay denominator bound).
    pub max_denominator: u64,
    /// Bound on the shared tick denominator; larger values snap durations to `1/max_denominator`.
    pub max_tick_denominator: u64,
    /// Acceptable APNG delay error before falling back to millisecond delays.
    pub delay_tolerance_ms: f64,
    /// Floor applied to GIF delays before grid rounding.
    pub gif_min_delay_ms: u32,
    /// GIF delay rounding granularity.
    pub gif_grid_ms: u32,
    /// Number of palette entries for GIF frames (2..=256).
    pub palette_size: usize,
    /// Attempt the optional `gifsicle` post-pass for GIF output.
    pub use_external_optimizer: bool,
    /// Wall-clock bound for the external optimizer.
    pub optimizer_timeout_secs: u64,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            max_events: 5000,
            max_composite_secs: 60.0,
            max_denominator: 1000,
            max_tick_denominator: 65535,
            delay_tolerance_ms: 0.5,
            gif_min_delay_ms: 20,
            gif_grid_ms: 10,
            palette_size: 256,
            use_external_optimizer: true,
            optimizer_timeout_secs: 30,
        }
    }
}

impl ComposeOpts {
    /// Defaults overridden by any recognized environment variables.
    pub fn from_env() -> LoopcompResult<Self> {
        let mut opts = Self::default();
        opts.apply_env()?;
        Ok(opts)
    }

    /// Parse options from a JSON file; missing fields keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> LoopcompResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LoopcompError::validation(format!("open options JSON '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            LoopcompError::serde(format!("parse options JSON '{}': {e}", path.display()))
        })
    }

    /// Override fields from environment variables that are set.
    pub fn apply_env(&mut self) -> LoopcompResult<()> {
        override_from_env("TIMELINE_MAX_EVENTS", &mut self.max_events)?;
        override_from_env("TIMELINE_MAX_SECONDS", &mut self.max_composite_secs)?;
        override_from_env("APNG_MAX_DEN", &mut self.max_denominator)?;
        override_from_env("TIMELINE_MAX_TICK_DEN", &mut self.max_tick_denominator)?;
        override_from_env("APNG_DELAY_TOL_MS", &mut self.delay_tolerance_ms)?;
        override_from_env("GIF_MIN_DELAY_MS", &mut self.gif_min_delay_ms)?;
        override_from_env("GIF_ROUND_TO_MS", &mut self.gif_grid_ms)?;
        override_from_env("GIF_COLORS", &mut self.palette_size)?;
        override_flag_from_env("USE_GIFSICLE", &mut self.use_external_optimizer)?;
        override_from_env("GIFSICLE_TIMEOUT_SEC", &mut self.optimizer_timeout_secs)?;
        Ok(())
    }

    /// Reject option values the engine cannot honor.
    pub fn validate(&self) -> LoopcompResult<()> {
        if self.max_events < 2 {
            return Err(LoopcompError::validation("max_events must be >= 2"));
        }
        if !self.max_composite_secs.is_finite() || self.max_composite_secs <= 0.0 {
            return Err(LoopcompError::validation(
                "max_composite_secs must be finite and > 0",
            ));
        }
        if self.max_denominator == 0 {
            return Err(LoopcompError::validation("max_denominator must be > 0"));
        }
        if self.max_tick_denominator < self.max_denominator {
            return Err(LoopcompError::validation(
                "max_tick_denominator must be >= max_denominator",
            ));
        }
        if !self.delay_tolerance_ms.is_finite() || self.delay_tolerance_ms < 0.0 {
            return Err(LoopcompError::validation(
                "delay_tolerance_ms must be finite and >= 0",
            ));
        }
        if self.gif_grid_ms == 0 {
            return Err(LoopcompError::validation("gif_grid_ms must be > 0"));
        }
        if !(2..=256).contains(&self.palette_size) {
            return Err(LoopcompError::validation(
                "palette_size must be within 2..=256",
            ));
        }
        Ok(())
    }

    /// External optimizer settings derived from these options.
    pub fn optimizer(&self) -> OptimizerOpts {
        OptimizerOpts {
            enabled: self.use_external_optimizer,
            timeout: Duration::from_secs(self.optimizer_timeout_secs),
            ..OptimizerOpts::default()
        }
    }
}

/// Settings for the optional lossless GIF post-pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizerOpts {
    /// Run the optimizer at all.
    pub enabled: bool,
    /// Program looked up on `PATH`.
    pub program: String,
    /// Arguments; input is piped on stdin and the result read from stdout.
    pub args: Vec<String>,
    /// Kill the child and keep the input bytes after this long.
    pub timeout: Duration,
}

impl Default for OptimizerOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "gifsicle".to_owned(),
            args: vec!["-O3".to_owned()],
            timeout: Duration::from_secs(30),
        }
    }
}

/// Display-box and timing normalization applied when ingesting source images.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepareOpts {
    /// Maximum rendered width; larger sources are scaled down uniformly.
    pub max_render_width: u32,
    /// Maximum rendered height; larger sources are scaled down uniformly.
    pub max_render_height: u32,
    /// Corner radius used for the default rounded-rectangle mask.
    pub border_radius_px: u32,
    /// Delays shorter than this, zero included, are raised to it.
    pub min_frame_delay_ms: u64,
    /// Bound on per-frame duration denominators.
    pub max_denominator: u64,
}

impl Default for PrepareOpts {
    fn default() -> Self {
        Self {
            max_render_width: 500,
            max_render_height: 500,
            border_radius_px: 15,
            min_frame_delay_ms: 10,
            max_denominator: 1000,
        }
    }
}

impl PrepareOpts {
    /// Defaults overridden by any recognized environment variables.
    pub fn from_env() -> LoopcompResult<Self> {
        let mut opts = Self::default();
        override_from_env("MAX_IMAGE_RENDER_W", &mut opts.max_render_width)?;
        override_from_env("MAX_IMAGE_RENDER_H", &mut opts.max_render_height)?;
        override_from_env("IMAGE_BORDER_RADIUS_PX", &mut opts.border_radius_px)?;
        override_from_env("APNG_MAX_DEN", &mut opts.max_denominator)?;
        Ok(opts)
    }

    /// Reject option values ingestion cannot honor.
    pub fn validate(&self) -> LoopcompResult<()> {
        if self.max_render_width == 0 || self.max_render_height == 0 {
            return Err(LoopcompError::validation(
                "max render width/height must be > 0",
            ));
        }
        if self.min_frame_delay_ms == 0 {
            return Err(LoopcompError::validation("min_frame_delay_ms must be > 0"));
        }
        if self.max_denominator == 0 {
            return Err(LoopcompError::validation("max_denominator must be > 0"));
        }
        Ok(())
    }
}

fn override_from_env<T: FromStr>(name: &str, slot: &mut T) -> LoopcompResult<()>
where
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(());
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    *slot = raw
        .parse()
        .map_err(|e| LoopcompError::validation(format!("invalid {name}='{raw}': {e}")))?;
    Ok(())
}

fn override_flag_from_env(name: &str, slot: &mut bool) -> LoopcompResult<()> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(());
    };
    *slot = parse_flag(&raw)
        .ok_or_else(|| LoopcompError::validation(format!("invalid {name}='{raw}'")))?;
    Ok(())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
