use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::assets::decode::decode_source;
use crate::assets::mask::MaskShape;
use crate::assets::prepare::prepare_source;
use crate::assets::source::{AnimatedAsset, PreparedSource};
use crate::config::PrepareOpts;
use crate::foundation::core::PlacementRect;
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::render::composite::blit_over;

/// JSON description of what goes where on the background.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutManifest {
    /// Overlays in paint order.
    pub items: Vec<LayoutItem>,
}

/// One overlay image and its box.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutItem {
    /// Placement key.
    pub id: String,
    /// Source file, relative to the manifest directory unless absolute.
    pub src: PathBuf,
    /// Left edge on the background.
    pub x: i32,
    /// Top edge on the background.
    pub y: i32,
    /// Box width; defaults to the prepared display width.
    #[serde(default)]
    pub w: Option<u32>,
    /// Box height; defaults to the prepared display height.
    #[serde(default)]
    pub h: Option<u32>,
    /// Display shape.
    #[serde(default)]
    pub shape: ItemShape,
    /// Corner radius for `rounded`; defaults to the configured border radius.
    #[serde(default)]
    pub radius: Option<f64>,
}

/// Shape names accepted in a layout manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemShape {
    /// Rounded rectangle.
    #[default]
    Rounded,
    /// Plain rectangle.
    Rect,
    /// Inscribed ellipse.
    Ellipse,
}

impl LayoutItem {
    fn mask_shape(&self, opts: &PrepareOpts) -> MaskShape {
        match self.shape {
            ItemShape::Rect => MaskShape::Rect,
            ItemShape::Ellipse => MaskShape::Ellipse,
            ItemShape::Rounded => match self.radius {
                Some(radius) => MaskShape::RoundedRect { radius },
                None => opts.default_shape(),
            },
        }
    }
}

impl LayoutManifest {
    /// Parse a manifest from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> LoopcompResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open layout manifest '{}'", path.display()))?;
        let manifest: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            LoopcompError::serde(format!("parse layout manifest '{}': {e}", path.display()))
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject duplicate ids and empty boxes.
    pub fn validate(&self) -> LoopcompResult<()> {
        let mut seen = std::collections::BTreeSet::new();
        for item in &self.items {
            if item.id.is_empty() {
                return Err(LoopcompError::validation("layout item id must be non-empty"));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(LoopcompError::validation(format!(
                    "duplicate layout item id '{}'",
                    item.id
                )));
            }
            if item.w == Some(0) || item.h == Some(0) {
                return Err(LoopcompError::validation(format!(
                    "layout item '{}' has an empty box",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// Decode and prepare every item's source, reading files relative to `root`.
    ///
    /// Items whose source cannot be read, decoded or prepared are logged and left out. Invalid
    /// `opts` fail the whole load.
    #[tracing::instrument(skip_all, fields(items = self.items.len()))]
    pub fn load(&self, root: &Path, opts: &PrepareOpts) -> LoopcompResult<LoadedLayout> {
        opts.validate()?;
        let mut loaded = LoadedLayout::default();
        for item in &self.items {
            let prepared = match load_item(item, root, opts) {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::warn!(id = %item.id, error = %e, "layout item skipped");
                    continue;
                }
            };

            let (w, h) = match &prepared {
                PreparedSource::Static { image, .. } => image.dimensions(),
                PreparedSource::Animated(asset) => asset.display_size().unwrap_or((1, 1)),
            };
            let rect = PlacementRect::new(item.x, item.y, item.w.unwrap_or(w), item.h.unwrap_or(h));

            match prepared {
                PreparedSource::Static { image, .. } => loaded.statics.push((rect, image)),
                PreparedSource::Animated(asset) => {
                    loaded.placements.insert(item.id.clone(), rect);
                    loaded.assets.push(asset);
                }
            }
        }
        tracing::debug!(
            statics = loaded.statics.len(),
            animated = loaded.assets.len(),
            "layout loaded"
        );
        Ok(loaded)
    }
}

fn load_item(
    item: &LayoutItem,
    root: &Path,
    opts: &PrepareOpts,
) -> LoopcompResult<PreparedSource> {
    let path = if item.src.is_absolute() {
        item.src.clone()
    } else {
        root.join(&item.src)
    };
    let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
    let source = decode_source(&bytes, opts)?;
    prepare_source(&item.id, source, item.mask_shape(opts), opts)
}

/// Prepared layout contents, split by how they are composited.
#[derive(Clone, Debug, Default)]
pub struct LoadedLayout {
    /// Still overlays with their boxes, in paint order.
    pub statics: Vec<(PlacementRect, RgbaImage)>,
    /// Animated overlays for the timeline engine.
    pub assets: Vec<AnimatedAsset>,
    /// Boxes of the animated overlays by id.
    pub placements: BTreeMap<String, PlacementRect>,
}

impl LoadedLayout {
    /// `background` with every still overlay painted in.
    ///
    /// A still whose size differs from its box is resized to fit the box first.
    pub fn paint_statics(&self, background: &RgbaImage) -> RgbaImage {
        let mut out = background.clone();
        for (rect, image) in &self.statics {
            if rect.is_empty() {
                continue;
            }
            if image.dimensions() == (rect.width, rect.height) {
                blit_over(&mut out, image, rect.x, rect.y);
            } else {
                let fitted = imageops::resize(image, rect.width, rect.height, FilterType::Lanczos3);
                blit_over(&mut out, &fitted, rect.x, rect.y);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../tests/unit/layout.rs"]
mod tests;
