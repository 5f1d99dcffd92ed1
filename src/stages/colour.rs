use std::path::PathBuf;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{ImageBuffer, ImageError, Rgba};
use log::info;
use serde::{Deserialize, Serialize};

use crate::stage::{Process, Recompute, StageError};
use crate::volume::{COLOUR_LOOKUP_WIDTH, ColourLookup, RenderData, VoxelDataset};

/// Supplies the colour lookup strip, normally backed by the renderer.
pub trait ColourLookupLoader {
    fn load(&mut self) -> Result<ColourLookup, ImageError>;
}

/// Hue sweep from red through violet, generated in memory.
pub struct RainbowGradient;

impl ColourLookupLoader for RainbowGradient {
    fn load(&mut self) -> Result<ColourLookup, ImageError> {
        let texels = ImageBuffer::from_fn(COLOUR_LOOKUP_WIDTH, 1, |x, _| {
            let hue = 300.0 * x as f64 / (COLOUR_LOOKUP_WIDTH - 1) as f64;
            let [r, g, b] = hue_to_rgb(hue);
            Rgba([r, g, b, 255])
        });
        Ok(ColourLookup::new(texels))
    }
}

/// Gradient image on disk, squashed to a single row.
pub struct GradientImage {
    path: PathBuf,
}

impl GradientImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ColourLookupLoader for GradientImage {
    fn load(&mut self) -> Result<ColourLookup, ImageError> {
        let texels = image::open(&self.path)?
            .resize_exact(COLOUR_LOOKUP_WIDTH, 1, FilterType::Triangle)
            .to_rgba8();
        info!("Loaded colour lookup from {}", self.path.display());
        Ok(ColourLookup::new(texels))
    }
}

fn hue_to_rgb(hue: f64) -> [u8; 3] {
    let sector = (hue / 60.0).rem_euclid(6.0);
    let x = 1.0 - (sector % 2.0 - 1.0).abs();
    let (r, g, b) = match sector as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [r, g, b].map(|c: f64| (c * 255.0).round() as u8)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColourParams {
    pub density_scalar: f32,
    pub emission_brightness: f32,
}

impl Default for ColourParams {
    fn default() -> Self {
        Self {
            density_scalar: 0.05,
            emission_brightness: 1.0,
        }
    }
}

/// Bundles processed samples with the render settings.
pub struct Colour {
    loader: Box<dyn ColourLookupLoader>,
    lookup: Option<Arc<ColourLookup>>,
}

impl Colour {
    pub fn new(loader: Box<dyn ColourLookupLoader>) -> Self {
        Self { loader, lookup: None }
    }

    pub fn lookup(&self) -> Option<&Arc<ColourLookup>> {
        self.lookup.as_ref()
    }

    fn lookup_or_load(&mut self) -> Result<Arc<ColourLookup>, StageError> {
        if let Some(lookup) = &self.lookup {
            return Ok(Arc::clone(lookup));
        }
        let lookup = Arc::new(self.loader.load()?);
        self.lookup = Some(Arc::clone(&lookup));
        Ok(lookup)
    }
}

impl Process for Colour {
    type Params = ColourParams;
    type Input = VoxelDataset;
    type Output = RenderData;

    fn recalculate(
        &mut self,
        params: &mut ColourParams,
        input: &VoxelDataset,
    ) -> Recompute<RenderData> {
        self.lookup_or_load()
            .map(|colour_lookup| RenderData {
                colour_lookup,
                density_scalar: params.density_scalar,
                emission_brightness: params.emission_brightness,
                dataset: input.clone(),
            })
            .into()
    }
}
