use std::sync::Arc;

use image::RgbaImage;
use ndarray::Array3;
use num_complex::Complex64;
use thiserror::Error;

use crate::enums::{Orientation, Unit};

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("data shape {shape:?} does not match voxel counts {counts:?}")]
    ShapeMismatch {
        shape: [usize; 3],
        counts: [usize; 3],
    },
}

/// An immutable snapshot of a scan as it flows between stages.
///
/// `dimensions` and `counts` always hold three entries ordered like the
/// array axes, even when the orientation names fewer physical axes; unused
/// axes carry a size of 1 and a count of 1. The samples are shared between
/// snapshots, so building a derived snapshot that keeps the data is cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelDataset {
    orientation: Orientation,
    dimensions: [f64; 3],
    unit: Unit,
    counts: [usize; 3],
    data: Arc<Array3<Complex64>>,
}

impl VoxelDataset {
    pub fn new(
        orientation: Orientation,
        dimensions: [f64; 3],
        unit: Unit,
        counts: [usize; 3],
        data: Array3<Complex64>,
    ) -> Result<Self, VolumeError> {
        let (d0, d1, d2) = data.dim();
        let shape = [d0, d1, d2];
        if shape != counts {
            return Err(VolumeError::ShapeMismatch { shape, counts });
        }
        Ok(Self {
            orientation,
            dimensions,
            unit,
            counts,
            data: Arc::new(data),
        })
    }

    /// Snapshot with default metadata for raw samples: `xyz`, a unit cube
    /// in millimeters and counts taken from the data shape.
    pub fn from_samples(data: Array3<Complex64>) -> Self {
        let (d0, d1, d2) = data.dim();
        Self {
            orientation: Orientation::Xyz,
            dimensions: [1.0; 3],
            unit: Unit::Millimeter,
            counts: [d0, d1, d2],
            data: Arc::new(data),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Physical extent along each array axis.
    pub fn dimensions(&self) -> [f64; 3] {
        self.dimensions
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Voxel count along each array axis (depth, height, width).
    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    pub fn data(&self) -> &Array3<Complex64> {
        &self.data
    }

    /// Physical size of one voxel along each axis.
    pub fn cell_size(&self) -> [f64; 3] {
        std::array::from_fn(|axis| self.dimensions[axis] / self.counts[axis] as f64)
    }

    /// Largest sample magnitude, `0.0` for an all-zero volume.
    pub fn max_magnitude(&self) -> f64 {
        self.data.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    /// True when both snapshots share the very same sample array.
    pub fn shares_data(&self, other: &VoxelDataset) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn with_orientation(&self, orientation: Orientation) -> Self {
        Self {
            orientation,
            ..self.clone()
        }
    }

    pub fn with_dimensions(&self, dimensions: [f64; 3]) -> Self {
        Self {
            dimensions,
            ..self.clone()
        }
    }

    pub fn with_unit(&self, unit: Unit) -> Self {
        Self {
            unit,
            ..self.clone()
        }
    }

    /// Replace the samples; counts follow the new shape.
    pub fn with_data(&self, data: Array3<Complex64>) -> Self {
        let (d0, d1, d2) = data.dim();
        Self {
            counts: [d0, d1, d2],
            data: Arc::new(data),
            ..self.clone()
        }
    }
}

/// Width of the colour lookup strip handed to the renderer.
pub const COLOUR_LOOKUP_WIDTH: u32 = 256;

/// A one-row RGBA gradient the renderer samples by normalised density.
#[derive(Clone, Debug, PartialEq)]
pub struct ColourLookup {
    texels: RgbaImage,
}

impl ColourLookup {
    pub fn new(texels: RgbaImage) -> Self {
        Self { texels }
    }

    pub fn width(&self) -> u32 {
        self.texels.width()
    }

    pub fn texels(&self) -> &RgbaImage {
        &self.texels
    }

    /// Colour at a normalised position in `[0, 1]`.
    pub fn sample(&self, t: f64) -> [u8; 4] {
        let last = self.texels.width().saturating_sub(1);
        let x = (t.clamp(0.0, 1.0) * last as f64).round() as u32;
        self.texels.get_pixel(x, 0).0
    }
}

/// A processed snapshot plus everything the renderer needs to draw it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderData {
    pub colour_lookup: Arc<ColourLookup>,
    pub density_scalar: f32,
    pub emission_brightness: f32,
    pub dataset: VoxelDataset,
}

impl RenderData {
    pub fn orientation(&self) -> Orientation {
        self.dataset.orientation()
    }

    pub fn dimensions(&self) -> [f64; 3] {
        self.dataset.dimensions()
    }

    pub fn unit(&self) -> Unit {
        self.dataset.unit()
    }

    pub fn counts(&self) -> [usize; 3] {
        self.dataset.counts()
    }

    pub fn data(&self) -> &Array3<Complex64> {
        self.dataset.data()
    }

    /// Sample magnitudes scaled into `[0, 1]` in row-major order.
    pub fn normalized_magnitudes(&self) -> Vec<f32> {
        let max = self.dataset.max_magnitude();
        let scale = if max > 0.0 { 1.0 / max } else { 0.0 };
        self.data()
            .iter()
            .map(|v| (v.norm() * scale) as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(counts: [usize; 3]) -> Array3<Complex64> {
        let (d0, d1, d2) = (counts[0], counts[1], counts[2]);
        Array3::from_shape_fn((d0, d1, d2), |(i, j, k)| {
            Complex64::new((i * d1 * d2 + j * d2 + k) as f64, 0.0)
        })
    }

    #[test]
    fn new_rejects_counts_that_disagree_with_the_shape() {
        let result = VoxelDataset::new(
            Orientation::Xyz,
            [1.0; 3],
            Unit::Millimeter,
            [2, 2, 2],
            ramp([1, 2, 2]),
        );
        assert!(matches!(result, Err(VolumeError::ShapeMismatch { .. })));
    }

    #[test]
    fn derived_snapshots_keep_untouched_fields() {
        let dataset = VoxelDataset::from_samples(ramp([1, 2, 3]));
        let relabelled = dataset.with_orientation(Orientation::Zyx);
        assert_eq!(relabelled.orientation(), Orientation::Zyx);
        assert_eq!(relabelled.counts(), [1, 2, 3]);
        assert!(relabelled.shares_data(&dataset));
        assert_eq!(dataset.orientation(), Orientation::Xyz);

        let resampled = dataset.with_data(ramp([2, 4, 6]));
        assert_eq!(resampled.counts(), [2, 4, 6]);
        assert_eq!(resampled.dimensions(), dataset.dimensions());
        assert!(!resampled.shares_data(&dataset));
    }

    #[test]
    fn normalized_magnitudes_peak_at_one() {
        let lookup = Arc::new(ColourLookup::new(RgbaImage::new(COLOUR_LOOKUP_WIDTH, 1)));
        let render = RenderData {
            colour_lookup: lookup,
            density_scalar: 0.05,
            emission_brightness: 1.0,
            dataset: VoxelDataset::from_samples(ramp([1, 1, 5])),
        };
        assert_eq!(render.normalized_magnitudes(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
