use log::warn;
use serde::{Deserialize, Serialize};

use crate::enums::InterpolateMode;
use crate::interpolator::Interpolator;
use crate::stage::{Process, Recompute};
use crate::volume::VoxelDataset;

// relative tolerance when checking that a quotient is a whole number
const WHOLE_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolateParams {
    pub mode: InterpolateMode,
}

/// Resamples the grid to a new resolution over the same physical extent.
#[derive(Default)]
pub struct Interpolate;

impl Interpolate {
    /// Voxel counts the mode asks for, or `None` when it cannot be met.
    pub(crate) fn target_counts(mode: InterpolateMode, input: &VoxelDataset) -> Option<[usize; 3]> {
        let (dimensions, counts) = (input.dimensions(), input.counts());
        let target = match mode {
            InterpolateMode::None => return Some(counts),
            InterpolateMode::Cube => Self::cube_counts(dimensions, counts, input.cell_size())?,
            InterpolateMode::Double => Self::scaled_counts(counts, 2),
            InterpolateMode::Triple => Self::scaled_counts(counts, 3),
            InterpolateMode::Quadruple => Self::scaled_counts(counts, 4),
            InterpolateMode::Minimum => std::array::from_fn(|axis| {
                if counts[axis] <= 1 {
                    counts[axis]
                } else if dimensions[axis] < 1.0 {
                    (dimensions[axis] * 1000.0).round() as usize
                } else {
                    dimensions[axis].round() as usize
                }
            }),
        };
        if target.contains(&0) {
            warn!("Interpolating {counts:?} with {mode:?} would leave an empty axis");
            return None;
        }
        Some(target)
    }

    fn scaled_counts(counts: [usize; 3], factor: usize) -> [usize; 3] {
        counts.map(|count| if count > 1 { count * factor } else { count })
    }

    fn cube_counts(
        dimensions: [f64; 3],
        counts: [usize; 3],
        cell_size: [f64; 3],
    ) -> Option<[usize; 3]> {
        let cube_size = (0..3)
            .filter(|&axis| counts[axis] > 1)
            .map(|axis| cell_size[axis])
            .fold(f64::INFINITY, f64::min);
        if !cube_size.is_finite() || cube_size <= 0.0 {
            return Some(counts);
        }

        let mut target = counts;
        for axis in (0..3).filter(|&axis| counts[axis] > 1) {
            let quotient = dimensions[axis] / cube_size;
            let whole = quotient.round();
            if (quotient - whole).abs() > WHOLE_TOLERANCE * whole.max(1.0) {
                warn!("Cannot easily cubify {dimensions:?} with cell size {cube_size}");
                return None;
            }
            target[axis] = whole as usize;
        }
        Some(target)
    }
}

impl Process for Interpolate {
    type Params = InterpolateParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut InterpolateParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        if params.mode == InterpolateMode::None {
            return Recompute::Recomputed(input.clone());
        }
        let Some(target) = Self::target_counts(params.mode, input) else {
            return Recompute::Recomputed(input.clone());
        };
        if target == input.counts() {
            return Recompute::Recomputed(input.clone());
        }

        let interpolator = Interpolator::new(input.data().view(), input.dimensions());
        let resampled = interpolator.resample(input.dimensions(), target);
        Recompute::Recomputed(input.with_data(resampled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Orientation, Unit};
    use ndarray::Array3;
    use num_complex::Complex64;
    use rstest::rstest;

    fn dataset(dimensions: [f64; 3], counts: [usize; 3]) -> VoxelDataset {
        let data = Array3::from_shape_fn((counts[0], counts[1], counts[2]), |(i, j, k)| {
            Complex64::new((i + j + k) as f64, 0.0)
        });
        VoxelDataset::new(Orientation::Xyz, dimensions, Unit::Millimeter, counts, data).unwrap()
    }

    #[rstest]
    #[case(InterpolateMode::Double, [4, 4, 4], [8, 8, 8])]
    #[case(InterpolateMode::Double, [1, 4, 4], [1, 8, 8])]
    #[case(InterpolateMode::Triple, [1, 1, 5], [1, 1, 15])]
    #[case(InterpolateMode::Quadruple, [2, 3, 1], [8, 12, 1])]
    fn multiples_leave_single_voxel_axes_alone(
        #[case] mode: InterpolateMode,
        #[case] counts: [usize; 3],
        #[case] expected: [usize; 3],
    ) {
        let input = dataset([1.0; 3], counts);
        let output = Interpolate
            .recalculate(&mut InterpolateParams { mode }, &input)
            .recomputed()
            .unwrap();
        assert_eq!(output.counts(), expected);
        assert_eq!(output.data().dim(), (expected[0], expected[1], expected[2]));
        assert_eq!(output.dimensions(), input.dimensions());
    }

    #[test]
    fn cube_uses_the_smallest_cell() {
        assert_eq!(
            Interpolate::target_counts(InterpolateMode::Cube, &dataset([4.0, 2.0, 8.0], [2, 4, 4])),
            Some([8, 4, 16])
        );
        // single voxel axes do not take part
        assert_eq!(
            Interpolate::target_counts(InterpolateMode::Cube, &dataset([1.0, 3.0, 6.0], [1, 3, 3])),
            Some([1, 3, 6])
        );
    }

    #[test]
    fn cube_refuses_uneven_grids() {
        let input = dataset([1.0, 1.0, 1.25], [1, 3, 2]);
        assert_eq!(Interpolate::target_counts(InterpolateMode::Cube, &input), None);

        let output = Interpolate
            .recalculate(&mut InterpolateParams { mode: InterpolateMode::Cube }, &input)
            .recomputed()
            .unwrap();
        assert!(output.shares_data(&input));
    }

    #[test]
    fn minimum_scales_small_dimensions() {
        assert_eq!(
            Interpolate::target_counts(
                InterpolateMode::Minimum,
                &dataset([1.0, 0.032, 12.4], [1, 8, 8])
            ),
            Some([1, 32, 12])
        );
    }

    #[test]
    fn empty_targets_pass_through() {
        assert_eq!(
            Interpolate::target_counts(
                InterpolateMode::Minimum,
                &dataset([1.0, 0.0001, 4.0], [1, 4, 4])
            ),
            None
        );
        let input = dataset([1.0, 0.0001, 4.0], [1, 4, 4]);
        let output = Interpolate
            .recalculate(&mut InterpolateParams { mode: InterpolateMode::Minimum }, &input)
            .recomputed()
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn resampling_keeps_corner_values() {
        let input = dataset([3.0, 3.0, 3.0], [2, 2, 2]);
        let output = Interpolate
            .recalculate(&mut InterpolateParams { mode: InterpolateMode::Double }, &input)
            .recomputed()
            .unwrap();
        assert_eq!(output.data()[[0, 0, 0]], input.data()[[0, 0, 0]]);
        assert_eq!(output.data()[[3, 3, 3]], input.data()[[1, 1, 1]]);
    }
}
