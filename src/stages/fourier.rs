use log::debug;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::enums::{FourierMode, FourierNorm};
use crate::fft;
use crate::stage::{Process, Recompute};
use crate::volume::VoxelDataset;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FourierParams {
    pub transform: bool,
    pub inverse: bool,
    pub mode: FourierMode,
    pub norm: FourierNorm,
}

/// Forward or inverse DFT over the trailing axes. Phase is discarded: the
/// output samples hold the transform magnitude.
#[derive(Default)]
pub struct Fourier;

impl Fourier {
    /// Never transform over more axes than the orientation names.
    fn downgrade(params: &mut FourierParams, axis_count: usize) {
        let downgraded = match (axis_count, params.mode) {
            (1, FourierMode::Two | FourierMode::Three) => FourierMode::One,
            (2, FourierMode::Three) => FourierMode::Two,
            _ => return,
        };
        debug!("{axis_count} axis orientation, fourier mode lowered to {downgraded:?}");
        params.mode = downgraded;
    }
}

impl Process for Fourier {
    type Params = FourierParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut FourierParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        if !params.transform {
            return Recompute::Recomputed(input.clone());
        }

        Self::downgrade(params, input.orientation().axis_count());

        let mut transformed =
            fft::fftn(input.data(), params.mode.axes(), params.inverse, params.norm);
        transformed.par_mapv_inplace(|v| Complex64::new(v.norm(), 0.0));
        Recompute::Recomputed(input.with_data(transformed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Orientation, Unit};
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn dataset(orientation: Orientation, data: Array3<Complex64>) -> VoxelDataset {
        let (d0, d1, d2) = data.dim();
        VoxelDataset::new(orientation, [1.0; 3], Unit::Millimeter, [d0, d1, d2], data).unwrap()
    }

    #[test]
    fn disabled_transform_passes_through() {
        let input = VoxelDataset::from_samples(Array3::zeros((2, 2, 2)));
        let output = Fourier
            .recalculate(&mut FourierParams::default(), &input)
            .recomputed()
            .unwrap();
        assert!(output.shares_data(&input));
    }

    #[test]
    fn output_is_magnitude_only() {
        let data = Array3::from_shape_fn((2, 2, 2), |(i, j, k)| {
            Complex64::new(i as f64, (j + k) as f64)
        });
        let input = dataset(Orientation::Xyz, data);
        let mut params = FourierParams {
            transform: true,
            ..Default::default()
        };
        let output = Fourier.recalculate(&mut params, &input).recomputed().unwrap();
        assert!(output.data().iter().all(|v| v.im == 0.0 && v.re >= 0.0));
        assert_eq!(output.counts(), input.counts());
    }

    #[test]
    fn forward_then_inverse_recovers_magnitude() {
        let mut data = Array3::<Complex64>::zeros((2, 4, 4));
        data[[0, 0, 0]] = Complex64::new(3.0, 0.0);
        let input = dataset(Orientation::Xyz, data);

        for norm in [FourierNorm::Backward, FourierNorm::Orthographic, FourierNorm::Forward] {
            let mut forward = FourierParams {
                transform: true,
                norm,
                ..Default::default()
            };
            let spectrum = Fourier.recalculate(&mut forward, &input).recomputed().unwrap();
            let mut inverse = FourierParams {
                inverse: true,
                ..forward
            };
            let restored = Fourier.recalculate(&mut inverse, &spectrum).recomputed().unwrap();
            for (a, b) in restored.data().iter().zip(input.data().iter()) {
                assert_abs_diff_eq!(a.re, b.norm(), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn mode_follows_orientation_axis_count() {
        let input = dataset(Orientation::Z, Array3::zeros((1, 1, 4)));
        let mut params = FourierParams {
            transform: true,
            mode: FourierMode::Three,
            ..Default::default()
        };
        Fourier.recalculate(&mut params, &input);
        assert_eq!(params.mode, FourierMode::One);

        let input = dataset(Orientation::Xy, Array3::zeros((1, 4, 4)));
        params.mode = FourierMode::Three;
        Fourier.recalculate(&mut params, &input);
        assert_eq!(params.mode, FourierMode::Two);

        // a 2-D mode already fits a two axis orientation
        params.mode = FourierMode::One;
        Fourier.recalculate(&mut params, &input);
        assert_eq!(params.mode, FourierMode::One);
    }
}
