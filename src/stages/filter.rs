use log::warn;
use ndarray::{Array1, Array3, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::stage::{Process, Recompute};
use crate::volume::VoxelDataset;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub low_pass: bool,
    pub high_pass: bool,
    pub band_pass: bool,
    pub low_pass_radius: f64,
    pub high_pass_radius: f64,
    pub band_pass_radius: f64,
    /// Distance from the centre, in voxels, the band-pass peaks at.
    pub band_pass_target: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            low_pass: false,
            high_pass: false,
            band_pass: false,
            low_pass_radius: 1.0,
            high_pass_radius: 1.0,
            band_pass_radius: 1.0,
            band_pass_target: 0.0,
        }
    }
}

/// Separable Gaussian attenuation in voxel-index space.
#[derive(Default)]
pub struct Filter;

impl Process for Filter {
    type Params = FilterParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut FilterParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        if !(params.low_pass || params.high_pass || params.band_pass) {
            return Recompute::Recomputed(input.clone());
        }

        let counts = input.counts();
        let mut filtered = input.data().to_owned();

        if params.low_pass {
            let kernel = gaussian_kernel_3d(counts, params.low_pass_radius, 0.0);
            apply_normalized(&mut filtered, &kernel, "low-pass");
        }
        if params.high_pass {
            let kernel = gaussian_kernel_3d(counts, params.high_pass_radius, 0.0).mapv(|g| 1.0 - g);
            apply_normalized(&mut filtered, &kernel, "high-pass");
        }
        if params.band_pass {
            let kernel =
                gaussian_kernel_3d(counts, params.band_pass_radius, params.band_pass_target);
            apply_normalized(&mut filtered, &kernel, "band-pass");
        }

        Recompute::Recomputed(input.with_data(filtered))
    }
}

/// Gaussian over `linspace(-(n-1)/2, (n-1)/2, n)` with its peak `offset`
/// away from the centre.
pub(crate) fn gaussian_kernel_1d(len: usize, sigma: f64, offset: f64) -> Array1<f64> {
    if len <= 1 {
        return Array1::ones(len);
    }
    let half = 0.5 * (len - 1) as f64;
    Array1::linspace(-half, half, len)
        .mapv(|x| (-0.5 * (x.abs() - offset).powi(2) / (sigma * sigma)).exp())
}

/// Outer product of one 1-D kernel per axis; axes of length 1 contribute 1.
pub(crate) fn gaussian_kernel_3d(counts: [usize; 3], sigma: f64, offset: f64) -> Array3<f64> {
    let [g0, g1, g2] = counts.map(|len| gaussian_kernel_1d(len, sigma, offset));
    Array3::from_shape_fn((counts[0], counts[1], counts[2]), |(i, j, k)| g0[i] * g1[j] * g2[k])
}

fn apply_normalized(data: &mut Array3<Complex64>, kernel: &Array3<f64>, name: &str) {
    let total = kernel.sum();
    if total == 0.0 || !total.is_finite() {
        warn!("{name} kernel sums to {total}; skipping it");
        return;
    }
    Zip::from(data).and(kernel).par_for_each(|value, &weight| {
        *value *= weight / total;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn ones(counts: (usize, usize, usize)) -> VoxelDataset {
        VoxelDataset::from_samples(Array3::from_elem(counts, Complex64::new(1.0, 0.0)))
    }

    #[test]
    fn disabled_filter_passes_through() {
        let input = ones((2, 2, 2));
        let output = Filter
            .recalculate(&mut FilterParams::default(), &input)
            .recomputed()
            .unwrap();
        assert!(output.shares_data(&input));
    }

    #[test]
    fn low_pass_on_a_line_applies_a_unit_sum_kernel() {
        let input = ones((1, 1, 4));
        let mut params = FilterParams {
            low_pass: true,
            low_pass_radius: 1.0,
            ..Default::default()
        };
        let output = Filter.recalculate(&mut params, &input).recomputed().unwrap();

        let weights: Vec<f64> = output.data().iter().map(|v| v.re).collect();
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        // symmetric, peaked at the centre
        assert_relative_eq!(weights[0], weights[3]);
        assert_relative_eq!(weights[1], weights[2]);
        assert!(weights[1] > weights[0]);
        let expected = gaussian_kernel_1d(4, 1.0, 0.0);
        assert_relative_eq!(weights[0], expected[0] / expected.sum(), epsilon = 1e-12);
    }

    #[test]
    fn kernels_degenerate_on_single_voxel_axes() {
        let kernel = gaussian_kernel_3d([1, 3, 1], 2.0, 0.0);
        assert_eq!(kernel.dim(), (1, 3, 1));
        assert_relative_eq!(kernel[[0, 1, 0]], 1.0);
        assert_relative_eq!(kernel[[0, 0, 0]], (-0.125f64).exp());
    }

    #[test]
    fn band_pass_peaks_at_the_target_offset() {
        let kernel = gaussian_kernel_1d(9, 1.0, 2.0);
        assert_relative_eq!(kernel[2], 1.0);
        assert_relative_eq!(kernel[6], 1.0);
        assert!(kernel[4] < kernel[2]);
    }

    #[test]
    fn high_pass_suppresses_the_centre() {
        let input = ones((1, 1, 5));
        let mut params = FilterParams {
            high_pass: true,
            high_pass_radius: 1.0,
            ..Default::default()
        };
        let output = Filter.recalculate(&mut params, &input).recomputed().unwrap();
        assert_abs_diff_eq!(output.data()[[0, 0, 2]].re, 0.0, epsilon = 1e-12);
        assert!(output.data()[[0, 0, 0]].re > 0.0);
    }

    #[test]
    fn zero_sum_kernel_is_skipped() {
        let input = ones((1, 1, 1));
        let mut params = FilterParams {
            high_pass: true,
            ..Default::default()
        };
        let output = Filter.recalculate(&mut params, &input).recomputed().unwrap();
        assert_eq!(output.data(), input.data());
    }
}
