//! Discrete Fourier transforms and circular shifts over 3-D sample arrays.
//!
//! Conventions follow numpy: `fftn`/`ifftn` over the trailing axes with the
//! `backward`/`ortho`/`forward` normalisations, `roll` for circular shifts
//! and `fftshift`/`ifftshift` for zero-frequency centering.

use ndarray::{Array3, Axis, Zip};
use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

use crate::enums::FourierNorm;

/// N-dimensional DFT over the last `axes` array axes (1 to 3).
pub fn fftn(
    data: &Array3<Complex64>,
    axes: usize,
    inverse: bool,
    norm: FourierNorm,
) -> Array3<Complex64> {
    let mut transformed = data.to_owned();
    let direction = if inverse {
        FftDirection::Inverse
    } else {
        FftDirection::Forward
    };
    let mut planner = FftPlanner::<f64>::new();
    let first = 3 - axes.clamp(1, 3);

    let mut points = 1;
    for axis in first..3 {
        let len = transformed.len_of(Axis(axis));
        points *= len;
        if len < 2 {
            continue;
        }
        let fft = planner.plan_fft(len, direction);
        Zip::from(transformed.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
            let mut buffer = lane.to_vec();
            fft.process(&mut buffer);
            for (dst, src) in lane.iter_mut().zip(buffer) {
                *dst = src;
            }
        });
    }

    let scale = match (norm, inverse) {
        (FourierNorm::Backward, false) | (FourierNorm::Forward, true) => 1.0,
        (FourierNorm::Backward, true) | (FourierNorm::Forward, false) => 1.0 / points as f64,
        (FourierNorm::Orthographic, _) => 1.0 / (points as f64).sqrt(),
    };
    if scale != 1.0 {
        transformed.par_mapv_inplace(|v| v * scale);
    }
    transformed
}

/// Circularly rotate the array by `shifts` along each axis; elements pushed
/// past the end wrap around to the front.
pub fn roll(data: &Array3<Complex64>, shifts: [i64; 3]) -> Array3<Complex64> {
    let (d0, d1, d2) = data.dim();
    let dims = [d0, d1, d2];
    let offsets: [usize; 3] = std::array::from_fn(|axis| {
        let len = dims[axis] as i64;
        if len == 0 {
            0
        } else {
            shifts[axis].rem_euclid(len) as usize
        }
    });
    if offsets == [0, 0, 0] {
        return data.to_owned();
    }
    Array3::from_shape_fn((d0, d1, d2), |(i, j, k)| {
        data[[
            (i + d0 - offsets[0]) % d0,
            (j + d1 - offsets[1]) % d1,
            (k + d2 - offsets[2]) % d2,
        ]]
    })
}

/// Move the zero-frequency sample to the centre of every flagged axis.
pub fn fftshift(data: &Array3<Complex64>, axes: [bool; 3]) -> Array3<Complex64> {
    let (d0, d1, d2) = data.dim();
    let dims = [d0, d1, d2];
    roll(data, std::array::from_fn(|axis| half_shift(dims[axis], axes[axis])))
}

/// Undo [`fftshift`], also for odd lengths.
pub fn ifftshift(data: &Array3<Complex64>, axes: [bool; 3]) -> Array3<Complex64> {
    let (d0, d1, d2) = data.dim();
    let dims = [d0, d1, d2];
    roll(data, std::array::from_fn(|axis| -half_shift(dims[axis], axes[axis])))
}

fn half_shift(len: usize, enabled: bool) -> i64 {
    if enabled { (len / 2) as i64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn sample(dims: (usize, usize, usize)) -> Array3<Complex64> {
        Array3::from_shape_fn(dims, |(i, j, k)| {
            Complex64::new((i * 7 + j * 3 + k) as f64 % 5.0, (i + 2 * k) as f64 - j as f64)
        })
    }

    fn assert_close(a: &Array3<Complex64>, b: &Array3<Complex64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x.re, y.re, epsilon = 1e-9);
            assert_abs_diff_eq!(x.im, y.im, epsilon = 1e-9);
        }
    }

    #[rstest]
    fn forward_then_inverse_is_identity(
        #[values(1, 2, 3)] axes: usize,
        #[values(FourierNorm::Backward, FourierNorm::Orthographic, FourierNorm::Forward)]
        norm: FourierNorm,
    ) {
        let data = sample((3, 4, 5));
        let spectrum = fftn(&data, axes, false, norm);
        let restored = fftn(&spectrum, axes, true, norm);
        assert_close(&restored, &data);
    }

    #[test]
    fn delta_transforms_to_a_constant() {
        let mut data = Array3::<Complex64>::zeros((2, 2, 4));
        data[[0, 0, 0]] = Complex64::new(1.0, 0.0);
        let spectrum = fftn(&data, 3, false, FourierNorm::Backward);
        for value in spectrum.iter() {
            assert_abs_diff_eq!(value.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(value.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn one_dimensional_mode_only_touches_the_last_axis() {
        let data = Array3::from_elem((2, 2, 4), Complex64::new(1.0, 0.0));
        let spectrum = fftn(&data, 1, false, FourierNorm::Backward);
        for lane in spectrum.lanes(Axis(2)) {
            assert_abs_diff_eq!(lane[0].re, 4.0, epsilon = 1e-12);
            assert_abs_diff_eq!(lane[1].norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn orthographic_norm_preserves_energy() {
        let data = sample((2, 3, 4));
        let spectrum = fftn(&data, 3, false, FourierNorm::Orthographic);
        let energy = |a: &Array3<Complex64>| a.iter().map(|v| v.norm_sqr()).sum::<f64>();
        assert_abs_diff_eq!(energy(&spectrum), energy(&data), epsilon = 1e-9);
    }

    #[test]
    fn roll_wraps_like_numpy() {
        let data = Array3::from_shape_fn((1, 1, 5), |(_, _, k)| Complex64::new(k as f64, 0.0));
        let rolled = roll(&data, [0, 0, 2]);
        let values: Vec<f64> = rolled.iter().map(|v| v.re).collect();
        assert_eq!(values, vec![3.0, 4.0, 0.0, 1.0, 2.0]);

        let back = roll(&data, [0, 0, -7]);
        let values: Vec<f64> = back.iter().map(|v| v.re).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 0.0, 1.0]);
    }

    #[test]
    fn fftshift_centres_zero_frequency() {
        let data =
            Array3::from_shape_fn((1, 4, 5), |(_, j, k)| Complex64::new((j * 10 + k) as f64, 0.0));
        let shifted = fftshift(&data, [false, true, true]);
        assert_eq!(shifted[[0, 2, 2]], data[[0, 0, 0]]);
        assert_close(&ifftshift(&shifted, [false, true, true]), &data);

        let untouched = fftshift(&data, [false, false, false]);
        assert_eq!(untouched, data);
    }
}
