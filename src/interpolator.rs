use ndarray::{Array3, ArrayView3, Zip};
use num_complex::Complex64;

/// Trilinear interpolation over a regular grid.
///
/// Grid points along each axis sit at `linspace(0, dimension, count)`, so
/// a position is given in the dataset's physical units.
pub(crate) struct Interpolator<'a> {
    values: ArrayView3<'a, Complex64>,
    // physical distance between neighbouring grid points, 0 for single-point axes
    steps: [f64; 3],
}

impl<'a> Interpolator<'a> {
    pub(crate) fn new(values: ArrayView3<'a, Complex64>, dimensions: [f64; 3]) -> Self {
        let (d0, d1, d2) = values.dim();
        let counts = [d0, d1, d2];
        let steps = std::array::from_fn(|axis| {
            if counts[axis] > 1 {
                dimensions[axis] / (counts[axis] - 1) as f64
            } else {
                0.0
            }
        });
        Self { values, steps }
    }

    /// Sample the grid at a physical position, clamped to the grid bounds.
    pub(crate) fn sample(&self, position: [f64; 3]) -> Complex64 {
        let (d0, d1, d2) = self.values.dim();
        let counts = [d0, d1, d2];
        let index: [f64; 3] = std::array::from_fn(|axis| {
            let step = self.steps[axis];
            if step > 0.0 {
                (position[axis] / step).clamp(0.0, (counts[axis] - 1) as f64)
            } else {
                0.0
            }
        });
        Self::trilinear_interpolate(&self.values, index)
    }

    /// Resample onto a uniform grid of `counts` points spanning the same
    /// physical extent.
    pub(crate) fn resample(&self, dimensions: [f64; 3], counts: [usize; 3]) -> Array3<Complex64> {
        let spacing: [f64; 3] = std::array::from_fn(|axis| {
            if counts[axis] > 1 {
                dimensions[axis] / (counts[axis] - 1) as f64
            } else {
                0.0
            }
        });
        let mut resampled = Array3::<Complex64>::zeros((counts[0], counts[1], counts[2]));
        Zip::indexed(&mut resampled).par_for_each(|(i, j, k), value| {
            *value = self.sample([
                i as f64 * spacing[0],
                j as f64 * spacing[1],
                k as f64 * spacing[2],
            ]);
        });
        resampled
    }

    #[inline]
    pub(crate) fn trilinear_interpolate(
        volume: &ArrayView3<Complex64>,
        index: [f64; 3],
    ) -> Complex64 {
        let (depth, height, width) = volume.dim();
        let [z, y, x] = index;

        let z0 = z.floor() as usize;
        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let z1 = (z0 + 1).min(depth - 1);
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dz = z - z0 as f64;
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;

        let lerp = |a: Complex64, b: Complex64, t: f64| a * (1.0 - t) + b * t;

        let c00 = lerp(volume[[z0, y0, x0]], volume[[z0, y0, x1]], dx);
        let c01 = lerp(volume[[z0, y1, x0]], volume[[z0, y1, x1]], dx);
        let c10 = lerp(volume[[z1, y0, x0]], volume[[z1, y0, x1]], dx);
        let c11 = lerp(volume[[z1, y1, x0]], volume[[z1, y1, x1]], dx);

        let c0 = lerp(c00, c01, dy);
        let c1 = lerp(c10, c11, dy);

        lerp(c0, c1, dz)
    }
}
