use serde::{Deserialize, Serialize};

use crate::fft;
use crate::stage::{Process, Recompute};
use crate::volume::VoxelDataset;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreShiftParams {
    /// Circular offset along each array axis; negative values roll backwards.
    pub shifts: [i64; 3],
}

/// Rolls the samples before the Fourier transform.
#[derive(Default)]
pub struct PreShift;

impl Process for PreShift {
    type Params = PreShiftParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut PreShiftParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        if params.shifts.iter().all(|&shift| shift == 0) {
            return Recompute::Recomputed(input.clone());
        }
        Recompute::Recomputed(input.with_data(fft::roll(input.data(), params.shifts)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostShiftParams {
    /// Axes to re-centre.
    pub axes: [bool; 3],
    /// Undo a centering instead of applying one.
    pub inverse: bool,
}

/// Zero-frequency centering after the Fourier transform.
#[derive(Default)]
pub struct PostShift;

impl Process for PostShift {
    type Params = PostShiftParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut PostShiftParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        if !params.axes.iter().any(|&axis| axis) {
            return Recompute::Recomputed(input.clone());
        }
        let shifted = if params.inverse {
            fft::ifftshift(input.data(), params.axes)
        } else {
            fft::fftshift(input.data(), params.axes)
        };
        Recompute::Recomputed(input.with_data(shifted))
    }
}
