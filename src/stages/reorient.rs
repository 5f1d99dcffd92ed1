use serde::{Deserialize, Serialize};

use crate::enums::Orientation;
use crate::stage::{Process, Recompute};
use crate::volume::VoxelDataset;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorientParams {
    pub orientation: Option<Orientation>,
}

/// Relabels the axis order. The samples are not permuted; the renderer maps
/// axes according to the label.
#[derive(Default)]
pub struct Reorient;

impl Process for Reorient {
    type Params = ReorientParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut ReorientParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        match params.orientation {
            Some(orientation) if orientation != input.orientation() => {
                Recompute::Recomputed(input.with_orientation(orientation))
            }
            _ => Recompute::Recomputed(input.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn current_orientation_is_a_no_op() {
        let input = VoxelDataset::from_samples(Array3::zeros((2, 2, 2)));
        let mut params = ReorientParams {
            orientation: Some(input.orientation()),
        };
        let output = Reorient.recalculate(&mut params, &input).recomputed().unwrap();
        assert_eq!(output, input);
        assert!(output.shares_data(&input));
    }

    #[test]
    fn relabels_without_touching_samples() {
        let input = VoxelDataset::from_samples(Array3::zeros((2, 3, 4)));
        let mut params = ReorientParams {
            orientation: Some(Orientation::Zyx),
        };
        let output = Reorient.recalculate(&mut params, &input).recomputed().unwrap();
        assert_eq!(output.orientation(), Orientation::Zyx);
        assert_eq!(output.counts(), [2, 3, 4]);
        assert_eq!(output.dimensions(), input.dimensions());
        assert!(output.shares_data(&input));
    }
}
