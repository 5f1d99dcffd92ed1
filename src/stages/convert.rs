use log::warn;
use serde::{Deserialize, Serialize};

use crate::enums::Unit;
use crate::stage::{Process, Recompute};
use crate::volume::VoxelDataset;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertParams {
    pub unit: Option<Unit>,
}

/// Rescales the physical dimensions into another unit.
#[derive(Default)]
pub struct Convert;

impl Process for Convert {
    type Params = ConvertParams;
    type Input = VoxelDataset;
    type Output = VoxelDataset;

    fn recalculate(
        &mut self,
        params: &mut ConvertParams,
        input: &VoxelDataset,
    ) -> Recompute<VoxelDataset> {
        let Some(target) = params.unit.filter(|&unit| unit != input.unit()) else {
            return Recompute::Recomputed(input.clone());
        };

        let factor = input.unit().conversion_factor(target);
        let dimensions = input.dimensions().map(|d| d * factor);
        if dimensions.contains(&0.0) {
            warn!(
                "Converting {} to {target} is not supported, keeping dimensions {:?}",
                input.unit(),
                input.dimensions()
            );
            return Recompute::Recomputed(input.clone());
        }

        Recompute::Recomputed(input.with_dimensions(dimensions).with_unit(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Orientation;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn dataset(unit: Unit) -> VoxelDataset {
        VoxelDataset::new(
            Orientation::Xyz,
            [10.0, 20.0, 40.0],
            unit,
            [1, 1, 1],
            Array3::zeros((1, 1, 1)),
        )
        .unwrap()
    }

    #[test]
    fn unset_or_same_unit_passes_through() {
        let input = dataset(Unit::Millimeter);
        let mut params = ConvertParams::default();
        assert_eq!(Convert.recalculate(&mut params, &input).recomputed().unwrap(), input);

        params.unit = Some(Unit::Millimeter);
        assert_eq!(Convert.recalculate(&mut params, &input).recomputed().unwrap(), input);
    }

    #[test]
    fn millimeters_to_centimeters() {
        let input = dataset(Unit::Millimeter);
        let mut params = ConvertParams {
            unit: Some(Unit::Centimeter),
        };
        let output = Convert.recalculate(&mut params, &input).recomputed().unwrap();
        assert_eq!(output.unit(), Unit::Centimeter);
        for (converted, expected) in output.dimensions().iter().zip([1.0, 2.0, 4.0]) {
            assert_relative_eq!(*converted, expected);
        }
        assert!(output.shares_data(&input));
    }

    #[test]
    fn missing_conversion_keeps_dimensions() {
        let input = dataset(Unit::Inch);
        let mut params = ConvertParams {
            unit: Some(Unit::Millimeter),
        };
        let output = Convert.recalculate(&mut params, &input).recomputed().unwrap();
        assert_eq!(output.dimensions(), input.dimensions());
        assert_eq!(output.unit(), Unit::Inch);
    }
}
