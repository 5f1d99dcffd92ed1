use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Which physical axes map onto the array axes.
///
/// Single-axis and two-axis labels leave the remaining array axes at size 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    X,
    Y,
    Z,
    Xy,
    Xz,
    Yx,
    Yz,
    Zx,
    Zy,
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

pub const ORIENTATIONS: [Orientation; 15] = [
    Orientation::X,
    Orientation::Y,
    Orientation::Z,
    Orientation::Xy,
    Orientation::Xz,
    Orientation::Yx,
    Orientation::Yz,
    Orientation::Zx,
    Orientation::Zy,
    Orientation::Xyz,
    Orientation::Xzy,
    Orientation::Yxz,
    Orientation::Yzx,
    Orientation::Zxy,
    Orientation::Zyx,
];

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::X => "x",
            Orientation::Y => "y",
            Orientation::Z => "z",
            Orientation::Xy => "xy",
            Orientation::Xz => "xz",
            Orientation::Yx => "yx",
            Orientation::Yz => "yz",
            Orientation::Zx => "zx",
            Orientation::Zy => "zy",
            Orientation::Xyz => "xyz",
            Orientation::Xzy => "xzy",
            Orientation::Yxz => "yxz",
            Orientation::Yzx => "yzx",
            Orientation::Zxy => "zxy",
            Orientation::Zyx => "zyx",
        }
    }

    /// Number of physical axes named by the label (1, 2 or 3).
    pub fn axis_count(self) -> usize {
        self.as_str().len()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        ORIENTATIONS
            .into_iter()
            .find(|orientation| orientation.as_str() == label)
            .ok_or_else(|| ParseEnumError::new("orientation", s))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Millimeter,
    Centimeter,
    Meter,
    Kilometer,
    Megameter,
    Inch,
    Foot,
    Mile,
    LightYear,
}

pub const UNITS: [Unit; 9] = [
    Unit::Millimeter,
    Unit::Centimeter,
    Unit::Meter,
    Unit::Kilometer,
    Unit::Megameter,
    Unit::Inch,
    Unit::Foot,
    Unit::Mile,
    Unit::LightYear,
];

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Millimeter => "millimeter",
            Unit::Centimeter => "centimeter",
            Unit::Meter => "meter",
            Unit::Kilometer => "kilometer",
            Unit::Megameter => "megameter",
            Unit::Inch => "inch",
            Unit::Foot => "foot",
            Unit::Mile => "mile",
            Unit::LightYear => "lightyear",
        }
    }

    /// Multiplier taking a length in `self` to a length in `target`.
    ///
    /// Conversions out of inches, miles and light-years are not tabulated
    /// yet and report a factor of `0.0`; callers must treat that as
    /// "unavailable" rather than scale by it.
    pub fn conversion_factor(self, target: Unit) -> f64 {
        use Unit::*;

        if self == target {
            return 1.0;
        }
        match (self, target) {
            (Millimeter, Centimeter) => 1e-1,
            (Millimeter, Meter) => 1e-3,
            (Millimeter, Kilometer) => 1e-6,
            (Millimeter, Megameter) => 1e-9,
            (Millimeter, Inch) => 1.0 / 25.4,
            (Millimeter, Foot) => 1.0 / 304.8,
            (Millimeter, Mile) => 1.0 / 1_609_344.0,
            (Millimeter, LightYear) => 1.057_000_834_024_7e-19,
            (Centimeter, Millimeter) => 1e1,
            (Centimeter, Meter) => 1e-2,
            (Centimeter, Kilometer) => 1e-5,
            (Centimeter, Megameter) => 1e-8,
            (Centimeter, Inch) => 1.0 / 2.54,
            (Centimeter, Foot) => 1.0 / 30.48,
            (Centimeter, Mile) => 1.0 / 160_934.4,
            (Centimeter, LightYear) => 1.057_000_834_024_7e-18,
            (Meter, Millimeter) => 1e3,
            (Meter, Centimeter) => 1e2,
            (Meter, Kilometer) => 1e-3,
            (Meter, Megameter) => 1e-6,
            (Meter, Inch) => 39.3701,
            (Meter, Foot) => 3.28084,
            (Meter, Mile) => 1.0 / 1609.344,
            (Meter, LightYear) => 1.057_000_834_024_7e-16,
            (Kilometer, Millimeter) => 1e6,
            (Kilometer, Centimeter) => 1e5,
            (Kilometer, Meter) => 1e3,
            (Kilometer, Megameter) => 1e-3,
            (Kilometer, Inch) => 39_370.1,
            (Kilometer, Foot) => 3280.84,
            (Kilometer, Mile) => 0.621_371,
            (Kilometer, LightYear) => 1.057_000_834_024_7e-13,
            (Megameter, Millimeter) => 1e9,
            (Megameter, Centimeter) => 1e8,
            (Megameter, Meter) => 1e6,
            (Megameter, Kilometer) => 1e3,
            (Megameter, Inch) => 39_370_078.74,
            (Megameter, Foot) => 3_280_839.895,
            (Megameter, Mile) => 621.371_192_24,
            (Megameter, LightYear) => 1.057_000_834_023_7e-10,
            // TODO: imperial and astronomical source units (inch, foot, mile, light-year).
            _ => 0.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let unit = match name.as_str() {
            "mm" => Unit::Millimeter,
            "cm" => Unit::Centimeter,
            "m" => Unit::Meter,
            "km" => Unit::Kilometer,
            "in" => Unit::Inch,
            "ft" => Unit::Foot,
            "mi" => Unit::Mile,
            "ly" => Unit::LightYear,
            other => UNITS
                .into_iter()
                .find(|unit| unit.as_str() == other || unit.as_str().to_string() + "s" == other)
                .ok_or_else(|| ParseEnumError::new("unit", s))?,
        };
        Ok(unit)
    }
}

/// How many trailing array axes the Fourier stage transforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FourierMode {
    #[serde(rename = "1d")]
    One,
    #[serde(rename = "2d")]
    Two,
    #[default]
    #[serde(rename = "3d")]
    Three,
}

impl FourierMode {
    pub fn axes(self) -> usize {
        match self {
            FourierMode::One => 1,
            FourierMode::Two => 2,
            FourierMode::Three => 3,
        }
    }
}

impl FromStr for FourierMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "1d" => Ok(FourierMode::One),
            "2" | "2d" => Ok(FourierMode::Two),
            "3" | "3d" => Ok(FourierMode::Three),
            _ => Err(ParseEnumError::new("fourier mode", s)),
        }
    }
}

/// Scaling conventions of the discrete Fourier transform pair.
///
/// * `Backward` - forward unscaled, inverse scaled by `1/n`
/// * `Orthographic` - both directions scaled by `1/sqrt(n)`
/// * `Forward` - forward scaled by `1/n`, inverse unscaled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FourierNorm {
    #[default]
    Backward,
    #[serde(rename = "ortho")]
    Orthographic,
    Forward,
}

impl FromStr for FourierNorm {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backward" => Ok(FourierNorm::Backward),
            "ortho" | "orthographic" => Ok(FourierNorm::Orthographic),
            "forward" => Ok(FourierNorm::Forward),
            _ => Err(ParseEnumError::new("fourier normalisation", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolateMode {
    #[default]
    None,
    /// Make every voxel a cube of the smallest current cell size.
    Cube,
    Double,
    Triple,
    Quadruple,
    /// Make the voxels as fine as practical.
    Minimum,
}

impl FromStr for InterpolateMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(InterpolateMode::None),
            "cube" => Ok(InterpolateMode::Cube),
            "double" => Ok(InterpolateMode::Double),
            "triple" => Ok(InterpolateMode::Triple),
            "quadruple" => Ok(InterpolateMode::Quadruple),
            "minimum" => Ok(InterpolateMode::Minimum),
            _ => Err(ParseEnumError::new("interpolation mode", s)),
        }
    }
}

/// Position of a stage in the chain, head first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageId {
    Source,
    PreShift,
    Filter,
    Fourier,
    PostShift,
    Convert,
    Reorient,
    Interpolate,
    Colour,
    Camera,
}

pub const STAGES: [StageId; 10] = [
    StageId::Source,
    StageId::PreShift,
    StageId::Filter,
    StageId::Fourier,
    StageId::PostShift,
    StageId::Convert,
    StageId::Reorient,
    StageId::Interpolate,
    StageId::Colour,
    StageId::Camera,
];

impl StageId {
    /// The stage fed by this one, `None` for the tail.
    pub fn next(self) -> Option<StageId> {
        STAGES.get(self as usize + 1).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            StageId::Source => "source",
            StageId::PreShift => "pre-shift",
            StageId::Filter => "filter",
            StageId::Fourier => "fourier",
            StageId::PostShift => "post-shift",
            StageId::Convert => "convert",
            StageId::Reorient => "reorient",
            StageId::Interpolate => "interpolate",
            StageId::Colour => "colour",
            StageId::Camera => "camera",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
