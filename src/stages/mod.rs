//! The processing steps of the chain, head first.

mod camera;
mod colour;
mod convert;
mod filter;
mod fourier;
mod interpolate;
mod reorient;
mod shift;
mod source;

pub use camera::Camera;
pub use colour::{Colour, ColourLookupLoader, ColourParams, GradientImage, RainbowGradient};
pub use convert::{Convert, ConvertParams};
pub use filter::{Filter, FilterParams};
pub use fourier::{Fourier, FourierParams};
pub use interpolate::{Interpolate, InterpolateParams};
pub use reorient::{Reorient, ReorientParams};
pub use shift::{PostShift, PostShiftParams, PreShift, PreShiftParams};
#[cfg(feature = "dialog")]
pub use source::DialogPicker;
pub use source::{DATA_FILE_REQUEST, FilePicker, NoPicker, PickRequest, Source, SourceParams};
