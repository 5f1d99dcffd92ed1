//! # MRI-pipeline library
//!
//! This crate serves a reactive processing pipeline for volumetric MRI scans
//! recorded by Prospa.
//!
//! A scan is read from its binary data file and, if present, its `.par`
//! parameter file into an immutable [`VoxelDataset`]. The dataset is then
//! pushed through a fixed chain of stages:
//!  - Source
//!  - Pre-shift (circular roll)
//!  - Filter (Gaussian low/high/band-pass)
//!  - Fourier (1-D, 2-D or 3-D DFT, magnitude only)
//!  - Post-shift (zero-frequency centering)
//!  - Convert (physical units)
//!  - Reorient (axis labels)
//!  - Interpolate (trilinear resampling)
//!  - Colour and Camera, which produce the [`RenderData`] for a renderer
//!
//!  Every stage caches its last input and output. Changing a stage's
//!  parameters recomputes that stage from the data it last saw and pushes the
//!  result down the chain once; stages above it are left alone. If the
//!  environment supports it the transforms run in parallel using rayon.
//!
//!   Contributions are highly welcome!
//!
//! # Roadmap
//!
//!  - Unit conversions between metric and imperial/astronomical units
//!  - Running long transforms on a worker thread
//!  - Camera dependent level of detail
//!
//! # Examples
//!
//! ## Loading a scan and transforming it
//!
//! Load `scan.3d` with its parameter file, take the centred 3-D Fourier
//! transform and double the resolution.
//!
//! ```no_run
//! # use mri_pipeline::{InterpolateMode, Pipeline};
//! # use std::path::PathBuf;
//! let mut pipeline = Pipeline::builder().build();
//! pipeline.open(Some(PathBuf::from("scan.3d")), Some(PathBuf::from("scan.par")));
//! pipeline.batch(|settings| {
//!     settings.fourier.transform = true;
//!     settings.post_shift.axes = [true; 3];
//!     settings.interpolate.mode = InterpolateMode::Double;
//! });
//! let render = pipeline
//!     .camera()
//!     .data()
//!     .expect("should have processed the scan");
//! println!("{:?} voxels", render.counts());
//! ```

pub mod enums;
pub mod fft;
mod interpolator;
pub mod pipeline;
pub mod settings;
pub mod stage;
pub mod stages;
pub mod volume;
pub mod volume_loader;

pub use enums::{FourierMode, FourierNorm, InterpolateMode, Orientation, StageId, Unit};
pub use pipeline::{Pipeline, PipelineBuilder, RenderSink};
pub use settings::{PipelineSettings, SettingsError};
pub use stage::{Recompute, Stage, StageError};
pub use volume::{ColourLookup, RenderData, VoxelDataset};
