use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::enums::{Orientation, Unit};
use crate::stage::{Process, Recompute, StageError};
use crate::volume::VoxelDataset;
use crate::volume_loader::ScanLoader;

/// What to ask the user for when no data file is configured.
#[derive(Clone, Copy, Debug)]
pub struct PickRequest {
    pub title: &'static str,
    /// Display name and accepted extensions of each file type.
    pub filters: &'static [(&'static str, &'static [&'static str])],
}

pub const DATA_FILE_REQUEST: PickRequest = PickRequest {
    title: "Select a Prospa Data File",
    filters: &[
        ("Prospa Density Data", &["1d", "2d", "3d"]),
        ("Prospa Density Data 3D", &["3d"]),
        ("Prospa Density Data 2D", &["2d"]),
        ("Prospa Density Data 1D", &["1d"]),
    ],
};

/// Interactive file chooser. Blocks until the user answers; `None` means
/// the selection was cancelled.
pub trait FilePicker {
    fn pick_file(&mut self, request: &PickRequest) -> Option<PathBuf>;
}

/// Picker for headless use: every request is cancelled.
pub struct NoPicker;

impl FilePicker for NoPicker {
    fn pick_file(&mut self, _request: &PickRequest) -> Option<PathBuf> {
        None
    }
}

/// Platform-native open dialog.
#[cfg(feature = "dialog")]
pub struct DialogPicker;

#[cfg(feature = "dialog")]
impl FilePicker for DialogPicker {
    fn pick_file(&mut self, request: &PickRequest) -> Option<PathBuf> {
        let dialog = request
            .filters
            .iter()
            .fold(rfd::FileDialog::new().set_title(request.title), |dialog, (name, extensions)| {
                dialog.add_filter(*name, *extensions)
            });
        let picked = dialog.pick_file();
        match &picked {
            Some(path) => info!("Picked file name: {}", path.display()),
            None => info!("Cancelled file selection"),
        }
        picked
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceParams {
    /// Scan data file; `None` asks the file picker on the next load.
    pub data_path: Option<PathBuf>,
    pub parameter_path: Option<PathBuf>,
    /// Ignore `parameter_path` even when set.
    pub exclude_parameter_file: bool,
    pub orientation_override: Option<Orientation>,
    pub dimension_override: Option<[f64; 3]>,
    pub unit_override: Option<Unit>,
    /// (Re)load trigger. Cleared by every recompute, whatever its outcome.
    #[serde(skip)]
    pub load: bool,
}

impl SourceParams {
    /// Prospa `.1d`/`.2d`/`.3d` data files come with a `.par` companion.
    pub fn can_use_parameter_file(&self) -> bool {
        self.data_path
            .as_deref()
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "1d" | "2d" | "3d"))
    }

    pub fn clear_overrides(&mut self) {
        self.orientation_override = None;
        self.dimension_override = None;
        self.unit_override = None;
    }
}

/// Head of the chain: reads a scan and its parameters from disk.
pub struct Source {
    picker: Box<dyn FilePicker>,
}

impl Source {
    pub fn new(picker: Box<dyn FilePicker>) -> Self {
        Self { picker }
    }

    fn load(&mut self, params: &mut SourceParams) -> Result<VoxelDataset, StageError> {
        if let Some(path) = &params.data_path {
            Self::check_file(path)?;
        }
        let parameter_path = params
            .parameter_path
            .clone()
            .filter(|_| !params.exclude_parameter_file);
        if let Some(path) = &parameter_path {
            Self::check_file(path)?;
        }

        let data_path = match params.data_path.clone() {
            Some(path) => path,
            None => {
                let path = self
                    .picker
                    .pick_file(&DATA_FILE_REQUEST)
                    .ok_or(StageError::Cancelled)?;
                Self::check_file(&path)?;
                params.data_path = Some(path.clone());
                path
            }
        };

        let scan = ScanLoader::load_data(&data_path)?;
        let (orientation, dimensions, counts) = match &parameter_path {
            Some(path) => {
                let parameters = ScanLoader::load_parameters(path)?;
                if parameters.counts != scan.counts() {
                    return Err(StageError::CountMismatch {
                        data: scan.counts(),
                        parameters: parameters.counts,
                    });
                }
                (parameters.orientation, parameters.fov, parameters.counts)
            }
            None => (Orientation::Xyz, [1.0; 3], scan.counts()),
        };

        let orientation = params.orientation_override.unwrap_or(orientation);
        let dimensions = params.dimension_override.unwrap_or(dimensions);
        let unit = params.unit_override.unwrap_or_default();

        info!(
            "Loaded {} with {:?} voxels ({orientation}, {:?} {unit})",
            data_path.display(),
            counts,
            dimensions
        );
        Ok(VoxelDataset::new(orientation, dimensions, unit, counts, scan.data)?)
    }

    fn check_file(path: &Path) -> Result<(), StageError> {
        if path.is_file() {
            Ok(())
        } else {
            warn!("{} is not a readable file", path.display());
            Err(StageError::MissingFile(path.to_path_buf()))
        }
    }
}

impl Process for Source {
    type Params = SourceParams;
    type Input = ();
    type Output = VoxelDataset;

    fn recalculate(&mut self, params: &mut SourceParams, _input: &()) -> Recompute<VoxelDataset> {
        if !std::mem::take(&mut params.load) {
            return Recompute::Unchanged;
        }
        self.load(params).into()
    }

    fn initial_input() -> Option<()> {
        Some(())
    }
}
