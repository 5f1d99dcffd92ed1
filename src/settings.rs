//! Serialisable snapshot of every stage's parameters.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::StageId;
use crate::stages::{
    ColourParams, ConvertParams, FilterParams, FourierParams, InterpolateParams, PostShiftParams,
    PreShiftParams, ReorientParams, SourceParams,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters of the whole chain. The camera stage has none.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub source: SourceParams,
    pub pre_shift: PreShiftParams,
    pub filter: FilterParams,
    pub fourier: FourierParams,
    pub post_shift: PostShiftParams,
    pub convert: ConvertParams,
    pub reorient: ReorientParams,
    pub interpolate: InterpolateParams,
    pub colour: ColourParams,
}

impl PipelineSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Stages whose parameters differ between `self` and `other`, in chain
    /// order.
    pub fn changed_stages(&self, other: &PipelineSettings) -> Vec<StageId> {
        [
            (StageId::Source, self.source != other.source),
            (StageId::PreShift, self.pre_shift != other.pre_shift),
            (StageId::Filter, self.filter != other.filter),
            (StageId::Fourier, self.fourier != other.fourier),
            (StageId::PostShift, self.post_shift != other.post_shift),
            (StageId::Convert, self.convert != other.convert),
            (StageId::Reorient, self.reorient != other.reorient),
            (StageId::Interpolate, self.interpolate != other.interpolate),
            (StageId::Colour, self.colour != other.colour),
        ]
        .into_iter()
        .filter_map(|(id, changed)| changed.then_some(id))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{FourierNorm, InterpolateMode, Orientation, Unit};

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let settings = PipelineSettings::from_json(
            r#"{
                "fourier": { "transform": true, "norm": "ortho" },
                "interpolate": { "mode": "double" },
                "source": { "orientation_override": "zyx", "unit_override": "centimeter" }
            }"#,
        )
        .unwrap();

        assert!(settings.fourier.transform);
        assert_eq!(settings.fourier.norm, FourierNorm::Orthographic);
        assert!(!settings.fourier.inverse);
        assert_eq!(settings.interpolate.mode, InterpolateMode::Double);
        assert_eq!(settings.source.orientation_override, Some(Orientation::Zyx));
        assert_eq!(settings.source.unit_override, Some(Unit::Centimeter));
        assert_eq!(settings.filter, FilterParams::default());
        assert_eq!(settings.colour.density_scalar, 0.05);
    }

    #[test]
    fn load_trigger_is_not_saved() {
        let mut settings = PipelineSettings::default();
        settings.source.load = true;
        settings.pre_shift.shifts = [0, 1, -2];

        let restored = PipelineSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert!(!restored.source.load);
        assert_eq!(restored.pre_shift.shifts, [0, 1, -2]);
    }

    #[test]
    fn changed_stages_are_in_chain_order() {
        let before = PipelineSettings::default();
        let mut after = before.clone();
        after.colour.emission_brightness = 2.0;
        after.filter.low_pass = true;

        assert_eq!(before.changed_stages(&after), vec![StageId::Filter, StageId::Colour]);
        assert!(before.changed_stages(&before).is_empty());
    }

    #[test]
    fn missing_file_reports_its_path() {
        let path = std::env::temp_dir().join("mri-pipeline-settings-missing.json");
        let error = PipelineSettings::from_json_file(&path).unwrap_err();
        assert!(matches!(error, SettingsError::Io { path: p, .. } if p == path));
    }
}
