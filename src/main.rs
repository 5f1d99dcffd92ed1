use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueHint};
use log::info;
use mri_pipeline::stages::GradientImage;
use mri_pipeline::{
    FourierMode, FourierNorm, InterpolateMode, Orientation, Pipeline, PipelineSettings, Recompute,
    RenderData, RenderSink, StageId, Unit,
};

#[derive(Parser)]
#[command(author, version, about = "Process a Prospa MRI scan into render-ready voxels")]
struct Cli {
    /// Scan data file (.1d/.2d/.3d); opens a file dialog when omitted
    #[arg(value_hint = ValueHint::FilePath)]
    data: Option<PathBuf>,

    /// Parameter file (.par) describing orientation, field of view and counts
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    parameters: Option<PathBuf>,

    /// Ignore the parameter file even if one is given in the settings
    #[arg(long)]
    exclude_parameters: bool,

    /// Start from the stage parameters stored in this JSON file
    #[arg(long, value_hint = ValueHint::FilePath)]
    settings: Option<PathBuf>,

    /// Write the effective stage parameters to this JSON file
    #[arg(long, value_hint = ValueHint::FilePath)]
    save_settings: Option<PathBuf>,

    /// Override the orientation of the loaded scan
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Override the physical extent of each axis
    #[arg(long, num_args = 3, value_names = ["P2", "P1", "READ"])]
    dimensions: Option<Vec<f64>>,

    /// Override the unit of the loaded dimensions
    #[arg(long)]
    unit: Option<Unit>,

    /// Take the Fourier transform
    #[arg(long)]
    fourier: bool,

    /// Take the inverse transform instead
    #[arg(long, requires = "fourier")]
    inverse: bool,

    /// Number of trailing axes to transform (1d, 2d or 3d)
    #[arg(long)]
    mode: Option<FourierMode>,

    /// Transform normalisation (backward, ortho or forward)
    #[arg(long)]
    norm: Option<FourierNorm>,

    /// Centre the zero frequency after transforming
    #[arg(long)]
    centre: bool,

    /// Convert the dimensions to another unit
    #[arg(long)]
    convert: Option<Unit>,

    /// Relabel the axis order
    #[arg(long)]
    reorient: Option<Orientation>,

    /// Resample the grid (cube, double, triple, quadruple or minimum)
    #[arg(long)]
    interpolate: Option<InterpolateMode>,

    /// Gradient image used as the colour lookup
    #[arg(long, value_hint = ValueHint::FilePath)]
    lookup: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, settings: &mut PipelineSettings) -> anyhow::Result<()> {
        let source = &mut settings.source;
        if self.data.is_some() {
            source.data_path = self.data.clone();
        }
        if self.parameters.is_some() {
            source.parameter_path = self.parameters.clone();
        }
        source.exclude_parameter_file |= self.exclude_parameters;
        source.orientation_override = self.orientation.or(source.orientation_override);
        source.unit_override = self.unit.or(source.unit_override);
        if let Some(dimensions) = &self.dimensions {
            let dimensions: [f64; 3] = dimensions
                .as_slice()
                .try_into()
                .context("expected three dimensions")?;
            source.dimension_override = Some(dimensions);
        }

        let fourier = &mut settings.fourier;
        fourier.transform |= self.fourier;
        fourier.inverse |= self.inverse;
        fourier.mode = self.mode.unwrap_or(fourier.mode);
        fourier.norm = self.norm.unwrap_or(fourier.norm);
        if self.centre {
            settings.post_shift.axes = [true; 3];
            settings.post_shift.inverse = self.inverse;
        }

        settings.convert.unit = self.convert.or(settings.convert.unit);
        settings.reorient.orientation = self.reorient.or(settings.reorient.orientation);
        settings.interpolate.mode = self.interpolate.unwrap_or(settings.interpolate.mode);
        Ok(())
    }
}

struct Summary;

impl RenderSink for Summary {
    fn submit(&mut self, data: &RenderData) {
        let magnitudes = data.normalized_magnitudes();
        let filled = magnitudes.iter().filter(|&&m| m > 0.0).count();
        info!(
            "Render data ready: {} {:?} voxels over {:?} {}, {filled} non-zero",
            data.orientation(),
            data.counts(),
            data.dimensions(),
            data.unit()
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => PipelineSettings::from_json_file(path)?,
        None => PipelineSettings::default(),
    };
    cli.apply(&mut settings)?;

    let mut builder = Pipeline::builder().settings(settings).render_sink(Summary);
    if let Some(lookup) = &cli.lookup {
        builder = builder.colour_loader(GradientImage::new(lookup));
    }
    let mut pipeline = builder.build();

    if let Recompute::Failed(error) = pipeline.reload() {
        return Err(anyhow::Error::new(error).context("failed to process scan"));
    }
    if !pipeline.has_processed(StageId::Camera) {
        bail!("the scan did not reach the end of the pipeline");
    }

    let render = pipeline.camera().data()?;
    println!(
        "{} {:?} voxels, {:?} {}, peak magnitude {:.4}",
        render.orientation(),
        render.counts(),
        render.dimensions(),
        render.unit(),
        render.dataset.max_magnitude()
    );

    if let Some(path) = &cli.save_settings {
        pipeline.settings().to_json_file(path)?;
        info!("Saved settings to {}", path.display());
    }
    Ok(())
}
