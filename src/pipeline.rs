//! The owned processing chain.
//!
//! A [`Pipeline`] holds one [`Stage`] per processing step and pushes every
//! fresh output down the chain. Parameters are only ever changed inside a
//! closure (`configure_*`, [`Pipeline::batch`]), so a group of writes costs a
//! single recompute of the stage and a single cascade below it.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::enums::{STAGES, StageId};
use crate::settings::PipelineSettings;
use crate::stage::{Process, Recompute, Stage};
use crate::stages::{
    Camera, Colour, ColourLookupLoader, ColourParams, Convert, ConvertParams, FilePicker, Filter,
    FilterParams, Fourier, FourierParams, Interpolate, InterpolateParams, PostShift,
    PostShiftParams, PreShift, PreShiftParams, RainbowGradient, Reorient, ReorientParams, Source,
    SourceParams,
};
use crate::volume::{ColourLookup, RenderData};

/// Consumer of the finished render data, normally the renderer's buffer
/// upload.
pub trait RenderSink {
    fn submit(&mut self, data: &RenderData);
}

pub struct PipelineBuilder {
    file_picker: Box<dyn FilePicker>,
    colour_loader: Box<dyn ColourLookupLoader>,
    render_sink: Option<Box<dyn RenderSink>>,
    settings: PipelineSettings,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        #[cfg(feature = "dialog")]
        let file_picker: Box<dyn FilePicker> = Box::new(crate::stages::DialogPicker);
        #[cfg(not(feature = "dialog"))]
        let file_picker: Box<dyn FilePicker> = Box::new(crate::stages::NoPicker);

        Self {
            file_picker,
            colour_loader: Box::new(RainbowGradient),
            render_sink: None,
            settings: PipelineSettings::default(),
        }
    }
}

impl PipelineBuilder {
    pub fn file_picker(mut self, picker: impl FilePicker + 'static) -> Self {
        self.file_picker = Box::new(picker);
        self
    }

    pub fn colour_loader(mut self, loader: impl ColourLookupLoader + 'static) -> Self {
        self.colour_loader = Box::new(loader);
        self
    }

    pub fn render_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.render_sink = Some(Box::new(sink));
        self
    }

    /// Initial parameters. Nothing is loaded until [`Pipeline::reload`] or
    /// [`Pipeline::open`] is called.
    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Pipeline {
        let mut pipeline = Pipeline {
            source: Stage::new(StageId::Source, Source::new(self.file_picker)),
            pre_shift: Stage::new(StageId::PreShift, PreShift),
            filter: Stage::new(StageId::Filter, Filter),
            fourier: Stage::new(StageId::Fourier, Fourier),
            post_shift: Stage::new(StageId::PostShift, PostShift),
            convert: Stage::new(StageId::Convert, Convert),
            reorient: Stage::new(StageId::Reorient, Reorient),
            interpolate: Stage::new(StageId::Interpolate, Interpolate),
            colour: Stage::new(StageId::Colour, Colour::new(self.colour_loader)),
            camera: Stage::new(StageId::Camera, Camera),
            render_sink: self.render_sink,
        };
        pipeline.write_settings(self.settings);
        pipeline
    }
}

/// Source → pre-shift → filter → fourier → post-shift → convert → reorient →
/// interpolate → colour → camera → render sink.
pub struct Pipeline {
    source: Stage<Source>,
    pre_shift: Stage<PreShift>,
    filter: Stage<Filter>,
    fourier: Stage<Fourier>,
    post_shift: Stage<PostShift>,
    convert: Stage<Convert>,
    reorient: Stage<Reorient>,
    interpolate: Stage<Interpolate>,
    colour: Stage<Colour>,
    camera: Stage<Camera>,
    render_sink: Option<Box<dyn RenderSink>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn source(&self) -> &Stage<Source> {
        &self.source
    }

    pub fn pre_shift(&self) -> &Stage<PreShift> {
        &self.pre_shift
    }

    pub fn filter(&self) -> &Stage<Filter> {
        &self.filter
    }

    pub fn fourier(&self) -> &Stage<Fourier> {
        &self.fourier
    }

    pub fn post_shift(&self) -> &Stage<PostShift> {
        &self.post_shift
    }

    pub fn convert(&self) -> &Stage<Convert> {
        &self.convert
    }

    pub fn reorient(&self) -> &Stage<Reorient> {
        &self.reorient
    }

    pub fn interpolate(&self) -> &Stage<Interpolate> {
        &self.interpolate
    }

    pub fn colour(&self) -> &Stage<Colour> {
        &self.colour
    }

    pub fn camera(&self) -> &Stage<Camera> {
        &self.camera
    }

    /// The lookup strip handed to the renderer, once the colour stage has
    /// loaded it.
    pub fn colour_lookup(&self) -> Option<&Arc<ColourLookup>> {
        self.colour.process().lookup()
    }

    pub fn has_processed(&self, id: StageId) -> bool {
        match id {
            StageId::Source => self.source.has_processed(),
            StageId::PreShift => self.pre_shift.has_processed(),
            StageId::Filter => self.filter.has_processed(),
            StageId::Fourier => self.fourier.has_processed(),
            StageId::PostShift => self.post_shift.has_processed(),
            StageId::Convert => self.convert.has_processed(),
            StageId::Reorient => self.reorient.has_processed(),
            StageId::Interpolate => self.interpolate.has_processed(),
            StageId::Colour => self.colour.has_processed(),
            StageId::Camera => self.camera.has_processed(),
        }
    }

    pub fn generation(&self, id: StageId) -> u64 {
        match id {
            StageId::Source => self.source.generation(),
            StageId::PreShift => self.pre_shift.generation(),
            StageId::Filter => self.filter.generation(),
            StageId::Fourier => self.fourier.generation(),
            StageId::PostShift => self.post_shift.generation(),
            StageId::Convert => self.convert.generation(),
            StageId::Reorient => self.reorient.generation(),
            StageId::Interpolate => self.interpolate.generation(),
            StageId::Colour => self.colour.generation(),
            StageId::Camera => self.camera.generation(),
        }
    }

    /// Current parameters of every stage.
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            source: self.source.params().clone(),
            pre_shift: self.pre_shift.params().clone(),
            filter: self.filter.params().clone(),
            fourier: self.fourier.params().clone(),
            post_shift: self.post_shift.params().clone(),
            convert: self.convert.params().clone(),
            reorient: self.reorient.params().clone(),
            interpolate: self.interpolate.params().clone(),
            colour: self.colour.params().clone(),
        }
    }

    pub fn configure_source(
        &mut self,
        f: impl FnOnce(&mut SourceParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.source.params_mut());
        self.refresh_from(StageId::Source)
    }

    pub fn configure_pre_shift(
        &mut self,
        f: impl FnOnce(&mut PreShiftParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.pre_shift.params_mut());
        self.refresh_from(StageId::PreShift)
    }

    pub fn configure_filter(
        &mut self,
        f: impl FnOnce(&mut FilterParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.filter.params_mut());
        self.refresh_from(StageId::Filter)
    }

    pub fn configure_fourier(
        &mut self,
        f: impl FnOnce(&mut FourierParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.fourier.params_mut());
        self.refresh_from(StageId::Fourier)
    }

    pub fn configure_post_shift(
        &mut self,
        f: impl FnOnce(&mut PostShiftParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.post_shift.params_mut());
        self.refresh_from(StageId::PostShift)
    }

    pub fn configure_convert(
        &mut self,
        f: impl FnOnce(&mut ConvertParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.convert.params_mut());
        self.refresh_from(StageId::Convert)
    }

    pub fn configure_reorient(
        &mut self,
        f: impl FnOnce(&mut ReorientParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.reorient.params_mut());
        self.refresh_from(StageId::Reorient)
    }

    pub fn configure_interpolate(
        &mut self,
        f: impl FnOnce(&mut InterpolateParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.interpolate.params_mut());
        self.refresh_from(StageId::Interpolate)
    }

    pub fn configure_colour(
        &mut self,
        f: impl FnOnce(&mut ColourParams),
    ) -> Recompute<Vec<StageId>> {
        f(self.colour.params_mut());
        self.refresh_from(StageId::Colour)
    }

    /// Change parameters across several stages at once.
    ///
    /// Stages whose parameters changed are refreshed in chain order until one
    /// of them recomputes; the cascade from there picks up every changed stage
    /// below it.
    pub fn batch(&mut self, f: impl FnOnce(&mut PipelineSettings)) -> Recompute<Vec<StageId>> {
        let mut settings = self.settings();
        f(&mut settings);
        let changed = self.settings().changed_stages(&settings);
        self.write_settings(settings);

        let mut failure = None;
        for id in changed {
            match self.refresh_stage(id) {
                Recompute::Unchanged => {}
                Recompute::Failed(error) => {
                    warn!("{id} stage rejected the new settings: {error}");
                    failure.get_or_insert(error);
                }
                recomputed => {
                    let cascade = self.cascade(id, recomputed);
                    return match failure {
                        Some(error) => Recompute::Failed(error),
                        None => cascade,
                    };
                }
            }
        }
        match failure {
            Some(error) => Recompute::Failed(error),
            None => Recompute::Unchanged,
        }
    }

    /// Replace every stage's parameters in one batch.
    pub fn apply_settings(&mut self, settings: PipelineSettings) -> Recompute<Vec<StageId>> {
        self.batch(|current| *current = settings)
    }

    /// Read the configured files again.
    pub fn reload(&mut self) -> Recompute<Vec<StageId>> {
        self.configure_source(|params| params.load = true)
    }

    /// Switch to a new scan. `None` for the data file asks the file picker.
    ///
    /// Overrides from the previous scan are dropped. When the new scan loads,
    /// every stage below the source goes back to its defaults before the new
    /// data is pushed through; when it does not, they are left alone.
    pub fn open(
        &mut self,
        data_path: Option<PathBuf>,
        parameter_path: Option<PathBuf>,
    ) -> Recompute<Vec<StageId>> {
        let params = self.source.params_mut();
        params.data_path = data_path;
        params.parameter_path = parameter_path;
        params.clear_overrides();
        params.load = true;

        let outcome = self.source.refresh();
        if outcome.is_recomputed() {
            self.reset_from(StageId::PreShift);
        }
        self.cascade(StageId::Source, outcome)
    }

    /// Drop every cache and parameter in the chain.
    pub fn reset(&mut self) {
        self.reset_from(StageId::Source);
    }

    /// Drop caches and parameters of `id` and every stage below it.
    pub fn reset_from(&mut self, id: StageId) {
        for stage in STAGES.into_iter().filter(|&stage| stage >= id) {
            match stage {
                StageId::Source => self.source.reset(),
                StageId::PreShift => self.pre_shift.reset(),
                StageId::Filter => self.filter.reset(),
                StageId::Fourier => self.fourier.reset(),
                StageId::PostShift => self.post_shift.reset(),
                StageId::Convert => self.convert.reset(),
                StageId::Reorient => self.reorient.reset(),
                StageId::Interpolate => self.interpolate.reset(),
                StageId::Colour => self.colour.reset(),
                StageId::Camera => self.camera.reset(),
            }
        }
        info!("Reset pipeline from the {id} stage");
    }

    fn write_settings(&mut self, settings: PipelineSettings) {
        *self.source.params_mut() = settings.source;
        *self.pre_shift.params_mut() = settings.pre_shift;
        *self.filter.params_mut() = settings.filter;
        *self.fourier.params_mut() = settings.fourier;
        *self.post_shift.params_mut() = settings.post_shift;
        *self.convert.params_mut() = settings.convert;
        *self.reorient.params_mut() = settings.reorient;
        *self.interpolate.params_mut() = settings.interpolate;
        *self.colour.params_mut() = settings.colour;
    }

    fn refresh_from(&mut self, id: StageId) -> Recompute<Vec<StageId>> {
        let outcome = self.refresh_stage(id);
        self.cascade(id, outcome)
    }

    fn refresh_stage(&mut self, id: StageId) -> Recompute<()> {
        match id {
            StageId::Source => self.source.refresh(),
            StageId::PreShift => self.pre_shift.refresh(),
            StageId::Filter => self.filter.refresh(),
            StageId::Fourier => self.fourier.refresh(),
            StageId::PostShift => self.post_shift.refresh(),
            StageId::Convert => self.convert.refresh(),
            StageId::Reorient => self.reorient.refresh(),
            StageId::Interpolate => self.interpolate.refresh(),
            StageId::Colour => self.colour.refresh(),
            StageId::Camera => self.camera.refresh(),
        }
    }

    /// Push the upstream output into `id`.
    fn feed_stage(&mut self, id: StageId) -> Recompute<()> {
        match id {
            StageId::Source => self.source.refresh(),
            StageId::PreShift => feed(&self.source, &mut self.pre_shift),
            StageId::Filter => feed(&self.pre_shift, &mut self.filter),
            StageId::Fourier => feed(&self.filter, &mut self.fourier),
            StageId::PostShift => feed(&self.fourier, &mut self.post_shift),
            StageId::Convert => feed(&self.post_shift, &mut self.convert),
            StageId::Reorient => feed(&self.convert, &mut self.reorient),
            StageId::Interpolate => feed(&self.reorient, &mut self.interpolate),
            StageId::Colour => feed(&self.interpolate, &mut self.colour),
            StageId::Camera => feed(&self.colour, &mut self.camera),
        }
    }

    /// Walk down from `id` for as long as stages keep producing output.
    fn cascade(&mut self, id: StageId, outcome: Recompute<()>) -> Recompute<Vec<StageId>> {
        let mut recomputed = Vec::new();
        let mut current = id;
        let mut outcome = outcome;
        loop {
            match outcome {
                Recompute::Recomputed(()) => recomputed.push(current),
                Recompute::Unchanged => break,
                Recompute::Failed(error) => {
                    warn!("{current} stage did not recompute: {error}");
                    return Recompute::Failed(error);
                }
            }
            if current == StageId::Camera {
                self.submit_render_data();
            }
            let Some(next) = current.next() else {
                break;
            };
            outcome = self.feed_stage(next);
            current = next;
        }

        if recomputed.is_empty() {
            Recompute::Unchanged
        } else {
            Recompute::Recomputed(recomputed)
        }
    }

    fn submit_render_data(&mut self) {
        if let (Some(sink), Ok(data)) = (self.render_sink.as_mut(), self.camera.data()) {
            sink.submit(data);
        }
    }
}

fn feed<U, D>(upstream: &Stage<U>, downstream: &mut Stage<D>) -> Recompute<()>
where
    U: Process,
    D: Process<Input = U::Output>,
{
    match upstream.data() {
        Ok(output) => downstream.update(output.clone()),
        Err(_) => Recompute::Unchanged,
    }
}
