//! The cache-and-invalidate cell every pipeline stage is built from.
//!
//! A [`Stage`] owns the parameters of one processing step, the last input
//! it accepted and the output it produced from it. The computation itself
//! lives behind the [`Process`] trait; the stage only decides what to keep.

use std::path::PathBuf;

use log::debug;
use thiserror::Error;
use web_time::Instant;

use crate::enums::StageId;
use crate::volume::VolumeError;
use crate::volume_loader::LoaderError;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0} stage has not yet been processed")]
    NotYetProcessed(StageId),

    #[error("{} does not exist or is not a readable file", .0.display())]
    MissingFile(PathBuf),

    #[error("file selection was cancelled")]
    Cancelled,

    #[error("scan holds {data:?} voxels but the parameter file describes {parameters:?}")]
    CountMismatch {
        data: [usize; 3],
        parameters: [usize; 3],
    },

    #[error("failed to load scan: {0}")]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error("colour lookup unavailable: {0}")]
    ColourLookup(#[from] image::ImageError),
}

/// What a recomputation produced.
#[derive(Debug)]
pub enum Recompute<T> {
    /// A fresh output, to be cached and pushed downstream.
    Recomputed(T),
    /// Nothing to do; caches and downstream stay as they are.
    Unchanged,
    /// The stage refused to recompute; downstream keeps its previous data.
    Failed(StageError),
}

impl<T> Recompute<T> {
    pub fn is_recomputed(&self) -> bool {
        matches!(self, Recompute::Recomputed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Recompute::Failed(_))
    }

    pub fn recomputed(self) -> Option<T> {
        match self {
            Recompute::Recomputed(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Result<T, StageError>> for Recompute<T> {
    fn from(result: Result<T, StageError>) -> Self {
        match result {
            Ok(value) => Recompute::Recomputed(value),
            Err(error) => Recompute::Failed(error),
        }
    }
}

/// One processing step of the chain.
///
/// `Params` are the caller-adjustable settings; everything else held by the
/// implementor is internal bookkeeping and never triggers a recompute.
pub trait Process {
    type Params: Default + Clone + PartialEq;
    type Input: Clone;
    type Output: Clone;

    /// Compute an output from `input`. Writes to `params` made here are
    /// quiet: they do not schedule another recompute.
    fn recalculate(
        &mut self,
        params: &mut Self::Params,
        input: &Self::Input,
    ) -> Recompute<Self::Output>;

    /// Input to use when nothing has been cached yet. Only head stages,
    /// which take no upstream data, provide one.
    fn initial_input() -> Option<Self::Input> {
        None
    }

    /// Drop internal state tied to the data seen so far.
    fn reset(&mut self) {}
}

pub struct Stage<P: Process> {
    id: StageId,
    params: P::Params,
    process: P,
    input: Option<P::Input>,
    output: Option<P::Output>,
    generation: u64,
}

impl<P: Process> Stage<P> {
    pub fn new(id: StageId, process: P) -> Self {
        Self {
            id,
            params: P::Params::default(),
            process,
            input: None,
            output: None,
            generation: 0,
        }
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn params(&self) -> &P::Params {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut P::Params {
        &mut self.params
    }

    pub(crate) fn process(&self) -> &P {
        &self.process
    }

    pub fn has_processed(&self) -> bool {
        self.output.is_some()
    }

    /// The cached output.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NotYetProcessed`] before the first successful
    /// update, which means the caller read the chain out of order
    pub fn data(&self) -> Result<&P::Output, StageError> {
        self.output.as_ref().ok_or(StageError::NotYetProcessed(self.id))
    }

    #[cfg(test)]
    pub(crate) fn cached_input(&self) -> Option<&P::Input> {
        self.input.as_ref()
    }

    /// How many outputs this stage has stored since it was built.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Recompute from `input`, caching both on success.
    pub(crate) fn update(&mut self, input: P::Input) -> Recompute<()> {
        let start = Instant::now();
        match self.process.recalculate(&mut self.params, &input) {
            Recompute::Recomputed(output) => {
                debug!("{} stage recomputed in {:?}", self.id, start.elapsed());
                self.input = Some(input);
                self.output = Some(output);
                self.generation += 1;
                Recompute::Recomputed(())
            }
            Recompute::Unchanged => Recompute::Unchanged,
            Recompute::Failed(error) => {
                debug!("{} stage failed to recompute: {error}", self.id);
                Recompute::Failed(error)
            }
        }
    }

    /// Recompute from the last input seen, after a parameter change.
    pub(crate) fn refresh(&mut self) -> Recompute<()> {
        match self.input.clone().or_else(P::initial_input) {
            Some(input) => self.update(input),
            None => Recompute::Unchanged,
        }
    }

    /// Forget cached data and restore default parameters.
    pub(crate) fn reset(&mut self) {
        self.params = P::Params::default();
        self.process.reset();
        self.input = None;
        self.output = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Doubler {
        calls: usize,
    }

    #[derive(Clone, Default, PartialEq)]
    struct DoublerParams {
        enabled: bool,
        refuse: bool,
    }

    impl Process for Doubler {
        type Params = DoublerParams;
        type Input = i32;
        type Output = i32;

        fn recalculate(&mut self, params: &mut DoublerParams, input: &i32) -> Recompute<i32> {
            self.calls += 1;
            if params.refuse {
                return Recompute::Failed(StageError::Cancelled);
            }
            Recompute::Recomputed(if params.enabled { input * 2 } else { *input })
        }
    }

    #[test]
    fn data_before_update_is_an_error() {
        let stage = Stage::new(StageId::Filter, Doubler::default());
        assert!(!stage.has_processed());
        assert!(matches!(
            stage.data(),
            Err(StageError::NotYetProcessed(StageId::Filter))
        ));
    }

    #[test]
    fn refresh_reuses_the_cached_input() {
        let mut stage = Stage::new(StageId::Filter, Doubler::default());
        assert!(matches!(stage.refresh(), Recompute::Unchanged));

        assert!(stage.update(21).is_recomputed());
        assert_eq!(*stage.data().unwrap(), 21);

        stage.params_mut().enabled = true;
        assert!(stage.refresh().is_recomputed());
        assert_eq!(*stage.data().unwrap(), 42);
        assert_eq!(stage.generation(), 2);
    }

    #[test]
    fn failure_keeps_previous_cache() {
        let mut stage = Stage::new(StageId::Filter, Doubler::default());
        stage.update(5);
        stage.params_mut().refuse = true;

        assert!(stage.update(9).is_failed());
        assert_eq!(*stage.data().unwrap(), 5);
        assert_eq!(stage.cached_input(), Some(&5));
        assert_eq!(stage.generation(), 1);
    }

    #[test]
    fn reset_clears_cache_and_params() {
        let mut stage = Stage::new(StageId::Filter, Doubler::default());
        stage.params_mut().enabled = true;
        stage.update(1);
        stage.reset();

        assert!(!stage.has_processed());
        assert!(stage.params() == &DoublerParams::default());
        assert_eq!(stage.process().calls, 1);
    }
}
