use crate::stage::{Process, Recompute};
use crate::volume::RenderData;

/// Identity for now; the place for camera dependent colouring or level of
/// detail once the renderer needs it.
#[derive(Default)]
pub struct Camera;

impl Process for Camera {
    type Params = ();
    type Input = RenderData;
    type Output = RenderData;

    fn recalculate(&mut self, _params: &mut (), input: &RenderData) -> Recompute<RenderData> {
        Recompute::Recomputed(input.clone())
    }
}
