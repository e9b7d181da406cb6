mod callback;
mod recording;

pub use callback::{CallbackDevice, DrawCallback};
pub use recording::RecordingDevice;

use crate::error::RenderError;
use crate::render::Drawable;

/// Platform drawing interface.
///
/// Design rule: only `render/device/*` can touch platform APIs.
/// Draws are synchronous; a surface treats `Ok` as "content committed".
pub trait RenderDevice {
    fn draw(&mut self, drawable: &Drawable) -> Result<(), RenderError>;
}

impl<D: RenderDevice + ?Sized> RenderDevice for Box<D> {
    fn draw(&mut self, drawable: &Drawable) -> Result<(), RenderError> {
        (**self).draw(drawable)
    }
}
