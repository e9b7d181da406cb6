use crate::error::RenderError;
use crate::render::device::RenderDevice;
use crate::render::Drawable;

/// Headless device that keeps every drawable it is given.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    draws: Vec<Drawable>,
    failing: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every draw until switched off again.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn draws(&self) -> &[Drawable] {
        &self.draws
    }

    pub fn last(&self) -> Option<&Drawable> {
        self.draws.last()
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

impl RenderDevice for RecordingDevice {
    fn draw(&mut self, drawable: &Drawable) -> Result<(), RenderError> {
        if self.failing {
            return Err(RenderError::Rejected("recording device set to fail".into()));
        }
        self.draws.push(drawable.clone());
        Ok(())
    }
}
