use std::sync::Arc;
use std::time::Duration;

use crate::cache::entry::BitmapResource;
use crate::render::placeholder;

/// Two-layer cross-fade from `from` to `to`.
///
/// Purely a rendering concern: the surface commits its binding as soon as
/// the first frame is drawn, whatever the duration.
#[derive(Clone, Debug)]
pub struct FadeTransition {
    pub from: Arc<BitmapResource>,
    pub to: Arc<BitmapResource>,
    pub duration: Duration,
}

impl FadeTransition {
    pub fn from_placeholder(to: Arc<BitmapResource>, duration: Duration) -> Self {
        Self { from: placeholder(), to, duration }
    }

    /// Fraction of the transition completed after `elapsed`, in [0, 1].
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Alpha of the (`from`, `to`) layers after `elapsed`.
    pub fn layer_alphas(&self, elapsed: Duration) -> (f32, f32) {
        let p = self.progress(elapsed);
        (1.0 - p, p)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
