pub mod device;
mod fade;

use std::sync::{Arc, OnceLock};

use crate::cache::entry::BitmapResource;

pub use device::RenderDevice;
pub use fade::FadeTransition;

/// Content handed to a `RenderDevice`.
///
/// Design rule: devices only ever see resources, never cache handles.
#[derive(Clone, Debug)]
pub enum Drawable {
    Empty,
    Bitmap(Arc<BitmapResource>),
    Fade(FadeTransition),
}

impl Drawable {
    /// The bitmap shown once any transition has finished.
    pub fn content(&self) -> Option<&Arc<BitmapResource>> {
        match self {
            Drawable::Empty => None,
            Drawable::Bitmap(bitmap) => Some(bitmap),
            Drawable::Fade(fade) => Some(&fade.to),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Drawable::Empty)
    }
}

static PLACEHOLDER: OnceLock<Arc<BitmapResource>> = OnceLock::new();

/// Shared empty bitmap that fades start from.
///
/// Created on first use and never mutated afterwards, so every concurrent
/// fade can hold the same allocation.
pub fn placeholder() -> Arc<BitmapResource> {
    PLACEHOLDER
        .get_or_init(|| Arc::new(BitmapResource::empty()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_shared() {
        let a = placeholder();
        let b = placeholder();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.width, 0);
        assert!(a.rgba.is_empty());
    }

    #[test]
    fn fade_content_is_its_target() {
        let bitmap = Arc::new(BitmapResource::new(1, 1, vec![9; 4]));
        let fade = FadeTransition::from_placeholder(bitmap.clone(), std::time::Duration::from_millis(10));
        let drawable = Drawable::Fade(fade);
        assert!(Arc::ptr_eq(drawable.content().unwrap(), &bitmap));
        assert!(Drawable::Empty.content().is_none());
        assert!(Drawable::Empty.is_empty());
    }
}
