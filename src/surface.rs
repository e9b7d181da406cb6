use std::sync::Arc;
use std::time::Duration;

use crate::cache::entry::{BitmapResource, CacheEntryHandle};
use crate::diag::{self, DiagKind};
use crate::error::SurfaceError;
use crate::render::{Drawable, FadeTransition, RenderDevice};
use crate::util::config::{self, SurfaceConfig};

/// What a surface is currently showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayState {
    Empty,
    /// The resource of `current_handle()`.
    Entry,
    /// Content set through `set_drawable`, not tracked by any cache entry.
    Independent,
}

/// Binding between one visual element and at most one cache entry.
///
/// The owning UI element calls these methods from its own lifecycle hooks,
/// all on the thread that owns the element.
///
/// While an entry is bound it counts one use from this surface. Every
/// transition draws the new content first and only then releases the
/// previous entry, so the store never sees the visible entry as unused.
#[derive(Debug)]
pub struct DisplaySurface<D: RenderDevice> {
    device: D,
    current: Option<CacheEntryHandle>,
    display: DisplayState,
    fade_enabled: bool,
    fade_duration: Duration,
}

impl<D: RenderDevice> DisplaySurface<D> {
    /// Surface using the process-wide config.
    pub fn new(device: D) -> Self {
        Self::with_config(device, *config::surface_config())
    }

    pub fn with_config(device: D, cfg: SurfaceConfig) -> Self {
        Self {
            device,
            current: None,
            display: DisplayState::Empty,
            fade_enabled: cfg.fade_enabled,
            fade_duration: cfg.fade_duration(),
        }
    }

    /// Display `handle`, or nothing for `None`.
    ///
    /// A reclaimed entry is logged and shown as empty content. On a draw
    /// failure the previous binding is kept and the new entry is not marked.
    pub fn bind(&mut self, handle: Option<CacheEntryHandle>, fade: bool) -> Result<(), SurfaceError> {
        let acquired = handle.and_then(acquire);
        let drawable = match &acquired {
            Some((_, resource)) => self.drawable_for(resource.clone(), fade),
            None => Drawable::Empty,
        };

        if let Err(err) = self.device.draw(&drawable) {
            let origin = match &acquired {
                Some((handle, _)) => {
                    handle.mark_in_use(false);
                    handle.origin().to_string()
                }
                None => "<empty>".to_string(),
            };
            diag::record(DiagKind::RenderFailed, format!("{err}: {origin}"));
            return Err(err.into());
        }

        let next = acquired.map(|(handle, _)| handle);
        let display = if next.is_some() { DisplayState::Entry } else { DisplayState::Empty };
        self.commit(next, display);
        Ok(())
    }

    /// Display a bitmap that did not come from a store.
    ///
    /// It is wrapped in a transient entry so release follows the same path
    /// as cached content.
    pub fn bind_raw(&mut self, bitmap: impl Into<Arc<BitmapResource>>) -> Result<(), SurfaceError> {
        self.bind(Some(CacheEntryHandle::transient(bitmap)), false)
    }

    /// Display content that is not cache-tracked at all, releasing any
    /// bound entry once it is drawn.
    pub fn set_drawable(&mut self, drawable: Drawable) -> Result<(), SurfaceError> {
        if let Err(err) = self.device.draw(&drawable) {
            diag::record(DiagKind::RenderFailed, format!("{err}: independent drawable"));
            return Err(err.into());
        }
        let display = if drawable.is_empty() { DisplayState::Empty } else { DisplayState::Independent };
        self.commit(None, display);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), SurfaceError> {
        self.bind(None, false)
    }

    /// The element left the display tree. Always releases the bound entry,
    /// even if the device refuses to draw empty content.
    pub fn on_detach(&mut self) {
        if let Err(err) = self.clear() {
            log::warn!("detach: clearing failed ({err}), releasing anyway");
            self.commit(None, DisplayState::Empty);
        }
    }

    pub fn current_handle(&self) -> Option<&CacheEntryHandle> {
        self.current.as_ref()
    }

    pub fn display_state(&self) -> DisplayState {
        self.display
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn drawable_for(&self, resource: Arc<BitmapResource>, fade: bool) -> Drawable {
        if fade && self.fade_enabled {
            Drawable::Fade(FadeTransition::from_placeholder(resource, self.fade_duration))
        } else {
            Drawable::Bitmap(resource)
        }
    }

    /// Swap in the new binding, then release the old one exactly once.
    fn commit(&mut self, next: Option<CacheEntryHandle>, display: DisplayState) {
        let prior = std::mem::replace(&mut self.current, next);
        self.display = display;
        if let Some(prior) = prior {
            log::debug!("surface released {}", prior.origin());
            prior.mark_in_use(false);
        }
    }
}

impl<D: RenderDevice> Drop for DisplaySurface<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.mark_in_use(false);
        }
    }
}

/// Mark `handle` in use and fetch its resource, or report it as reclaimed.
fn acquire(handle: CacheEntryHandle) -> Option<(CacheEntryHandle, Arc<BitmapResource>)> {
    if handle.valid() {
        #[cfg(test)]
        tests::run_before_mark(&handle);
        handle.mark_in_use(true);
        // The store may reclaim between the check and the mark.
        if let Some(resource) = handle.resource() {
            return Some((handle, resource));
        }
        handle.mark_in_use(false);
    }
    diag::record(
        DiagKind::InvalidResource,
        format!("trying to draw a reclaimed bitmap: {}", handle.origin()),
    );
    None
}
