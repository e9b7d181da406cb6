//! bitmapcache (staticlib + rlib)
//!
//! Consumer-side lifetime contract between shared bitmap cache entries and
//! the surfaces that display them. The C ABI lives in `ffi`.
//!
//! Design rule: keep this file thin.

pub mod cache;
pub mod diag;
pub mod error;
mod ffi;
pub mod render;
pub mod surface;
pub mod util;

pub use cache::entry::{BitmapResource, CacheEntryHandle, OriginKey};
pub use cache::store::EntryStore;
pub use error::{RenderError, SurfaceError};
pub use render::{Drawable, FadeTransition, RenderDevice};
pub use surface::{DisplayState, DisplaySurface};

// Export C ABI symbols.
pub use ffi::exports::*;
