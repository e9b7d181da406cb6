use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::diag::{self, DiagKind};

/// Decoded RGBA8 bitmap.
///
/// - `rgba` is row-major, 4 bytes per pixel (R,G,B,A).
/// - Immutable once wrapped in a handle; surfaces only ever read it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapResource {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl BitmapResource {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self { width, height, rgba }
    }

    /// A 0x0 bitmap with no pixels.
    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }

    pub fn is_well_formed(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(4))
            == Some(self.rgba.len())
    }
}

/// Where a cache entry came from.
///
/// Absolute URLs are kept in canonical form so `http://a/b` and
/// `HTTP://A/b` name the same entry. Anything else is an opaque key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OriginKey {
    Url(Url),
    Opaque(String),
}

impl OriginKey {
    pub fn parse(key: &str) -> Self {
        match Url::parse(key) {
            Ok(url) => OriginKey::Url(url),
            Err(_) => OriginKey::Opaque(key.to_string()),
        }
    }

    /// Key used for content that never went through a store.
    pub fn transient() -> Self {
        OriginKey::Opaque("transient:".to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            OriginKey::Url(url) => url.as_str(),
            OriginKey::Opaque(key) => key,
        }
    }
}

impl fmt::Display for OriginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OriginKey {
    fn from(key: &str) -> Self {
        OriginKey::parse(key)
    }
}

struct EntryState {
    /// Number of surfaces currently displaying the resource.
    use_count: usize,
    /// `None` once the store has reclaimed the resource.
    resource: Option<Arc<BitmapResource>>,
}

struct EntryInner {
    origin: OriginKey,
    state: Mutex<EntryState>,
}

/// Shared handle to one cache entry.
///
/// Cloning is cheap and every clone refers to the same entry. The store and
/// any number of surfaces may hold clones at once; each surface counts as one
/// user while it displays the entry.
///
/// The use count and the resource live under one lock, so the store's
/// "unused? then reclaim" decision can never interleave with a surface
/// marking the entry in use.
#[derive(Clone)]
pub struct CacheEntryHandle {
    inner: Arc<EntryInner>,
}

impl CacheEntryHandle {
    pub fn new(origin: impl Into<OriginKey>, resource: impl Into<Arc<BitmapResource>>) -> Self {
        let origin = origin.into();
        let resource = resource.into();
        let resource = if resource.is_well_formed() {
            Some(resource)
        } else {
            diag::record(
                DiagKind::MalformedResource,
                format!(
                    "{}x{} bitmap with {} bytes: {}",
                    resource.width,
                    resource.height,
                    resource.rgba.len(),
                    origin
                ),
            );
            None
        };

        Self {
            inner: Arc::new(EntryInner {
                origin,
                state: Mutex::new(EntryState { use_count: 0, resource }),
            }),
        }
    }

    /// Wrap a bitmap that is not owned by any store.
    pub fn transient(resource: impl Into<Arc<BitmapResource>>) -> Self {
        Self::new(OriginKey::transient(), resource)
    }

    fn state(&self) -> MutexGuard<'_, EntryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add (`true`) or remove (`false`) one user.
    ///
    /// Removing a user from an entry nobody uses is a programming error:
    /// loud in debug builds, ignored in release builds.
    pub fn mark_in_use(&self, flag: bool) {
        let mut st = self.state();
        if flag {
            st.use_count += 1;
            return;
        }
        if st.use_count > 0 {
            st.use_count -= 1;
            return;
        }
        drop(st);

        diag::record(
            DiagKind::DoubleRelease,
            format!("entry released while not in use: {}", self.inner.origin),
        );
        if cfg!(debug_assertions) {
            panic!("double release of cache entry {}", self.inner.origin);
        }
    }

    pub fn in_use(&self) -> bool {
        self.state().use_count > 0
    }

    pub fn use_count(&self) -> usize {
        self.state().use_count
    }

    /// False once the resource has been reclaimed (or was never usable).
    pub fn valid(&self) -> bool {
        self.state().resource.is_some()
    }

    pub fn resource(&self) -> Option<Arc<BitmapResource>> {
        self.state().resource.clone()
    }

    pub fn origin(&self) -> &OriginKey {
        &self.inner.origin
    }

    /// True if both handles refer to the same entry.
    pub fn ptr_eq(&self, other: &CacheEntryHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Store side: free the resource if no surface uses it.
    ///
    /// Returns true if the entry is unused and therefore invalid after the
    /// call. Returns false, leaving the entry untouched, while it is in use.
    pub fn try_reclaim(&self) -> bool {
        let mut st = self.state();
        if st.use_count > 0 {
            return false;
        }
        if st.resource.take().is_some() {
            log::debug!("reclaimed {}", self.inner.origin);
        }
        true
    }
}

impl fmt::Debug for CacheEntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state();
        f.debug_struct("CacheEntryHandle")
            .field("origin", &self.inner.origin)
            .field("use_count", &st.use_count)
            .field("valid", &st.resource.is_some())
            .finish()
    }
}
