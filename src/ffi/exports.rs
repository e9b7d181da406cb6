use core::ffi::{c_char, c_void};
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::cache::entry::{BitmapResource, CacheEntryHandle};
use crate::cache::store::EntryStore;
use crate::diag;
use crate::ffi::types::{bytes_from_raw, cstr_to_string, write_c_string};
use crate::render::device::{CallbackDevice, DrawCallback};
use crate::surface::DisplaySurface;

pub const BITMAPCACHE_OK: i32 = 0;
pub const BITMAPCACHE_ERR_NULL: i32 = -1;
pub const BITMAPCACHE_ERR_RENDER: i32 = -2;
pub const BITMAPCACHE_ERR_ARGS: i32 = -3;

/// Opaque store handle passed to C.
///
/// Design rule: C must treat every context type here as an opaque pointer.
pub struct StoreContext {
    store: EntryStore,
}

/// C's own reference to a cache entry. Releasing it never reclaims the
/// entry; only the store does that.
pub struct EntryRef {
    handle: CacheEntryHandle,
}

pub struct SurfaceContext {
    surface: DisplaySurface<CallbackDevice>,
}

static LAST_ERROR: OnceLock<Mutex<Option<String>>> = OnceLock::new();

fn set_last_error(msg: String) {
    log::warn!("{msg}");
    let lock = LAST_ERROR.get_or_init(|| Mutex::new(None));
    *lock.lock().unwrap_or_else(PoisonError::into_inner) = Some(msg);
}

fn take_last_error() -> Option<String> {
    let lock = LAST_ERROR.get_or_init(|| Mutex::new(None));
    lock.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn read_bitmap(width: u32, height: u32, rgba: *const u8, len: usize) -> Option<BitmapResource> {
    match bytes_from_raw(rgba, len) {
        Some(bytes) => Some(BitmapResource::new(width, height, bytes)),
        None => {
            set_last_error(format!("null pixel buffer for {width}x{height} bitmap"));
            None
        }
    }
}

#[no_mangle]
pub extern "C" fn bitmapcache_store_create() -> *mut StoreContext {
    crate::util::logging::init_logger();
    Box::into_raw(Box::new(StoreContext { store: EntryStore::new() }))
}

/// Destroying the store reclaims unused entries; entries still displayed
/// stay alive until their surfaces let go.
#[no_mangle]
pub extern "C" fn bitmapcache_store_destroy(ctx: *mut StoreContext) {
    if ctx.is_null() {
        return;
    }
    let mut ctx = unsafe { Box::from_raw(ctx) };
    ctx.store.clear();
}

/// Insert a decoded RGBA8 bitmap under `key`. The caller owns the returned
/// entry reference and frees it with `bitmapcache_entry_release`.
#[no_mangle]
pub extern "C" fn bitmapcache_store_insert(
    ctx: *mut StoreContext,
    key: *const c_char,
    width: u32,
    height: u32,
    rgba: *const u8,
    len: usize,
) -> *mut EntryRef {
    if ctx.is_null() {
        return core::ptr::null_mut();
    }
    let ctx = unsafe { &mut *ctx };
    let Some(key) = cstr_to_string(key) else {
        set_last_error("store insert without a key".to_string());
        return core::ptr::null_mut();
    };
    let Some(bitmap) = read_bitmap(width, height, rgba, len) else {
        return core::ptr::null_mut();
    };
    let handle = ctx.store.insert(key.as_str(), bitmap);
    Box::into_raw(Box::new(EntryRef { handle }))
}

#[no_mangle]
pub extern "C" fn bitmapcache_store_reclaim_unused(ctx: *mut StoreContext) -> u32 {
    if ctx.is_null() {
        return 0;
    }
    let ctx = unsafe { &mut *ctx };
    u32::try_from(ctx.store.reclaim_unused()).unwrap_or(u32::MAX)
}

#[no_mangle]
pub extern "C" fn bitmapcache_store_len(ctx: *const StoreContext) -> u32 {
    if ctx.is_null() {
        return 0;
    }
    let ctx = unsafe { &*ctx };
    u32::try_from(ctx.store.len()).unwrap_or(u32::MAX)
}

#[no_mangle]
pub extern "C" fn bitmapcache_entry_in_use(entry: *const EntryRef) -> u32 {
    if entry.is_null() {
        return 0;
    }
    let entry = unsafe { &*entry };
    if entry.handle.in_use() { 1 } else { 0 }
}

#[no_mangle]
pub extern "C" fn bitmapcache_entry_valid(entry: *const EntryRef) -> u32 {
    if entry.is_null() {
        return 0;
    }
    let entry = unsafe { &*entry };
    if entry.handle.valid() { 1 } else { 0 }
}

#[no_mangle]
pub extern "C" fn bitmapcache_entry_release(entry: *mut EntryRef) {
    if entry.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(entry));
    }
}

/// Create a surface that draws through `draw`. Returns null without one.
#[no_mangle]
pub extern "C" fn bitmapcache_surface_create(
    draw: Option<DrawCallback>,
    user: *mut c_void,
) -> *mut SurfaceContext {
    crate::util::logging::init_logger();
    let Some(draw) = draw else {
        set_last_error("surface created without a draw callback".to_string());
        return core::ptr::null_mut();
    };
    let surface = DisplaySurface::new(CallbackDevice::new(draw, user));
    Box::into_raw(Box::new(SurfaceContext { surface }))
}

/// Display `entry` (null clears the surface).
#[no_mangle]
pub extern "C" fn bitmapcache_surface_bind(
    ctx: *mut SurfaceContext,
    entry: *const EntryRef,
    fade: i32,
) -> i32 {
    if ctx.is_null() {
        return BITMAPCACHE_ERR_NULL;
    }
    let ctx = unsafe { &mut *ctx };
    let handle = if entry.is_null() {
        None
    } else {
        Some(unsafe { &*entry }.handle.clone())
    };
    match ctx.surface.bind(handle, fade != 0) {
        Ok(()) => BITMAPCACHE_OK,
        Err(err) => {
            set_last_error(err.to_string());
            BITMAPCACHE_ERR_RENDER
        }
    }
}

#[no_mangle]
pub extern "C" fn bitmapcache_surface_bind_raw(
    ctx: *mut SurfaceContext,
    width: u32,
    height: u32,
    rgba: *const u8,
    len: usize,
) -> i32 {
    if ctx.is_null() {
        return BITMAPCACHE_ERR_NULL;
    }
    let ctx = unsafe { &mut *ctx };
    let Some(bitmap) = read_bitmap(width, height, rgba, len) else {
        return BITMAPCACHE_ERR_ARGS;
    };
    match ctx.surface.bind_raw(bitmap) {
        Ok(()) => BITMAPCACHE_OK,
        Err(err) => {
            set_last_error(err.to_string());
            BITMAPCACHE_ERR_RENDER
        }
    }
}

#[no_mangle]
pub extern "C" fn bitmapcache_surface_clear(ctx: *mut SurfaceContext) -> i32 {
    bitmapcache_surface_bind(ctx, core::ptr::null(), 0)
}

#[no_mangle]
pub extern "C" fn bitmapcache_surface_detach(ctx: *mut SurfaceContext) {
    if ctx.is_null() {
        return;
    }
    let ctx = unsafe { &mut *ctx };
    ctx.surface.on_detach();
}

#[no_mangle]
pub extern "C" fn bitmapcache_surface_destroy(ctx: *mut SurfaceContext) {
    if ctx.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(ctx));
    }
}

/// Returns the number of bytes written (excluding the NUL terminator).
#[no_mangle]
pub extern "C" fn bitmapcache_last_error(out: *mut c_char, cap: usize) -> usize {
    let msg = take_last_error().unwrap_or_else(|| "Unknown error".to_string());
    write_c_string(out, cap, &msg)
}

/// Drain queued diagnostics, one per line, NUL-terminated when room allows.
#[no_mangle]
pub extern "C" fn bitmapcache_diag_drain(out: *mut c_char, out_len: u32) -> u32 {
    if out.is_null() || out_len == 0 {
        return 0;
    }
    // Safety: caller provides valid buffer.
    let buf = unsafe { core::slice::from_raw_parts_mut(out as *mut u8, out_len as usize) };
    // Keep the last byte for the terminator.
    let last = buf.len() - 1;
    let n = diag::drain_into(&mut buf[..last]);
    buf[n] = 0;
    n as u32
}
