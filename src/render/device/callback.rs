use core::ffi::c_void;

use crate::error::RenderError;
use crate::render::device::RenderDevice;
use crate::render::Drawable;

/// Host draw hook.
///
/// `rgba` is null with a 0x0 size for empty content. `fade_ms` is 0 unless
/// the host should cross-fade from empty over that many milliseconds.
/// Any nonzero return is a failed draw.
pub type DrawCallback =
    extern "C" fn(user: *mut c_void, rgba: *const u8, width: u32, height: u32, fade_ms: u32) -> i32;

/// Device that forwards draws to the C host.
#[derive(Debug)]
pub struct CallbackDevice {
    draw: DrawCallback,
    user: *mut c_void,
}

impl CallbackDevice {
    pub fn new(draw: DrawCallback, user: *mut c_void) -> Self {
        Self { draw, user }
    }
}

impl RenderDevice for CallbackDevice {
    fn draw(&mut self, drawable: &Drawable) -> Result<(), RenderError> {
        let fade_ms = match drawable {
            Drawable::Fade(fade) => u32::try_from(fade.duration.as_millis()).unwrap_or(u32::MAX),
            _ => 0,
        };
        let rc = match drawable.content() {
            Some(bitmap) => (self.draw)(self.user, bitmap.rgba.as_ptr(), bitmap.width, bitmap.height, fade_ms),
            None => (self.draw)(self.user, core::ptr::null(), 0, 0, 0),
        };
        if rc != 0 {
            return Err(RenderError::Callback(rc));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::BitmapResource;
    use crate::render::FadeTransition;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct Seen {
        calls: Vec<(bool, u32, u32, u32)>,
        status: i32,
    }

    extern "C" fn record(user: *mut c_void, rgba: *const u8, w: u32, h: u32, fade_ms: u32) -> i32 {
        // Safety: tests pass a live `Seen`.
        let seen = unsafe { &mut *(user as *mut Seen) };
        seen.calls.push((rgba.is_null(), w, h, fade_ms));
        seen.status
    }

    #[test]
    fn forwards_bitmaps_fades_and_empty() {
        let mut seen = Seen::default();
        let mut dev = CallbackDevice::new(record, &mut seen as *mut Seen as *mut c_void);
        let bitmap = Arc::new(BitmapResource::new(2, 1, vec![0; 8]));

        dev.draw(&Drawable::Bitmap(bitmap.clone())).unwrap();
        dev.draw(&Drawable::Fade(FadeTransition::from_placeholder(bitmap, Duration::from_millis(200))))
            .unwrap();
        dev.draw(&Drawable::Empty).unwrap();

        assert_eq!(
            seen.calls,
            vec![(false, 2, 1, 0), (false, 2, 1, 200), (true, 0, 0, 0)]
        );
    }

    #[test]
    fn nonzero_status_is_an_error() {
        let mut seen = Seen { status: -3, ..Seen::default() };
        let mut dev = CallbackDevice::new(record, &mut seen as *mut Seen as *mut c_void);
        assert_eq!(dev.draw(&Drawable::Empty), Err(RenderError::Callback(-3)));
    }
}
