//! Utilities for generic window handling. The crate never creates or destroys a
//! native window; it only consumes the drawable size and the raw platform
//! handles needed to build a presentation surface.

use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
#[cfg(feature = "winit")]
use winit;

/// Trait for windows that exposes the content width and height of a window.
pub trait WindowSize {
    /// Get the drawable width of the window, in pixels.
    fn width(&self) -> u32;
    /// Get the drawable height of the window, in pixels.
    fn height(&self) -> u32;
}

#[cfg(feature = "winit")]
impl WindowSize for winit::window::Window {
    fn width(&self) -> u32 {
        self.inner_size().width
    }

    fn height(&self) -> u32 {
        self.inner_size().height
    }
}

/// Generic window trait, satisfied by any type that exposes its drawable size
/// and raw display/window handles.
pub trait Window: WindowSize + HasRawDisplayHandle + HasRawWindowHandle {}
impl<T: WindowSize + HasRawDisplayHandle + HasRawWindowHandle> Window for T {}
