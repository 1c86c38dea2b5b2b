//! The wsi module binds the negotiation to a native window: the presentation
//! surface, the swap chain, and the window traits the host must implement.

pub mod surface;
pub mod swapchain;
pub mod window;
