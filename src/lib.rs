//! Vulkan capability negotiation and rendering context bootstrap
//!
//! Deimos reconciles heterogeneous, vendor-specific capability reports —
//! extension lists, queue family flag combinations, surface format and present
//! mode sets, image count and extent ranges — into one consistent,
//! renderer-usable configuration, with deterministic fallback rules when the
//! ideal configuration is unavailable. It builds exactly the object set a
//! renderer needs before the first frame: instance, physical and logical
//! device, queue role assignment, presentation surface, swap chain and
//! baseline synchronization primitives. Drawing frames is somebody else's job.
//!
//! Negotiation runs once, in strict dependency order: instance → surface →
//! device and queues → swap chain. Only the swap chain stage is ever
//! re-entered, on window resize. Every failure is fatal to the negotiation —
//! capabilities do not change within a process lifetime — and is propagated as
//! a [`Result`](anyhow::Result) for the caller to log and exit on.
//!
//! # Example
//!
//! Any windowing library can be used by implementing the
//! [`Window`](crate::Window) trait; for winit it is already provided.
//! ```no_run
//! use anyhow::Result;
//! use winit::event_loop::EventLoop;
//! use winit::window::WindowBuilder;
//!
//! use deimos::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let event_loop = EventLoop::new();
//!     let window = WindowBuilder::new()
//!         .with_title("deimos app")
//!         .build(&event_loop)?;
//!
//!     let settings = AppBuilder::new(&window)
//!         .name("deimos app")
//!         .version((0, 1, 0))
//!         .build();
//!
//!     // Runs the full negotiation: instance, device, queues, swap chain.
//!     let context = deimos::initialize(&settings)?;
//!     let extent = context.swapchain().extent();
//!     println!("negotiated a {}x{} swap chain", extent.width, extent.height);
//!
//!     // Teardown happens in dependency order when the context drops, after a
//!     // device wait-idle.
//!     context.wait_idle()?;
//!     Ok(())
//! }
//! ```

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod sync;
pub mod util;
pub mod wsi;
