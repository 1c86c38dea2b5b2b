//! Defines traits for core

use anyhow::Result;

use crate::AppSettings;

/// Capability-set abstraction over a rendering back end. Exactly one type
/// implements it today ([`VulkanContext`](crate::VulkanContext)); the seam
/// exists so an alternate back end can slot in without touching callers.
pub trait RenderBackend: Sized {
    /// Run the full capability negotiation against the settings' window and
    /// build the renderer-usable context: instance, device, queue assignment,
    /// surface, swap chain and baseline sync primitives.
    fn negotiate(settings: &AppSettings) -> Result<Self>;

    /// Re-run only the presentation negotiation for a new drawable size,
    /// recreating the swap chain. Earlier stages are never re-entered.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Block until the device has finished all in-flight work.
    fn wait_idle(&self) -> Result<()>;
}
