//! Exposes methods to make initialization of the library easier without losing
//! flexibility.

use anyhow::Result;
use ash::vk;

use crate::{
    AppSettings, DebugMessenger, Device, DeviceQueues, Fence, Instance, PhysicalDevice,
    QueueAssignment, RenderBackend, Semaphore, Surface, Swapchain,
};

/// The fully negotiated rendering context. Owns every object the negotiation
/// created; nothing here is reentrant, and a second concurrent negotiation in
/// the same process is unsupported.
///
/// Field order doubles as teardown order: device-bound objects go first, the
/// surface before the instance that created it. A full device wait-idle runs
/// before any of them is destroyed.
#[derive(Debug)]
pub struct VulkanContext {
    image_available: Semaphore,
    frame_fence: Fence,
    swapchain: Swapchain,
    queues: DeviceQueues,
    assignment: QueueAssignment,
    device: Device,
    physical_device: PhysicalDevice,
    surface: Surface,
    debug_messenger: Option<DebugMessenger>,
    instance: Instance,
}

impl VulkanContext {
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// The four role queues. Handles may alias when a role fell back to the
    /// graphics pair.
    pub fn queues(&self) -> &DeviceQueues {
        &self.queues
    }

    /// The resolved role-to-(family, queue) mapping behind [`Self::queues`].
    pub fn queue_assignment(&self) -> &QueueAssignment {
        &self.assignment
    }

    /// Semaphore signaled when a presentable image becomes available.
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Fence for CPU-side frame pacing, created signaled.
    pub fn frame_fence(&self) -> &Fence {
        &self.frame_fence
    }

    pub fn debug_messenger(&self) -> Option<&DebugMessenger> {
        self.debug_messenger.as_ref()
    }
}

impl RenderBackend for VulkanContext {
    fn negotiate(settings: &AppSettings) -> Result<Self> {
        let instance = Instance::new(settings)?;

        let debug_messenger = if settings.enable_validation
            && instance.extension_enabled(ash::extensions::ext::DebugUtils::name())
        {
            Some(DebugMessenger::new(&instance)?)
        } else {
            None
        };

        // The surface must exist before device selection, since eligibility
        // includes per-family present support against it.
        let mut surface = Surface::new(&instance, settings.window)?;
        let physical_device = PhysicalDevice::select(&instance, &surface, settings)?;
        let assignment = QueueAssignment::new(physical_device.queue_families())?;
        let device = Device::new(&instance, &physical_device, &assignment)?;
        let queues = DeviceQueues::fetch(&device, &assignment);

        let requested_extent = vk::Extent2D {
            width: settings.window.width(),
            height: settings.window.height(),
        };
        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            &physical_device,
            &mut surface,
            requested_extent,
        )?;

        let image_available = Semaphore::new(device.clone())?;
        let frame_fence = Fence::new(device.clone(), true)?;

        Ok(VulkanContext {
            image_available,
            frame_fence,
            swapchain,
            queues,
            assignment,
            device,
            physical_device,
            surface,
            debug_messenger,
            instance,
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        // No in-flight work may reference the old swap chain when it goes away.
        self.device.wait_idle()?;
        self.swapchain.recreate(
            &self.physical_device,
            &mut self.surface,
            vk::Extent2D {
                width,
                height,
            },
        )
    }

    fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        // Guarantees no in-flight GPU work references a handle about to be
        // freed. Runs before any field is destroyed.
        let _ = self.device.wait_idle();
    }
}

/// Negotiate a full Vulkan rendering context for the window in `settings`.
pub fn initialize(settings: &AppSettings) -> Result<VulkanContext> {
    VulkanContext::negotiate(settings)
}
