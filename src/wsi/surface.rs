//! Wrappers around a `VkSurfaceKHR`

use std::ops::Deref;

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::{Instance, PhysicalDevice, Window};

/// A presentation surface bound to a native window, together with the support
/// details queried for it. Capabilities, formats and present modes vary per
/// physical device, so they are empty until [`Surface::query_details`] runs
/// against the selected one, and must be re-queried on swap chain recreation
/// since the capability ranges track the window.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Surface {
    handle: vk::SurfaceKHR,
    capabilities: vk::SurfaceCapabilitiesKHR,
    formats: Vec<vk::SurfaceFormatKHR>,
    present_modes: Vec<vk::PresentModeKHR>,
    #[derivative(Debug = "ignore")]
    functions: ash::extensions::khr::Surface,
}

impl Surface {
    /// Create a new surface for the given window. Requires the instance to have
    /// been created with the surface extensions the window system needs, which
    /// the instance negotiator guarantees.
    pub fn new(instance: &Instance, window: &dyn Window) -> Result<Self> {
        let functions = ash::extensions::khr::Surface::new(unsafe { instance.loader() }, instance);
        let handle = unsafe {
            ash_window::create_surface(
                instance.loader(),
                instance,
                window.raw_display_handle(),
                window.raw_window_handle(),
                None,
            )
            .map_err(Error::from)?
        };
        Ok(Surface {
            handle,
            capabilities: Default::default(),
            formats: vec![],
            present_modes: vec![],
            functions,
        })
    }

    /// Query capabilities, formats and present modes of this surface for the
    /// given physical device.
    pub fn query_details(&mut self, physical_device: &PhysicalDevice) -> Result<()> {
        unsafe {
            self.capabilities = self
                .get_physical_device_surface_capabilities(physical_device.handle(), self.handle)
                .map_err(Error::from)?;
            self.formats = self
                .get_physical_device_surface_formats(physical_device.handle(), self.handle)
                .map_err(Error::from)?;
            self.present_modes = self
                .get_physical_device_surface_present_modes(physical_device.handle(), self.handle)
                .map_err(Error::from)?;
        }
        Ok(())
    }

    /// Get unsafe access to the underlying `VkSurfaceKHR` object.
    /// # Safety
    /// Any vulkan calls that mutate the surface may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// The surface capability snapshot taken by the last `query_details` call.
    pub fn capabilities(&self) -> &vk::SurfaceCapabilitiesKHR {
        &self.capabilities
    }

    /// The supported surface formats, in driver enumeration order.
    pub fn formats(&self) -> &[vk::SurfaceFormatKHR] {
        self.formats.as_slice()
    }

    /// The supported present modes, in driver enumeration order.
    pub fn present_modes(&self) -> &[vk::PresentModeKHR] {
        self.present_modes.as_slice()
    }
}

impl Deref for Surface {
    type Target = ash::extensions::khr::Surface;

    /// Get access to the `VK_KHR_surface` extension functions.
    fn deref(&self) -> &Self::Target {
        &self.functions
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.functions.destroy_surface(self.handle, None);
        }
    }
}
