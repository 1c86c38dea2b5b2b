//! The presentation negotiator. Picks a concrete format, present mode, image
//! count and extent from what the surface supports, and owns the resulting
//! swap chain.

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::{Device, Instance, PhysicalDevice, Surface};

/// Chosen when no supported format reports an sRGB color space.
const FALLBACK_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::R8G8B8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Triple buffering. Also what the mailbox present mode wants.
const PREFERRED_IMAGE_COUNT: u32 = 3;

/// A swapchain is an abstraction of a presentation system, bundling the
/// presentable images with the negotiated format, present mode and extent.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Swapchain {
    handle: vk::SwapchainKHR,
    /// Negotiated swapchain image format.
    format: vk::SurfaceFormatKHR,
    /// Negotiated present mode. `FIFO` is the only mode the Vulkan spec
    /// requires to always be supported.
    present_mode: vk::PresentModeKHR,
    /// Usage flags, intersected with what the surface supports.
    usage: vk::ImageUsageFlags,
    transform: vk::SurfaceTransformFlagsKHR,
    /// Number of images requested from the driver, clamped into the supported
    /// range. The driver may create more.
    image_count: u32,
    /// Size of the swapchain images. This is effectively the window render area.
    extent: vk::Extent2D,
    /// Presentable images, owned by the swapchain itself.
    images: Vec<vk::Image>,
    #[derivative(Debug = "ignore")]
    functions: ash::extensions::khr::Swapchain,
    /// Keeps the `VkDevice` alive for as long as the handle exists.
    #[derivative(Debug = "ignore")]
    device: Device,
}

impl Swapchain {
    /// Negotiate the presentation configuration and create a new swap chain.
    ///
    /// Queries the surface support details for the selected device, then picks
    /// format, present mode, usage flags, image count and extent. Any query or
    /// creation failure is fatal; there is no degraded fallback path.
    pub fn new(
        instance: &Instance,
        device: Device,
        physical_device: &PhysicalDevice,
        surface: &mut Surface,
        requested_extent: vk::Extent2D,
    ) -> Result<Self> {
        surface.query_details(physical_device)?;
        let functions = ash::extensions::khr::Swapchain::new(instance, &device);
        Self::create(functions, device, surface, requested_extent, vk::SwapchainKHR::null())
    }

    /// Recreate the swap chain after a surface resize. Re-runs only the
    /// presentation negotiation; instance and device selection are untouched.
    ///
    /// The previous handle is passed to the creation call as a hint and
    /// destroyed only after the new chain exists, so the window never lacks a
    /// valid presentable surface.
    pub fn recreate(
        &mut self,
        physical_device: &PhysicalDevice,
        surface: &mut Surface,
        requested_extent: vk::Extent2D,
    ) -> Result<()> {
        surface.query_details(physical_device)?;
        let replacement = Self::create(
            self.functions.clone(),
            self.device.clone(),
            surface,
            requested_extent,
            self.handle,
        )?;
        // Dropping the previous value destroys the old handle, strictly after
        // the new one was created.
        let _old = std::mem::replace(self, replacement);
        Ok(())
    }

    fn create(
        functions: ash::extensions::khr::Swapchain,
        device: Device,
        surface: &Surface,
        requested_extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<Self> {
        let capabilities = surface.capabilities();
        let format = choose_surface_format(surface.formats());
        let present_mode = choose_present_mode(surface.present_modes());
        let usage = choose_usage_flags(capabilities);
        let transform = vk::SurfaceTransformFlagsKHR::IDENTITY;
        let image_count = choose_image_count(capabilities);
        let extent = choose_extent(capabilities, requested_extent);

        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(unsafe { surface.handle() })
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(usage)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain)
            .build();

        let handle = unsafe { functions.create_swapchain(&info, None).map_err(Error::from)? };
        let images = unsafe { functions.get_swapchain_images(handle).map_err(Error::from)? };

        info!(
            "Created swap chain: {}x{}, {} images, {:?} / {:?}",
            extent.width, extent.height, image_count, format.format, present_mode
        );

        Ok(Swapchain {
            handle,
            format,
            present_mode,
            usage,
            transform,
            image_count,
            extent,
            images,
            functions,
            device,
        })
    }

    /// Unsafe access to the underlying vulkan handle.
    pub unsafe fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Unsafe access to the swapchain extension functions.
    pub unsafe fn loader(&self) -> ash::extensions::khr::Swapchain {
        self.functions.clone()
    }

    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    pub fn usage(&self) -> vk::ImageUsageFlags {
        self.usage
    }

    pub fn transform(&self) -> vk::SurfaceTransformFlagsKHR {
        self.transform
    }

    pub fn image_count(&self) -> u32 {
        self.image_count
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// The presentable images. Owned by the swapchain, not the application.
    pub fn images(&self) -> &[vk::Image] {
        self.images.as_slice()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.functions.destroy_swapchain(self.handle, None);
        }
    }
}

/// Prefer sRGB. The scan keeps the last matching entry in enumeration order
/// rather than stopping at the first.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let mut format = FALLBACK_FORMAT;
    for candidate in formats {
        if candidate.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR {
            format = *candidate;
        }
    }
    format
}

/// `FIFO` is always available; upgrade to `MAILBOX` if the device reports it
/// anywhere in the list. Neither mode tears.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    let mut mode = vk::PresentModeKHR::FIFO;
    for candidate in present_modes {
        if *candidate == vk::PresentModeKHR::MAILBOX {
            mode = *candidate;
        }
    }
    mode
}

/// Color writes and clears, intersected with what the surface supports. A
/// strict subset is accepted as-is.
fn choose_usage_flags(capabilities: &vk::SurfaceCapabilitiesKHR) -> vk::ImageUsageFlags {
    (vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
        & capabilities.supported_usage_flags
}

/// Request triple buffering, clamped into the supported range. A maximum of 0
/// means the surface does not bound the image count.
fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = PREFERRED_IMAGE_COUNT.max(capabilities.min_image_count);
    if capabilities.max_image_count != 0 {
        count = count.min(capabilities.max_image_count);
    }
    count
}

/// A current extent width of `u32::MAX` means the surface size is driven by the
/// swap chain; anything else is fixed by the host and overrides the request.
fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: requested.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}
