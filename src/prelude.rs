pub use ash::vk;

pub use crate::core::app_info::{AppBuilder, AppSettings, GpuRequirements};
pub use crate::core::debug::DebugMessenger;
pub use crate::core::device::Device;
pub use crate::core::error::Error;
pub use crate::core::init::{initialize, VulkanContext};
pub use crate::core::instance::{ExtensionProperties, Instance, TARGET_API_VERSION};
pub use crate::core::physical_device::{PhysicalDevice, QueueFamilyInfo};
pub use crate::core::queue::{DeviceQueues, Queue, QueueAssignment, QueueCreateRecord, QueueSlot};
pub use crate::core::traits::RenderBackend;
pub use crate::sync::fence::Fence;
pub use crate::sync::semaphore::Semaphore;
pub use crate::wsi::surface::Surface;
pub use crate::wsi::swapchain::Swapchain;
pub use crate::wsi::window::{Window, WindowSize};
