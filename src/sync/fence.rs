use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::Device;

/// Wrapper around a [`VkFence`](vk::Fence) object. Fences are used for CPU-GPU sync.
#[derive(Debug)]
pub struct Fence {
    device: Device,
    handle: vk::Fence,
}

impl Fence {
    /// Create a new `VkFence` object, optionally in the signaled state.
    pub fn new(device: Device, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let info = vk::FenceCreateInfo::builder().flags(flags).build();
        Ok(Fence {
            handle: unsafe { device.create_fence(&info, None).map_err(Error::from)? },
            device,
        })
    }

    pub unsafe fn handle(&self) -> vk::Fence {
        self.handle
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.handle, None);
        }
    }
}
