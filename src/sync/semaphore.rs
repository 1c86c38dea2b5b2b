use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::Device;

/// Wrapper around a [`VkSemaphore`](vk::Semaphore) object. Semaphores are used for GPU-GPU sync.
#[derive(Debug)]
pub struct Semaphore {
    device: Device,
    handle: vk::Semaphore,
}

impl Semaphore {
    /// Create a new `VkSemaphore` object.
    pub fn new(device: Device) -> Result<Self> {
        let info = vk::SemaphoreCreateInfo::builder().build();
        Ok(Semaphore {
            handle: unsafe { device.create_semaphore(&info, None).map_err(Error::from)? },
            device,
        })
    }

    pub unsafe fn handle(&self) -> vk::Semaphore {
        self.handle
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.handle, None);
        }
    }
}
