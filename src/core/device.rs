//! Wraps logical device creation from a selected physical device and a resolved
//! queue assignment.

use std::ops::Deref;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::core::queue::QueueAssignment;
use crate::util::string::unwrap_to_raw_strings;
use crate::{Instance, PhysicalDevice};

#[derive(Derivative)]
#[derivative(Debug)]
struct DeviceInner {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    queue_families: Vec<u32>,
    properties: vk::PhysicalDeviceProperties,
}

/// Wrapper around a `VkDevice`. Internal state is wrapped in an `Arc`, so this
/// is safe to clone; the `VkDevice` is destroyed when the last clone drops.
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Create the logical device for the given assignment.
    ///
    /// One queue-create record is passed per distinct family in the assignment,
    /// with uniform priority across queues. Every feature the physical device
    /// supports is requested unconditionally; there is no selective feature
    /// negotiation. Creation failure is fatal, with no retry: capabilities do
    /// not change within a process lifetime, so a second attempt would fail
    /// identically.
    pub fn new(
        instance: &Instance,
        physical_device: &PhysicalDevice,
        assignment: &QueueAssignment,
    ) -> Result<Self> {
        let records = assignment.create_records();
        let max_queue_count = records.iter().map(|record| record.count).max().unwrap_or(1);
        let priorities = vec![1.0f32; max_queue_count as usize];
        let queue_create_infos = records
            .iter()
            .map(|record| vk::DeviceQueueCreateInfo {
                queue_family_index: record.family,
                queue_count: record.count,
                p_queue_priorities: priorities.as_ptr(),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        let extension_names_raw = unwrap_to_raw_strings(physical_device.enabled_extensions());
        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(queue_create_infos.as_slice())
            .enabled_extension_names(extension_names_raw.as_slice())
            .enabled_features(physical_device.features())
            .build();

        let handle = unsafe {
            instance
                .create_device(physical_device.handle(), &info, None)
                .map_err(Error::from)?
        };

        Ok(Device {
            inner: Arc::new(DeviceInner {
                handle,
                queue_families: records.iter().map(|record| record.family).collect(),
                properties: *physical_device.properties(),
            }),
        })
    }

    /// Wait for the device to be completely idle.
    /// This should not be used as a synchronization measure, except on exit.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { Ok(self.inner.handle.device_wait_idle().map_err(Error::from)?) }
    }

    /// Get unsafe access to the underlying VkDevice handle.
    /// # Safety
    /// * The caller should not call `vkDestroyDevice` on this.
    /// * This handle is valid as long as there is a copy of `self` alive.
    pub unsafe fn handle(&self) -> ash::Device {
        self.inner.handle.clone()
    }

    /// The queue families that were requested on this device.
    pub fn queue_families(&self) -> &[u32] {
        self.inner.queue_families.as_slice()
    }

    /// Get the device properties.
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.inner.properties
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.inner.handle
    }
}

impl Drop for DeviceInner {
    fn drop(&mut self) {
        unsafe {
            self.handle.destroy_device(None);
        }
    }
}
