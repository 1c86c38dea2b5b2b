//! The device selector. Filters enumerated physical devices by extension and
//! queue capabilities, scores the survivors, and keeps the winner's capability
//! snapshot for logical device creation.

use std::ffi::CString;

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::core::instance::{supports_extension, ExtensionProperties, TARGET_API_VERSION};
use crate::util::string::wrap_c_str;
use crate::{AppSettings, Instance, Surface};

/// Capabilities of one queue family. Surface present support is not a static
/// device property; it is queried against a concrete surface and folded in here,
/// so the list must be rebuilt if the surface ever changes.
#[derive(Debug, Default, Copy, Clone)]
pub struct QueueFamilyInfo {
    /// Operation categories supported by every queue in this family.
    pub flags: vk::QueueFlags,
    /// Whether queues of this family can present to the surface the selection
    /// ran against.
    pub can_present: bool,
    /// Number of queues that can be created in this family.
    pub count: u32,
}

/// A physical device abstracts away an actual device, like a graphics card or
/// integrated graphics card, together with the capability snapshot taken when it
/// was selected. The handle is owned by the Vulkan runtime, not by this struct.
#[derive(Default, Debug)]
pub struct PhysicalDevice {
    handle: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    /// Available device extensions, as reported by the driver.
    extension_properties: Vec<ExtensionProperties>,
    /// Extension names that will be enabled on the logical device, required
    /// ones first.
    enabled_extensions: Vec<CString>,
    queue_families: Vec<QueueFamilyInfo>,
}

impl PhysicalDevice {
    /// Selects a physical device matching the given requirements.
    ///
    /// Candidates are inspected in enumeration order. The first eligible
    /// discrete GPU ends the search immediately; when no discrete device
    /// exists, the last eligible candidate wins. Enumeration order from the
    /// host is treated as a weak preference signal, nothing more.
    ///
    /// Requires a live `surface`, since eligibility includes the ability to
    /// present to it.
    pub fn select(instance: &Instance, surface: &Surface, settings: &AppSettings) -> Result<Self> {
        let required = required_extensions(settings)?;
        let optional = settings
            .gpu_requirements
            .optional_device_extensions
            .iter()
            .map(|name| CString::new(name.clone()).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;

        let devices = unsafe { instance.enumerate_physical_devices().map_err(Error::from)? };
        let mut device = select_from(
            devices
                .into_iter()
                .map(|handle| Self::query(instance, surface, handle)),
            &required,
        )?;

        device.enabled_extensions =
            enabled_device_extensions(&required, &optional, &device.extension_properties);

        let name = unsafe { wrap_c_str(device.properties.device_name.as_ptr()) };
        info!(
            "Selected physical device {:?}, driver version {}.",
            name, device.properties.driver_version
        );
        info!("Enabled device extensions:");
        for ext in &device.enabled_extensions {
            info!("{:?}", ext);
        }
        Ok(device)
    }

    /// Takes the full capability snapshot of one candidate device.
    fn query(instance: &Instance, surface: &Surface, handle: vk::PhysicalDevice) -> Result<Self> {
        let extension_properties = unsafe {
            instance
                .enumerate_device_extension_properties(handle)
                .map_err(Error::from)?
                .iter()
                .map(|properties| ExtensionProperties {
                    name: wrap_c_str(properties.extension_name.as_ptr()),
                    spec_version: properties.spec_version,
                })
                .collect()
        };

        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(handle) }
            .iter()
            .enumerate()
            .map(|(index, family)| {
                let can_present = unsafe {
                    surface
                        .get_physical_device_surface_support(handle, index as u32, surface.handle())
                        .map_err(Error::from)?
                };
                Ok(QueueFamilyInfo {
                    flags: family.queue_flags,
                    can_present,
                    count: family.queue_count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PhysicalDevice {
            handle,
            properties: unsafe { instance.get_physical_device_properties(handle) },
            features: unsafe { instance.get_physical_device_features(handle) },
            extension_properties,
            enabled_extensions: Vec::new(),
            queue_families,
        })
    }

    /// A candidate is eligible iff it reports a recent enough API version,
    /// supports every required extension, and its queue families cover
    /// graphics, compute and presentation.
    fn is_eligible(&self, required_extensions: &[CString]) -> bool {
        let supports_required = required_extensions
            .iter()
            .all(|name| supports_extension(name, &self.extension_properties));
        let supports_graphics = self
            .queue_families
            .iter()
            .any(|family| family.flags.contains(vk::QueueFlags::GRAPHICS));
        let supports_compute = self
            .queue_families
            .iter()
            .any(|family| family.flags.contains(vk::QueueFlags::COMPUTE));
        let supports_presentation = self.queue_families.iter().any(|family| family.can_present);

        self.properties.api_version >= TARGET_API_VERSION
            && supports_required
            && supports_graphics
            && supports_compute
            && supports_presentation
    }

    /// Get all queue families available on this device, with present support
    /// relative to the selection surface folded into each entry.
    pub fn queue_families(&self) -> &[QueueFamilyInfo] {
        self.queue_families.as_slice()
    }

    /// The device extensions reported as supported.
    pub fn supported_extensions(&self) -> &[ExtensionProperties] {
        self.extension_properties.as_slice()
    }

    /// The device extensions to enable, required ones first.
    pub fn enabled_extensions(&self) -> &[CString] {
        self.enabled_extensions.as_slice()
    }

    /// Get unsafe access to the physical device handle.
    pub unsafe fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    /// The full feature set the device supports. Logical device creation
    /// requests all of it unconditionally.
    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }
}

/// Device extensions that must be present: `VK_KHR_swapchain` plus whatever the
/// application listed as required.
fn required_extensions(settings: &AppSettings) -> Result<Vec<CString>> {
    let mut required = vec![CString::from(ash::extensions::khr::Swapchain::name())];
    for name in &settings.gpu_requirements.device_extensions {
        required.push(CString::new(name.clone()).map_err(Error::from)?);
    }
    Ok(required)
}

/// Required extensions first (already verified during filtering), then any
/// supported optional ones. Unsupported optionals are dropped silently.
fn enabled_device_extensions(
    required: &[CString],
    optional: &[CString],
    supported: &[ExtensionProperties],
) -> Vec<CString> {
    let mut enabled = required.to_vec();
    for name in optional {
        if supports_extension(name, supported) && !enabled.contains(name) {
            enabled.push(name.clone());
        }
    }
    enabled
}

/// The selection scan over candidates in enumeration order. Kept separate from
/// the Vulkan queries so the fallback rules are checkable in isolation.
fn select_from(
    candidates: impl IntoIterator<Item = Result<PhysicalDevice>>,
    required_extensions: &[CString],
) -> Result<PhysicalDevice> {
    let mut selected = None;
    for candidate in candidates {
        let candidate = candidate?;
        if !candidate.is_eligible(required_extensions) {
            continue;
        }
        let discrete = candidate.properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
        selected = Some(candidate);
        if discrete {
            // Greedy, not globally optimal: accept the first discrete device
            // rather than scoring the remaining candidates.
            break;
        }
    }
    selected.ok_or_else(|| anyhow::Error::from(Error::NoSuitableDevice))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, can_present: bool, count: u32) -> QueueFamilyInfo {
        QueueFamilyInfo {
            flags,
            can_present,
            count,
        }
    }

    fn all_in_one_family() -> Vec<QueueFamilyInfo> {
        vec![family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            true,
            1,
        )]
    }

    fn candidate(device_type: vk::PhysicalDeviceType, families: Vec<QueueFamilyInfo>) -> PhysicalDevice {
        let mut properties = vk::PhysicalDeviceProperties::default();
        properties.api_version = TARGET_API_VERSION;
        properties.device_type = device_type;
        PhysicalDevice {
            properties,
            queue_families: families,
            ..Default::default()
        }
    }

    #[test]
    fn discrete_device_wins_regardless_of_enumeration_order() {
        for discrete_position in 0..3 {
            let candidates = (0..3)
                .map(|index| {
                    let device_type = if index == discrete_position {
                        vk::PhysicalDeviceType::DISCRETE_GPU
                    } else {
                        vk::PhysicalDeviceType::INTEGRATED_GPU
                    };
                    Ok(candidate(device_type, all_in_one_family()))
                })
                .collect::<Vec<_>>();
            let selected = select_from(candidates, &[]).unwrap();
            assert_eq!(
                selected.properties.device_type,
                vk::PhysicalDeviceType::DISCRETE_GPU
            );
        }
    }

    #[test]
    fn last_eligible_candidate_wins_without_discrete_device() {
        let mut first = candidate(vk::PhysicalDeviceType::INTEGRATED_GPU, all_in_one_family());
        first.properties.device_id = 1;
        let mut second = candidate(vk::PhysicalDeviceType::VIRTUAL_GPU, all_in_one_family());
        second.properties.device_id = 2;
        let selected = select_from(vec![Ok(first), Ok(second)], &[]).unwrap();
        assert_eq!(selected.properties.device_id, 2);
    }

    #[test]
    fn search_stops_at_first_discrete_device() {
        let mut early = candidate(vk::PhysicalDeviceType::DISCRETE_GPU, all_in_one_family());
        early.properties.device_id = 1;
        let mut late = candidate(vk::PhysicalDeviceType::DISCRETE_GPU, all_in_one_family());
        late.properties.device_id = 2;
        let selected = select_from(vec![Ok(early), Ok(late)], &[]).unwrap();
        assert_eq!(selected.properties.device_id, 1);
    }

    #[test]
    fn no_eligible_candidate_is_fatal() {
        let no_compute = candidate(
            vk::PhysicalDeviceType::DISCRETE_GPU,
            vec![family(vk::QueueFlags::GRAPHICS, true, 1)],
        );
        let err = select_from(vec![Ok(no_compute)], &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NoSuitableDevice)
        ));
    }

    #[test]
    fn missing_required_extension_rejects_candidate() {
        let device = candidate(vk::PhysicalDeviceType::DISCRETE_GPU, all_in_one_family());
        let required = vec![CString::new("VK_KHR_swapchain").unwrap()];
        assert!(!device.is_eligible(&required));
    }

    #[test]
    fn outdated_api_version_rejects_candidate() {
        let mut device = candidate(vk::PhysicalDeviceType::DISCRETE_GPU, all_in_one_family());
        device.properties.api_version = vk::API_VERSION_1_0;
        assert!(!device.is_eligible(&[]));
    }

    #[test]
    fn presentation_support_is_required() {
        let device = candidate(
            vk::PhysicalDeviceType::DISCRETE_GPU,
            vec![family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
                false,
                1,
            )],
        );
        assert!(!device.is_eligible(&[]));
    }

    #[test]
    fn optional_device_extensions_follow_required_ones() {
        let supported = vec![
            ExtensionProperties {
                name: String::from("VK_KHR_swapchain"),
                spec_version: 70,
            },
            ExtensionProperties {
                name: String::from("VK_EXT_memory_budget"),
                spec_version: 1,
            },
        ];
        let required = vec![CString::new("VK_KHR_swapchain").unwrap()];
        let optional = vec![
            CString::new("VK_EXT_memory_budget").unwrap(),
            CString::new("VK_EXT_not_supported").unwrap(),
        ];
        let enabled = enabled_device_extensions(&required, &optional, &supported);
        assert_eq!(
            enabled,
            vec![
                CString::new("VK_KHR_swapchain").unwrap(),
                CString::new("VK_EXT_memory_budget").unwrap(),
            ]
        );
    }
}
