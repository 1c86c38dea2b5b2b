//! The instance negotiator. Reconciles the host-reported layer and extension sets
//! with what the renderer requires, then creates the Vulkan instance.

use std::ffi::{CStr, CString};
use std::ops::Deref;

use anyhow::Result;
use ash;
use ash::vk;

use crate::core::error::Error;
use crate::util::string::{unwrap_to_raw_strings, wrap_c_str};
use crate::AppSettings;

/// The Vulkan version the negotiation targets. Devices reporting an older API
/// version are rejected during filtering.
pub const TARGET_API_VERSION: u32 = vk::API_VERSION_1_1;

/// Diagnostic layer appended when validation is requested. Deliberately not
/// verified against a supported list; if it is unavailable, instance creation
/// reports the failure instead.
const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Stores queried properties of a Vulkan extension.
#[derive(Debug, Default, Clone)]
pub struct ExtensionProperties {
    /// Name of the extension.
    pub name: String,
    /// Specification version of the extension.
    pub spec_version: u32,
}

/// Represents the loaded Vulkan instance, together with the layer and extension
/// sets that were negotiated for it.
///
/// Enabled layer names keep their insertion order (activation order). Enabled
/// extension names list the required ones first, followed by any supported
/// optional ones. Every enabled extension appears in the supported set; layers
/// are accepted unconditionally.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Instance {
    #[derivative(Debug = "ignore")]
    entry: ash::Entry,
    #[derivative(Debug = "ignore")]
    instance: ash::Instance,
    enabled_layers: Vec<CString>,
    supported_extensions: Vec<ExtensionProperties>,
    enabled_extensions: Vec<CString>,
}

impl Instance {
    /// Initializes the Vulkan API.
    /// # Errors
    /// * Can fail if the Vulkan loader was not found. Check for valid Vulkan drivers.
    /// * Fails with [`Error::ExtensionNotSupported`] if a surface extension the
    ///   window system needs is not reported by the host.
    /// * Can fail if validation is enabled but the validation layer is not
    ///   installed, since the layer is passed through unverified.
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let entry = unsafe { ash::Entry::load().map_err(Error::from)? };

        // The host extension list is queried exactly once and kept for later
        // introspection.
        let supported_extensions = entry
            .enumerate_instance_extension_properties(None)
            .map_err(Error::from)?
            .iter()
            .map(|properties| ExtensionProperties {
                name: unsafe { wrap_c_str(properties.extension_name.as_ptr()) },
                spec_version: properties.spec_version,
            })
            .collect::<Vec<_>>();

        let required = surface_extensions(settings)?;
        let mut optional = settings
            .instance_extensions
            .iter()
            .map(|name| CString::new(name.clone()).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;
        if settings.enable_validation {
            optional.push(CString::from(ash::extensions::ext::DebugUtils::name()));
        }

        let enabled_extensions =
            resolve_extensions(&required, &optional, &supported_extensions)?;

        let mut enabled_layers = Vec::new();
        if settings.enable_validation {
            enabled_layers.push(CString::new(VALIDATION_LAYER)?);
        }

        info!("Enabled instance extensions:");
        for ext in &enabled_extensions {
            info!("{:?}", ext);
        }

        let instance = create_vk_instance(&entry, settings, &enabled_layers, &enabled_extensions)?;
        Ok(Instance {
            entry,
            instance,
            enabled_layers,
            supported_extensions,
            enabled_extensions,
        })
    }

    /// Get unsafe access to the vulkan entry point.
    /// # Safety
    /// Any vulkan calls that modify the system's state may put the system in an undefined state.
    pub unsafe fn loader(&self) -> &ash::Entry {
        &self.entry
    }

    /// The extensions the host reported as supported.
    pub fn supported_extensions(&self) -> &[ExtensionProperties] {
        self.supported_extensions.as_slice()
    }

    /// The extensions that were enabled on this instance, required ones first.
    pub fn enabled_extensions(&self) -> &[CString] {
        self.enabled_extensions.as_slice()
    }

    /// The layers that were enabled on this instance, in activation order.
    pub fn enabled_layers(&self) -> &[CString] {
        self.enabled_layers.as_slice()
    }

    /// Whether the given extension was enabled on this instance.
    pub fn extension_enabled(&self, name: &CStr) -> bool {
        self.enabled_extensions.iter().any(|ext| ext.as_c_str() == name)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

impl Deref for Instance {
    type Target = ash::Instance;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

/// The instance extensions the window system needs to create a presentation
/// surface. These are the required set of the negotiation.
fn surface_extensions(settings: &AppSettings) -> Result<Vec<CString>> {
    let raw = ash_window::enumerate_required_extensions(settings.window.raw_display_handle())
        .map_err(Error::from)?;
    Ok(raw
        .iter()
        .map(|&name| unsafe { CString::from(CStr::from_ptr(name)) })
        .collect())
}

pub(crate) fn supports_extension(name: &CStr, supported: &[ExtensionProperties]) -> bool {
    let name = name.to_string_lossy();
    supported.iter().any(|ext| ext.name == name)
}

/// Resolves the enabled extension list against the host-reported supported set.
/// Required extensions must all be present; optional ones are skipped silently
/// when unsupported or already enabled.
fn resolve_extensions(
    required: &[CString],
    optional: &[CString],
    supported: &[ExtensionProperties],
) -> Result<Vec<CString>, Error> {
    let mut enabled = Vec::with_capacity(required.len() + optional.len());

    for name in required {
        if !supports_extension(name, supported) {
            return Err(Error::ExtensionNotSupported(
                name.to_string_lossy().into_owned(),
            ));
        }
        enabled.push(name.clone());
    }

    for name in optional {
        if supports_extension(name, supported) && !enabled.contains(name) {
            enabled.push(name.clone());
        }
    }

    Ok(enabled)
}

fn create_vk_instance(
    entry: &ash::Entry,
    settings: &AppSettings,
    layers: &[CString],
    extensions: &[CString],
) -> Result<ash::Instance> {
    let app_name = CString::new(settings.name.clone())?;
    let engine_name = CString::new("Deimos")?;
    let (major, minor, patch) = settings.version;
    let app_info = vk::ApplicationInfo {
        api_version: TARGET_API_VERSION,
        p_application_name: app_name.as_ptr(),
        p_engine_name: engine_name.as_ptr(),
        application_version: vk::make_api_version(0, major, minor, patch),
        engine_version: vk::make_api_version(0, major, minor, patch),
        ..Default::default()
    };

    let layers_raw = unwrap_to_raw_strings(layers);
    let extensions_raw = unwrap_to_raw_strings(extensions);

    let instance_info = vk::InstanceCreateInfo::builder()
        .application_info(&app_info)
        .enabled_layer_names(layers_raw.as_slice())
        .enabled_extension_names(extensions_raw.as_slice())
        .build();

    Ok(unsafe {
        entry
            .create_instance(&instance_info, None)
            .map_err(Error::from)?
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported(names: &[&str]) -> Vec<ExtensionProperties> {
        names
            .iter()
            .map(|name| ExtensionProperties {
                name: String::from(*name),
                spec_version: 1,
            })
            .collect()
    }

    fn cstrings(names: &[&str]) -> Vec<CString> {
        names.iter().map(|name| CString::new(*name).unwrap()).collect()
    }

    #[test]
    fn required_subset_of_supported_succeeds() {
        let supported = supported(&["VK_KHR_surface", "VK_KHR_win32_surface", "VK_EXT_debug_utils"]);
        let required = cstrings(&["VK_KHR_surface", "VK_KHR_win32_surface"]);
        let enabled = resolve_extensions(&required, &[], &supported).unwrap();
        assert_eq!(enabled, required);
    }

    #[test]
    fn missing_required_extension_is_named() {
        let supported = supported(&["VK_KHR_surface"]);
        let required = cstrings(&["VK_KHR_surface", "VK_KHR_xlib_surface"]);
        let err = resolve_extensions(&required, &[], &supported).unwrap_err();
        match err {
            Error::ExtensionNotSupported(name) => assert_eq!(name, "VK_KHR_xlib_surface"),
            other => panic!("expected ExtensionNotSupported, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_optional_extension_is_skipped_silently() {
        let supported = supported(&["VK_KHR_surface"]);
        let required = cstrings(&["VK_KHR_surface"]);
        let optional = cstrings(&["VK_EXT_debug_utils"]);
        let enabled = resolve_extensions(&required, &optional, &supported).unwrap();
        assert_eq!(enabled, required);
    }

    #[test]
    fn supported_optional_extensions_follow_required_ones() {
        let supported = supported(&["VK_EXT_debug_utils", "VK_KHR_surface"]);
        let required = cstrings(&["VK_KHR_surface"]);
        let optional = cstrings(&["VK_EXT_debug_utils"]);
        let enabled = resolve_extensions(&required, &optional, &supported).unwrap();
        assert_eq!(enabled, cstrings(&["VK_KHR_surface", "VK_EXT_debug_utils"]));
    }

    #[test]
    fn optional_duplicate_of_required_is_not_enabled_twice() {
        let supported = supported(&["VK_KHR_surface"]);
        let required = cstrings(&["VK_KHR_surface"]);
        let optional = cstrings(&["VK_KHR_surface"]);
        let enabled = resolve_extensions(&required, &optional, &supported).unwrap();
        assert_eq!(enabled.len(), 1);
    }
}
