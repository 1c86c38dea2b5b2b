//! Exposes all structs needed to store initialization parameters.

use crate::wsi::window::Window;

/// Requirements the selected physical device must satisfy.
///
/// `VK_KHR_swapchain` is always treated as required and does not need to be listed
/// here.
///
/// # Example
/// ```no_run
/// # use deimos::GpuRequirements;
/// let requirements = GpuRequirements {
///     device_extensions: vec![],
///     optional_device_extensions: vec![String::from("VK_EXT_memory_budget")],
/// };
/// ```
#[derive(Default, Debug)]
pub struct GpuRequirements {
    /// Device extensions that must be present and enabled. A device missing any of
    /// these is rejected during filtering.
    pub device_extensions: Vec<String>,
    /// Device extensions that are enabled only when the selected device supports
    /// them. Absence is silent.
    pub optional_device_extensions: Vec<String>,
}

/// Application settings used to negotiate the rendering context.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct AppSettings<'a> {
    /// Application name. Possibly displayed in debugging tools, task manager, etc.
    pub name: String,
    /// Application version.
    pub version: (u32, u32, u32),
    /// Enable Vulkan validation layers for additional debug output. Defaults to on
    /// for debug builds. The layer is appended without checking availability; if it
    /// is absent, instance creation reports the failure.
    pub enable_validation: bool,
    /// Optional instance extensions, enabled only when the host supports them.
    pub instance_extensions: Vec<String>,
    /// Requirements the selected physical device must satisfy.
    pub gpu_requirements: GpuRequirements,
    /// The window we will present to. Any windowing library works as long as it
    /// exposes the drawable size and raw platform handles.
    #[derivative(Debug = "ignore")]
    pub window: &'a dyn Window,
}

/// Convenience builder for [`AppSettings`].
///
/// # Example
/// ```no_run
/// # use deimos::AppBuilder;
/// # fn build(window: &winit::window::Window) {
/// let settings = AppBuilder::new(window)
///     .name("deimos demo app")
///     .version((0, 1, 0))
///     .validation(true)
///     .build();
/// # }
/// ```
pub struct AppBuilder<'a> {
    inner: AppSettings<'a>,
}

impl<'a> AppBuilder<'a> {
    /// Create a new app builder with default settings, presenting to `window`.
    pub fn new(window: &'a dyn Window) -> Self {
        AppBuilder {
            inner: AppSettings {
                name: String::from(""),
                version: (0, 0, 0),
                enable_validation: cfg!(debug_assertions),
                instance_extensions: Vec::new(),
                gpu_requirements: GpuRequirements::default(),
                window,
            },
        }
    }

    /// Sets the application name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Sets the application version.
    pub fn version(mut self, ver: impl Into<(u32, u32, u32)>) -> Self {
        self.inner.version = ver.into();
        self
    }

    /// Enable or disable the Vulkan validation layers.
    pub fn validation(mut self, val: bool) -> Self {
        self.inner.enable_validation = val;
        self
    }

    /// Request optional instance extensions.
    pub fn instance_extensions(mut self, extensions: impl Into<Vec<String>>) -> Self {
        self.inner.instance_extensions = extensions.into();
        self
    }

    /// The requirements that the physical device must satisfy.
    pub fn gpu(mut self, gpu: GpuRequirements) -> Self {
        self.inner.gpu_requirements = gpu;
        self
    }

    /// Build the resulting application settings.
    pub fn build(self) -> AppSettings<'a> {
        self.inner
    }
}
