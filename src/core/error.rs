//! Exposes the deimos error type

use std::ffi::NulError;

use ash;
use thiserror::Error;

/// Error type that deimos can return. Every variant is fatal to the negotiation:
/// capabilities do not change within a process lifetime, so a retry is expected to
/// fail identically. The caller logs the error and exits.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load the Vulkan library.
    #[error("Failed to load Vulkan.")]
    LoadingFailed(ash::LoadingError),
    /// Could not convert rust string to C-String because it has null bytes
    #[error("Invalid C string")]
    InvalidString(NulError),
    /// Generic Vulkan error type, reported when the driver rejects an otherwise
    /// valid creation request.
    #[error("Vulkan error: `{0}`")]
    VkError(ash::vk::Result),
    /// A required instance or device extension is missing from the host-reported
    /// supported set.
    #[error("The required extension `{0}` is not supported by the graphics API.")]
    ExtensionNotSupported(String),
    /// No physical device survived capability filtering.
    #[error("No physical device found matching requirements.")]
    NoSuitableDevice,
    /// The selected device exposes no queue family with graphics support. Filtering
    /// should rule this out, so hitting it indicates inconsistent driver reports.
    #[error("No queue family with graphics support on the selected device.")]
    NoGraphicsQueue,
}

impl From<ash::LoadingError> for Error {
    fn from(value: ash::LoadingError) -> Self {
        Error::LoadingFailed(value)
    }
}

impl From<NulError> for Error {
    fn from(value: NulError) -> Self {
        Error::InvalidString(value)
    }
}

impl From<ash::vk::Result> for Error {
    fn from(value: ash::vk::Result) -> Self {
        Error::VkError(value)
    }
}
