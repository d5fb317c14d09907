//! Platform backends: proxy detection and cleaning.
//!
//! One `ProxyBackend` implementation per operating system, selected once at
//! startup from the platform probe. Everything else in the crate is
//! OS-agnostic and works through this trait.

#[cfg(unix)]
pub mod linux;
#[cfg(windows)]
pub mod windows;

use crate::config::CleanOptions;
use crate::platform::Platform;
use crate::report::{CleanReport, Finding};

/// Detection and cleaning interface, one implementation per OS.
pub trait ProxyBackend {
    /// Detect proxy configuration across every known tool/location.
    ///
    /// Side-effect-free and ordered by tool category, so repeated scans
    /// produce comparable lists. Never fails: unreadable locations are
    /// reported as not found.
    fn detect_all(&self) -> Vec<Finding>;

    /// Remove proxy configuration from every enabled category.
    ///
    /// Individual failures become Failed/Skipped outcomes in the report;
    /// the run itself always completes.
    fn clean_all(&self, options: &CleanOptions) -> CleanReport;
}

/// Select the backend for a platform. `None` when the platform is not
/// supported by this build.
pub fn for_platform(platform: Platform) -> Option<Box<dyn ProxyBackend>> {
    match platform {
        #[cfg(unix)]
        Platform::Linux => Some(Box::new(linux::LinuxBackend::new())),
        #[cfg(windows)]
        Platform::Windows => Some(Box::new(windows::WindowsBackend::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn linux_platform_has_a_backend() {
        assert!(for_platform(Platform::Linux).is_some());
    }

    #[test]
    fn unsupported_platform_has_none() {
        assert!(for_platform(Platform::Unsupported).is_none());
    }
}
