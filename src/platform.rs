//! Platform identification.
//!
//! The per-OS behavior in this crate hangs off a single selection point:
//! `current()` classifies the running platform once at startup, and the
//! matching backend is picked from that. Nothing else branches on OS names.

/// The platforms proxysweep knows how to inspect and mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    Unsupported,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "Linux"),
            Platform::Windows => write!(f, "Windows"),
            Platform::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Classify the platform this process is running on.
pub fn current() -> Platform {
    if cfg!(target_os = "linux") {
        Platform::Linux
    } else if cfg!(windows) {
        Platform::Windows
    } else {
        Platform::Unsupported
    }
}

/// Whether the process runs with elevated privileges (root / Administrator).
///
/// Used only to shape messages about files the user cannot touch; the
/// cleaning path re-checks writability per file regardless.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    // Safety: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Whether the process runs with elevated privileges (root / Administrator).
#[cfg(windows)]
pub fn is_elevated() -> bool {
    #[link(name = "shell32")]
    unsafe extern "system" {
        fn IsUserAnAdmin() -> i32;
    }

    unsafe { IsUserAnAdmin() != 0 }
}
