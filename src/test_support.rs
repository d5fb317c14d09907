use std::ffi::OsString;
use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard};

static HOME_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Redirects `HOME` to a test directory and restores it on drop.
///
/// Changing the process environment is global and not thread-safe. The guard
/// holds a lock so tests don't race even if a #[serial] annotation is missed.
pub(crate) struct HomeGuard {
    original: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl HomeGuard {
    pub(crate) fn set(new_home: &Path) -> Self {
        let lock = HOME_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::var_os("HOME");
        // Safety: the lock above serializes every environment mutation in tests.
        unsafe { std::env::set_var("HOME", new_home) };
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        // Safety: still holding the lock until self is fully dropped.
        unsafe {
            match &self.original {
                Some(value) => std::env::set_var("HOME", value),
                None => std::env::remove_var("HOME"),
            }
        }
    }
}

/// Write a file, creating parent directories first.
pub(crate) fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
