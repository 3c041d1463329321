use std::{
    path::Path,
    sync::{Mutex, MutexGuard, OnceLock},
};

const ASSET_DIR_ENV: &str = "CATALOG_ASSET_DIR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Points the asset directory and database at a scratch location for the
/// lifetime of the guard, restoring the previous values on drop.
pub struct TestEnvGuard {
    _lock: MutexGuard<'static, ()>,
    previous: Vec<(&'static str, Option<String>)>,
}

impl TestEnvGuard {
    pub fn new(asset_dir: &Path, db_url: String) -> Self {
        let lock = test_lock().lock().unwrap_or_else(|err| err.into_inner());
        let previous = [ASSET_DIR_ENV, DATABASE_URL_ENV]
            .into_iter()
            .map(|name| (name, std::env::var(name).ok()))
            .collect();

        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            std::env::set_var(ASSET_DIR_ENV, asset_dir);
            std::env::set_var(DATABASE_URL_ENV, db_url);
        }

        Self {
            _lock: lock,
            previous,
        }
    }
}

impl Drop for TestEnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.previous {
            // SAFETY: tests using TestEnvGuard are serialized by test_lock.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }
}
