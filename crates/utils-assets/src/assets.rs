use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
const ASSET_DIR_ENV: &str = "CATALOG_ASSET_DIR";

pub fn asset_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(ASSET_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            return ensure_dir(PathBuf::from(override_dir));
        }
    }

    let path = if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        match ProjectDirs::from("dev", "catalog-admin", "catalog-admin") {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => PathBuf::from(".catalog-admin"),
        }
    };

    ensure_dir(path)
    // macOS -> ~/Library/Application Support/dev.catalog-admin.catalog-admin
    // Linux -> ~/.local/share/catalog-admin (respects XDG_DATA_HOME)
}

pub fn config_path() -> PathBuf {
    asset_dir().join("config.json")
}

/// Root of the public disk; everything below it is served under `/storage`.
pub fn public_storage_dir() -> PathBuf {
    public_storage_dir_in(&asset_dir())
}

pub fn public_storage_dir_in(asset_dir: &Path) -> PathBuf {
    ensure_dir(asset_dir.join("storage").join("public"))
}

fn ensure_dir(path: PathBuf) -> PathBuf {
    if !path.exists()
        && let Err(err) = std::fs::create_dir_all(&path)
    {
        tracing::warn!(path = %path.display(), error = %err, "Failed to create asset directory");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::public_storage_dir_in;

    #[test]
    fn public_storage_dir_is_created_under_asset_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = public_storage_dir_in(root.path());
        assert!(dir.is_dir());
        assert!(dir.ends_with("storage/public"));
    }
}
