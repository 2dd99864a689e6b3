use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable that pins the data directory.
pub const DATA_DIR_ENV: &str = "HAVEN_DATA_DIR";

/// Resolves where Haven keeps its files.
///
/// The layout is portable: everything lives under a `data` directory next to
/// the executable unless `HAVEN_DATA_DIR` says otherwise.
pub struct PortablePathManager;

impl PortablePathManager {
    /// Directory holding the executable, or the working directory if that is unknown.
    pub fn root_dir() -> PathBuf {
        #[cfg(debug_assertions)]
        {
            // target/debug/haven -> workspace root -> apps/core
            if let Ok(mut path) = std::env::current_exe() {
                path.pop();
                path.pop();
                path.pop();
                let core_path = path.join("apps").join("core");
                if core_path.exists() {
                    return core_path;
                }
            }
        }

        match std::env::current_exe() {
            Ok(mut path) => {
                path.pop();
                path
            }
            Err(e) => {
                error!(
                    "Failed to get current exe path: {}. Falling back to current_dir.",
                    e
                );
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            }
        }
    }

    /// Main data directory (`./data`, or `HAVEN_DATA_DIR`).
    pub fn data_dir() -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => Self::root_dir().join("data"),
        }
    }

    /// SQLite file for the persisted records inside `data_dir`.
    pub fn db_file(data_dir: &Path) -> PathBuf {
        data_dir.join("haven.sqlite")
    }

    /// Creates `data_dir` if it does not exist yet.
    pub fn init(data_dir: &Path) -> Result<(), std::io::Error> {
        if !data_dir.exists() {
            info!("Creating data directory: {:?}", data_dir);
            fs::create_dir_all(data_dir)?;
        }
        Ok(())
    }
}
