use std::{env, path::PathBuf};

use super::StoreError;

/// Per-user directory holding the JSON documents.
///
/// - linux: `$HOME/.config/asmblive/store`
/// - macOS: `$HOME/Library/Asmblive/Store`
/// - windows: `%LOCALAPPDATA%\Asmblive\Store`
pub fn default_store_dir() -> Result<PathBuf, StoreError> {
    if cfg!(target_os = "windows") {
        let base = non_empty_var("LOCALAPPDATA")?;
        Ok(PathBuf::from(base).join("Asmblive").join("Store"))
    } else if cfg!(target_os = "macos") {
        let home = non_empty_var("HOME")?;
        Ok(PathBuf::from(home).join("Library").join("Asmblive").join("Store"))
    } else if cfg!(target_os = "linux") {
        let home = non_empty_var("HOME")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("asmblive")
            .join("store"))
    } else {
        Err(StoreError::Location(format!(
            "unsupported os: {}",
            env::consts::OS
        )))
    }
}

fn non_empty_var(key: &str) -> Result<String, StoreError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StoreError::Location(format!("{key} environment variable not set")))
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_linux_dir_under_home() {
        if let Ok(home) = env::var("HOME")
            && !home.is_empty()
        {
            let dir = default_store_dir().unwrap();
            assert_eq!(dir, PathBuf::from(home).join(".config/asmblive/store"));
        }
    }
}
