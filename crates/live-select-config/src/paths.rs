use anyhow::Result;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the run's category in list file paths.
pub const CATEGORY_PLACEHOLDER: &str = "{category}";

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("SEEDPICK_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

/// Substitute `{category}` in `template` and anchor relative paths at `base_dir`.
pub fn resolve_category_path(template: &Path, category: &str, base_dir: Option<&Path>) -> PathBuf {
    let raw = template.to_string_lossy();
    let resolved = if raw.contains(CATEGORY_PLACEHOLDER) {
        PathBuf::from(raw.replace(CATEGORY_PLACEHOLDER, category))
    } else {
        template.to_path_buf()
    };

    match base_dir {
        Some(base) if resolved.is_relative() => base.join(resolved),
        _ => resolved,
    }
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("seedpick");

        Ok(Self {
            config_dir: base_dir.clone(),
            data_dir: base_dir.join("data"),
            log_dir: base_dir.join("logs"),
        })
    }

    pub fn from_docker_env() -> Self {
        let base = container_base_path();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    /// Root everything under an explicit directory (tests, portable installs).
    pub fn with_base(base: &Path) -> Self {
        Self {
            config_dir: base.to_path_buf(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn default_exclusion_file(&self) -> PathBuf {
        self.data_dir.join("excl.txt")
    }

    pub fn default_visit_history_file(&self) -> PathBuf {
        self.data_dir.join("rvl.txt")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory; its presence means Docker
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_category_path_substitutes_placeholder() {
        let path = resolve_category_path(Path::new("excl_{category}.txt"), "Official", None);
        assert_eq!(path, PathBuf::from("excl_Official.txt"));
    }

    #[test]
    fn test_resolve_category_path_anchors_relative_paths() {
        let path = resolve_category_path(Path::new("rvl.txt"), "Free", Some(Path::new("/etc/seedpick")));
        assert_eq!(path, PathBuf::from("/etc/seedpick/rvl.txt"));

        let path = resolve_category_path(Path::new("/var/lib/rvl.txt"), "Free", Some(Path::new("/etc/seedpick")));
        assert_eq!(path, PathBuf::from("/var/lib/rvl.txt"));
    }

    #[test]
    fn test_path_manager_with_base() {
        let pm = PathManager::with_base(Path::new("/tmp/sp"));
        assert_eq!(pm.config_file(), PathBuf::from("/tmp/sp/config.toml"));
        assert_eq!(pm.default_visit_history_file(), PathBuf::from("/tmp/sp/data/rvl.txt"));
        assert_eq!(pm.default_exclusion_file(), PathBuf::from("/tmp/sp/data/excl.txt"));
    }
}
