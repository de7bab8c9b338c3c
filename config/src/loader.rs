use crate::{ConfigError, SystemConfig};
use regex::Regex;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_FILE_ENV: &str = "SYSCONF_CONFIG_FILE";

/// Loads the file-backed base layer that runtime overrides apply on top of.
pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("sysconf/sysconf.yaml"));
        }
        search_paths.push(PathBuf::from("./sysconf.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/sysconf/sysconf.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    /// Reads `path` (with `~` expanded) instead of searching.
    #[must_use]
    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(shellexpand::tilde(path).as_ref()));
        self
    }

    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Resolves the base configuration.
    ///
    /// `SYSCONF_CONFIG_FILE` wins over an explicit file, which wins over the
    /// search paths. Search-path files are layered in order, later files
    /// overriding earlier ones key by key. Without any file the compiled-in
    /// defaults are returned.
    pub fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut merged = Value::Mapping(serde_yaml::Mapping::new());

        if let Ok(env_path) = std::env::var(CONFIG_FILE_ENV) {
            let path = PathBuf::from(shellexpand::tilde(&env_path).as_ref());
            merge_values(&mut merged, self.read(&path)?);
        } else if let Some(ref explicit) = self.explicit_file {
            merge_values(&mut merged, self.read(explicit)?);
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    tracing::debug!(path = %path.display(), "Loading config layer");
                    merge_values(&mut merged, self.read(path)?);
                }
            }
        }

        Ok(serde_yaml::from_value(merged)?)
    }

    fn read(&self, path: &Path) -> Result<Value, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let expanded = self.expand_env_vars(&content);

        if path.extension().is_some_and(|ext| ext == "json") {
            let json: serde_json::Value = serde_json::from_str(&expanded)?;
            Ok(serde_yaml::to_value(json)?)
        } else {
            Ok(serde_yaml::from_str(&expanded)?)
        }
    }

    fn expand_env_vars(&self, content: &str) -> String {
        let Ok(re) = Regex::new(r"\$\{([^}]+)\}") else {
            return content.to_string();
        };
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string()
    }
}

/// Overlays `overlay` onto `base`: mappings merge key by key, anything else
/// replaces. A null document (an empty file) leaves `base` untouched.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
