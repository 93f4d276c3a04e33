//! Locating, reading and overriding `charagen.toml`
//!
//! A config is looked up in the working directory and its ancestors, then
//! in the user config directory. Without one, the built-in defaults apply.

use super::schema::{CharagenConfig, ConfigValidationError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery.
pub const CONFIG_FILE_NAME: &str = "charagen.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{} is not valid TOML: {source}", .path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("{} has invalid settings:\n{}", .path.display(), bullet_list(.errors))]
    Validation {
        path: PathBuf,
        errors: Vec<ConfigValidationError>,
    },
}

fn bullet_list(errors: &[ConfigValidationError]) -> String {
    errors.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n")
}

/// Values given on the command line, each replacing its config field.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub scale: Option<u32>,
    pub background: Option<String>,
    pub transparent: Option<bool>,
    pub resources: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub stats: Option<PathBuf>,
}

impl CliOverrides {
    /// Write every present override into `config`.
    pub fn apply_to(&self, config: &mut CharagenConfig) {
        let render = &mut config.render;
        render.scale = self.scale.unwrap_or(render.scale);
        if let Some(background) = &self.background {
            render.background.clone_from(background);
        }
        render.transparent = self.transparent.unwrap_or(render.transparent);

        let project = &mut config.project;
        for (value, target) in [
            (&self.resources, &mut project.resources),
            (&self.assets, &mut project.assets),
            (&self.out, &mut project.out),
            (&self.stats, &mut project.stats),
        ] {
            if let Some(path) = value {
                target.clone_from(path);
            }
        }
    }
}

/// Nearest `charagen.toml` in `start` or any of its ancestors.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// `$XDG_CONFIG_HOME/charagen/charagen.toml`, falling back to `~/.config`.
pub fn user_config() -> Option<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env::var_os("HOME")?).join(".config"),
    };
    Some(base.join("charagen").join(CONFIG_FILE_NAME)).filter(|p| p.is_file())
}

/// Load the explicit config file, or the discovered one, or the defaults.
///
/// Relative project paths in a file are anchored at that file's directory.
pub fn load_config(explicit: Option<&Path>) -> Result<CharagenConfig, ConfigError> {
    let found = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => env::current_dir().ok().and_then(|cwd| discover(&cwd)).or_else(user_config),
    };
    let Some(path) = found else {
        tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
        return Ok(CharagenConfig::default());
    };

    let mut config = read_config(&path)?;
    if let Some(dir) = path.parent() {
        anchor_paths(&mut config, dir);
    }
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn read_config(path: &Path) -> Result<CharagenConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CharagenConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation {
            path: path.to_path_buf(),
            errors,
        })
    }
}

/// Join relative project paths onto `dir`; absolute ones are kept.
fn anchor_paths(config: &mut CharagenConfig, dir: &Path) {
    let project = &mut config.project;
    for path in [&mut project.resources, &mut project.assets, &mut project.out, &mut project.stats] {
        if path.is_relative() {
            *path = dir.join(&*path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with(text: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, text).expect("should write config");
        (temp, path)
    }

    #[test]
    fn test_discover_walks_up_to_project() {
        let (temp, path) = project_with("");
        assert_eq!(discover(temp.path()), Some(path.clone()));

        let nested = temp.path().join("src").join("hair");
        fs::create_dir_all(&nested).expect("should create subdirectories");
        assert_eq!(discover(&nested), Some(path));
    }

    #[test]
    fn test_discover_ignores_directories_with_the_name() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::create_dir(temp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(discover(temp.path()), None);
    }

    #[test]
    fn test_load_anchors_relative_paths() {
        let (temp, path) = project_with(
            r##"
[project]
resources = "data/resources.json"
out = "/abs/out"

[render]
scale = 3
background = "#101010"
"##,
        );

        let config = load_config(Some(&path)).expect("should load valid config");
        assert_eq!(config.render.scale, 3);
        assert_eq!(config.render.background, "#101010");
        assert_eq!(config.project.resources, temp.path().join("data/resources.json"));
        assert_eq!(config.project.assets, temp.path().join("src"));
        assert_eq!(config.project.stats, temp.path().join(".charagen/stats.json"));
        assert_eq!(config.project.out, PathBuf::from("/abs/out"));
    }

    #[test]
    fn test_load_reports_each_failure_kind() {
        let temp = TempDir::new().expect("should create temp dir");
        let missing = temp.path().join("nonexistent.toml");
        assert!(matches!(load_config(Some(&missing)), Err(ConfigError::Io { .. })));

        let (_temp, broken) = project_with("this is not valid toml {{{");
        let err = load_config(Some(&broken)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_collects_every_invalid_field() {
        let (_temp, path) = project_with("[render]\nscale = 500\nbackground = \"nope\"\n");
        match load_config(Some(&path)) {
            Err(ConfigError::Validation { errors, .. }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["render.scale", "render.background"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = CharagenConfig::default();
        CliOverrides {
            scale: Some(2),
            background: Some("#fff".to_string()),
            transparent: Some(true),
            out: Some(PathBuf::from("dist")),
            stats: Some(PathBuf::from("s.json")),
            ..Default::default()
        }
        .apply_to(&mut config);

        assert_eq!(config.render.scale, 2);
        assert_eq!(config.render.background, "#fff");
        assert!(config.render.transparent);
        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.project.stats, PathBuf::from("s.json"));
        assert_eq!(config.project.resources, PathBuf::from("assets/data/resources.json"));
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = CharagenConfig::default();
        CliOverrides::default().apply_to(&mut config);
        assert_eq!(config, CharagenConfig::default());
    }
}
