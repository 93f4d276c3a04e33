//! Configuration schema types for `charagen.toml`
//!
//! Every section and field is optional; a missing file and an empty file
//! both yield [`CharagenConfig::default`].

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::color::parse_hex_color;
use crate::composition::{MAX_SPRITE_SIZE, SPRITE_SIZE};
use crate::output::{Presentation, DEFAULT_SCALE, MAX_SCALE};
use crate::rarity::{Grade, GradeTable, RarityError};

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Resource descriptor (`{"parts": {...}}`)
    #[serde(default = "default_resources")]
    pub resources: PathBuf,
    /// Root of the part images (`<assets>/<layer>/<key>.png`)
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    /// Directory for generated images
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Generation counter file
    #[serde(default = "default_stats")]
    pub stats: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            resources: default_resources(),
            assets: default_assets(),
            out: default_out(),
            stats: default_stats(),
        }
    }
}

fn default_resources() -> PathBuf {
    PathBuf::from("assets/data/resources.json")
}

fn default_assets() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("output")
}

fn default_stats() -> PathBuf {
    PathBuf::from(".charagen/stats.json")
}

/// Presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Integer upscale factor
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Background color as hex (`#RGB`, `#RRGGBB` or `#RRGGBBAA`)
    #[serde(default = "default_background")]
    pub background: String,
    /// Render onto a transparent surface instead of the background
    #[serde(default)]
    pub transparent: bool,
    /// Edge length of the composited sprite
    #[serde(default = "default_sprite_size")]
    pub sprite_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            background: default_background(),
            transparent: false,
            sprite_size: default_sprite_size(),
        }
    }
}

fn default_scale() -> u32 {
    DEFAULT_SCALE
}

fn default_background() -> String {
    "#f8f9fa".to_string()
}

fn default_sprite_size() -> u32 {
    SPRITE_SIZE
}

/// Grade threshold overrides
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RarityConfig {
    /// Minimum score per grade label, replacing the built-in table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<BTreeMap<String, f64>>,
}

/// Complete charagen.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharagenConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub rarity: RarityConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "render.scale")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "charagen.toml: '{}' {}", self.field, self.message)
    }
}

impl CharagenConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if !(1..=MAX_SCALE).contains(&self.render.scale) {
            errors.push(ConfigValidationError {
                field: "render.scale".to_string(),
                message: format!("must be between 1 and {}", MAX_SCALE),
            });
        }

        if !(1..=MAX_SPRITE_SIZE).contains(&self.render.sprite_size) {
            errors.push(ConfigValidationError {
                field: "render.sprite_size".to_string(),
                message: format!("must be between 1 and {}", MAX_SPRITE_SIZE),
            });
        }

        if let Err(e) = parse_hex_color(&self.render.background) {
            errors.push(ConfigValidationError {
                field: "render.background".to_string(),
                message: format!("is not a valid color: {}", e),
            });
        }

        if let Err(e) = self.grade_table() {
            errors.push(ConfigValidationError {
                field: "rarity.thresholds".to_string(),
                message: e.to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// The grade table in effect: the configured thresholds or the default.
    pub fn grade_table(&self) -> Result<GradeTable, RarityError> {
        let Some(raw) = &self.rarity.thresholds else {
            return Ok(GradeTable::default());
        };
        let mut map = BTreeMap::new();
        for (label, min) in raw {
            let grade: Grade = label.parse()?;
            if map.insert(grade, *min).is_some() {
                return Err(RarityError::Duplicate(grade));
            }
        }
        GradeTable::from_map(&map)
    }

    /// Background color, `None` when rendering transparent.
    pub fn background(&self) -> Option<Rgba<u8>> {
        if self.render.transparent {
            return None;
        }
        parse_hex_color(&self.render.background).ok()
    }

    /// Presentation settings for a sprite-sized surface.
    pub fn presentation(&self) -> Presentation {
        Presentation {
            scale: self.render.scale.max(1),
            background: self.background(),
            surface: None,
        }
    }
}
