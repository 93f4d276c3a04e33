//! Part catalogs decoded from the resource descriptor
//!
//! The descriptor is a JSON document of the form
//!
//! ```json
//! { "parts": { "skin": [{ "key": "000", "possibility": 3, "scoreFactor": 1.5 }], ... } }
//! ```
//!
//! Decoding is forgiving: malformed entries fall back to
//! defaults and a missing or empty layer falls back to a fixed-size
//! catalog with uniform odds, so generation always has something to draw.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::ops::Index;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Default weight for a part whose `possibility` is absent or not finite.
pub const DEFAULT_POSSIBILITY: f64 = 1.0;

/// Default rarity contribution for a part whose `scoreFactor` is absent or not finite.
pub const DEFAULT_SCORE_FACTOR: f64 = 1.0;

/// One of the four visual part categories, in composite order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Skin,
    Face,
    Face2,
    Hair,
}

impl Layer {
    /// All layers, bottom to top.
    pub const ALL: [Layer; 4] = [Layer::Skin, Layer::Face, Layer::Face2, Layer::Hair];

    /// Name used in the resource descriptor and asset directory layout.
    pub fn name(self) -> &'static str {
        match self {
            Layer::Skin => "skin",
            Layer::Face => "face",
            Layer::Face2 => "face2",
            Layer::Hair => "hair",
        }
    }

    /// Part count assumed when the descriptor has nothing for this layer.
    pub fn default_part_count(self) -> usize {
        match self {
            Layer::Skin => 9,
            Layer::Face => 9,
            Layer::Face2 => 12,
            Layer::Hair => 26,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layer {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skin" => Ok(Layer::Skin),
            "face" => Ok(Layer::Face),
            "face2" => Ok(Layer::Face2),
            "hair" => Ok(Layer::Hair),
            other => Err(CatalogError::UnknownLayer(other.to_string())),
        }
    }
}

/// Error type for loading a resource descriptor.
///
/// Only I/O and JSON syntax problems are errors. Anything that parses is
/// accepted and normalized.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read resource descriptor: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse resource descriptor: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown layer '{0}' (expected skin, face, face2 or hair)")]
    UnknownLayer(String),
}

/// A single selectable part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartEntry {
    /// Asset key, used as the image file stem.
    pub key: String,
    /// Selection weight. May be negative in the descriptor; selection clamps it.
    pub possibility: f64,
    /// Additive rarity contribution.
    pub score_factor: f64,
}

impl PartEntry {
    /// Entry with default weight and score factor.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            possibility: DEFAULT_POSSIBILITY,
            score_factor: DEFAULT_SCORE_FACTOR,
        }
    }

    fn from_value(index: usize, value: &Value) -> Self {
        let key = match value.get("key") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => padded_key(index),
        };
        Self {
            key,
            possibility: finite_or(value.get("possibility"), DEFAULT_POSSIBILITY),
            score_factor: finite_or(value.get("scoreFactor"), DEFAULT_SCORE_FACTOR),
        }
    }
}

/// Zero-padded 3-digit key used when no explicit key is available.
pub fn padded_key(index: usize) -> String {
    format!("{:03}", index)
}

fn finite_or(value: Option<&Value>, default: f64) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Ordered, immutable sequence of parts for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PartCatalog {
    layer: Layer,
    entries: Vec<PartEntry>,
    /// False when the catalog was synthesized without descriptor data.
    weighted: bool,
}

impl PartCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// An empty entry list yields the fallback catalog for the layer.
    pub fn new(layer: Layer, entries: Vec<PartEntry>) -> Self {
        if entries.is_empty() {
            return Self::fallback(layer);
        }
        Self {
            layer,
            entries,
            weighted: true,
        }
    }

    /// Default-sized catalog with padded keys and no weights.
    pub fn fallback(layer: Layer) -> Self {
        let entries = (0..layer.default_part_count()).map(|i| PartEntry::with_key(padded_key(i))).collect();
        Self {
            layer,
            entries,
            weighted: false,
        }
    }

    /// Decode a layer's part list. Non-array values give the fallback catalog.
    pub fn from_value(layer: Layer, value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => {
                let entries = items.iter().enumerate().map(|(i, v)| PartEntry::from_value(i, v)).collect();
                Self::new(layer, entries)
            }
            _ => Self::fallback(layer),
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Number of parts. Always at least one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the catalog came from descriptor data rather than the fallback.
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    pub fn entries(&self) -> &[PartEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PartEntry> {
        self.entries.get(index)
    }

    /// Selection weights, or `None` when the layer has no descriptor data.
    pub fn weights(&self) -> Option<Vec<f64>> {
        self.weighted.then(|| self.entries.iter().map(|e| e.possibility).collect())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    /// Asset key for `index`, falling back to the padded index.
    pub fn key(&self, index: usize) -> String {
        self.entries.get(index).map(|e| e.key.clone()).unwrap_or_else(|| padded_key(index))
    }

    /// Score factor for `index`, 1.0 when out of range or not finite.
    pub fn score_factor(&self, index: usize) -> f64 {
        self.entries
            .get(index)
            .map(|e| e.score_factor)
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_SCORE_FACTOR)
    }
}

/// One catalog per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogs {
    layers: [PartCatalog; 4],
}

impl Catalogs {
    /// Catalogs for every layer built from explicit parts.
    pub fn new(skin: PartCatalog, face: PartCatalog, face2: PartCatalog, hair: PartCatalog) -> Self {
        Self {
            layers: [skin, face, face2, hair],
        }
    }

    /// Catalogs used when no descriptor is available at all.
    pub fn fallback() -> Self {
        Self {
            layers: Layer::ALL.map(PartCatalog::fallback),
        }
    }

    /// Build catalogs from a parsed descriptor document.
    pub fn from_value(root: &Value) -> Self {
        let parts = root.get("parts");
        Self {
            layers: Layer::ALL.map(|layer| PartCatalog::from_value(layer, parts.and_then(|p| p.get(layer.name())))),
        }
    }

    /// Parse a descriptor from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let root: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&root))
    }

    /// Read and parse a descriptor file.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        let catalogs = Self::from_json_str(&contents)?;
        for catalog in catalogs.iter() {
            if !catalog.is_weighted() {
                tracing::warn!(
                    layer = %catalog.layer(),
                    parts = catalog.len(),
                    "descriptor has no parts for layer, using default catalog"
                );
            }
        }
        Ok(catalogs)
    }

    pub fn get(&self, layer: Layer) -> &PartCatalog {
        &self.layers[layer.slot()]
    }

    /// Catalogs in composite order.
    pub fn iter(&self) -> impl Iterator<Item = &PartCatalog> {
        self.layers.iter()
    }
}

impl Default for Catalogs {
    fn default() -> Self {
        Self::fallback()
    }
}

impl Index<Layer> for Catalogs {
    type Output = PartCatalog;

    fn index(&self, layer: Layer) -> &PartCatalog {
        self.get(layer)
    }
}
