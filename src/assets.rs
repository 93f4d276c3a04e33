//! Part image loading and caching
//!
//! Images are resolved per layer and part index through a
//! [`PartImageSource`]. [`ImageCache`] wraps a source and memoizes every
//! successful load; it is owned by the caller and passed in explicitly.

use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{Catalogs, Layer};
use crate::generator::Draw;

/// Error type for part image loading
#[derive(Debug, Error)]
pub enum AssetError {
    /// No image exists for the key
    #[error("missing {layer} image '{key}' ({path})")]
    Missing { layer: Layer, key: String, path: String },
    /// The image exists but could not be decoded
    #[error("failed to decode {layer} image '{key}': {source}")]
    Decode {
        layer: Layer,
        key: String,
        #[source]
        source: image::ImageError,
    },
}

/// Anything that can produce the image for a layer part.
pub trait PartImageSource {
    /// Load the image stored under `key` for `layer`.
    fn load(&self, layer: Layer, key: &str) -> Result<RgbaImage, AssetError>;
}

/// Loads part images from `<root>/<layer>/<key>.png`.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the image file for a part.
    pub fn path_for(&self, layer: Layer, key: &str) -> PathBuf {
        self.root.join(layer.name()).join(format!("{}.png", key))
    }
}

impl PartImageSource for DirectoryAssets {
    fn load(&self, layer: Layer, key: &str) -> Result<RgbaImage, AssetError> {
        let path = self.path_for(layer, key);
        if !path.is_file() {
            return Err(AssetError::Missing {
                layer,
                key: key.to_string(),
                path: path.display().to_string(),
            });
        }
        let img = image::open(&path).map_err(|source| AssetError::Decode {
            layer,
            key: key.to_string(),
            source,
        })?;
        Ok(img.to_rgba8())
    }
}

/// In-memory image set, keyed by layer and part key.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    images: HashMap<(Layer, String), RgbaImage>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: Layer, key: impl Into<String>, image: RgbaImage) {
        self.images.insert((layer, key.into()), image);
    }

    /// Builder-style [`MemoryAssets::insert`].
    pub fn with(mut self, layer: Layer, key: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(layer, key, image);
        self
    }
}

impl PartImageSource for MemoryAssets {
    fn load(&self, layer: Layer, key: &str) -> Result<RgbaImage, AssetError> {
        self.images
            .get(&(layer, key.to_string()))
            .cloned()
            .ok_or_else(|| AssetError::Missing {
                layer,
                key: key.to_string(),
                path: "<memory>".to_string(),
            })
    }
}

/// What to do when a part image cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingAssetPolicy {
    /// Fail the generation with the load error
    #[default]
    Abort,
    /// Leave the layer out of the composite
    Skip,
}

/// The resolved surfaces for one draw, `None` where a layer is absent.
#[derive(Debug, Clone, Default)]
pub struct LayerImages {
    pub skin: Option<Arc<RgbaImage>>,
    pub face: Option<Arc<RgbaImage>>,
    pub face2: Option<Arc<RgbaImage>>,
    pub hair: Option<Arc<RgbaImage>>,
}

impl LayerImages {
    pub fn get(&self, layer: Layer) -> Option<&RgbaImage> {
        let slot = match layer {
            Layer::Skin => &self.skin,
            Layer::Face => &self.face,
            Layer::Face2 => &self.face2,
            Layer::Hair => &self.hair,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, layer: Layer, image: Option<Arc<RgbaImage>>) {
        match layer {
            Layer::Skin => self.skin = image,
            Layer::Face => self.face = image,
            Layer::Face2 => self.face2 = image,
            Layer::Hair => self.hair = image,
        }
    }
}

/// Get-or-load cache over a [`PartImageSource`], keyed by `(layer, index)`.
#[derive(Debug)]
pub struct ImageCache<S> {
    source: S,
    images: HashMap<(Layer, usize), Arc<RgbaImage>>,
}

impl<S: PartImageSource> ImageCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            images: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Return the cached image for a part, loading it on first use.
    ///
    /// The key comes from the layer's catalog (the padded index when the
    /// catalog has no entry). Failed loads are not cached.
    pub fn get_or_load(&mut self, catalogs: &Catalogs, layer: Layer, index: usize) -> Result<Arc<RgbaImage>, AssetError> {
        if let Some(img) = self.images.get(&(layer, index)) {
            return Ok(Arc::clone(img));
        }
        let key = catalogs[layer].key(index);
        let img = Arc::new(self.source.load(layer, &key)?);
        tracing::debug!(%layer, index, key = %key, "loaded part image");
        self.images.insert((layer, index), Arc::clone(&img));
        Ok(img)
    }

    /// Resolve all four layer images for a draw.
    pub fn images_for(
        &mut self,
        draw: &Draw,
        catalogs: &Catalogs,
        policy: MissingAssetPolicy,
    ) -> Result<LayerImages, AssetError> {
        let mut images = LayerImages::default();
        for layer in Layer::ALL {
            match self.get_or_load(catalogs, layer, draw.index(layer)) {
                Ok(img) => images.set(layer, Some(img)),
                Err(e) if policy == MissingAssetPolicy::Skip => {
                    tracing::warn!(%layer, error = %e, "skipping layer without image");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(images)
    }
}
