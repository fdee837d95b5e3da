use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("no image named {0}")]
    NotFound(String),
    #[error("failed to read image {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: image::ImageError,
    },
}

/// Fetches and decodes source textures by identifier.
pub trait ImageSource {
    fn load(&self, id: &str) -> impl Future<Output = Result<RgbaImage, ImageLoadError>>;
}

/// Reads textures from a directory; identifiers are paths relative to `root`.
#[derive(Clone, Debug)]
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

// Reads and decodes on the calling thread. Hosts that must not block the
// executor should implement `ImageSource` over their own async loader.
impl ImageSource for FileImageSource {
    async fn load(&self, id: &str) -> Result<RgbaImage, ImageLoadError> {
        let path = self.root.join(id);
        let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ImageLoadError::NotFound(id.to_string()),
            _ => ImageLoadError::Io {
                id: id.to_string(),
                source,
            },
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| ImageLoadError::Decode {
            id: id.to_string(),
            source,
        })?;
        Ok(decoded.to_rgba8())
    }
}

/// Pre-decoded images keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, RgbaImage>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, image: RgbaImage) {
        self.images.insert(id.into(), image);
    }

    pub fn with_image(mut self, id: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(id, image);
        self
    }
}

impl ImageSource for MemoryImageSource {
    async fn load(&self, id: &str) -> Result<RgbaImage, ImageLoadError> {
        self.images
            .get(id)
            .cloned()
            .ok_or_else(|| ImageLoadError::NotFound(id.to_string()))
    }
}

/// Successfully decoded images; failures are never stored so they are retried.
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<String, Arc<RgbaImage>>,
}

impl ImageCache {
    pub fn get(&self, id: &str) -> Option<Arc<RgbaImage>> {
        self.images.get(id).cloned()
    }

    pub fn insert(&mut self, id: &str, image: RgbaImage) -> Arc<RgbaImage> {
        let image = Arc::new(image);
        self.images.insert(id.to_string(), image.clone());
        image
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn memory_source_reports_missing_ids() {
        let source = MemoryImageSource::new().with_image("grass", RgbaImage::new(2, 2));
        assert!(pollster::block_on(source.load("grass")).is_ok());
        assert!(matches!(
            pollster::block_on(source.load("lava")),
            Err(ImageLoadError::NotFound(id)) if id == "lava"
        ));
    }

    #[test]
    fn file_source_maps_missing_file_to_not_found() {
        let source = FileImageSource::new("no/such/dir");
        assert!(matches!(
            pollster::block_on(source.load("grass.png")),
            Err(ImageLoadError::NotFound(_))
        ));
    }

    #[test]
    fn file_source_rejects_undecodable_bytes() {
        let dir = std::env::temp_dir().join("chunk_baker_images_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("broken.png"), b"not a png").unwrap();

        let source = FileImageSource::new(&dir);
        assert!(matches!(
            pollster::block_on(source.load("broken.png")),
            Err(ImageLoadError::Decode { .. })
        ));
    }

    #[test]
    fn file_source_decodes_png() {
        let dir = std::env::temp_dir().join("chunk_baker_images_png");
        std::fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save(dir.join("tile.png"))
            .unwrap();

        let source = FileImageSource::new(&dir);
        let image = pollster::block_on(source.load("tile.png")).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(*image.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn cache_shares_decoded_images() {
        let mut cache = ImageCache::default();
        let stored = cache.insert("grass", RgbaImage::new(1, 1));
        let fetched = cache.get("grass").unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
