//! Deep-zoom tile-source descriptors.
//!
//! A `TileSource` is everything a viewer instance needs to start fetching
//! tiles. The coordinator passes it through untouched; it can be built from a
//! DZI manifest or from per-file dimensions reported by the server.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlideviewError};

/// Namespace of Microsoft Deep Zoom manifests.
pub const DEEPZOOM_XMLNS: &str = "http://schemas.microsoft.com/deepzoom/2008";

/// Tile edge length produced by the slide tiling service.
pub const DEFAULT_TILE_SIZE: u32 = 254;

/// Pixel overlap between neighbouring tiles produced by the slide tiling service.
pub const DEFAULT_OVERLAP: u32 = 1;

/// Tile image format produced by the slide tiling service.
pub const DEFAULT_FORMAT: &str = "jpeg";

/// Deep-zoom tile-source descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSource {
    #[serde(default = "default_xmlns")]
    pub xmlns: String,
    /// Root URL of the tile pyramid (the `_files/` directory).
    pub url: String,
    #[serde(default = "default_overlap")]
    pub overlap: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_format")]
    pub format: String,
    /// Full image width in pixels.
    pub width: u64,
    /// Full image height in pixels.
    pub height: u64,
}

fn default_xmlns() -> String {
    DEEPZOOM_XMLNS.to_string()
}

fn default_overlap() -> u32 {
    DEFAULT_OVERLAP
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

/// The object shape OpenSeadragon accepts as an inline `tileSources` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileSourceDocument {
    #[serde(rename = "Image")]
    pub image: ImageDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageDocument {
    #[serde(rename = "xmlns")]
    pub xmlns: String,
    pub url: String,
    pub overlap: String,
    pub tile_size: String,
    pub format: String,
    pub size: SizeDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SizeDocument {
    pub height: String,
    pub width: String,
}

impl TileSource {
    /// Descriptor using the tiling service's tile size, overlap and format.
    pub fn with_defaults(url: impl Into<String>, width: u64, height: u64) -> Self {
        Self {
            xmlns: default_xmlns(),
            url: url.into(),
            overlap: DEFAULT_OVERLAP,
            tile_size: DEFAULT_TILE_SIZE,
            format: default_format(),
            width,
            height,
        }
    }

    /// Build a descriptor from a `.dzi` manifest.
    ///
    /// `url` is the tile root; manifests don't carry it.
    ///
    /// # Errors
    /// Returns `Xml` for malformed XML, `Manifest` when the `Image` element or
    /// its `Size` child is missing or carries non-numeric attributes.
    pub fn from_dzi_xml(xml: &str, url: impl Into<String>) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut image: Option<ImageAttrs> = None;
        let mut size: Option<(u64, u64)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"Image" => image = Some(ImageAttrs::parse(e)?),
                    b"Size" if image.is_some() => {
                        let width = required_u64(e, b"Width")?;
                        let height = required_u64(e, b"Height")?;
                        size = Some((width, height));
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let image = image.ok_or_else(|| SlideviewError::Manifest("missing Image element".into()))?;
        let (width, height) =
            size.ok_or_else(|| SlideviewError::Manifest("missing Size element".into()))?;

        Ok(Self {
            xmlns: image.xmlns,
            url: url.into(),
            overlap: image.overlap,
            tile_size: image.tile_size,
            format: image.format,
            width,
            height,
        })
    }

    /// The inline tile-source object handed to OpenSeadragon.
    ///
    /// Numbers are stringified, matching what the manifest itself carries.
    #[must_use]
    pub fn to_document(&self) -> TileSourceDocument {
        TileSourceDocument {
            image: ImageDocument {
                xmlns: self.xmlns.clone(),
                url: self.url.clone(),
                overlap: self.overlap.to_string(),
                tile_size: self.tile_size.to_string(),
                format: self.format.clone(),
                size: SizeDocument {
                    height: self.height.to_string(),
                    width: self.width.to_string(),
                },
            },
        }
    }
}

struct ImageAttrs {
    xmlns: String,
    overlap: u32,
    tile_size: u32,
    format: String,
}

impl ImageAttrs {
    fn parse(e: &BytesStart) -> Result<Self> {
        let tile_size = attr_string(e, b"TileSize")
            .ok_or_else(|| SlideviewError::Manifest("missing TileSize".into()))?;
        let tile_size = tile_size
            .parse()
            .map_err(|_| SlideviewError::Manifest(format!("invalid TileSize: {tile_size}")))?;
        let overlap = match attr_string(e, b"Overlap") {
            Some(raw) => raw
                .parse()
                .map_err(|_| SlideviewError::Manifest(format!("invalid Overlap: {raw}")))?,
            None => 0,
        };
        Ok(Self {
            xmlns: attr_string(e, b"xmlns").unwrap_or_else(default_xmlns),
            overlap,
            tile_size,
            format: attr_string(e, b"Format").unwrap_or_else(default_format),
        })
    }
}

fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

fn required_u64(e: &BytesStart, key: &[u8]) -> Result<u64> {
    let name = String::from_utf8_lossy(key);
    let raw = attr_string(e, key).ok_or_else(|| SlideviewError::Manifest(format!("missing {name}")))?;
    raw.parse()
        .map_err(|_| SlideviewError::Manifest(format!("invalid {name}: {raw}")))
}
