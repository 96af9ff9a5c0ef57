//! Decoded images handed to surfaces and result sinks.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageReader, RgbaImage};
use url::Url;

use crate::cache::CachedImage;
use crate::error::LoadError;

/// A decoded image together with the encoded bytes it came from.
///
/// Cloning is cheap: the pixel data is shared.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    url: Url,
    image: Arc<DynamicImage>,
    encoded: CachedImage,
}

impl LoadedImage {
    /// Decode `encoded`, guessing the format from its magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Decode`] if the bytes are not a supported image.
    pub fn decode(url: Url, encoded: CachedImage) -> Result<Self, LoadError> {
        let reader = ImageReader::new(Cursor::new(&encoded.bytes[..]))
            .with_guessed_format()
            .map_err(|e| LoadError::Decode {
                message: e.to_string(),
            })?;

        if reader.format().is_none() {
            return Err(LoadError::Decode {
                message: "unrecognized image format".to_string(),
            });
        }

        let image = reader.decode().map_err(|e| LoadError::Decode {
            message: e.to_string(),
        })?;

        Ok(Self {
            url,
            image: Arc::new(image),
            encoded,
        })
    }

    /// URL the image was loaded from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The decoded image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Shared handle to the decoded image.
    pub fn shared(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.image)
    }

    /// Raw RGBA8 pixels, as assigned to layer-like surfaces.
    pub fn to_rgba8(&self) -> RgbaImage {
        self.image.to_rgba8()
    }

    /// The encoded bytes and content type.
    pub fn encoded(&self) -> &CachedImage {
        &self.encoded
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
