//! Display surfaces that receive loaded images.
//!
//! A surface is either layer-like (takes raw pixel content) or view-like
//! (takes a decoded image object). The coordinator only talks to the
//! [`DisplaySurface`] capability; how pixels reach the screen, including any
//! fade animation, is up to the implementation.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use super::loaded::LoadedImage;

/// Which kind of content a surface accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Accepts raw decoded pixels
    Layer,
    /// Accepts a decoded image object
    View,
}

/// Content assigned to a surface, shaped by its [`SurfaceKind`].
#[derive(Debug, Clone)]
pub enum SurfaceContent {
    /// RGBA8 pixels for layer-like surfaces
    Pixels(Arc<RgbaImage>),
    /// Decoded image for view-like surfaces
    Image(LoadedImage),
}

impl SurfaceContent {
    /// Shape `image` for a surface of the given kind.
    pub fn for_kind(kind: SurfaceKind, image: &LoadedImage) -> Self {
        match kind {
            SurfaceKind::Layer => SurfaceContent::Pixels(Arc::new(image.to_rgba8())),
            SurfaceKind::View => SurfaceContent::Image(image.clone()),
        }
    }

    /// Pixel dimensions of the content.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SurfaceContent::Pixels(pixels) => pixels.dimensions(),
            SurfaceContent::Image(image) => (image.width(), image.height()),
        }
    }
}

/// Presentation hint accompanying an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    /// Replace content immediately
    #[default]
    None,
    /// Fade the new content in over the given duration
    Fade(Duration),
}

/// Capability of a display target to show a loaded image.
pub trait DisplaySurface {
    /// The kind of content this surface accepts.
    fn kind(&self) -> SurfaceKind;

    /// Show `content`, honoring `transition` if the surface can animate.
    fn assign(&mut self, content: SurfaceContent, transition: Transition);
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn kind(&self) -> SurfaceKind {
        (**self).kind()
    }

    fn assign(&mut self, content: SurfaceContent, transition: Transition) {
        (**self).assign(content, transition)
    }
}
