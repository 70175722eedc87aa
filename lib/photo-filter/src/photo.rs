use image::{DynamicImage, RgbaImage};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// EXIF orientation of the stored pixels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Up = 1,
    UpMirrored,
    Down,
    DownMirrored,
    LeftMirrored,
    Right,
    RightMirrored,
    Left,
}

/// A decoded image plus the display metadata that travels with it.
///
/// Pixels are shared, so cloning a `Photo` never copies the buffer.
#[derive(Debug, Clone)]
pub struct Photo {
    image: Arc<DynamicImage>,
    orientation: Orientation,
    scale: f32,
}

impl Photo {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
            orientation: Orientation::default(),
            scale: 1.0,
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self::new(DynamicImage::ImageRgba8(image))
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Copies orientation and scale from `other`.
    pub fn with_metadata_of(self, other: &Photo) -> Self {
        self.with_orientation(other.orientation)
            .with_scale(other.scale)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// True when both photos share the same pixel buffer.
    pub fn shares_pixels_with(&self, other: &Photo) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        self.image.to_rgba8()
    }
}

impl From<DynamicImage> for Photo {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl From<RgbaImage> for Photo {
    fn from(image: RgbaImage) -> Self {
        Self::from_rgba(image)
    }
}
