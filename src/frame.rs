use image::{GrayImage, RgbImage};

/// A single captured camera image in 8-bit RGB.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    image: RgbImage,
}

impl Frame {
    pub(crate) fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Builds a frame from tightly packed RGB bytes, returning `None` if the
    /// buffer does not match the dimensions.
    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(Self::new)
    }

    pub(crate) fn width(&self) -> u32 {
        self.image.width()
    }

    pub(crate) fn height(&self) -> u32 {
        self.image.height()
    }

    pub(crate) fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Applies a global binary threshold to every channel independently.
    ///
    /// Channel values strictly greater than `threshold` become 255, all
    /// others become 0.
    pub(crate) fn binarize(&self, threshold: u8) -> Frame {
        let mut image = self.image.clone();
        for channel in image.iter_mut() {
            *channel = if *channel > threshold { u8::MAX } else { 0 };
        }

        Frame { image }
    }

    pub(crate) fn to_luma(&self) -> GrayImage {
        image::DynamicImage::ImageRgb8(self.image.clone()).into_luma8()
    }
}
