use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use screenshots::Screen;
use std::sync::Arc;

/// Immutable snapshot of a display, PNG encoded once at capture time.
///
/// Cloning shares the encoded bytes, so handing a copy to a worker never
/// copies the image.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    width: u32,
    height: u32,
    png: Arc<[u8]>,
}

impl CapturedImage {
    pub fn from_rgba(img: &RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(img.as_raw(), width, height, ColorType::Rgba8)
            .context("encode screenshot as png")?;
        Ok(Self {
            width,
            height,
            png: png.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

pub trait ScreenGrabber {
    fn grab_primary(&mut self) -> Result<CapturedImage>;
}

/// Captures the primary display with the `screenshots` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryScreenGrabber;

impl ScreenGrabber for PrimaryScreenGrabber {
    fn grab_primary(&mut self) -> Result<CapturedImage> {
        let screens = Screen::all().context("enumerate displays")?;
        let screen = match screens.into_iter().find(|s| s.display_info.is_primary) {
            Some(screen) => screen,
            None => Screen::from_point(0, 0).context("locate primary display")?,
        };
        let raw = screen.capture().context("capture primary display")?;
        let image = CapturedImage::from_rgba(&raw)?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            bytes = image.png().len(),
            "captured primary display"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_png_signature() {
        let img = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let captured = CapturedImage::from_rgba(&img).unwrap();
        assert_eq!((captured.width(), captured.height()), (4, 3));
        assert_eq!(&captured.png()[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn clones_share_bytes() {
        let img = RgbaImage::new(1, 1);
        let a = CapturedImage::from_rgba(&img).unwrap();
        let b = a.clone();
        assert!(std::ptr::eq(a.png().as_ptr(), b.png().as_ptr()));
    }
}
