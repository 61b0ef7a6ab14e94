use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};

use crate::error::PrtError;
use crate::Result;

/// Owned raw pixel grid with an explicit channel count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl PixelBuffer {
    pub const RGBA_CHANNELS: u8 = 4;

    /// Wrap raw interleaved pixels. `channels` is 1 (gray), 2 (gray+alpha),
    /// 3 (RGB) or 4 (RGBA); `data` must hold exactly `width * height * channels` bytes.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(PrtError::InvalidPixelBuffer(format!(
                "unsupported channel count {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(PrtError::InvalidPixelBuffer(format!(
                "expected {expected} bytes for {width}x{height}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            channels: Self::RGBA_CHANNELS,
        }
    }

    pub fn from_dynamic(img: &DynamicImage) -> Self {
        Self::from_rgba_image(img.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Expand to 4 channels. Missing alpha becomes opaque.
    pub fn to_rgba(&self) -> PixelBuffer {
        if self.channels == Self::RGBA_CHANNELS {
            return self.clone();
        }

        let src = self.channels as usize;
        let mut data = Vec::with_capacity(self.pixel_count() * 4);
        for px in self.data.chunks_exact(src) {
            let rgba = match px {
                [l] => [*l, *l, *l, 255],
                [l, a] => [*l, *l, *l, *a],
                [r, g, b] => [*r, *g, *b, 255],
                _ => unreachable!("channel count validated in constructor"),
            };
            data.extend_from_slice(&rgba);
        }

        PixelBuffer {
            data,
            width: self.width,
            height: self.height,
            channels: Self::RGBA_CHANNELS,
        }
    }

    /// Borrowed RGBA view; `None` unless the buffer already has 4 channels.
    pub fn as_rgba_view(&self) -> Option<ImageBuffer<Rgba<u8>, &[u8]>> {
        if self.channels != Self::RGBA_CHANNELS {
            return None;
        }
        ImageBuffer::from_raw(self.width, self.height, self.data.as_slice())
    }

    /// Single-channel luma image (Rec. 709 weights, alpha ignored).
    pub fn to_grayscale(&self) -> GrayImage {
        match self.as_rgba_view() {
            Some(view) => image::imageops::grayscale(&view),
            None => {
                let rgba = self.to_rgba();
                match rgba.as_rgba_view() {
                    Some(view) => image::imageops::grayscale(&view),
                    None => GrayImage::new(self.width, self.height),
                }
            }
        }
    }

    /// Copy into an owned [`RgbaImage`], expanding to RGBA if needed.
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let data = if self.channels == Self::RGBA_CHANNELS {
            self.data.clone()
        } else {
            self.to_rgba().data
        };
        rgba_image(self.width, self.height, data)
    }
}

/// Wrap raw RGBA bytes, failing when the length does not match the dimensions.
pub(crate) fn rgba_image(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage> {
    let len = data.len();
    RgbaImage::from_raw(width, height, data).ok_or_else(|| {
        PrtError::InvalidPixelBuffer(format!(
            "expected {} RGBA bytes for {width}x{height}, got {len}",
            width as usize * height as usize * 4
        ))
    })
}

/// Decode an image file into an RGBA [`PixelBuffer`].
///
/// Missing files, undecodable data and zero-sized images are all reported as
/// [`PrtError::UnreadableImage`].
pub fn load_pixel_buffer(path: &Path) -> Result<PixelBuffer> {
    let img = decode(path)?;
    Ok(PixelBuffer::from_dynamic(&img))
}

fn decode(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(PrtError::unreadable(path, "file not found"));
    }
    let img = image::open(path).map_err(|e| PrtError::unreadable(path, e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PrtError::unreadable(path, "image has no dimensions"));
    }
    Ok(img)
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
