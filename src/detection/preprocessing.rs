//! Stateless image-buffer transforms used to feed the sign model.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use rand::Rng;

/// Gray level used for letterbox padding
pub const LETTERBOX_FILL: u8 = 114;

/// Plain resize to an exact size, ignoring aspect ratio
pub fn resize(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Resize to `target` and scale to `[0, 1]` floats in planar CHW order
/// (all red values, then green, then blue).
pub fn normalize_to_chw(img: &RgbImage, target: (u32, u32)) -> Vec<f32> {
    let resized = if img.dimensions() == target {
        img.clone()
    } else {
        resize(img, target.0, target.1)
    };

    let (width, height) = resized.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for channel in 0..3 {
            data[channel * plane + offset] = pixel[channel] as f32 / 255.0;
        }
    }

    data
}

/// Multiply every channel by `factor`, saturating at 255
pub fn adjust_brightness(img: &RgbImage, factor: f32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * factor).abs().round().min(255.0) as u8;
        }
    }
    out
}

/// Random brightness jitter in `[0.8, 1.2)`
pub fn apply_augmentation<R: Rng + ?Sized>(img: &RgbImage, rng: &mut R) -> RgbImage {
    let factor = rng.gen_range(0.8f32..1.2f32);
    adjust_brightness(img, factor)
}

/// Fit the longer side to the target while keeping the aspect ratio.
pub fn resize_maintain_aspect(img: &RgbImage, target: (u32, u32)) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let (new_width, new_height) = fitted_size((width, height), target);
    resize(img, new_width, new_height)
}

fn fitted_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let aspect = source.0 as f32 / source.1 as f32;

    let (w, h) = if aspect > 1.0 {
        let w = target.0;
        (w, (w as f32 / aspect) as u32)
    } else {
        let h = target.1;
        ((h as f32 * aspect) as u32, h)
    };

    // never overflow the canvas on non-square targets
    let scale = (target.0 as f32 / w.max(1) as f32)
        .min(target.1 as f32 / h.max(1) as f32)
        .min(1.0);
    (
        ((w as f32 * scale) as u32).max(1),
        ((h as f32 * scale) as u32).max(1),
    )
}

/// A letterboxed image plus the transform back to source coordinates.
#[derive(Debug, Clone)]
pub struct Letterbox {
    pub image: RgbImage,
    pub source_size: (u32, u32),
    pub scale_x: f32,
    pub scale_y: f32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Map `[left, top, right, bottom]` in letterbox space back onto the
    /// source image, clamped to its bounds.
    pub fn to_source(&self, corners: [f32; 4]) -> [f32; 4] {
        let max_x = self.source_size.0 as f32;
        let max_y = self.source_size.1 as f32;
        let map_x = |x: f32| ((x - self.pad_x as f32) / self.scale_x).clamp(0.0, max_x);
        let map_y = |y: f32| ((y - self.pad_y as f32) / self.scale_y).clamp(0.0, max_y);
        [
            map_x(corners[0]),
            map_y(corners[1]),
            map_x(corners[2]),
            map_y(corners[3]),
        ]
    }
}

/// Aspect-preserving resize centered on a gray canvas of `target` size.
pub fn letterbox(img: &RgbImage, target: (u32, u32)) -> Letterbox {
    let mut canvas = RgbImage::from_pixel(target.0, target.1, Rgb([LETTERBOX_FILL; 3]));
    let (width, height) = img.dimensions();

    if width == 0 || height == 0 {
        return Letterbox {
            image: canvas,
            source_size: (width, height),
            scale_x: 1.0,
            scale_y: 1.0,
            pad_x: 0,
            pad_y: 0,
        };
    }

    let resized = resize_maintain_aspect(img, target);
    let (resized_w, resized_h) = resized.dimensions();
    let pad_x = (target.0 - resized_w) / 2;
    let pad_y = (target.1 - resized_h) / 2;

    imageops::overlay(&mut canvas, &resized, pad_x.into(), pad_y.into());

    Letterbox {
        image: canvas,
        source_size: (width, height),
        scale_x: resized_w as f32 / width as f32,
        scale_y: resized_h as f32 / height as f32,
        pad_x,
        pad_y,
    }
}
