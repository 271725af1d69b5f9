use egui::ColorImage;
use image::{ImageBuffer, Rgba, RgbaImage};

pub const THUMB_WIDTH: u32 = 120;
pub const THUMB_HEIGHT: u32 = 68;

const BACKGROUND: Rgba<u8> = Rgba([206, 212, 218, 255]);
const FRAME: Rgba<u8> = Rgba([134, 142, 150, 255]);

/// Generate the grey "no thumbnail" image shown when a workout has none or
/// when its thumbnail fails to load.
pub fn placeholder_image(width: u32, height: u32) -> RgbaImage {
    let (w, h) = (width.max(1) as i64, height.max(1) as i64);
    ImageBuffer::from_fn(width.max(1), height.max(1), |x, y| {
        let (x, y) = (x as i64, y as i64);
        let border = x < 2 || y < 2 || x >= w - 2 || y >= h - 2;
        // Two diagonals of the crossed box, scaled to the aspect ratio.
        let d1 = (x * h - y * w).abs();
        let d2 = (x * h - (h - 1 - y) * w).abs();
        let cross = d1 < w.max(h) || d2 < w.max(h);
        if border || cross { FRAME } else { BACKGROUND }
    })
}

/// Convert an RGBA buffer into an egui image.
pub fn to_color_image(image: &RgbaImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

pub fn placeholder_color_image() -> ColorImage {
    to_color_image(&placeholder_image(THUMB_WIDTH, THUMB_HEIGHT))
}
