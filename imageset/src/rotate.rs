use crate::common::*;
use image::{Rgb, RgbImage};

/// Rotate an image about its center by `angle` radians, keeping the frame
/// size. Content turns clockwise for positive angles in the y-down pixel
/// convention, matching [`region::Point::rotate_about`], so landmark points
/// rotated by the same angle stay on their image features. Pixels mapped
/// from outside the source frame are black.
pub fn rotate_image(image: &DynamicImage, angle: f64) -> DynamicImage {
    let src = image.to_rgb8();
    let (width, height) = src.dimensions();
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let (sin, cos) = angle.sin_cos();

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        // inverse-map the output pixel into the source frame
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let sx = dx * cos + dy * sin + cx;
        let sy = -dx * sin + dy * cos + cy;
        *pixel = sample_bilinear(&src, sx, sy);
    }

    DynamicImage::ImageRgb8(out)
}

fn sample_bilinear(src: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (width, height) = src.dimensions();
    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for channel in 0..3 {
        let top = p00[channel] as f64 * (1.0 - fx) + p10[channel] as f64 * fx;
        let bottom = p01[channel] as f64 * (1.0 - fx) + p11[channel] as f64 * fx;
        out[channel] = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }
    Rgb(out)
}
