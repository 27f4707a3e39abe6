//! Mask application (§4.1): pixels outside the configured polygon are set
//! to a neutral fill value before the frame is handed to the recognizer.

use image::{ImageBuffer, Rgb};

use crate::config::camera::{ImageMask, Position};
use crate::error::Result;

fn point_in_polygon(x: i32, y: i32, points: &[Position]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = (points[i].x, points[i].y);
        let (xj, yj) = (points[j].x, points[j].y);
        if ((yi > y) != (yj > y))
            && (x < (xj - xi) * (y - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Returns a re-encoded JPEG with every pixel outside `mask.points` set to
/// `mask.fill`. If `mask.points` has fewer than 3 points, returns the input
/// unchanged (no masking configured).
pub fn apply_mask(jpeg: &[u8], mask: &ImageMask) -> Result<Vec<u8>> {
    if mask.points.len() < 3 {
        return Ok(jpeg.to_vec());
    }

    let img = image::load_from_memory(jpeg)?.to_rgb8();
    let (w, h) = img.dimensions();
    let mut out: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(w, h);

    for y in 0..h {
        for x in 0..w {
            if point_in_polygon(x as i32, y as i32, &mask.points) {
                out.put_pixel(x, y, *img.get_pixel(x, y));
            } else {
                out.put_pixel(x, y, Rgb([mask.fill, mask.fill, mask.fill]));
            }
        }
    }

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    out.write_to(&mut cursor, image::ImageFormat::Jpeg)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_no_polygon_configured() {
        let jpeg = vec![1, 2, 3];
        let mask = ImageMask { points: vec![], fill: 160 };
        assert_eq!(apply_mask(&jpeg, &mask).unwrap(), jpeg);
    }

    #[test]
    fn point_in_polygon_basic_square() {
        let square = vec![
            Position { x: 0, y: 0 },
            Position { x: 10, y: 0 },
            Position { x: 10, y: 10 },
            Position { x: 0, y: 10 },
        ];
        assert!(point_in_polygon(5, 5, &square));
        assert!(!point_in_polygon(50, 50, &square));
    }
}
