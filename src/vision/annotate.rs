// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection overlays for the annotated-image response

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::geometry::BoundingBox;
use super::image_utils::{encode_png, ImageError};

/// Outline colour of drawn boxes
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline thickness in pixels
pub const BOX_THICKNESS: u32 = 2;

/// Draw box outlines onto a copy of `image`
pub fn draw_boxes<'a, I>(image: &RgbImage, boxes: I) -> RgbImage
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    let mut canvas = image.clone();
    let (w, h) = canvas.dimensions();

    for bbox in boxes {
        let (x, y, bw, bh) = bbox.pixel_rect(w, h);
        for inset in 0..BOX_THICKNESS {
            if bw <= 2 * inset || bh <= 2 * inset {
                break;
            }
            let rect = Rect::at((x + inset) as i32, (y + inset) as i32)
                .of_size(bw - 2 * inset, bh - 2 * inset);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
    }

    canvas
}

/// Draw boxes and return the result as a base64 PNG
pub fn annotated_png_base64<'a, I>(image: &RgbImage, boxes: I) -> Result<String, ImageError>
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    let annotated = draw_boxes(image, boxes);
    let png = encode_png(&annotated)?;
    Ok(STANDARD.encode(png))
}
