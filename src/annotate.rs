//! Detection overlays for the video sink.
//!
//! Pure rendering on the frame's RGB buffer: a thick red rectangle per
//! accepted detection plus a filled label strip anchored above the box. Not
//! part of the alert decision path.

use crate::detect::Detection;

const BOX_COLOR: [u8; 3] = [255, 0, 0];
const BOX_THICKNESS: u32 = 3;
const LABEL_STRIP_HEIGHT: u32 = 14;
const LABEL_CHAR_WIDTH: u32 = 7;

/// Draw overlays for every detection onto an RGB pixel buffer.
pub fn draw_detections(pixels: &mut [u8], width: u32, height: u32, detections: &[Detection]) {
    for detection in detections {
        let x1 = detection.bbox.x1.max(0.0) as u32;
        let y1 = detection.bbox.y1.max(0.0) as u32;
        let x2 = (detection.bbox.x2.max(0.0) as u32).min(width);
        let y2 = (detection.bbox.y2.max(0.0) as u32).min(height);
        if x1 >= x2 || y1 >= y2 {
            continue;
        }

        draw_box_outline(pixels, width, height, x1, y1, x2, y2);

        let label = format!("{} {:.2}", detection.class, detection.confidence);
        log::debug!("annotate: {} at ({}, {})", label, x1, y1);
        let strip_w = (label.len() as u32) * LABEL_CHAR_WIDTH;
        let strip_y1 = y1.saturating_sub(LABEL_STRIP_HEIGHT);
        fill_rect(pixels, width, height, x1, strip_y1, x1 + strip_w, y1);
    }
}

fn draw_box_outline(pixels: &mut [u8], width: u32, height: u32, x1: u32, y1: u32, x2: u32, y2: u32) {
    let t = BOX_THICKNESS;
    // top, bottom, left, right bars
    fill_rect(pixels, width, height, x1, y1, x2, y1 + t);
    fill_rect(pixels, width, height, x1, y2.saturating_sub(t), x2, y2);
    fill_rect(pixels, width, height, x1, y1, x1 + t, y2);
    fill_rect(pixels, width, height, x2.saturating_sub(t), y1, x2, y2);
}

fn fill_rect(pixels: &mut [u8], width: u32, height: u32, x1: u32, y1: u32, x2: u32, y2: u32) {
    let x2 = x2.min(width);
    let y2 = y2.min(height);
    if x1 >= x2 || y1 >= y2 {
        return;
    }
    for y in y1..y2 {
        for x in x1..x2 {
            let offset = ((y * width + x) * 3) as usize;
            if offset + 2 < pixels.len() {
                pixels[offset] = BOX_COLOR[0];
                pixels[offset + 1] = BOX_COLOR[1];
                pixels[offset + 2] = BOX_COLOR[2];
            }
        }
    }
}
