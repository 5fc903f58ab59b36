//! Minimal raster primitives on packed 3-channel frames.
//!
//! Coordinates are signed pixels; anything outside the frame is clipped.

use crate::shared::frame::Frame;

pub fn put_pixel(frame: &mut Frame, x: i64, y: i64, color: [u8; 3]) {
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    if x < 0 || y < 0 || x >= w || y >= h {
        return;
    }
    let c = frame.channels() as usize;
    let offset = (y as usize * w as usize + x as usize) * c;
    frame.data_mut()[offset..offset + 3].copy_from_slice(&color);
}

pub fn fill_circle(frame: &mut Frame, cx: i64, cy: i64, radius: u32, color: [u8; 3]) {
    let r = radius as i64;
    let r2 = r * r;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r2 {
                put_pixel(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line; thicker lines stamp a disk at every step.
pub fn draw_line(
    frame: &mut Frame,
    from: (i64, i64),
    to: (i64, i64),
    thickness: u32,
    color: [u8; 3],
) {
    let radius = thickness / 2;
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if radius == 0 {
            put_pixel(frame, x, y, color);
        } else {
            fill_circle(frame, x, y, radius, color);
        }
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Rectangle outline between two inclusive corners.
pub fn draw_rect(
    frame: &mut Frame,
    top_left: (i64, i64),
    bottom_right: (i64, i64),
    thickness: u32,
    color: [u8; 3],
) {
    let (x0, y0) = top_left;
    let (x1, y1) = bottom_right;
    draw_line(frame, (x0, y0), (x1, y0), thickness, color);
    draw_line(frame, (x1, y0), (x1, y1), thickness, color);
    draw_line(frame, (x1, y1), (x0, y1), thickness, color);
    draw_line(frame, (x0, y1), (x0, y0), thickness, color);
}
