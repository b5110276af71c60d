use crate::braille::{BrailleCanvas, Layer};

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, (x0, y0): (i32, i32), (x1, y1): (i32, i32), layer: Layer) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y, layer);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Circle outline, midpoint algorithm. Radius 0 is a single dot.
pub fn draw_circle(canvas: &mut BrailleCanvas, (cx, cy): (i32, i32), radius: i32, layer: Layer) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy, layer);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            canvas.set_pixel_signed(cx + px, cy + py, layer);
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, (0, 0), (9, 0), Layer::Land);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, (0, 0), (0, 7), Layer::Land);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_zero_radius_is_a_dot() {
        let mut canvas = BrailleCanvas::new(1, 1);
        draw_circle(&mut canvas, (0, 0), 0, Layer::Marker);
        assert_eq!(canvas.to_string(), "⠁");
    }

    #[test]
    fn test_circle_leaves_center_empty() {
        let mut canvas = BrailleCanvas::new(8, 4);
        draw_circle(&mut canvas, (8, 8), 5, Layer::Marker);
        let lines: Vec<Vec<char>> = canvas.to_string().lines().map(|l| l.chars().collect()).collect();
        // Cell (4, 2) holds pixels x 8..=9, y 8..=11: inside the ring.
        assert_eq!(lines[2][4], '\u{2800}');
        assert_ne!(lines[0][4], '\u{2800}');
    }
}
