use crate::braille::BrailleCanvas;

/// Closed ring of (lon, lat) vertices
pub type Ring = Vec<(f64, f64)>;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

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

/// Even-odd ray cast; points exactly on an edge may land either side
pub fn point_in_ring(lon: f64, lat: f64, ring: &[(f64, f64)]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Polygon with holes: inside the exterior and outside every hole
pub fn point_in_polygon(lon: f64, lat: f64, rings: &[Ring]) -> bool {
    match rings.split_first() {
        Some((exterior, holes)) => {
            point_in_ring(lon, lat, exterior) && !holes.iter().any(|h| point_in_ring(lon, lat, h))
        }
        None => false,
    }
}

/// Bounding box of a ring, `None` when empty
pub fn ring_bbox(ring: &[(f64, f64)]) -> Option<(f64, f64, f64, f64)> {
    let (&(x0, y0), rest) = ring.split_first()?;
    Some(rest.iter().fold((x0, y0, x0, y0), |(a, b, c, d), &(x, y)| {
        (a.min(x), b.min(y), c.max(x), d.max(y))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size), (x0, y0)]
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.glyphs().count(), 5);
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.glyph(0, 0), Some('⡇'));
        assert_eq!(canvas.glyph(0, 1), Some('⡇'));
    }

    #[test]
    fn test_point_in_polygon_with_hole() {
        let rings = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        assert!(point_in_polygon(1.0, 1.0, &rings));
        assert!(!point_in_polygon(5.0, 5.0, &rings));
        assert!(!point_in_polygon(11.0, 5.0, &rings));
        assert!(!point_in_polygon(1.0, 1.0, &[]));
    }

    #[test]
    fn test_ring_bbox() {
        assert_eq!(ring_bbox(&square(2.0, 3.0, 4.0)), Some((2.0, 3.0, 6.0, 7.0)));
        assert_eq!(ring_bbox(&[]), None);
    }
}
