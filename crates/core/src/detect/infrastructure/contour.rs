//! External contour extraction over binary masks.
//!
//! Connected regions (8-connectivity) are traced along their outer boundary
//! only; holes inside a region produce no contour. Area and perimeter are
//! measured on the traced polygon, so a one-pixel-wide streak has near-zero
//! area even though it covers many pixels.

use crate::shared::mask::Mask;

/// Moore neighborhood in clockwise order, starting west.
const CLOCKWISE: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// The traced outer boundary of one connected mask region, in pixel
/// coordinates (x, y).
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    /// Polygon area by the shoelace formula.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut sum = 0i64;
        for i in 0..self.points.len() {
            let (x1, y1) = self.points[i];
            let (x2, y2) = self.points[(i + 1) % self.points.len()];
            sum += x1 as i64 * y2 as i64 - x2 as i64 * y1 as i64;
        }
        sum.abs() as f64 / 2.0
    }

    /// Closed-polygon length: the sum of distances between consecutive
    /// boundary points. Zero for a single-point contour.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..self.points.len() {
            let (x1, y1) = self.points[i];
            let (x2, y2) = self.points[(i + 1) % self.points.len()];
            let (dx, dy) = ((x2 - x1) as f64, (y2 - y1) as f64);
            sum += (dx * dx + dy * dy).sqrt();
        }
        sum
    }
}

/// Traces the outer boundary of every connected region, in scan order of
/// each region's topmost-leftmost pixel.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    let width = mask.width() as i32;
    let height = mask.height() as i32;
    let mut visited = vec![false; (width * height) as usize];
    let mut contours = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if !mask.get(x as u32, y as u32) || visited[(y * width + x) as usize] {
                continue;
            }
            contours.push(Contour {
                points: trace_boundary(mask, (x, y)),
            });
            flood_mark(mask, (x, y), &mut visited);
        }
    }
    contours
}

/// Marks every pixel of the region containing `start` as visited.
fn flood_mark(mask: &Mask, start: (i32, i32), visited: &mut [bool]) {
    let width = mask.width() as i32;
    let height = mask.height() as i32;
    let mut stack = vec![start];
    visited[(start.1 * width + start.0) as usize] = true;

    while let Some((x, y)) = stack.pop() {
        for (dx, dy) in CLOCKWISE {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            let idx = (ny * width + nx) as usize;
            if !visited[idx] && mask.get(nx as u32, ny as u32) {
                visited[idx] = true;
                stack.push((nx, ny));
            }
        }
    }
}

/// Moore-neighbor boundary tracing from a region's topmost-leftmost pixel.
///
/// `start`'s west neighbor is guaranteed background by the scan order, which
/// seeds the first clockwise sweep. The tracing step is deterministic in
/// `(pixel, backtrack)`, so the walk terminates exactly when the state after
/// the first move recurs; the last pixel of that cycle is `start` itself.
fn trace_boundary(mask: &Mask, start: (i32, i32)) -> Vec<(i32, i32)> {
    let Some(first_state) = advance(mask, start, (start.0 - 1, start.1)) else {
        // Isolated pixel: the contour is the single start point
        return vec![start];
    };

    let mut cycle = Vec::new();
    let (mut curr, mut backtrack) = first_state;

    // Spur pixels are visited more than once, but never more than the
    // neighborhood allows; the cap only guards against a malformed trace.
    let limit = 4 * (mask.width() as usize * mask.height() as usize) + 8;
    for _ in 0..limit {
        cycle.push((curr, backtrack));
        match advance(mask, curr, backtrack) {
            Some(state) if state == first_state => break,
            Some(state) => (curr, backtrack) = state,
            None => break,
        }
    }

    // The cycle closes on start; rotate it to the front
    if cycle.last().map(|&(p, _)| p) == Some(start) {
        cycle.pop();
    }
    let mut boundary = Vec::with_capacity(cycle.len() + 1);
    boundary.push(start);
    boundary.extend(cycle.into_iter().map(|(p, _)| p));
    boundary
}

/// One tracing step: sweeps the Moore neighborhood of `curr` clockwise,
/// starting just past `backtrack`, and returns the next boundary pixel with
/// its new backtrack. `None` when `curr` has no foreground neighbor.
fn advance(
    mask: &Mask,
    curr: (i32, i32),
    backtrack: (i32, i32),
) -> Option<((i32, i32), (i32, i32))> {
    let is_on = |p: (i32, i32)| {
        p.0 >= 0
            && p.1 >= 0
            && p.0 < mask.width() as i32
            && p.1 < mask.height() as i32
            && mask.get(p.0 as u32, p.1 as u32)
    };

    let d0 = CLOCKWISE
        .iter()
        .position(|&(dx, dy)| (curr.0 + dx, curr.1 + dy) == backtrack)
        .unwrap_or(0);

    for i in 1..=8 {
        let d = (d0 + i) % 8;
        let cand = (curr.0 + CLOCKWISE[d].0, curr.1 + CLOCKWISE[d].1);
        if is_on(cand) {
            let before = (d + 7) % 8;
            let new_backtrack = (curr.0 + CLOCKWISE[before].0, curr.1 + CLOCKWISE[before].1);
            return Some((cand, new_backtrack));
        }
    }
    None
}

/// Smallest circle containing every point: `((cx, cy), radius)`.
///
/// Welzl's algorithm over the convex hull; the hull keeps the recursion
/// shallow and the candidate set tiny even for long contours.
pub fn min_enclosing_circle(points: &[(i32, i32)]) -> ((f64, f64), f64) {
    match points {
        [] => ((0.0, 0.0), 0.0),
        [p] => ((p.0 as f64, p.1 as f64), 0.0),
        _ => {
            let hull: Vec<(f64, f64)> = convex_hull(points)
                .into_iter()
                .map(|(x, y)| (x as f64, y as f64))
                .collect();
            let mut boundary = Vec::with_capacity(3);
            let c = welzl(&hull, hull.len(), &mut boundary);
            ((c.cx, c.cy), c.r)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Circle {
    cx: f64,
    cy: f64,
    r: f64,
}

impl Circle {
    const ZERO: Circle = Circle {
        cx: 0.0,
        cy: 0.0,
        r: 0.0,
    };

    fn contains(&self, p: (f64, f64)) -> bool {
        let (dx, dy) = (p.0 - self.cx, p.1 - self.cy);
        (dx * dx + dy * dy).sqrt() <= self.r + 1e-7
    }
}

fn welzl(points: &[(f64, f64)], n: usize, boundary: &mut Vec<(f64, f64)>) -> Circle {
    if n == 0 || boundary.len() == 3 {
        return trivial_circle(boundary);
    }
    let p = points[n - 1];
    let c = welzl(points, n - 1, boundary);
    if c.contains(p) {
        return c;
    }
    boundary.push(p);
    let c = welzl(points, n - 1, boundary);
    boundary.pop();
    c
}

fn trivial_circle(boundary: &[(f64, f64)]) -> Circle {
    match boundary {
        [] => Circle::ZERO,
        [p] => Circle {
            cx: p.0,
            cy: p.1,
            r: 0.0,
        },
        [a, b] => diameter_circle(*a, *b),
        [a, b, c] => circumcircle(*a, *b, *c).unwrap_or_else(|| {
            // Collinear: the widest pair encloses all three
            let candidates = [
                diameter_circle(*a, *b),
                diameter_circle(*a, *c),
                diameter_circle(*b, *c),
            ];
            candidates
                .into_iter()
                .max_by(|p, q| p.r.total_cmp(&q.r))
                .unwrap_or(Circle::ZERO)
        }),
        _ => unreachable!("Welzl boundary never exceeds 3 points"),
    }
}

fn diameter_circle(a: (f64, f64), b: (f64, f64)) -> Circle {
    let cx = (a.0 + b.0) / 2.0;
    let cy = (a.1 + b.1) / 2.0;
    let (dx, dy) = (a.0 - cx, a.1 - cy);
    Circle {
        cx,
        cy,
        r: (dx * dx + dy * dy).sqrt(),
    }
}

fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<Circle> {
    let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
    if d.abs() < 1e-9 {
        return None;
    }
    let a2 = a.0 * a.0 + a.1 * a.1;
    let b2 = b.0 * b.0 + b.1 * b.1;
    let c2 = c.0 * c.0 + c.1 * c.1;
    let cx = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
    let cy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;
    let (dx, dy) = (a.0 - cx, a.1 - cy);
    Some(Circle {
        cx,
        cy,
        r: (dx * dx + dy * dy).sqrt(),
    })
}

/// Andrew's monotone chain. Returns hull vertices; interior and duplicate
/// points are dropped.
fn convex_hull(points: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let mut pts: Vec<(i32, i32)> = points.to_vec();
    pts.sort_unstable();
    pts.dedup();
    if pts.len() <= 2 {
        return pts;
    }

    let cross = |o: (i32, i32), a: (i32, i32), b: (i32, i32)| -> i64 {
        (a.0 - o.0) as i64 * (b.1 - o.1) as i64 - (a.1 - o.1) as i64 * (b.0 - o.0) as i64
    };

    let mut hull: Vec<(i32, i32)> = Vec::with_capacity(pts.len() + 1);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop(); // closes back on the first point
    hull
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn disc_mask(width: u32, height: u32, cx: i32, cy: i32, r: i32) -> Mask {
        let mut mask = Mask::empty(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    mask.set(x as u32, y as u32, true);
                }
            }
        }
        mask
    }

    fn block_mask(width: u32, height: u32, x0: i32, y0: i32, x1: i32, y1: i32) -> Mask {
        let mut mask = Mask::empty(width, height);
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.set(x as u32, y as u32, true);
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        assert!(find_external_contours(&Mask::empty(10, 10)).is_empty());
    }

    #[test]
    fn test_single_pixel_is_a_degenerate_contour() {
        let mut mask = Mask::empty(10, 10);
        mask.set(4, 5, true);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(4, 5)]);
        assert_eq!(contours[0].perimeter(), 0.0);
        assert_eq!(contours[0].area(), 0.0);
    }

    #[test]
    fn test_square_block_area_and_perimeter() {
        // 9x9 pixel block: boundary polygon is an 8x8 square of pixel centers
        let mask = block_mask(13, 13, 2, 2, 10, 10);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 32);
        assert_relative_eq!(contours[0].area(), 64.0);
        assert_relative_eq!(contours[0].perimeter(), 32.0);
    }

    #[test]
    fn test_two_blobs_give_two_contours_in_scan_order() {
        let mut mask = block_mask(20, 10, 2, 2, 5, 5);
        for y in 6..=8 {
            for x in 12..=16 {
                mask.set(x, y, true);
            }
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 2);
        // scan order: topmost-leftmost region first
        assert_eq!(contours[0].points[0], (2, 2));
        assert_eq!(contours[1].points[0], (12, 6));
    }

    #[test]
    fn test_hole_produces_no_inner_contour() {
        let mut mask = block_mask(15, 15, 2, 2, 12, 12);
        // Punch a hole in the middle
        for y in 6..=8 {
            for x in 6..=8 {
                mask.set(x, y, false);
            }
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        // Outer boundary only: same area as the solid block
        assert_relative_eq!(contours[0].area(), 100.0);
    }

    #[test]
    fn test_thin_line_has_negligible_area() {
        let mut mask = Mask::empty(30, 10);
        for x in 3..=25 {
            mask.set(x, 4, true);
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 0.0);
        assert!(contours[0].perimeter() > 0.0);
    }

    #[test]
    fn test_disc_geometry_is_close_to_analytic() {
        let r = 20.0;
        let mask = disc_mask(60, 60, 30, 30, 20);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);

        let area = contours[0].area();
        assert!(
            area > std::f64::consts::PI * (r - 1.0) * (r - 1.0)
                && area < std::f64::consts::PI * (r + 1.0) * (r + 1.0),
            "disc area {area} far from analytic"
        );

        // Chain-length perimeter overestimates a smooth circle slightly
        let perimeter = contours[0].perimeter();
        assert!(
            perimeter > 2.0 * std::f64::consts::PI * (r - 1.0)
                && perimeter < 2.0 * std::f64::consts::PI * r * 1.15,
            "disc perimeter {perimeter} far from analytic"
        );
    }

    #[test]
    fn test_min_enclosing_circle_of_a_square() {
        let points = [(0, 0), (10, 0), (10, 10), (0, 10), (5, 5)];
        let ((cx, cy), r) = min_enclosing_circle(&points);
        assert_relative_eq!(cx, 5.0, epsilon = 1e-6);
        assert_relative_eq!(cy, 5.0, epsilon = 1e-6);
        assert_relative_eq!(r, 50.0_f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_min_enclosing_circle_of_collinear_points() {
        let points = [(1, 1), (5, 5), (9, 9)];
        let ((cx, cy), r) = min_enclosing_circle(&points);
        assert_relative_eq!(cx, 5.0, epsilon = 1e-6);
        assert_relative_eq!(cy, 5.0, epsilon = 1e-6);
        assert_relative_eq!(r, 32.0_f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_min_enclosing_circle_degenerate_inputs() {
        assert_eq!(min_enclosing_circle(&[]), ((0.0, 0.0), 0.0));
        assert_eq!(min_enclosing_circle(&[(3, 4)]), ((3.0, 4.0), 0.0));
        let ((cx, cy), r) = min_enclosing_circle(&[(0, 0), (6, 8)]);
        assert_relative_eq!(cx, 3.0, epsilon = 1e-6);
        assert_relative_eq!(cy, 4.0, epsilon = 1e-6);
        assert_relative_eq!(r, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_min_enclosing_circle_recovers_disc_center_and_radius() {
        let mask = disc_mask(60, 60, 27, 31, 18);
        let contours = find_external_contours(&mask);
        let ((cx, cy), r) = min_enclosing_circle(&contours[0].points);
        assert!((cx - 27.0).abs() < 1.5, "center x {cx}");
        assert!((cy - 31.0).abs() < 1.5, "center y {cy}");
        assert!((r - 18.0).abs() < 1.5, "radius {r}");
    }
}
