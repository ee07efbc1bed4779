use nalgebra::{Point2, Vector2};

/// Closed polygon outline of a bright region, in pixel coordinates.
///
/// Produced by the external blob-extraction front end; this crate only ever
/// reads it through [`Contour::area`] and [`min_area_rect`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Point2<f64>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
        }
    }

    /// Polygon area via the shoelace formula, always non-negative.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for (i, p) in self.points.iter().enumerate() {
            let q = &self.points[(i + 1) % self.points.len()];
            twice += p.x * q.y - q.x * p.y;
        }
        twice.abs() / 2.0
    }
}

/// Oriented bounding rectangle with the OpenCV-style angle convention:
/// `angle_deg` is in `(-90, 0]` and `width` is the side measured along the
/// direction that angle refers to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub angle_deg: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Corner points in order, suitable for drawing the outline.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let a = self.angle_deg.to_radians();
        let u = Vector2::new(a.cos(), a.sin()) * (self.width / 2.0);
        let v = Vector2::new(-a.sin(), a.cos()) * (self.height / 2.0);
        [
            self.center - u - v,
            self.center + u - v,
            self.center + u + v,
            self.center - u + v,
        ]
    }
}

fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull of a point set (Andrew monotone chain), counter-clockwise,
/// without the repeated first point. Collinear points are dropped.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

const DEGENERATE_EPS: f64 = 1e-9;

/// Fit the minimum-area oriented bounding rectangle to a contour.
///
/// Uses the convex hull and evaluates one rectangle per hull edge (the
/// minimal rectangle always shares a side with the hull). Returns `None`
/// for fewer than three distinct points or a degenerate (zero-area) hull.
pub fn min_area_rect(contour: &Contour) -> Option<RotatedRect> {
    let hull = convex_hull(&contour.points);
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<(f64, Vector2<f64>, Vector2<f64>, [f64; 4], Point2<f64>)> = None;
    for i in 0..hull.len() {
        let p = hull[i];
        let q = hull[(i + 1) % hull.len()];
        let edge = q - p;
        let len = edge.norm();
        if len < DEGENERATE_EPS {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut min_u, mut max_u, mut min_v, mut max_v) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for pt in &hull {
            let d = pt - p;
            let su = d.dot(&u);
            let sv = d.dot(&v);
            min_u = min_u.min(su);
            max_u = max_u.max(su);
            min_v = min_v.min(sv);
            max_v = max_v.max(sv);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_none_or(|(a, ..)| area < *a) {
            best = Some((area, u, v, [min_u, max_u, min_v, max_v], p));
        }
    }

    let (area, u, v, [min_u, max_u, min_v, max_v], origin) = best?;
    if area < DEGENERATE_EPS {
        return None;
    }

    let center = origin + u * ((min_u + max_u) / 2.0) + v * ((min_v + max_v) / 2.0);
    let extent_u = max_u - min_u;
    let extent_v = max_v - min_v;
    let (long, short, axis) = if extent_u >= extent_v {
        (extent_u, extent_v, u)
    } else {
        (extent_v, extent_u, v)
    };

    // Long-axis angle in image coordinates (y down), folded into [0, 180).
    let mut phi = axis.y.atan2(axis.x).to_degrees();
    if phi < 0.0 {
        phi += 180.0;
    }
    if phi >= 180.0 {
        phi -= 180.0;
    }

    // Express in the OpenCV reporting convention: angle in (-90, 0] and
    // width along the side that angle refers to. The classifier's angle
    // adjustment then recovers the y-up polar angle of the long axis.
    let (width, height, angle_deg) = if phi <= DEGENERATE_EPS {
        (long, short, 0.0)
    } else if phi <= 90.0 {
        (short, long, phi - 90.0)
    } else {
        (long, short, phi - 180.0)
    };

    Some(RotatedRect {
        center,
        width,
        height,
        angle_deg,
    })
}
