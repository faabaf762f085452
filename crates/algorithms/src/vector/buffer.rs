//! Buffer operations
//!
//! Distance zones around geometries, approximated as polygons. Curves are
//! drawn with a fixed number of segments per quarter circle, the convention
//! of desktop GIS buffer tools.
//!
//! Line buffers are returned as one stadium (rectangle plus two round caps)
//! per line segment. The pieces overlap at vertices and are not unioned:
//! point membership against a `MultiPolygon` is the same either way.

use coopaccess_core::{Error, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use std::f64::consts::{FRAC_PI_2, PI};

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer distance in layer units, must be positive
    pub distance: f64,
    /// Segments per quarter circle (default: 5)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 5,
        }
    }
}

impl BufferParams {
    fn validate(&self) -> Result<()> {
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(Error::invalid_parameter(
                "distance",
                self.distance,
                "buffer distance must be a positive number",
            ));
        }
        Ok(())
    }

    fn quarter_segments(&self) -> usize {
        self.segments.max(1)
    }
}

/// Points on an arc around `center`, from `start` to `end` radians,
/// both ends included.
fn arc(center: Coord<f64>, radius: f64, start: f64, end: f64, steps: usize) -> Vec<Coord<f64>> {
    (0..=steps)
        .map(|i| {
            let angle = start + (end - start) * i as f64 / steps as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect()
}

/// Circular buffer around a point: a polygon with `4 * segments` vertices.
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    let n = 4 * params.quarter_segments();
    let mut coords = arc(point.0, params.distance, 0.0, 2.0 * PI, n);
    // The arc's last point repeats the first one; pin it exactly
    let first = coords[0];
    if let Some(last) = coords.last_mut() {
        *last = first;
    }
    Polygon::new(LineString::from(coords), vec![])
}

/// Stadium-shaped buffer around the segment `a`-`b`.
///
/// Degenerates to a circle when both ends coincide.
pub fn buffer_segment(a: Coord<f64>, b: Coord<f64>, params: &BufferParams) -> Polygon<f64> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if dx == 0.0 && dy == 0.0 {
        return buffer_point(&Point::from(a), params);
    }

    let theta = dy.atan2(dx);
    let steps = 2 * params.quarter_segments();
    let r = params.distance;

    // Counter-clockwise: cap around `b`, then cap around `a`
    let mut coords = arc(b, r, theta - FRAC_PI_2, theta + FRAC_PI_2, steps);
    coords.extend(arc(a, r, theta + FRAC_PI_2, theta + 3.0 * FRAC_PI_2, steps));
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

fn buffer_line(line: &LineString<f64>, params: &BufferParams) -> Vec<Polygon<f64>> {
    match line.0.len() {
        0 => Vec::new(),
        1 => vec![buffer_point(&Point::from(line.0[0]), params)],
        _ => line
            .lines()
            .map(|seg| buffer_segment(seg.start, seg.end, params))
            .collect(),
    }
}

fn buffer_polygon(polygon: &Polygon<f64>, params: &BufferParams) -> Vec<Polygon<f64>> {
    // Inside the polygon, or within the distance of any of its rings
    let mut parts = vec![polygon.clone()];
    parts.extend(buffer_line(polygon.exterior(), params));
    for interior in polygon.interiors() {
        parts.extend(buffer_line(interior, params));
    }
    parts
}

fn collect_parts(
    geom: &Geometry<f64>,
    params: &BufferParams,
    out: &mut Vec<Polygon<f64>>,
) -> Result<()> {
    match geom {
        Geometry::Point(p) => out.push(buffer_point(p, params)),
        Geometry::MultiPoint(mp) => out.extend(mp.iter().map(|p| buffer_point(p, params))),
        Geometry::Line(l) => out.push(buffer_segment(l.start, l.end, params)),
        Geometry::LineString(ls) => out.extend(buffer_line(ls, params)),
        Geometry::MultiLineString(mls) => {
            for ls in mls.iter() {
                out.extend(buffer_line(ls, params));
            }
        }
        Geometry::Polygon(p) => out.extend(buffer_polygon(p, params)),
        Geometry::MultiPolygon(mp) => {
            for p in mp.iter() {
                out.extend(buffer_polygon(p, params));
            }
        }
        Geometry::Rect(r) => out.extend(buffer_polygon(&r.to_polygon(), params)),
        Geometry::Triangle(t) => out.extend(buffer_polygon(&t.to_polygon(), params)),
        Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                collect_parts(g, params, out)?;
            }
        }
    }
    Ok(())
}

/// Buffer any geometry into a multipolygon.
///
/// # Errors
/// `InvalidParameter` for a non-positive or non-finite distance,
/// `UnsupportedGeometry` when the geometry has no coordinates.
pub fn buffer_geometry(geom: &Geometry<f64>, params: &BufferParams) -> Result<MultiPolygon<f64>> {
    params.validate()?;

    let mut parts = Vec::new();
    collect_parts(geom, params, &mut parts)?;
    if parts.is_empty() {
        return Err(Error::UnsupportedGeometry("empty geometry cannot be buffered".into()));
    }
    Ok(MultiPolygon::new(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, Intersects};

    #[test]
    fn test_buffer_point_area() {
        let params = BufferParams {
            distance: 10.0,
            segments: 16,
        };
        let polygon = buffer_point(&Point::new(0.0, 0.0), &params);

        let expected = PI * 100.0;
        let error = (polygon.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.01, "Circle area error {:.2}%", error * 100.0);
    }

    #[test]
    fn test_buffer_point_vertex_count() {
        let polygon = buffer_point(&Point::new(5.0, 5.0), &BufferParams::default());
        // 4 quarters x 5 segments, closed
        assert_eq!(polygon.exterior().0.len(), 21);
    }

    #[test]
    fn test_buffer_point_ring_closes_exactly() {
        let params = BufferParams {
            distance: 1000.0,
            segments: 7,
        };
        let ring = buffer_point(&Point::new(36.82, -1.29), &params).exterior().clone();
        assert_eq!(ring.0.first(), ring.0.last());
        assert_eq!(ring.0.len(), 4 * 7 + 1);
    }

    #[test]
    fn test_segment_buffer_membership() {
        let params = BufferParams {
            distance: 100.0,
            segments: 5,
        };
        let stadium =
            buffer_segment(Coord { x: 0.0, y: 0.0 }, Coord { x: 1000.0, y: 0.0 }, &params);

        assert!(stadium.contains(&Point::new(500.0, 90.0)));
        assert!(stadium.contains(&Point::new(-90.0, 0.0)), "inside the start cap");
        assert!(stadium.contains(&Point::new(1090.0, 0.0)), "inside the end cap");
        assert!(!stadium.intersects(&Point::new(500.0, 110.0)));
        assert!(!stadium.intersects(&Point::new(1110.0, 0.0)));
    }

    #[test]
    fn test_segment_buffer_area() {
        let params = BufferParams {
            distance: 1.0,
            segments: 32,
        };
        let stadium = buffer_segment(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 10.0 }, &params);
        // 2r * length + pi r^2
        let expected = 20.0 + PI;
        assert!((stadium.unsigned_area() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_polyline_buffer_follows_bend() {
        let road = Geometry::LineString(LineString::from(vec![
            (0.0, 0.0),
            (100.0, 0.0),
            (100.0, 100.0),
        ]));
        let zone = buffer_geometry(&road, &BufferParams { distance: 10.0, segments: 5 }).unwrap();

        assert_eq!(zone.0.len(), 2);
        assert!(zone.intersects(&Point::new(105.0, 50.0)));
        assert!(!zone.intersects(&Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_polygon_buffer_includes_interior() {
        let field = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (100.0, 0.0),
                (100.0, 100.0),
                (0.0, 100.0),
                (0.0, 0.0),
            ]),
            vec![],
        ));
        let zone = buffer_geometry(&field, &BufferParams { distance: 5.0, segments: 5 }).unwrap();

        assert!(zone.intersects(&Point::new(50.0, 50.0)));
        assert!(zone.intersects(&Point::new(103.0, 50.0)));
        assert!(!zone.intersects(&Point::new(110.0, 50.0)));
    }

    #[test]
    fn test_invalid_distance() {
        let p = Geometry::Point(Point::new(0.0, 0.0));
        for d in [0.0, -5.0, f64::NAN] {
            let result = buffer_geometry(&p, &BufferParams { distance: d, segments: 5 });
            assert!(matches!(result, Err(Error::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_empty_geometry() {
        let empty = Geometry::LineString(LineString::new(vec![]));
        let result = buffer_geometry(&empty, &BufferParams::default());
        assert!(matches!(result, Err(Error::UnsupportedGeometry(_))));
    }
}
